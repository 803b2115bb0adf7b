//! Pluggable sky model driven by the sun direction.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::params::AtmosphereParams;
use crate::sun::SunState;

/// Uniform block for `rendering/shaders/sky.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SkyUniforms {
    pub sun_direction: [f32; 3],
    pub sun_intensity: f32,
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
}

/// Produces sky shader inputs from the current sun
pub trait SkyProvider {
    fn sky_uniforms(&self, sun: &SunState) -> SkyUniforms;
}

/// Single-scattering sky with Rayleigh and Mie terms
#[derive(Debug, Clone, Default)]
pub struct AnalyticSky {
    pub atmosphere: AtmosphereParams,
}

impl AnalyticSky {
    pub fn new(atmosphere: AtmosphereParams) -> Self {
        Self { atmosphere }
    }
}

impl SkyProvider for AnalyticSky {
    fn sky_uniforms(&self, sun: &SunState) -> SkyUniforms {
        let direction = sun.direction.try_normalize().unwrap_or(Vec3::Y);
        SkyUniforms {
            sun_direction: direction.to_array(),
            sun_intensity: sun.intensity,
            turbidity: self.atmosphere.turbidity,
            rayleigh: self.atmosphere.rayleigh,
            mie_coefficient: self.atmosphere.mie_coefficient,
            mie_directional_g: self.atmosphere.mie_directional_g,
        }
    }
}
