//! Gradient noise for the water heightfield.
//!
//! Host-side twin of `rendering/shaders/noise.wgsl`. Same lattice hash, same
//! constants, so tests and synthetic buffers see the surface the GPU renders.

use glam::{Vec2, Vec3};

use crate::heightfield::{encode_texel, HeightfieldBuffer};
use crate::params::WaterParams;

/// Dot-product coefficients seeding the lattice hash
pub const HASH_COEFF_X: Vec2 = Vec2::new(334.1, 781.7);
pub const HASH_COEFF_Y: Vec2 = Vec2::new(652.5, 153.3);
pub const HASH_SCALE: f32 = 241.5453123;

/// Smoothstep weight `3f² - 2f³`
pub fn smoothstep_weight(f: f32) -> f32 {
    f * f * (3.0 - 2.0 * f)
}

/// Pseudo-random gradient for a lattice cell
pub fn hash2d(cell: Vec2) -> Vec2 {
    let p = Vec2::new(cell.dot(HASH_COEFF_X), cell.dot(HASH_COEFF_Y));
    let fract = |v: f32| {
        let s = v.sin() * HASH_SCALE;
        s - s.floor()
    };
    Vec2::new(-1.0 + 3.0 * fract(p.x), -1.0 + 3.0 * fract(p.y))
}

/// 2D gradient noise remapped to [0,1]
///
/// Clamped to the range the 8-bit heightfield can store.
pub fn perlin(pos: Vec2) -> f32 {
    let i = pos.floor();
    let f = pos - i;
    let u = Vec2::new(smoothstep_weight(f.x), smoothstep_weight(f.y));

    let corner = |offset: Vec2| hash2d(i + offset).dot(f - offset);
    let n00 = corner(Vec2::new(0.0, 0.0));
    let n10 = corner(Vec2::new(1.0, 0.0));
    let n01 = corner(Vec2::new(0.0, 1.0));
    let n11 = corner(Vec2::new(1.0, 1.0));

    let nx0 = n00 + (n10 - n00) * u.x;
    let nx1 = n01 + (n11 - n01) * u.x;
    (0.5 + 0.5 * (nx0 + (nx1 - nx0) * u.y)).clamp(0.0, 1.0)
}

/// Time-advected noise field producing heightfield texels
#[derive(Debug, Clone)]
pub struct NoiseField {
    frequency: f32,
    scroll_speed: f32,
    epsilon: f32,
    normal_height_scale: f32,
}

impl NoiseField {
    pub fn new(params: &WaterParams) -> Self {
        Self {
            frequency: params.noise_frequency,
            scroll_speed: params.scroll_speed,
            epsilon: params.normal_epsilon,
            normal_height_scale: params.normal_height_scale,
        }
    }

    /// Noise-space position for a UV at `time`
    pub fn noise_position(&self, uv: Vec2, time: f32) -> Vec2 {
        uv * self.frequency + Vec2::new(time * self.scroll_speed, 0.0)
    }

    /// Height in [0,1]
    pub fn height(&self, uv: Vec2, time: f32) -> f32 {
        perlin(self.noise_position(uv, time))
    }

    /// Unit normal from central differences, z is "up" (texture space)
    pub fn normal(&self, uv: Vec2, time: f32) -> Vec3 {
        let p = self.noise_position(uv, time);
        let e = self.epsilon;
        let h = |offset: Vec2| perlin(p + offset) * self.normal_height_scale;

        let tangent_x = Vec3::new(2.0 * e, 0.0, h(Vec2::new(e, 0.0)) - h(Vec2::new(-e, 0.0)));
        let tangent_y = Vec3::new(0.0, 2.0 * e, h(Vec2::new(0.0, e)) - h(Vec2::new(0.0, -e)));
        tangent_x.cross(tangent_y).normalize()
    }

    /// Render the full heightfield on the host, sampling texel centers
    pub fn generate(&self, resolution: u32, time: f32) -> HeightfieldBuffer {
        let inv = 1.0 / resolution as f32;
        let mut texels = Vec::with_capacity((resolution * resolution) as usize);
        for z in 0..resolution {
            for x in 0..resolution {
                let uv = Vec2::new((x as f32 + 0.5) * inv, (z as f32 + 0.5) * inv);
                texels.push(encode_texel(self.normal(uv, time), self.height(uv, time)));
            }
        }
        HeightfieldBuffer::from_full(resolution, texels)
    }
}
