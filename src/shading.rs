//! Water shading model.
//!
//! Host-side mirror of the fragment stage in `rendering/shaders/water.wgsl`.
//! Constants here and in the shader must stay in step.

use glam::{Vec2, Vec3, Vec4};

/// Blinn/Phong exponent for the sun highlight
pub const SHININESS: f32 = 100.0;
pub const SPECULAR_WEIGHT: f32 = 2.0;
pub const DIFFUSE_WEIGHT: f32 = 0.5;
/// Weights of heightfield normal vs. wave-texture normal
pub const COARSE_NORMAL_WEIGHT: f32 = 0.75;
pub const FINE_NORMAL_WEIGHT: f32 = 0.25;
/// World-to-wave-texture scale
pub const WAVE_UV_SCALE: f32 = 100.0;
pub const DISTORTION_SCALE: f32 = 1.0;
pub const MIN_DISTORTION: f32 = 0.001;
/// Reflection samples below this alpha hold no rendered scene
pub const REFLECTION_ALPHA_CUTOFF: f32 = 0.1;
/// Schlick reflectance at normal incidence
pub const FRESNEL_F0: f32 = 0.3;
pub const FRESNEL_POWER: f32 = 5.0;
pub const AMBIENT: f32 = 0.1;
/// Reflective branch output alpha, independent of the Fresnel term
pub const REFLECTIVE_ALPHA: f32 = 0.9;
pub const FALLBACK_ALPHA: f32 = 1.0;

/// Texture coordinates of the four wave-normal octaves
pub fn wave_octave_uvs(uv: Vec2, time: f32) -> [Vec2; 4] {
    [
        uv / 103.0 + Vec2::new(time / 17.0, time / 29.0),
        uv / 107.0 - Vec2::new(time / -19.0, time / 31.0),
        uv / Vec2::new(8907.0, 9803.0) + Vec2::new(time / 101.0, time / 97.0),
        uv / Vec2::new(1091.0, 1027.0) - Vec2::new(time / 109.0, time / -113.0),
    ]
}

/// Fine surface normal from the four octave samples (each in [0,1])
pub fn fine_normal(samples: [Vec4; 4]) -> Vec3 {
    let sum: Vec4 = samples.into_iter().sum();
    let noise = sum * 0.5 - Vec4::ONE;
    (Vec3::new(noise.x, noise.z, noise.y) * Vec3::new(2.0, 1.0, 2.0)).normalize()
}

/// Blend of the heightfield normal (texture space, z up) with the fine normal
pub fn blend_normals(coarse: Vec3, fine: Vec3) -> Vec3 {
    let coarse_world = Vec3::new(coarse.x, coarse.z, coarse.y).normalize();
    coarse_world * COARSE_NORMAL_WEIGHT + fine * FINE_NORMAL_WEIGHT
}

/// Diffuse and specular light from the sun
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunLighting {
    pub diffuse: Vec3,
    pub specular: Vec3,
}

pub fn sun_light(normal: Vec3, eye_direction: Vec3, sun_direction: Vec3, sun_color: Vec3) -> SunLighting {
    let sun = sun_direction.normalize();
    let reflection = crate::mirror::reflect(-sun, normal).normalize();
    let direction = eye_direction.dot(reflection).max(0.0);
    SunLighting {
        diffuse: sun.dot(normal).max(0.0) * sun_color * DIFFUSE_WEIGHT,
        specular: direction.powf(SHININESS) * sun_color * SPECULAR_WEIGHT,
    }
}

/// Schlick approximation, `cos_theta` clamped to [0,1]
pub fn schlick_fresnel(cos_theta: f32) -> f32 {
    let theta = cos_theta.clamp(0.0, 1.0);
    FRESNEL_F0 + (1.0 - FRESNEL_F0) * (1.0 - theta).powf(FRESNEL_POWER)
}

/// Offset applied to the projected mirror coordinate
pub fn reflection_distortion(normal: Vec3, eye_distance: f32) -> Vec2 {
    Vec2::new(normal.x, normal.z) * (MIN_DISTORTION + 1.0 / eye_distance) * DISTORTION_SCALE
}

/// Everything one water fragment needs
#[derive(Debug, Clone, Copy)]
pub struct ShadingInputs {
    /// Blended surface normal
    pub normal: Vec3,
    pub world_position: Vec3,
    pub camera_position: Vec3,
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
    pub water_color: Vec3,
    /// Mirror texture sample at the distorted coordinate
    pub reflection: Vec4,
}

/// Final RGBA for a water fragment
pub fn shade(inputs: &ShadingInputs) -> Vec4 {
    let world_to_eye = inputs.camera_position - inputs.world_position;
    let eye_direction = world_to_eye.normalize();
    let light = sun_light(
        inputs.normal,
        eye_direction,
        inputs.sun_direction,
        inputs.sun_color,
    );

    if inputs.reflection.w < REFLECTION_ALPHA_CUTOFF {
        let color = (light.diffuse + light.specular + Vec3::splat(AMBIENT)) * inputs.water_color;
        return color.extend(FALLBACK_ALPHA);
    }

    let reflectance = schlick_fresnel(eye_direction.dot(inputs.normal));
    let scatter = inputs.normal.dot(eye_direction).max(0.0) * inputs.water_color;
    let reflected = inputs.reflection.truncate();
    let albedo = (inputs.sun_color * light.diffuse * 0.3 + scatter).lerp(
        Vec3::splat(AMBIENT) + reflected * 0.9 + reflected * light.specular,
        reflectance,
    );
    albedo.extend(REFLECTIVE_ALPHA)
}
