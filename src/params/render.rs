//! Rendering and shading configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (meters)
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    /// Shared with the mirror camera
    pub far_plane_m: f32,

    /// Mirror render target resolution (texels per side)
    pub reflection_resolution: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 75.0,
            near_plane_m: 0.1,
            far_plane_m: 1000.0,
            reflection_resolution: 1024,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }
}

/// Colors and lighting weights shared by the water and object shaders
#[derive(Debug, Clone)]
pub struct ShadingParams {
    /// Sun color (linear RGB), #FEEDE6
    pub sun_color: [f32; 3],

    /// Base water tint (linear RGB), #7383A0
    pub water_color: [f32; 3],

    /// Ambient light color for the floating object, #D3BFCB
    pub ambient_color: [f32; 3],

    /// Ambient light strength
    pub ambient_intensity: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            sun_color: [254.0 / 255.0, 237.0 / 255.0, 230.0 / 255.0],
            water_color: [115.0 / 255.0, 131.0 / 255.0, 160.0 / 255.0],
            ambient_color: [211.0 / 255.0, 191.0 / 255.0, 203.0 / 255.0],
            ambient_intensity: 2.0,
        }
    }
}
