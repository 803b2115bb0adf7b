//! Water surface and noise field parameters.

use crate::error::ConfigError;

/// Procedural water surface parameters
#[derive(Debug, Clone)]
pub struct WaterParams {
    /// Heightfield render target resolution (texels per side)
    /// Fixed, independent of the viewport
    pub noise_resolution: u32,

    /// Water plane edge length in world units (meters)
    pub plane_size_m: f32,

    /// Quads per side of the water plane mesh
    pub plane_subdivisions: u32,

    /// Resting height of the water plane (meters)
    pub plane_height_m: f32,

    /// Scale applied to the [0,1] heightfield value (meters)
    pub wave_height_m: f32,

    /// Noise lattice cycles per unit UV
    pub noise_frequency: f32,

    /// Noise advection along U per unit time
    pub scroll_speed: f32,

    /// Central-difference step for heightfield normals (noise-space units)
    pub normal_epsilon: f32,

    /// Height scale used only when estimating normals
    pub normal_height_scale: f32,

    /// Simulation time advanced per frame (dimensionless)
    pub time_step: f32,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            noise_resolution: 1024,
            plane_size_m: 512.0,
            plane_subdivisions: 1000,
            plane_height_m: 0.02, // Just above y=0 to avoid z-fighting with the mirror plane
            wave_height_m: 5.0,
            noise_frequency: 10.0,
            scroll_speed: 0.1,
            normal_epsilon: 0.1,
            normal_height_scale: 0.3,
            time_step: 0.01,
        }
    }
}

impl WaterParams {
    /// Heightfield texels per world meter
    pub fn texels_per_meter(&self) -> f32 {
        self.noise_resolution as f32 / self.plane_size_m
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.noise_resolution == 0 || !self.noise_resolution.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "noise_resolution",
                value: self.noise_resolution,
            });
        }
        if self.plane_size_m <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "plane_size_m",
                expected: "> 0",
                value: self.plane_size_m,
            });
        }
        if self.plane_subdivisions == 0 {
            return Err(ConfigError::OutOfRange {
                field: "plane_subdivisions",
                expected: ">= 1",
                value: 0.0,
            });
        }
        if self.wave_height_m < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "wave_height_m",
                expected: ">= 0",
                value: self.wave_height_m,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_water_params_are_valid() {
        let params = WaterParams::default();
        assert_eq!(params.validate(), Ok(()));
        assert_eq!(params.texels_per_meter(), 2.0);
    }

    #[test]
    fn test_rejects_non_power_of_two_resolution() {
        let params = WaterParams {
            noise_resolution: 1000,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::NotPowerOfTwo { .. })
        ));
    }
}
