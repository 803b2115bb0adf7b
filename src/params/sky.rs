//! Sun cycle, clock and atmosphere parameters.

use crate::error::ConfigError;

/// Day window and light strengths for the simulated sun
#[derive(Debug, Clone)]
pub struct SunCycle {
    /// Hour the sun crosses the horizon going up (0-24)
    pub sunrise_hour: f32,

    /// Hour the sun crosses the horizon going down (0-24)
    pub sunset_hour: f32,

    /// Directional light strength at zenith
    pub max_intensity: f32,

    /// Auxiliary point light strength with the sun fully down
    pub night_light_max: f32,
}

impl Default for SunCycle {
    fn default() -> Self {
        Self {
            sunrise_hour: 8.0,
            sunset_hour: 16.5,
            max_intensity: 5.0,
            night_light_max: 3.0,
        }
    }
}

impl SunCycle {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sunset_hour <= self.sunrise_hour {
            return Err(ConfigError::OutOfRange {
                field: "sunset_hour",
                expected: "later than sunrise_hour",
                value: self.sunset_hour,
            });
        }
        if self.max_intensity <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "max_intensity",
                expected: "> 0",
                value: self.max_intensity,
            });
        }
        Ok(())
    }
}

/// Simulated clock settings
#[derive(Debug, Clone)]
pub struct ClockParams {
    /// Time of day at startup (hours, 0-24)
    pub start_hour: f32,

    /// Simulated seconds per real second
    pub time_scale: f32,
}

impl Default for ClockParams {
    fn default() -> Self {
        Self {
            start_hour: 10.0,
            time_scale: 60.0,
        }
    }
}

/// Inputs for the atmospheric sky model
#[derive(Debug, Clone)]
pub struct AtmosphereParams {
    /// Haze amount (dimensionless, ~2 clear to ~20 hazy)
    pub turbidity: f32,

    /// Rayleigh scattering strength
    pub rayleigh: f32,

    /// Mie scattering coefficient
    pub mie_coefficient: f32,

    /// Mie phase anisotropy (-1..1)
    pub mie_directional_g: f32,
}

impl Default for AtmosphereParams {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 2.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
        }
    }
}
