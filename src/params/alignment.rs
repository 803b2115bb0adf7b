//! Floating object alignment tunables.

use std::f32::consts::FRAC_PI_2;

use crate::error::ConfigError;

/// Parameters for fitting the floating object to the water surface
#[derive(Debug, Clone)]
pub struct AlignmentParams {
    /// Empirical multiplier on sampled corner heights (dimensionless)
    /// Uncalibrated correction carried from the reference scene, not a physical constant
    pub height_gain: f32,

    /// Spherical blend factor toward the target orientation, per frame
    /// Small on purpose: the hull reacts to slope with visible inertia
    pub orientation_blend: f32,

    /// Linear blend factor toward the target position, per frame
    pub position_blend: f32,

    /// Yaw applied after tilting (radians), compensates the hull's modelled facing
    pub yaw_correction_rad: f32,

    /// Footprint extents below this are treated as degenerate (meters)
    pub degenerate_extent_m: f32,

    /// Amount added to the max corner of a degenerate axis (meters)
    pub inflation_m: f32,
}

impl Default for AlignmentParams {
    fn default() -> Self {
        Self {
            height_gain: 2.0,
            orientation_blend: 0.01,
            position_blend: 0.1,
            yaw_correction_rad: FRAC_PI_2,
            degenerate_extent_m: 1e-4,
            inflation_m: 1.0,
        }
    }
}

impl AlignmentParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("orientation_blend", self.orientation_blend),
            ("position_blend", self.position_blend),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "in (0, 1]",
                    value,
                });
            }
        }
        if self.inflation_m <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "inflation_m",
                expected: "> 0",
                value: self.inflation_m,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_factors_must_be_in_unit_interval() {
        assert_eq!(AlignmentParams::default().validate(), Ok(()));

        let params = AlignmentParams {
            position_blend: 1.5,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = AlignmentParams {
            orientation_blend: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
