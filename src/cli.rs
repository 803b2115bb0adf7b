//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::ConfigError;
use crate::object::AssetRequest;
use crate::params::{
    CameraPreset, ClockParams, FixedCamera, OrbitCameraParams, RenderConfig, WaterParams,
};

/// Camera active at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CameraChoice {
    /// Scripted three-quarter view onto the hull
    Fixed,
    /// Drag to orbit, scroll to zoom
    Orbit,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "driftwater")]
#[command(about = "Animated water surface with a floating hull and planar reflections", long_about = None)]
pub struct Args {
    /// Startup camera (press C to switch at runtime)
    #[arg(long, value_enum, default_value = "orbit")]
    pub camera: CameraChoice,

    /// Time of day at startup (hours, 0-24)
    #[arg(long, value_name = "HOUR", default_value = "10")]
    pub start_hour: f32,

    /// Simulated seconds per real second
    #[arg(long, value_name = "FACTOR", default_value = "60")]
    pub time_scale: f32,

    /// Wave amplitude (meters)
    #[arg(long, value_name = "METERS")]
    pub wave_height: Option<f32>,

    /// Tileable normal map for the fine wave detail (procedural if omitted)
    #[arg(long, value_name = "PATH")]
    pub wave_texture: Option<PathBuf>,

    /// Window width (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "1280")]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "720")]
    pub height: u32,
}

impl Args {
    pub fn camera_preset(&self) -> CameraPreset {
        match self.camera {
            CameraChoice::Fixed => CameraPreset::Fixed(FixedCamera::default()),
            CameraChoice::Orbit => CameraPreset::Orbit(OrbitCameraParams::default()),
        }
    }

    pub fn clock_params(&self) -> Result<ClockParams, ConfigError> {
        if !(0.0..24.0).contains(&self.start_hour) {
            return Err(ConfigError::OutOfRange {
                field: "start_hour",
                expected: "in [0, 24)",
                value: self.start_hour,
            });
        }
        if self.time_scale < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "time_scale",
                expected: ">= 0",
                value: self.time_scale,
            });
        }
        Ok(ClockParams {
            start_hour: self.start_hour,
            time_scale: self.time_scale,
        })
    }

    /// Defaults with the command-line overrides applied, validated
    pub fn water_params(&self) -> Result<WaterParams, ConfigError> {
        let mut water = WaterParams::default();
        if let Some(height) = self.wave_height {
            water.wave_height_m = height;
        }
        water.validate()?;
        Ok(water)
    }

    pub fn render_config(&self) -> Result<RenderConfig, ConfigError> {
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "> 0",
                    value: value as f32,
                });
            }
        }
        Ok(RenderConfig {
            window_width: self.width,
            window_height: self.height,
            ..RenderConfig::default()
        })
    }

    pub fn asset_request(&self) -> AssetRequest {
        AssetRequest {
            wave_texture: self.wave_texture.clone(),
            ..AssetRequest::default()
        }
    }
}
