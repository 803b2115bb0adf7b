//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (meters, seconds, hours, etc.)
//! - Documented ranges and meanings
//! - A `validate()` where a bad value would break the frame pipeline

mod alignment;
mod camera;
mod render;
mod sky;
mod water;

// Re-export all types
pub use alignment::AlignmentParams;
pub use camera::{CameraPreset, FixedCamera, OrbitCameraParams};
pub use render::{RenderConfig, ShadingParams};
pub use sky::{AtmosphereParams, ClockParams, SunCycle};
pub use water::WaterParams;
