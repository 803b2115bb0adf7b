//! Driftwater library - GPU water surface with a floating hull
//!
//! The host side keeps every frame stage testable without a GPU: the
//! orchestrator in [`frame`] drives any [`frame::FrameBackend`], and
//! [`rendering::RenderSystem`] is the wgpu implementation.

pub mod alignment;
pub mod camera;
pub mod cli;
pub mod error;
pub mod frame;
pub mod heightfield;
pub mod mirror;
pub mod noise;
pub mod object;
pub mod params;
pub mod rendering;
pub mod shading;
pub mod sky;
pub mod sun;
pub mod water;
