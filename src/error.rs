//! Error types for rendering, asset loading and configuration.

use std::path::PathBuf;

/// Errors raised while setting up or driving the GPU pipeline
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// The adapter exists but lacks something the water pipeline needs
    #[error("unsupported graphics capability: {0}")]
    Unsupported(String),

    #[error("heightfield read-back failed: {0}")]
    Readback(String),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Errors raised by the background asset loader
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture {path} has unusable size {width}x{height}")]
    TextureSize {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("asset loader thread exited before delivering assets")]
    LoaderDisconnected,
}

/// Invalid parameter values caught by `validate()`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f32,
    },

    #[error("{field} must be a non-zero power of two, got {value}")]
    NotPowerOfTwo { field: &'static str, value: u32 },
}
