//! Device, surface and the startup capability check.

use std::sync::Arc;

use winit::window::Window;

use crate::error::RenderError;

/// Heightfield target; linear so encoded normals and heights stay exact
pub const HEIGHTFIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Mirror target; alpha 0 marks texels the mirror pass never touched
pub const REFLECTION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Check once at startup that the adapter can run the water pipeline
///
/// Both offscreen targets must be renderable at `min_texture_size` and
/// sampleable with filtering; the heightfield must also be copyable to
/// host memory.
pub fn check_capabilities(
    limits: &wgpu::Limits,
    heightfield: wgpu::TextureFormatFeatures,
    reflection: wgpu::TextureFormatFeatures,
    min_texture_size: u32,
) -> Result<(), RenderError> {
    if limits.max_texture_dimension_2d < min_texture_size {
        return Err(RenderError::Unsupported(format!(
            "textures limited to {}px, need {}px",
            limits.max_texture_dimension_2d, min_texture_size
        )));
    }

    let targets = [
        (
            HEIGHTFIELD_FORMAT,
            heightfield,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        ),
        (
            REFLECTION_FORMAT,
            reflection,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        ),
    ];
    for (format, features, usages) in targets {
        if !features.allowed_usages.contains(usages) {
            return Err(RenderError::Unsupported(format!(
                "{:?} cannot be used as {:?}",
                format, usages
            )));
        }
        if !features
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
        {
            return Err(RenderError::Unsupported(format!(
                "{:?} is not filterable",
                format
            )));
        }
    }
    Ok(())
}

/// wgpu device plus the window surface it presents to
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>, min_texture_size: u32) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Window must have 'static lifetime via Arc
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        check_capabilities(
            &adapter.limits(),
            adapter.get_texture_format_features(HEIGHTFIELD_FORMAT),
            adapter.get_texture_format_features(REFLECTION_FORMAT),
            min_texture_size,
        )?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Unsupported("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Reconfigure the surface; zero sizes (minimized) are ignored
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    /// Re-apply the current configuration after the surface was lost
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}
