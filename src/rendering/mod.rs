//! wgpu renderer: the GPU side of every frame stage.
//!
//! Passes per frame, each submitted on its own:
//! - noise: heightfield into a fixed-size offscreen target
//! - mirror: sky and object from the mirror camera into the reflection target
//! - main: sky, object, then the blended water surface to the window

mod context;
mod pipelines;
mod readback;
mod targets;

pub use context::{check_capabilities, GpuContext, HEIGHTFIELD_FORMAT, REFLECTION_FORMAT};
pub use readback::{padded_bytes_per_row, unpad_rows, HeightfieldReadback};

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::PerspectiveCamera;
use crate::error::RenderError;
use crate::frame::{FrameBackend, FrameState, SceneUniforms};
use crate::heightfield::{GridRect, HeightfieldBuffer, HeightfieldSource};
use crate::mirror::MirrorCamera;
use crate::object::{FloatingObject, WaveNormalMap};
use crate::params::{RenderConfig, ShadingParams, WaterParams};
use crate::sky::{SkyProvider, SkyUniforms};
use crate::water::WaterGrid;

use pipelines::Pipelines;
use targets::{GpuMesh, RenderTarget};

/// Per-pass camera uniforms (group 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ViewUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    /// xyz eye position, w height below which the object is clipped
    pub eye: [f32; 4],
}

impl ViewUniforms {
    /// Clip height that never discards anything
    pub const NO_CLIP: f32 = -f32::MAX;

    pub fn new(view_proj: Mat4, eye: Vec3, clip_height: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            eye: eye.extend(clip_height).to_array(),
        }
    }

    pub fn main(camera: &PerspectiveCamera) -> Self {
        Self::new(camera.view_proj(), camera.position, Self::NO_CLIP)
    }

    /// Mirror view, clipped at the reflecting plane
    pub fn mirror(mirror: &MirrorCamera, plane_height: f32) -> Self {
        Self::new(mirror.view_proj(), mirror.position, plane_height)
    }
}

struct ViewBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ViewBinding {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} View Buffer", label)),
            contents: bytemuck::cast_slice(&[ViewUniforms::new(
                Mat4::IDENTITY,
                Vec3::ZERO,
                ViewUniforms::NO_CLIP,
            )]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} View Bind Group", label)),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

/// Object mesh and the water bindings that need the wave-normal map
struct ObjectResources {
    mesh: GpuMesh,
    water_bind_group: wgpu::BindGroup,
}

/// Rendering system owning every GPU resource of the scene
pub struct RenderSystem {
    gpu: GpuContext,
    pipelines: Pipelines,
    water: WaterParams,
    shading: ShadingParams,
    sky: Box<dyn SkyProvider>,
    heightfield: RenderTarget,
    reflection: RenderTarget,
    reflection_depth: RenderTarget,
    depth: RenderTarget,
    scene_buffer: wgpu::Buffer,
    sky_buffer: wgpu::Buffer,
    noise_bind_group: wgpu::BindGroup,
    scene_bind_group: wgpu::BindGroup,
    main_view: ViewBinding,
    mirror_view: ViewBinding,
    wave_sampler: wgpu::Sampler,
    mirror_sampler: wgpu::Sampler,
    water_mesh: GpuMesh,
    object: Option<ObjectResources>,
    readback: HeightfieldReadback,
}

impl RenderSystem {
    /// Create device, targets and pipelines; fails on unsupported hardware
    pub async fn new(
        window: Arc<Window>,
        config: &RenderConfig,
        water: WaterParams,
        shading: ShadingParams,
        sky: Box<dyn SkyProvider>,
    ) -> Result<Self, RenderError> {
        let min_texture_size = water.noise_resolution.max(config.reflection_resolution);
        let gpu = GpuContext::new(window, min_texture_size).await?;
        let device = &gpu.device;

        let pipelines = Pipelines::new(device, gpu.config.format);

        let heightfield = RenderTarget::color(
            device,
            "Heightfield Target",
            water.noise_resolution,
            HEIGHTFIELD_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        );
        let reflection = RenderTarget::color(
            device,
            "Reflection Target",
            config.reflection_resolution,
            REFLECTION_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let reflection_depth = RenderTarget::depth(
            device,
            "Reflection Depth",
            config.reflection_resolution,
            config.reflection_resolution,
        );
        let depth = RenderTarget::depth(device, "Main Depth", gpu.config.width, gpu.config.height);

        let clamped = |label: &str| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            })
        };
        let heightfield_sampler = clamped("Heightfield Sampler");
        let mirror_sampler = clamped("Mirror Sampler");
        let wave_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Wave Normal Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: std::mem::size_of::<SceneUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sky_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sky Uniform Buffer"),
            size: std::mem::size_of::<SkyUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let noise_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Noise Bind Group"),
            layout: &pipelines.layouts.noise,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &pipelines.layouts.scene,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: sky_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&heightfield.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&heightfield_sampler),
                },
            ],
        });

        let main_view = ViewBinding::new(device, &pipelines.layouts.view, "Main");
        let mirror_view = ViewBinding::new(device, &pipelines.layouts.view, "Mirror");

        let grid = WaterGrid::new(&water);
        let water_mesh = GpuMesh::new(device, "Water", &grid.vertices, &grid.indices);
        log::info!(
            "Water plane: {}x{} quads over {} m, heightfield {}px",
            grid.subdivisions(),
            grid.subdivisions(),
            water.plane_size_m,
            water.noise_resolution
        );

        Ok(Self {
            pipelines,
            water,
            shading,
            sky,
            heightfield,
            reflection,
            reflection_depth,
            depth,
            scene_buffer,
            sky_buffer,
            noise_bind_group,
            scene_bind_group,
            main_view,
            mirror_view,
            wave_sampler,
            mirror_sampler,
            water_mesh,
            object: None,
            readback: HeightfieldReadback::new(),
            gpu,
        })
    }

    /// Follow a window resize; the offscreen targets keep their fixed size
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.gpu.resize(width, height) {
            self.depth = RenderTarget::depth(&self.gpu.device, "Main Depth", width, height);
        }
    }

    /// Recover from a lost or outdated surface
    pub fn reconfigure(&self) {
        self.gpu.reconfigure();
    }

    fn write_scene(&self, state: &FrameState) {
        let scene = state.scene_uniforms(&self.shading, &self.water);
        let sky = self.sky.sky_uniforms(&state.sun);
        self.gpu
            .queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[scene]));
        self.gpu
            .queue
            .write_buffer(&self.sky_buffer, 0, bytemuck::cast_slice(&[sky]));
    }

    fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }
}

fn depth_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}

impl HeightfieldSource for RenderSystem {
    fn resolution(&self) -> u32 {
        self.water.noise_resolution
    }

    fn read_region(&mut self, rect: GridRect) -> Result<HeightfieldBuffer, RenderError> {
        self.readback.read(
            &self.gpu.device,
            &self.gpu.queue,
            &self.heightfield.texture,
            rect,
        )
    }
}

impl FrameBackend for RenderSystem {
    fn install_assets(
        &mut self,
        object: &FloatingObject,
        wave_normals: &WaveNormalMap,
    ) -> Result<(), RenderError> {
        let device = &self.gpu.device;
        let wave_texture = RenderTarget::upload(
            device,
            &self.gpu.queue,
            "Wave Normal Texture",
            wave_normals.width,
            wave_normals.height,
            wgpu::TextureFormat::Rgba8Unorm,
            &wave_normals.rgba,
        );

        let water_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Water Bind Group"),
            layout: &self.pipelines.layouts.water,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&wave_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.wave_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&self.reflection.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.mirror_sampler),
                },
            ],
        });

        let mesh = GpuMesh::new(
            device,
            "Object",
            &object.mesh.vertices,
            &object.mesh.indices,
        );
        self.object = Some(ObjectResources {
            mesh,
            water_bind_group,
        });
        Ok(())
    }

    fn render_noise(&mut self, state: &FrameState) -> Result<(), RenderError> {
        self.write_scene(state);

        let mut encoder = self.encoder("Noise Encoder");
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Noise Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.heightfield.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipelines.noise);
            pass.set_bind_group(0, &self.noise_bind_group, &[]);
            pass.draw(0..3, 0..1); // Fullscreen triangle
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn render_mirror(
        &mut self,
        mirror: &MirrorCamera,
        state: &FrameState,
    ) -> Result<(), RenderError> {
        self.write_scene(state);
        let anchor_height = state.object_model.w_axis.y;
        self.gpu.queue.write_buffer(
            &self.mirror_view.buffer,
            0,
            bytemuck::cast_slice(&[ViewUniforms::mirror(mirror, anchor_height)]),
        );

        let mut encoder = self.encoder("Mirror Encoder");
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mirror Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.reflection.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        // Alpha 0 marks "nothing reflected here"
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(depth_attachment(&self.reflection_depth.view)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.mirror_view.bind_group, &[]);
            pass.set_bind_group(1, &self.scene_bind_group, &[]);

            pass.set_pipeline(&self.pipelines.mirror.sky);
            pass.draw(0..3, 0..1);

            if let Some(object) = &self.object {
                pass.set_pipeline(&self.pipelines.mirror.object);
                object.mesh.draw(&mut pass);
            }
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn render_main(
        &mut self,
        camera: &PerspectiveCamera,
        state: &FrameState,
    ) -> Result<(), RenderError> {
        self.write_scene(state);
        self.gpu.queue.write_buffer(
            &self.main_view.buffer,
            0,
            bytemuck::cast_slice(&[ViewUniforms::main(camera)]),
        );

        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.encoder("Main Encoder");
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(depth_attachment(&self.depth.view)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.main_view.bind_group, &[]);
            pass.set_bind_group(1, &self.scene_bind_group, &[]);

            pass.set_pipeline(&self.pipelines.main.sky);
            pass.draw(0..3, 0..1);

            if let Some(object) = &self.object {
                pass.set_pipeline(&self.pipelines.main.object);
                object.mesh.draw(&mut pass);

                // Water last so it blends over everything else
                pass.set_pipeline(&self.pipelines.water);
                pass.set_bind_group(2, &object.water_bind_group, &[]);
                self.water_mesh.draw(&mut pass);
            }
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
