//! Bind group layouts and render pipelines for every pass.

use crate::object::MeshVertex;
use crate::water::WaterVertex;

use super::context::{DEPTH_FORMAT, HEIGHTFIELD_FORMAT, REFLECTION_FORMAT};

pub const NOISE_SHADER: &str = include_str!("shaders/noise.wgsl");
pub const SKY_SHADER: &str = include_str!("shaders/sky.wgsl");
pub const OBJECT_SHADER: &str = include_str!("shaders/object.wgsl");
pub const WATER_SHADER: &str = include_str!("shaders/water.wgsl");

const WATER_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
const OBJECT_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Layouts shared between pipelines and bind groups
pub struct BindLayouts {
    /// Group 0: per-pass view uniforms
    pub view: wgpu::BindGroupLayout,
    /// Group 1: scene + sky uniforms and the heightfield
    pub scene: wgpu::BindGroupLayout,
    /// Group 2 (water only): wave normals and mirror texture
    pub water: wgpu::BindGroupLayout,
    /// Noise pass: scene uniforms only
    pub noise: wgpu::BindGroupLayout,
}

impl BindLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let both = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let fragment = wgpu::ShaderStages::FRAGMENT;

        Self {
            view: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("View Bind Group Layout"),
                entries: &[uniform_entry(0, both)],
            }),
            scene: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[
                    uniform_entry(0, both),
                    uniform_entry(1, fragment),
                    texture_entry(2, both),
                    sampler_entry(3, both),
                ],
            }),
            water: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Water Bind Group Layout"),
                entries: &[
                    texture_entry(0, fragment),
                    sampler_entry(1, fragment),
                    texture_entry(2, fragment),
                    sampler_entry(3, fragment),
                ],
            }),
            noise: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Noise Bind Group Layout"),
                entries: &[uniform_entry(0, fragment)],
            }),
        }
    }
}

struct PipelineSpec<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    layout: &'a wgpu::PipelineLayout,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth: Option<wgpu::DepthStencilState>,
    cull_mode: Option<wgpu::Face>,
}

fn create_pipeline(device: &wgpu::Device, spec: PipelineSpec) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(spec.layout),
        vertex: wgpu::VertexState {
            module: spec.shader,
            entry_point: Some("vs_main"),
            buffers: spec.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: spec.format,
                blend: spec.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: spec.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: spec.depth,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn depth_state(write: bool, compare: wgpu::CompareFunction) -> Option<wgpu::DepthStencilState> {
    Some(wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    })
}

/// Sky and object pipelines for one color target format
pub struct ScenePipelines {
    pub sky: wgpu::RenderPipeline,
    pub object: wgpu::RenderPipeline,
}

/// Every pipeline the frame uses
pub struct Pipelines {
    pub layouts: BindLayouts,
    pub noise: wgpu::RenderPipeline,
    /// Drawn into the swapchain
    pub main: ScenePipelines,
    /// Drawn into the reflection target
    pub mirror: ScenePipelines,
    pub water: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let layouts = BindLayouts::new(device);

        let shader = |label: &str, source: &'static str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        };
        let noise_shader = shader("Noise Shader", NOISE_SHADER);
        let sky_shader = shader("Sky Shader", SKY_SHADER);
        let object_shader = shader("Object Shader", OBJECT_SHADER);
        let water_shader = shader("Water Shader", WATER_SHADER);

        let pipeline_layout = |label: &str, groups: &[&wgpu::BindGroupLayout]| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: groups,
                push_constant_ranges: &[],
            })
        };
        let noise_layout = pipeline_layout("Noise Pipeline Layout", &[&layouts.noise]);
        let scene_layout =
            pipeline_layout("Scene Pipeline Layout", &[&layouts.view, &layouts.scene]);
        let water_layout = pipeline_layout(
            "Water Pipeline Layout",
            &[&layouts.view, &layouts.scene, &layouts.water],
        );

        let object_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &OBJECT_ATTRIBUTES,
        }];
        let water_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<WaterVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &WATER_ATTRIBUTES,
        }];

        let scene_pipelines = |target: &str, format: wgpu::TextureFormat| ScenePipelines {
            sky: create_pipeline(
                device,
                PipelineSpec {
                    label: &format!("Sky Pipeline ({})", target),
                    shader: &sky_shader,
                    layout: &scene_layout,
                    buffers: &[],
                    format,
                    blend: None,
                    depth: depth_state(false, wgpu::CompareFunction::Always),
                    cull_mode: None,
                },
            ),
            object: create_pipeline(
                device,
                PipelineSpec {
                    label: &format!("Object Pipeline ({})", target),
                    shader: &object_shader,
                    layout: &scene_layout,
                    buffers: &object_buffers,
                    format,
                    blend: None,
                    depth: depth_state(true, wgpu::CompareFunction::Less),
                    cull_mode: Some(wgpu::Face::Back),
                },
            ),
        };

        let noise = create_pipeline(
            device,
            PipelineSpec {
                label: "Noise Pipeline",
                shader: &noise_shader,
                layout: &noise_layout,
                buffers: &[],
                format: HEIGHTFIELD_FORMAT,
                blend: None,
                depth: None,
                cull_mode: None,
            },
        );

        // Drawn last in the main pass; blends over sky and object
        let water = create_pipeline(
            device,
            PipelineSpec {
                label: "Water Pipeline",
                shader: &water_shader,
                layout: &water_layout,
                buffers: &water_buffers,
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth: depth_state(true, wgpu::CompareFunction::Less),
                cull_mode: None,
            },
        );

        Self {
            main: scene_pipelines("main", surface_format),
            mirror: scene_pipelines("mirror", REFLECTION_FORMAT),
            noise,
            water,
            layouts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source).expect("WGSL should parse");
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator.validate(&module).expect("WGSL should validate");
        module
    }

    fn entry_points(module: &naga::Module) -> Vec<(&str, naga::ShaderStage)> {
        module
            .entry_points
            .iter()
            .map(|ep| (ep.name.as_str(), ep.stage))
            .collect()
    }

    /// Scalar components of a constant initializer
    fn const_components(module: &naga::Module, expr: naga::Handle<naga::Expression>) -> Vec<f32> {
        match &module.global_expressions[expr] {
            naga::Expression::Literal(naga::Literal::F32(v)) => vec![*v],
            naga::Expression::Literal(naga::Literal::AbstractFloat(v)) => vec![*v as f32],
            naga::Expression::Compose { components, .. } => components
                .iter()
                .flat_map(|c| const_components(module, *c))
                .collect(),
            naga::Expression::Constant(c) => const_components(module, module.constants[*c].init),
            other => panic!("unsupported constant initializer {:?}", other),
        }
    }

    fn shader_constants(source: &str) -> HashMap<String, Vec<f32>> {
        let module = validate(source);
        module
            .constants
            .iter()
            .filter_map(|(_, c)| Some((c.name.clone()?, const_components(&module, c.init))))
            .collect()
    }

    #[test]
    fn test_water_shader_constants_match_host_shading() {
        use crate::shading;

        let constants = shader_constants(WATER_SHADER);
        for (name, host) in [
            ("SHININESS", shading::SHININESS),
            ("SPECULAR_WEIGHT", shading::SPECULAR_WEIGHT),
            ("DIFFUSE_WEIGHT", shading::DIFFUSE_WEIGHT),
            ("COARSE_NORMAL_WEIGHT", shading::COARSE_NORMAL_WEIGHT),
            ("FINE_NORMAL_WEIGHT", shading::FINE_NORMAL_WEIGHT),
            ("WAVE_UV_SCALE", shading::WAVE_UV_SCALE),
            ("DISTORTION_SCALE", shading::DISTORTION_SCALE),
            ("MIN_DISTORTION", shading::MIN_DISTORTION),
            ("REFLECTION_ALPHA_CUTOFF", shading::REFLECTION_ALPHA_CUTOFF),
            ("FRESNEL_F0", shading::FRESNEL_F0),
            ("FRESNEL_POWER", shading::FRESNEL_POWER),
            ("AMBIENT", shading::AMBIENT),
            ("REFLECTIVE_ALPHA", shading::REFLECTIVE_ALPHA),
            ("FALLBACK_ALPHA", shading::FALLBACK_ALPHA),
        ] {
            assert_eq!(constants.get(name), Some(&vec![host]), "{}", name);
        }
    }

    #[test]
    fn test_noise_shader_hash_matches_host_noise() {
        use crate::noise;

        let constants = shader_constants(NOISE_SHADER);
        assert_eq!(
            constants.get("HASH_COEFF_X"),
            Some(&noise::HASH_COEFF_X.to_array().to_vec())
        );
        assert_eq!(
            constants.get("HASH_COEFF_Y"),
            Some(&noise::HASH_COEFF_Y.to_array().to_vec())
        );
        assert_eq!(constants.get("HASH_SCALE"), Some(&vec![noise::HASH_SCALE]));
    }

    #[test]
    fn test_shaders_validate_with_expected_entry_points() {
        for source in [NOISE_SHADER, SKY_SHADER, OBJECT_SHADER, WATER_SHADER] {
            let module = validate(source);
            let entries = entry_points(&module);
            assert!(entries.contains(&("vs_main", naga::ShaderStage::Vertex)));
            assert!(entries.contains(&("fs_main", naga::ShaderStage::Fragment)));
        }
    }

    #[test]
    fn test_scene_uniform_struct_matches_host_layout() {
        let module = validate(WATER_SHADER);
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("SceneUniforms"))
            .expect("SceneUniforms declared");
        let naga::TypeInner::Struct { span, .. } = &ty.inner else {
            panic!("SceneUniforms is not a struct");
        };
        assert_eq!(
            *span as usize,
            std::mem::size_of::<crate::frame::SceneUniforms>()
        );
    }

    #[test]
    fn test_sky_uniform_struct_matches_host_layout() {
        let module = validate(SKY_SHADER);
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("SkyUniforms"))
            .expect("SkyUniforms declared");
        let naga::TypeInner::Struct { span, .. } = &ty.inner else {
            panic!("SkyUniforms is not a struct");
        };
        assert_eq!(*span as usize, std::mem::size_of::<crate::sky::SkyUniforms>());
    }
}
