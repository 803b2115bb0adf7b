//! Per-frame pipeline: noise pass, read-back, alignment, mirror pass, main pass.
//!
//! The orchestrator owns the shared frame state and drives a [`FrameBackend`].
//! The GPU renderer is one backend; tests drive the same sequence against
//! in-memory buffers.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::alignment::{AlignmentTarget, SurfaceAlignmentSolver};
use crate::camera::PerspectiveCamera;
use crate::error::RenderError;
use crate::heightfield::HeightfieldSource;
use crate::mirror::{create_mirror_camera, reflection_texture_matrix, MirrorCamera, WaterPlane};
use crate::object::{FloatingObject, ObjectHandle, WaveNormalMap};
use crate::params::{AlignmentParams, ClockParams, ShadingParams, SunCycle, WaterParams};
use crate::sun::{SimClock, SunState};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    NoisePass,
    HeightfieldReadback,
    Alignment,
    MirrorPass,
    MainPass,
}

/// Uniform state shared by every pass of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Noise animation time, advanced by a fixed step per frame
    pub time: f32,
    pub wave_height: f32,
    pub sun: SunState,
    pub camera_position: Vec3,
    /// Last valid mirror mapping; kept when the mirror pass is skipped
    pub reflection_matrix: Mat4,
    pub object_model: Mat4,
}

impl FrameState {
    pub fn new(wave_height: f32, sun: SunState) -> Self {
        Self {
            time: 0.0,
            wave_height,
            sun,
            camera_position: Vec3::ZERO,
            reflection_matrix: Mat4::IDENTITY,
            object_model: Mat4::IDENTITY,
        }
    }

    pub fn scene_uniforms(&self, shading: &ShadingParams, water: &WaterParams) -> SceneUniforms {
        SceneUniforms {
            mirror_matrix: self.reflection_matrix.to_cols_array_2d(),
            object_model: self.object_model.to_cols_array_2d(),
            camera_position: self.camera_position.to_array(),
            time: self.time,
            sun_direction: self.sun.direction.to_array(),
            sun_intensity: self.sun.intensity,
            sun_color: shading.sun_color,
            wave_height: self.wave_height,
            water_color: shading.water_color,
            night_light: self.sun.night_light,
            ambient_color: shading.ambient_color,
            ambient_intensity: shading.ambient_intensity,
            noise: [
                water.noise_frequency,
                water.scroll_speed,
                water.normal_epsilon,
                water.normal_height_scale,
            ],
            plane: [
                water.plane_size_m,
                water.plane_height_m,
                water.noise_resolution as f32,
                0.0,
            ],
        }
    }
}

/// Uniform block shared by the noise, water, object and sky shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    pub mirror_matrix: [[f32; 4]; 4],
    pub object_model: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub time: f32,
    pub sun_direction: [f32; 3],
    pub sun_intensity: f32,
    pub sun_color: [f32; 3],
    pub wave_height: f32,
    pub water_color: [f32; 3],
    pub night_light: f32,
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    /// frequency, scroll speed, normal epsilon, normal height scale
    pub noise: [f32; 4],
    /// size (m), height (m), heightfield resolution, unused
    pub plane: [f32; 4],
}

/// Executes the GPU side of each stage
pub trait FrameBackend: HeightfieldSource {
    /// Upload the object mesh and wave-normal map once they arrive
    fn install_assets(
        &mut self,
        object: &FloatingObject,
        wave_normals: &WaveNormalMap,
    ) -> Result<(), RenderError>;

    /// Render the heightfield for `state.time`
    fn render_noise(&mut self, state: &FrameState) -> Result<(), RenderError>;

    /// Render the scene from the mirror camera into the reflection target
    fn render_mirror(&mut self, mirror: &MirrorCamera, state: &FrameState)
        -> Result<(), RenderError>;

    /// Render sky, object and water to the screen
    fn render_main(
        &mut self,
        camera: &PerspectiveCamera,
        state: &FrameState,
    ) -> Result<(), RenderError>;
}

/// What a frame actually did
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub stages: Vec<FrameStage>,
    pub target: Option<AlignmentTarget>,
}

impl FrameReport {
    pub fn ran(&self, stage: FrameStage) -> bool {
        self.stages.contains(&stage)
    }
}

/// Sequences the per-frame stages and owns all shared frame state
pub struct FrameOrchestrator {
    water: WaterParams,
    shading: ShadingParams,
    sun_cycle: SunCycle,
    clock: SimClock,
    solver: SurfaceAlignmentSolver,
    plane: WaterPlane,
    object: ObjectHandle,
    state: FrameState,
}

impl FrameOrchestrator {
    pub fn new(
        water: WaterParams,
        shading: ShadingParams,
        alignment: AlignmentParams,
        sun_cycle: SunCycle,
        clock: &ClockParams,
        object: ObjectHandle,
    ) -> Self {
        let clock = SimClock::new(clock);
        let sun = SunState::at_hour(clock.hour(), &sun_cycle);
        Self {
            solver: SurfaceAlignmentSolver::new(&water, alignment),
            plane: WaterPlane::horizontal(water.plane_height_m),
            state: FrameState::new(water.wave_height_m, sun),
            water,
            shading,
            sun_cycle,
            clock,
            object,
        }
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn object(&self) -> &ObjectHandle {
        &self.object
    }

    pub fn water(&self) -> &WaterParams {
        &self.water
    }

    pub fn shading(&self) -> &ShadingParams {
        &self.shading
    }

    pub fn scene_uniforms(&self) -> SceneUniforms {
        self.state.scene_uniforms(&self.shading, &self.water)
    }

    /// Run one frame; a no-op until the floating object is ready
    pub fn run_frame<B: FrameBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        camera: &PerspectiveCamera,
        real_dt: f32,
    ) -> Result<FrameReport, RenderError> {
        if let Some(wave_normals) = self.object.poll() {
            if let Some(object) = self.object.object() {
                backend.install_assets(object, &wave_normals)?;
            }
        }
        let Some(object) = self.object.object_mut() else {
            return Ok(FrameReport::default());
        };

        let mut report = FrameReport::default();

        let hour = self.clock.advance(real_dt);
        self.state.sun = SunState::at_hour(hour, &self.sun_cycle);
        self.state.time += self.water.time_step;
        self.state.camera_position = camera.position;
        self.state.object_model = object.pose.model_matrix();

        backend.render_noise(&self.state)?;
        report.stages.push(FrameStage::NoisePass);

        let target =
            self.solver
                .read_and_solve(&object.world_bounds(), backend, self.state.wave_height)?;
        report.stages.push(FrameStage::HeightfieldReadback);

        object.pose.blend_toward(&target, self.solver.params());
        self.state.object_model = object.pose.model_matrix();
        report.target = Some(target);
        report.stages.push(FrameStage::Alignment);

        match create_mirror_camera(camera, &self.plane, object.pose.position.y) {
            Some(mirror) => {
                self.state.reflection_matrix = reflection_texture_matrix(&mirror);
                backend.render_mirror(&mirror, &self.state)?;
                report.stages.push(FrameStage::MirrorPass);
            }
            None => log::trace!("Camera below mirror plane, reflection pass skipped"),
        }

        backend.render_main(camera, &self.state)?;
        report.stages.push(FrameStage::MainPass);

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::{GridRect, HeightfieldBuffer};
    use crate::object::{hull_mesh, HullDimensions, LoadedAssets};
    use crate::params::RenderConfig;
    use glam::Quat;
    use std::sync::mpsc;

    /// Records calls and serves a flat heightfield
    struct RecordingBackend {
        heightfield: HeightfieldBuffer,
        calls: Vec<&'static str>,
        reads: Vec<GridRect>,
        installed: usize,
        noise_times: Vec<f32>,
    }

    impl RecordingBackend {
        fn new(alpha: u8) -> Self {
            let resolution = WaterParams::default().noise_resolution;
            Self {
                heightfield: HeightfieldBuffer::from_full(
                    resolution,
                    vec![[128, 128, 255, alpha]; (resolution * resolution) as usize],
                ),
                calls: Vec::new(),
                reads: Vec::new(),
                installed: 0,
                noise_times: Vec::new(),
            }
        }
    }

    impl HeightfieldSource for RecordingBackend {
        fn resolution(&self) -> u32 {
            self.heightfield.resolution()
        }

        fn read_region(&mut self, rect: GridRect) -> Result<HeightfieldBuffer, RenderError> {
            self.calls.push("read");
            self.reads.push(rect);
            Ok(self.heightfield.crop(rect))
        }
    }

    impl FrameBackend for RecordingBackend {
        fn install_assets(
            &mut self,
            _object: &FloatingObject,
            _wave_normals: &WaveNormalMap,
        ) -> Result<(), RenderError> {
            self.installed += 1;
            Ok(())
        }

        fn render_noise(&mut self, state: &FrameState) -> Result<(), RenderError> {
            self.calls.push("noise");
            self.noise_times.push(state.time);
            Ok(())
        }

        fn render_mirror(
            &mut self,
            _mirror: &MirrorCamera,
            _state: &FrameState,
        ) -> Result<(), RenderError> {
            self.calls.push("mirror");
            Ok(())
        }

        fn render_main(
            &mut self,
            _camera: &PerspectiveCamera,
            _state: &FrameState,
        ) -> Result<(), RenderError> {
            self.calls.push("main");
            Ok(())
        }
    }

    fn ready_handle() -> ObjectHandle {
        let (tx, rx) = mpsc::channel();
        let assets = LoadedAssets {
            object: FloatingObject::new(hull_mesh(&HullDimensions::default())),
            wave_normals: WaveNormalMap::procedural(8, 0),
        };
        tx.send(Ok(assets)).unwrap();
        ObjectHandle::Pending(rx)
    }

    fn orchestrator(object: ObjectHandle) -> FrameOrchestrator {
        FrameOrchestrator::new(
            WaterParams::default(),
            ShadingParams::default(),
            AlignmentParams::default(),
            SunCycle::default(),
            &ClockParams::default(),
            object,
        )
    }

    fn camera_at(position: Vec3) -> PerspectiveCamera {
        PerspectiveCamera::looking_at(position, Vec3::ZERO, Vec3::Y, &RenderConfig::default())
    }

    #[test]
    fn test_stages_run_in_order() {
        let mut frames = orchestrator(ready_handle());
        let mut backend = RecordingBackend::new(128);
        let report = frames
            .run_frame(&mut backend, &camera_at(Vec3::new(0.0, 5.0, 10.0)), 0.016)
            .unwrap();

        assert_eq!(
            report.stages,
            vec![
                FrameStage::NoisePass,
                FrameStage::HeightfieldReadback,
                FrameStage::Alignment,
                FrameStage::MirrorPass,
                FrameStage::MainPass,
            ]
        );
        assert_eq!(backend.calls, vec!["noise", "read", "mirror", "main"]);
        assert_eq!(backend.installed, 1);
    }

    #[test]
    fn test_one_bounded_readback_per_frame() {
        let mut frames = orchestrator(ready_handle());
        let mut backend = RecordingBackend::new(128);
        let camera = camera_at(Vec3::new(0.0, 5.0, 10.0));
        for _ in 0..3 {
            frames.run_frame(&mut backend, &camera, 0.016).unwrap();
        }

        assert_eq!(backend.reads.len(), 3);
        let full = backend.heightfield.resolution() * backend.heightfield.resolution();
        assert!(backend.reads.iter().all(|r| r.texel_count() < full as usize / 100));
        assert_eq!(backend.installed, 1);
    }

    #[test]
    fn test_pending_object_skips_every_stage() {
        let (_tx, rx) = mpsc::channel();
        let mut frames = orchestrator(ObjectHandle::Pending(rx));
        let mut backend = RecordingBackend::new(128);
        let report = frames
            .run_frame(&mut backend, &camera_at(Vec3::new(0.0, 5.0, 10.0)), 0.016)
            .unwrap();

        assert!(report.stages.is_empty());
        assert!(backend.calls.is_empty());
        assert_eq!(frames.state().time, 0.0);
    }

    #[test]
    fn test_failed_object_skips_every_stage() {
        let mut frames = orchestrator(ObjectHandle::Failed);
        let mut backend = RecordingBackend::new(128);
        let report = frames
            .run_frame(&mut backend, &camera_at(Vec3::new(0.0, 5.0, 10.0)), 0.016)
            .unwrap();
        assert!(report.stages.is_empty());
        assert_eq!(backend.installed, 0);
    }

    #[test]
    fn test_camera_underwater_skips_mirror_and_keeps_last_matrix() {
        let mut frames = orchestrator(ready_handle());
        let mut backend = RecordingBackend::new(0);
        frames
            .run_frame(&mut backend, &camera_at(Vec3::new(0.0, 5.0, 10.0)), 0.016)
            .unwrap();
        let last_matrix = frames.state().reflection_matrix;
        assert_ne!(last_matrix, Mat4::IDENTITY);

        let below = PerspectiveCamera {
            position: Vec3::new(0.0, -20.0, 10.0),
            rotation: Quat::IDENTITY,
            ..camera_at(Vec3::new(0.0, 5.0, 10.0))
        };
        let report = frames.run_frame(&mut backend, &below, 0.016).unwrap();

        assert!(!report.ran(FrameStage::MirrorPass));
        assert!(report.ran(FrameStage::MainPass));
        assert_eq!(frames.state().reflection_matrix, last_matrix);
    }

    #[test]
    fn test_time_advances_by_fixed_step() {
        let mut frames = orchestrator(ready_handle());
        let mut backend = RecordingBackend::new(128);
        let camera = camera_at(Vec3::new(0.0, 5.0, 10.0));
        frames.run_frame(&mut backend, &camera, 0.5).unwrap();
        frames.run_frame(&mut backend, &camera, 0.001).unwrap();

        assert!((backend.noise_times[0] - 0.01).abs() < 1e-6);
        assert!((backend.noise_times[1] - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_object_rises_toward_surface() {
        let mut frames = orchestrator(ready_handle());
        let mut backend = RecordingBackend::new(255);
        let camera = camera_at(Vec3::new(0.0, 5.0, 10.0));
        let mut last = f32::NEG_INFINITY;
        for _ in 0..10 {
            let report = frames.run_frame(&mut backend, &camera, 0.016).unwrap();
            assert!(report.target.is_some());
            let height = frames.state().object_model.w_axis.y;
            assert!(height > last);
            last = height;
        }
        // Full-height flat water with gain 2 sits at twice the wave height
        assert!(last < 2.0 * WaterParams::default().wave_height_m);
    }

    #[test]
    fn test_scene_uniforms_layout() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 240);
        let frames = orchestrator(ObjectHandle::Failed);
        let uniforms = frames.scene_uniforms();
        assert_eq!(uniforms.wave_height, 5.0);
        assert_eq!(uniforms.plane[2], 1024.0);
        assert_eq!(uniforms.noise[0], 10.0);
    }
}
