//! Main camera: scripted pose or free orbit, toggled at runtime.

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::params::{CameraPreset, FixedCamera, OrbitCameraParams, RenderConfig};

/// Perspective camera with a world transform
///
/// Looks down its local -Z with +Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_y_rad: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    /// Camera at `eye` facing `target`
    pub fn looking_at(eye: Vec3, target: Vec3, up: Vec3, config: &RenderConfig) -> Self {
        let world = Mat4::look_at_rh(eye, target, up).inverse();
        Self {
            position: eye,
            rotation: Quat::from_mat4(&world).normalize(),
            fov_y_rad: config.fov_degrees.to_radians(),
            aspect: config.aspect_ratio(),
            near: config.near_plane_m,
            far: config.far_plane_m,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Spherical-coordinate camera circling a target
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Horizontal angle (degrees)
    pub azimuth: f32,
    /// Vertical angle (degrees), clamped short of the poles
    pub elevation: f32,
    pub distance: f32,
    pub target: Vec3,
    params: OrbitCameraParams,
}

impl OrbitCamera {
    const MAX_ELEVATION: f32 = 89.0;

    pub fn new(params: OrbitCameraParams) -> Self {
        Self {
            azimuth: params.azimuth_deg,
            elevation: params.elevation_deg,
            distance: params.distance_m,
            target: Vec3::from_array(params.target),
            params,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let az = self.azimuth.to_radians();
        let el = self.elevation.to_radians();
        self.target
            + self.distance * Vec3::new(el.cos() * az.sin(), el.sin(), el.cos() * az.cos())
    }

    /// Rotate by a mouse drag (pixels)
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.azimuth = (self.azimuth - dx * self.params.orbit_sensitivity).rem_euclid(360.0);
        self.elevation = (self.elevation + dy * self.params.orbit_sensitivity)
            .clamp(-Self::MAX_ELEVATION, Self::MAX_ELEVATION);
    }

    /// Zoom by scroll lines, positive moves closer
    pub fn zoom(&mut self, lines: f32) {
        let factor = 1.0 - lines * self.params.zoom_factor;
        self.distance = (self.distance * factor.max(0.1))
            .clamp(self.params.min_distance_m, self.params.max_distance_m);
    }
}

/// Which source drives the main camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Fixed,
    Orbit,
}

/// Owns both camera sources and the projection settings
pub struct CameraSystem {
    mode: CameraMode,
    fixed: FixedCamera,
    orbit: OrbitCamera,
    config: RenderConfig,
    dragging: bool,
    last_cursor: Option<(f32, f32)>,
}

impl CameraSystem {
    pub fn new(preset: CameraPreset, config: RenderConfig) -> Self {
        let (mode, fixed, orbit) = match preset {
            CameraPreset::Fixed(fixed) => (
                CameraMode::Fixed,
                fixed,
                OrbitCamera::new(OrbitCameraParams::default()),
            ),
            CameraPreset::Orbit(params) => {
                (CameraMode::Orbit, FixedCamera::default(), OrbitCamera::new(params))
            }
        };
        Self {
            mode,
            fixed,
            orbit,
            config,
            dragging: false,
            last_cursor: None,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Switch between the scripted pose and the orbit camera
    pub fn toggle(&mut self) -> CameraMode {
        self.mode = match self.mode {
            CameraMode::Fixed => CameraMode::Orbit,
            CameraMode::Orbit => CameraMode::Fixed,
        };
        self.dragging = false;
        self.mode
    }

    /// Track the new viewport aspect ratio
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.window_width = width;
            self.config.window_height = height;
        }
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging && self.mode == CameraMode::Orbit;
        if !self.dragging {
            self.last_cursor = None;
        }
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        if self.dragging {
            if let Some((last_x, last_y)) = self.last_cursor {
                self.orbit.orbit(x - last_x, y - last_y);
            }
        }
        self.last_cursor = Some((x, y));
    }

    pub fn scroll(&mut self, lines: f32) {
        if self.mode == CameraMode::Orbit {
            self.orbit.zoom(lines);
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Current main camera
    pub fn camera(&self) -> PerspectiveCamera {
        match self.mode {
            CameraMode::Fixed => {
                let [x, y, z] = self.fixed.rotation_xyz;
                PerspectiveCamera {
                    position: Vec3::from_array(self.fixed.position),
                    rotation: Quat::from_euler(EulerRot::XYZ, x, y, z),
                    fov_y_rad: self.config.fov_degrees.to_radians(),
                    aspect: self.config.aspect_ratio(),
                    near: self.config.near_plane_m,
                    far: self.config.far_plane_m,
                }
            }
            CameraMode::Orbit => PerspectiveCamera::looking_at(
                self.orbit.eye(),
                self.orbit.target,
                Vec3::Y,
                &self.config,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looking_at_faces_target() {
        let config = RenderConfig::default();
        let camera =
            PerspectiveCamera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y, &config);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-5);
        assert!((camera.up() - Vec3::Y).length() < 1e-5);

        // The target lands in the middle of clip space
        let clip = camera.view_proj().project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
    }

    #[test]
    fn test_toggle_switches_modes() {
        let mut cameras = CameraSystem::new(CameraPreset::default(), RenderConfig::default());
        assert_eq!(cameras.mode(), CameraMode::Orbit);
        assert_eq!(cameras.toggle(), CameraMode::Fixed);

        let fixed = cameras.camera();
        assert_eq!(fixed.position, Vec3::new(-1.5784, 5.6844, 7.5588));
        assert_eq!(cameras.toggle(), CameraMode::Orbit);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut cameras = CameraSystem::new(CameraPreset::default(), RenderConfig::default());
        cameras.resize(800, 800);
        assert_eq!(cameras.camera().aspect, 1.0);

        // Minimized windows keep the last aspect
        cameras.resize(0, 0);
        assert_eq!(cameras.camera().aspect, 1.0);
    }

    #[test]
    fn test_orbit_clamps_elevation_and_distance() {
        let mut orbit = OrbitCamera::new(OrbitCameraParams::default());
        orbit.orbit(0.0, 10_000.0);
        assert_eq!(orbit.elevation, 89.0);

        for _ in 0..100 {
            orbit.zoom(5.0);
        }
        assert_eq!(orbit.distance, OrbitCameraParams::default().min_distance_m);
    }

    #[test]
    fn test_drag_only_orbits_in_orbit_mode() {
        let mut cameras = CameraSystem::new(CameraPreset::default(), RenderConfig::default());
        let before = cameras.camera().position;
        cameras.set_dragging(true);
        cameras.cursor_moved(100.0, 100.0);
        cameras.cursor_moved(150.0, 100.0);
        assert_ne!(cameras.camera().position, before);

        cameras.toggle();
        cameras.set_dragging(true);
        let fixed = cameras.camera().position;
        cameras.cursor_moved(300.0, 300.0);
        assert_eq!(cameras.camera().position, fixed);
    }
}
