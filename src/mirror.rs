//! Planar reflection camera across the water surface.
//!
//! The mirror plane sits at the floating object's height rather than the
//! nominal water level so the reflection stays glued to the hull.

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::camera::PerspectiveCamera;

/// World transform of the water plane mesh
///
/// The surface normal is the plane's local +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterPlane {
    pub position: Vec3,
    pub rotation: Quat,
}

impl WaterPlane {
    /// Horizontal plane at `height`, local +Z turned to world +Y
    pub fn horizontal(height: f32) -> Self {
        Self {
            position: Vec3::new(0.0, height, 0.0),
            rotation: Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
        }
    }

    pub fn normal(&self) -> Vec3 {
        (self.rotation * Vec3::Z).normalize()
    }
}

/// Camera reflected across the mirror plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub view: Mat4,
    /// Copied from the main camera
    pub projection: Mat4,
    /// Copied from the main camera
    pub far: f32,
}

impl MirrorCamera {
    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Clip space [-1,1] to texture space [0,1]; v grows downward
pub const REFLECTION_BIAS: Mat4 = Mat4::from_cols(
    Vec4::new(0.5, 0.0, 0.0, 0.0),
    Vec4::new(0.0, -0.5, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.5, 0.5, 0.0, 1.0),
);

/// `v - 2 (v·n) n`
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Mirror `camera` across `plane`, with the plane lifted to `anchor_height`
///
/// `None` when the camera is on the back side of the plane or exactly on it;
/// the reflection pass is skipped for that frame.
pub fn create_mirror_camera(
    camera: &PerspectiveCamera,
    plane: &WaterPlane,
    anchor_height: f32,
) -> Option<MirrorCamera> {
    let mirror_point = Vec3::new(plane.position.x, anchor_height, plane.position.z);
    let normal = plane.normal();

    let view = mirror_point - camera.position;
    if view.dot(normal) >= 0.0 {
        return None;
    }
    let position = -reflect(view, normal) + mirror_point;

    let look_at = camera.position + camera.forward();
    let target = -reflect(mirror_point - look_at, normal) + mirror_point;
    let up = reflect(camera.up(), normal);

    Some(MirrorCamera {
        position,
        target,
        up,
        view: Mat4::look_at_rh(position, target, up),
        projection: camera.projection_matrix(),
        far: camera.far,
    })
}

/// World position to mirror texture coordinates (before the divide by w)
pub fn reflection_texture_matrix(mirror: &MirrorCamera) -> Mat4 {
    REFLECTION_BIAS * mirror.projection * mirror.view
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn camera_at(position: Vec3, rotation: Quat) -> PerspectiveCamera {
        PerspectiveCamera {
            position,
            rotation,
            fov_y_rad: 75f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    fn looking_down() -> Quat {
        Quat::from_rotation_x(-FRAC_PI_2)
    }

    #[test]
    fn test_horizontal_plane_normal_is_up() {
        let plane = WaterPlane::horizontal(0.0);
        assert!((plane.normal() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_camera_above_plane_is_reflected_below() {
        let camera = camera_at(Vec3::new(0.0, 5.0, 0.0), looking_down());
        let mirror = create_mirror_camera(&camera, &WaterPlane::horizontal(0.0), 0.0).unwrap();

        assert!((mirror.position - Vec3::new(0.0, -5.0, 0.0)).length() < 1e-5);
        // Looking down becomes looking up
        assert!((mirror.target - Vec3::new(0.0, -4.0, 0.0)).length() < 1e-5);
        assert_eq!(mirror.far, camera.far);
        assert_eq!(mirror.projection, camera.projection_matrix());
    }

    #[test]
    fn test_camera_below_plane_has_no_reflection() {
        let camera = camera_at(Vec3::new(0.0, -5.0, 0.0), looking_down());
        assert!(create_mirror_camera(&camera, &WaterPlane::horizontal(0.0), 0.0).is_none());
    }

    #[test]
    fn test_camera_on_plane_has_no_reflection() {
        let camera = camera_at(Vec3::new(3.0, 1.5, 0.0), Quat::IDENTITY);
        assert!(create_mirror_camera(&camera, &WaterPlane::horizontal(0.0), 1.5).is_none());
    }

    #[test]
    fn test_anchor_height_moves_mirror_plane() {
        let camera = camera_at(Vec3::new(2.0, 6.0, -3.0), Quat::IDENTITY);
        let mirror = create_mirror_camera(&camera, &WaterPlane::horizontal(0.02), 1.0).unwrap();
        // 5 m above a plane at y=1 reflects to 5 m below it
        assert!((mirror.position - Vec3::new(2.0, -4.0, -3.0)).length() < 1e-5);
        // Horizontal view stays horizontal, up flips
        assert!((mirror.target - Vec3::new(2.0, -4.0, -4.0)).length() < 1e-5);
        assert!((mirror.up - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_reflection_matrix_maps_view_center_to_texture_center() {
        let camera = camera_at(Vec3::new(0.0, 5.0, 10.0), Quat::from_rotation_x(-0.4));
        let mirror = create_mirror_camera(&camera, &WaterPlane::horizontal(0.0), 0.0).unwrap();
        let matrix = reflection_texture_matrix(&mirror);

        let far_ahead = mirror.position + (mirror.target - mirror.position) * 20.0;
        let coord = matrix * far_ahead.extend(1.0);
        let uv = coord.truncate().truncate() / coord.w;
        assert!((uv.x - 0.5).abs() < 1e-4);
        assert!((uv.y - 0.5).abs() < 1e-4);
    }
}
