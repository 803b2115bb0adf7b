//! Floating object footprint geometry and pose alignment.
//!
//! The object's world bounding box is reduced to its bottom face, projected
//! into heightfield grid space, and fitted to the sampled surface.

mod solver;

pub use solver::{AlignmentTarget, SurfaceAlignmentSolver};

use glam::{IVec2, Mat4, Quat, Vec3};

use crate::params::AlignmentParams;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box holding all `points`
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |b, p| {
            Self::new(b.min.min(p), b.max.max(p))
        }))
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// World-space box enclosing this box after `transform`
    pub fn transformed(&self, transform: &Mat4) -> Self {
        let corners = self.corners().map(|c| transform.transform_point3(c));
        // Eight corners, never empty
        Self::from_points(corners).unwrap_or(*self)
    }
}

/// Bottom-face corners of a bounding box, fixed order:
/// (min x, min z), (min x, max z), (max x, min z), (max x, max z)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintPoints(pub [Vec3; 4]);

impl FootprintPoints {
    /// Bottom face of `bounds`, with degenerate axes inflated on the max side
    pub fn from_bounds(bounds: &Aabb, params: &AlignmentParams) -> Self {
        let min = bounds.min;
        let mut max = bounds.max;
        if max.x - min.x < params.degenerate_extent_m {
            max.x = min.x + params.inflation_m;
        }
        if max.z - min.z < params.degenerate_extent_m {
            max.z = min.z + params.inflation_m;
        }

        Self([
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, min.y, max.z),
        ])
    }

    pub fn points(&self) -> &[Vec3; 4] {
        &self.0
    }
}

/// Maps world XZ onto heightfield texel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridProjection {
    /// Texels per world meter
    pub scale: f32,
    /// Texel coordinate of the world origin
    pub center: IVec2,
}

impl GridProjection {
    pub fn new(resolution: u32, plane_size_m: f32) -> Self {
        let center = (resolution as f32 / 2.0).round() as i32;
        Self {
            scale: resolution as f32 / plane_size_m,
            center: IVec2::splat(center),
        }
    }

    /// Nearest texel under a world point
    pub fn project(&self, world: Vec3) -> IVec2 {
        IVec2::new(
            (world.x * self.scale).round() as i32 + self.center.x,
            (world.z * self.scale).round() as i32 + self.center.y,
        )
    }
}

/// Position and orientation of the floating object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for ObjectPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl ObjectPose {
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// Move part of the way toward `target`; never snaps
    ///
    /// Only height is driven: the position target sits on the vertical axis.
    pub fn blend_toward(&mut self, target: &AlignmentTarget, params: &AlignmentParams) {
        self.orientation = self
            .orientation
            .slerp(target.orientation, params.orientation_blend);
        self.position = self.position.lerp(
            Vec3::new(0.0, target.height, 0.0),
            params.position_blend,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_world_origin_projects_to_grid_center() {
        let projection = GridProjection::new(1024, 512.0);
        assert_eq!(projection.scale, 2.0);
        assert_eq!(projection.project(Vec3::ZERO), IVec2::new(512, 512));
        assert_eq!(
            projection.project(Vec3::new(10.0, 3.0, -4.0)),
            IVec2::new(532, 504)
        );
    }

    #[test]
    fn test_projection_rounds_to_nearest_texel() {
        let projection = GridProjection::new(1024, 512.0);
        assert_eq!(
            projection.project(Vec3::new(0.3, 0.0, -0.2)),
            IVec2::new(513, 512)
        );
    }

    #[test]
    fn test_footprint_order_is_fixed() {
        let bounds = Aabb::new(Vec3::new(-1.0, -0.5, -2.0), Vec3::new(1.0, 0.5, 2.0));
        let footprint = FootprintPoints::from_bounds(&bounds, &AlignmentParams::default());
        assert_eq!(
            footprint.points(),
            &[
                Vec3::new(-1.0, -0.5, -2.0),
                Vec3::new(-1.0, -0.5, 2.0),
                Vec3::new(1.0, -0.5, -2.0),
                Vec3::new(1.0, -0.5, 2.0),
            ]
        );
    }

    #[test]
    fn test_degenerate_footprint_is_inflated() {
        let bounds = Aabb::new(Vec3::new(2.0, 0.0, -1.0), Vec3::new(2.0, 1.0, 1.0));
        let footprint = FootprintPoints::from_bounds(&bounds, &AlignmentParams::default());
        assert_eq!(footprint.0[2].x, 3.0);
        assert_eq!(footprint.0[3].x, 3.0);
        assert_eq!(footprint.0[1].z, 1.0);
    }

    #[test]
    fn test_transformed_bounds_enclose_rotated_box() {
        let bounds = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let rotated = bounds.transformed(&Mat4::from_rotation_y(FRAC_PI_4));
        let half_diagonal = 2.0_f32.sqrt();
        assert!((rotated.max.x - half_diagonal).abs() < 1e-5);
        assert!((rotated.min.z + half_diagonal).abs() < 1e-5);
        assert_eq!(rotated.max.y, 1.0);
    }
}
