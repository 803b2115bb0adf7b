//! Fits the floating object's target pose to the sampled wave surface.

use glam::{IVec2, Quat, Vec3};

use super::{Aabb, FootprintPoints, GridProjection};
use crate::error::RenderError;
use crate::heightfield::{HeightfieldSampler, HeightfieldSource};
use crate::params::{AlignmentParams, WaterParams};

/// Where the object should settle this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentTarget {
    /// Mean of the four gain-scaled corner heights (meters)
    pub height: f32,
    /// Fitted support-plane normal (world space)
    pub normal: Vec3,
    /// Tilt onto `normal`, then the fixed yaw correction
    pub orientation: Quat,
    /// Footprint corners in grid space, `y` holding the scaled height
    pub corners: [Vec3; 4],
}

/// Projects an object footprint onto the heightfield and derives a target pose
#[derive(Debug, Clone)]
pub struct SurfaceAlignmentSolver {
    projection: GridProjection,
    params: AlignmentParams,
}

impl SurfaceAlignmentSolver {
    pub fn new(water: &WaterParams, params: AlignmentParams) -> Self {
        Self {
            projection: GridProjection::new(water.noise_resolution, water.plane_size_m),
            params,
        }
    }

    pub fn params(&self) -> &AlignmentParams {
        &self.params
    }

    pub fn projection(&self) -> &GridProjection {
        &self.projection
    }

    /// Grid texels under the four footprint corners
    ///
    /// Corners that round onto the same column or row are pushed apart by
    /// the inflation distance (at least one texel) so the plane fit sees
    /// the slope.
    pub fn grid_points(&self, bounds: &Aabb) -> [IVec2; 4] {
        let mut grid = FootprintPoints::from_bounds(bounds, &self.params)
            .0
            .map(|p| self.projection.project(p));

        let inflation = ((self.params.inflation_m * self.projection.scale).round() as i32).max(1);
        if grid[2].x <= grid[0].x {
            grid[2].x = grid[0].x + inflation;
            grid[3].x = grid[0].x + inflation;
        }
        if grid[1].y <= grid[0].y {
            grid[1].y = grid[0].y + inflation;
            grid[3].y = grid[0].y + inflation;
        }
        grid
    }

    /// Read the footprint region from `source` once, then solve
    pub fn read_and_solve<S: HeightfieldSource + ?Sized>(
        &self,
        bounds: &Aabb,
        source: &mut S,
        wave_height: f32,
    ) -> Result<AlignmentTarget, RenderError> {
        let grid = self.grid_points(bounds);
        let sampler = HeightfieldSampler::read(source, &grid, wave_height)?;
        Ok(self.solve_grid(grid, &sampler))
    }

    /// Target pose for `bounds` over an already-read sampler
    pub fn solve(&self, bounds: &Aabb, sampler: &HeightfieldSampler) -> AlignmentTarget {
        self.solve_grid(self.grid_points(bounds), sampler)
    }

    fn solve_grid(&self, grid: [IVec2; 4], sampler: &HeightfieldSampler) -> AlignmentTarget {
        let corners = grid.map(|p| {
            Vec3::new(
                p.x as f32,
                sampler.height(p) * self.params.height_gain,
                p.y as f32,
            )
        });

        let normal = fit_plane_normal(&corners);
        let tilt = Quat::from_rotation_arc(Vec3::Y, normal);
        let yaw = Quat::from_axis_angle(Vec3::Y, self.params.yaw_correction_rad);

        AlignmentTarget {
            height: corners.iter().map(|c| c.y).sum::<f32>() / corners.len() as f32,
            normal,
            orientation: tilt * yaw,
            corners,
        }
    }
}

/// Normal of the plane through the first three footprint corners, with z
/// flipped from grid orientation (texture rows) back to world orientation
pub fn fit_plane_normal(corners: &[Vec3; 4]) -> Vec3 {
    let edge_a = corners[1] - corners[0];
    let edge_b = corners[2] - corners[0];
    let normal = edge_a.cross(edge_b).try_normalize().unwrap_or(Vec3::Y);
    Vec3::new(normal.x, normal.y, -normal.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::ObjectPose;
    use crate::heightfield::{HeightfieldBuffer, Texel};

    fn flat_buffer(resolution: u32, alpha: u8) -> HeightfieldBuffer {
        let texels: Vec<Texel> = vec![[128, 255, 128, alpha]; (resolution * resolution) as usize];
        HeightfieldBuffer::from_full(resolution, texels)
    }

    fn hull_bounds() -> Aabb {
        Aabb::new(Vec3::new(-1.0, -0.5, -2.0), Vec3::new(1.0, 0.5, 2.0))
    }

    #[test]
    fn test_flat_surface_gives_upright_target() {
        let solver = SurfaceAlignmentSolver::new(&WaterParams::default(), AlignmentParams::default());
        let mut buffer = flat_buffer(1024, 255);
        let target = solver
            .read_and_solve(&hull_bounds(), &mut buffer, 5.0)
            .unwrap();

        // Gain 2 on top of the 5 m wave height
        assert!((target.height - 10.0).abs() < 1e-5);
        assert!((target.normal - Vec3::Y).length() < 1e-6);

        let expected = Quat::from_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_2);
        assert!(target.orientation.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_synthetic_two_by_two_target_height_is_mean_of_corner_heights() {
        // Plane 2 m across on a 2 texel grid: 1 texel per meter, origin at texel 1
        let water = WaterParams {
            noise_resolution: 2,
            plane_size_m: 2.0,
            ..Default::default()
        };
        let params = AlignmentParams {
            height_gain: 1.0,
            ..Default::default()
        };
        let solver = SurfaceAlignmentSolver::new(&water, params);

        // Row-major (x, z): (0,0)=0, (1,0)=255, (0,1)=128, (1,1)=64
        let texels: Vec<Texel> = [0u8, 255, 128, 64].map(|a| [128, 255, 128, a]).to_vec();
        let buffer = HeightfieldBuffer::from_full(2, texels);
        let sampler = HeightfieldSampler::from_buffer(buffer, 1.0);

        let bounds = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(0.0, 0.5, 0.0));
        let grid = solver.grid_points(&bounds);
        assert_eq!(
            grid,
            [
                IVec2::new(0, 0),
                IVec2::new(0, 1),
                IVec2::new(1, 0),
                IVec2::new(1, 1)
            ]
        );

        let target = solver.solve(&bounds, &sampler);
        let mean = grid.iter().map(|p| sampler.height(*p)).sum::<f32>() / 4.0;
        assert!((target.height - mean).abs() < 1e-6);
        assert!((mean - (0.0 + 255.0 + 128.0 + 64.0) / 255.0 / 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_height_gain_scales_target_height() {
        let water = WaterParams {
            noise_resolution: 2,
            plane_size_m: 2.0,
            ..Default::default()
        };
        let solver = SurfaceAlignmentSolver::new(&water, AlignmentParams::default());
        let texels: Vec<Texel> = [0u8, 255, 128, 64].map(|a| [128, 255, 128, a]).to_vec();
        let sampler = HeightfieldSampler::from_buffer(HeightfieldBuffer::from_full(2, texels), 1.0);

        let bounds = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(0.0, 0.5, 0.0));
        let target = solver.solve(&bounds, &sampler);
        let mean = solver
            .grid_points(&bounds)
            .iter()
            .map(|p| sampler.height(*p))
            .sum::<f32>()
            / 4.0;
        assert!((target.height - 2.0 * mean).abs() < 1e-6);
    }

    #[test]
    fn test_plane_normal_flips_z_into_world_orientation() {
        // Height rises along grid z
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
        ];
        let normal = fit_plane_normal(&corners);
        assert!((normal.length() - 1.0).abs() < 1e-6);
        assert!(normal.y > 0.0);
        assert!(normal.z > 0.0);
        assert!(normal.x.abs() < 1e-6);
    }

    #[test]
    fn test_collapsed_footprint_still_fits_a_plane() {
        let solver = SurfaceAlignmentSolver::new(&WaterParams::default(), AlignmentParams::default());
        let mut buffer = flat_buffer(1024, 100);
        let point = Aabb::new(Vec3::ZERO, Vec3::ZERO);
        let target = solver.read_and_solve(&point, &mut buffer, 1.0).unwrap();
        assert!(target.normal.is_finite());
        assert!((target.normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_sub_texel_footprint_still_sees_slope() {
        // 16 texels over 8 m: 2 texels per meter, origin at texel 8
        let water = WaterParams {
            noise_resolution: 16,
            plane_size_m: 8.0,
            ..Default::default()
        };
        let solver = SurfaceAlignmentSolver::new(&water, AlignmentParams::default());

        // 0.2 m wide in x rounds both x corners onto column 8
        let bounds = Aabb::new(Vec3::new(-0.1, 0.0, -2.0), Vec3::new(0.1, 0.5, 2.0));
        let grid = solver.grid_points(&bounds);
        assert_eq!(grid[0].x, 8);
        assert_eq!(grid[2].x, 10);
        assert_eq!(grid[3].x, 10);
        assert!(grid[1].y > grid[0].y);

        // Height rises along grid x
        let texels: Vec<Texel> = (0..16 * 16)
            .map(|i| [128, 255, 128, ((i % 16) * 16) as u8])
            .collect();
        let sampler = HeightfieldSampler::from_buffer(HeightfieldBuffer::from_full(16, texels), 1.0);
        let target = solver.solve(&bounds, &sampler);
        assert!(target.normal.x.abs() > 1e-3);
    }

    #[test]
    fn test_wide_footprint_keeps_projected_corners() {
        let solver = SurfaceAlignmentSolver::new(&WaterParams::default(), AlignmentParams::default());
        let grid = solver.grid_points(&hull_bounds());
        assert_eq!(
            grid,
            [
                IVec2::new(510, 508),
                IVec2::new(510, 516),
                IVec2::new(514, 508),
                IVec2::new(514, 516)
            ]
        );
    }

    #[test]
    fn test_pose_blend_converges_without_overshoot() {
        let params = AlignmentParams::default();
        let target = AlignmentTarget {
            height: 3.0,
            normal: Vec3::Y,
            orientation: Quat::from_rotation_z(0.4) * Quat::from_rotation_y(1.2),
            corners: [Vec3::ZERO; 4],
        };
        let goal = Vec3::new(0.0, target.height, 0.0);
        let mut pose = ObjectPose {
            position: Vec3::new(0.0, -2.0, 0.0),
            orientation: Quat::IDENTITY,
        };

        let mut distance = pose.position.distance(goal);
        let mut angle = pose.orientation.angle_between(target.orientation);
        for _ in 0..60 {
            pose.blend_toward(&target, &params);
            let next_distance = pose.position.distance(goal);
            let next_angle = pose.orientation.angle_between(target.orientation);

            assert!(next_distance < distance);
            assert!(next_angle < angle);
            // Never past the target height
            assert!(pose.position.y <= target.height);
            distance = next_distance;
            angle = next_angle;
        }
    }
}
