//! Subdivided water plane, displaced on the GPU from the heightfield.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::params::WaterParams;

/// Vertex data for the water mesh (flat position + heightfield UV)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WaterVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Heightfield UV to world XZ
///
/// Texture rows run opposite to world z, so `v = 0` is the far (+z) edge.
pub fn uv_to_world(uv: Vec2, plane_size_m: f32) -> Vec2 {
    Vec2::new((uv.x - 0.5) * plane_size_m, (0.5 - uv.y) * plane_size_m)
}

pub fn world_to_uv(world: Vec3, plane_size_m: f32) -> Vec2 {
    Vec2::new(world.x / plane_size_m + 0.5, 0.5 - world.z / plane_size_m)
}

/// Square grid centered on the world origin at y = 0
///
/// Heights come from the vertex shader; the plane offset is applied there too.
pub struct WaterGrid {
    pub vertices: Vec<WaterVertex>,
    pub indices: Vec<u32>,
    subdivisions: u32,
}

impl WaterGrid {
    pub fn new(water: &WaterParams) -> Self {
        let n = water.plane_subdivisions.max(1);
        let row = n + 1;

        let mut vertices = Vec::with_capacity((row * row) as usize);
        for j in 0..=n {
            for i in 0..=n {
                let uv = Vec2::new(i as f32 / n as f32, j as f32 / n as f32);
                let xz = uv_to_world(uv, water.plane_size_m);
                vertices.push(WaterVertex {
                    position: [xz.x, 0.0, xz.y],
                    uv: uv.to_array(),
                });
            }
        }

        // Counter-clockwise seen from above; rows step toward -z
        let mut indices = Vec::with_capacity((n * n * 6) as usize);
        for j in 0..n {
            for i in 0..n {
                let top_left = j * row + i;
                let top_right = top_left + 1;
                let bottom_left = top_left + row;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    top_right,
                    bottom_left,
                    top_right,
                    bottom_right,
                    bottom_left,
                ]);
            }
        }

        Self {
            vertices,
            indices,
            subdivisions: n,
        }
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }
}
