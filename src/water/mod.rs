//! Water surface geometry.

mod mesh;

pub use mesh::{uv_to_world, world_to_uv, WaterGrid, WaterVertex};
