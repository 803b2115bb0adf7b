//! Procedural hull mesh for the floating object.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::alignment::Aabb;

/// Vertex data for the object mesh (position + flat normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Triangle mesh in object space
#[derive(Debug, Clone)]
pub struct ObjectMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl ObjectMesh {
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from_array(v.position)))
    }
}

/// Hull size in meters; the bow points along local +X
#[derive(Debug, Clone)]
pub struct HullDimensions {
    pub length_m: f32,
    pub beam_m: f32,
    /// Keel to origin
    pub draft_m: f32,
    /// Origin to deck
    pub freeboard_m: f32,
}

impl Default for HullDimensions {
    fn default() -> Self {
        Self {
            length_m: 4.0,
            beam_m: 1.6,
            draft_m: 0.4,
            freeboard_m: 0.6,
        }
    }
}

/// Convex hull: pointed deck outline over a narrower keel outline
pub fn hull_mesh(dims: &HullDimensions) -> ObjectMesh {
    let half_length = dims.length_m / 2.0;
    let half_beam = dims.beam_m / 2.0;
    let outline = [
        (-half_length, -half_beam),
        (half_length * 0.5, -half_beam),
        (half_length, 0.0),
        (half_length * 0.5, half_beam),
        (-half_length, half_beam),
    ];

    let deck: Vec<Vec3> = outline
        .iter()
        .map(|&(x, z)| Vec3::new(x, dims.freeboard_m, z))
        .collect();
    let keel: Vec<Vec3> = outline
        .iter()
        .map(|&(x, z)| Vec3::new(x * 0.9, -dims.draft_m, z * 0.6))
        .collect();

    let mut triangles = Vec::new();
    for i in 1..outline.len() - 1 {
        triangles.push([deck[0], deck[i], deck[i + 1]]);
        triangles.push([keel[0], keel[i + 1], keel[i]]);
    }
    for i in 0..outline.len() {
        let j = (i + 1) % outline.len();
        triangles.push([deck[i], keel[i], keel[j]]);
        triangles.push([deck[i], keel[j], deck[j]]);
    }

    let center = deck.iter().chain(keel.iter()).copied().sum::<Vec3>() / (deck.len() * 2) as f32;
    let mut mesh = ObjectMesh {
        vertices: Vec::with_capacity(triangles.len() * 3),
        indices: Vec::with_capacity(triangles.len() * 3),
    };
    for mut tri in triangles {
        let mut normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
        let face_center = (tri[0] + tri[1] + tri[2]) / 3.0;
        // Counter-clockwise seen from outside
        if normal.dot(face_center - center) < 0.0 {
            tri.swap(1, 2);
            normal = -normal;
        }
        for corner in tri {
            mesh.indices.push(mesh.vertices.len() as u32);
            mesh.vertices.push(MeshVertex {
                position: corner.to_array(),
                normal: normal.to_array(),
            });
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hull_bounds_match_dimensions() {
        let dims = HullDimensions::default();
        let bounds = hull_mesh(&dims).bounds().unwrap();
        assert_eq!(bounds.min.y, -dims.draft_m);
        assert_eq!(bounds.max.y, dims.freeboard_m);
        assert_eq!(bounds.max.x, dims.length_m / 2.0);
        assert_eq!(bounds.max.z, dims.beam_m / 2.0);
    }

    #[test]
    fn test_hull_normals_face_outward() {
        let mesh = hull_mesh(&HullDimensions::default());
        assert_eq!(mesh.indices.len() % 3, 0);
        for tri in mesh.indices.chunks(3) {
            let a = Vec3::from_array(mesh.vertices[tri[0] as usize].position);
            let b = Vec3::from_array(mesh.vertices[tri[1] as usize].position);
            let c = Vec3::from_array(mesh.vertices[tri[2] as usize].position);
            let winding = (b - a).cross(c - a);
            let normal = Vec3::from_array(mesh.vertices[tri[0] as usize].normal);
            assert!(winding.dot(normal) > 0.0);
        }
    }
}
