use glam::Vec3;
use range_common::Aabb;
use serde::{Deserialize, Serialize};

/// Floats per vertex in [`MeshAsset::vertices`]: position, normal, uv.
pub const MESH_STRIDE: usize = 8;

/// Interleaved triangle-list geometry with its model-space bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshAsset {
    pub name: String,
    /// `[px, py, pz, nx, ny, nz, u, v]` per vertex.
    pub vertices: Vec<f32>,
    pub bounds: Aabb,
}

impl MeshAsset {
    /// Build a mesh, fitting bounds to the vertex positions.
    ///
    /// Returns `None` when `vertices` is empty or not a whole number of vertices.
    pub fn from_vertices(name: impl Into<String>, vertices: Vec<f32>) -> Option<Self> {
        if vertices.is_empty() || vertices.len() % MESH_STRIDE != 0 {
            return None;
        }
        let bounds = Aabb::from_points(
            vertices
                .chunks_exact(MESH_STRIDE)
                .map(|v| Vec3::new(v[0], v[1], v[2])),
        )?;
        Some(Self {
            name: name.into(),
            vertices,
            bounds,
        })
    }

    /// Axis-aligned box with the given half extents, centered at `center`.
    pub fn cuboid(name: impl Into<String>, center: Vec3, half_extents: Vec3) -> Self {
        let vertices = cuboid_vertices(center, half_extents);
        Self {
            name: name.into(),
            vertices,
            bounds: Aabb::from_center_half_extents(center, half_extents),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / MESH_STRIDE
    }
}

fn cuboid_vertices(center: Vec3, h: Vec3) -> Vec<f32> {
    // (normal, tangent u, tangent v) per face; corners wind counter-clockwise seen from outside.
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let quad = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut out = Vec::with_capacity(faces.len() * quad.len() * MESH_STRIDE);
    for (n, u, v) in faces {
        for (su, sv) in quad {
            let p = center + (n + u * su + v * sv) * h;
            out.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z, (su + 1.0) * 0.5, (sv + 1.0) * 0.5]);
        }
    }
    out
}
