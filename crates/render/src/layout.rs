//! Vertex layouts and the built-in screen geometry.

/// One vertex attribute. Sizes and offsets count `f32`s, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub offset: u32,
}

/// Interleaved `f32` vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Floats per vertex.
    pub stride: u32,
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    /// Position, normal, texture coordinate.
    pub const POSITION_NORMAL_UV: Self = Self {
        stride: 8,
        attributes: &[
            VertexAttribute { location: 0, components: 3, offset: 0 },
            VertexAttribute { location: 1, components: 3, offset: 3 },
            VertexAttribute { location: 2, components: 2, offset: 6 },
        ],
    };

    /// Position only.
    pub const POSITION: Self = Self {
        stride: 3,
        attributes: &[VertexAttribute { location: 0, components: 3, offset: 0 }],
    };

    pub fn stride_bytes(&self) -> u64 {
        u64::from(self.stride) * std::mem::size_of::<f32>() as u64
    }

    /// Number of whole vertices in `data`, or `None` if it is ragged or empty.
    pub fn vertex_count(&self, data: &[f32]) -> Option<u32> {
        let stride = self.stride as usize;
        if stride == 0 || data.is_empty() || data.len() % stride != 0 {
            return None;
        }
        u32::try_from(data.len() / stride).ok()
    }
}

/// Ground plane at y = -0.5 spanning ±5 on X and Z, texture repeated five times.
#[rustfmt::skip]
pub const PLANE_VERTICES: [f32; 48] = [
    -5.0, -0.5, -5.0,  0.0, 1.0, 0.0,  0.0, 5.0,
    -5.0, -0.5,  5.0,  0.0, 1.0, 0.0,  0.0, 0.0,
     5.0, -0.5,  5.0,  0.0, 1.0, 0.0,  5.0, 0.0,

     5.0, -0.5,  5.0,  0.0, 1.0, 0.0,  5.0, 0.0,
     5.0, -0.5, -5.0,  0.0, 1.0, 0.0,  5.0, 5.0,
    -5.0, -0.5, -5.0,  0.0, 1.0, 0.0,  0.0, 5.0,
];

/// Unit quad in normalized device coordinates, scaled down when drawn.
#[rustfmt::skip]
pub const CROSSHAIR_VERTICES: [f32; 18] = [
    -1.0, -1.0, 0.0,
     1.0, -1.0, 0.0,
     1.0,  1.0, 0.0,

     1.0,  1.0, 0.0,
    -1.0,  1.0, 0.0,
    -1.0, -1.0, 0.0,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_geometry_matches_layouts() {
        assert_eq!(VertexLayout::POSITION_NORMAL_UV.vertex_count(&PLANE_VERTICES), Some(6));
        assert_eq!(VertexLayout::POSITION.vertex_count(&CROSSHAIR_VERTICES), Some(6));
        assert_eq!(VertexLayout::POSITION_NORMAL_UV.stride_bytes(), 32);
    }

    #[test]
    fn ragged_data_has_no_vertex_count() {
        assert_eq!(VertexLayout::POSITION.vertex_count(&[0.0; 4]), None);
        assert_eq!(VertexLayout::POSITION.vertex_count(&[]), None);
    }

    #[test]
    fn attributes_fit_inside_stride() {
        for layout in [VertexLayout::POSITION_NORMAL_UV, VertexLayout::POSITION] {
            for a in layout.attributes {
                assert!(a.offset + a.components <= layout.stride);
            }
        }
    }
}
