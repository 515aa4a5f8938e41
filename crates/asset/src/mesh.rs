//! CPU-side mesh representation used by loaders.

/// Flat triangle list: every three consecutive entries form one triangle.
/// `positions[i]` and `colors[i]` describe the same vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleSoup {
    pub positions: Vec<[f32; 3]>,
    /// Linear RGB in `[0, 1]`.
    pub colors: Vec<[f32; 3]>,
}

impl TriangleSoup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(triangles * 3),
            colors: Vec::with_capacity(triangles * 3),
        }
    }

    /// Append one triangle; all three corners share `color`.
    pub fn push_triangle(&mut self, corners: [[f32; 3]; 3], color: [f32; 3]) {
        self.positions.extend_from_slice(&corners);
        self.colors.extend_from_slice(&[color; 3]);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Axis-aligned bounds of all positions as `(min, max)`.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.positions.first()?;
        let bounds = self
            .positions
            .iter()
            .fold((first, first), |(mut lo, mut hi), p| {
                for axis in 0..3 {
                    lo[axis] = lo[axis].min(p[axis]);
                    hi[axis] = hi[axis].max(p[axis]);
                }
                (lo, hi)
            });
        Some(bounds)
    }
}
