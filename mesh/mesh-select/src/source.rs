//! Host-supplied mesh data.

use nalgebra::{Matrix4, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A mesh as handed over by the host application.
///
/// Vertices are in the mesh's local space; `transform` maps them to world
/// space. Faces use counter-clockwise winding viewed from outside, so face
/// normals point outward by the right-hand rule.
///
/// # Example
///
/// ```
/// use mesh_select::SourceMesh;
/// use nalgebra::Vector3;
///
/// let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
/// let mesh = SourceMesh::from_raw(&positions, &[0, 1, 2])
///     .translated(Vector3::new(0.0, 0.0, 5.0));
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceMesh {
    /// Vertex positions in local space.
    pub vertices: Vec<Point3<f64>>,
    /// Triangle faces as indices into `vertices`.
    pub faces: Vec<[u32; 3]>,
    /// Local-to-world transform. Assumed affine.
    pub transform: Matrix4<f64>,
}

impl Default for SourceMesh {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl SourceMesh {
    /// Create a mesh with an identity world transform.
    #[must_use]
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            faces,
            transform: Matrix4::identity(),
        }
    }

    /// Create a mesh from flat coordinate and index arrays.
    ///
    /// Returns an empty mesh if either array length is not a multiple of 3,
    /// so malformed input surfaces as [`crate::SelectError::EmptyMesh`] once
    /// it reaches a selection.
    #[must_use]
    pub fn from_raw(positions: &[f64], indices: &[u32]) -> Self {
        if positions.len() % 3 != 0 || indices.len() % 3 != 0 {
            return Self::default();
        }

        let vertices = positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        let faces = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self::new(vertices, faces)
    }

    /// Replace the world transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.transform = transform;
        self
    }

    /// Append a world-space translation to the current transform.
    #[must_use]
    pub fn translated(mut self, offset: Vector3<f64>) -> Self {
        self.transform = Matrix4::new_translation(&offset) * self.transform;
        self
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}
