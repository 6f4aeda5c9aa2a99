//! World-space geometry snapshots.

use nalgebra::{Matrix4, Point3};

use crate::bounds::Aabb;
use crate::error::{MeshRole, SelectError, SelectResult};
use crate::source::SourceMesh;

/// World-space copy of one mesh, taken once per selection operation.
///
/// Point order matches the source vertex order, so a mask built over
/// [`GeometrySnapshot::points`] lines up with the source mesh's vertices.
#[derive(Debug, Clone)]
pub struct GeometrySnapshot {
    points: Vec<Point3<f64>>,
    faces: Vec<[u32; 3]>,
    bounds: Aabb,
    extent: f64,
}

impl GeometrySnapshot {
    /// Transform local vertices to world space and record the mesh extent.
    ///
    /// `transform` is applied as an affine map: its upper 3x3 block and
    /// translation column. The bottom row is ignored.
    ///
    /// # Errors
    ///
    /// - [`SelectError::EmptyMesh`] if `local_vertices` is empty
    /// - [`SelectError::InvalidFaceIndex`] if a face references a missing vertex
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_select::GeometrySnapshot;
    /// use nalgebra::{Matrix4, Point3, Vector3};
    ///
    /// let vertices = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 0.0)];
    /// let transform = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 3.0));
    ///
    /// let snapshot = GeometrySnapshot::build(&vertices, &transform, &[]).unwrap();
    /// assert_eq!(snapshot.points()[1], Point3::new(2.0, 1.0, 3.0));
    /// assert!((snapshot.extent() - 2.0).abs() < 1e-12);
    /// ```
    pub fn build(
        local_vertices: &[Point3<f64>],
        transform: &Matrix4<f64>,
        faces: &[[u32; 3]],
    ) -> SelectResult<Self> {
        if local_vertices.is_empty() {
            return Err(SelectError::empty_mesh(0, faces.len()));
        }
        validate_faces(faces, local_vertices.len())?;

        let linear = transform.fixed_view::<3, 3>(0, 0);
        let translation = transform.fixed_view::<3, 1>(0, 3);
        let points: Vec<Point3<f64>> = local_vertices
            .iter()
            .map(|p| Point3::from(linear * p.coords + translation))
            .collect();

        let bounds = Aabb::from_points(&points);
        let extent = bounds.max_extent();

        Ok(Self {
            points,
            faces: faces.to_vec(),
            bounds,
            extent,
        })
    }

    /// Snapshot a host mesh using its own transform.
    ///
    /// # Errors
    ///
    /// See [`GeometrySnapshot::build`].
    pub fn from_source(mesh: &SourceMesh) -> SelectResult<Self> {
        Self::build(&mesh.vertices, &mesh.transform, &mesh.faces)
    }

    /// World-space points, one per source vertex.
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Triangle faces, indexing into [`GeometrySnapshot::points`].
    #[must_use]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// World-space bounding box.
    #[must_use]
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Largest world-space bounding box dimension.
    #[must_use]
    pub const fn extent(&self) -> f64 {
        self.extent
    }

    /// Number of points.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// Check that every face index refers to an existing vertex.
pub(crate) fn validate_faces(faces: &[[u32; 3]], vertex_count: usize) -> SelectResult<()> {
    for (face, tri) in faces.iter().enumerate() {
        if let Some(&vertex) = tri.iter().find(|&&v| v as usize >= vertex_count) {
            return Err(SelectError::InvalidFaceIndex {
                mesh: MeshRole::Unlabelled,
                face,
                vertex,
                vertex_count,
            });
        }
    }
    Ok(())
}
