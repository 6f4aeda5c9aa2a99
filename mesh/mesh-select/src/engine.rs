//! Selection entry point.
//!
//! [`SelectionEngine`] validates every input mesh up front, snapshots the
//! meshes into world space and dispatches to the proximity matcher or the
//! volume classifier. It either returns a full mask or an error; there is no
//! partial result.

use tracing::{debug, info};

use crate::error::{MeshRole, SelectError, SelectResult};
use crate::mask::SelectionMask;
use crate::params::{SelectionMode, SelectionParams};
use crate::proximity::{Precision, ProximityMatcher};
use crate::snapshot::{GeometrySnapshot, validate_faces};
use crate::source::SourceMesh;
use crate::volume::VolumeClassifier;

/// Selects active-mesh vertices against a set of selection meshes.
///
/// # Example
///
/// ```
/// use mesh_select::{SelectionEngine, SelectionParams, SourceMesh};
/// use nalgebra::{Point3, Vector3};
///
/// let quad = SourceMesh::new(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(1.0, 1.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2], [0, 2, 3]],
/// );
/// let shifted = quad.clone().translated(Vector3::new(1.0, 0.0, 0.0));
///
/// let engine = SelectionEngine::new(SelectionParams::proximity(2));
/// let mask = engine.select(&quad, &[shifted]).unwrap();
///
/// // Only the right-hand edge coincides with the shifted quad's left edge.
/// assert_eq!(mask.into_vec(), vec![false, true, true, false]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    params: SelectionParams,
}

impl SelectionEngine {
    /// Create an engine with the given parameters.
    #[must_use]
    pub const fn new(params: SelectionParams) -> Self {
        Self { params }
    }

    /// Parameters used by this engine.
    #[must_use]
    pub const fn params(&self) -> &SelectionParams {
        &self.params
    }

    /// Compute which vertices of `active` are selected by `selection`.
    ///
    /// The returned mask has one entry per active vertex, in vertex order.
    ///
    /// # Errors
    ///
    /// - [`SelectError::InvalidParameter`] if the parameters are out of range
    /// - [`SelectError::NoSelectionInput`] if `selection` is empty
    /// - [`SelectError::EmptyMesh`] if the active mesh has no vertices, or a
    ///   selection mesh has no vertices or no triangles
    /// - [`SelectError::InvalidFaceIndex`] if a face references a missing vertex
    pub fn select(
        &self,
        active: &SourceMesh,
        selection: &[SourceMesh],
    ) -> SelectResult<SelectionMask> {
        let params = &self.params;
        params.validate()?;
        Self::validate_inputs(active, selection)?;

        info!(
            mode = ?params.mode,
            accuracy = params.accuracy,
            active_vertices = active.vertex_count(),
            selection_meshes = selection.len(),
            "Starting vertex selection"
        );

        let active_snapshot =
            GeometrySnapshot::from_source(active).map_err(|e| e.for_mesh(MeshRole::Active))?;
        let selection_snapshots = selection
            .iter()
            .enumerate()
            .map(|(index, mesh)| {
                let snapshot = GeometrySnapshot::from_source(mesh)
                    .map_err(|e| e.for_mesh(MeshRole::Selection(index)))?;
                debug!(
                    mesh = index,
                    vertices = snapshot.vertex_count(),
                    faces = snapshot.face_count(),
                    extent = snapshot.extent(),
                    "Snapshot selection mesh"
                );
                Ok(snapshot)
            })
            .collect::<SelectResult<Vec<_>>>()?;

        let mask = match params.mode {
            SelectionMode::Proximity => {
                let precision = Precision::new(params.accuracy)?;
                ProximityMatcher::new(&selection_snapshots, precision)
                    .match_snapshot(&active_snapshot, params.parallel_threshold)
            }
            SelectionMode::Volume => VolumeClassifier::new(
                &selection_snapshots,
                f64::from(params.accuracy),
                params.bvh_leaf_size,
                params.parallel_threshold,
            )?
            .classify(&active_snapshot, params.parallel_threshold),
        };

        info!(
            selected = mask.selected_count(),
            total = mask.len(),
            "Vertex selection complete"
        );

        Ok(mask)
    }

    fn validate_inputs(active: &SourceMesh, selection: &[SourceMesh]) -> SelectResult<()> {
        if selection.is_empty() {
            return Err(SelectError::NoSelectionInput);
        }

        // The active mesh may be a bare point cloud; selection meshes may not.
        check_mesh(active, MeshRole::Active, false)?;
        for (index, mesh) in selection.iter().enumerate() {
            check_mesh(mesh, MeshRole::Selection(index), true)?;
        }
        Ok(())
    }
}

fn check_mesh(mesh: &SourceMesh, role: MeshRole, needs_faces: bool) -> SelectResult<()> {
    if mesh.vertices.is_empty() || (needs_faces && mesh.faces.is_empty()) {
        return Err(SelectError::EmptyMesh {
            mesh: role,
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
        });
    }
    validate_faces(&mesh.faces, mesh.vertices.len()).map_err(|e| e.for_mesh(role))
}

/// Select vertices of `active` with the given parameters.
///
/// Shorthand for `SelectionEngine::new(params.clone()).select(active, selection)`.
///
/// # Errors
///
/// See [`SelectionEngine::select`].
pub fn select_vertices(
    active: &SourceMesh,
    selection: &[SourceMesh],
    params: &SelectionParams,
) -> SelectResult<SelectionMask> {
    SelectionEngine::new(params.clone()).select(active, selection)
}
