//! Vertex selection by containment in selection meshes.
//!
//! For each selection mesh a BVH answers "nearest surface point and face
//! normal". A vertex counts as inside when the nearest point lies closer
//! than the mesh's extent and in front of the vertex along the outward
//! normal, i.e. the vertex sits behind the surface. The first mesh that
//! reports inside wins; later meshes are not queried.
//!
//! # Limitations
//!
//! The test looks at the nearest face only. Points near concave regions or
//! thin walls can see a nearest face whose normal points the "wrong" way and
//! be misclassified, and the extent cutoff is a locality gate rather than a
//! containment radius. The behavior is kept as is so selections stay stable
//! on existing models.

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::bvh::{BvhIndex, DEFAULT_LEAF_SIZE};
use crate::error::{MeshRole, SelectResult};
use crate::mask::SelectionMask;
use crate::params::EPSILON_PER_ACCURACY_STEP;
use crate::snapshot::GeometrySnapshot;

/// One selection volume: its surface index and locality cutoff.
#[derive(Debug)]
struct Volume {
    bvh: BvhIndex,
    extent: f64,
}

/// Inside/outside classifier over one or more selection meshes.
///
/// # Example
///
/// ```
/// use mesh_select::{GeometrySnapshot, VolumeClassifier};
/// use nalgebra::{Matrix4, Point3};
///
/// // Tetrahedron with outward-facing (CCW) faces
/// let points = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.0, 0.0, 1.0),
/// ];
/// let faces = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
/// let tet = GeometrySnapshot::build(&points, &Matrix4::identity(), &faces).unwrap();
///
/// let classifier = VolumeClassifier::new(&[tet], 1.0, 4, usize::MAX).unwrap();
/// assert!(classifier.is_inside(&Point3::new(0.1, 0.1, 0.1)));
/// assert!(!classifier.is_inside(&Point3::new(0.9, 0.9, 0.9)));
/// ```
#[derive(Debug)]
pub struct VolumeClassifier {
    volumes: Vec<Volume>,
}

impl VolumeClassifier {
    /// Build one BVH per selection snapshot.
    ///
    /// Leaves are padded by `epsilon_scale * 0.001`. Snapshots are indexed
    /// in parallel when there is more than one.
    ///
    /// # Errors
    ///
    /// When several snapshots fail, the error of the lowest-index one is
    /// returned, on both the parallel and the sequential path.
    ///
    /// - [`crate::SelectError::EmptyMesh`] if a snapshot has no triangles
    /// - [`crate::SelectError::InvalidParameter`] for a negative or non-finite
    ///   `epsilon_scale`, or a zero `max_leaf_size`
    pub fn new(
        selection: &[GeometrySnapshot],
        epsilon_scale: f64,
        max_leaf_size: usize,
        parallel_threshold: usize,
    ) -> SelectResult<Self> {
        let epsilon = epsilon_scale * EPSILON_PER_ACCURACY_STEP;

        let build = |(index, snapshot): (usize, &GeometrySnapshot)| {
            let bvh = BvhIndex::build_with(
                snapshot.faces(),
                snapshot.points(),
                epsilon,
                max_leaf_size,
                parallel_threshold,
            )
            .map_err(|e| e.for_mesh(MeshRole::Selection(index)))?;

            let stats = bvh.stats();
            debug!(
                mesh = index,
                triangles = bvh.triangle_count(),
                leaves = stats.leaf_count,
                depth = stats.max_depth,
                extent = snapshot.extent(),
                "Built selection volume"
            );
            if snapshot.extent() <= 0.0 {
                warn!(
                    mesh = index,
                    "Selection mesh has zero extent and cannot contain any vertex"
                );
            }

            Ok(Volume {
                bvh,
                extent: snapshot.extent(),
            })
        };

        let volumes = if selection.len() > 1 {
            // Gather every result first; a short-circuiting parallel collect
            // reports whichever failure finishes first.
            let built: Vec<SelectResult<Volume>> =
                selection.par_iter().enumerate().map(build).collect();
            built.into_iter().collect::<SelectResult<Vec<_>>>()?
        } else {
            selection
                .iter()
                .enumerate()
                .map(build)
                .collect::<SelectResult<Vec<_>>>()?
        };

        Ok(Self { volumes })
    }

    /// Number of selection volumes.
    #[must_use]
    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    /// Whether `point` lies inside any selection volume.
    #[must_use]
    pub fn is_inside(&self, point: &Point3<f64>) -> bool {
        self.volumes.iter().any(|volume| {
            let hit = volume.bvh.find_nearest(point);
            hit.distance < volume.extent && hit.normal.dot(&(hit.position - point)) > 0.0
        })
    }

    /// Classify every point of `active`, in index order.
    ///
    /// Runs on the rayon pool once `active` has at least
    /// `parallel_threshold` points; the result is the same either way.
    #[must_use]
    pub fn classify(&self, active: &GeometrySnapshot, parallel_threshold: usize) -> SelectionMask {
        let test = |(index, point): (usize, &Point3<f64>)| {
            let inside = self.is_inside(point);
            if inside {
                trace!(vertex = index, "Inside selection volume");
            }
            inside
        };

        let points = active.points();
        let selected: Vec<bool> = if points.len() >= parallel_threshold {
            points.par_iter().enumerate().map(test).collect()
        } else {
            points.iter().enumerate().map(test).collect()
        };
        SelectionMask::from_vec(selected)
    }
}

/// Classify `active` against `selection` with default BVH settings.
///
/// # Errors
///
/// See [`VolumeClassifier::new`].
pub fn classify_vertices(
    selection: &[GeometrySnapshot],
    active: &GeometrySnapshot,
    epsilon_scale: f64,
) -> SelectResult<SelectionMask> {
    let classifier =
        VolumeClassifier::new(selection, epsilon_scale, DEFAULT_LEAF_SIZE, usize::MAX)?;
    Ok(classifier.classify(active, usize::MAX))
}
