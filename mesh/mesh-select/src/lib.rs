//! Vertex selection by proximity to, or containment in, other meshes.
//!
//! Given an active mesh and one or more selection meshes, this crate decides
//! for each active-mesh vertex whether it is selected. Two modes are
//! supported:
//!
//! - **Proximity**: a vertex is selected when its world position, rounded to
//!   `accuracy` decimal digits, equals the rounded position of some
//!   selection-mesh vertex.
//! - **Volume**: a vertex is selected when it lies on the interior side of
//!   any selection mesh, judged from the nearest surface point and its
//!   outward face normal.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. The host
//! application hands over plain vertex and face arrays plus a world
//! transform per mesh and receives one boolean per active vertex back.
//!
//! # Overview
//!
//! - [`SourceMesh`] - host mesh data with its local-to-world transform
//! - [`GeometrySnapshot`] - world-space copy of a mesh taken per call
//! - [`BvhIndex`] - nearest-surface queries over a triangle soup
//! - [`ProximityMatcher`] - rounded-position set lookups
//! - [`VolumeClassifier`] - inside/outside test against selection meshes
//! - [`SelectionEngine`] - validation and mode dispatch
//! - [`SelectionMask`] - the per-vertex result
//!
//! # Quick Start
//!
//! ```
//! use mesh_select::{select_vertices, SelectionParams, SourceMesh};
//! use nalgebra::Point3;
//!
//! // Unit cube, outward-facing triangles
//! let cube = SourceMesh::new(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(1.0, 1.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!         Point3::new(0.0, 0.0, 1.0),
//!         Point3::new(1.0, 0.0, 1.0),
//!         Point3::new(1.0, 1.0, 1.0),
//!         Point3::new(0.0, 1.0, 1.0),
//!     ],
//!     vec![
//!         [0, 2, 1], [0, 3, 2], [4, 5, 6], [4, 6, 7],
//!         [0, 1, 5], [0, 5, 4], [2, 3, 7], [2, 7, 6],
//!         [0, 4, 7], [0, 7, 3], [1, 2, 6], [1, 6, 5],
//!     ],
//! );
//!
//! let points = SourceMesh::new(
//!     vec![Point3::new(0.5, 0.5, 0.5), Point3::new(3.0, 0.5, 0.5)],
//!     Vec::new(),
//! );
//!
//! let mask = select_vertices(&points, &[cube], &SelectionParams::volume(1)).unwrap();
//! assert_eq!(mask.into_vec(), vec![true, false]);
//! ```
//!
//! # Known Limitations
//!
//! Volume mode is a heuristic. It only looks at the nearest face, and it
//! treats the selection mesh's largest bounding-box dimension as a locality
//! cutoff. Points near concave regions or thin walls can be misclassified.
//! Closed, consistently wound (outward normals) selection meshes give the
//! best results.
//!
//! Proximity mode compares rounded values, not distances. Two points closer
//! than `10^-accuracy` can still round to different keys when they straddle
//! a rounding boundary, or when they sit on opposite sides of zero.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod bvh;
mod engine;
mod error;
mod mask;
mod params;
mod proximity;
mod query;
mod snapshot;
mod source;
mod volume;

pub use bounds::Aabb;
pub use bvh::{BvhIndex, BvhStats, DEFAULT_LEAF_SIZE, NearestHit};
pub use engine::{SelectionEngine, select_vertices};
pub use error::{MeshRole, SelectError, SelectResult};
pub use mask::SelectionMask;
pub use params::{EPSILON_PER_ACCURACY_STEP, MAX_ACCURACY, SelectionMode, SelectionParams};
pub use proximity::{Precision, ProximityMatcher, QuantizedKey, RoundedCoord, match_vertices};
pub use query::{closest_point_on_segment, closest_point_on_triangle, triangle_normal};
pub use snapshot::GeometrySnapshot;
pub use source::SourceMesh;
pub use volume::{VolumeClassifier, classify_vertices};
