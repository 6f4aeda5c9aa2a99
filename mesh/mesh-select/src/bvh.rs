//! Bounding Volume Hierarchy for nearest-surface queries.
//!
//! The hierarchy is built once per selection mesh and answers "closest point
//! on the surface" queries for arbitrary points. Leaves are padded by a fixed
//! epsilon, which only loosens pruning; it never changes which triangle is
//! reported as nearest.

// Triangle indices are stored as u32, matching the face index type.
#![allow(clippy::cast_possible_truncation)]

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

use crate::bounds::Aabb;
use crate::error::{MeshRole, SelectError, SelectResult};
use crate::query::{closest_point_on_triangle, triangle_normal};

/// Default maximum number of triangles per leaf.
pub const DEFAULT_LEAF_SIZE: usize = 4;

/// Result of a nearest-surface query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestHit {
    /// Closest point on the surface.
    pub position: Point3<f64>,
    /// Unit face normal of the triangle containing `position`.
    /// Zero for a zero-area triangle.
    pub normal: Vector3<f64>,
    /// Index of that triangle in the face list the index was built from.
    pub triangle_index: u32,
    /// Euclidean distance from the query point to `position`.
    pub distance: f64,
}

/// A triangle with resolved corner positions and its face normal.
#[derive(Debug, Clone, Copy)]
struct Facet {
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
    normal: Vector3<f64>,
}

impl Facet {
    fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_triangle(&self.v0, &self.v1, &self.v2)
    }
}

/// BVH node containing either leaf triangles or child nodes.
#[derive(Debug)]
enum BvhNode {
    Leaf {
        bbox: Aabb,
        triangles: SmallVec<[u32; 8]>,
    },
    Internal {
        bbox: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    const fn bbox(&self) -> &Aabb {
        match self {
            Self::Leaf { bbox, .. } | Self::Internal { bbox, .. } => bbox,
        }
    }
}

/// Best candidate found so far during a nearest query.
struct Best {
    dist_sq: f64,
    triangle: Option<u32>,
    position: Point3<f64>,
}

impl Best {
    /// Closer wins; equal distances resolve to the lower triangle index.
    #[allow(clippy::float_cmp)]
    fn offer(&mut self, dist_sq: f64, triangle: u32, position: Point3<f64>) {
        let better = match self.triangle {
            None => true,
            Some(current) => {
                dist_sq < self.dist_sq || (dist_sq == self.dist_sq && triangle < current)
            }
        };
        if better {
            self.dist_sq = dist_sq;
            self.triangle = Some(triangle);
            self.position = position;
        }
    }

    /// Whether a subtree whose box lies `bound_sq` away can still improve.
    /// Equal bounds stay reachable since they may hold a lower-index tie.
    fn reachable(&self, bound_sq: f64) -> bool {
        bound_sq <= self.dist_sq || self.dist_sq.is_nan()
    }
}

/// Static bounding volume hierarchy over a triangle soup.
///
/// Immutable after construction and safe to query from many threads.
///
/// # Example
///
/// ```
/// use mesh_select::BvhIndex;
/// use nalgebra::Point3;
///
/// let points = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let bvh = BvhIndex::build(&[[0, 1, 2]], &points, 0.0).unwrap();
///
/// let hit = bvh.find_nearest(&Point3::new(0.25, 0.25, 2.0));
/// assert!((hit.distance - 2.0).abs() < 1e-12);
/// assert!((hit.normal.z - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct BvhIndex {
    root: BvhNode,
    facets: Vec<Facet>,
    epsilon: f64,
}

impl BvhIndex {
    /// Build a BVH with the default leaf size, sequentially.
    ///
    /// # Errors
    ///
    /// - [`SelectError::EmptyMesh`] if `triangles` is empty
    /// - [`SelectError::InvalidFaceIndex`] if a triangle references a missing point
    /// - [`SelectError::InvalidParameter`] if `epsilon` is negative or not finite
    pub fn build(
        triangles: &[[u32; 3]],
        points: &[Point3<f64>],
        epsilon: f64,
    ) -> SelectResult<Self> {
        Self::build_with(triangles, points, epsilon, DEFAULT_LEAF_SIZE, usize::MAX)
    }

    /// Build a BVH with explicit leaf size and parallel threshold.
    ///
    /// Subtrees holding at least `parallel_threshold` triangles are split
    /// across rayon tasks. The resulting tree is identical to a sequential
    /// build.
    ///
    /// # Errors
    ///
    /// As [`BvhIndex::build`], plus [`SelectError::InvalidParameter`] for a
    /// zero `max_leaf_size`.
    pub fn build_with(
        triangles: &[[u32; 3]],
        points: &[Point3<f64>],
        epsilon: f64,
        max_leaf_size: usize,
        parallel_threshold: usize,
    ) -> SelectResult<Self> {
        if triangles.is_empty() {
            return Err(SelectError::empty_mesh(points.len(), 0));
        }
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(SelectError::invalid_parameter(format!(
                "BVH epsilon must be finite and non-negative, got {epsilon}"
            )));
        }
        if max_leaf_size == 0 {
            return Err(SelectError::invalid_parameter(
                "BVH leaf size must be at least 1",
            ));
        }

        let facets = triangles
            .iter()
            .enumerate()
            .map(|(face, tri)| {
                let [v0, v1, v2] = resolve(points, face, *tri)?;
                Ok(Facet {
                    v0,
                    v1,
                    v2,
                    normal: triangle_normal(&v0, &v1, &v2),
                })
            })
            .collect::<SelectResult<Vec<_>>>()?;

        let entries: Vec<(u32, Aabb, Point3<f64>)> = facets
            .iter()
            .enumerate()
            .map(|(i, f)| (i as u32, f.bounds().padded(epsilon), f.centroid()))
            .collect();

        let mut order: Vec<usize> = (0..entries.len()).collect();
        let root = build_node(&entries, &mut order, max_leaf_size, parallel_threshold);

        Ok(Self {
            root,
            facets,
            epsilon,
        })
    }

    /// Find the closest point on the surface to `query`.
    ///
    /// Ties in distance resolve to the lowest triangle index, so repeated
    /// queries always return the same hit.
    #[must_use]
    pub fn find_nearest(&self, query: &Point3<f64>) -> NearestHit {
        let mut best = Best {
            dist_sq: f64::INFINITY,
            triangle: None,
            position: *query,
        };
        self.nearest_recursive(&self.root, query, &mut best);

        // The tree always holds at least one triangle, so a candidate exists.
        let triangle = best.triangle.unwrap_or(0);
        NearestHit {
            position: best.position,
            normal: self.facets[triangle as usize].normal,
            triangle_index: triangle,
            distance: best.dist_sq.sqrt(),
        }
    }

    fn nearest_recursive(&self, node: &BvhNode, query: &Point3<f64>, best: &mut Best) {
        match node {
            BvhNode::Leaf { triangles, .. } => {
                for &index in triangles {
                    let facet = &self.facets[index as usize];
                    let closest = closest_point_on_triangle(query, &facet.v0, &facet.v1, &facet.v2);
                    best.offer((query - closest).norm_squared(), index, closest);
                }
            }
            BvhNode::Internal { left, right, .. } => {
                let left_dist = left.bbox().distance_squared(query);
                let right_dist = right.bbox().distance_squared(query);
                let (near, near_dist, far, far_dist) = if right_dist < left_dist {
                    (right, right_dist, left, left_dist)
                } else {
                    (left, left_dist, right, right_dist)
                };

                if best.reachable(near_dist) {
                    self.nearest_recursive(near, query, best);
                }
                if best.reachable(far_dist) {
                    self.nearest_recursive(far, query, best);
                }
            }
        }
    }

    /// Number of triangles in the index.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.facets.len()
    }

    /// Leaf padding used at construction.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Bounding box of the whole hierarchy, including leaf padding.
    #[must_use]
    pub const fn root_bounds(&self) -> &Aabb {
        self.root.bbox()
    }

    /// Get statistics about the BVH structure.
    #[must_use]
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats::default();
        collect_stats(&self.root, 0, &mut stats);
        stats
    }
}

/// Statistics about BVH structure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BvhStats {
    /// Number of internal (branch) nodes.
    pub internal_count: usize,
    /// Number of leaf nodes.
    pub leaf_count: usize,
    /// Maximum depth of the tree.
    pub max_depth: usize,
    /// Maximum number of triangles in any leaf.
    pub max_leaf_size: usize,
    /// Total triangles stored across all leaves.
    pub total_triangles_in_leaves: usize,
}

fn resolve(points: &[Point3<f64>], face: usize, tri: [u32; 3]) -> SelectResult<[Point3<f64>; 3]> {
    let lookup = |vertex: u32| {
        points
            .get(vertex as usize)
            .copied()
            .ok_or_else(|| SelectError::InvalidFaceIndex {
                mesh: MeshRole::Unlabelled,
                face,
                vertex,
                vertex_count: points.len(),
            })
    };
    Ok([lookup(tri[0])?, lookup(tri[1])?, lookup(tri[2])?])
}

fn build_node(
    entries: &[(u32, Aabb, Point3<f64>)],
    order: &mut [usize],
    max_leaf_size: usize,
    parallel_threshold: usize,
) -> BvhNode {
    let mut bbox = Aabb::empty();
    for &i in order.iter() {
        bbox.expand(&entries[i].1);
    }

    if order.len() <= max_leaf_size {
        let mut triangles: SmallVec<[u32; 8]> = order.iter().map(|&i| entries[i].0).collect();
        triangles.sort_unstable();
        return BvhNode::Leaf { bbox, triangles };
    }

    // Median split over centroids along the longest axis of the centroid bounds
    let centroid_bounds = Aabb::from_points(order.iter().map(|&i| &entries[i].2));
    let axis = centroid_bounds.longest_axis();
    order.sort_unstable_by(|&a, &b| {
        entries[a].2[axis]
            .total_cmp(&entries[b].2[axis])
            .then(a.cmp(&b))
    });

    let mid = order.len() / 2;
    let parallel = order.len() >= parallel_threshold;
    let (left_order, right_order) = order.split_at_mut(mid);

    let (left, right) = if parallel {
        rayon::join(
            || build_node(entries, left_order, max_leaf_size, parallel_threshold),
            || build_node(entries, right_order, max_leaf_size, parallel_threshold),
        )
    } else {
        (
            build_node(entries, left_order, max_leaf_size, parallel_threshold),
            build_node(entries, right_order, max_leaf_size, parallel_threshold),
        )
    };

    BvhNode::Internal {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn collect_stats(node: &BvhNode, depth: usize, stats: &mut BvhStats) {
    stats.max_depth = stats.max_depth.max(depth);

    match node {
        BvhNode::Leaf { triangles, .. } => {
            stats.leaf_count += 1;
            stats.total_triangles_in_leaves += triangles.len();
            stats.max_leaf_size = stats.max_leaf_size.max(triangles.len());
        }
        BvhNode::Internal { left, right, .. } => {
            stats.internal_count += 1;
            collect_stats(left, depth + 1, stats);
            collect_stats(right, depth + 1, stats);
        }
    }
}
