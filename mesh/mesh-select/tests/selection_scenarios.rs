//! End-to-end selection scenarios.
//!
//! These tests drive the public API the way a host application would: build
//! source meshes with transforms, run a selection, and merge the result into
//! an existing selection buffer.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::cast_possible_truncation)]

use mesh_select::{
    MeshRole, SelectError, SelectionEngine, SelectionMode, SelectionParams, SourceMesh,
    select_vertices,
};
use nalgebra::{Matrix4, Point3, Vector3};

// =============================================================================
// Fixtures
// =============================================================================

/// Unit cube from the origin to (1, 1, 1), outward-facing triangles.
fn unit_cube() -> SourceMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let faces = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [2, 3, 7],
        [2, 7, 6],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    SourceMesh::new(vertices, faces)
}

/// Regular octahedron with unit circumradius, outward-facing triangles.
fn octahedron() -> SourceMesh {
    let vertices = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    SourceMesh::new(vertices, faces)
}

/// Bare points with no faces. Valid only as the active mesh.
fn cloud(points: &[[f64; 3]]) -> SourceMesh {
    SourceMesh::new(
        points.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect(),
        Vec::new(),
    )
}

/// The given points with a single triangle over the first three, so they can
/// be used as a selection mesh.
fn patch(points: &[[f64; 3]]) -> SourceMesh {
    let mut mesh = cloud(points);
    let last = mesh.vertex_count() as u32 - 1;
    mesh.faces.push([0, last.min(1), last.min(2)]);
    mesh
}

/// Regular grid of `n^3` points spanning `[lo, hi]` on each axis.
fn grid(n: u32, lo: f64, hi: f64) -> SourceMesh {
    let step = (hi - lo) / f64::from(n - 1);
    let mut vertices = Vec::new();
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                vertices.push(Point3::new(
                    lo + f64::from(i) * step,
                    lo + f64::from(j) * step,
                    lo + f64::from(k) * step,
                ));
            }
        }
    }
    SourceMesh::new(vertices, Vec::new())
}

// =============================================================================
// Proximity mode
// =============================================================================

mod proximity {
    use super::*;

    #[test]
    fn cube_selects_itself() {
        let cube = unit_cube();
        let mask = select_vertices(&cube, &[cube.clone()], &SelectionParams::proximity(2)).unwrap();

        assert_eq!(mask.len(), 8);
        assert!(mask.as_slice().iter().all(|&s| s));
    }

    #[test]
    fn distant_copy_selects_nothing() {
        let cube = unit_cube();
        let moved = cube.clone().translated(Vector3::new(5.0, 0.0, 0.0));

        let mask = select_vertices(&cube, &[moved], &SelectionParams::proximity(2)).unwrap();

        assert_eq!(mask.len(), 8);
        assert_eq!(mask.selected_count(), 0);
    }

    #[test]
    fn accuracy_zero_matches_coincident_points_only() {
        let cube = unit_cube();

        let same = select_vertices(&cube, &[cube.clone()], &SelectionParams::proximity(0)).unwrap();
        assert_eq!(same.selected_count(), 8);

        let moved = cube.clone().translated(Vector3::new(2.5, 0.0, 0.0));
        let mask = select_vertices(&cube, &[moved], &SelectionParams::proximity(0)).unwrap();
        assert_eq!(mask.selected_count(), 0);
    }

    #[test]
    fn narrower_precision_drops_offset_points() {
        let cube = unit_cube();
        let nudged = cube.clone().translated(Vector3::new(0.03, 0.0, 0.0));

        let counts: Vec<usize> = (0..=3)
            .map(|accuracy| {
                select_vertices(&cube, &[nudged.clone()], &SelectionParams::proximity(accuracy))
                    .unwrap()
                    .selected_count()
            })
            .collect();

        assert_eq!(counts, vec![8, 8, 0, 0]);
    }

    #[test]
    fn shared_face_selects_its_corners() {
        let cube = unit_cube();
        let neighbour = cube.clone().translated(Vector3::new(1.0, 0.0, 0.0));

        let mask = select_vertices(&cube, &[neighbour], &SelectionParams::proximity(3)).unwrap();
        let selected: Vec<usize> = mask.selected_indices().collect();

        // The x = 1 face of the active cube
        assert_eq!(selected, vec![1, 2, 5, 6]);
    }

    #[test]
    fn transform_is_applied_to_both_sides() {
        let scale = Matrix4::new_scaling(2.0);
        let active = unit_cube().with_transform(scale);
        let selection = patch(&[[2.0, 2.0, 2.0], [1.0, 0.0, 0.0]]);

        let mask = select_vertices(&active, &[selection], &SelectionParams::proximity(2)).unwrap();
        assert_eq!(mask.selected_indices().collect::<Vec<_>>(), vec![6]);
    }

    #[test]
    fn union_across_selection_meshes() {
        let cube = unit_cube();
        let first = patch(&[[0.0, 0.0, 0.0]]);
        let second = patch(&[[1.0, 1.0, 1.0]]);

        let mask = select_vertices(&cube, &[first, second], &SelectionParams::proximity(2)).unwrap();
        assert_eq!(mask.selected_indices().collect::<Vec<_>>(), vec![0, 6]);
    }

    fn matches_at(a: [f64; 3], b: [f64; 3], accuracy: u32) -> bool {
        let params = SelectionParams::proximity(accuracy);
        select_vertices(&cloud(&[a]), &[patch(&[b])], &params)
            .unwrap()
            .is_selected(0)
    }

    #[test]
    fn halfway_values_round_to_even() {
        assert!(matches_at([0.5, 0.0, 0.0], [0.0, 0.0, 0.0], 0));
        assert!(!matches_at([1.5, 0.0, 0.0], [1.0, 0.0, 0.0], 0));
        assert!(matches_at([1.5, 0.0, 0.0], [2.0, 0.0, 0.0], 0));
        assert!(matches_at([0.0, 0.125, 0.0], [0.0, 0.12, 0.0], 2));
    }

    #[test]
    fn rounding_uses_stored_binary_value() {
        // 1.115 is stored just below 1.115, 2.675 just below 2.675
        assert!(matches_at([1.115, 0.0, 0.0], [1.11, 0.0, 0.0], 2));
        assert!(!matches_at([1.115, 0.0, 0.0], [1.12, 0.0, 0.0], 2));
        assert!(matches_at([0.0, 0.0, 2.675], [0.0, 0.0, 2.67], 2));
    }

    #[test]
    fn values_either_side_of_zero_do_not_match() {
        assert!(!matches_at([-0.001, 0.0, 0.0], [0.0, 0.0, 0.0], 2));
        assert!(matches_at([-0.001, 0.0, 0.0], [-0.004, 0.0, 0.0], 2));
        assert!(matches_at([0.001, 0.0, 0.0], [0.0, 0.0, 0.0], 2));
    }
}

// =============================================================================
// Volume mode
// =============================================================================

mod volume {
    use super::*;

    #[test]
    fn center_of_unit_cube() {
        let center = cloud(&[[0.5, 0.5, 0.5]]);
        let mask = select_vertices(&center, &[unit_cube()], &SelectionParams::volume(1)).unwrap();
        assert_eq!(mask.into_vec(), vec![true]);
    }

    #[test]
    fn far_points_are_outside() {
        let points = cloud(&[[5.0, 0.5, 0.5], [0.5, -3.0, 0.5], [0.5, 0.5, 1.5]]);
        let mask = select_vertices(&points, &[unit_cube()], &SelectionParams::volume(2)).unwrap();
        assert_eq!(mask.selected_count(), 0);
    }

    #[test]
    fn grid_inside_octahedron() {
        let points = grid(11, -1.0, 1.0);
        let mask = select_vertices(&points, &[octahedron()], &SelectionParams::volume(1)).unwrap();

        for (i, p) in points.vertices.iter().enumerate() {
            let l1 = p.x.abs() + p.y.abs() + p.z.abs();
            if l1 < 0.999 {
                assert!(mask.is_selected(i), "point {p:?} should be inside");
            } else if l1 > 1.001 {
                assert!(!mask.is_selected(i), "point {p:?} should be outside");
            }
        }
    }

    #[test]
    fn moved_selection_mesh_follows_transform() {
        let cube = unit_cube().translated(Vector3::new(10.0, 0.0, 0.0));
        let points = cloud(&[[0.5, 0.5, 0.5], [10.5, 0.5, 0.5]]);

        let mask = select_vertices(&points, &[cube], &SelectionParams::volume(1)).unwrap();
        assert_eq!(mask.into_vec(), vec![false, true]);
    }

    #[test]
    fn union_across_selection_meshes() {
        let a = unit_cube();
        let b = octahedron().translated(Vector3::new(5.0, 0.0, 0.0));
        let points = cloud(&[[0.5, 0.5, 0.5], [5.1, 0.1, 0.1], [2.5, 0.5, 0.5]]);

        let mask = select_vertices(&points, &[a, b], &SelectionParams::volume(1)).unwrap();
        assert_eq!(mask.into_vec(), vec![true, true, false]);
    }

    #[test]
    fn accuracy_does_not_change_classification() {
        let points = grid(7, -0.5, 1.5);
        let base = select_vertices(&points, &[unit_cube()], &SelectionParams::volume(0)).unwrap();

        for accuracy in 1..=4 {
            let mask =
                select_vertices(&points, &[unit_cube()], &SelectionParams::volume(accuracy))
                    .unwrap();
            assert_eq!(mask, base);
        }
    }
}

// =============================================================================
// Engine behavior
// =============================================================================

mod engine {
    use super::*;

    #[test]
    fn mask_length_matches_active_vertex_count() {
        let points = grid(5, -0.2, 1.2);
        for mode in [SelectionMode::Proximity, SelectionMode::Volume] {
            let params = SelectionParams::default().with_mode(mode);
            let mask = select_vertices(&points, &[unit_cube()], &params).unwrap();
            assert_eq!(mask.len(), points.vertex_count());
        }
    }

    #[test]
    fn parallel_path_is_deterministic() {
        let points = grid(12, -0.3, 1.3);
        let selection = [unit_cube(), octahedron()];

        for mode in [SelectionMode::Proximity, SelectionMode::Volume] {
            let sequential = SelectionEngine::new(
                SelectionParams::default()
                    .with_mode(mode)
                    .with_parallel_threshold(usize::MAX),
            );
            let parallel = SelectionEngine::new(
                SelectionParams::default()
                    .with_mode(mode)
                    .with_parallel_threshold(1)
                    .with_bvh_leaf_size(1),
            );

            let expected = sequential.select(&points, &selection).unwrap();
            for _ in 0..3 {
                assert_eq!(parallel.select(&points, &selection).unwrap(), expected);
            }
        }
    }

    #[test]
    fn merge_into_host_selection_only_adds() {
        let cube = unit_cube();
        let corner = patch(&[[0.0, 0.0, 0.0]]);
        let mask = select_vertices(&cube, &[corner], &SelectionParams::proximity(2)).unwrap();

        let mut host = vec![false; 8];
        host[7] = true;
        mask.merge_into(&mut host).unwrap();

        assert_eq!(
            host,
            vec![true, false, false, false, false, false, false, true]
        );
    }

    #[test]
    fn merge_into_wrong_length_fails() {
        let cube = unit_cube();
        let mask = select_vertices(&cube, &[cube.clone()], &SelectionParams::default()).unwrap();

        let mut host = vec![false; 3];
        assert_eq!(
            mask.merge_into(&mut host),
            Err(SelectError::MaskLengthMismatch {
                expected: 8,
                actual: 3
            })
        );
        assert_eq!(host, vec![false; 3]);
    }
}

// =============================================================================
// Error paths
// =============================================================================

mod errors {
    use super::*;

    #[test]
    fn empty_selection_list() {
        let err = select_vertices(&unit_cube(), &[], &SelectionParams::default()).unwrap_err();
        assert_eq!(err, SelectError::NoSelectionInput);
    }

    #[test]
    fn empty_active_mesh() {
        let err = select_vertices(&SourceMesh::default(), &[unit_cube()], &SelectionParams::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SelectError::EmptyMesh {
                mesh: MeshRole::Active,
                vertex_count: 0,
                ..
            }
        ));
    }

    #[test]
    fn empty_selection_mesh() {
        let err = select_vertices(
            &unit_cube(),
            &[unit_cube(), SourceMesh::default()],
            &SelectionParams::default(),
        )
        .unwrap_err();
        assert!(format!("{err}").contains("selection #1"));
    }

    #[test]
    fn selection_meshes_need_triangles() {
        let points = cloud(&[[0.5, 0.5, 0.5]]);

        for params in [SelectionParams::proximity(2), SelectionParams::volume(1)] {
            let err = select_vertices(&points, &[unit_cube(), points.clone()], &params)
                .unwrap_err();
            assert_eq!(
                err,
                SelectError::EmptyMesh {
                    mesh: MeshRole::Selection(1),
                    vertex_count: 1,
                    face_count: 0,
                }
            );
        }
    }

    #[test]
    fn malformed_raw_arrays_give_empty_mesh() {
        let truncated = SourceMesh::from_raw(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0], &[0, 1, 2]);

        let err = select_vertices(&unit_cube(), &[truncated], &SelectionParams::default())
            .unwrap_err();
        assert_eq!(
            err,
            SelectError::EmptyMesh {
                mesh: MeshRole::Selection(0),
                vertex_count: 0,
                face_count: 0,
            }
        );
    }

    #[test]
    fn accuracy_out_of_range() {
        for params in [SelectionParams::proximity(5), SelectionParams::volume(9)] {
            let err = select_vertices(&unit_cube(), &[unit_cube()], &params).unwrap_err();
            assert!(matches!(err, SelectError::InvalidParameter(_)));
        }
    }

    #[test]
    fn bad_face_index_in_active_mesh() {
        let mut broken = unit_cube();
        broken.faces.push([0, 1, 8]);

        let err = select_vertices(&broken, &[unit_cube()], &SelectionParams::default()).unwrap_err();
        assert_eq!(
            err,
            SelectError::InvalidFaceIndex {
                mesh: MeshRole::Active,
                face: 12,
                vertex: 8,
                vertex_count: 8,
            }
        );
    }
}
