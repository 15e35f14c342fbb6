use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use chladni_field::{BoundingBox, Point3, Result, ScalarField3, ScalarGrid};

use crate::Mesh;
use crate::tables::{EDGE_TABLE, TRI_TABLE};

/// Corner layout of one cell relative to its minimum lattice point. Corners
/// 0..3 wind around the z-min face, 4..7 around the z-max face.
const CORNER_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// Corner pairs connected by each of the 12 cell edges.
const EDGE_ENDPOINTS: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Identity of one grid edge, shared by up to four cells: the linear indices
/// of its two endpoint lattice points, lowest first. Every cell touching the
/// edge derives the same key and interpolates from the same global corner
/// data, so shared vertices agree bit for bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EdgeKey(u64, u64);

impl EdgeKey {
    #[inline]
    fn new(a: u64, b: u64) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

/// Geometry produced by marching one z slab of cells, still keyed by grid
/// edge rather than by final vertex index.
struct SlabGeometry {
    vertices: Vec<(EdgeKey, Point3)>,
    triangles: Vec<[EdgeKey; 3]>,
}

/// Extracts the isosurface of a sampled grid as a triangle mesh.
///
/// Cells are classified against `iso_level` with a one-sided sign rule: a
/// corner counts as below the surface only when its value is strictly less
/// than the isovalue, so samples exactly on the isovalue land on the
/// non-negative side. Slabs of cells are marched in parallel and merged in
/// slab order, which keeps vertex numbering identical to a sequential sweep.
pub fn extract_isosurface(grid: &ScalarGrid, iso_level: f64) -> Mesh {
    let cells = grid.cells_per_axis();
    if cells == 0 {
        return Mesh::empty();
    }

    let slabs: Vec<SlabGeometry> = (0..cells)
        .into_par_iter()
        .map(|k| march_slab(grid, iso_level, k))
        .collect();

    merge_slabs(slabs)
}

/// Samples a field over `bounds` and extracts its zero-level isosurface.
pub fn extract_from_field<S>(
    bounds: BoundingBox,
    resolution: usize,
    field: &S,
    iso_level: f64,
) -> Result<Mesh>
where
    S: ScalarField3,
{
    let grid = ScalarGrid::sample(bounds, resolution, field)?;
    Ok(extract_isosurface(&grid, iso_level))
}

fn march_slab(grid: &ScalarGrid, iso_level: f64, k: usize) -> SlabGeometry {
    let cells = grid.cells_per_axis();
    let mut geometry = SlabGeometry {
        vertices: Vec::new(),
        triangles: Vec::new(),
    };
    let mut seen = HashSet::<EdgeKey>::new();

    let mut corner_values = [0.0_f64; 8];
    let mut corner_lattice = [[0usize; 3]; 8];
    let mut edge_keys = [EdgeKey(0, 0); 12];

    for j in 0..cells {
        for i in 0..cells {
            let mut case_index = 0usize;
            for (corner, offset) in CORNER_OFFSETS.iter().enumerate() {
                let gi = i + offset[0];
                let gj = j + offset[1];
                let gk = k + offset[2];
                let value = grid.value(gi, gj, gk);
                corner_values[corner] = value;
                corner_lattice[corner] = [gi, gj, gk];
                if value < iso_level {
                    case_index |= 1 << corner;
                }
            }

            let edge_mask = EDGE_TABLE[case_index];
            if edge_mask == 0 {
                continue;
            }

            for (edge, [a, b]) in EDGE_ENDPOINTS.iter().enumerate() {
                if edge_mask & (1u16 << edge) == 0 {
                    continue;
                }
                let [ai, aj, ak] = corner_lattice[*a];
                let [bi, bj, bk] = corner_lattice[*b];
                let key = EdgeKey::new(
                    grid.linear_index(ai, aj, ak) as u64,
                    grid.linear_index(bi, bj, bk) as u64,
                );
                edge_keys[edge] = key;
                if seen.insert(key) {
                    let point = interpolate_edge(
                        grid.position(ai, aj, ak),
                        grid.position(bi, bj, bk),
                        corner_values[*a],
                        corner_values[*b],
                        iso_level,
                    );
                    geometry.vertices.push((key, point));
                }
            }

            let row = &TRI_TABLE[case_index];
            let mut slot = 0usize;
            while slot + 2 < 16 && row[slot] != -1 {
                geometry.triangles.push([
                    edge_keys[row[slot] as usize],
                    edge_keys[row[slot + 1] as usize],
                    edge_keys[row[slot + 2] as usize],
                ]);
                slot += 3;
            }
        }
    }

    geometry
}

/// Fan-in: assign final vertex indices in slab order. An edge shared between
/// two slabs keeps the index it was given by the lower slab, so the global
/// numbering equals first-discovery order of a sequential sweep.
fn merge_slabs(slabs: Vec<SlabGeometry>) -> Mesh {
    let mut mesh = Mesh::empty();
    let mut index_of = HashMap::<EdgeKey, u32>::new();

    for slab in slabs {
        for (key, point) in slab.vertices {
            index_of.entry(key).or_insert_with(|| {
                let index = mesh.vertices.len() as u32;
                mesh.vertices.push(point);
                index
            });
        }
        for [a, b, c] in slab.triangles {
            mesh.triangles
                .push([index_of[&a], index_of[&b], index_of[&c]]);
        }
    }

    mesh
}

/// Linear interpolation of the isosurface crossing along one edge. When both
/// endpoints sit exactly on the isovalue the crossing is placed at the edge
/// midpoint.
#[inline]
fn interpolate_edge(p1: Point3, p2: Point3, v1: f64, v2: f64, iso: f64) -> Point3 {
    let dv = v2 - v1;
    let t = if dv.abs() <= f64::EPSILON {
        0.5
    } else {
        (iso - v1) / dv
    };
    [
        p1[0] + t * (p2[0] - p1[0]),
        p1[1] + t * (p2[1] - p1[1]),
        p1[2] + t * (p2[2] - p1[2]),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chladni_field::{
        BoundaryKind, BoundingBox, ChladniField, Point3, ScalarField3, ScalarGrid, WaveParameters,
    };

    use super::{extract_from_field, extract_isosurface};

    struct Sphere {
        radius: f64,
    }

    impl ScalarField3 for Sphere {
        fn evaluate(&self, point: Point3) -> f64 {
            (point[0] * point[0] + point[1] * point[1] + point[2] * point[2]).sqrt() - self.radius
        }
    }

    fn fundamental_field() -> ChladniField {
        ChladniField::new(
            WaveParameters {
                a: 1.0,
                b: 0.0,
                c: 0.0,
                d: 0.0,
                e: 0.0,
                f: 0.0,
                ..WaveParameters::default()
            },
            BoundaryKind::Dirichlet,
        )
    }

    fn constant_grid(resolution: usize, value: f64) -> ScalarGrid {
        let count = resolution * resolution * resolution;
        ScalarGrid::from_values(BoundingBox::unit(), resolution, vec![value; count])
            .expect("grid should build")
    }

    #[test]
    fn uniformly_positive_field_yields_empty_mesh() {
        let mesh = extract_isosurface(&constant_grid(10, 1.0), 0.0);
        assert!(mesh.vertices.is_empty());
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn uniformly_negative_field_yields_empty_mesh() {
        let mesh = extract_isosurface(&constant_grid(10, -1.0), 0.0);
        assert!(mesh.vertices.is_empty());
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn uniformly_zero_field_yields_empty_mesh() {
        // Samples exactly on the isovalue classify as the non-negative side.
        let mesh = extract_isosurface(&constant_grid(6, 0.0), 0.0);
        assert!(mesh.vertices.is_empty());
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn single_slice_grid_yields_empty_mesh() {
        let grid = ScalarGrid::from_values(BoundingBox::unit(), 1, vec![0.5])
            .expect("grid should build");
        let mesh = extract_isosurface(&grid, 0.0);
        assert!(mesh.vertices.is_empty());
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn fundamental_mode_produces_mesh_inside_bounds() {
        let bounds = BoundingBox::unit();
        let mesh = extract_from_field(bounds, 10, &fundamental_field(), 0.0)
            .expect("extraction should succeed");

        assert!(!mesh.vertices.is_empty());
        assert!(!mesh.triangles.is_empty());
        for vertex in &mesh.vertices {
            assert!(
                bounds.contains(*vertex, 1e-9),
                "vertex {vertex:?} escapes the bounding box"
            );
        }
    }

    #[test]
    fn triangle_indices_are_in_bounds_and_distinct() {
        let mesh = extract_from_field(BoundingBox::unit(), 16, &fundamental_field(), 0.0)
            .expect("extraction should succeed");

        let vertex_count = mesh.vertices.len() as u32;
        for triangle in &mesh.triangles {
            for &index in triangle {
                assert!(index < vertex_count, "index {index} out of bounds");
            }
            assert!(
                triangle[0] != triangle[1]
                    && triangle[1] != triangle[2]
                    && triangle[0] != triangle[2],
                "triangle {triangle:?} repeats a vertex index"
            );
        }
    }

    #[test]
    fn shared_edges_reference_one_vertex() {
        // Watertightness across cell boundaries: no two emitted vertices may
        // coincide, since coincident positions would mean a shared grid edge
        // was interpolated twice.
        let mesh = extract_from_field(BoundingBox::unit(), 12, &fundamental_field(), 0.0)
            .expect("extraction should succeed");
        assert!(!mesh.vertices.is_empty());

        let mut positions = HashMap::<(u64, u64, u64), u32>::new();
        for (index, vertex) in mesh.vertices.iter().enumerate() {
            let key = (
                vertex[0].to_bits(),
                vertex[1].to_bits(),
                vertex[2].to_bits(),
            );
            if let Some(previous) = positions.insert(key, index as u32) {
                panic!("vertices {previous} and {index} duplicate position {vertex:?}");
            }
        }
    }

    #[test]
    fn interior_mesh_edges_are_manifold() {
        // A closed surface well inside the box: every triangle edge must be
        // shared by exactly two triangles.
        let mesh = extract_from_field(
            BoundingBox::new([-1.5, -1.5, -1.5], [1.5, 1.5, 1.5]).expect("valid bounds"),
            28,
            &Sphere { radius: 1.0 },
            0.0,
        )
        .expect("extraction should succeed");
        assert!(!mesh.triangles.is_empty());

        let mut edge_counts = HashMap::<(u32, u32), usize>::new();
        for triangle in &mesh.triangles {
            for (a, b) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                let edge = if a <= b { (a, b) } else { (b, a) };
                *edge_counts.entry(edge).or_insert(0) += 1;
            }
        }
        for (edge, count) in edge_counts {
            assert_eq!(count, 2, "non-manifold edge {edge:?} has count {count}");
        }
    }

    #[test]
    fn sphere_mesh_volume_is_close_to_analytical() {
        let mesh = extract_from_field(
            BoundingBox::new([-1.5, -1.5, -1.5], [1.5, 1.5, 1.5]).expect("valid bounds"),
            32,
            &Sphere { radius: 1.0 },
            0.0,
        )
        .expect("extraction should succeed");

        let volume = mesh_volume(&mesh).abs();
        let exact = 4.0 * std::f64::consts::PI / 3.0;
        let relative = (volume - exact).abs() / exact;
        assert!(relative < 0.1, "volume relative error too high: {relative:.4}");
    }

    #[test]
    fn extraction_is_idempotent() {
        let field = ChladniField::new(WaveParameters::default(), BoundaryKind::Neumann);
        let first =
            extract_from_field(BoundingBox::unit(), 14, &field, 0.0).expect("first extraction");
        let second =
            extract_from_field(BoundingBox::unit(), 14, &field, 0.0).expect("second extraction");

        assert_eq!(first.vertices, second.vertices);
        assert_eq!(first.triangles, second.triangles);
    }

    #[test]
    fn degenerate_edge_interpolates_to_midpoint() {
        let t = super::interpolate_edge([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.0, 0.0, 0.0);
        assert_eq!(t, [0.5, 0.0, 0.0]);
    }

    #[test]
    fn crossing_is_weighted_toward_the_nearer_value() {
        let point = super::interpolate_edge([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], -1.0, 3.0, 0.0);
        assert!((point[0] - 0.25).abs() < 1e-12);
    }

    fn mesh_volume(mesh: &crate::Mesh) -> f64 {
        mesh.triangles
            .iter()
            .map(|tri| {
                let a = mesh.vertices[tri[0] as usize];
                let b = mesh.vertices[tri[1] as usize];
                let c = mesh.vertices[tri[2] as usize];
                let cross = [
                    b[1] * c[2] - b[2] * c[1],
                    b[2] * c[0] - b[0] * c[2],
                    b[0] * c[1] - b[1] * c[0],
                ];
                (a[0] * cross[0] + a[1] * cross[1] + a[2] * cross[2]) / 6.0
            })
            .sum()
    }
}
