//! Mesh serialization to STL and OBJ.

use std::fmt::Write as _;

use crate::Mesh;

pub fn to_binary_stl(mesh: &Mesh, name: &str) -> Vec<u8> {
    let mut bytes = Vec::<u8>::with_capacity(84 + mesh.triangles.len() * 50);

    let mut header = [0u8; 80];
    let name_bytes = name.as_bytes();
    let copied = name_bytes.len().min(header.len());
    header[..copied].copy_from_slice(&name_bytes[..copied]);
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(&(mesh.triangles.len() as u32).to_le_bytes());

    for [a, b, c] in triangle_corners(mesh) {
        push_f32_triplet(&mut bytes, facet_normal(a, b, c));
        push_f32_triplet(&mut bytes, a);
        push_f32_triplet(&mut bytes, b);
        push_f32_triplet(&mut bytes, c);
        bytes.extend_from_slice(&0u16.to_le_bytes());
    }

    bytes
}

pub fn to_ascii_stl(mesh: &Mesh, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "solid {name}");

    for [a, b, c] in triangle_corners(mesh) {
        let n = facet_normal(a, b, c);
        let _ = writeln!(out, "  facet normal {} {} {}", n[0], n[1], n[2]);
        out.push_str("    outer loop\n");
        for vertex in [a, b, c] {
            let _ = writeln!(out, "      vertex {} {} {}", vertex[0], vertex[1], vertex[2]);
        }
        out.push_str("    endloop\n  endfacet\n");
    }

    let _ = writeln!(out, "endsolid {name}");
    out
}

pub fn to_obj(mesh: &Mesh) -> String {
    let mut out = String::new();
    for vertex in &mesh.vertices {
        let _ = writeln!(out, "v {} {} {}", vertex[0], vertex[1], vertex[2]);
    }
    // OBJ face indices are one-based.
    for triangle in &mesh.triangles {
        let _ = writeln!(
            out,
            "f {} {} {}",
            triangle[0] + 1,
            triangle[1] + 1,
            triangle[2] + 1
        );
    }
    out
}

fn triangle_corners(mesh: &Mesh) -> impl Iterator<Item = [[f64; 3]; 3]> + '_ {
    mesh.triangles.iter().map(|tri| {
        [
            mesh.vertices[tri[0] as usize],
            mesh.vertices[tri[1] as usize],
            mesh.vertices[tri[2] as usize],
        ]
    })
}

#[inline]
fn facet_normal(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f64; 3] {
    let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        ab[1] * ac[2] - ab[2] * ac[1],
        ab[2] * ac[0] - ab[0] * ac[2],
        ab[0] * ac[1] - ab[1] * ac[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len <= f64::EPSILON {
        [0.0, 0.0, 0.0]
    } else {
        [n[0] / len, n[1] / len, n[2] / len]
    }
}

#[inline]
fn push_f32_triplet(bytes: &mut Vec<u8>, value: [f64; 3]) {
    for component in value {
        bytes.extend_from_slice(&(component as f32).to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use chladni_field::{BoundaryKind, BoundingBox, ChladniField, WaveParameters};

    use crate::extract_from_field;

    use super::{to_ascii_stl, to_binary_stl, to_obj};

    fn single_triangle() -> crate::Mesh {
        crate::Mesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            triangles: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn binary_stl_frames_the_triangle_count() {
        let bytes = to_binary_stl(&single_triangle(), "pattern");
        assert_eq!(bytes.len(), 84 + 50);
        let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]);
        assert_eq!(count, 1);
    }

    #[test]
    fn binary_stl_header_holds_the_name() {
        let bytes = to_binary_stl(&single_triangle(), "pattern");
        assert_eq!(&bytes[..7], b"pattern");
    }

    #[test]
    fn ascii_stl_contains_required_tokens() {
        let stl = to_ascii_stl(&single_triangle(), "tri");
        assert!(stl.starts_with("solid tri"));
        assert!(stl.contains("facet normal"));
        assert!(stl.contains("vertex 0 0 0"));
        assert!(stl.ends_with("endsolid tri\n"));
    }

    #[test]
    fn obj_uses_one_based_face_indices() {
        let obj = to_obj(&single_triangle());
        assert!(obj.contains("v 0 0 0"));
        assert!(obj.contains("f 1 2 3"));
    }

    #[test]
    fn chladni_pattern_round_trips_through_exports() {
        let field = ChladniField::new(WaveParameters::default(), BoundaryKind::Dirichlet);
        let mesh = extract_from_field(BoundingBox::unit(), 12, &field, 0.0)
            .expect("extraction should succeed");
        assert!(!mesh.triangles.is_empty());

        let bin = to_binary_stl(&mesh, "chladni");
        let count = u32::from_le_bytes([bin[80], bin[81], bin[82], bin[83]]) as usize;
        assert_eq!(count, mesh.triangles.len());
        assert_eq!(bin.len(), 84 + count * 50);

        let obj = to_obj(&mesh);
        assert_eq!(obj.matches("\nf ").count(), mesh.triangles.len());
    }
}
