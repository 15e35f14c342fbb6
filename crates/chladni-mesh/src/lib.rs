pub mod export;
pub mod marching_cubes;
mod tables;

/// Triangle mesh produced by isosurface extraction.
///
/// `vertices` are in first-discovery order; `triangles` index into it.
/// Produced once per extraction and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

pub use marching_cubes::{extract_from_field, extract_isosurface};

#[cfg(test)]
mod tests {
    use super::Mesh;

    #[test]
    fn empty_mesh_has_no_geometry() {
        let mesh = Mesh::empty();
        assert!(mesh.vertices.is_empty());
        assert!(mesh.triangles.is_empty());
        assert!(mesh.is_empty());
    }
}
