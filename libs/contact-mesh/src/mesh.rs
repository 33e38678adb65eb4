//! # Mesh Data Structure
//!
//! Triangle mesh consumed by the contact index: vertex positions and
//! triangular faces, validated on construction.

use glam::DVec3;

use crate::error::{ContactMeshError, ContactMeshResult};

/// A triangle mesh with vertices and indices.
///
/// All geometry calculations use f64. Once handed to the index the mesh is
/// treated as read-only; rescaling happens before attributes are computed.
///
/// # Example
///
/// ```rust
/// use contact_mesh::Mesh;
/// use glam::DVec3;
///
/// let mut mesh = Mesh::new();
/// mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
/// mesh.add_triangle(0, 1, 2);
/// assert!(mesh.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    vertices: Vec<DVec3>,
    /// Triangle indices (3 indices per triangle)
    triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Creates a mesh from raw parts, rejecting faces that reference
    /// missing vertices.
    ///
    /// # Example
    ///
    /// ```rust
    /// use contact_mesh::Mesh;
    /// use glam::DVec3;
    ///
    /// let ok = Mesh::from_parts(vec![DVec3::ZERO, DVec3::X, DVec3::Y], vec![[0, 1, 2]]);
    /// assert!(ok.is_ok());
    ///
    /// let bad = Mesh::from_parts(vec![DVec3::ZERO], vec![[0, 1, 2]]);
    /// assert!(bad.is_err());
    /// ```
    pub fn from_parts(vertices: Vec<DVec3>, triangles: Vec<[u32; 3]>) -> ContactMeshResult<Self> {
        let mesh = Self {
            vertices,
            triangles,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if the mesh has no faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        index
    }

    /// Adds a triangle by vertex indices.
    pub fn add_triangle(&mut self, v0: u32, v1: u32, v2: u32) {
        self.triangles.push([v0, v1, v2]);
    }

    /// Returns a reference to the vertices.
    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Returns a reference to the triangles.
    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Returns the vertex at the given index.
    ///
    /// Indices stored in a validated mesh are always in range.
    #[inline]
    pub fn vertex(&self, index: u32) -> DVec3 {
        self.vertices[index as usize]
    }

    /// Returns the triangle at the given index.
    #[inline]
    pub fn triangle(&self, index: usize) -> [u32; 3] {
        self.triangles[index]
    }

    /// Returns the three corner positions of a triangle.
    #[inline]
    pub fn triangle_vertices(&self, index: usize) -> [DVec3; 3] {
        let [a, b, c] = self.triangles[index];
        [self.vertex(a), self.vertex(b), self.vertex(c)]
    }

    /// Bounds-checked variant of [`Mesh::triangle_vertices`].
    pub fn try_triangle_vertices(&self, index: usize) -> ContactMeshResult<[DVec3; 3]> {
        if index >= self.triangles.len() {
            return Err(ContactMeshError::out_of_range(
                "triangle",
                index,
                self.triangles.len(),
            ));
        }
        Ok(self.triangle_vertices(index))
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns (min, max) corners of the bounding box.
    pub fn bounding_box(&self) -> (DVec3, DVec3) {
        if self.vertices.is_empty() {
            return (DVec3::ZERO, DVec3::ZERO);
        }

        let mut min = self.vertices[0];
        let mut max = self.vertices[0];

        for v in &self.vertices[1..] {
            min = min.min(*v);
            max = max.max(*v);
        }

        (min, max)
    }

    /// Scales every vertex by a per-axis factor (diagonal linear transform
    /// about the origin).
    ///
    /// # Example
    ///
    /// ```rust
    /// use contact_mesh::Mesh;
    /// use glam::DVec3;
    ///
    /// let mut mesh = Mesh::new();
    /// mesh.add_vertex(DVec3::new(1.0, 1.0, 1.0));
    /// mesh.scale(DVec3::new(2.0, 3.0, 4.0));
    /// assert_eq!(mesh.vertex(0), DVec3::new(2.0, 3.0, 4.0));
    /// ```
    pub fn scale(&mut self, factors: DVec3) {
        for v in &mut self.vertices {
            *v *= factors;
        }
    }

    /// Translates the mesh by a vector.
    pub fn translate(&mut self, offset: DVec3) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Validates the mesh: every face index must reference an existing
    /// vertex.
    pub fn validate(&self) -> ContactMeshResult<()> {
        let vertex_count = self.vertices.len();

        for tri in &self.triangles {
            for &index in tri {
                if index as usize >= vertex_count {
                    return Err(ContactMeshError::out_of_range(
                        "vertex",
                        index as usize,
                        vertex_count,
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_new() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_mesh_add_triangle() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::ZERO);
        mesh.add_vertex(DVec3::X);
        mesh.add_vertex(DVec3::Y);
        mesh.add_triangle(0, 1, 2);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.triangle(0), [0, 1, 2]);
        assert_eq!(mesh.triangle_vertices(0), [DVec3::ZERO, DVec3::X, DVec3::Y]);
    }

    #[test]
    fn test_mesh_bounding_box() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::new(-1.0, -2.0, -3.0));
        mesh.add_vertex(DVec3::new(4.0, 5.0, 6.0));
        let (min, max) = mesh.bounding_box();
        assert_eq!(min, DVec3::new(-1.0, -2.0, -3.0));
        assert_eq!(max, DVec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_mesh_validate_invalid_index() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::ZERO);
        mesh.add_triangle(0, 1, 2);
        let err = mesh.validate().unwrap_err();
        assert!(matches!(
            err,
            ContactMeshError::IndexOutOfRange { what: "vertex", index: 1, len: 1 }
        ));
    }

    #[test]
    fn test_try_triangle_vertices_out_of_range() {
        let mesh = Mesh::from_parts(vec![DVec3::ZERO, DVec3::X, DVec3::Y], vec![[0, 1, 2]]).unwrap();
        assert!(mesh.try_triangle_vertices(0).is_ok());
        assert!(mesh.try_triangle_vertices(1).is_err());
    }

    #[test]
    fn test_mesh_scale_is_diagonal() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::new(1.0, -2.0, 0.5));
        mesh.scale(DVec3::new(2.0, 0.5, -1.0));
        assert_eq!(mesh.vertex(0), DVec3::new(2.0, -1.0, -0.5));
    }
}
