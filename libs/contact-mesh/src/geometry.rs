//! # Triangle Geometry
//!
//! Per-triangle attributes (centroid, outward normal, Heron area) and mesh
//! connectivity (vertex adjacency, triangle neighbors, regional index).

use std::collections::BTreeSet;

use config::constants::DEGENERATE_CROSS_EPSILON;
use glam::DVec3;

use crate::error::{ContactMeshError, ContactMeshResult};
use crate::mesh::Mesh;

// =============================================================================
// SINGLE TRIANGLE
// =============================================================================

/// Centroid (mean of the three corners).
#[inline]
pub fn triangle_centroid(v1: DVec3, v2: DVec3, v3: DVec3) -> DVec3 {
    (v1 + v2 + v3) / 3.0
}

/// Outward unit normal of a counter-clockwise triangle.
///
/// Computed as the negated, normalized `(v3 - v1) x (v2 - v1)`. Returns
/// `None` when the cross product has (near) zero length.
pub fn triangle_normal(v1: DVec3, v2: DVec3, v3: DVec3) -> Option<DVec3> {
    let cross = (v3 - v1).cross(v2 - v1);
    let magnitude = cross.length();
    if !magnitude.is_finite() || magnitude < DEGENERATE_CROSS_EPSILON {
        return None;
    }
    Some(-cross / magnitude)
}

/// Triangle area from its three edge lengths (Heron's formula).
pub fn heron_area(v1: DVec3, v2: DVec3, v3: DVec3) -> f64 {
    let s1 = v1.distance(v2);
    let s2 = v2.distance(v3);
    let s3 = v3.distance(v1);
    let s = (s1 + s2 + s3) / 2.0;
    // Rounding can push the radicand slightly negative for slivers.
    (s * (s - s1) * (s - s2) * (s - s3)).max(0.0).sqrt()
}

// =============================================================================
// PER-TRIANGLE ATTRIBUTES
// =============================================================================

/// Geometric attributes for every face of a mesh, as parallel arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleGeometry {
    /// Centroid of each face.
    pub centers: Vec<DVec3>,
    /// Outward unit normal of each face.
    pub normals: Vec<DVec3>,
    /// Area of each face.
    pub areas: Vec<f64>,
}

impl TriangleGeometry {
    /// Computes centers, normals and areas for every face.
    ///
    /// Fails with [`ContactMeshError::DegenerateGeometry`] on the first face
    /// whose normal is undefined.
    ///
    /// # Example
    ///
    /// ```rust
    /// use contact_mesh::{geometry::TriangleGeometry, Mesh};
    /// use glam::DVec3;
    ///
    /// let mesh = Mesh::from_parts(vec![DVec3::ZERO, DVec3::X, DVec3::Y], vec![[0, 1, 2]]).unwrap();
    /// let geometry = TriangleGeometry::compute(&mesh).unwrap();
    /// assert_eq!(geometry.normals[0], DVec3::Z);
    /// assert!((geometry.areas[0] - 0.5).abs() < 1e-12);
    /// ```
    pub fn compute(mesh: &Mesh) -> ContactMeshResult<Self> {
        let count = mesh.triangle_count();
        let mut centers = Vec::with_capacity(count);
        let mut normals = Vec::with_capacity(count);
        let mut areas = Vec::with_capacity(count);

        for i in 0..count {
            let [v1, v2, v3] = mesh.triangle_vertices(i);
            let normal = triangle_normal(v1, v2, v3)
                .ok_or_else(|| ContactMeshError::degenerate(i, "zero-length cross product"))?;

            centers.push(triangle_centroid(v1, v2, v3));
            normals.push(normal);
            areas.push(heron_area(v1, v2, v3));
        }

        Ok(Self {
            centers,
            normals,
            areas,
        })
    }

    /// Number of faces described.
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// True if no faces are described.
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}

// =============================================================================
// CONNECTIVITY
// =============================================================================

/// Inverted index: vertex id -> incident triangle ids (ascending).
pub fn vertex_triangles(mesh: &Mesh) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); mesh.vertex_count()];
    for (face, tri) in mesh.triangles().iter().enumerate() {
        for &vertex in tri {
            let incident = &mut adjacency[vertex as usize];
            // A face listing the same vertex twice is only recorded once.
            if incident.last() != Some(&face) {
                incident.push(face);
            }
        }
    }
    adjacency
}

/// Triangles sharing at least one vertex with each triangle (self excluded).
pub fn triangle_neighbors(mesh: &Mesh, vertex_triangles: &[Vec<usize>]) -> Vec<BTreeSet<usize>> {
    mesh.triangles()
        .iter()
        .enumerate()
        .map(|(face, tri)| {
            tri.iter()
                .flat_map(|&vertex| vertex_triangles[vertex as usize].iter().copied())
                .filter(|&other| other != face)
                .collect()
        })
        .collect()
}

// =============================================================================
// REGIONS
// =============================================================================

/// Half-space of the mesh frame, selected by the sign of one centroid
/// coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Centroid x < 0.
    NegativeX,
    /// Centroid x >= 0.
    PositiveX,
    /// Centroid y < 0.
    NegativeY,
    /// Centroid y >= 0.
    PositiveY,
    /// Centroid z < 0.
    NegativeZ,
    /// Centroid z >= 0.
    PositiveZ,
}

impl Region {
    /// All regions in storage order.
    pub const ALL: [Region; 6] = [
        Region::NegativeX,
        Region::PositiveX,
        Region::NegativeY,
        Region::PositiveY,
        Region::NegativeZ,
        Region::PositiveZ,
    ];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// Triangle ids grouped into the six coordinate half-spaces. Every triangle
/// appears in exactly three regions, one per axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionalIndex {
    regions: [Vec<usize>; 6],
}

impl RegionalIndex {
    /// Classifies every triangle centroid.
    pub fn from_centers(centers: &[DVec3]) -> Self {
        let mut regions: [Vec<usize>; 6] = Default::default();
        for (face, center) in centers.iter().enumerate() {
            for axis in 0..3 {
                let slot = if center[axis] < 0.0 { axis * 2 } else { axis * 2 + 1 };
                regions[slot].push(face);
            }
        }
        Self { regions }
    }

    /// Triangles in the given region.
    pub fn triangles(&self, region: Region) -> &[usize] {
        &self.regions[region.slot()]
    }
}
