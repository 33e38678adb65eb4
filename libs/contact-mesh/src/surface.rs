//! # Contact Surface
//!
//! A triangulated contact surface with precomputed per-triangle attributes
//! and an OBB tree for ray queries.
//!
//! ## Lifecycle
//!
//! Properties are plain data. Every change bumps a revision counter; the
//! built geometry remembers the revision it came from, so
//! [`ContactSurface::is_stale`] is a single comparison and
//! [`ContactSurface::ensure_built`] rebuilds only when needed. A rebuild
//! assembles a complete new snapshot before replacing the old one, so a
//! failure leaves the previous geometry untouched.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use config::constants::{
    DEFAULT_ELASTIC_MODULUS, DEFAULT_MAX_THICKNESS, DEFAULT_MIN_THICKNESS,
    DEFAULT_POISSONS_RATIO, DEFAULT_THICKNESS,
};
use config::index_config::IndexConfig;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::error::{ContactMeshError, ContactMeshResult};
use crate::geometry::{
    triangle_neighbors, vertex_triangles, Region, RegionalIndex, TriangleGeometry,
};
use crate::loader::MeshLoader;
use crate::mesh::Mesh;
use crate::obb_tree::ObbTree;
use crate::ray::{RayHit, RayTraversal};
use crate::thickness::{estimate_thickness, OverflowPolicy, ThicknessBounds};

// =============================================================================
// PROPERTIES
// =============================================================================

/// A material value given once for the whole surface or once per triangle.
///
/// Serializes as a bare number or as an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialProperty {
    /// Same value on every triangle.
    Uniform(f64),
    /// One value per triangle, in face order.
    PerTriangle(Vec<f64>),
}

impl MaterialProperty {
    /// Expands to one value per triangle.
    ///
    /// # Errors
    ///
    /// [`ContactMeshError::InvalidProperty`] when a per-triangle list has the
    /// wrong length or any value is not finite.
    pub fn per_triangle(&self, name: &str, triangle_count: usize) -> ContactMeshResult<Vec<f64>> {
        let values = match self {
            MaterialProperty::Uniform(value) => vec![*value; triangle_count],
            MaterialProperty::PerTriangle(values) => {
                if values.len() != triangle_count {
                    return Err(ContactMeshError::invalid_property(format!(
                        "{name} lists {} values for {triangle_count} triangles",
                        values.len()
                    )));
                }
                values.clone()
            }
        };
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ContactMeshError::invalid_property(format!(
                "{name} must be finite, got {bad}"
            )));
        }
        Ok(values)
    }
}

impl From<f64> for MaterialProperty {
    fn from(value: f64) -> Self {
        MaterialProperty::Uniform(value)
    }
}

impl From<Vec<f64>> for MaterialProperty {
    fn from(values: Vec<f64>) -> Self {
        MaterialProperty::PerTriangle(values)
    }
}

/// User-facing configuration of a contact surface.
///
/// Missing fields take their defaults when deserializing.
///
/// # Example
///
/// ```rust
/// use contact_mesh::surface::ContactSurfaceProperties;
///
/// let props = ContactSurfaceProperties::new("femur_cartilage.stl");
/// assert_eq!(props.min_thickness, 0.001);
/// assert!(!props.use_variable_thickness);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSurfaceProperties {
    /// Front (contacting) surface mesh.
    pub mesh_file: PathBuf,
    /// Elastic modulus of the layer.
    pub elastic_modulus: MaterialProperty,
    /// Poisson's ratio of the layer.
    pub poissons_ratio: MaterialProperty,
    /// Layer thickness when `use_variable_thickness` is off.
    pub thickness: MaterialProperty,
    /// Measure thickness against `mesh_back_file` instead.
    pub use_variable_thickness: bool,
    /// Back (bone side) surface mesh for variable thickness.
    pub mesh_back_file: Option<PathBuf>,
    /// Lower thickness bound for variable thickness.
    pub min_thickness: f64,
    /// Upper thickness bound for variable thickness.
    pub max_thickness: f64,
    /// Per-axis scale applied to both meshes after loading.
    pub scale_factors: DVec3,
    /// Resolution of measured depths above `max_thickness`.
    pub thickness_overflow: OverflowPolicy,
    /// Tree traversal used by ray queries.
    pub ray_traversal: RayTraversal,
}

impl ContactSurfaceProperties {
    /// Default properties for the given front mesh.
    pub fn new(mesh_file: impl Into<PathBuf>) -> Self {
        Self {
            mesh_file: mesh_file.into(),
            ..Self::default()
        }
    }

    /// Enables variable thickness against the given back mesh.
    pub fn with_variable_thickness(mut self, mesh_back_file: impl Into<PathBuf>) -> Self {
        self.use_variable_thickness = true;
        self.mesh_back_file = Some(mesh_back_file.into());
        self
    }
}

impl Default for ContactSurfaceProperties {
    fn default() -> Self {
        Self {
            mesh_file: PathBuf::new(),
            elastic_modulus: MaterialProperty::Uniform(DEFAULT_ELASTIC_MODULUS),
            poissons_ratio: MaterialProperty::Uniform(DEFAULT_POISSONS_RATIO),
            thickness: MaterialProperty::Uniform(DEFAULT_THICKNESS),
            use_variable_thickness: false,
            mesh_back_file: None,
            min_thickness: DEFAULT_MIN_THICKNESS,
            max_thickness: DEFAULT_MAX_THICKNESS,
            scale_factors: DVec3::ONE,
            thickness_overflow: OverflowPolicy::default(),
            ray_traversal: RayTraversal::default(),
        }
    }
}

// =============================================================================
// BUILT GEOMETRY
// =============================================================================

/// Back surface used for variable thickness.
#[derive(Debug, Clone)]
struct BackSurface {
    mesh: Mesh,
    tree: ObbTree,
}

/// Everything derived from the properties in one rebuild.
#[derive(Debug, Clone)]
struct SurfaceGeometry {
    revision: u64,
    mesh: Mesh,
    attributes: TriangleGeometry,
    thickness: Vec<f64>,
    elastic_modulus: Vec<f64>,
    poissons_ratio: Vec<f64>,
    vertex_triangles: Vec<Vec<usize>>,
    neighbors: Vec<BTreeSet<usize>>,
    face_vertex_locations: Vec<[DVec3; 3]>,
    regions: RegionalIndex,
    tree: ObbTree,
    back: Option<BackSurface>,
}

// =============================================================================
// CONTACT SURFACE
// =============================================================================

/// Contact surface entity, generic over where its meshes come from.
///
/// # Example
///
/// ```rust
/// use contact_mesh::loader::InMemoryMeshLoader;
/// use contact_mesh::primitives::create_box;
/// use contact_mesh::surface::{ContactSurface, ContactSurfaceProperties};
/// use glam::DVec3;
///
/// let mut loader = InMemoryMeshLoader::default();
/// loader.insert("cube.obj", create_box(DVec3::ONE, true).unwrap());
///
/// let mut surface =
///     ContactSurface::new("cube", ContactSurfaceProperties::new("cube.obj"), loader);
/// surface.ensure_built().unwrap();
///
/// let hit = surface
///     .ray_intersect(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z, 0.0, 10.0)
///     .unwrap();
/// assert!((hit.distance - 4.5).abs() < 1e-9);
/// ```
#[derive(Debug)]
pub struct ContactSurface<L: MeshLoader> {
    name: String,
    properties: ContactSurfaceProperties,
    index_config: IndexConfig,
    loader: L,
    revision: u64,
    geometry: Option<SurfaceGeometry>,
}

impl<L: MeshLoader> ContactSurface<L> {
    /// Creates an unbuilt surface with the default index configuration.
    pub fn new(name: impl Into<String>, properties: ContactSurfaceProperties, loader: L) -> Self {
        Self {
            name: name.into(),
            properties,
            index_config: IndexConfig::default(),
            loader,
            revision: 1,
            geometry: None,
        }
    }

    /// Replaces the index configuration.
    pub fn with_index_config(mut self, index_config: IndexConfig) -> Self {
        self.set_index_config(index_config);
        self
    }

    /// Surface name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current properties.
    pub fn properties(&self) -> &ContactSurfaceProperties {
        &self.properties
    }

    /// Mutable access to the properties. Marks the geometry stale.
    pub fn properties_mut(&mut self) -> &mut ContactSurfaceProperties {
        self.revision += 1;
        &mut self.properties
    }

    /// Replaces all properties. Marks the geometry stale.
    pub fn set_properties(&mut self, properties: ContactSurfaceProperties) {
        self.properties = properties;
        self.revision += 1;
    }

    /// Current index configuration.
    pub fn index_config(&self) -> &IndexConfig {
        &self.index_config
    }

    /// Replaces the index configuration. Marks the geometry stale.
    pub fn set_index_config(&mut self, index_config: IndexConfig) {
        self.index_config = index_config;
        self.revision += 1;
    }

    /// Loader used for mesh files.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Revision of the current properties.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Revision the built geometry came from.
    pub fn built_revision(&self) -> Option<u64> {
        self.geometry.as_ref().map(|g| g.revision)
    }

    /// True once any rebuild has succeeded.
    pub fn is_built(&self) -> bool {
        self.geometry.is_some()
    }

    /// True if there is no geometry or it predates the current properties.
    pub fn is_stale(&self) -> bool {
        self.built_revision() != Some(self.revision)
    }

    /// Rebuilds if stale.
    pub fn ensure_built(&mut self) -> ContactMeshResult<()> {
        if self.is_stale() {
            self.rebuild()?;
        }
        Ok(())
    }

    /// Reloads the meshes and recomputes every derived array and tree.
    ///
    /// # Errors
    ///
    /// Loader failures, degenerate triangles, inconsistent material lists or
    /// thickness bounds. The previous geometry is kept on error.
    pub fn rebuild(&mut self) -> ContactMeshResult<()> {
        info!(
            surface = %self.name,
            revision = self.revision,
            mesh = %self.properties.mesh_file.display(),
            "rebuilding contact surface"
        );

        match self.assemble() {
            Ok(geometry) => {
                info!(
                    surface = %self.name,
                    triangles = geometry.mesh.triangle_count(),
                    vertices = geometry.mesh.vertex_count(),
                    tree_nodes = geometry.tree.node_count(),
                    variable_thickness = geometry.back.is_some(),
                    "contact surface built"
                );
                self.geometry = Some(geometry);
                Ok(())
            }
            Err(err) => {
                warn!(
                    surface = %self.name,
                    error = %err,
                    kept_previous = self.geometry.is_some(),
                    "contact surface rebuild failed"
                );
                Err(err)
            }
        }
    }

    fn load_scaled(&self, path: &Path) -> ContactMeshResult<Mesh> {
        let mut mesh = self.loader.load_mesh(path)?;
        mesh.validate()?;
        mesh.scale(self.properties.scale_factors);
        debug!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "loaded mesh"
        );
        Ok(mesh)
    }

    fn assemble(&self) -> ContactMeshResult<SurfaceGeometry> {
        let props = &self.properties;
        let config = &self.index_config;

        let mesh = self.load_scaled(&props.mesh_file)?;
        let count = mesh.triangle_count();
        let attributes = TriangleGeometry::compute(&mesh)?;

        let adjacency = vertex_triangles(&mesh);
        let neighbors = triangle_neighbors(&mesh, &adjacency);
        let face_vertex_locations = (0..count).map(|i| mesh.triangle_vertices(i)).collect();
        let regions = RegionalIndex::from_centers(&attributes.centers);
        let tree = ObbTree::build(&mesh, config)?;

        let elastic_modulus = props.elastic_modulus.per_triangle("elastic_modulus", count)?;
        let poissons_ratio = props.poissons_ratio.per_triangle("poissons_ratio", count)?;

        let (thickness, back) = if props.use_variable_thickness {
            let back_path = props.mesh_back_file.as_deref().ok_or_else(|| {
                ContactMeshError::invalid_property(
                    "use_variable_thickness requires mesh_back_file",
                )
            })?;
            let bounds = ThicknessBounds::new(props.min_thickness, props.max_thickness)?;
            let back_mesh = self.load_scaled(back_path)?;
            let back_tree = ObbTree::build(&back_mesh, config)?;
            let thickness = estimate_thickness(
                &attributes.centers,
                &attributes.normals,
                &back_mesh,
                &back_tree,
                bounds,
                props.thickness_overflow,
                props.ray_traversal,
            )?;
            (
                thickness,
                Some(BackSurface {
                    mesh: back_mesh,
                    tree: back_tree,
                }),
            )
        } else {
            (props.thickness.per_triangle("thickness", count)?, None)
        };

        Ok(SurfaceGeometry {
            revision: self.revision,
            mesh,
            attributes,
            thickness,
            elastic_modulus,
            poissons_ratio,
            vertex_triangles: adjacency,
            neighbors,
            face_vertex_locations,
            regions,
            tree,
            back,
        })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Nearest surface hit inside the open window `(min_proximity,
    /// max_proximity)`.
    ///
    /// Casts along `direction` first. If that hit is missing or outside the
    /// window and `min_proximity` is negative, casts along `-direction` and
    /// reports the hit with a negated distance. Returns `None` when the
    /// surface has not been built or `direction` has zero length.
    pub fn ray_intersect(
        &self,
        origin: DVec3,
        direction: DVec3,
        min_proximity: f64,
        max_proximity: f64,
    ) -> Option<RayHit> {
        let geometry = self.geometry.as_ref()?;
        let direction = direction.try_normalize()?;
        let traversal = self.properties.ray_traversal;
        let in_window = |d: f64| d > min_proximity && d < max_proximity;

        if let Some(hit) = geometry.tree.cast(&geometry.mesh, origin, direction, traversal) {
            if in_window(hit.distance) {
                return Some(hit);
            }
        }

        if min_proximity < 0.0 {
            if let Some(hit) = geometry.tree.cast(&geometry.mesh, origin, -direction, traversal) {
                let reversed = RayHit {
                    distance: -hit.distance,
                    ..hit
                };
                if in_window(reversed.distance) {
                    return Some(reversed);
                }
            }
        }

        None
    }

    fn built(&self) -> ContactMeshResult<&SurfaceGeometry> {
        self.geometry.as_ref().ok_or(ContactMeshError::NotBuilt)
    }

    fn checked<'a, T>(slice: &'a [T], index: usize) -> ContactMeshResult<&'a T> {
        slice
            .get(index)
            .ok_or_else(|| ContactMeshError::out_of_range("triangle", index, slice.len()))
    }

    /// Number of triangles in the built mesh.
    pub fn triangle_count(&self) -> ContactMeshResult<usize> {
        Ok(self.built()?.mesh.triangle_count())
    }

    /// Built (scaled) front mesh.
    pub fn mesh(&self) -> ContactMeshResult<&Mesh> {
        Ok(&self.built()?.mesh)
    }

    /// OBB tree over the front mesh.
    pub fn tree(&self) -> ContactMeshResult<&ObbTree> {
        Ok(&self.built()?.tree)
    }

    /// Built (scaled) back mesh, when variable thickness is on.
    pub fn back_mesh(&self) -> ContactMeshResult<Option<&Mesh>> {
        Ok(self.built()?.back.as_ref().map(|b| &b.mesh))
    }

    /// OBB tree over the back mesh, when variable thickness is on.
    pub fn back_tree(&self) -> ContactMeshResult<Option<&ObbTree>> {
        Ok(self.built()?.back.as_ref().map(|b| &b.tree))
    }

    /// Centroid of a triangle.
    pub fn triangle_center(&self, index: usize) -> ContactMeshResult<DVec3> {
        Self::checked(&self.built()?.attributes.centers, index).copied()
    }

    /// Outward unit normal of a triangle.
    pub fn triangle_normal(&self, index: usize) -> ContactMeshResult<DVec3> {
        Self::checked(&self.built()?.attributes.normals, index).copied()
    }

    /// Area of a triangle.
    pub fn triangle_area(&self, index: usize) -> ContactMeshResult<f64> {
        Self::checked(&self.built()?.attributes.areas, index).copied()
    }

    /// Layer thickness at a triangle.
    pub fn triangle_thickness(&self, index: usize) -> ContactMeshResult<f64> {
        Self::checked(&self.built()?.thickness, index).copied()
    }

    /// Elastic modulus at a triangle.
    pub fn triangle_elastic_modulus(&self, index: usize) -> ContactMeshResult<f64> {
        Self::checked(&self.built()?.elastic_modulus, index).copied()
    }

    /// Poisson's ratio at a triangle.
    pub fn triangle_poissons_ratio(&self, index: usize) -> ContactMeshResult<f64> {
        Self::checked(&self.built()?.poissons_ratio, index).copied()
    }

    /// Triangles sharing a vertex with the given one.
    pub fn triangle_neighbors(&self, index: usize) -> ContactMeshResult<&BTreeSet<usize>> {
        Self::checked(&self.built()?.neighbors, index)
    }

    /// Corner positions of a triangle.
    pub fn face_vertex_locations(&self, index: usize) -> ContactMeshResult<[DVec3; 3]> {
        Self::checked(&self.built()?.face_vertex_locations, index).copied()
    }

    /// Triangles incident to a vertex.
    pub fn vertex_triangles(&self, vertex: usize) -> ContactMeshResult<&[usize]> {
        let adjacency = &self.built()?.vertex_triangles;
        adjacency
            .get(vertex)
            .map(Vec::as_slice)
            .ok_or_else(|| ContactMeshError::out_of_range("vertex", vertex, adjacency.len()))
    }

    /// All triangle centroids.
    pub fn triangle_centers(&self) -> ContactMeshResult<&[DVec3]> {
        Ok(&self.built()?.attributes.centers)
    }

    /// All triangle normals.
    pub fn triangle_normals(&self) -> ContactMeshResult<&[DVec3]> {
        Ok(&self.built()?.attributes.normals)
    }

    /// All triangle areas.
    pub fn triangle_areas(&self) -> ContactMeshResult<&[f64]> {
        Ok(&self.built()?.attributes.areas)
    }

    /// All triangle thicknesses.
    pub fn triangle_thicknesses(&self) -> ContactMeshResult<&[f64]> {
        Ok(&self.built()?.thickness)
    }

    /// All triangle elastic moduli.
    pub fn triangle_elastic_moduli(&self) -> ContactMeshResult<&[f64]> {
        Ok(&self.built()?.elastic_modulus)
    }

    /// All triangle Poisson's ratios.
    pub fn triangle_poissons_ratios(&self) -> ContactMeshResult<&[f64]> {
        Ok(&self.built()?.poissons_ratio)
    }

    /// Triangles whose centroid lies in a half-space of the mesh frame.
    pub fn regional_triangles(&self, region: Region) -> ContactMeshResult<&[usize]> {
        Ok(self.built()?.regions.triangles(region))
    }

    // =========================================================================
    // DIAGNOSTICS
    // =========================================================================

    /// One row per triangle: index, area, thickness, elastic modulus,
    /// Poisson's ratio, center and normal.
    pub fn debug_table(&self) -> ContactMeshResult<String> {
        let g = self.built()?;
        let mut table = String::new();
        let _ = writeln!(table, "Mesh Properties: {}", self.name);
        let _ = writeln!(
            table,
            "{:<10} {:<15} {:<15} {:<15} {:<15} {:<35} {:<35}",
            "Tri #", "Area", "Thickness", "Elastic Modulus", "Poissons Ratio", "Center", "Normal"
        );
        for i in 0..g.mesh.triangle_count() {
            let _ = writeln!(
                table,
                "{:<10} {:<15} {:<15} {:<15} {:<15} {:<35} {:<35}",
                i,
                format!("{:.6e}", g.attributes.areas[i]),
                format!("{:.6e}", g.thickness[i]),
                format!("{:.6e}", g.elastic_modulus[i]),
                format!("{:.6}", g.poissons_ratio[i]),
                format_vec(g.attributes.centers[i]),
                format_vec(g.attributes.normals[i]),
            );
        }
        Ok(table)
    }

    /// Emits [`ContactSurface::debug_table`] at trace level, one event per
    /// line.
    pub fn log_debug_table(&self) -> ContactMeshResult<()> {
        let table = self.debug_table()?;
        for line in table.lines() {
            trace!(surface = %self.name, "{line}");
        }
        Ok(())
    }
}

fn format_vec(v: DVec3) -> String {
    format!("[{:.6}, {:.6}, {:.6}]", v.x, v.y, v.z)
}
