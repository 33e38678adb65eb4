//! Mesh loading seam.
//!
//! The contact surface never touches the filesystem itself; it asks a
//! [`MeshLoader`] for a mesh by path. File-backed loading lives in the
//! `mesh-io` crate; [`InMemoryMeshLoader`] serves tests and embedders that
//! already hold their geometry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::constants::is_supported_mesh_extension;

use crate::error::MeshLoadError;
use crate::mesh::Mesh;

/// Source of triangle meshes.
///
/// # Examples
/// ```
/// use contact_mesh::loader::{InMemoryMeshLoader, MeshLoader};
/// use std::path::Path;
/// let loader = InMemoryMeshLoader::default();
/// assert!(loader.load_mesh(Path::new("femur.stl")).is_err());
/// ```
pub trait MeshLoader {
    /// Loads the mesh stored at `path`.
    fn load_mesh(&self, path: &Path) -> Result<Mesh, MeshLoadError>;
}

impl<L: MeshLoader + ?Sized> MeshLoader for &L {
    fn load_mesh(&self, path: &Path) -> Result<Mesh, MeshLoadError> {
        (**self).load_mesh(path)
    }
}

/// Rejects paths whose extension is not `.vtp`, `.obj` or `.stl`
/// (case-insensitive).
///
/// # Examples
/// ```
/// use contact_mesh::loader::check_mesh_extension;
/// use std::path::Path;
/// assert!(check_mesh_extension(Path::new("tibia.VTP")).is_ok());
/// assert!(check_mesh_extension(Path::new("tibia.ply")).is_err());
/// ```
pub fn check_mesh_extension(path: &Path) -> Result<(), MeshLoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if is_supported_mesh_extension(extension) {
        Ok(())
    } else {
        Err(MeshLoadError::unsupported(path, extension))
    }
}

/// Loader backed by a map of paths to meshes.
///
/// # Examples
/// ```
/// use contact_mesh::loader::{InMemoryMeshLoader, MeshLoader};
/// use contact_mesh::Mesh;
/// use std::path::Path;
/// let mut loader = InMemoryMeshLoader::default();
/// loader.insert("patella.obj", Mesh::new());
/// assert!(loader.load_mesh(Path::new("patella.obj")).is_ok());
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryMeshLoader {
    meshes: HashMap<PathBuf, Mesh>,
}

impl InMemoryMeshLoader {
    /// Inserts or replaces a mesh entry.
    pub fn insert(&mut self, path: impl Into<PathBuf>, mesh: Mesh) {
        self.meshes.insert(path.into(), mesh);
    }

    /// Removes a mesh entry, returning it if present.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> Option<Mesh> {
        self.meshes.remove(path.as_ref())
    }
}

impl MeshLoader for InMemoryMeshLoader {
    fn load_mesh(&self, path: &Path) -> Result<Mesh, MeshLoadError> {
        check_mesh_extension(path)?;
        self.meshes
            .get(path)
            .cloned()
            .ok_or_else(|| MeshLoadError::not_found(path, vec![path.to_path_buf()]))
    }
}
