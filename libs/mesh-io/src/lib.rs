//! # Mesh IO
//!
//! File-backed mesh loading for contact surfaces.
//!
//! ## Formats
//!
//! - **OBJ**: `v`/`f` records, triangles only
//! - **STL**: ASCII and binary, duplicate corners welded
//! - **VTP**: VTK XML PolyData with ASCII data arrays
//!
//! ## Usage
//!
//! ```rust,no_run
//! use contact_mesh::{ContactSurface, ContactSurfaceProperties};
//! use mesh_io::FileMeshLoader;
//!
//! let loader = FileMeshLoader::new(["models/knee"]);
//! let props = ContactSurfaceProperties::new("femur_cartilage.vtp");
//! let mut surface = ContactSurface::new("femur_cartilage", props, loader);
//! surface.ensure_built()?;
//! # Ok::<(), contact_mesh::ContactMeshError>(())
//! ```

pub mod error;
pub mod obj;
pub mod stl;
pub mod vtp;

pub use error::{IoError, IoResult};

use std::path::{Path, PathBuf};

use config::constants::GEOMETRY_SUBDIRECTORY;
use contact_mesh::loader::check_mesh_extension;
use contact_mesh::{Mesh, MeshLoadError, MeshLoader};
use tracing::debug;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// VTK XML PolyData.
    Vtp,
    /// Wavefront OBJ.
    Obj,
    /// Stereolithography, ASCII or binary.
    Stl,
}

impl MeshFormat {
    /// Detects the format from the file extension, case-insensitively.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mesh_io::MeshFormat;
    ///
    /// assert_eq!(MeshFormat::from_path("tibia.VTP"), Some(MeshFormat::Vtp));
    /// assert_eq!(MeshFormat::from_path("tibia.ply"), None);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "vtp" => Some(Self::Vtp),
            "obj" => Some(Self::Obj),
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    /// Reads `path` in this format.
    pub fn load(self, path: &Path) -> IoResult<Mesh> {
        match self {
            Self::Vtp => vtp::load_vtp(path),
            Self::Obj => obj::load_obj(path),
            Self::Stl => stl::load_stl(path),
        }
    }
}

/// Loads a mesh file directly, without search paths.
pub fn load_mesh_file(path: &Path) -> Result<Mesh, MeshLoadError> {
    check_mesh_extension(path)?;
    let format = MeshFormat::from_path(path).ok_or_else(|| {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        MeshLoadError::unsupported(path, ext)
    })?;
    format.load(path).map_err(|err| err.into_load_error(path))
}

/// [`MeshLoader`] that reads files from disk.
///
/// Absolute paths are used as given. A relative path is tried below each
/// search directory in order, first directly and then inside its
/// `Geometry/` subdirectory.
#[derive(Debug, Clone)]
pub struct FileMeshLoader {
    search_paths: Vec<PathBuf>,
}

impl Default for FileMeshLoader {
    /// Searches the current directory.
    fn default() -> Self {
        Self::new(["."])
    }
}

impl FileMeshLoader {
    /// Creates a loader with the given search directories.
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends a search directory.
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Search directories in lookup order.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Candidate locations for `path`, in lookup order.
    pub fn candidates(&self, path: &Path) -> Vec<PathBuf> {
        if path.is_absolute() {
            return vec![path.to_path_buf()];
        }
        self.search_paths
            .iter()
            .flat_map(|dir| [dir.join(path), dir.join(GEOMETRY_SUBDIRECTORY).join(path)])
            .collect()
    }

    /// Finds the first existing candidate for `path`.
    ///
    /// # Errors
    ///
    /// [`MeshLoadError::NotFound`] listing every candidate tried.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, MeshLoadError> {
        let attempts = self.candidates(path);
        match attempts.iter().find(|candidate| candidate.is_file()) {
            Some(found) => {
                debug!(requested = %path.display(), resolved = %found.display(), "resolved mesh file");
                Ok(found.clone())
            }
            None => {
                debug!(requested = %path.display(), attempts = attempts.len(), "mesh file not found");
                Err(MeshLoadError::not_found(path, attempts))
            }
        }
    }
}

impl MeshLoader for FileMeshLoader {
    fn load_mesh(&self, path: &Path) -> Result<Mesh, MeshLoadError> {
        check_mesh_extension(path)?;
        let resolved = self.resolve(path)?;
        load_mesh_file(&resolved)
    }
}
