//! # Contact Mesh Errors
//!
//! Error types for mesh loading, attribute precomputation and index queries.

use std::path::PathBuf;

use config::index_config::ConfigError;
use thiserror::Error;

/// Result type alias for contact mesh operations.
pub type ContactMeshResult<T> = Result<T, ContactMeshError>;

/// Errors raised at the mesh loader boundary.
#[derive(Debug, Error)]
pub enum MeshLoadError {
    /// The mesh file could not be resolved.
    #[error("mesh file not found: {path} (tried {attempts:?})")]
    NotFound {
        /// Path as requested.
        path: PathBuf,
        /// Every location that was tried, in order.
        attempts: Vec<PathBuf>,
    },

    /// The file extension is not one of `.vtp`, `.obj`, `.stl`.
    #[error("unsupported mesh format '{extension}' for {path}")]
    UnsupportedFormat {
        /// Path as requested.
        path: PathBuf,
        /// Offending extension (empty when missing).
        extension: String,
    },

    /// The file was found but its contents could not be parsed.
    #[error("invalid mesh content in {path}: {message}")]
    InvalidContent {
        /// Resolved path.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshLoadError {
    /// Creates a not-found error with the list of attempted locations.
    pub fn not_found(path: impl Into<PathBuf>, attempts: Vec<PathBuf>) -> Self {
        Self::NotFound {
            path: path.into(),
            attempts,
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported(path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            extension: extension.into(),
        }
    }

    /// Creates an invalid content error.
    pub fn invalid_content(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidContent {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while building or querying a contact mesh.
#[derive(Debug, Error)]
pub enum ContactMeshError {
    /// Loading a front or back mesh failed.
    #[error("mesh load failed: {0}")]
    Load(#[from] MeshLoadError),

    /// A triangle has zero area or a zero-length normal.
    #[error("degenerate triangle {triangle}: {message}")]
    DegenerateGeometry {
        /// Offending face index.
        triangle: usize,
        /// What was degenerate.
        message: String,
    },

    /// A triangle or vertex index is out of range.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Kind of element being indexed.
        what: &'static str,
        /// Requested index.
        index: usize,
        /// Number of elements available.
        len: usize,
    },

    /// An operation that needs data received none.
    #[error("empty input: {message}")]
    EmptyInput {
        /// What was empty.
        message: String,
    },

    /// A surface property is inconsistent with the mesh or with itself.
    #[error("invalid property: {message}")]
    InvalidProperty {
        /// Description of the inconsistency.
        message: String,
    },

    /// Index configuration failed validation.
    #[error("invalid index configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The surface has never been built successfully.
    #[error("contact surface has not been built")]
    NotBuilt,
}

impl ContactMeshError {
    /// Creates a degenerate geometry error.
    pub fn degenerate(triangle: usize, message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            triangle,
            message: message.into(),
        }
    }

    /// Creates an index out of range error.
    pub fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { what, index, len }
    }

    /// Creates an empty input error.
    pub fn empty(message: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: message.into(),
        }
    }

    /// Creates an invalid property error.
    pub fn invalid_property(message: impl Into<String>) -> Self {
        Self::InvalidProperty {
            message: message.into(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
