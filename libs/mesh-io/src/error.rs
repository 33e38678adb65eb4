//! Error types for mesh file parsing.

use std::path::Path;

use contact_mesh::{ContactMeshError, MeshLoadError};
use thiserror::Error;

/// Result type for mesh file parsing.
pub type IoResult<T> = Result<T, IoError>;

/// Errors raised while reading a mesh file.
#[derive(Debug, Error)]
pub enum IoError {
    /// The file content is malformed.
    #[error("invalid file content: {message}")]
    InvalidContent {
        /// Description of what was invalid.
        message: String,
    },

    /// A face with other than three corners.
    #[error("face {face} has {corners} vertices; only triangles are supported")]
    NonTriangularFace {
        /// Face index in file order.
        face: usize,
        /// Number of corners found.
        corners: usize,
    },

    /// Binary STL shorter than its declared triangle count.
    #[error("truncated binary STL: header declares {expected} triangles, file holds {got}")]
    TruncatedStl {
        /// Declared triangle count.
        expected: u32,
        /// Triangles actually present.
        got: u32,
    },

    /// Parsed geometry failed mesh validation.
    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] ContactMeshError),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Float parsing error.
    #[error("float parsing error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// Integer parsing error.
    #[error("integer parsing error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
}

impl IoError {
    /// Creates an `InvalidContent` error with the given message.
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }

    /// Converts into the loader-boundary error for `path`.
    ///
    /// I/O failures stay I/O failures; everything else becomes
    /// [`MeshLoadError::InvalidContent`].
    pub fn into_load_error(self, path: &Path) -> MeshLoadError {
        match self {
            IoError::Io(err) => MeshLoadError::Io(err),
            other => MeshLoadError::invalid_content(path, other.to_string()),
        }
    }
}
