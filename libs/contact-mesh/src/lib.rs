//! # Contact Mesh
//!
//! Spatial index and ray queries for triangulated contact surfaces.
//!
//! ## Architecture
//!
//! ```text
//! MeshLoader → Mesh → TriangleGeometry ─┐
//!                  └→ ObbTree ──────────┼→ ContactSurface
//!     back Mesh → ObbTree → thickness ──┘
//! ```
//!
//! ## Algorithms
//!
//! - **Box fitting**: rotation search over elementary rotations, optionally
//!   seeded with principal axes from a symmetric 3x3 eigen solver
//! - **Tree**: recursive median split along the longest box axis
//! - **Ray queries**: slab test against boxes, Möller–Trumbore against
//!   triangles, heuristic or exact best-first traversal
//! - **Thickness**: per-triangle casts from the front surface onto a back
//!   surface, run on the rayon pool
//!
//! ## Usage
//!
//! ```rust
//! use contact_mesh::loader::InMemoryMeshLoader;
//! use contact_mesh::primitives::create_sphere;
//! use contact_mesh::{ContactSurface, ContactSurfaceProperties};
//! use glam::DVec3;
//!
//! let mut loader = InMemoryMeshLoader::default();
//! loader.insert("ball.vtp", create_sphere(1.0, 16).unwrap());
//!
//! let mut surface =
//!     ContactSurface::new("ball", ContactSurfaceProperties::new("ball.vtp"), loader);
//! surface.ensure_built().unwrap();
//! let hit = surface.ray_intersect(DVec3::new(0.1, 0.05, 3.0), DVec3::NEG_Z, 0.0, 5.0);
//! assert!(hit.is_some());
//! ```

pub mod eigen;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod mesh;
pub mod obb;
pub mod obb_tree;
pub mod primitives;
pub mod ray;
pub mod surface;
pub mod thickness;

pub use error::{ContactMeshError, ContactMeshResult, MeshLoadError};
pub use geometry::{Region, TriangleGeometry};
pub use loader::{InMemoryMeshLoader, MeshLoader};
pub use mesh::Mesh;
pub use obb::OrientedBoundingBox;
pub use obb_tree::{NodeId, NodeKind, ObbTree, ObbTreeNode};
pub use ray::{RayHit, RayTraversal};
pub use surface::{ContactSurface, ContactSurfaceProperties, MaterialProperty};
pub use thickness::{OverflowPolicy, ThicknessBounds};
