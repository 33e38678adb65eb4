//! # Config Crate
//!
//! Centralized configuration constants for the contact mesh index.
//! All magic numbers and tunable parameters of the OBB fitter, the tree
//! builder, the ray queries and the contact surface defaults are defined here
//! so the kernels stay free of scattered literals.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{OBB_INITIAL_ROTATION_STEP, OBB_MIN_ROTATION_STEP};
//! use config::index_config::IndexConfig;
//!
//! assert!(OBB_MIN_ROTATION_STEP < OBB_INITIAL_ROTATION_STEP);
//!
//! let cfg = IndexConfig::default();
//! assert_eq!(cfg.leaf_triangle_limit, 3);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **No Dependencies**: Pure values, usable from every crate in the workspace
//! - **Well-Documented**: Every constant has clear documentation

pub mod constants;
pub mod index_config;

#[cfg(test)]
mod tests;
