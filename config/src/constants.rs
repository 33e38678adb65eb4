//! # Configuration Constants
//!
//! Centralized constants for the contact mesh index. Fitter step sizes,
//! tolerances, tree limits and material defaults are defined here.
//!
//! ## Categories
//!
//! - **Precision**: Floating-point tolerances for degeneracy checks
//! - **OBB Fitting**: Rotation search steps and box inflation
//! - **Tree & Rays**: Leaf size and ray/triangle rejection threshold
//! - **Material Defaults**: Default contact surface properties
//! - **Limits**: Stack growth for recursive builders

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Smallest cross-product magnitude accepted when computing a triangle normal.
///
/// Triangles whose edge cross product is shorter than this are reported as
/// degenerate instead of producing NaN normals.
///
/// # Example
///
/// ```rust
/// use config::constants::DEGENERATE_CROSS_EPSILON;
///
/// let cross_length = 0.0_f64;
/// assert!(cross_length < DEGENERATE_CROSS_EPSILON);
/// ```
pub const DEGENERATE_CROSS_EPSILON: f64 = 1e-20;

// =============================================================================
// OBB FITTING CONSTANTS
// =============================================================================

/// Initial rotation step (radians) of the OBB hill-climbing search.
///
/// # Example
///
/// ```rust
/// use config::constants::OBB_INITIAL_ROTATION_STEP;
///
/// assert!(OBB_INITIAL_ROTATION_STEP > 0.0);
/// ```
pub const OBB_INITIAL_ROTATION_STEP: f64 = 0.1;

/// The rotation search stops once the step is no longer above this value.
///
/// The step is halved after every converged sweep, so the default schedule is
/// 0.1, 0.05, 0.025, 0.0125.
pub const OBB_MIN_ROTATION_STEP: f64 = 0.01;

/// Relative inflation applied to each side of a fitted box.
///
/// Each axis grows by `max(OBB_RELATIVE_PADDING * extent, OBB_MIN_PADDING)`
/// on both ends so that points on the boundary are never missed later.
pub const OBB_RELATIVE_PADDING: f64 = 1e-5;

/// Absolute lower bound of the per-side box inflation.
pub const OBB_MIN_PADDING: f64 = 1e-10;

/// Padding added to every extent when comparing trial volumes, so flat point
/// sets still have a non-zero volume to minimize.
pub const OBB_VOLUME_PADDING: f64 = 2e-10;

// =============================================================================
// TREE AND RAY CONSTANTS
// =============================================================================

/// Node sets with at most this many triangles become leaves immediately.
///
/// # Example
///
/// ```rust
/// use config::constants::LEAF_TRIANGLE_LIMIT;
///
/// let triangles_in_node = 3;
/// assert!(triangles_in_node <= LEAF_TRIANGLE_LIMIT);
/// ```
pub const LEAF_TRIANGLE_LIMIT: usize = 3;

/// Rays whose scalar triple product with a triangle is below this magnitude
/// are treated as parallel to it.
pub const RAY_PARALLEL_EPSILON: f64 = 1e-8;

// =============================================================================
// MATERIAL DEFAULTS
// =============================================================================

/// Default elastic modulus of a contact surface (Pa).
pub const DEFAULT_ELASTIC_MODULUS: f64 = 1_000_000.0;

/// Default Poisson's ratio of a contact surface.
pub const DEFAULT_POISSONS_RATIO: f64 = 0.5;

/// Default uniform material thickness (m).
pub const DEFAULT_THICKNESS: f64 = 0.005;

/// Default lower clamp for variable thickness estimation (m).
///
/// # Example
///
/// ```rust
/// use config::constants::{DEFAULT_MAX_THICKNESS, DEFAULT_MIN_THICKNESS};
///
/// assert!(DEFAULT_MIN_THICKNESS < DEFAULT_MAX_THICKNESS);
/// ```
pub const DEFAULT_MIN_THICKNESS: f64 = 0.001;

/// Default upper clamp for variable thickness estimation (m).
pub const DEFAULT_MAX_THICKNESS: f64 = 0.01;

/// Mesh file extensions accepted by loaders (lowercase, without the dot).
pub const SUPPORTED_MESH_EXTENSIONS: [&str; 3] = ["vtp", "obj", "stl"];

/// Subdirectory searched below every mesh search path.
pub const GEOMETRY_SUBDIRECTORY: &str = "Geometry";

// =============================================================================
// LIMIT CONSTANTS
// =============================================================================

/// Bytes of stack space reserved when growing recursion limits using the
/// `stacker` crate.
///
/// # Example
///
/// ```rust
/// use config::constants::STACKER_STACK_SIZE_BYTES;
///
/// assert!(STACKER_STACK_SIZE_BYTES >= 1024);
/// ```
pub const STACKER_STACK_SIZE_BYTES: usize = 8 * 1024 * 1024;

/// Remaining stack below which `stacker` allocates a new segment.
pub const STACKER_RED_ZONE_BYTES: usize = STACKER_STACK_SIZE_BYTES / 8;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Returns true if `extension` (with or without a leading dot) is one of the
/// supported mesh formats. Comparison is case-insensitive.
///
/// # Example
///
/// ```rust
/// use config::constants::is_supported_mesh_extension;
///
/// assert!(is_supported_mesh_extension("STL"));
/// assert!(is_supported_mesh_extension(".vtp"));
/// assert!(!is_supported_mesh_extension("ply"));
/// ```
pub fn is_supported_mesh_extension(extension: &str) -> bool {
    let trimmed = extension.trim_start_matches('.');
    SUPPORTED_MESH_EXTENSIONS
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(trimmed))
}
