//! Tunable parameters of the OBB tree index.
//!
//! Every public item documents its purpose and provides a minimal usage
//! example so that downstream crates can stay declarative.

use std::fmt;

use crate::constants::{
    LEAF_TRIANGLE_LIMIT, OBB_INITIAL_ROTATION_STEP, OBB_MIN_ROTATION_STEP, RAY_PARALLEL_EPSILON,
};

/// How the OBB rotation search picks its starting frame.
///
/// # Examples
/// ```
/// use config::index_config::AxisSeed;
/// assert_eq!(AxisSeed::default(), AxisSeed::CoordinateAxes);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisSeed {
    /// Start from the world coordinate axes.
    #[default]
    CoordinateAxes,
    /// Start from the eigenvectors of the point covariance matrix.
    PrincipalAxes,
}

/// Immutable snapshot of the index settings shared by the fitter, the tree
/// builder and the ray queries.
///
/// # Examples
/// ```
/// use config::index_config::IndexConfig;
/// let config = IndexConfig::default();
/// assert!(config.parallel_epsilon > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexConfig {
    /// First rotation step (radians) of the box fitting search.
    pub initial_rotation_step: f64,
    /// The search stops once the halved step is no longer above this value.
    pub min_rotation_step: f64,
    /// Nodes with at most this many triangles are not split.
    pub leaf_triangle_limit: usize,
    /// Ray/triangle parallel rejection threshold.
    pub parallel_epsilon: f64,
    /// Starting frame of the rotation search.
    pub axis_seed: AxisSeed,
}

impl IndexConfig {
    /// Builds a configuration enforcing strict validation of every field.
    ///
    /// # Examples
    /// ```
    /// use config::index_config::{AxisSeed, IndexConfig};
    /// let cfg = IndexConfig::new(0.2, 0.01, 8, 1.0e-8, AxisSeed::PrincipalAxes)
    ///     .expect("valid config");
    /// assert_eq!(cfg.leaf_triangle_limit, 8);
    /// ```
    pub fn new(
        initial_rotation_step: f64,
        min_rotation_step: f64,
        leaf_triangle_limit: usize,
        parallel_epsilon: f64,
        axis_seed: AxisSeed,
    ) -> Result<Self, ConfigError> {
        if !(initial_rotation_step > 0.0) {
            return Err(ConfigError::InvalidRotationStep(initial_rotation_step));
        }
        if !(min_rotation_step > 0.0) || min_rotation_step >= initial_rotation_step {
            return Err(ConfigError::InvalidStepBounds {
                initial: initial_rotation_step,
                minimum: min_rotation_step,
            });
        }
        if leaf_triangle_limit == 0 {
            return Err(ConfigError::InvalidLeafLimit(leaf_triangle_limit));
        }
        if !(parallel_epsilon > 0.0) {
            return Err(ConfigError::InvalidEpsilon(parallel_epsilon));
        }
        Ok(Self {
            initial_rotation_step,
            min_rotation_step,
            leaf_triangle_limit,
            parallel_epsilon,
            axis_seed,
        })
    }

    /// Returns a copy of this configuration with a different axis seed.
    ///
    /// # Examples
    /// ```
    /// use config::index_config::{AxisSeed, IndexConfig};
    /// let cfg = IndexConfig::default().with_axis_seed(AxisSeed::PrincipalAxes);
    /// assert_eq!(cfg.axis_seed, AxisSeed::PrincipalAxes);
    /// ```
    pub fn with_axis_seed(mut self, axis_seed: AxisSeed) -> Self {
        self.axis_seed = axis_seed;
        self
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            initial_rotation_step: OBB_INITIAL_ROTATION_STEP,
            min_rotation_step: OBB_MIN_ROTATION_STEP,
            leaf_triangle_limit: LEAF_TRIANGLE_LIMIT,
            parallel_epsilon: RAY_PARALLEL_EPSILON,
            axis_seed: AxisSeed::CoordinateAxes,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Raised when the initial rotation step is zero, negative or NaN.
    InvalidRotationStep(f64),
    /// Raised when the minimum step is not strictly between zero and the
    /// initial step.
    InvalidStepBounds {
        /// Requested initial step.
        initial: f64,
        /// Requested minimum step.
        minimum: f64,
    },
    /// Raised when the leaf limit is zero.
    InvalidLeafLimit(usize),
    /// Raised when the parallel epsilon is zero, negative or NaN.
    InvalidEpsilon(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidRotationStep(value) => {
                write!(f, "initial_rotation_step must be positive: {value}")
            }
            ConfigError::InvalidStepBounds { initial, minimum } => write!(
                f,
                "min_rotation_step must be in (0, {initial}): {minimum}"
            ),
            ConfigError::InvalidLeafLimit(value) => {
                write!(f, "leaf_triangle_limit must be >= 1: {value}")
            }
            ConfigError::InvalidEpsilon(value) => {
                write!(f, "parallel_epsilon must be positive: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
