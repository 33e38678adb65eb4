//! # Tests for Config Constants
//!
//! Unit tests verifying the correctness of configuration constants
//! and helper functions.

use crate::constants::*;

// =============================================================================
// PRECISION TESTS
// =============================================================================

#[test]
fn test_degenerate_epsilon_is_tiny() {
    assert!(DEGENERATE_CROSS_EPSILON > 0.0);
    assert!(DEGENERATE_CROSS_EPSILON < RAY_PARALLEL_EPSILON);
}

// =============================================================================
// OBB FITTING TESTS
// =============================================================================

#[test]
fn test_rotation_schedule_terminates() {
    assert!(OBB_MIN_ROTATION_STEP > 0.0);
    assert!(OBB_MIN_ROTATION_STEP < OBB_INITIAL_ROTATION_STEP);
}

#[test]
fn test_padding_is_small() {
    assert!(OBB_MIN_PADDING > 0.0);
    assert!(OBB_RELATIVE_PADDING < 1e-3);
    assert!(OBB_VOLUME_PADDING >= OBB_MIN_PADDING);
}

// =============================================================================
// TREE AND RAY TESTS
// =============================================================================

#[test]
fn test_leaf_limit_matches_triangle_fan() {
    assert_eq!(LEAF_TRIANGLE_LIMIT, 3);
}

#[test]
fn test_parallel_epsilon() {
    assert_eq!(RAY_PARALLEL_EPSILON, 1e-8);
}

// =============================================================================
// MATERIAL TESTS
// =============================================================================

#[test]
fn test_thickness_defaults_ordered() {
    assert!(DEFAULT_MIN_THICKNESS > 0.0);
    assert!(DEFAULT_MIN_THICKNESS < DEFAULT_THICKNESS);
    assert!(DEFAULT_THICKNESS < DEFAULT_MAX_THICKNESS);
}

#[test]
fn test_poissons_ratio_in_physical_range() {
    assert!(DEFAULT_POISSONS_RATIO >= 0.0 && DEFAULT_POISSONS_RATIO <= 0.5);
}

#[test]
fn test_supported_extensions() {
    assert!(is_supported_mesh_extension("obj"));
    assert!(is_supported_mesh_extension(".Obj"));
    assert!(is_supported_mesh_extension("VTP"));
    assert!(!is_supported_mesh_extension("3mf"));
    assert!(!is_supported_mesh_extension(""));
}

// =============================================================================
// HELPER TESTS
// =============================================================================

#[test]
fn test_red_zone_smaller_than_stack() {
    assert!(STACKER_RED_ZONE_BYTES < STACKER_STACK_SIZE_BYTES);
}
