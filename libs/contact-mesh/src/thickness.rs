//! # Variable Thickness
//!
//! Per-triangle layer thickness measured by casting a ray from each front
//! face centroid along its inward normal against a back surface.
//!
//! Casts are independent read-only queries and run on the rayon pool.

use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ContactMeshError, ContactMeshResult};
use crate::mesh::Mesh;
use crate::obb_tree::ObbTree;
use crate::ray::RayTraversal;

/// What a measured depth above the maximum resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Depths above the maximum fall back to the minimum thickness, as in
    /// the established contact model.
    #[default]
    LegacyMinimum,
    /// Depths above the maximum are clamped to the maximum.
    Saturate,
}

/// Validated `[min, max]` thickness range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThicknessBounds {
    min: f64,
    max: f64,
}

impl ThicknessBounds {
    /// Creates bounds with `0 < min <= max`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use contact_mesh::thickness::ThicknessBounds;
    ///
    /// assert!(ThicknessBounds::new(0.001, 0.01).is_ok());
    /// assert!(ThicknessBounds::new(0.01, 0.001).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> ContactMeshResult<Self> {
        if !(min > 0.0) || !max.is_finite() || min > max {
            return Err(ContactMeshError::invalid_property(format!(
                "thickness bounds must satisfy 0 < min <= max, got min {min} max {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Maps a measured depth (or a miss) to a thickness.
    pub fn resolve(&self, depth: Option<f64>, policy: OverflowPolicy) -> f64 {
        match depth {
            None => self.min,
            Some(d) if d < self.min => self.min,
            Some(d) if d > self.max => match policy {
                OverflowPolicy::LegacyMinimum => self.min,
                OverflowPolicy::Saturate => self.max,
            },
            Some(d) => d,
        }
    }
}

/// Estimates one thickness per front triangle.
///
/// Each front face casts from `centers[i]` along `-normals[i]` into
/// `back_tree`; the hit distance is resolved through `bounds` and `policy`.
///
/// # Errors
///
/// [`ContactMeshError::InvalidProperty`] when `centers` and `normals`
/// differ in length.
pub fn estimate_thickness(
    centers: &[DVec3],
    normals: &[DVec3],
    back_mesh: &Mesh,
    back_tree: &ObbTree,
    bounds: ThicknessBounds,
    policy: OverflowPolicy,
    traversal: RayTraversal,
) -> ContactMeshResult<Vec<f64>> {
    if centers.len() != normals.len() {
        return Err(ContactMeshError::invalid_property(format!(
            "{} centers but {} normals",
            centers.len(),
            normals.len()
        )));
    }

    let depths: Vec<Option<f64>> = centers
        .par_iter()
        .zip(normals.par_iter())
        .map(|(center, normal)| {
            back_tree
                .cast(back_mesh, *center, -*normal, traversal)
                .map(|hit| hit.distance)
        })
        .collect();

    let missed = depths.iter().filter(|d| d.is_none()).count();
    let overflowed = depths
        .iter()
        .filter(|d| d.is_some_and(|d| d > bounds.max))
        .count();
    if missed > 0 {
        warn!(
            missed,
            triangles = depths.len(),
            "thickness rays missed the back surface; using minimum thickness"
        );
    }
    debug!(
        triangles = depths.len(),
        overflowed,
        ?policy,
        "estimated variable thickness"
    );

    Ok(depths
        .into_iter()
        .map(|depth| bounds.resolve(depth, policy))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TriangleGeometry;
    use crate::primitives::create_plate;
    use approx::assert_relative_eq;
    use config::index_config::IndexConfig;

    fn back_plate(height: f64) -> (Mesh, ObbTree) {
        let back = create_plate(3.0, 3.0, 3, height, true).unwrap();
        let tree = ObbTree::build(&back, &IndexConfig::default()).unwrap();
        (back, tree)
    }

    #[test]
    fn test_bounds_validation() {
        assert!(ThicknessBounds::new(0.0, 1.0).is_err());
        assert!(ThicknessBounds::new(-1.0, 1.0).is_err());
        assert!(ThicknessBounds::new(2.0, 1.0).is_err());
        assert!(ThicknessBounds::new(f64::NAN, 1.0).is_err());
        assert!(ThicknessBounds::new(1.0, 1.0).is_ok());
    }

    #[test]
    fn test_resolve_rules() {
        let bounds = ThicknessBounds::new(0.001, 0.01).unwrap();
        assert_eq!(bounds.resolve(None, OverflowPolicy::Saturate), 0.001);
        assert_eq!(bounds.resolve(Some(-0.3), OverflowPolicy::Saturate), 0.001);
        assert_eq!(bounds.resolve(Some(0.005), OverflowPolicy::LegacyMinimum), 0.005);
        assert_eq!(bounds.resolve(Some(0.5), OverflowPolicy::LegacyMinimum), 0.001);
        assert_eq!(bounds.resolve(Some(0.5), OverflowPolicy::Saturate), 0.01);
    }

    #[test]
    fn test_in_range_depth_is_kept() {
        let front = create_plate(2.0, 2.0, 2, 0.0, true).unwrap();
        let geometry = TriangleGeometry::compute(&front).unwrap();
        let (back, tree) = back_plate(-0.004);
        let bounds = ThicknessBounds::new(0.001, 0.01).unwrap();

        let thickness = estimate_thickness(
            &geometry.centers,
            &geometry.normals,
            &back,
            &tree,
            bounds,
            OverflowPolicy::LegacyMinimum,
            RayTraversal::Heuristic,
        )
        .unwrap();
        assert_eq!(thickness.len(), front.triangle_count());
        for t in thickness {
            assert_relative_eq!(t, 0.004, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_wide_gap_legacy_and_saturate() {
        let front = create_plate(2.0, 2.0, 2, 0.0, true).unwrap();
        let geometry = TriangleGeometry::compute(&front).unwrap();
        let (back, tree) = back_plate(-0.5);
        let bounds = ThicknessBounds::new(0.001, 0.01).unwrap();

        let legacy = estimate_thickness(
            &geometry.centers,
            &geometry.normals,
            &back,
            &tree,
            bounds,
            OverflowPolicy::LegacyMinimum,
            RayTraversal::Exact,
        )
        .unwrap();
        assert!(legacy.iter().all(|&t| t == 0.001));

        let saturated = estimate_thickness(
            &geometry.centers,
            &geometry.normals,
            &back,
            &tree,
            bounds,
            OverflowPolicy::Saturate,
            RayTraversal::Exact,
        )
        .unwrap();
        assert!(saturated.iter().all(|&t| t == 0.01));
    }

    #[test]
    fn test_miss_uses_minimum() {
        let front = create_plate(1.0, 1.0, 1, 0.0, true).unwrap();
        let geometry = TriangleGeometry::compute(&front).unwrap();
        let (mut back, _) = back_plate(-0.005);
        back.translate(DVec3::new(50.0, 0.0, 0.0));
        let tree = ObbTree::build(&back, &IndexConfig::default()).unwrap();
        let bounds = ThicknessBounds::new(0.001, 0.01).unwrap();

        let thickness = estimate_thickness(
            &geometry.centers,
            &geometry.normals,
            &back,
            &tree,
            bounds,
            OverflowPolicy::Saturate,
            RayTraversal::Heuristic,
        )
        .unwrap();
        assert_eq!(thickness, vec![0.001, 0.001]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let (back, tree) = back_plate(-0.5);
        let bounds = ThicknessBounds::new(0.001, 0.01).unwrap();
        let err = estimate_thickness(
            &[DVec3::ZERO],
            &[],
            &back,
            &tree,
            bounds,
            OverflowPolicy::LegacyMinimum,
            RayTraversal::Heuristic,
        )
        .unwrap_err();
        assert!(matches!(err, ContactMeshError::InvalidProperty { .. }));
    }
}
