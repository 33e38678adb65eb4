//! # Oriented Bounding Box Tests
//!
//! Fitting tightness, containment, SAT overlap and slab ray tests.

use super::*;
use crate::primitives::{create_box, create_sphere};
use approx::assert_relative_eq;
use std::f64::consts::FRAC_PI_4;

fn unit_box() -> OrientedBoundingBox {
    OrientedBoundingBox::axis_aligned(DVec3::ZERO, DVec3::ONE)
}

fn rotated_about_z(angle: f64, center: DVec3, half: DVec3) -> OrientedBoundingBox {
    let rotation = DMat3::from_rotation_z(angle);
    OrientedBoundingBox::new(rotation, center - rotation * half, half * 2.0)
}

// =============================================================================
// FITTING
// =============================================================================

#[test]
fn test_fit_empty_points_fails() {
    let err = OrientedBoundingBox::fit(&[], &IndexConfig::default()).unwrap_err();
    assert!(matches!(err, ContactMeshError::EmptyInput { .. }));
}

#[test]
fn test_fit_unit_cube() {
    let cube = create_box(DVec3::ONE, true).unwrap();
    let obb = OrientedBoundingBox::fit(cube.vertices(), &IndexConfig::default()).unwrap();

    let size = obb.size();
    assert_relative_eq!(size.x, 1.0, epsilon = 1e-4);
    assert_relative_eq!(size.y, 1.0, epsilon = 1e-4);
    assert_relative_eq!(size.z, 1.0, epsilon = 1e-4);
    assert_relative_eq!(obb.center().length(), 0.0, epsilon = 1e-4);
}

#[test]
fn test_fit_contains_all_points() {
    let mut sphere = create_sphere(2.0, 12).unwrap();
    sphere.translate(DVec3::new(3.0, -1.0, 0.5));
    let obb = OrientedBoundingBox::fit(sphere.vertices(), &IndexConfig::default()).unwrap();
    for v in sphere.vertices() {
        assert!(obb.contains_point(*v), "{v:?} outside fitted box");
    }
}

#[test]
fn test_fit_single_point_has_padding() {
    let p = DVec3::new(1.0, 2.0, 3.0);
    let obb = OrientedBoundingBox::fit(&[p], &IndexConfig::default()).unwrap();
    assert!(obb.contains_point(p));
    assert!(obb.size().min_element() > 0.0);
    assert!(obb.size().max_element() < 1e-9);
}

#[test]
fn test_fit_axes_orthonormal() {
    let points = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(4.0, 1.0, 0.0),
        DVec3::new(1.0, 3.0, 0.5),
        DVec3::new(-2.0, 1.0, 2.0),
    ];
    let obb = OrientedBoundingBox::fit(&points, &IndexConfig::default()).unwrap();
    let r = obb.rotation();
    let product = r.transpose() * r;
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_relative_eq!(product.col(i)[j], expected, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_fit_rotated_slab_improves_on_aabb() {
    // A thin slab rotated 0.3 rad about z: the search should recover a box
    // much smaller than the axis-aligned one.
    let rotation = DMat3::from_rotation_z(0.3);
    let slab = create_box(DVec3::new(4.0, 1.0, 1.0), true).unwrap();
    let points: Vec<DVec3> = slab.vertices().iter().map(|v| rotation * *v).collect();

    let obb = OrientedBoundingBox::fit(&points, &IndexConfig::default()).unwrap();
    let (min, max) = points
        .iter()
        .fold((DVec3::splat(f64::MAX), DVec3::splat(f64::MIN)), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        });
    let aabb_volume = (max - min).x * (max - min).y * (max - min).z;

    assert!(obb.volume() < aabb_volume * 0.9);
    assert_relative_eq!(obb.volume(), 4.0, epsilon = 0.2);
}

#[test]
fn test_principal_seed_volume_not_worse_on_rotated_slab() {
    let rotation = DMat3::from_rotation_y(0.7) * DMat3::from_rotation_z(0.4);
    let slab = create_box(DVec3::new(6.0, 2.0, 0.5), true).unwrap();
    let points: Vec<DVec3> = slab.vertices().iter().map(|v| rotation * *v).collect();

    let coordinate = OrientedBoundingBox::fit(&points, &IndexConfig::default()).unwrap();
    let principal = OrientedBoundingBox::fit(
        &points,
        &IndexConfig::default().with_axis_seed(AxisSeed::PrincipalAxes),
    )
    .unwrap();

    for v in &points {
        assert!(principal.contains_point(*v));
    }
    assert!(principal.volume() <= coordinate.volume() * 1.05);
    assert_relative_eq!(principal.volume(), 6.0, epsilon = 0.3);
}

// =============================================================================
// POINT QUERIES
// =============================================================================

#[test]
fn test_contains_point_boundary() {
    let obb = unit_box();
    assert!(obb.contains_point(DVec3::splat(0.5)));
    assert!(obb.contains_point(DVec3::ZERO));
    assert!(obb.contains_point(DVec3::ONE));
    assert!(!obb.contains_point(DVec3::new(1.01, 0.5, 0.5)));
    assert!(!obb.contains_point(DVec3::new(0.5, -0.01, 0.5)));
}

#[test]
fn test_nearest_point_clamps() {
    let obb = unit_box();
    assert_eq!(obb.nearest_point(DVec3::new(2.0, 0.5, -3.0)), DVec3::new(1.0, 0.5, 0.0));
    assert_eq!(obb.nearest_point(DVec3::splat(0.25)), DVec3::splat(0.25));
}

#[test]
fn test_nearest_point_rotated_box() {
    let obb = rotated_about_z(FRAC_PI_4, DVec3::ZERO, DVec3::splat(0.5));
    let nearest = obb.nearest_point(DVec3::new(5.0, 0.0, 0.0));
    // Corner of a diamond cross-section points along +x.
    assert_relative_eq!(nearest.x, 0.5 * 2.0_f64.sqrt(), epsilon = 1e-12);
    assert_relative_eq!(nearest.y, 0.0, epsilon = 1e-12);
}

#[test]
fn test_corners_ordering() {
    let obb = OrientedBoundingBox::axis_aligned(DVec3::ZERO, DVec3::new(1.0, 2.0, 3.0));
    let corners = obb.corners();
    assert_eq!(corners[0], DVec3::ZERO);
    assert_eq!(corners[1], DVec3::new(1.0, 0.0, 0.0));
    assert_eq!(corners[2], DVec3::new(0.0, 2.0, 0.0));
    assert_eq!(corners[3], DVec3::new(1.0, 2.0, 0.0));
    assert_eq!(corners[4], DVec3::new(0.0, 0.0, 3.0));
    assert_eq!(corners[7], DVec3::new(1.0, 2.0, 3.0));
}

// =============================================================================
// BOX VS BOX
// =============================================================================

#[test]
fn test_intersects_box_overlapping() {
    let a = unit_box();
    let b = OrientedBoundingBox::axis_aligned(DVec3::splat(0.5), DVec3::splat(1.5));
    assert!(a.intersects_box(&b));
    assert!(b.intersects_box(&a));
}

#[test]
fn test_intersects_box_separated() {
    let a = unit_box();
    let b = OrientedBoundingBox::axis_aligned(DVec3::new(1.5, 0.0, 0.0), DVec3::new(2.5, 1.0, 1.0));
    assert!(!a.intersects_box(&b));
    assert!(!b.intersects_box(&a));
}

#[test]
fn test_intersects_box_contained() {
    let outer = OrientedBoundingBox::axis_aligned(DVec3::splat(-5.0), DVec3::splat(5.0));
    let inner = rotated_about_z(0.3, DVec3::ZERO, DVec3::splat(0.1));
    assert!(outer.intersects_box(&inner));
    assert!(inner.intersects_box(&outer));
}

#[test]
fn test_intersects_box_rotated_near_miss() {
    // Diamond centered at x = 1.6 reaches x = 1.6 - 0.707 = 0.893 < 1, so it
    // overlaps the unit box; moved to 1.8 it clears it.
    let a = unit_box();
    let half = DVec3::splat(0.5);
    let touching = rotated_about_z(FRAC_PI_4, DVec3::new(1.6, 0.5, 0.5), half);
    let clear = rotated_about_z(FRAC_PI_4, DVec3::new(1.8, 0.5, 0.5), half);
    assert!(a.intersects_box(&touching));
    assert!(!a.intersects_box(&clear));
}

#[test]
fn test_intersects_box_crossed_sticks() {
    // Two long sticks crossing at right angles, one tilted and lifted in z.
    let stick_x = OrientedBoundingBox::axis_aligned(
        DVec3::new(-5.0, -0.1, -0.1),
        DVec3::new(5.0, 0.1, 0.1),
    );
    let tilt = DMat3::from_rotation_x(FRAC_PI_4) * DMat3::from_rotation_z(std::f64::consts::FRAC_PI_2);
    let half = DVec3::new(5.0, 0.1, 0.1);
    let center = DVec3::new(0.0, 0.0, 0.5);
    let stick_y = OrientedBoundingBox::new(tilt, center - tilt * half, half * 2.0);
    assert!(!stick_x.intersects_box(&stick_y));

    let lowered = OrientedBoundingBox::new(tilt, DVec3::ZERO - tilt * half, half * 2.0);
    assert!(stick_x.intersects_box(&lowered));
}

// =============================================================================
// BOX VS RAY
// =============================================================================

#[test]
fn test_intersects_ray_entry_distance() {
    let obb = unit_box();
    let d = obb
        .intersects_ray(DVec3::new(0.5, 0.5, 5.0), DVec3::NEG_Z)
        .unwrap();
    assert_relative_eq!(d, 4.0, epsilon = 1e-12);
}

#[test]
fn test_intersects_ray_origin_inside() {
    let obb = unit_box();
    assert_eq!(obb.intersects_ray(DVec3::splat(0.5), DVec3::X), Some(0.0));
}

#[test]
fn test_intersects_ray_behind_origin() {
    let obb = unit_box();
    assert_eq!(obb.intersects_ray(DVec3::new(0.5, 0.5, 5.0), DVec3::Z), None);
}

#[test]
fn test_intersects_ray_axis_parallel_outside_slab() {
    let obb = unit_box();
    // Direction has zero x and y components; x lies outside [0, 1].
    assert_eq!(obb.intersects_ray(DVec3::new(2.0, 0.5, 5.0), DVec3::NEG_Z), None);
    // Same ray inside the slab hits.
    assert!(obb.intersects_ray(DVec3::new(1.0, 0.5, 5.0), DVec3::NEG_Z).is_some());
}

#[test]
fn test_intersects_ray_diagonal_miss() {
    let obb = unit_box();
    let dir = DVec3::new(1.0, 1.0, 0.0).normalize();
    assert_eq!(obb.intersects_ray(DVec3::new(-3.0, 0.0, 0.5), dir * -1.0), None);
    assert!(obb.intersects_ray(DVec3::new(-0.5, -0.5, 0.5), dir).is_some());
}
