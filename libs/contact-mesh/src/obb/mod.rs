//! # Oriented Bounding Box
//!
//! Minimum-volume box fitting and the box queries used by the OBB tree.
//!
//! ## Representation
//!
//! A box is a rotation (orthonormal columns are the box axes), an origin at
//! the minimum corner, and a non-negative size. A point `p` has local
//! coordinates `R^T (p - origin)`; it is inside when every local coordinate
//! lies in `[0, size]`.
//!
//! ## Fitting
//!
//! 1. Seed the frame with the coordinate axes or the principal axes of the
//!    point covariance.
//! 2. Hill-climb over the six elementary rotations of the current step,
//!    accepting any trial with strictly smaller volume; halve the step once
//!    nothing improves.
//! 3. Measure the extents along the final axes and pad them slightly.

#[cfg(test)]
mod tests;

use config::constants::{OBB_MIN_PADDING, OBB_RELATIVE_PADDING, OBB_VOLUME_PADDING};
use config::index_config::{AxisSeed, IndexConfig};
use glam::{DMat3, DVec3};

use crate::eigen::SymmetricEigen;
use crate::error::{ContactMeshError, ContactMeshResult};

/// An oriented box: rotation, minimum corner and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBoundingBox {
    rotation: DMat3,
    origin: DVec3,
    size: DVec3,
}

impl OrientedBoundingBox {
    /// Creates a box from its parts. `rotation` must be orthonormal.
    pub fn new(rotation: DMat3, origin: DVec3, size: DVec3) -> Self {
        Self {
            rotation,
            origin,
            size,
        }
    }

    /// Axis-aligned box spanning `min..max`.
    pub fn axis_aligned(min: DVec3, max: DVec3) -> Self {
        Self::new(DMat3::IDENTITY, min, (max - min).max(DVec3::ZERO))
    }

    /// Fits a tight box around `points`.
    ///
    /// # Errors
    ///
    /// [`ContactMeshError::EmptyInput`] when `points` is empty.
    ///
    /// # Example
    ///
    /// ```rust
    /// use config::index_config::IndexConfig;
    /// use contact_mesh::obb::OrientedBoundingBox;
    /// use glam::DVec3;
    ///
    /// let points = [DVec3::ZERO, DVec3::new(2.0, 1.0, 0.5)];
    /// let obb = OrientedBoundingBox::fit(&points, &IndexConfig::default()).unwrap();
    /// assert!(points.iter().all(|p| obb.contains_point(*p)));
    /// ```
    pub fn fit(points: &[DVec3], config: &IndexConfig) -> ContactMeshResult<Self> {
        if points.is_empty() {
            return Err(ContactMeshError::empty("cannot fit a box to zero points"));
        }

        let mut rotation = match config.axis_seed {
            AxisSeed::CoordinateAxes => DMat3::IDENTITY,
            AxisSeed::PrincipalAxes => principal_frame(points),
        };

        let mut volume = frame_volume(points, &rotation);
        let mut step = config.initial_rotation_step;
        while step > config.min_rotation_step {
            let trials = [
                DMat3::from_rotation_x(step),
                DMat3::from_rotation_x(-step),
                DMat3::from_rotation_y(step),
                DMat3::from_rotation_y(-step),
                DMat3::from_rotation_z(step),
                DMat3::from_rotation_z(-step),
            ];
            let mut improved = true;
            while improved {
                improved = false;
                for elementary in &trials {
                    let trial = *elementary * rotation;
                    let trial_volume = frame_volume(points, &trial);
                    if trial_volume < volume {
                        rotation = trial;
                        volume = trial_volume;
                        improved = true;
                    }
                }
            }
            step /= 2.0;
        }

        let (min, max) = local_extents(points, &rotation);
        let size = max - min;
        let tol = (size * OBB_RELATIVE_PADDING).max(DVec3::splat(OBB_MIN_PADDING));

        Ok(Self {
            rotation,
            origin: rotation * (min - tol),
            size: size + 2.0 * tol,
        })
    }

    /// Rotation whose columns are the box axes.
    #[inline]
    pub fn rotation(&self) -> DMat3 {
        self.rotation
    }

    /// Minimum corner in world coordinates.
    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Side lengths along the box axes.
    #[inline]
    pub fn size(&self) -> DVec3 {
        self.size
    }

    /// Unit direction of box axis `index` (0, 1 or 2).
    #[inline]
    pub fn axis(&self, index: usize) -> DVec3 {
        self.rotation.col(index)
    }

    /// Geometric center.
    pub fn center(&self) -> DVec3 {
        self.origin + self.rotation * (self.size / 2.0)
    }

    /// Box volume.
    pub fn volume(&self) -> f64 {
        self.size.x * self.size.y * self.size.z
    }

    /// Transforms a world point into box coordinates.
    #[inline]
    pub fn to_local(&self, point: DVec3) -> DVec3 {
        self.rotation.transpose() * (point - self.origin)
    }

    /// Transforms box coordinates back into the world frame.
    #[inline]
    pub fn to_world(&self, local: DVec3) -> DVec3 {
        self.origin + self.rotation * local
    }

    /// True if `point` is inside or on the boundary.
    pub fn contains_point(&self, point: DVec3) -> bool {
        let p = self.to_local(point);
        (0..3).all(|i| p[i] >= 0.0 && p[i] <= self.size[i])
    }

    /// Separating-axis overlap test against another box.
    ///
    /// Tests this box's three axes, the other box's three axes, then the
    /// nine pairwise cross products (Gottschalk, Lin and Manocha, 1996).
    /// When the other box's center falls inside the slabs of either box the
    /// remaining axes are skipped.
    pub fn intersects_box(&self, other: &OrientedBoundingBox) -> bool {
        // Other box expressed in this box's frame.
        let rt = self.rotation.transpose();
        let r = rows(&(rt * other.rotation));
        let mut rabs = [[0.0_f64; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                rabs[i][j] = r[i][j].abs();
            }
        }
        let a = self.size / 2.0;
        let b = other.size / 2.0;
        let translation = rt * (other.origin - self.origin);
        let other_center = rt * other.rotation * b + translation;
        let d = other_center - a;

        // This box's axes.
        let mut accept = true;
        for i in 0..3 {
            let ra = a[i];
            let rb = rabs[i][0] * b.x + rabs[i][1] * b.y + rabs[i][2] * b.z;
            let distance = d[i].abs();
            if distance > ra + rb {
                return false;
            }
            if distance > ra {
                accept = false;
            }
        }
        if accept {
            return true;
        }

        // Other box's axes.
        accept = true;
        for j in 0..3 {
            let ra = a.x * rabs[0][j] + a.y * rabs[1][j] + a.z * rabs[2][j];
            let rb = b[j];
            let distance = (d.x * r[0][j] + d.y * r[1][j] + d.z * r[2][j]).abs();
            if distance > ra + rb {
                return false;
            }
            if distance > rb {
                accept = false;
            }
        }
        if accept {
            return true;
        }

        // Cross products A_i x B_j.
        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3 {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let ra = a[i1] * rabs[i2][j] + a[i2] * rabs[i1][j];
                let rb = b[j1] * rabs[i][j2] + b[j2] * rabs[i][j1];
                let distance = (d[i2] * r[i1][j] - d[i1] * r[i2][j]).abs();
                if distance > ra + rb {
                    return false;
                }
            }
        }
        true
    }

    /// Slab test against the half-ray `origin + t * direction`, `t >= 0`.
    ///
    /// Returns the entry distance clamped to zero (zero when the origin is
    /// inside), or `None` when the ray misses or the box lies entirely
    /// behind the origin. Distances are in units of `direction`'s length.
    pub fn intersects_ray(&self, origin: DVec3, direction: DVec3) -> Option<f64> {
        let rt = self.rotation.transpose();
        let orig = rt * (origin - self.origin);
        let dir = rt * direction;

        let mut min_dist = f64::NEG_INFINITY;
        let mut max_dist = f64::INFINITY;
        for i in 0..3 {
            if dir[i] == 0.0 {
                if orig[i] < 0.0 || orig[i] > self.size[i] {
                    return None;
                }
                continue;
            }
            let d1 = -orig[i] / dir[i];
            let d2 = (self.size[i] - orig[i]) / dir[i];
            let (near, far) = if d1 < d2 { (d1, d2) } else { (d2, d1) };
            min_dist = min_dist.max(near);
            max_dist = max_dist.min(far);
            if min_dist > max_dist || max_dist < 0.0 {
                return None;
            }
        }
        Some(min_dist.max(0.0))
    }

    /// Closest point of the box (surface or interior) to `point`.
    pub fn nearest_point(&self, point: DVec3) -> DVec3 {
        let local = self.to_local(point).clamp(DVec3::ZERO, self.size);
        self.to_world(local)
    }

    /// The eight corners. Corner `k` adds the x, y and z extents according
    /// to bits 0, 1 and 2 of `k`; corner 0 is the origin.
    pub fn corners(&self) -> [DVec3; 8] {
        let dx = self.axis(0) * self.size.x;
        let dy = self.axis(1) * self.size.y;
        let dz = self.axis(2) * self.size.z;
        std::array::from_fn(|k| {
            let mut corner = self.origin;
            if k & 1 != 0 {
                corner += dx;
            }
            if k & 2 != 0 {
                corner += dy;
            }
            if k & 4 != 0 {
                corner += dz;
            }
            corner
        })
    }
}

// =============================================================================
// FITTING HELPERS
// =============================================================================

/// Row-major copy of a matrix: `m[row][col]`.
fn rows(m: &DMat3) -> [[f64; 3]; 3] {
    let t = m.transpose();
    [t.x_axis.to_array(), t.y_axis.to_array(), t.z_axis.to_array()]
}

/// Per-axis min/max of `R^T p`.
fn local_extents(points: &[DVec3], rotation: &DMat3) -> (DVec3, DVec3) {
    let rt = rotation.transpose();
    points.iter().fold(
        (DVec3::splat(f64::MAX), DVec3::splat(f64::MIN)),
        |(min, max), p| {
            let local = rt * *p;
            (min.min(local), max.max(local))
        },
    )
}

/// Volume of the box aligned with `rotation` that holds `points`. A tiny
/// pad keeps flat point sets from collapsing to zero volume.
fn frame_volume(points: &[DVec3], rotation: &DMat3) -> f64 {
    let (min, max) = local_extents(points, rotation);
    let size = max - min + DVec3::splat(OBB_VOLUME_PADDING);
    size.x * size.y * size.z
}

/// Covariance eigenvectors ordered by descending eigenvalue, made
/// orthonormal and right-handed.
fn principal_frame(points: &[DVec3]) -> DMat3 {
    let n = points.len() as f64;
    let mean = points.iter().copied().sum::<DVec3>() / n;

    let mut covariance = DMat3::ZERO;
    for p in points {
        let d = *p - mean;
        covariance += DMat3::from_cols(d * d.x, d * d.y, d * d.z);
    }
    let covariance = covariance * (1.0 / n);

    let eigen = SymmetricEigen::new(covariance);
    let first = eigen.vector(2).try_normalize().unwrap_or(DVec3::X);
    let mut second = eigen.vector(1) - first * first.dot(eigen.vector(1));
    if second.length_squared() < 1e-24 {
        second = first.any_orthonormal_vector();
    }
    let second = second.normalize();
    DMat3::from_cols(first, second, first.cross(second))
}
