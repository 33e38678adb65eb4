//! # Symmetric 3x3 Eigen Decomposition
//!
//! Householder reduction to tridiagonal form followed by the implicit QL
//! algorithm. Used by the OBB fitter to seed its rotation search with the
//! principal axes of a point cloud.

use glam::{DMat3, DVec3};

/// Upper bound on QL sweeps per eigenvalue. Convergence is normally reached
/// in two or three.
const MAX_QL_ITERATIONS: usize = 64;

/// Eigenvalues and eigenvectors of a symmetric 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetricEigen {
    /// Eigenvalues in ascending order.
    pub values: DVec3,
    /// Unit eigenvectors stored as columns, matching `values`.
    pub vectors: DMat3,
}

impl SymmetricEigen {
    /// Decomposes `matrix`, which is assumed symmetric (only consistent
    /// input gives meaningful output; the strictly lower triangle is read).
    ///
    /// # Example
    ///
    /// ```rust
    /// use contact_mesh::eigen::SymmetricEigen;
    /// use glam::{DMat3, DVec3};
    ///
    /// let m = DMat3::from_diagonal(DVec3::new(3.0, 1.0, 2.0));
    /// let eigen = SymmetricEigen::new(m);
    /// assert_eq!(eigen.values, DVec3::new(1.0, 2.0, 3.0));
    /// ```
    pub fn new(matrix: DMat3) -> Self {
        // Row-major working copy: a[row][col].
        let mut v = [[0.0_f64; 3]; 3];
        for (row, out) in v.iter_mut().enumerate() {
            for (col, value) in out.iter_mut().enumerate() {
                *value = matrix.col(col)[row];
            }
        }
        let mut d = [0.0_f64; 3];
        let mut e = [0.0_f64; 3];

        tridiagonalize(&mut v, &mut d, &mut e);
        diagonalize(&mut v, &mut d, &mut e);

        Self {
            values: DVec3::from_array(d),
            vectors: DMat3::from_cols(
                DVec3::new(v[0][0], v[1][0], v[2][0]),
                DVec3::new(v[0][1], v[1][1], v[2][1]),
                DVec3::new(v[0][2], v[1][2], v[2][2]),
            ),
        }
    }

    /// Eigenvector for the `index`-th smallest eigenvalue.
    #[inline]
    pub fn vector(&self, index: usize) -> DVec3 {
        self.vectors.col(index)
    }
}

/// Householder tridiagonalization. On return `v` holds the accumulated
/// orthogonal transform, `d` the diagonal and `e` the sub-diagonal (with
/// `e[0] == 0`).
fn tridiagonalize(v: &mut [[f64; 3]; 3], d: &mut [f64; 3], e: &mut [f64; 3]) {
    const N: usize = 3;

    for j in 0..N {
        d[j] = v[N - 1][j];
    }

    for i in (1..N).rev() {
        let mut scale = 0.0;
        let mut h = 0.0;
        for dk in d.iter().take(i) {
            scale += dk.abs();
        }

        if scale == 0.0 {
            e[i] = d[i - 1];
            for j in 0..i {
                d[j] = v[i - 1][j];
                v[i][j] = 0.0;
                v[j][i] = 0.0;
            }
        } else {
            for dk in d.iter_mut().take(i) {
                *dk /= scale;
                h += *dk * *dk;
            }
            let mut f = d[i - 1];
            let mut g = h.sqrt();
            if f > 0.0 {
                g = -g;
            }
            e[i] = scale * g;
            h -= f * g;
            d[i - 1] = f - g;
            for ej in e.iter_mut().take(i) {
                *ej = 0.0;
            }

            for j in 0..i {
                f = d[j];
                v[j][i] = f;
                g = e[j] + v[j][j] * f;
                for k in (j + 1)..i {
                    g += v[k][j] * d[k];
                    e[k] += v[k][j] * f;
                }
                e[j] = g;
            }

            f = 0.0;
            for j in 0..i {
                e[j] /= h;
                f += e[j] * d[j];
            }
            let hh = f / (h + h);
            for j in 0..i {
                e[j] -= hh * d[j];
            }
            for j in 0..i {
                f = d[j];
                g = e[j];
                for k in j..i {
                    v[k][j] -= f * e[k] + g * d[k];
                }
                d[j] = v[i - 1][j];
                v[i][j] = 0.0;
            }
        }
        d[i] = h;
    }

    // Accumulate transformations.
    for i in 0..(N - 1) {
        v[N - 1][i] = v[i][i];
        v[i][i] = 1.0;
        let h = d[i + 1];
        if h != 0.0 {
            for k in 0..=i {
                d[k] = v[k][i + 1] / h;
            }
            for j in 0..=i {
                let mut g = 0.0;
                for k in 0..=i {
                    g += v[k][i + 1] * v[k][j];
                }
                for k in 0..=i {
                    v[k][j] -= g * d[k];
                }
            }
        }
        for row in v.iter_mut().take(i + 1) {
            row[i + 1] = 0.0;
        }
    }
    for j in 0..N {
        d[j] = v[N - 1][j];
        v[N - 1][j] = 0.0;
    }
    v[N - 1][N - 1] = 1.0;
    e[0] = 0.0;
}

/// Implicit QL iteration on the tridiagonal form, then an ascending sort of
/// eigenvalues with their vectors.
fn diagonalize(v: &mut [[f64; 3]; 3], d: &mut [f64; 3], e: &mut [f64; 3]) {
    const N: usize = 3;

    for i in 1..N {
        e[i - 1] = e[i];
    }
    e[N - 1] = 0.0;

    let mut f = 0.0;
    let mut tst1 = 0.0_f64;
    let eps = f64::EPSILON;

    for l in 0..N {
        // Find small sub-diagonal element.
        tst1 = tst1.max(d[l].abs() + e[l].abs());
        let mut m = l;
        while m < N - 1 {
            if e[m].abs() <= eps * tst1 {
                break;
            }
            m += 1;
        }

        if m > l {
            let mut iterations = 0;
            loop {
                iterations += 1;

                // Compute implicit shift.
                let mut g = d[l];
                let mut p = (d[l + 1] - g) / (2.0 * e[l]);
                let mut r = p.hypot(1.0);
                if p < 0.0 {
                    r = -r;
                }
                d[l] = e[l] / (p + r);
                d[l + 1] = e[l] * (p + r);
                let dl1 = d[l + 1];
                let mut h = g - d[l];
                for di in d.iter_mut().skip(l + 2) {
                    *di -= h;
                }
                f += h;

                // Implicit QL transformation.
                p = d[m];
                let mut c = 1.0;
                let mut c2 = c;
                let mut c3 = c;
                let el1 = e[l + 1];
                let mut s = 0.0;
                let mut s2 = 0.0;
                for i in (l..m).rev() {
                    c3 = c2;
                    c2 = c;
                    s2 = s;
                    g = c * e[i];
                    h = c * p;
                    r = p.hypot(e[i]);
                    e[i + 1] = s * r;
                    s = e[i] / r;
                    c = p / r;
                    p = c * d[i] - s * g;
                    d[i + 1] = h + s * (c * g + s * d[i]);

                    for row in v.iter_mut() {
                        h = row[i + 1];
                        row[i + 1] = s * row[i] + c * h;
                        row[i] = c * row[i] - s * h;
                    }
                }
                p = -s * s2 * c3 * el1 * e[l] / dl1;
                e[l] = s * p;
                d[l] = c * p;

                if !(e[l].abs() > eps * tst1) || iterations >= MAX_QL_ITERATIONS {
                    break;
                }
            }
        }
        d[l] += f;
        e[l] = 0.0;
    }

    // Selection sort, ascending.
    for i in 0..(N - 1) {
        let mut k = i;
        let mut p = d[i];
        for (j, &dj) in d.iter().enumerate().skip(i + 1) {
            if dj < p {
                k = j;
                p = dj;
            }
        }
        if k != i {
            d[k] = d[i];
            d[i] = p;
            for row in v.iter_mut() {
                row.swap(i, k);
            }
        }
    }
}
