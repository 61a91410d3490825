//! Singular value decomposition and pseudo-inverse
//!
//! One-sided (Hestenes) Jacobi SVD. Columns of a working copy of the
//! matrix are rotated pairwise until they are mutually orthogonal; their
//! norms are then the singular values. Accurate for the small, possibly
//! ill-conditioned matrices the Kalman filters invert.

use ndarray::{Array1, Array2};

const MAX_SWEEPS: usize = 60;
const RCOND: f64 = 1e-15;

/// Thin SVD `a = u · diag(s) · vᵀ`
#[derive(Debug, Clone)]
pub struct Svd {
    /// `m × n` left singular vectors (columns)
    pub u: Array2<f64>,
    /// Singular values, unsorted, non-negative
    pub s: Array1<f64>,
    /// `n × n` right singular vectors (columns)
    pub v: Array2<f64>,
}

impl Svd {
    /// Decompose an `m × n` matrix with `m >= n`
    ///
    /// # Panics
    /// Panics if the matrix has more columns than rows; transpose first.
    pub fn decompose(a: &Array2<f64>) -> Self {
        let (m, n) = a.dim();
        assert!(m >= n, "Svd::decompose expects rows >= cols");

        let mut u = a.clone();
        let mut v = Array2::<f64>::eye(n);

        for _ in 0..MAX_SWEEPS {
            let mut rotations = 0;
            for p in 0..n {
                for q in (p + 1)..n {
                    let mut alpha = 0.0;
                    let mut beta = 0.0;
                    let mut gamma = 0.0;
                    for k in 0..m {
                        alpha += u[[k, p]] * u[[k, p]];
                        beta += u[[k, q]] * u[[k, q]];
                        gamma += u[[k, p]] * u[[k, q]];
                    }
                    if gamma.abs() <= f64::EPSILON * (alpha * beta).sqrt() || gamma == 0.0 {
                        continue;
                    }
                    rotations += 1;

                    let zeta = (beta - alpha) / (2.0 * gamma);
                    let sign = if zeta >= 0.0 { 1.0 } else { -1.0 };
                    let t = sign / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                    let c = 1.0 / (1.0 + t * t).sqrt();
                    let s = c * t;

                    for k in 0..m {
                        let up = u[[k, p]];
                        let uq = u[[k, q]];
                        u[[k, p]] = c * up - s * uq;
                        u[[k, q]] = s * up + c * uq;
                    }
                    for k in 0..n {
                        let vp = v[[k, p]];
                        let vq = v[[k, q]];
                        v[[k, p]] = c * vp - s * vq;
                        v[[k, q]] = s * vp + c * vq;
                    }
                }
            }
            if rotations == 0 {
                break;
            }
        }

        let mut s = Array1::zeros(n);
        for j in 0..n {
            let norm = u.column(j).dot(&u.column(j)).sqrt();
            s[j] = norm;
            if norm > 0.0 {
                u.column_mut(j).mapv_inplace(|x| x / norm);
            }
        }

        Self { u, s, v }
    }
}

/// Moore-Penrose pseudo-inverse
///
/// Singular values below `1e-15 · max(m, n) · σ_max` are treated as zero, so a
/// singular matrix yields its least-squares inverse instead of failing.
pub fn pseudo_inverse(a: &Array2<f64>) -> Array2<f64> {
    let (m, n) = a.dim();
    if m < n {
        return pseudo_inverse(&a.t().to_owned()).t().to_owned();
    }
    if n == 0 {
        return Array2::zeros((n, m));
    }

    let svd = Svd::decompose(a);
    let s_max = svd.s.iter().fold(0.0_f64, |acc, &x| acc.max(x));
    let tol = RCOND * m.max(n) as f64 * s_max;

    // V · diag(1/s) · Uᵀ
    let mut v_scaled = svd.v.clone();
    for j in 0..n {
        let inv = if svd.s[j] > tol { 1.0 / svd.s[j] } else { 0.0 };
        v_scaled.column_mut(j).mapv_inplace(|x| x * inv);
    }
    v_scaled.dot(&svd.u.t())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_svd_reconstructs() {
        let a = array![[2.0, 0.5], [1.0, 3.0], [0.0, -1.0]];
        let svd = Svd::decompose(&a);
        let mut us = svd.u.clone();
        for j in 0..2 {
            let s = svd.s[j];
            us.column_mut(j).mapv_inplace(|x| x * s);
        }
        let back = us.dot(&svd.v.t());
        for (x, y) in back.iter().zip(a.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pseudo_inverse_of_invertible_matrix() {
        let a = array![[4.0, 7.0], [2.0, 6.0]];
        let inv = pseudo_inverse(&a);
        let id = a.dot(&inv);
        assert_abs_diff_eq!(id[[0, 0]], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(id[[0, 1]], 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(id[[1, 0]], 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(id[[1, 1]], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pseudo_inverse_of_singular_matrix() {
        // rank one: pinv = a / ||a||_F^2 for a = x yᵀ
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let inv = pseudo_inverse(&a);
        for (x, y) in inv.iter().zip(a.iter()) {
            assert_abs_diff_eq!(*x, y / 25.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pseudo_inverse_wide_matrix() {
        let a = array![[1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let inv = pseudo_inverse(&a);
        assert_eq!(inv.dim(), (3, 2));
        assert_abs_diff_eq!(inv[[1, 1]], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(inv[[2, 0]], 0.0, epsilon = 1e-12);
    }
}
