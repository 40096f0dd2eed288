//! Small dense linear algebra helpers for regression covariance.

use ndarray::{Array1, Array2};

/// Design matrix `[1, x]` of the market model.
pub fn design_matrix(x: &[f64]) -> Array2<f64> {
    let mut design = Array2::<f64>::ones((x.len(), 2));
    for (t, &value) in x.iter().enumerate() {
        design[[t, 1]] = value;
    }
    design
}

/// `(X'X)^-1` of the design `[1, x]`, built from the centred moments of `x`.
///
/// ```text
///            | 1/n + x̄²/Sxx   -x̄/Sxx |
/// (X'X)^-1 = |                        |
///            |   -x̄/Sxx        1/Sxx  |
/// ```
///
/// Returns `None` unless `n > 0` and `Sxx` is strictly positive and finite.
pub fn xtx_inverse(n: usize, mean_x: f64, sxx: f64) -> Option<Array2<f64>> {
    if n == 0 || !sxx.is_finite() || sxx <= 0.0 || !mean_x.is_finite() {
        return None;
    }
    let off = -mean_x / sxx;
    let inv = Array2::from_shape_vec(
        (2, 2),
        vec![1.0 / n as f64 + mean_x * mean_x / sxx, off, off, 1.0 / sxx],
    )
    .ok()?;
    inv.iter().all(|v| v.is_finite()).then_some(inv)
}

/// Diagonal of the hat matrix: `h_ii = x_i' (X'X)^-1 x_i`.
pub fn leverages(x: &Array2<f64>, xtx_inv: &Array2<f64>) -> Array1<f64> {
    let (n, k) = x.dim();
    let mut h = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut value = 0.0;
        for a in 0..k {
            for b in 0..k {
                value += x[[i, a]] * xtx_inv[[a, b]] * x[[i, b]];
            }
        }
        h[i] = value;
    }
    h
}

/// Sandwich estimator `(X'X)^-1 X' diag(w) X (X'X)^-1`.
pub fn sandwich(x: &Array2<f64>, xtx_inv: &Array2<f64>, weights: &Array1<f64>) -> Array2<f64> {
    let (n, k) = x.dim();

    let mut meat = Array2::<f64>::zeros((k, k));
    for t in 0..n {
        for a in 0..k {
            for b in 0..k {
                meat[[a, b]] += weights[t] * x[[t, a]] * x[[t, b]];
            }
        }
    }

    xtx_inv.dot(&meat).dot(xtx_inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// `(X'X)^-1` of `[1, x]` from centred moments.
    fn inverse_of(x: &[f64]) -> Array2<f64> {
        let mean = x.iter().sum::<f64>() / x.len() as f64;
        let sxx = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        xtx_inverse(x.len(), mean, sxx).unwrap()
    }

    #[test]
    fn test_xtx_inverse_hand_computed() {
        // x = [0, 1, 2]: X'X = [[3, 3], [3, 5]]
        let inv = inverse_of(&[0.0, 1.0, 2.0]);
        assert_relative_eq!(inv[[0, 0]], 5.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(inv[[0, 1]], -0.5, epsilon = 1e-12);
        assert_relative_eq!(inv[[1, 0]], -0.5, epsilon = 1e-12);
        assert_relative_eq!(inv[[1, 1]], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_xtx_inverse_tiny_scale() {
        // Returns of order 1e-7 still give an exact inverse
        let x: Vec<f64> = (0..60).map(|i| 1e-7 * ((i % 7) as f64 - 3.0)).collect();
        let design = design_matrix(&x);
        let identity = design.t().dot(&design).dot(&inverse_of(&x));
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(identity[[i, j]], expected, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_xtx_inverse_degenerate() {
        assert!(xtx_inverse(3, 0.01, 0.0).is_none());
        assert!(xtx_inverse(0, 0.0, 1.0).is_none());
        assert!(xtx_inverse(3, 0.0, f64::NAN).is_none());
    }

    #[test]
    fn test_leverages_sum_to_rank() {
        let raw = [0.1, 0.4, -0.2, 0.3];
        let x = design_matrix(&raw);
        let xtx_inv = inverse_of(&raw);
        let h = leverages(&x, &xtx_inv);
        assert_relative_eq!(h.sum(), 2.0, epsilon = 1e-12);
        assert!(h.iter().all(|&v| v > 0.0 && v < 1.0));
    }

    #[test]
    fn test_sandwich_with_unit_weights() {
        // With w = 1 the sandwich collapses to (X'X)^-1
        let x = design_matrix(&[0.0, 1.0, 2.0]);
        let xtx_inv = inverse_of(&[0.0, 1.0, 2.0]);
        let s = sandwich(&x, &xtx_inv, &Array1::ones(3));
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(s[[i, j]], xtx_inv[[i, j]], epsilon = 1e-12);
            }
        }
    }
}
