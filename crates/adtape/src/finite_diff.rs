//! Central finite differences and gradient checking.
//!
//! Used to validate analytic derivative rules: a primitive whose reverse-mode
//! gradient disagrees with [`finite_diff_gradient`] beyond the tolerance has a
//! wrong local derivative.

use faer::Mat;
use tracing::debug;

use crate::error::AdError;
use crate::functional::gradient;
use crate::rev::{NestedScope, Var};

/// Default step for central differences.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Value and central-difference gradient of `f` at `x`.
///
/// `df/dx_i ≈ (f(x + eps e_i) - f(x - eps e_i)) / (2 eps)`
pub fn finite_diff_gradient<F>(mut f: F, x: &[f64], eps: f64) -> (f64, Vec<f64>)
where
    F: FnMut(&[f64]) -> f64,
{
    let fx = f(x);
    let mut point = x.to_vec();
    let grad = (0..x.len())
        .map(|i| {
            point[i] = x[i] + eps;
            let plus = f(&point);
            point[i] = x[i] - eps;
            let minus = f(&point);
            point[i] = x[i];
            (plus - minus) / (2.0 * eps)
        })
        .collect();
    (fx, grad)
}

/// Central-difference Hessian of `f` at `x`.
pub fn finite_diff_hessian<F>(mut f: F, x: &[f64], eps: f64) -> Mat<f64>
where
    F: FnMut(&[f64]) -> f64,
{
    let n = x.len();
    let mut h = Mat::zeros(n, n);
    let mut point = x.to_vec();
    let mut eval = |point: &mut Vec<f64>, i: usize, si: f64, j: usize, sj: f64| {
        point[i] += si * eps;
        point[j] += sj * eps;
        let v = f(point.as_slice());
        point[i] = x[i];
        point[j] = x[j];
        v
    };
    for i in 0..n {
        for j in 0..=i {
            let value = (eval(&mut point, i, 1.0, j, 1.0) - eval(&mut point, i, 1.0, j, -1.0)
                - eval(&mut point, i, -1.0, j, 1.0)
                + eval(&mut point, i, -1.0, j, -1.0))
                / (4.0 * eps * eps);
            h[(i, j)] = value;
            h[(j, i)] = value;
        }
    }
    h
}

/// Compare the reverse-mode gradient of `f` at `x` with central differences.
///
/// Passes when `|analytic - numeric| <= tol * max(1, |numeric|)` for every
/// component. Function values for the finite differences are computed by
/// evaluating `f` inside nested scopes, so the tape is left as it was.
pub fn check_gradient<F>(f: F, x: &[f64], eps: f64, tol: f64) -> Result<(), AdError>
where
    F: Fn(&[Var]) -> Var,
{
    let (_, analytic) = gradient(&f, x);
    let (_, numeric) = finite_diff_gradient(
        |point| {
            let _scope = NestedScope::new();
            let vars: Vec<Var> = point.iter().map(|&v| Var::new(v)).collect();
            f(&vars).val()
        },
        x,
        eps,
    );

    for (index, (&a, &n)) in analytic.iter().zip(&numeric).enumerate() {
        let err = (a - n).abs();
        if !(err <= tol * n.abs().max(1.0)) {
            debug!(index, analytic = a, numeric = n, "gradient check failed");
            return Err(AdError::GradientMismatch {
                index,
                analytic: a,
                numeric: n,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_finite_diff_gradient_quadratic() {
        let (fx, g) = finite_diff_gradient(|x| x[0] * x[0] + 3.0 * x[1], &[2.0, -1.0], 1e-5);
        assert_eq!(fx, 1.0);
        assert_relative_eq!(g[0], 4.0, epsilon = 1e-6);
        assert_relative_eq!(g[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_finite_diff_hessian() {
        let h = finite_diff_hessian(|x| x[0] * x[0] * x[1], &[1.5, 2.0], 1e-4);
        assert_relative_eq!(h[(0, 0)], 4.0, epsilon = 1e-5);
        assert_relative_eq!(h[(0, 1)], 3.0, epsilon = 1e-5);
        assert_relative_eq!(h[(1, 0)], 3.0, epsilon = 1e-5);
        assert_relative_eq!(h[(1, 1)], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_check_gradient_passes() {
        let f = |x: &[Var]| (x[0] * x[1]).sin() + x[0].exp();
        assert!(check_gradient(f, &[0.3, 0.7], DEFAULT_EPSILON, 1e-6).is_ok());
    }

    #[test]
    fn test_check_gradient_catches_wrong_rule() {
        // Claims d/dx x^2 = x.
        let f = |x: &[Var]| {
            let v = x[0].val();
            crate::rev::precomputed_gradients(v * v, &[x[0]], &[v]).unwrap_or(x[0])
        };
        let err = check_gradient(f, &[3.0], DEFAULT_EPSILON, 1e-6).unwrap_err();
        assert!(matches!(err, AdError::GradientMismatch { index: 0, .. }));
    }
}
