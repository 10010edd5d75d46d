//! Second-order drivers.
//!
//! Forward-over-reverse: each input is seeded with a forward tangent whose
//! components are themselves tape variables. One reverse sweep of the output
//! tangent then yields a full Hessian row.
//!
//! ```text
//! x_k = Fvar { val: Var(x_k), d: Var(k == i) }
//! f(x).d            = df/dx_i                    (forward)
//! grad(f(x).d)[j]   = d^2 f / dx_i dx_j          (reverse)
//! ```
//!
//! Forward-over-forward drivers need no tape and work on `Fvar<Fvar<f64>>`.

use faer::{Mat, MatRef};
use smallvec::SmallVec;

use super::derivative::gradient_dot_vector;
use crate::check::check_size_match;
use crate::error::AdError;
use crate::fwd::Fvar;
use crate::rev::{NestedScope, Var, sum};

/// Value, gradient and Hessian of `f` at `x`, by forward-over-reverse.
///
/// Makes one forward pass and one reverse sweep per input, each in its own
/// nested scope.
///
/// # Example
///
/// ```ignore
/// use adtape::functional::hessian;
///
/// // f(x, y) = x^2 y
/// let (fx, g, h) = hessian(|x| x[0] * x[0] * x[1], &[3.0, 2.0]);
/// assert_eq!(fx, 18.0);
/// assert_eq!(g, vec![12.0, 9.0]);
/// assert_eq!(h[(0, 1)], 6.0);
/// ```
pub fn hessian<F>(f: F, x: &[f64]) -> (f64, Vec<f64>, Mat<f64>)
where
    F: Fn(&[Fvar<Var>]) -> Fvar<Var>,
{
    let n = x.len();
    let mut h = Mat::zeros(n, n);
    let mut grad = vec![0.0; n];

    if n == 0 {
        let _scope = NestedScope::new();
        let fx = f(&[]).val.val();
        return (fx, grad, h);
    }

    let mut fx = 0.0;
    for i in 0..n {
        let _scope = NestedScope::new();
        let seeded: Vec<Fvar<Var>> = x
            .iter()
            .enumerate()
            .map(|(k, &xk)| Fvar::new(Var::new(xk), Var::new(if k == i { 1.0 } else { 0.0 })))
            .collect();
        let out = f(&seeded);
        fx = out.val.val();
        grad[i] = out.d.val();

        let values: Vec<Var> = seeded.iter().map(|s| s.val).collect();
        for (j, hij) in out.d.grad(&values).into_iter().enumerate() {
            h[(i, j)] = hij;
        }
    }
    (fx, grad, h)
}

/// Value, gradient and Hessian of `f` at `x`, by forward-over-forward.
///
/// Makes one pass per pair `j >= i`; no tape is involved.
pub fn fwd_hessian<F>(f: F, x: &[f64]) -> (f64, Vec<f64>, Mat<f64>)
where
    F: Fn(&[Fvar<Fvar<f64>>]) -> Fvar<Fvar<f64>>,
{
    let n = x.len();
    let mut h = Mat::zeros(n, n);
    let mut grad = vec![0.0; n];

    if n == 0 {
        return (f(&[]).val.val, grad, h);
    }

    let mut fx = 0.0;
    for i in 0..n {
        for j in i..n {
            let seeded: Vec<Fvar<Fvar<f64>>> = x
                .iter()
                .enumerate()
                .map(|(k, &xk)| {
                    Fvar::new(
                        Fvar::new(xk, if k == i { 1.0 } else { 0.0 }),
                        Fvar::new(if k == j { 1.0 } else { 0.0 }, 0.0),
                    )
                })
                .collect();
            let out = f(&seeded);
            fx = out.val.val;
            grad[i] = out.val.d;
            h[(i, j)] = out.d.d;
            h[(j, i)] = out.d.d;
        }
    }
    (fx, grad, h)
}

/// Value of `f` at `x` and the Hessian-vector product `H v`, by
/// forward-over-reverse.
///
/// Costs one forward pass and one reverse sweep regardless of the dimension.
pub fn hessian_times_vector<F>(f: F, x: &[f64], v: &[f64]) -> Result<(f64, Vec<f64>), AdError>
where
    F: FnOnce(&[Fvar<Var>]) -> Fvar<Var>,
{
    check_size_match("hessian_times_vector", x.len(), v.len())?;
    let _scope = NestedScope::new();
    let xs: Vec<Var> = x.iter().map(|&xi| Var::new(xi)).collect();
    let vs: Vec<Var> = v.iter().map(|&vi| Var::new(vi)).collect();
    let (fx, grad_dot_v) = gradient_dot_vector(f, &xs, &vs)?;
    let hv = grad_dot_v.grad(&xs);
    Ok((fx.val(), hv))
}

/// Value of `f` at `x` and `H v`, by forward-over-forward.
///
/// Makes one pass per input: input `i` is seeded with inner tangent `e_i`
/// and outer tangent `v`, so the second-order tangent is `(H v)_i`.
pub fn fwd_hessian_times_vector<F>(f: F, x: &[f64], v: &[f64]) -> Result<(f64, Vec<f64>), AdError>
where
    F: Fn(&[Fvar<Fvar<f64>>]) -> Fvar<Fvar<f64>>,
{
    check_size_match("hessian_times_vector", x.len(), v.len())?;
    if x.is_empty() {
        return Ok((f(&[]).val.val, Vec::new()));
    }

    let mut fx = 0.0;
    let mut hv = Vec::with_capacity(x.len());
    for i in 0..x.len() {
        let seeded: Vec<Fvar<Fvar<f64>>> = x
            .iter()
            .zip(v)
            .enumerate()
            .map(|(k, (&xk, &vk))| {
                Fvar::new(
                    Fvar::new(xk, if k == i { 1.0 } else { 0.0 }),
                    Fvar::new(vk, 0.0),
                )
            })
            .collect();
        let out = f(&seeded);
        fx = out.val.val;
        hv.push(out.d.d);
    }
    Ok((fx, hv))
}

/// Gradient of `tr(M H(x))` with respect to `x`, where `H` is the Hessian of
/// `f`. `M` must be square with one row per input.
///
/// Third-order: forward-over-forward-over-reverse. Row `n` of `M` is pushed
/// through `f` as a forward direction alongside the unit tangent `e_n`; the
/// resulting second-order tangents are summed and swept once in reverse.
pub fn grad_tr_mat_times_hessian<F>(
    f: F,
    x: &[f64],
    m: MatRef<'_, f64>,
) -> Result<Vec<f64>, AdError>
where
    F: Fn(&[Fvar<Fvar<Var>>]) -> Fvar<Fvar<Var>>,
{
    let n = x.len();
    check_size_match("grad_tr_mat_times_hessian", n, m.nrows())?;
    check_size_match("grad_tr_mat_times_hessian", n, m.ncols())?;

    let _scope = NestedScope::new();
    let xs: Vec<Var> = x.iter().map(|&xi| Var::new(xi)).collect();
    let mut terms: SmallVec<[Var; 16]> = SmallVec::with_capacity(n);
    for row in 0..n {
        let seeded: Vec<Fvar<Fvar<Var>>> = xs
            .iter()
            .enumerate()
            .map(|(k, &xk)| {
                Fvar::new(
                    Fvar::new(xk, Var::new(if k == row { 1.0 } else { 0.0 })),
                    Fvar::from(m[(row, k)]),
                )
            })
            .collect();
        terms.push(f(&seeded).d.d);
    }
    let total = sum(&terms);
    Ok(total.grad(&xs))
}
