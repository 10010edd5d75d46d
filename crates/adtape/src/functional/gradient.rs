//! Gradients and Jacobians.
//!
//! The reverse-mode drivers record inside a [`NestedScope`], so they can be
//! called while an outer expression is live and leave the tape as they found
//! it, even if `f` panics or returns an error.

use faer::Mat;
use tracing::trace;

use crate::error::AdError;
use crate::fwd::Fvar;
use crate::rev::{NestedScope, NodeId, Var, with_tape};
use crate::scalar::Scalar;

fn leaves(x: &[f64]) -> Vec<Var> {
    x.iter().map(|&v| Var::new(v)).collect()
}

/// Value and gradient of `f` at `x`, by reverse mode.
///
/// # Example
///
/// ```ignore
/// use adtape::functional::gradient;
///
/// let (fx, g) = gradient(|x| 2.0 * x[0] + 3.0 * x[1], &[5.0, 7.0]);
/// assert_eq!(fx, 31.0);
/// assert_eq!(g, vec![2.0, 3.0]);
/// ```
pub fn gradient<F>(f: F, x: &[f64]) -> (f64, Vec<f64>)
where
    F: FnOnce(&[Var]) -> Var,
{
    let _scope = NestedScope::new();
    let xs = leaves(x);
    let fx = f(&xs);
    let grad = fx.grad(&xs);
    trace!(inputs = x.len(), "gradient");
    (fx.val(), grad)
}

/// [`gradient`] for functions that validate their arguments.
pub fn try_gradient<F>(f: F, x: &[f64]) -> Result<(f64, Vec<f64>), AdError>
where
    F: FnOnce(&[Var]) -> Result<Var, AdError>,
{
    let _scope = NestedScope::new();
    let xs = leaves(x);
    let fx = f(&xs)?;
    let grad = fx.grad(&xs);
    Ok((fx.val(), grad))
}

/// Value and gradient of `f` at `x`, by one forward pass per input.
pub fn fwd_gradient<T, F>(f: F, x: &[T]) -> (T, Vec<T>)
where
    T: Scalar,
    F: Fn(&[Fvar<T>]) -> Fvar<T>,
{
    if x.is_empty() {
        return (f(&[]).val, Vec::new());
    }
    let mut fx = T::zero();
    let mut grad = Vec::with_capacity(x.len());
    for i in 0..x.len() {
        let seeded: Vec<Fvar<T>> = x
            .iter()
            .enumerate()
            .map(|(k, &xk)| {
                if k == i {
                    Fvar::variable(xk)
                } else {
                    Fvar::constant(xk)
                }
            })
            .collect();
        let out = f(&seeded);
        fx = out.val;
        grad.push(out.d);
    }
    (fx, grad)
}

/// Values of a vector function and its Jacobian, by reverse mode.
///
/// `J[(i, k)]` is the derivative of output `i` with respect to input `k`.
/// One reverse sweep is made per output.
pub fn jacobian<F>(f: F, x: &[f64]) -> (Vec<f64>, Mat<f64>)
where
    F: FnOnce(&[Var]) -> Vec<Var>,
{
    let _scope = NestedScope::new();
    let xs = leaves(x);
    let fx = f(&xs);

    let inputs: Vec<NodeId> = xs.iter().map(Var::id).collect();
    let outputs: Vec<NodeId> = fx.iter().map(Var::id).collect();
    let rows = with_tape(|tape| tape.jacobian(&outputs, &inputs));

    let values = fx.iter().map(Var::val).collect();
    let jac = Mat::from_fn(fx.len(), x.len(), |i, k| rows[i][k]);
    (values, jac)
}

/// Values of a vector function and its Jacobian, by one forward pass per input.
pub fn fwd_jacobian<F>(f: F, x: &[f64]) -> (Vec<f64>, Mat<f64>)
where
    F: Fn(&[Fvar<f64>]) -> Vec<Fvar<f64>>,
{
    if x.is_empty() {
        let values: Vec<f64> = f(&[]).iter().map(|y| y.val).collect();
        let m = values.len();
        return (values, Mat::zeros(m, 0));
    }

    let mut values = Vec::new();
    let mut columns = Vec::with_capacity(x.len());
    for k in 0..x.len() {
        let seeded: Vec<Fvar<f64>> = x
            .iter()
            .enumerate()
            .map(|(i, &xi)| Fvar::new(xi, if i == k { 1.0 } else { 0.0 }))
            .collect();
        let out = f(&seeded);
        if k == 0 {
            values = out.iter().map(|y| y.val).collect();
        }
        columns.push(out.iter().map(|y| y.d).collect::<Vec<f64>>());
    }
    let jac = Mat::from_fn(values.len(), x.len(), |i, k| columns[k][i]);
    (values, jac)
}
