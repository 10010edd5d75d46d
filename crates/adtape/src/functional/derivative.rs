//! Forward-mode directional derivatives.

use crate::check::check_size_match;
use crate::error::AdError;
use crate::fwd::Fvar;
use crate::scalar::Scalar;

/// Value and derivative of a univariate function.
///
/// # Example
///
/// ```ignore
/// use adtape::fwd::Fvar;
/// use adtape::functional::derivative;
///
/// let (fx, dfx) = derivative(|x: Fvar<f64>| x * x.sin(), 1.0_f64);
/// assert!((dfx - (1.0_f64.sin() + 1.0_f64.cos())).abs() < 1e-12);
/// ```
pub fn derivative<T, F>(f: F, x: T) -> (T, T)
where
    T: Scalar,
    F: FnOnce(Fvar<T>) -> Fvar<T>,
{
    let out = f(Fvar::variable(x));
    (out.val, out.d)
}

/// Value of `f` at `x` and its partial derivative with respect to `x[n]`.
pub fn partial_derivative<T, F>(f: F, x: &[T], n: usize) -> Result<(T, T), AdError>
where
    T: Scalar,
    F: FnOnce(&[Fvar<T>]) -> Fvar<T>,
{
    if n >= x.len() {
        return Err(AdError::IndexOutOfBounds {
            index: n,
            len: x.len(),
        });
    }
    let seeded: Vec<Fvar<T>> = x
        .iter()
        .enumerate()
        .map(|(i, &xi)| {
            if i == n {
                Fvar::variable(xi)
            } else {
                Fvar::constant(xi)
            }
        })
        .collect();
    let out = f(&seeded);
    Ok((out.val, out.d))
}

/// Value of `f` at `x` and the directional derivative `grad f(x) . v`.
pub fn gradient_dot_vector<T, F>(f: F, x: &[T], v: &[T]) -> Result<(T, T), AdError>
where
    T: Scalar,
    F: FnOnce(&[Fvar<T>]) -> Fvar<T>,
{
    check_size_match("gradient_dot_vector", x.len(), v.len())?;
    let seeded: Vec<Fvar<T>> = x.iter().zip(v).map(|(&xi, &vi)| Fvar::new(xi, vi)).collect();
    let out = f(&seeded);
    Ok((out.val, out.d))
}
