//! Reductions over slices of [`Var`] recorded as single nodes.
//!
//! A sum or dot product over `n` terms costs one node plus `n` operand slots
//! in the tape's arena, instead of `n - 1` binary nodes.

use smallvec::SmallVec;

use super::node::NodeId;
use super::var::Var;
use crate::check::check_size_match;
use crate::error::AdError;

type Ids = SmallVec<[NodeId; 16]>;

fn ids_of(vars: &[Var]) -> Ids {
    vars.iter().map(Var::id).collect()
}

/// Sum of `terms`. An empty slice gives a constant zero.
pub fn sum(terms: &[Var]) -> Var {
    match terms {
        [] => Var::new(0.0),
        [only] => *only,
        _ => {
            let ids = ids_of(terms);
            Var::record(|tape| tape.sum(&ids))
        }
    }
}

/// Inner product of two equally long slices.
pub fn dot_product(a: &[Var], b: &[Var]) -> Result<Var, AdError> {
    check_size_match("dot_product", a.len(), b.len())?;
    let (a, b) = (ids_of(a), ids_of(b));
    Var::try_record(|tape| tape.dot(&a, &b))
}

/// Inner product with constant weights.
pub fn dot_product_const(a: &[Var], weights: &[f64]) -> Result<Var, AdError> {
    check_size_match("dot_product_const", a.len(), weights.len())?;
    let a = ids_of(a);
    Var::try_record(|tape| tape.dot_const(&a, weights))
}

/// Squared Euclidean norm.
pub fn dot_self(a: &[Var]) -> Var {
    let a = ids_of(a);
    Var::record(|tape| tape.dot_self(&a))
}

/// Record a node whose value and partial derivatives were computed outside
/// the tape.
///
/// This is how external primitives plug in: compute `f(operands)` and
/// `df/d operand[i]` in plain `f64`, then hand both over. The node behaves
/// like any built-in primitive during the reverse sweep.
///
/// # Example
///
/// ```ignore
/// use adtape::rev::{Var, precomputed_gradients};
///
/// // f(x, y) = x * y, computed outside the tape
/// let x = Var::new(2.0);
/// let y = Var::new(5.0);
/// let f = precomputed_gradients(10.0, &[x, y], &[5.0, 2.0]).unwrap();
/// assert_eq!(f.grad(&[x, y]), vec![5.0, 2.0]);
/// ```
pub fn precomputed_gradients(
    value: f64,
    operands: &[Var],
    partials: &[f64],
) -> Result<Var, AdError> {
    check_size_match("precomputed_gradients", operands.len(), partials.len())?;
    let ids = ids_of(operands);
    Var::try_record(|tape| tape.precomputed(value, &ids, partials))
}
