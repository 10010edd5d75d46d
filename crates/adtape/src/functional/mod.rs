//! Functional derivative drivers.
//!
//! Each driver takes a closure describing the function and a point, seeds
//! the inputs, evaluates, and reads back derivatives. Reverse-mode drivers
//! manage their own nested scope.
//!
//! | driver | mode | result |
//! |---|---|---|
//! | [`derivative`] | fwd | `f(x), f'(x)` |
//! | [`partial_derivative`] | fwd | `f(x), df/dx_n` |
//! | [`gradient_dot_vector`] | fwd | `f(x), grad f . v` |
//! | [`gradient`] / [`try_gradient`] | rev | `f(x), grad f` |
//! | [`fwd_gradient`] | fwd | `f(x), grad f` |
//! | [`jacobian`] / [`fwd_jacobian`] | rev / fwd | `f(x), J` |
//! | [`hessian`] | fwd-over-rev | `f(x), grad f, H` |
//! | [`fwd_hessian`] | fwd-over-fwd | `f(x), grad f, H` |
//! | [`hessian_times_vector`] | fwd-over-rev | `f(x), H v` |
//! | [`fwd_hessian_times_vector`] | fwd-over-fwd | `f(x), H v` |
//! | [`grad_tr_mat_times_hessian`] | fwd-over-fwd-over-rev | `grad tr(M H)` |

mod derivative;
mod gradient;
mod hessian;

pub use derivative::{derivative, gradient_dot_vector, partial_derivative};
pub use gradient::{fwd_gradient, fwd_jacobian, gradient, jacobian, try_gradient};
pub use hessian::{
    fwd_hessian, fwd_hessian_times_vector, grad_tr_mat_times_hessian, hessian,
    hessian_times_vector,
};
