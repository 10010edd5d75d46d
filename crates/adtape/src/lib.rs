//! adtape - tape-based automatic differentiation
//!
//! This crate computes exact derivatives of scalar programs written with
//! ordinary arithmetic. Reverse mode records every operation on a
//! thread-local tape and replays it backwards; forward mode carries tangents
//! alongside values. The two compose, which gives Hessians and higher-order
//! products.
//!
//! # Architecture
//!
//! ```text
//! functional   derivative, gradient, jacobian, hessian, ...
//!     │
//!     ├── fwd      Fvar<T>: value + tangent, generic over Scalar
//!     │
//!     └── rev      Var ──► Tape (thread_local) ──► Vec<Node> + Arena
//!                  reverse sweep, nested scopes
//! ```
//!
//! # Example
//!
//! ```
//! use adtape::rev::{Var, recover_memory};
//!
//! let x = Var::new(5.0);
//! let y = Var::new(7.0);
//! let f = 2.0 * x + 3.0 * y;
//! assert_eq!(f.val(), 31.0);
//! assert_eq!(f.grad(&[x, y]), vec![2.0, 3.0]);
//!
//! // Release the nodes before the next evaluation.
//! recover_memory().unwrap();
//! ```
//!
//! Numerical problems are not errors: NaN and infinities propagate through
//! values and adjoints. [`AdError`] is reserved for misuse of the API
//! (mismatched sizes, unbalanced nested scopes, rejected arguments).

pub mod arena;
pub mod check;
pub mod error;
pub mod finite_diff;
pub mod functional;
pub mod fwd;
pub mod rev;
pub mod scalar;

pub use error::AdError;
pub use fwd::Fvar;
pub use rev::{NestedScope, Var, grad};
pub use scalar::Scalar;
