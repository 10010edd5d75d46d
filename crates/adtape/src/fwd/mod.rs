//! Forward-mode automatic differentiation.
//!
//! [`Fvar`] carries a value and a tangent through ordinary arithmetic. No
//! tape is involved; derivatives are available as soon as the expression is
//! evaluated. See [`crate::functional`] for drivers that seed tangents.

mod functions;
mod fvar;

pub use fvar::Fvar;
