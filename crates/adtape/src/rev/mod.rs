//! Reverse-mode automatic differentiation on a thread-local tape.
//!
//! # Architecture
//!
//! ```text
//! Var (Copy handle) ──records──►  Tape (thread_local)
//!                                   │
//!                 ┌─────────────────┼──────────────────┐
//!                 ▼                 ▼                  ▼
//!            Vec<Node>        Arena<NodeId>       Arena<f64>
//!       value, adjoint, Op    operand lists     constant weights
//! ```
//!
//! # Example
//!
//! ```ignore
//! use adtape::rev::{Var, grad, recover_memory};
//!
//! let x = Var::new(4.0);
//! let f = x * x;
//! assert_eq!(f.val(), 16.0);
//! assert_eq!(grad(&f, &[x]), vec![8.0]);
//! recover_memory().unwrap();
//! ```
//!
//! # Key Types
//!
//! - [`Var`]: differentiable scalar handle
//! - [`Tape`]: node storage, gradient sweep, nested scopes
//! - [`NestedScope`]: guard for nested gradient episodes
//! - [`VarMatrix`]: column-major matrix of `Var` with faer interop

mod matrix;
mod nested;
mod node;
mod ops;
mod tape;
mod var;
mod vector;

pub use matrix::VarMatrix;
pub use nested::NestedScope;
pub use node::{BinaryOp, Node, NodeId, Op, UnaryOp};
pub use tape::{Tape, TapeConfig, configure_thread_tape, with_tape};
pub use var::{
    Var, free_memory, grad, nesting_depth, print_tape, recover_memory, recover_memory_nested,
    set_zero_all_adjoints, set_zero_all_adjoints_nested, start_nested, tape_len,
};
pub use vector::{dot_product, dot_product_const, dot_self, precomputed_gradients, sum};
