//! Error types for adtape.

use thiserror::Error;

/// Errors that can occur when driving the autodiff engine.
///
/// Numerical problems (NaN, infinities) are never reported through this
/// type; they propagate through values and adjoints like ordinary floats.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdError {
    /// `recover_memory_nested()` was called without a matching `start_nested()`.
    #[error("no nested scope is active; start_nested() must precede recover_memory_nested()")]
    NoNestedScope,

    /// A whole-tape operation was requested while a nested scope is still open.
    #[error("{depth} nested scope(s) still active; recover them before recovering the tape")]
    NestedScopeActive { depth: usize },

    /// Two sequences that must have equal length do not.
    #[error("{function}: size mismatch, expected {expected} elements, got {actual}")]
    SizeMismatch {
        function: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Index out of bounds.
    #[error("index out of bounds: index {index} is out of range for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// An argument violated the domain of a primitive.
    #[error("{function}: {name} is {value}, but must be {constraint}")]
    Domain {
        function: &'static str,
        name: &'static str,
        value: f64,
        constraint: &'static str,
    },

    /// Analytic and finite-difference gradients disagree.
    #[error(
        "gradient mismatch at index {index}: analytic {analytic}, finite difference {numeric}"
    )]
    GradientMismatch {
        index: usize,
        analytic: f64,
        numeric: f64,
    },
}
