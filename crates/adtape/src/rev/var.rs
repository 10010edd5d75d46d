//! `Var`: the user-facing handle for reverse-mode differentiation.

use std::fmt;
use std::marker::PhantomData;

use super::node::NodeId;
use super::tape::{Tape, with_tape};
use crate::error::AdError;

/// Handle to a node on the thread-local tape.
///
/// Arithmetic on `Var` records new nodes as a side effect. The forward value
/// is cached in the handle; adjoints live on the tape.
///
/// A `Var` is only meaningful on the thread that created it and only until the
/// tape is recovered. After recovery, reading its adjoint returns whatever
/// node now occupies its slot (or 0 if the slot is gone).
///
/// # Example
///
/// ```ignore
/// use adtape::rev::{Var, recover_memory};
///
/// let x = Var::new(5.0);
/// let y = Var::new(7.0);
/// let f = 2.0 * x + 3.0 * y;
/// assert_eq!(f.val(), 31.0);
/// assert_eq!(f.grad(&[x, y]), vec![2.0, 3.0]);
/// recover_memory().unwrap();
/// ```
#[derive(Clone, Copy)]
pub struct Var {
    id: NodeId,
    value: f64,
    // Tied to the thread-local tape: neither Send nor Sync.
    _not_send: PhantomData<*const ()>,
}

impl Var {
    /// Create a new independent variable.
    pub fn new(value: f64) -> Self {
        with_tape(|tape| Self::from_parts(tape.leaf(value), value))
    }

    pub(crate) fn from_parts(id: NodeId, value: f64) -> Self {
        Self {
            id,
            value,
            _not_send: PhantomData,
        }
    }

    /// Record a node with `f` and wrap the result.
    pub(crate) fn record(f: impl FnOnce(&mut Tape) -> NodeId) -> Self {
        with_tape(|tape| {
            let id = f(tape);
            Self::from_parts(id, tape.value(id))
        })
    }

    /// Fallible counterpart of [`Var::record`].
    pub(crate) fn try_record(
        f: impl FnOnce(&mut Tape) -> Result<NodeId, AdError>,
    ) -> Result<Self, AdError> {
        with_tape(|tape| {
            let id = f(tape)?;
            Ok(Self::from_parts(id, tape.value(id)))
        })
    }

    /// Forward value.
    pub fn val(&self) -> f64 {
        self.value
    }

    /// Position on the tape.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current adjoint.
    pub fn adj(&self) -> f64 {
        with_tape(|tape| tape.adjoint(self.id))
    }

    /// Gradient of this variable with respect to `inputs`.
    ///
    /// Adjoints of the active segment are zeroed first, so calling this
    /// repeatedly gives the same result.
    pub fn grad(&self, inputs: &[Var]) -> Vec<f64> {
        let ids: Vec<NodeId> = inputs.iter().map(Var::id).collect();
        with_tape(|tape| tape.grad(self.id, &ids))
    }

    pub fn is_nan(&self) -> bool {
        self.value.is_nan()
    }

    pub fn is_infinite(&self) -> bool {
        self.value.is_infinite()
    }
}

impl From<f64> for Var {
    fn from(value: f64) -> Self {
        Var::new(value)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("id", &self.id.index())
            .field("val", &self.value)
            .finish()
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

/// Gradient of `output` with respect to `inputs`. See [`Var::grad`].
pub fn grad(output: &Var, inputs: &[Var]) -> Vec<f64> {
    output.grad(inputs)
}

/// Discard every node on this thread's tape. All existing `Var`s become stale.
pub fn recover_memory() -> Result<(), AdError> {
    with_tape(Tape::recover_memory)
}

/// Open a nested scope; see [`NestedScope`](super::NestedScope) for the guard form.
pub fn start_nested() {
    with_tape(Tape::start_nested)
}

/// Close the innermost nested scope, discarding the nodes it recorded.
pub fn recover_memory_nested() -> Result<(), AdError> {
    with_tape(Tape::recover_nested)
}

/// Discard every node and release the tape's memory.
pub fn free_memory() -> Result<(), AdError> {
    with_tape(Tape::free_memory)
}

pub fn set_zero_all_adjoints() {
    with_tape(Tape::set_zero_all_adjoints)
}

pub fn set_zero_all_adjoints_nested() {
    with_tape(Tape::set_zero_all_adjoints_nested)
}

/// Number of open nested scopes on this thread.
pub fn nesting_depth() -> usize {
    with_tape(|tape| tape.nesting_depth())
}

/// Number of nodes on this thread's tape.
pub fn tape_len() -> usize {
    with_tape(|tape| tape.len())
}

/// Render this thread's tape, one node per line.
pub fn print_tape() -> String {
    with_tape(|tape| tape.to_string())
}
