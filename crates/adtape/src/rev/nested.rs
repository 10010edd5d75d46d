//! Scope guard for nested gradient episodes.

use tracing::warn;

use super::tape::with_tape;

/// Opens a nested scope on creation and recovers it on drop.
///
/// Nodes recorded while the guard is alive are discarded when it is dropped,
/// including during unwinding. Adjoints of outer nodes touched by gradient
/// sweeps inside the scope are restored.
///
/// # Example
///
/// ```ignore
/// use adtape::rev::{NestedScope, Var};
///
/// let x = Var::new(2.0);
/// {
///     let _scope = NestedScope::new();
///     let y = x.exp();
///     let dy = y.grad(&[x]);
/// } // nodes recorded for `y` are gone here
/// ```
#[derive(Debug)]
pub struct NestedScope {
    depth: usize,
    // Recovering must happen on the thread that opened the scope.
    _not_send: std::marker::PhantomData<*const ()>,
}

impl NestedScope {
    pub fn new() -> Self {
        let depth = with_tape(|tape| {
            tape.start_nested();
            tape.nesting_depth()
        });
        Self {
            depth,
            _not_send: std::marker::PhantomData,
        }
    }

    /// Nesting depth of this scope (1 for the outermost).
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for NestedScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NestedScope {
    fn drop(&mut self) {
        with_tape(|tape| {
            if tape.nesting_depth() < self.depth {
                warn!(
                    depth = self.depth,
                    "nested scope was already recovered before its guard dropped"
                );
                return;
            }
            // Inner scopes left open by the caller are closed along with this one.
            while tape.nesting_depth() >= self.depth {
                if tape.recover_nested().is_err() {
                    break;
                }
            }
        });
    }
}
