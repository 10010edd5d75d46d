//! The tape: every node recorded since the last reset, in creation order.
//!
//! Creation order is a topological order of the expression graph, so a
//! gradient sweep is a plain reverse walk over a slice. Variable-length
//! payloads (operand lists and constant weights of vector nodes) live in two
//! [`Arena`]s owned by the tape.
//!
//! # Nested scopes
//!
//! ```text
//! nodes: [ outer ........ | nested 1 ..... | nested 2 .. ]
//!                          ^ frame[0].tape_len
//!                                           ^ frame[1].tape_len  (segment start)
//! ```
//!
//! A sweep started while nested only visits the innermost segment. Outer
//! nodes reached from it (operands and requested inputs) are *shielded*:
//! their adjoints are saved once per frame and zeroed before the sweep, and
//! restored when the frame is recovered. Work done in a nested scope is
//! therefore invisible to the enclosing computation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace, warn};

use super::node::{BinaryOp, Node, NodeId, Op, UnaryOp, chain};
use crate::arena::{Arena, ArenaConfig, ArenaMark};
use crate::error::AdError;

/// Sizing policy for a [`Tape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeConfig {
    /// Number of nodes reserved up front.
    pub node_capacity: usize,
    /// Block policy for the operand and weight arenas.
    pub arena: ArenaConfig,
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self {
            node_capacity: 4096,
            arena: ArenaConfig::default(),
        }
    }
}

#[derive(Debug)]
struct NestedFrame {
    tape_len: usize,
    ids_mark: ArenaMark,
    coeffs_mark: ArenaMark,
    /// Saved adjoints of outer nodes touched inside this frame.
    shielded: HashMap<usize, f64>,
}

/// Ordered record of differentiable operations.
pub struct Tape {
    nodes: Vec<Node>,
    ids: Arena<NodeId>,
    coeffs: Arena<f64>,
    nested: Vec<NestedFrame>,
    config: TapeConfig,
}

impl Tape {
    /// Create an empty tape with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TapeConfig::default())
    }

    /// Create an empty tape with an explicit configuration.
    pub fn with_config(config: TapeConfig) -> Self {
        Self {
            nodes: Vec::with_capacity(config.node_capacity),
            ids: Arena::with_config(config.arena),
            coeffs: Arena::with_config(config.arena),
            nested: Vec::new(),
            config,
        }
    }

    /// Configuration this tape was built with.
    pub fn config(&self) -> TapeConfig {
        self.config
    }

    fn push(&mut self, value: f64, op: Op) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(value, op));
        id
    }

    /// Record an independent variable.
    pub fn leaf(&mut self, value: f64) -> NodeId {
        self.push(value, Op::Leaf)
    }

    pub fn unary(&mut self, kind: UnaryOp, a: NodeId) -> NodeId {
        let value = kind.apply(self.value(a));
        self.push(value, Op::Unary(kind, a))
    }

    pub fn binary(&mut self, kind: BinaryOp, a: NodeId, b: NodeId) -> NodeId {
        let value = kind.apply(self.value(a), self.value(b));
        self.push(value, Op::Binary(kind, a, b))
    }

    /// Record `kind(a, c)` for a constant `c`.
    pub fn binary_const_rhs(&mut self, kind: BinaryOp, a: NodeId, c: f64) -> NodeId {
        let value = kind.apply(self.value(a), c);
        self.push(value, Op::BinaryConstRhs(kind, a, c))
    }

    /// Record `kind(c, b)` for a constant `c`.
    pub fn binary_const_lhs(&mut self, kind: BinaryOp, c: f64, b: NodeId) -> NodeId {
        let value = kind.apply(c, self.value(b));
        self.push(value, Op::BinaryConstLhs(kind, c, b))
    }

    /// Record the sum of `terms` as a single node.
    pub fn sum(&mut self, terms: &[NodeId]) -> NodeId {
        let value: f64 = terms.iter().map(|&t| self.value(t)).sum();
        let xs = self.ids.alloc(terms);
        self.push(value, Op::Sum(xs))
    }

    /// Record the inner product of `a` and `b` as a single node.
    pub fn dot(&mut self, a: &[NodeId], b: &[NodeId]) -> Result<NodeId, AdError> {
        check_len("dot_product", a.len(), b.len())?;
        let value: f64 = a
            .iter()
            .zip(b)
            .map(|(&x, &y)| self.value(x) * self.value(y))
            .sum();
        let xs = self.ids.alloc(a);
        let ys = self.ids.alloc(b);
        Ok(self.push(value, Op::Dot(xs, ys)))
    }

    /// Record the squared norm of `a`; both sides share one operand list.
    pub fn dot_self(&mut self, a: &[NodeId]) -> NodeId {
        let value: f64 = a.iter().map(|&x| self.value(x).powi(2)).sum();
        let xs = self.ids.alloc(a);
        self.push(value, Op::Dot(xs, xs))
    }

    /// Record the inner product of `a` with constant weights.
    pub fn dot_const(&mut self, a: &[NodeId], weights: &[f64]) -> Result<NodeId, AdError> {
        check_len("dot_product_const", a.len(), weights.len())?;
        let value: f64 = a
            .iter()
            .zip(weights)
            .map(|(&x, &w)| self.value(x) * w)
            .sum();
        let xs = self.ids.alloc(a);
        let cs = self.coeffs.alloc(weights);
        Ok(self.push(value, Op::DotConst(xs, cs)))
    }

    /// Record a node whose value and partials were computed elsewhere.
    pub fn precomputed(
        &mut self,
        value: f64,
        operands: &[NodeId],
        partials: &[f64],
    ) -> Result<NodeId, AdError> {
        check_len("precomputed_gradients", operands.len(), partials.len())?;
        let xs = self.ids.alloc(operands);
        let cs = self.coeffs.alloc(partials);
        Ok(self.push(value, Op::Precomputed(xs, cs)))
    }

    /// Number of nodes on the tape.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tape holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Random access to a node.
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Forward value of `id`, or 0 if the slot no longer exists.
    pub fn value(&self, id: NodeId) -> f64 {
        self.nodes.get(id.index()).map_or(0.0, Node::value)
    }

    /// Adjoint of `id`, or 0 if the slot no longer exists.
    pub fn adjoint(&self, id: NodeId) -> f64 {
        self.nodes.get(id.index()).map_or(0.0, Node::adjoint)
    }

    pub fn set_adjoint(&mut self, id: NodeId, adjoint: f64) -> Result<(), AdError> {
        let len = self.nodes.len();
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(AdError::IndexOutOfBounds {
                index: id.index(),
                len,
            })?;
        node.adjoint = adjoint;
        Ok(())
    }

    /// Operand arena; resolves the slices stored in vector [`Op`]s.
    pub fn operand_arena(&self) -> &Arena<NodeId> {
        &self.ids
    }

    /// Weight arena; resolves the constant slices stored in vector [`Op`]s.
    pub fn weight_arena(&self) -> &Arena<f64> {
        &self.coeffs
    }

    /// Index of the first node of the innermost active segment.
    pub fn segment_start(&self) -> usize {
        self.nested.last().map_or(0, |frame| frame.tape_len)
    }

    pub fn is_nested(&self) -> bool {
        !self.nested.is_empty()
    }

    pub fn nesting_depth(&self) -> usize {
        self.nested.len()
    }

    /// Open a nested scope at the current end of the tape.
    pub fn start_nested(&mut self) {
        self.nested.push(NestedFrame {
            tape_len: self.nodes.len(),
            ids_mark: self.ids.mark(),
            coeffs_mark: self.coeffs.mark(),
            shielded: HashMap::new(),
        });
        debug!(
            depth = self.nested.len(),
            tape_len = self.nodes.len(),
            "started nested scope"
        );
    }

    /// Discard everything recorded since the innermost [`start_nested`](Self::start_nested)
    /// and restore the adjoints of outer nodes touched inside the scope.
    pub fn recover_nested(&mut self) -> Result<(), AdError> {
        let frame = self.nested.pop().ok_or(AdError::NoNestedScope)?;
        let discarded = self.nodes.len() - frame.tape_len;
        self.nodes.truncate(frame.tape_len);
        self.ids.recover_to(frame.ids_mark);
        self.coeffs.recover_to(frame.coeffs_mark);
        for (index, adjoint) in frame.shielded {
            if let Some(node) = self.nodes.get_mut(index) {
                node.adjoint = adjoint;
            }
        }
        debug!(depth = self.nested.len(), discarded, "recovered nested scope");
        Ok(())
    }

    /// Discard every node. Arena blocks are kept for reuse.
    pub fn recover_memory(&mut self) -> Result<(), AdError> {
        self.ensure_not_nested()?;
        let discarded = self.nodes.len();
        self.nodes.clear();
        self.ids.recover_all();
        self.coeffs.recover_all();
        debug!(discarded, "recovered tape memory");
        Ok(())
    }

    /// Discard every node and release all memory held by the tape.
    pub fn free_memory(&mut self) -> Result<(), AdError> {
        self.ensure_not_nested()?;
        self.nodes = Vec::new();
        self.ids.free_all();
        self.coeffs.free_all();
        debug!("freed tape memory");
        Ok(())
    }

    fn ensure_not_nested(&self) -> Result<(), AdError> {
        if self.nested.is_empty() {
            Ok(())
        } else {
            Err(AdError::NestedScopeActive {
                depth: self.nested.len(),
            })
        }
    }

    pub fn set_zero_all_adjoints(&mut self) {
        for node in &mut self.nodes {
            node.set_zero_adjoint();
        }
    }

    /// Zero the adjoints of the innermost active segment only.
    pub fn set_zero_all_adjoints_nested(&mut self) {
        let start = self.segment_start();
        for node in &mut self.nodes[start..] {
            node.set_zero_adjoint();
        }
    }

    /// Save and zero the adjoint of an outer node, once per frame.
    fn shield(&mut self, index: usize) {
        let Some(frame) = self.nested.last_mut() else {
            return;
        };
        if index >= frame.tape_len {
            return;
        }
        if let Some(node) = self.nodes.get_mut(index) {
            frame.shielded.entry(index).or_insert(node.adjoint);
            node.adjoint = 0.0;
        }
    }

    /// Reverse sweep from `output`; returns d output / d input for each input.
    ///
    /// Only the innermost active segment is swept. An input created after
    /// `output` reads 0.
    pub fn grad(&mut self, output: NodeId, inputs: &[NodeId]) -> Vec<f64> {
        let len = self.nodes.len();
        if output.index() >= len {
            warn!(
                output = output.index(),
                tape_len = len,
                "gradient requested for a node that is no longer on the tape"
            );
            return vec![0.0; inputs.len()];
        }

        let start = self.segment_start();
        let sweep_end = if output.index() >= start {
            output.index() + 1
        } else {
            start
        };
        self.set_zero_all_adjoints_nested();

        if self.is_nested() {
            let mut outer = Vec::new();
            for node in &self.nodes[start..sweep_end] {
                node.op.for_each_operand(&self.ids, |id| {
                    if id.index() < start {
                        outer.push(id.index());
                    }
                });
            }
            outer.extend(inputs.iter().map(NodeId::index).filter(|&i| i < start));
            if output.index() < start {
                outer.push(output.index());
            }
            for index in outer {
                self.shield(index);
            }
        }

        self.nodes[output.index()].init_dependent();

        // Nodes with a zero adjoint are chained too, so `0 * inf` gives NaN.
        for i in (start..sweep_end).rev() {
            chain(&mut self.nodes, &self.ids, &self.coeffs, i);
        }
        trace!(
            output = output.index(),
            segment_start = start,
            swept = sweep_end - start,
            "reverse sweep"
        );

        inputs.iter().map(|&id| self.adjoint(id)).collect()
    }

    /// Jacobian of `dependents` with respect to `independents`.
    ///
    /// Row `i` holds the gradient of `dependents[i]`; one sweep per row.
    pub fn jacobian(&mut self, dependents: &[NodeId], independents: &[NodeId]) -> Vec<Vec<f64>> {
        dependents
            .iter()
            .map(|&dep| self.grad(dep, independents))
            .collect()
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tape")
            .field("num_nodes", &self.nodes.len())
            .field("nesting_depth", &self.nested.len())
            .field("ids", &self.ids)
            .field("coeffs", &self.coeffs)
            .finish()
    }
}

/// One line per node: index, value, adjoint.
impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TAPE, size={}", self.nodes.len())?;
        for (i, node) in self.nodes.iter().enumerate() {
            writeln!(
                f,
                "{i:>5}  val={:<14} adj={:<14} {:?}",
                node.value, node.adjoint, node.op
            )?;
        }
        Ok(())
    }
}

fn check_len(function: &'static str, expected: usize, actual: usize) -> Result<(), AdError> {
    if expected == actual {
        Ok(())
    } else {
        Err(AdError::SizeMismatch {
            function,
            expected,
            actual,
        })
    }
}

thread_local! {
    static TAPE: RefCell<Tape> = RefCell::new(Tape::new());
}

/// Access the thread-local tape used by [`Var`](super::Var).
///
/// `f` must not call back into anything that records on the tape.
///
/// # Example
///
/// ```ignore
/// use adtape::rev::with_tape;
///
/// let len = with_tape(|tape| tape.len());
/// println!("{len} nodes recorded");
/// ```
pub fn with_tape<R>(f: impl FnOnce(&mut Tape) -> R) -> R {
    TAPE.with(|t| f(&mut t.borrow_mut()))
}

/// Replace the thread-local tape with an empty one built from `config`.
///
/// Every existing [`Var`](super::Var) on this thread becomes stale.
pub fn configure_thread_tape(config: TapeConfig) -> Result<(), AdError> {
    with_tape(|tape| {
        tape.ensure_not_nested()?;
        *tape = Tape::with_config(config);
        debug!(?config, "reconfigured thread tape");
        Ok(())
    })
}
