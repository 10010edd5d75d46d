//! Tape nodes and their local derivative rules.
//!
//! Every node stores its forward value, its adjoint, and an [`Op`] that says
//! how the node was computed. [`chain`] is the single dispatch point that
//! propagates a node's adjoint to its operands.

use std::f64::consts::LN_10;

use crate::arena::{Arena, ArenaSlice};

/// Unique identifier for a node on a tape.
///
/// Identifiers are positions in creation order, so an operand always has a
/// smaller index than the node that uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the internal index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Elementary functions of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Exp,
    Log,
    Log10,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Abs,
    Floor,
    Ceil,
}

impl UnaryOp {
    /// Forward value at `x`.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Exp => x.exp(),
            UnaryOp::Log => x.ln(),
            UnaryOp::Log10 => x.log10(),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Tan => x.tan(),
            UnaryOp::Asin => x.asin(),
            UnaryOp::Acos => x.acos(),
            UnaryOp::Atan => x.atan(),
            UnaryOp::Sinh => x.sinh(),
            UnaryOp::Cosh => x.cosh(),
            UnaryOp::Tanh => x.tanh(),
            UnaryOp::Abs => x.abs(),
            UnaryOp::Floor => x.floor(),
            UnaryOp::Ceil => x.ceil(),
        }
    }

    /// Local derivative at `x`, given the already computed value `fx`.
    pub fn derivative(self, x: f64, fx: f64) -> f64 {
        match self {
            UnaryOp::Neg => -1.0,
            UnaryOp::Exp => fx,
            UnaryOp::Log => 1.0 / x,
            UnaryOp::Log10 => 1.0 / (x * LN_10),
            UnaryOp::Sqrt => 0.5 / fx,
            UnaryOp::Sin => x.cos(),
            UnaryOp::Cos => -x.sin(),
            UnaryOp::Tan => 1.0 + fx * fx,
            UnaryOp::Asin => 1.0 / (1.0 - x * x).sqrt(),
            UnaryOp::Acos => -1.0 / (1.0 - x * x).sqrt(),
            UnaryOp::Atan => 1.0 / (1.0 + x * x),
            UnaryOp::Sinh => x.cosh(),
            UnaryOp::Cosh => x.sinh(),
            UnaryOp::Tanh => 1.0 - fx * fx,
            UnaryOp::Abs => {
                if x > 0.0 {
                    1.0
                } else if x < 0.0 {
                    -1.0
                } else if x == 0.0 {
                    0.0
                } else {
                    f64::NAN
                }
            }
            UnaryOp::Floor | UnaryOp::Ceil => 0.0,
        }
    }
}

/// Elementary functions of two arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Atan2,
    /// Floating-point remainder with the sign of the dividend.
    Fmod,
}

impl BinaryOp {
    /// Forward value at `(a, b)`.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            // `powf` maps `pow(NaN, 0)` and `pow(1, NaN)` to 1.
            BinaryOp::Pow if a.is_nan() || b.is_nan() => f64::NAN,
            BinaryOp::Pow => a.powf(b),
            BinaryOp::Atan2 => a.atan2(b),
            BinaryOp::Fmod => a % b,
        }
    }

    /// Partial derivatives `(df/da, df/db)` at `(a, b)`, given `f = apply(a, b)`.
    pub fn partials(self, a: f64, b: f64, f: f64) -> (f64, f64) {
        match self {
            BinaryOp::Add => (1.0, 1.0),
            BinaryOp::Sub => (1.0, -1.0),
            BinaryOp::Mul => (b, a),
            BinaryOp::Div => (1.0 / b, -a / (b * b)),
            BinaryOp::Pow => {
                // 0^b has no usable log; both partials are taken as zero.
                if a == 0.0 {
                    (0.0, 0.0)
                } else {
                    (b * f / a, a.ln() * f)
                }
            }
            BinaryOp::Atan2 => {
                let denom = a * a + b * b;
                (b / denom, -a / denom)
            }
            BinaryOp::Fmod => (1.0, -(a / b).trunc()),
        }
    }
}

/// How a node was computed from its operands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// Independent variable or constant.
    Leaf,
    Unary(UnaryOp, NodeId),
    Binary(BinaryOp, NodeId, NodeId),
    /// `op(a, c)` with a constant right operand.
    BinaryConstRhs(BinaryOp, NodeId, f64),
    /// `op(c, b)` with a constant left operand.
    BinaryConstLhs(BinaryOp, f64, NodeId),
    /// Sum of operands.
    Sum(ArenaSlice<NodeId>),
    /// Inner product of two operand lists of equal length.
    Dot(ArenaSlice<NodeId>, ArenaSlice<NodeId>),
    /// Inner product of operands with constant weights.
    DotConst(ArenaSlice<NodeId>, ArenaSlice<f64>),
    /// Externally supplied value with externally supplied partials.
    Precomputed(ArenaSlice<NodeId>, ArenaSlice<f64>),
}

impl Op {
    /// Call `f` once for every operand reference.
    pub(crate) fn for_each_operand(&self, ids: &Arena<NodeId>, mut f: impl FnMut(NodeId)) {
        match *self {
            Op::Leaf => {}
            Op::Unary(_, a) | Op::BinaryConstRhs(_, a, _) | Op::BinaryConstLhs(_, _, a) => f(a),
            Op::Binary(_, a, b) => {
                f(a);
                f(b);
            }
            Op::Sum(xs) | Op::DotConst(xs, _) | Op::Precomputed(xs, _) => {
                ids.get(xs).iter().copied().for_each(f)
            }
            Op::Dot(xs, ys) => {
                ids.get(xs).iter().chain(ids.get(ys)).copied().for_each(f)
            }
        }
    }
}

/// A node on the tape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub(crate) value: f64,
    pub(crate) adjoint: f64,
    pub(crate) op: Op,
}

impl Node {
    pub(crate) fn new(value: f64, op: Op) -> Self {
        Self {
            value,
            adjoint: 0.0,
            op,
        }
    }

    /// Forward value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Accumulated adjoint.
    pub fn adjoint(&self) -> f64 {
        self.adjoint
    }

    /// Operation that produced this node.
    pub fn op(&self) -> Op {
        self.op
    }

    /// Seed this node as the dependent of a gradient sweep.
    pub fn init_dependent(&mut self) {
        self.adjoint = 1.0;
    }

    pub fn set_zero_adjoint(&mut self) {
        self.adjoint = 0.0;
    }
}

fn value_of(nodes: &[Node], id: NodeId) -> f64 {
    nodes.get(id.0).map_or(0.0, |n| n.value)
}

fn accumulate(nodes: &mut [Node], id: NodeId, delta: f64) {
    if let Some(node) = nodes.get_mut(id.0) {
        node.adjoint += delta;
    }
}

fn poison(nodes: &mut [Node], id: NodeId) {
    if let Some(node) = nodes.get_mut(id.0) {
        node.adjoint = f64::NAN;
    }
}

/// Propagate the adjoint of node `i` to its operands.
///
/// If any operand value or stored constant is NaN, every differentiable
/// operand receives a NaN adjoint regardless of the local partials.
pub(crate) fn chain(nodes: &mut [Node], ids: &Arena<NodeId>, coeffs: &Arena<f64>, i: usize) {
    let Node {
        value,
        adjoint,
        op,
    } = nodes[i];

    match op {
        Op::Leaf => {}
        Op::Unary(kind, a) => {
            let av = value_of(nodes, a);
            if av.is_nan() {
                poison(nodes, a);
            } else {
                accumulate(nodes, a, adjoint * kind.derivative(av, value));
            }
        }
        Op::Binary(kind, a, b) => {
            let (av, bv) = (value_of(nodes, a), value_of(nodes, b));
            if av.is_nan() || bv.is_nan() {
                poison(nodes, a);
                poison(nodes, b);
            } else {
                let (da, db) = kind.partials(av, bv, value);
                accumulate(nodes, a, adjoint * da);
                accumulate(nodes, b, adjoint * db);
            }
        }
        Op::BinaryConstRhs(kind, a, c) => {
            let av = value_of(nodes, a);
            if av.is_nan() || c.is_nan() {
                poison(nodes, a);
            } else {
                let (da, _) = kind.partials(av, c, value);
                accumulate(nodes, a, adjoint * da);
            }
        }
        Op::BinaryConstLhs(kind, c, b) => {
            let bv = value_of(nodes, b);
            if c.is_nan() || bv.is_nan() {
                poison(nodes, b);
            } else {
                let (_, db) = kind.partials(c, bv, value);
                accumulate(nodes, b, adjoint * db);
            }
        }
        Op::Sum(xs) => {
            let xs = ids.get(xs);
            let any_nan = xs.iter().any(|&x| value_of(nodes, x).is_nan());
            for &x in xs {
                if any_nan {
                    poison(nodes, x);
                } else {
                    accumulate(nodes, x, adjoint);
                }
            }
        }
        Op::Dot(xs, ys) => {
            let (xs, ys) = (ids.get(xs), ids.get(ys));
            let any_nan = xs
                .iter()
                .chain(ys)
                .any(|&x| value_of(nodes, x).is_nan());
            for (&x, &y) in xs.iter().zip(ys) {
                if any_nan {
                    poison(nodes, x);
                    poison(nodes, y);
                } else {
                    let (xv, yv) = (value_of(nodes, x), value_of(nodes, y));
                    accumulate(nodes, x, adjoint * yv);
                    accumulate(nodes, y, adjoint * xv);
                }
            }
        }
        Op::DotConst(xs, cs) | Op::Precomputed(xs, cs) => {
            let (xs, cs) = (ids.get(xs), coeffs.get(cs));
            let any_nan = xs.iter().any(|&x| value_of(nodes, x).is_nan())
                || (matches!(op, Op::DotConst(..)) && cs.iter().any(|c| c.is_nan()));
            for (&x, &c) in xs.iter().zip(cs) {
                if any_nan {
                    poison(nodes, x);
                } else {
                    accumulate(nodes, x, adjoint * c);
                }
            }
        }
    }
}
