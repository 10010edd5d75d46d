//! Operator overloads and elementary functions on [`Var`].
//!
//! Every operation records one node on the thread-local tape and returns a
//! handle to it. Comparisons only look at values and record nothing.

use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, Sub, SubAssign};

use super::node::{BinaryOp, UnaryOp};
use super::var::Var;

fn unary(kind: UnaryOp, a: Var) -> Var {
    Var::record(|tape| tape.unary(kind, a.id()))
}

fn binary(kind: BinaryOp, a: Var, b: Var) -> Var {
    Var::record(|tape| tape.binary(kind, a.id(), b.id()))
}

fn binary_const_rhs(kind: BinaryOp, a: Var, c: f64) -> Var {
    Var::record(|tape| tape.binary_const_rhs(kind, a.id(), c))
}

fn binary_const_lhs(kind: BinaryOp, c: f64, b: Var) -> Var {
    Var::record(|tape| tape.binary_const_lhs(kind, c, b.id()))
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $kind:expr) => {
        impl $trait for Var {
            type Output = Var;

            fn $method(self, rhs: Var) -> Var {
                binary($kind, self, rhs)
            }
        }

        impl $trait<f64> for Var {
            type Output = Var;

            fn $method(self, rhs: f64) -> Var {
                binary_const_rhs($kind, self, rhs)
            }
        }

        impl $trait<Var> for f64 {
            type Output = Var;

            fn $method(self, rhs: Var) -> Var {
                binary_const_lhs($kind, self, rhs)
            }
        }
    };
}

impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Div, div, BinaryOp::Div);
impl_binary_op!(Rem, rem, BinaryOp::Fmod);

impl Add for Var {
    type Output = Var;

    fn add(self, rhs: Var) -> Var {
        binary(BinaryOp::Add, self, rhs)
    }
}

// Adding zero or scaling by one returns the operand without a new node.
impl Add<f64> for Var {
    type Output = Var;

    fn add(self, rhs: f64) -> Var {
        if rhs == 0.0 {
            return self;
        }
        binary_const_rhs(BinaryOp::Add, self, rhs)
    }
}

impl Add<Var> for f64 {
    type Output = Var;

    fn add(self, rhs: Var) -> Var {
        rhs + self
    }
}

impl Mul for Var {
    type Output = Var;

    fn mul(self, rhs: Var) -> Var {
        binary(BinaryOp::Mul, self, rhs)
    }
}

impl Mul<f64> for Var {
    type Output = Var;

    fn mul(self, rhs: f64) -> Var {
        if rhs == 1.0 {
            return self;
        }
        binary_const_rhs(BinaryOp::Mul, self, rhs)
    }
}

impl Mul<Var> for f64 {
    type Output = Var;

    fn mul(self, rhs: Var) -> Var {
        rhs * self
    }
}

impl Neg for Var {
    type Output = Var;

    fn neg(self) -> Var {
        unary(UnaryOp::Neg, self)
    }
}

macro_rules! impl_assign_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Var {
            fn $method(&mut self, rhs: Var) {
                *self = *self $op rhs;
            }
        }

        impl $trait<f64> for Var {
            fn $method(&mut self, rhs: f64) {
                *self = *self $op rhs;
            }
        }
    };
}

impl_assign_op!(AddAssign, add_assign, +);
impl_assign_op!(SubAssign, sub_assign, -);
impl_assign_op!(MulAssign, mul_assign, *);
impl_assign_op!(DivAssign, div_assign, /);

impl PartialEq for Var {
    fn eq(&self, other: &Var) -> bool {
        self.val() == other.val()
    }
}

impl PartialEq<f64> for Var {
    fn eq(&self, other: &f64) -> bool {
        self.val() == *other
    }
}

impl PartialEq<Var> for f64 {
    fn eq(&self, other: &Var) -> bool {
        *self == other.val()
    }
}

impl PartialOrd for Var {
    fn partial_cmp(&self, other: &Var) -> Option<Ordering> {
        self.val().partial_cmp(&other.val())
    }
}

impl PartialOrd<f64> for Var {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.val().partial_cmp(other)
    }
}

impl PartialOrd<Var> for f64 {
    fn partial_cmp(&self, other: &Var) -> Option<Ordering> {
        self.partial_cmp(&other.val())
    }
}

macro_rules! unary_fns {
    ($($(#[$doc:meta])* $name:ident => $kind:expr;)*) => {
        impl Var {
            $(
                $(#[$doc])*
                pub fn $name(self) -> Var {
                    unary($kind, self)
                }
            )*
        }
    };
}

unary_fns! {
    exp => UnaryOp::Exp;
    /// Natural logarithm.
    ln => UnaryOp::Log;
    log10 => UnaryOp::Log10;
    sqrt => UnaryOp::Sqrt;
    sin => UnaryOp::Sin;
    cos => UnaryOp::Cos;
    tan => UnaryOp::Tan;
    asin => UnaryOp::Asin;
    acos => UnaryOp::Acos;
    atan => UnaryOp::Atan;
    sinh => UnaryOp::Sinh;
    cosh => UnaryOp::Cosh;
    tanh => UnaryOp::Tanh;
    /// Absolute value. The derivative is 0 at 0.
    abs => UnaryOp::Abs;
    /// Largest integer not greater than the value. The derivative is 0.
    floor => UnaryOp::Floor;
    /// Smallest integer not less than the value. The derivative is 0.
    ceil => UnaryOp::Ceil;
}

impl Var {
    /// `self` raised to a constant power.
    pub fn powf(self, exponent: f64) -> Var {
        binary_const_rhs(BinaryOp::Pow, self, exponent)
    }

    /// `self` raised to a variable power.
    pub fn pow(self, exponent: Var) -> Var {
        binary(BinaryOp::Pow, self, exponent)
    }

    /// A constant raised to a variable power.
    pub fn pow_dv(base: f64, exponent: Var) -> Var {
        binary_const_lhs(BinaryOp::Pow, base, exponent)
    }

    /// Four-quadrant arctangent of `self / other`.
    pub fn atan2(self, other: Var) -> Var {
        binary(BinaryOp::Atan2, self, other)
    }

    pub fn atan2_f64(self, other: f64) -> Var {
        binary_const_rhs(BinaryOp::Atan2, self, other)
    }

    pub fn atan2_dv(y: f64, x: Var) -> Var {
        binary_const_lhs(BinaryOp::Atan2, y, x)
    }

    pub fn square(self) -> Var {
        self * self
    }
}
