//! Scalar trait shared by plain values and differentiable values.
//!
//! Code written against [`Scalar`] can be evaluated with `f64`, with
//! reverse-mode [`Var`], or with forward-mode [`Fvar<T>`] for any `T: Scalar`.
//! Nesting `Fvar` over `Var` is what the higher-order drivers in
//! [`crate::functional`] rely on.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, Sub, SubAssign};

use crate::fwd::Fvar;
use crate::rev::Var;

/// Trait for scalar types that elementary functions can be evaluated on.
pub trait Scalar:
    Copy
    + Debug
    + PartialOrd
    + From<f64>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Rem<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    /// Innermost `f64` value, with all derivative information stripped.
    fn value(&self) -> f64;

    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::from(0.0)
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self {
        Self::from(1.0)
    }

    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn log10(self) -> Self;
    fn sqrt(self) -> Self;
    fn recip(self) -> Self;
    fn powf(self, exponent: f64) -> Self;
    fn pow(self, exponent: Self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;
    fn asin(self) -> Self;
    fn acos(self) -> Self;
    fn atan(self) -> Self;
    fn sinh(self) -> Self;
    fn cosh(self) -> Self;
    fn tanh(self) -> Self;
    /// Four-quadrant arctangent of `self / other`.
    fn atan2(self, other: Self) -> Self;
    fn abs(self) -> Self;
    fn floor(self) -> Self;
    fn ceil(self) -> Self;

    /// Check if the value is NaN.
    fn is_nan(&self) -> bool {
        self.value().is_nan()
    }
}

impl Scalar for f64 {
    fn value(&self) -> f64 {
        *self
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn log10(self) -> Self {
        f64::log10(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn recip(self) -> Self {
        f64::recip(self)
    }

    fn powf(self, exponent: f64) -> Self {
        f64::powf(self, exponent)
    }

    fn pow(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }

    fn sin(self) -> Self {
        f64::sin(self)
    }

    fn cos(self) -> Self {
        f64::cos(self)
    }

    fn tan(self) -> Self {
        f64::tan(self)
    }

    fn asin(self) -> Self {
        f64::asin(self)
    }

    fn acos(self) -> Self {
        f64::acos(self)
    }

    fn atan(self) -> Self {
        f64::atan(self)
    }

    fn sinh(self) -> Self {
        f64::sinh(self)
    }

    fn cosh(self) -> Self {
        f64::cosh(self)
    }

    fn tanh(self) -> Self {
        f64::tanh(self)
    }

    fn atan2(self, other: Self) -> Self {
        f64::atan2(self, other)
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn floor(self) -> Self {
        f64::floor(self)
    }

    fn ceil(self) -> Self {
        f64::ceil(self)
    }
}

impl Scalar for Var {
    fn value(&self) -> f64 {
        self.val()
    }

    fn exp(self) -> Self {
        Var::exp(self)
    }

    fn ln(self) -> Self {
        Var::ln(self)
    }

    fn log10(self) -> Self {
        Var::log10(self)
    }

    fn sqrt(self) -> Self {
        Var::sqrt(self)
    }

    fn recip(self) -> Self {
        1.0 / self
    }

    fn powf(self, exponent: f64) -> Self {
        Var::powf(self, exponent)
    }

    fn pow(self, exponent: Self) -> Self {
        Var::pow(self, exponent)
    }

    fn sin(self) -> Self {
        Var::sin(self)
    }

    fn cos(self) -> Self {
        Var::cos(self)
    }

    fn tan(self) -> Self {
        Var::tan(self)
    }

    fn asin(self) -> Self {
        Var::asin(self)
    }

    fn acos(self) -> Self {
        Var::acos(self)
    }

    fn atan(self) -> Self {
        Var::atan(self)
    }

    fn sinh(self) -> Self {
        Var::sinh(self)
    }

    fn cosh(self) -> Self {
        Var::cosh(self)
    }

    fn tanh(self) -> Self {
        Var::tanh(self)
    }

    fn atan2(self, other: Self) -> Self {
        Var::atan2(self, other)
    }

    fn abs(self) -> Self {
        Var::abs(self)
    }

    fn floor(self) -> Self {
        Var::floor(self)
    }

    fn ceil(self) -> Self {
        Var::ceil(self)
    }
}

impl<T: Scalar> Scalar for Fvar<T> {
    fn value(&self) -> f64 {
        self.val.value()
    }

    fn exp(self) -> Self {
        Fvar::exp(self)
    }

    fn ln(self) -> Self {
        Fvar::ln(self)
    }

    fn log10(self) -> Self {
        Fvar::log10(self)
    }

    fn sqrt(self) -> Self {
        Fvar::sqrt(self)
    }

    fn recip(self) -> Self {
        Fvar::recip(self)
    }

    fn powf(self, exponent: f64) -> Self {
        Fvar::powf(self, exponent)
    }

    fn pow(self, exponent: Self) -> Self {
        Fvar::pow(self, exponent)
    }

    fn sin(self) -> Self {
        Fvar::sin(self)
    }

    fn cos(self) -> Self {
        Fvar::cos(self)
    }

    fn tan(self) -> Self {
        Fvar::tan(self)
    }

    fn asin(self) -> Self {
        Fvar::asin(self)
    }

    fn acos(self) -> Self {
        Fvar::acos(self)
    }

    fn atan(self) -> Self {
        Fvar::atan(self)
    }

    fn sinh(self) -> Self {
        Fvar::sinh(self)
    }

    fn cosh(self) -> Self {
        Fvar::cosh(self)
    }

    fn tanh(self) -> Self {
        Fvar::tanh(self)
    }

    fn atan2(self, other: Self) -> Self {
        Fvar::atan2(self, other)
    }

    fn abs(self) -> Self {
        Fvar::abs(self)
    }

    fn floor(self) -> Self {
        Fvar::floor(self)
    }

    fn ceil(self) -> Self {
        Fvar::ceil(self)
    }
}
