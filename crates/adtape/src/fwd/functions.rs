//! Elementary functions on [`Fvar`].
//!
//! Each function returns `f(val)` with tangent `f'(val) * d`. NaN and
//! infinities follow ordinary floating-point arithmetic.

use std::f64::consts::LN_10;

use super::fvar::Fvar;
use crate::scalar::Scalar;

impl<T: Scalar> Fvar<T> {
    pub fn exp(self) -> Self {
        let e = self.val.exp();
        Fvar::new(e, self.d * e)
    }

    /// Natural logarithm.
    pub fn ln(self) -> Self {
        Fvar::new(self.val.ln(), self.d / self.val)
    }

    pub fn log10(self) -> Self {
        Fvar::new(self.val.log10(), self.d / (self.val * LN_10))
    }

    pub fn sqrt(self) -> Self {
        let s = self.val.sqrt();
        Fvar::new(s, self.d / (s * 2.0))
    }

    pub fn recip(self) -> Self {
        let r = self.val.recip();
        Fvar::new(r, -(self.d * r * r))
    }

    pub fn square(self) -> Self {
        Fvar::new(self.val * self.val, self.d * self.val * 2.0)
    }

    /// `self` raised to a constant power.
    pub fn powf(self, exponent: f64) -> Self {
        Fvar::new(
            self.val.powf(exponent),
            self.d * self.val.powf(exponent - 1.0) * exponent,
        )
    }

    /// `self` raised to a differentiable power.
    pub fn pow(self, exponent: Self) -> Self {
        let p = self.val.pow(exponent.val);
        Fvar::new(
            p,
            (exponent.d * self.val.ln() + exponent.val * self.d / self.val) * p,
        )
    }

    pub fn sin(self) -> Self {
        Fvar::new(self.val.sin(), self.d * self.val.cos())
    }

    pub fn cos(self) -> Self {
        Fvar::new(self.val.cos(), -(self.d * self.val.sin()))
    }

    pub fn tan(self) -> Self {
        let t = self.val.tan();
        Fvar::new(t, self.d * (t * t + 1.0))
    }

    pub fn asin(self) -> Self {
        Fvar::new(
            self.val.asin(),
            self.d / (-(self.val * self.val) + 1.0).sqrt(),
        )
    }

    pub fn acos(self) -> Self {
        Fvar::new(
            self.val.acos(),
            -(self.d / (-(self.val * self.val) + 1.0).sqrt()),
        )
    }

    pub fn atan(self) -> Self {
        Fvar::new(self.val.atan(), self.d / (self.val * self.val + 1.0))
    }

    pub fn sinh(self) -> Self {
        Fvar::new(self.val.sinh(), self.d * self.val.cosh())
    }

    pub fn cosh(self) -> Self {
        Fvar::new(self.val.cosh(), self.d * self.val.sinh())
    }

    pub fn tanh(self) -> Self {
        let t = self.val.tanh();
        Fvar::new(t, self.d * (-(t * t) + 1.0))
    }

    /// Four-quadrant arctangent of `self / other`.
    pub fn atan2(self, other: Self) -> Self {
        let denom = self.val * self.val + other.val * other.val;
        Fvar::new(
            self.val.atan2(other.val),
            (self.d * other.val - self.val * other.d) / denom,
        )
    }

    /// Absolute value. The tangent is zero at 0 and NaN at NaN.
    pub fn abs(self) -> Self {
        let v = self.val.value();
        if v > 0.0 {
            self
        } else if v < 0.0 {
            -self
        } else if v == 0.0 {
            Fvar::constant(self.val)
        } else {
            Fvar::new(self.val.abs(), T::from(f64::NAN))
        }
    }

    pub fn floor(self) -> Self {
        Fvar::constant(self.val.floor())
    }

    pub fn ceil(self) -> Self {
        Fvar::constant(self.val.ceil())
    }

    pub fn is_nan(&self) -> bool {
        self.val.value().is_nan()
    }
}
