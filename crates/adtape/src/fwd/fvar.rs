//! `Fvar<T>`: a value paired with its directional derivative.
//!
//! Forward mode propagates one tangent alongside each value. Given inputs
//! seeded with tangent `v`, the output tangent is the Jacobian-vector product
//! `J_f(x) * v`. The tangent type is generic, so `Fvar<Var>` gives
//! forward-over-reverse and `Fvar<Fvar<f64>>` gives second derivatives.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, Sub, SubAssign};

use crate::scalar::Scalar;

/// Dual number over `T`.
///
/// # Example
///
/// ```ignore
/// use adtape::fwd::Fvar;
///
/// let x = Fvar::new(3.0_f64, 1.0);
/// let y = x * x + 2.0 * x;
/// assert_eq!(y.val, 15.0);
/// assert_eq!(y.d, 8.0);
/// ```
#[derive(Clone, Copy, Default)]
pub struct Fvar<T> {
    /// Value.
    pub val: T,
    /// Tangent.
    pub d: T,
}

impl<T: Scalar> Fvar<T> {
    pub fn new(val: T, d: T) -> Self {
        Self { val, d }
    }

    /// A constant: zero tangent.
    pub fn constant(val: T) -> Self {
        Self { val, d: T::zero() }
    }

    /// An independent variable: unit tangent.
    pub fn variable(val: T) -> Self {
        Self { val, d: T::one() }
    }

    pub fn val(&self) -> T {
        self.val
    }

    pub fn tangent(&self) -> T {
        self.d
    }
}

impl<T: Scalar> From<f64> for Fvar<T> {
    fn from(value: f64) -> Self {
        Self::constant(T::from(value))
    }
}

impl<T: fmt::Debug> fmt::Debug for Fvar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fvar")
            .field("val", &self.val)
            .field("d", &self.d)
            .finish()
    }
}

impl<T: fmt::Display> fmt::Display for Fvar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}ε", self.val, self.d)
    }
}

impl<T: Scalar> Add for Fvar<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Fvar::new(self.val + rhs.val, self.d + rhs.d)
    }
}

impl<T: Scalar> Sub for Fvar<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Fvar::new(self.val - rhs.val, self.d - rhs.d)
    }
}

impl<T: Scalar> Mul for Fvar<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Fvar::new(self.val * rhs.val, self.d * rhs.val + self.val * rhs.d)
    }
}

impl<T: Scalar> Div for Fvar<T> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Fvar::new(
            self.val / rhs.val,
            (self.d * rhs.val - self.val * rhs.d) / (rhs.val * rhs.val),
        )
    }
}

impl<T: Scalar> Rem for Fvar<T> {
    type Output = Self;

    fn rem(self, rhs: Self) -> Self {
        let quotient = (self.val.value() / rhs.val.value()).trunc();
        Fvar::new(self.val % rhs.val, self.d - rhs.d * quotient)
    }
}

impl<T: Scalar> Neg for Fvar<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Fvar::new(-self.val, -self.d)
    }
}

impl<T: Scalar> Add<f64> for Fvar<T> {
    type Output = Self;

    fn add(self, rhs: f64) -> Self {
        Fvar::new(self.val + rhs, self.d)
    }
}

impl<T: Scalar> Sub<f64> for Fvar<T> {
    type Output = Self;

    fn sub(self, rhs: f64) -> Self {
        Fvar::new(self.val - rhs, self.d)
    }
}

impl<T: Scalar> Mul<f64> for Fvar<T> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Fvar::new(self.val * rhs, self.d * rhs)
    }
}

impl<T: Scalar> Div<f64> for Fvar<T> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Fvar::new(self.val / rhs, self.d / rhs)
    }
}

impl<T: Scalar> Rem<f64> for Fvar<T> {
    type Output = Self;

    fn rem(self, rhs: f64) -> Self {
        self % Fvar::from(rhs)
    }
}

impl<T: Scalar> Add<Fvar<T>> for f64 {
    type Output = Fvar<T>;

    fn add(self, rhs: Fvar<T>) -> Fvar<T> {
        rhs + self
    }
}

impl<T: Scalar> Sub<Fvar<T>> for f64 {
    type Output = Fvar<T>;

    fn sub(self, rhs: Fvar<T>) -> Fvar<T> {
        -rhs + self
    }
}

impl<T: Scalar> Mul<Fvar<T>> for f64 {
    type Output = Fvar<T>;

    fn mul(self, rhs: Fvar<T>) -> Fvar<T> {
        rhs * self
    }
}

impl<T: Scalar> Div<Fvar<T>> for f64 {
    type Output = Fvar<T>;

    fn div(self, rhs: Fvar<T>) -> Fvar<T> {
        rhs.recip() * self
    }
}

impl<T: Scalar> Rem<Fvar<T>> for f64 {
    type Output = Fvar<T>;

    fn rem(self, rhs: Fvar<T>) -> Fvar<T> {
        Fvar::from(self) % rhs
    }
}

impl<T: Scalar> AddAssign for Fvar<T> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T: Scalar> SubAssign for Fvar<T> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<T: Scalar> MulAssign for Fvar<T> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<T: Scalar> DivAssign for Fvar<T> {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl<T: Scalar> AddAssign<f64> for Fvar<T> {
    fn add_assign(&mut self, rhs: f64) {
        *self = *self + rhs;
    }
}

impl<T: Scalar> SubAssign<f64> for Fvar<T> {
    fn sub_assign(&mut self, rhs: f64) {
        *self = *self - rhs;
    }
}

impl<T: Scalar> MulAssign<f64> for Fvar<T> {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl<T: Scalar> DivAssign<f64> for Fvar<T> {
    fn div_assign(&mut self, rhs: f64) {
        *self = *self / rhs;
    }
}

// Comparisons look at the value only.
impl<T: Scalar> PartialEq for Fvar<T> {
    fn eq(&self, other: &Self) -> bool {
        self.val.value() == other.val.value()
    }
}

impl<T: Scalar> PartialEq<f64> for Fvar<T> {
    fn eq(&self, other: &f64) -> bool {
        self.val.value() == *other
    }
}

impl<T: Scalar> PartialOrd for Fvar<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.val.value().partial_cmp(&other.val.value())
    }
}

impl<T: Scalar> PartialOrd<f64> for Fvar<T> {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.val.value().partial_cmp(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_product_rule() {
        let x = Fvar::new(3.0_f64, 1.0);
        let y = x * x + 2.0 * x;
        assert_eq!(y.val, 15.0);
        assert_eq!(y.d, 8.0);
    }

    #[test]
    fn test_quotient_rule() {
        let x = Fvar::new(2.0_f64, 1.0);
        let y = (x + 1.0) / (x - 1.0);
        assert_eq!(y.val, 3.0);
        assert_eq!(y.d, -2.0);
    }

    #[test]
    fn test_constant_on_left() {
        let x = Fvar::new(4.0_f64, 1.0);
        let a = 1.0 - x;
        assert_eq!((a.val, a.d), (-3.0, -1.0));
        let b = 8.0 / x;
        assert_eq!((b.val, b.d), (2.0, -0.5));
    }

    #[test]
    fn test_divide_by_constant_scales_tangent() {
        let mut x = Fvar::new(6.0_f64, 3.0);
        x /= 3.0;
        assert_eq!((x.val, x.d), (2.0, 1.0));
    }

    #[test]
    fn test_rem() {
        let x = Fvar::new(7.5_f64, 1.0);
        let y = Fvar::new(2.0_f64, 1.0);
        let r = x % y;
        assert_eq!(r.val, 1.5);
        assert_eq!(r.d, 1.0 - 3.0);
        let r = x % 2.0;
        assert_eq!((r.val, r.d), (1.5, 1.0));
    }

    #[test]
    fn test_compound_assignment() {
        let x = Fvar::new(2.0_f64, 1.0);
        let mut y = x;
        y *= x;
        y += 1.0;
        y -= x;
        // y = x^2 + 1 - x
        assert_relative_eq!(y.val, 3.0);
        assert_relative_eq!(y.d, 3.0);
    }

    #[test]
    fn test_comparisons() {
        let a = Fvar::new(1.0_f64, 5.0);
        let b = Fvar::new(1.0_f64, -5.0);
        assert!(a == b);
        assert!(a < 2.0);
        assert!(Fvar::new(3.0_f64, 0.0) > a);
    }

    #[test]
    fn test_nested_second_derivative() {
        // f(x) = x^3, f'' = 6x
        let x: Fvar<Fvar<f64>> = Fvar::new(Fvar::new(2.0, 1.0), Fvar::new(1.0, 0.0));
        let y = x * x * x;
        assert_eq!(y.val.val, 8.0);
        assert_eq!(y.val.d, 12.0);
        assert_eq!(y.d.val, 12.0);
        assert_eq!(y.d.d, 12.0);
    }
}
