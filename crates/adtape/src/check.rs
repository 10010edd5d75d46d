//! Argument validation for primitives built on top of the tape.
//!
//! Checks run on values before any node is recorded, so a rejected call
//! leaves the tape untouched.

use crate::error::AdError;
use crate::scalar::Scalar;

fn domain(
    function: &'static str,
    name: &'static str,
    value: f64,
    constraint: &'static str,
) -> AdError {
    AdError::Domain {
        function,
        name,
        value,
        constraint,
    }
}

pub fn check_not_nan<T: Scalar>(
    function: &'static str,
    name: &'static str,
    x: T,
) -> Result<(), AdError> {
    let value = x.value();
    if value.is_nan() {
        return Err(domain(function, name, value, "not nan"));
    }
    Ok(())
}

pub fn check_finite<T: Scalar>(
    function: &'static str,
    name: &'static str,
    x: T,
) -> Result<(), AdError> {
    let value = x.value();
    if !value.is_finite() {
        return Err(domain(function, name, value, "finite"));
    }
    Ok(())
}

/// Fails for zero, negative values and NaN.
pub fn check_positive<T: Scalar>(
    function: &'static str,
    name: &'static str,
    x: T,
) -> Result<(), AdError> {
    let value = x.value();
    if !(value > 0.0) {
        return Err(domain(function, name, value, "positive"));
    }
    Ok(())
}

/// Fails for negative values and NaN.
pub fn check_nonnegative<T: Scalar>(
    function: &'static str,
    name: &'static str,
    x: T,
) -> Result<(), AdError> {
    let value = x.value();
    if !(value >= 0.0) {
        return Err(domain(function, name, value, "nonnegative"));
    }
    Ok(())
}

pub fn check_size_match(
    function: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), AdError> {
    if expected != actual {
        return Err(AdError::SizeMismatch {
            function,
            expected,
            actual,
        });
    }
    Ok(())
}
