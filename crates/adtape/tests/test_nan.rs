//! Integration tests for non-finite values.
//!
//! NaN and infinities are ordinary values: they propagate through the
//! forward pass and the reverse sweep without raising errors.

use adtape::Fvar;
use adtape::rev::{
    Var, dot_product, dot_product_const, dot_self, precomputed_gradients, recover_memory, sum,
};

#[test]
fn test_divide_by_zero() {
    let x = Var::new(1.0);
    let y = Var::new(0.0);
    let f = x / y;
    assert!(f.is_infinite());
    assert_eq!(f.val(), f64::INFINITY);
    assert_eq!(f.grad(&[x, y]), vec![f64::INFINITY, f64::NEG_INFINITY]);

    // A fresh operand keeps the `0 * inf` from the swept `x / y` node out.
    let x2 = Var::new(1.0);
    let g = x2 / 0.0;
    assert_eq!(g.grad(&[x2]), vec![f64::INFINITY]);
}

#[test]
fn test_nan_operand_poisons_adjoints() {
    let x = Var::new(f64::NAN);
    let y = Var::new(2.0);
    let f = x * y + y;
    assert!(f.is_nan());
    let g = f.grad(&[x, y]);
    assert!(g[0].is_nan());
    assert!(g[1].is_nan());
}

#[test]
fn test_nan_through_vector_node() {
    let x = Var::new(1.0);
    let y = Var::new(f64::NAN);
    let s = sum(&[x, y, x]);
    let g = s.grad(&[x, y]);
    assert!(g[0].is_nan());
    assert!(g[1].is_nan());
}

#[test]
fn test_log_of_negative() {
    let x = Var::new(-1.0);
    let y = Var::new(3.0);
    let l = x.ln();
    assert!(l.is_nan());
    let f = l * y;
    let g = f.grad(&[x, y]);
    assert!(g[0].is_nan());
    assert!(g[1].is_nan());
}

#[test]
fn test_abs_at_nan() {
    let x = Var::new(f64::NAN);
    let f = x.abs();
    assert!(f.is_nan());
    assert!(f.grad(&[x])[0].is_nan());
}

#[test]
fn test_zero_weighted_infinite_partial_is_nan() {
    // sqrt has an infinite derivative at 0; a zero weight does not cancel it.
    let x = Var::new(0.0);
    let y = Var::new(2.0);
    let f = y * 3.0 + 0.0 * x.sqrt();
    assert_eq!(f.val(), 6.0);
    let g = f.grad(&[x, y]);
    assert!(g[0].is_nan());
    assert_eq!(g[1], 3.0);
}

#[test]
fn test_unused_branch_is_still_swept() {
    let x = Var::new(4.0);
    let y = Var::new(2.0);
    let _unused = x.sqrt().ln();
    let f = y * y;
    assert_eq!(f.grad(&[x, y]), vec![0.0, 4.0]);

    let z = Var::new(0.0);
    let _infinite = z.sqrt().ln();
    let f = y * y;
    let g = f.grad(&[z, y]);
    assert!(g[0].is_nan());
    assert_eq!(g[1], 4.0);
}

#[test]
fn test_nan_reaches_operand_through_zero_partial() {
    let x = Var::new(-1.0);
    let y = x.ln();
    let m = y.powf(0.0);
    assert!(m.is_nan());
    let f = m.floor() + Var::new(2.0);
    assert!(f.is_nan());
    let g = f.grad(&[x, y]);
    assert!(g[0].is_nan());
    assert!(g[1].is_nan());
}

fn assert_all_nan(name: &str, f: Var, operands: &[Var]) {
    assert!(f.is_nan(), "{name}: value {}", f.val());
    for (i, g) in f.grad(operands).into_iter().enumerate() {
        assert!(g.is_nan(), "{name}: adjoint {i} is {g}");
    }
    recover_memory().unwrap();
}

#[test]
fn test_every_primitive_propagates_nan() {
    let unary: [(&str, fn(Var) -> Var); 17] = [
        ("neg", |x| -x),
        ("exp", Var::exp),
        ("ln", Var::ln),
        ("log10", Var::log10),
        ("sqrt", Var::sqrt),
        ("sin", Var::sin),
        ("cos", Var::cos),
        ("tan", Var::tan),
        ("asin", Var::asin),
        ("acos", Var::acos),
        ("atan", Var::atan),
        ("sinh", Var::sinh),
        ("cosh", Var::cosh),
        ("tanh", Var::tanh),
        ("abs", Var::abs),
        ("floor", Var::floor),
        ("ceil", Var::ceil),
    ];
    for (name, op) in unary {
        let x = Var::new(f64::NAN);
        assert_all_nan(name, op(x), &[x]);
    }

    let binary: [(&str, fn(Var, Var) -> Var); 7] = [
        ("add", |a, b| a + b),
        ("sub", |a, b| a - b),
        ("mul", |a, b| a * b),
        ("div", |a, b| a / b),
        ("pow", Var::pow),
        ("atan2", Var::atan2),
        ("rem", |a, b| a % b),
    ];
    for (name, op) in binary {
        for (av, bv) in [(f64::NAN, 1.5), (1.0, f64::NAN)] {
            let (a, b) = (Var::new(av), Var::new(bv));
            assert_all_nan(name, op(a, b), &[a, b]);
        }
    }

    let const_rhs: [(&str, fn(Var, f64) -> Var); 7] = [
        ("add", |a, c| a + c),
        ("sub", |a, c| a - c),
        ("mul", |a, c| a * c),
        ("div", |a, c| a / c),
        ("powf", Var::powf),
        ("atan2_f64", Var::atan2_f64),
        ("rem", |a, c| a % c),
    ];
    for (name, op) in const_rhs {
        for (av, c) in [(f64::NAN, 1.5), (1.5, f64::NAN)] {
            let a = Var::new(av);
            assert_all_nan(name, op(a, c), &[a]);
        }
    }

    let const_lhs: [(&str, fn(f64, Var) -> Var); 7] = [
        ("add", |c, b| c + b),
        ("sub", |c, b| c - b),
        ("mul", |c, b| c * b),
        ("div", |c, b| c / b),
        ("pow_dv", Var::pow_dv),
        ("atan2_dv", Var::atan2_dv),
        ("rem", |c, b| c % b),
    ];
    for (name, op) in const_lhs {
        for (c, bv) in [(1.5, f64::NAN), (f64::NAN, 1.5)] {
            let b = Var::new(bv);
            assert_all_nan(name, op(c, b), &[b]);
        }
    }

    // Exponents where `powf` alone would return 1.
    let a = Var::new(f64::NAN);
    assert_all_nan("powf zero", a.powf(0.0), &[a]);
    let b = Var::new(f64::NAN);
    assert_all_nan("pow_dv one", Var::pow_dv(1.0, b), &[b]);
}

#[test]
fn test_every_vector_primitive_propagates_nan() {
    let xs = || [Var::new(f64::NAN), Var::new(2.0)];

    let a = xs();
    assert_all_nan("sum", sum(&a), &a);

    let (a, b) = (xs(), [Var::new(3.0), Var::new(4.0)]);
    let operands = [a[0], a[1], b[0], b[1]];
    assert_all_nan("dot_product", dot_product(&a, &b).unwrap(), &operands);

    let a = xs();
    assert_all_nan("dot_self", dot_self(&a), &a);

    let a = xs();
    assert_all_nan("dot_product_const", dot_product_const(&a, &[0.5, 0.0]).unwrap(), &a);

    let a = [Var::new(1.0), Var::new(2.0)];
    let weighted = dot_product_const(&a, &[f64::NAN, 1.0]).unwrap();
    assert_all_nan("dot_product_const weights", weighted, &a);

    let a = xs();
    let value = a[0].val() * a[1].val();
    let f = precomputed_gradients(value, &a, &[a[1].val(), a[0].val()]).unwrap();
    assert_all_nan("precomputed_gradients", f, &a);
}

#[test]
fn test_fvar_propagates_nan() {
    let y = Fvar::variable(-4.0_f64).sqrt();
    assert!(y.val.is_nan());
    assert!(y.d.is_nan());

    let z = Fvar::variable(f64::NAN).abs();
    assert!(z.val.is_nan());
    assert!(z.d.is_nan());

    let w = Fvar::variable(1.0_f64) / 0.0;
    assert_eq!(w.val, f64::INFINITY);
    assert_eq!(w.d, f64::INFINITY);
}
