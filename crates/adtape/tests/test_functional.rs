//! Integration tests for the functional drivers.
//!
//! Every driver is compared against central finite differences at random
//! points, and the reverse-mode drivers are checked to leave the tape as they
//! found it.

use adtape::finite_diff::{finite_diff_gradient, finite_diff_hessian};
use adtape::functional::{
    fwd_gradient, fwd_hessian, fwd_hessian_times_vector, fwd_jacobian, grad_tr_mat_times_hessian,
    gradient, hessian, hessian_times_vector, jacobian, partial_derivative, try_gradient,
};
use adtape::rev::{Var, tape_len};
use adtape::{AdError, Fvar, Scalar};
use approx::assert_relative_eq;
use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A smooth test function, generic over the scalar type.
fn rosen_like<T: Scalar>(x: &[T]) -> T {
    let a = x[1] - x[0] * x[0];
    let b = x[0] * -1.0 + 1.0;
    a * a * 10.0 + b * b + (x[0] * x[1]).sin() * x[1].exp()
}

fn random_point(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.random_range(-0.8..0.8)).collect()
}

#[test]
fn test_gradient_against_finite_differences() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..10 {
        let x = random_point(&mut rng, 2);
        let (fx, g) = gradient(|v| rosen_like(v), &x);
        let (fd_fx, fd_g) = finite_diff_gradient(|p| rosen_like(p), &x, 1e-6);
        assert_relative_eq!(fx, fd_fx, epsilon = 1e-12);
        for k in 0..2 {
            assert_relative_eq!(g[k], fd_g[k], epsilon = 1e-5);
        }

        let (ffx, fg) = fwd_gradient(|v: &[Fvar<f64>]| rosen_like(v), &x);
        assert_relative_eq!(ffx, fx, epsilon = 1e-12);
        for k in 0..2 {
            assert_relative_eq!(fg[k], g[k], epsilon = 1e-12);
        }
    }
}

#[test]
fn test_partial_derivative_matches_gradient() {
    let x = [0.3, -0.4];
    let (_, g) = gradient(|v| rosen_like(v), &x);
    for n in 0..2 {
        let (_, d) = partial_derivative(|v: &[Fvar<f64>]| rosen_like(v), &x, n).unwrap();
        assert_relative_eq!(d, g[n], epsilon = 1e-12);
    }
}

#[test]
fn test_try_gradient_propagates_error() {
    let len = tape_len();
    let result = try_gradient(
        |v| {
            if v[0] < 0.0 {
                Err(AdError::Domain {
                    function: "sqrt_checked",
                    name: "x",
                    value: v[0].val(),
                    constraint: "nonnegative",
                })
            } else {
                Ok(v[0].sqrt())
            }
        },
        &[-1.0],
    );
    assert!(matches!(result, Err(AdError::Domain { .. })));
    assert_eq!(tape_len(), len);

    let (fx, g) = try_gradient(|v| Ok(v[0].sqrt()), &[4.0]).unwrap();
    assert_eq!(fx, 2.0);
    assert_eq!(g, vec![0.25]);
}

#[test]
fn test_jacobians_against_finite_differences() {
    let x = [0.5, -0.25, 1.5];
    let (values, jac) = jacobian(
        |v| vec![v[0] * v[1] * v[2], v[0].sin() + v[2], (v[1] * v[2]).exp()],
        &x,
    );
    let (fvalues, fjac) = fwd_jacobian(
        |v: &[Fvar<f64>]| vec![v[0] * v[1] * v[2], v[0].sin() + v[2], (v[1] * v[2]).exp()],
        &x,
    );

    let outputs: [fn(&[f64]) -> f64; 3] = [
        |p| p[0] * p[1] * p[2],
        |p| p[0].sin() + p[2],
        |p| (p[1] * p[2]).exp(),
    ];
    for (i, out) in outputs.iter().enumerate() {
        let (fd_val, fd_row) = finite_diff_gradient(out, &x, 1e-6);
        assert_relative_eq!(values[i], fd_val, epsilon = 1e-14);
        assert_relative_eq!(fvalues[i], fd_val, epsilon = 1e-14);
        for k in 0..3 {
            assert_relative_eq!(jac[(i, k)], fd_row[k], epsilon = 1e-6);
            assert_relative_eq!(fjac[(i, k)], jac[(i, k)], epsilon = 1e-14);
        }
    }
}

#[test]
fn test_hessians_against_finite_differences() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..5 {
        let x = random_point(&mut rng, 2);
        let (fx, g, h) = hessian(|v| rosen_like(v), &x);
        let (ffx, fg, fh) = fwd_hessian(|v| rosen_like(v), &x);
        let fd_h = finite_diff_hessian(|p| rosen_like(p), &x, 1e-4);

        assert_relative_eq!(fx, ffx, epsilon = 1e-12);
        for i in 0..2 {
            assert_relative_eq!(g[i], fg[i], epsilon = 1e-12);
            for j in 0..2 {
                assert_relative_eq!(h[(i, j)], fh[(i, j)], epsilon = 1e-10);
                assert_relative_eq!(h[(i, j)], fd_h[(i, j)], epsilon = 1e-4);
            }
        }
        assert_relative_eq!(h[(0, 1)], h[(1, 0)], epsilon = 1e-12);
    }
}

#[test]
fn test_hessian_times_vector_matches_hessian() {
    let x = [0.2, 0.7];
    let v = [1.5, -0.5];
    let (_, _, h) = hessian(|p| rosen_like(p), &x);
    let (_, hv) = hessian_times_vector(|p| rosen_like(p), &x, &v).unwrap();
    let (_, fhv) = fwd_hessian_times_vector(|p| rosen_like(p), &x, &v).unwrap();
    for i in 0..2 {
        let expected = h[(i, 0)] * v[0] + h[(i, 1)] * v[1];
        assert_relative_eq!(hv[i], expected, epsilon = 1e-10);
        assert_relative_eq!(fhv[i], expected, epsilon = 1e-10);
    }
}

#[test]
fn test_grad_tr_mat_times_hessian_against_finite_differences() {
    let x = [0.3, 0.1];
    let m = Mat::from_fn(2, 2, |i, j| [[1.0, 0.5], [-0.25, 2.0]][i][j]);
    let g = grad_tr_mat_times_hessian(|p| rosen_like(p), &x, m.as_ref()).unwrap();

    // tr(M H(x)) evaluated through the forward-over-reverse Hessian.
    let tr_mh = |p: &[f64]| {
        let (_, _, h) = hessian(|v| rosen_like(v), p);
        let mut tr = 0.0;
        for i in 0..2 {
            for k in 0..2 {
                tr += m[(i, k)] * h[(k, i)];
            }
        }
        tr
    };
    let (_, fd) = finite_diff_gradient(tr_mh, &x, 1e-5);
    for k in 0..2 {
        assert_relative_eq!(g[k], fd[k], epsilon = 1e-5);
    }
}

#[test]
fn test_drivers_inside_outer_computation() {
    // Drivers must not disturb a live outer graph.
    let a = Var::new(2.0);
    let outer = a * a * a;
    let before = outer.grad(&[a]);
    let len = tape_len();

    let _ = gradient(|v| rosen_like(v), &[0.1, 0.2]);
    let _ = hessian(|v| rosen_like(v), &[0.1, 0.2]);
    let _ = jacobian(|v| vec![v[0] * v[1]], &[0.1, 0.2]);

    assert_eq!(tape_len(), len);
    assert_eq!(a.adj(), before[0]);
    assert_eq!(outer.grad(&[a]), before);
}

#[test]
fn test_empty_input() {
    let (fx, g) = gradient(|_| Var::new(3.0), &[]);
    assert_eq!(fx, 3.0);
    assert!(g.is_empty());

    let (fx, g, h) = hessian(|_| Fvar::new(Var::new(1.5), Var::new(0.0)), &[]);
    assert_eq!(fx, 1.5);
    assert!(g.is_empty());
    assert_eq!(h.nrows(), 0);
}
