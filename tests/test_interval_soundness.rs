//! Integration tests: interval evaluation soundness
//!
//! The interval evaluator must bound every value the scalar evaluator
//! can produce over a box of inputs. These tests sweep boxes with a
//! dense sample grid and check containment.
//!
//! Author: Moroya Sakamoto

mod common;

use alice_expr::prelude::*;
use common::*;
use std::collections::HashMap;

/// Sample a formula over a grid inside [lo, hi] and assert every
/// sampled value lies inside the formula's interval bound
fn assert_sound_over_box(text: &str, lo: Vec3, hi: Vec3, steps: usize) {
    let expr = parse(text);

    let mut bindings = HashMap::new();
    bindings.insert(
        "p".to_string(),
        IntervalValue::Vec3(Vec3Interval::from_bounds(lo, hi)),
    );
    let bound = match eval_expr_interval(&expr, &bindings).unwrap() {
        IntervalValue::Scalar(iv) => iv,
        other => panic!("expected scalar interval, got {:?}", other),
    };

    let span = hi - lo;
    for ix in 0..=steps {
        for iy in 0..=steps {
            for iz in 0..=steps {
                let t = Vec3::new(
                    ix as f32 / steps as f32,
                    iy as f32 / steps as f32,
                    iz as f32 / steps as f32,
                );
                let p = lo + span * t;
                let v = eval_scalar(&expr, p);
                assert!(
                    bound.lo <= v + 1e-4 && v - 1e-4 <= bound.hi,
                    "{} = {} at {:?} escapes bound [{}, {}]",
                    text,
                    v,
                    p,
                    bound.lo,
                    bound.hi
                );
            }
        }
    }
}

// ============================================================================
// Soundness sweeps
// ============================================================================

#[test]
fn sphere_bound_contains_samples() {
    assert_sound_over_box(
        "vlength(p) - 1.0",
        Vec3::new(-1.5, -1.5, -1.5),
        Vec3::new(1.5, 1.5, 1.5),
        8,
    );
}

#[test]
fn union_bound_contains_samples() {
    assert_sound_over_box(
        "min(vlength(p - vec3(1, 0, 0)) - 0.5, vlength(p + vec3(1, 0, 0)) - 0.5)",
        Vec3::new(-2.0, -1.0, -1.0),
        Vec3::new(2.0, 1.0, 1.0),
        8,
    );
}

#[test]
fn trig_displacement_bound_contains_samples() {
    assert_sound_over_box(
        "vlength(p) - 1.0 + 0.2 * sin(5 * dot(p, vec3(1, 1, 0)))",
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, 1.0),
        8,
    );
}

#[test]
fn mixed_arithmetic_bound_contains_samples() {
    assert_sound_over_box(
        "abs(dot(p, vec3(1, 2, 3))) - sqrt(abs(dot(p, p)) + 1.0)",
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.75, 0.75, 0.75),
        8,
    );
}

#[test]
fn mod_and_step_bound_contains_samples() {
    assert_sound_over_box(
        "step(0.5, mod(dot(p, vec3(1, 0, 0)) + 10.0, 2.0))",
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, 1.0),
        8,
    );
}

// ============================================================================
// Pruning behavior
// ============================================================================

#[test]
fn far_box_is_provably_positive() {
    let expr = parse("vlength(p) - 1.0");
    let mut bindings = HashMap::new();
    bindings.insert(
        "p".to_string(),
        IntervalValue::Vec3(Vec3Interval::from_bounds(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(6.0, 6.0, 6.0),
        )),
    );
    match eval_expr_interval(&expr, &bindings).unwrap() {
        IntervalValue::Scalar(iv) => assert!(iv.is_positive()),
        other => panic!("expected scalar interval, got {:?}", other),
    }
}

#[test]
fn interior_box_is_provably_negative() {
    let expr = parse("vlength(p) - 1.0");
    let mut bindings = HashMap::new();
    bindings.insert(
        "p".to_string(),
        IntervalValue::Vec3(Vec3Interval::from_bounds(
            Vec3::new(-0.1, -0.1, -0.1),
            Vec3::new(0.1, 0.1, 0.1),
        )),
    );
    match eval_expr_interval(&expr, &bindings).unwrap() {
        IntervalValue::Scalar(iv) => assert!(iv.is_negative()),
        other => panic!("expected scalar interval, got {:?}", other),
    }
}

#[test]
fn straddling_box_contains_zero() {
    let expr = parse("vlength(p) - 1.0");
    let mut bindings = HashMap::new();
    bindings.insert(
        "p".to_string(),
        IntervalValue::Vec3(Vec3Interval::from_bounds(
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(1.5, 0.5, 0.5),
        )),
    );
    match eval_expr_interval(&expr, &bindings).unwrap() {
        IntervalValue::Scalar(iv) => assert!(iv.contains(0.0)),
        other => panic!("expected scalar interval, got {:?}", other),
    }
}

#[test]
fn four_corner_multiplication() {
    let a = Interval::new(-2.0, 3.0);
    let b = Interval::new(-1.0, 4.0);
    let prod = a * b;
    assert_eq!(prod.lo, -8.0);
    assert_eq!(prod.hi, 12.0);
}

#[test]
fn unbound_interval_variable_is_an_error() {
    let expr = parse("vlength(p) - 1.0");
    let bindings = HashMap::new();
    assert!(eval_expr_interval(&expr, &bindings).is_err());
}
