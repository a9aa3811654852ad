//! Parallel expression evaluation
//!
//! Batch evaluation of a scalar expression over point slices, using
//! rayon for CPU parallelism. Expressions are immutable and shared
//! across worker threads without locking.
//!
//! Author: Moroya Sakamoto

use crate::eval::{evaluate, EvalError, Value};
use crate::expr::Expr;
use glam::Vec3;
use rayon::prelude::*;
use std::collections::HashMap;

fn eval_at(expr: &Expr, var: &str, point: Vec3) -> Result<f32, EvalError> {
    let mut bindings = HashMap::with_capacity(1);
    bindings.insert(var.to_string(), Value::Vec3(point));
    evaluate(expr, &bindings)?.as_float()
}

/// Evaluate a scalar expression at multiple points (single-threaded)
///
/// `var` names the vec3 binding each point is substituted for.
pub fn eval_batch(expr: &Expr, var: &str, points: &[Vec3]) -> Result<Vec<f32>, EvalError> {
    points.iter().map(|&p| eval_at(expr, var, p)).collect()
}

/// Evaluate a scalar expression at multiple points (parallel)
///
/// Uses rayon for parallel iteration over points; the first error
/// encountered aborts the batch.
pub fn eval_batch_parallel(
    expr: &Expr,
    var: &str,
    points: &[Vec3],
) -> Result<Vec<f32>, EvalError> {
    points.par_iter().map(|&p| eval_at(expr, var, p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_expression;

    fn unit_sphere() -> Expr {
        let mut env = HashMap::new();
        env.insert("p".to_string(), Expr::point_var("p"));
        parse_expression("vlength(p) - 1.0", &env).unwrap()
    }

    #[test]
    fn test_batch_matches_single() {
        let e = unit_sphere();
        let points: Vec<Vec3> = (0..64)
            .map(|i| Vec3::new(i as f32 * 0.1, 0.0, 0.0))
            .collect();
        let serial = eval_batch(&e, "p", &points).unwrap();
        let parallel = eval_batch_parallel(&e, "p", &points).unwrap();
        assert_eq!(serial.len(), parallel.len());
        for (a, b) in serial.iter().zip(parallel.iter()) {
            assert_eq!(a, b);
        }
        assert!((serial[0] - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_batch_propagates_errors() {
        let e = unit_sphere();
        // Wrong variable name: every point fails to bind
        let err = eval_batch(&e, "q", &[Vec3::ZERO]).unwrap_err();
        assert_eq!(
            err,
            EvalError::UnboundVariable {
                name: "p".to_string()
            }
        );
    }
}
