//! Direct expression evaluation
//!
//! Recursively computes concrete values for IR trees given a binding
//! environment. Used for testing, constant probing, and CPU-side
//! sampling of compiled distance fields.
//!
//! Division by exact zero is an error, never silently folded to zero
//! or infinity; the same policy is enforced at construction time for
//! literal zero divisors.
//!
//! Author: Moroya Sakamoto

pub mod parallel;

pub use parallel::{eval_batch, eval_batch_parallel};

use crate::expr::Expr;
use glam::Vec3;
use std::collections::HashMap;
use thiserror::Error;

/// Evaluation-time errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A `Var` name was absent from the bindings
    #[error("unbound variable `{name}`")]
    UnboundVariable {
        /// The missing variable name
        name: String,
    },

    /// Division by exact zero
    #[error("division by zero")]
    DivisionByZero,

    /// A binding carried a value of the wrong type for the operator
    #[error("type error in `{expected}`: got {found}")]
    Type {
        /// Operator or expected type description
        expected: &'static str,
        /// Actual value kind
        found: &'static str,
    },

    /// Texture samples cannot be evaluated on the CPU
    #[error("texture slot {slot} is not available for direct evaluation")]
    TextureUnavailable {
        /// The uniform slot of the sample
        slot: u32,
    },
}

/// Concrete result of evaluating an expression
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Scalar result
    Float(f32),
    /// Vector result
    Vec3(Vec3),
    /// Struct result, field order preserved
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Extract a scalar, or a type error
    pub fn as_float(&self) -> Result<f32, EvalError> {
        match self {
            Value::Float(v) => Ok(*v),
            other => Err(EvalError::Type {
                expected: "float",
                found: other.kind_name(),
            }),
        }
    }

    /// Extract a vector, or a type error
    pub fn as_vec3(&self) -> Result<Vec3, EvalError> {
        match self {
            Value::Vec3(v) => Ok(*v),
            other => Err(EvalError::Type {
                expected: "vec3",
                found: other.kind_name(),
            }),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Float(_) => "float",
            Value::Vec3(_) => "vec3",
            Value::Struct(_) => "struct",
        }
    }
}

/// GLSL-style floored modulo
#[inline(always)]
fn floor_mod(a: f32, b: f32) -> f32 {
    a - b * (a / b).floor()
}

/// Evaluate an expression tree at a single binding environment
///
/// Fails with [`EvalError::UnboundVariable`] for missing names and
/// [`EvalError::DivisionByZero`] for exact-zero divisors.
pub fn evaluate(expr: &Expr, bindings: &HashMap<String, Value>) -> Result<Value, EvalError> {
    use Value::{Float, Vec3 as V3};

    Ok(match expr {
        Expr::Const { value } => Float(*value),
        Expr::Var { name, .. } => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable { name: name.clone() })?,

        Expr::Add { a, b } => match (evaluate(a, bindings)?, evaluate(b, bindings)?) {
            (Float(a), Float(b)) => Float(a + b),
            (V3(a), V3(b)) => V3(a + b),
            (a, _) => return Err(bad_operand("+", &a)),
        },
        Expr::Sub { a, b } => match (evaluate(a, bindings)?, evaluate(b, bindings)?) {
            (Float(a), Float(b)) => Float(a - b),
            (V3(a), V3(b)) => V3(a - b),
            (a, _) => return Err(bad_operand("-", &a)),
        },
        Expr::Mul { a, b } => match (evaluate(a, bindings)?, evaluate(b, bindings)?) {
            (Float(a), Float(b)) => Float(a * b),
            (V3(a), V3(b)) => V3(a * b),
            (V3(a), Float(b)) | (Float(b), V3(a)) => V3(a * b),
            (a, _) => return Err(bad_operand("*", &a)),
        },
        Expr::Div { a, b } => match (evaluate(a, bindings)?, evaluate(b, bindings)?) {
            (Float(a), Float(b)) => {
                if b == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Float(a / b)
            }
            (V3(a), Float(b)) => {
                if b == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                V3(a / b)
            }
            (V3(a), V3(b)) => {
                if b.x == 0.0 || b.y == 0.0 || b.z == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                V3(a / b)
            }
            (a, _) => return Err(bad_operand("/", &a)),
        },
        Expr::Neg { a } => match evaluate(a, bindings)? {
            Float(a) => Float(-a),
            V3(a) => V3(-a),
            other => return Err(bad_operand("-", &other)),
        },
        Expr::Min { a, b } => match (evaluate(a, bindings)?, evaluate(b, bindings)?) {
            (Float(a), Float(b)) => Float(a.min(b)),
            (V3(a), V3(b)) => V3(a.min(b)),
            (a, _) => return Err(bad_operand("min", &a)),
        },
        Expr::Max { a, b } => match (evaluate(a, bindings)?, evaluate(b, bindings)?) {
            (Float(a), Float(b)) => Float(a.max(b)),
            (V3(a), V3(b)) => V3(a.max(b)),
            (a, _) => return Err(bad_operand("max", &a)),
        },
        Expr::Abs { a } => match evaluate(a, bindings)? {
            Float(a) => Float(a.abs()),
            V3(a) => V3(a.abs()),
            other => return Err(bad_operand("abs", &other)),
        },
        Expr::Sqrt { a } => Float(evaluate(a, bindings)?.as_float()?.sqrt()),
        Expr::Sin { a } => Float(evaluate(a, bindings)?.as_float()?.sin()),
        Expr::Cos { a } => Float(evaluate(a, bindings)?.as_float()?.cos()),
        Expr::Mix { a, b, t } => {
            let t = evaluate(t, bindings)?.as_float()?;
            match (evaluate(a, bindings)?, evaluate(b, bindings)?) {
                (Float(a), Float(b)) => Float(a * (1.0 - t) + b * t),
                (V3(a), V3(b)) => V3(a * (1.0 - t) + b * t),
                (a, _) => return Err(bad_operand("mix", &a)),
            }
        }
        Expr::Step { edge, x } => {
            let edge = evaluate(edge, bindings)?.as_float()?;
            let x = evaluate(x, bindings)?.as_float()?;
            Float(if x < edge { 0.0 } else { 1.0 })
        }
        Expr::Mod { a, b } => {
            let a = evaluate(a, bindings)?.as_float()?;
            let b = evaluate(b, bindings)?.as_float()?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Float(floor_mod(a, b))
        }
        Expr::VecConstruct { x, y, z } => V3(Vec3::new(
            evaluate(x, bindings)?.as_float()?,
            evaluate(y, bindings)?.as_float()?,
            evaluate(z, bindings)?.as_float()?,
        )),
        Expr::VecComponent { v, axis } => {
            let v = evaluate(v, bindings)?.as_vec3()?;
            Float(v[axis.index()])
        }
        Expr::StructConstruct { fields } => Value::Struct(
            fields
                .iter()
                .map(|(name, value)| Ok((name.clone(), evaluate(value, bindings)?)))
                .collect::<Result<Vec<_>, EvalError>>()?,
        ),
        Expr::FieldAccess { base, field } => match evaluate(base, bindings)? {
            Value::Struct(fields) => fields
                .into_iter()
                .find(|(name, _)| name == field)
                .map(|(_, value)| value)
                .ok_or(EvalError::Type {
                    expected: "struct field",
                    found: "struct",
                })?,
            other => return Err(bad_operand("field access", &other)),
        },
        Expr::TextureSample { slot, .. } => {
            return Err(EvalError::TextureUnavailable { slot: *slot })
        }
    })
}

fn bad_operand(op: &'static str, value: &Value) -> EvalError {
    EvalError::Type {
        expected: op,
        found: value.kind_name(),
    }
}

/// Central-difference gradient of a scalar expression with respect to
/// a vec3 variable
///
/// Useful for normal estimation on compiled distance fields.
pub fn gradient(
    expr: &Expr,
    bindings: &HashMap<String, Value>,
    var: &str,
    point: Vec3,
    eps: f32,
) -> Result<Vec3, EvalError> {
    let mut sample = |p: Vec3| -> Result<f32, EvalError> {
        let mut env = bindings.clone();
        env.insert(var.to_string(), Value::Vec3(p));
        evaluate(expr, &env)?.as_float()
    };
    let dx = sample(point + Vec3::X * eps)? - sample(point - Vec3::X * eps)?;
    let dy = sample(point + Vec3::Y * eps)? - sample(point - Vec3::Y * eps)?;
    let dz = sample(point + Vec3::Z * eps)? - sample(point - Vec3::Z * eps)?;
    Ok(Vec3::new(dx, dy, dz) / (2.0 * eps))
}
