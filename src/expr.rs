//! Core IR types for ALICE-EXPR
//!
//! Defines the immutable expression tree that every other component
//! consumes: the parser builds it, the evaluators walk it, and the
//! code generator lowers it to WGSL.
//!
//! Expressions are statically typed (`float`, `vec3`, or a record of
//! the two) and validated at construction time: an ill-typed tree
//! cannot be built, so downstream passes never re-check arity.
//!
//! Author: Moroya Sakamoto

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Component axis for vector component access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X component (index 0)
    X,
    /// Y component (index 1)
    Y,
    /// Z component (index 2)
    Z,
}

impl Axis {
    /// Component index (0, 1, 2)
    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Shader-language component name ("x", "y", "z")
    #[inline(always)]
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// Static type of an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprType {
    /// 32-bit scalar
    Float,
    /// 3-component vector
    Vec3,
    /// Record of named scalar/vector fields, order-preserving
    Struct(Vec<(String, ExprType)>),
}

impl std::fmt::Display for ExprType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprType::Float => write!(f, "float"),
            ExprType::Vec3 => write!(f, "vec3"),
            ExprType::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Errors raised by expression constructors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// Binary operator applied to incompatible types
    #[error("type mismatch: cannot apply `{op}` to {lhs} and {rhs}")]
    TypeMismatch {
        /// Operator name
        op: &'static str,
        /// Left operand type
        lhs: String,
        /// Right operand type
        rhs: String,
    },

    /// Operator expects a scalar operand
    #[error("`{op}` expects a scalar operand, got {found}")]
    NotScalar {
        /// Operator name
        op: &'static str,
        /// Actual operand type
        found: String,
    },

    /// Operator expects a vector operand
    #[error("`{op}` expects a vector operand, got {found}")]
    NotVector {
        /// Operator name
        op: &'static str,
        /// Actual operand type
        found: String,
    },

    /// Struct construction with a repeated field name
    #[error("struct field `{0}` is duplicated")]
    DuplicateField(String),

    /// Struct fields must be scalar or vector
    #[error("struct field `{field}` must be scalar or vector, got {found}")]
    BadFieldType {
        /// Field name
        field: String,
        /// Actual field type
        found: String,
    },

    /// Field access on a non-struct or missing field
    #[error("no field `{field}` on {found}")]
    UnknownField {
        /// Requested field name
        field: String,
        /// Type the access was attempted on
        found: String,
    },

    /// Division by a constant zero divisor
    #[error("division by constant zero")]
    DivisionByZero,
}

/// Immutable expression tree node
///
/// Each variant is one IR kind. Children are shared via `Arc`, so
/// cloning an expression is cheap and subtrees may appear in several
/// parents. Trees are never mutated after construction; structural
/// de-duplication happens in the code generator, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Numeric literal
    Const {
        /// Literal value
        value: f32,
    },

    /// Named free variable, resolved by an evaluation or codegen context
    Var {
        /// Variable name
        name: String,
        /// Declared type
        ty: ExprType,
    },

    /// `a + b` (componentwise for vectors)
    Add {
        /// Left operand
        a: Arc<Expr>,
        /// Right operand
        b: Arc<Expr>,
    },

    /// `a - b` (componentwise for vectors)
    Sub {
        /// Left operand
        a: Arc<Expr>,
        /// Right operand
        b: Arc<Expr>,
    },

    /// `a * b` (componentwise; one operand may be scalar)
    Mul {
        /// Left operand
        a: Arc<Expr>,
        /// Right operand
        b: Arc<Expr>,
    },

    /// `a / b` (vector numerator may be scaled by a scalar divisor)
    Div {
        /// Numerator
        a: Arc<Expr>,
        /// Divisor
        b: Arc<Expr>,
    },

    /// `-a`
    Neg {
        /// Operand
        a: Arc<Expr>,
    },

    /// `min(a, b)` (componentwise for vectors)
    Min {
        /// Left operand
        a: Arc<Expr>,
        /// Right operand
        b: Arc<Expr>,
    },

    /// `max(a, b)` (componentwise for vectors)
    Max {
        /// Left operand
        a: Arc<Expr>,
        /// Right operand
        b: Arc<Expr>,
    },

    /// `abs(a)` (componentwise for vectors)
    Abs {
        /// Operand
        a: Arc<Expr>,
    },

    /// `sqrt(a)`, scalar only
    Sqrt {
        /// Operand
        a: Arc<Expr>,
    },

    /// `sin(a)`, scalar only
    Sin {
        /// Operand
        a: Arc<Expr>,
    },

    /// `cos(a)`, scalar only
    Cos {
        /// Operand
        a: Arc<Expr>,
    },

    /// Linear blend `a * (1 - t) + b * t` with scalar `t`
    Mix {
        /// Value at t = 0
        a: Arc<Expr>,
        /// Value at t = 1
        b: Arc<Expr>,
        /// Blend factor
        t: Arc<Expr>,
    },

    /// `step(edge, x)`: 0.0 where x < edge, else 1.0
    Step {
        /// Threshold
        edge: Arc<Expr>,
        /// Input
        x: Arc<Expr>,
    },

    /// Floored modulo `a - b * floor(a / b)`, scalar only
    Mod {
        /// Dividend
        a: Arc<Expr>,
        /// Divisor
        b: Arc<Expr>,
    },

    /// `vec3(x, y, z)` from three scalars
    VecConstruct {
        /// X component
        x: Arc<Expr>,
        /// Y component
        y: Arc<Expr>,
        /// Z component
        z: Arc<Expr>,
    },

    /// Single component of a vector
    VecComponent {
        /// Vector operand
        v: Arc<Expr>,
        /// Component to extract
        axis: Axis,
    },

    /// Record construction; field order is preserved for deterministic codegen
    StructConstruct {
        /// Ordered (name, value) pairs
        fields: Vec<(String, Arc<Expr>)>,
    },

    /// Member access on a struct-typed expression
    FieldAccess {
        /// Struct operand
        base: Arc<Expr>,
        /// Field name
        field: String,
    },

    /// Texture fetch bound to a uniform slot; yields a scalar channel
    TextureSample {
        /// Uniform slot id assigned by the code generator
        slot: u32,
        /// Sample coordinate (vec3)
        coord: Arc<Expr>,
    },
}

/// Shorthand for a binary constructor over matching scalar/vector operands
fn same_type(op: &'static str, a: &Expr, b: &Expr) -> Result<(), ExprError> {
    let (ta, tb) = (a.ty(), b.ty());
    match (&ta, &tb) {
        (ExprType::Float, ExprType::Float) | (ExprType::Vec3, ExprType::Vec3) => Ok(()),
        _ => Err(ExprError::TypeMismatch {
            op,
            lhs: ta.to_string(),
            rhs: tb.to_string(),
        }),
    }
}

fn scalar_only(op: &'static str, a: &Expr) -> Result<(), ExprError> {
    match a.ty() {
        ExprType::Float => Ok(()),
        other => Err(ExprError::NotScalar {
            op,
            found: other.to_string(),
        }),
    }
}

impl Expr {
    /// Numeric literal
    pub fn constant(value: f32) -> Expr {
        Expr::Const { value }
    }

    /// Named free variable with a declared type
    pub fn var(name: impl Into<String>, ty: ExprType) -> Expr {
        Expr::Var {
            name: name.into(),
            ty,
        }
    }

    /// Scalar position-style vec3 variable (common binding shorthand)
    pub fn point_var(name: impl Into<String>) -> Expr {
        Expr::var(name, ExprType::Vec3)
    }

    /// `self + rhs`
    pub fn add(self, rhs: Expr) -> Result<Expr, ExprError> {
        same_type("+", &self, &rhs)?;
        Ok(Expr::Add {
            a: Arc::new(self),
            b: Arc::new(rhs),
        })
    }

    /// `self - rhs`
    pub fn sub(self, rhs: Expr) -> Result<Expr, ExprError> {
        same_type("-", &self, &rhs)?;
        Ok(Expr::Sub {
            a: Arc::new(self),
            b: Arc::new(rhs),
        })
    }

    /// `self * rhs`; either operand may be a scalar scaling a vector
    pub fn mul(self, rhs: Expr) -> Result<Expr, ExprError> {
        match (self.ty(), rhs.ty()) {
            (ExprType::Float, ExprType::Float)
            | (ExprType::Vec3, ExprType::Vec3)
            | (ExprType::Vec3, ExprType::Float)
            | (ExprType::Float, ExprType::Vec3) => Ok(Expr::Mul {
                a: Arc::new(self),
                b: Arc::new(rhs),
            }),
            (ta, tb) => Err(ExprError::TypeMismatch {
                op: "*",
                lhs: ta.to_string(),
                rhs: tb.to_string(),
            }),
        }
    }

    /// `self / rhs`; a constant zero divisor is rejected here, matching
    /// the evaluator's division-by-zero policy
    pub fn div(self, rhs: Expr) -> Result<Expr, ExprError> {
        if let Expr::Const { value } = rhs {
            if value == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
        }
        match (self.ty(), rhs.ty()) {
            (ExprType::Float, ExprType::Float)
            | (ExprType::Vec3, ExprType::Vec3)
            | (ExprType::Vec3, ExprType::Float) => Ok(Expr::Div {
                a: Arc::new(self),
                b: Arc::new(rhs),
            }),
            (ta, tb) => Err(ExprError::TypeMismatch {
                op: "/",
                lhs: ta.to_string(),
                rhs: tb.to_string(),
            }),
        }
    }

    /// `-self`
    pub fn neg(self) -> Result<Expr, ExprError> {
        match self.ty() {
            ExprType::Float | ExprType::Vec3 => Ok(Expr::Neg { a: Arc::new(self) }),
            other => Err(ExprError::NotScalar {
                op: "-",
                found: other.to_string(),
            }),
        }
    }

    /// `min(self, rhs)`
    pub fn min(self, rhs: Expr) -> Result<Expr, ExprError> {
        same_type("min", &self, &rhs)?;
        Ok(Expr::Min {
            a: Arc::new(self),
            b: Arc::new(rhs),
        })
    }

    /// `max(self, rhs)`
    pub fn max(self, rhs: Expr) -> Result<Expr, ExprError> {
        same_type("max", &self, &rhs)?;
        Ok(Expr::Max {
            a: Arc::new(self),
            b: Arc::new(rhs),
        })
    }

    /// `abs(self)`
    pub fn abs(self) -> Result<Expr, ExprError> {
        match self.ty() {
            ExprType::Float | ExprType::Vec3 => Ok(Expr::Abs { a: Arc::new(self) }),
            other => Err(ExprError::NotScalar {
                op: "abs",
                found: other.to_string(),
            }),
        }
    }

    /// `sqrt(self)`
    pub fn sqrt(self) -> Result<Expr, ExprError> {
        scalar_only("sqrt", &self)?;
        Ok(Expr::Sqrt { a: Arc::new(self) })
    }

    /// `sin(self)`
    pub fn sin(self) -> Result<Expr, ExprError> {
        scalar_only("sin", &self)?;
        Ok(Expr::Sin { a: Arc::new(self) })
    }

    /// `cos(self)`
    pub fn cos(self) -> Result<Expr, ExprError> {
        scalar_only("cos", &self)?;
        Ok(Expr::Cos { a: Arc::new(self) })
    }

    /// `mix(self, rhs, t)` with scalar blend factor
    pub fn mix(self, rhs: Expr, t: Expr) -> Result<Expr, ExprError> {
        same_type("mix", &self, &rhs)?;
        scalar_only("mix", &t)?;
        Ok(Expr::Mix {
            a: Arc::new(self),
            b: Arc::new(rhs),
            t: Arc::new(t),
        })
    }

    /// `step(self, x)` where self is the edge
    pub fn step(self, x: Expr) -> Result<Expr, ExprError> {
        scalar_only("step", &self)?;
        scalar_only("step", &x)?;
        Ok(Expr::Step {
            edge: Arc::new(self),
            x: Arc::new(x),
        })
    }

    /// Floored modulo `mod(self, rhs)`
    pub fn modulo(self, rhs: Expr) -> Result<Expr, ExprError> {
        scalar_only("mod", &self)?;
        scalar_only("mod", &rhs)?;
        if let Expr::Const { value } = rhs {
            if value == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
        }
        Ok(Expr::Mod {
            a: Arc::new(self),
            b: Arc::new(rhs),
        })
    }

    /// `vec3(x, y, z)` from three scalar expressions
    pub fn vec3(x: Expr, y: Expr, z: Expr) -> Result<Expr, ExprError> {
        scalar_only("vec3", &x)?;
        scalar_only("vec3", &y)?;
        scalar_only("vec3", &z)?;
        Ok(Expr::VecConstruct {
            x: Arc::new(x),
            y: Arc::new(y),
            z: Arc::new(z),
        })
    }

    /// Extract one component of a vector expression
    pub fn component(self, axis: Axis) -> Result<Expr, ExprError> {
        match self.ty() {
            ExprType::Vec3 => Ok(Expr::VecComponent {
                v: Arc::new(self),
                axis,
            }),
            other => Err(ExprError::NotVector {
                op: "component",
                found: other.to_string(),
            }),
        }
    }

    /// Build a struct from ordered (name, value) pairs
    ///
    /// Field names must be unique; fields must be scalar or vector.
    /// Insertion order is preserved and drives deterministic codegen.
    pub fn structure(fields: Vec<(String, Expr)>) -> Result<Expr, ExprError> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            if !seen.insert(name.clone()) {
                return Err(ExprError::DuplicateField(name));
            }
            match value.ty() {
                ExprType::Float | ExprType::Vec3 => {}
                other => {
                    return Err(ExprError::BadFieldType {
                        field: name,
                        found: other.to_string(),
                    })
                }
            }
            out.push((name, Arc::new(value)));
        }
        Ok(Expr::StructConstruct { fields: out })
    }

    /// Access a named field of a struct-typed expression
    pub fn field(self, name: impl Into<String>) -> Result<Expr, ExprError> {
        let name = name.into();
        match self.ty() {
            ExprType::Struct(fields) if fields.iter().any(|(n, _)| *n == name) => {
                Ok(Expr::FieldAccess {
                    base: Arc::new(self),
                    field: name,
                })
            }
            other => Err(ExprError::UnknownField {
                field: name,
                found: other.to_string(),
            }),
        }
    }

    /// Texture fetch at a vec3 coordinate, bound to a uniform slot
    pub fn texture_sample(slot: u32, coord: Expr) -> Result<Expr, ExprError> {
        match coord.ty() {
            ExprType::Vec3 => Ok(Expr::TextureSample {
                slot,
                coord: Arc::new(coord),
            }),
            other => Err(ExprError::NotVector {
                op: "texture_sample",
                found: other.to_string(),
            }),
        }
    }

    /// Static type of this expression
    ///
    /// Total because constructors reject ill-typed trees.
    pub fn ty(&self) -> ExprType {
        match self {
            Expr::Const { .. } => ExprType::Float,
            Expr::Var { ty, .. } => ty.clone(),
            Expr::Add { a, .. }
            | Expr::Sub { a, .. }
            | Expr::Min { a, .. }
            | Expr::Max { a, .. }
            | Expr::Neg { a }
            | Expr::Abs { a }
            | Expr::Mix { a, .. } => a.ty(),
            Expr::Mul { a, b } | Expr::Div { a, b } => {
                if a.ty() == ExprType::Vec3 || b.ty() == ExprType::Vec3 {
                    ExprType::Vec3
                } else {
                    ExprType::Float
                }
            }
            Expr::Sqrt { .. }
            | Expr::Sin { .. }
            | Expr::Cos { .. }
            | Expr::Step { .. }
            | Expr::Mod { .. }
            | Expr::VecComponent { .. }
            | Expr::TextureSample { .. } => ExprType::Float,
            Expr::VecConstruct { .. } => ExprType::Vec3,
            Expr::StructConstruct { fields } => ExprType::Struct(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.ty()))
                    .collect(),
            ),
            Expr::FieldAccess { base, field } => match base.ty() {
                ExprType::Struct(fields) => fields
                    .into_iter()
                    .find(|(name, _)| name == field)
                    .map(|(_, ty)| ty)
                    .unwrap_or(ExprType::Float),
                _ => ExprType::Float,
            },
        }
    }

    /// Direct children, in operand order
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Const { .. } | Expr::Var { .. } => Vec::new(),
            Expr::Neg { a } | Expr::Abs { a } | Expr::Sqrt { a } | Expr::Sin { a }
            | Expr::Cos { a } => vec![a],
            Expr::Add { a, b }
            | Expr::Sub { a, b }
            | Expr::Mul { a, b }
            | Expr::Div { a, b }
            | Expr::Min { a, b }
            | Expr::Max { a, b }
            | Expr::Mod { a, b } => vec![a, b],
            Expr::Mix { a, b, t } => vec![a, b, t],
            Expr::Step { edge, x } => vec![edge, x],
            Expr::VecConstruct { x, y, z } => vec![x, y, z],
            Expr::VecComponent { v, .. } => vec![v],
            Expr::StructConstruct { fields } => {
                fields.iter().map(|(_, value)| value.as_ref()).collect()
            }
            Expr::FieldAccess { base, .. } => vec![base],
            Expr::TextureSample { coord, .. } => vec![coord],
        }
    }

    /// Total number of nodes in this tree
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Expr::node_count)
            .sum::<usize>()
    }

    /// Maximum depth of this tree (a leaf has depth 1)
    pub fn max_depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Expr::max_depth)
            .max()
            .unwrap_or(0)
    }

    /// Names of all free variables referenced by this tree
    pub fn free_vars(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut BTreeSet<String>) {
        if let Expr::Var { name, .. } = self {
            out.insert(name.clone());
        }
        for child in self.children() {
            child.collect_vars(out);
        }
    }

    /// True if this is a struct expression exposing a scalar `distance` field
    pub fn has_distance_field(&self) -> bool {
        match self.ty() {
            ExprType::Struct(fields) => fields
                .iter()
                .any(|(name, ty)| name == "distance" && *ty == ExprType::Float),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_and_types() {
        let p = Expr::point_var("p");
        let one = Expr::constant(1.0);

        // vec3 + float is a construction-time error, never a runtime one
        assert!(p.clone().add(one.clone()).is_err());
        assert!(p.clone().add(p.clone()).is_ok());

        // scalar scaling of a vector is the one mixed form
        let scaled = p.clone().mul(Expr::constant(2.0)).unwrap();
        assert_eq!(scaled.ty(), ExprType::Vec3);

        // sqrt is scalar-only
        assert!(p.clone().sqrt().is_err());
        assert!(one.sqrt().is_ok());
    }

    #[test]
    fn test_constant_zero_divisor_rejected() {
        let e = Expr::constant(1.0).div(Expr::constant(0.0));
        assert_eq!(e.unwrap_err(), ExprError::DivisionByZero);
    }

    #[test]
    fn test_struct_fields() {
        let s = Expr::structure(vec![
            ("distance".to_string(), Expr::constant(1.0)),
            ("color".to_string(), Expr::point_var("c")),
        ])
        .unwrap();
        assert!(s.has_distance_field());
        assert_eq!(s.clone().field("color").unwrap().ty(), ExprType::Vec3);
        assert!(s.clone().field("normal").is_err());

        let dup = Expr::structure(vec![
            ("distance".to_string(), Expr::constant(1.0)),
            ("distance".to_string(), Expr::constant(2.0)),
        ]);
        assert_eq!(
            dup.unwrap_err(),
            ExprError::DuplicateField("distance".to_string())
        );
    }

    #[test]
    fn test_tree_bookkeeping() {
        let p = Expr::point_var("p");
        let e = p
            .clone()
            .component(Axis::X)
            .unwrap()
            .add(Expr::constant(1.0))
            .unwrap();
        assert_eq!(e.node_count(), 4);
        assert_eq!(e.max_depth(), 3);
        assert_eq!(
            e.free_vars().into_iter().collect::<Vec<_>>(),
            vec!["p".to_string()]
        );
    }
}
