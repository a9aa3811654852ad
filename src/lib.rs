//! # ALICE-EXPR
//!
//! **A.L.I.C.E. - Adaptive Lightweight Implicit Compression Engine**
//!
//! Expression compiler core for a procedural SDF geometry editor:
//! scene nodes describe implicit surfaces as math formulas, and this
//! crate turns them into typed expression trees, evaluates them on the
//! CPU, bounds them with interval arithmetic, and lowers whole scene
//! graphs to WGSL shaders.
//!
//! ## Features
//!
//! - **IR**: Immutable, statically typed expression trees with shared subtrees
//! - **Parser**: Textual math formulas (`vlength(p) - 1.0`) with positioned errors
//! - **Evaluation**: Direct CPU evaluation, batch/parallel variants, gradients
//! - **Intervals**: Conservative range analysis over expression trees
//! - **Codegen**: Deterministic WGSL with uniform slots, textures, raw fragments
//! - **Scenes**: Per-node compilation with graceful degradation on bad formulas
//!
//! ## Example
//!
//! ```rust
//! use alice_expr::prelude::*;
//! use std::collections::HashMap;
//!
//! // Parse a unit-sphere distance formula
//! let mut env = HashMap::new();
//! env.insert("p".to_string(), Expr::point_var("p"));
//! let sphere = parse_expression("vlength(p) - 1.0", &env).unwrap();
//!
//! // Evaluate it at the origin
//! let mut bindings = HashMap::new();
//! bindings.insert("p".to_string(), Value::Vec3(glam::Vec3::ZERO));
//! let d = evaluate(&sphere, &bindings).unwrap().as_float().unwrap();
//! assert!((d - (-1.0)).abs() < 1e-6);
//! ```
//!
//! ## Author
//!
//! Moroya Sakamoto

#![warn(missing_docs)]

pub mod codegen;
pub mod eval;
pub mod expr;
pub mod graph;
pub mod interval;
pub mod parse;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::codegen::{
        emit_function, emit_inline, ParamType, ParamValue, ShaderSource, StructRegistry,
        TextureDim, TextureSlot, UniformAllocator, UniformSlot,
    };
    pub use crate::eval::{
        eval_batch, eval_batch_parallel, evaluate, gradient, EvalError, Value,
    };
    pub use crate::expr::{Axis, Expr, ExprError, ExprType};
    pub use crate::graph::{
        compile_scene, empty_surface, CompileError, NodeContext, NodeError, NodeId, RawFragment,
        SceneNode,
    };
    pub use crate::interval::{
        eval_expr_interval, Interval, IntervalValue, Vec3Interval,
    };
    pub use crate::parse::{parse_expression, ParseError};
    pub use glam::Vec3;
}

pub use expr::Expr;
pub use graph::compile_scene;
pub use interval::Interval;
pub use parse::parse_expression;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_eval_workflow() {
        let mut env = HashMap::new();
        env.insert("p".to_string(), Expr::point_var("p"));
        let e = parse_expression("max(vlength(p) - 2.0, p + vec3(0, 1, 0))", &env);
        // vec3 max against scalar distance is a type error at parse time
        assert!(e.is_err());

        let e = parse_expression("vlength(p) - 2.0", &env).unwrap();
        let mut bindings = HashMap::new();
        bindings.insert("p".to_string(), Value::Vec3(Vec3::new(0.0, 3.0, 0.0)));
        let d = evaluate(&e, &bindings).unwrap().as_float().unwrap();
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_interval_workflow() {
        let mut env = HashMap::new();
        env.insert("p".to_string(), Expr::point_var("p"));
        let e = parse_expression("vlength(p) - 1.0", &env).unwrap();

        let mut bindings = HashMap::new();
        bindings.insert(
            "p".to_string(),
            IntervalValue::Vec3(Vec3Interval::from_bounds(
                Vec3::new(2.0, 2.0, 2.0),
                Vec3::new(3.0, 3.0, 3.0),
            )),
        );
        let range = eval_expr_interval(&e, &bindings).unwrap();
        match range {
            IntervalValue::Scalar(iv) => assert!(iv.is_positive()),
            _ => panic!("expected scalar interval"),
        }
    }
}
