//! Common test helpers for ALICE-EXPR integration tests
//!
//! Author: Moroya Sakamoto

use alice_expr::prelude::*;
use std::collections::HashMap;

// ============================================================================
// Expression helpers
// ============================================================================

/// Environment binding `p` as the position variable
pub fn point_env() -> HashMap<String, Expr> {
    let mut env = HashMap::new();
    env.insert("p".to_string(), Expr::point_var("p"));
    env
}

/// Parse a formula over `p`, panicking on error
pub fn parse(text: &str) -> Expr {
    parse_expression(text, &point_env()).unwrap()
}

/// Evaluate a scalar formula over `p` at a point
pub fn eval_scalar(expr: &Expr, p: Vec3) -> f32 {
    let mut bindings = HashMap::new();
    bindings.insert("p".to_string(), Value::Vec3(p));
    evaluate(expr, &bindings).unwrap().as_float().unwrap()
}

// ============================================================================
// Standard test points
// ============================================================================

/// 8 canonical test points (origin, axes, diagonal, surface, outside)
pub fn test_points() -> Vec<Vec3> {
    vec![
        Vec3::ZERO,
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(0.577, 0.577, 0.577),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(0.0, -1.5, 0.0),
        Vec3::new(0.3, 0.3, 0.3),
    ]
}

// ============================================================================
// Scene node fixtures
// ============================================================================

/// Formula-driven node: parses its formula at compile time, with the
/// radius exposed as a uniform named after the node id
pub struct SphereNode {
    pub id: NodeId,
    pub radius: f32,
}

impl SceneNode for SphereNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn max_children(&self) -> Option<usize> {
        Some(0)
    }

    fn parameters(&self) -> Vec<ParamValue> {
        vec![ParamValue::Float(self.radius)]
    }

    fn expression(&self, ctx: &mut NodeContext<'_>) -> Option<Result<Expr, NodeError>> {
        let r = ctx.param(0)?;
        let mut env = point_env();
        env.insert("r".to_string(), r);
        Some(
            parse_expression("vlength(p) - r", &env)
                .map_err(NodeError::from),
        )
    }
}

/// Binary min over two child surfaces
pub struct UnionNode {
    pub id: NodeId,
    pub a: Box<dyn SceneNode>,
    pub b: Box<dyn SceneNode>,
}

impl SceneNode for UnionNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn max_children(&self) -> Option<usize> {
        Some(2)
    }

    fn children(&self) -> Vec<&dyn SceneNode> {
        vec![self.a.as_ref(), self.b.as_ref()]
    }

    fn expression(&self, ctx: &mut NodeContext<'_>) -> Option<Result<Expr, NodeError>> {
        let build = || -> Result<Expr, NodeError> {
            let da = ctx
                .child(0)
                .ok_or("missing child 0")?
                .field("distance")?;
            let db = ctx
                .child(1)
                .ok_or("missing child 1")?
                .field("distance")?;
            Ok(da.min(db)?)
        };
        Some(build())
    }
}

/// Node contributing hand-written WGSL instead of an expression
pub struct RawGroundNode {
    pub id: NodeId,
}

impl SceneNode for RawGroundNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn raw_fragment(&self) -> Option<RawFragment> {
        Some(RawFragment {
            function_name: format!("ground{}", self.id),
            source: format!(
                "fn ground{}(p: vec3<f32>) -> f32 {{\n    return p.y;\n}}\n",
                self.id
            ),
        })
    }
}

/// Node whose formula never parses; compiles to the empty surface
pub struct BrokenNode {
    pub id: NodeId,
}

impl SceneNode for BrokenNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn expression(&self, _ctx: &mut NodeContext<'_>) -> Option<Result<Expr, NodeError>> {
        Some(
            parse_expression("vlength(q) - 1.0", &point_env())
                .map_err(NodeError::from),
        )
    }
}
