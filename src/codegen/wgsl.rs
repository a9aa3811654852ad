//! WGSL expression emitter
//!
//! Lowers one expression tree into the body of a WGSL function.
//! Subexpressions land in `let` temporaries named `t0`, `t1`, ... in
//! traversal order; a pool keyed by the emitted right-hand-side text
//! de-duplicates structurally identical subtrees, so `Arc`-shared
//! children are computed once. Output is byte-identical across runs
//! for the same tree.
//!
//! Author: Moroya Sakamoto

use crate::expr::{Expr, ExprType};
use std::collections::HashMap;
use std::fmt::Write;

/// Epsilon for constant folding (skip operations that are no-ops)
const FOLD_EPSILON: f32 = 1e-6;

/// Formats a float literal the way every emitter in the crate does,
/// so pooled RHS text matches across nodes
#[inline(always)]
fn format_f32(value: f32) -> String {
    format!("{:.6}", value)
}

/// True if the expression is a literal within `FOLD_EPSILON` of `target`
#[inline]
fn is_literal(expr: &Expr, target: f32) -> bool {
    matches!(expr, Expr::Const { value } if (value - target).abs() < FOLD_EPSILON)
}

/// Registry of struct layouts encountered during a compile
///
/// Each distinct field layout gets one WGSL struct declaration named
/// `Surface0`, `Surface1`, ... in first-seen order. Nodes compiled
/// later reuse earlier names, which keeps declarations unique and the
/// assembled shader deterministic.
#[derive(Debug, Default)]
pub struct StructRegistry {
    entries: Vec<(Vec<(String, ExprType)>, String)>,
}

impl StructRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for a struct layout, registering it on first sight
    pub fn name_for(&mut self, fields: &[(String, ExprType)]) -> String {
        if let Some((_, name)) = self.entries.iter().find(|(layout, _)| layout == fields) {
            return name.clone();
        }
        let name = format!("Surface{}", self.entries.len());
        self.entries.push((fields.to_vec(), name.clone()));
        name
    }

    /// WGSL type text for an expression type
    pub fn wgsl_type(&mut self, ty: &ExprType) -> String {
        match ty {
            ExprType::Float => "f32".to_string(),
            ExprType::Vec3 => "vec3<f32>".to_string(),
            ExprType::Struct(fields) => self.name_for(fields),
        }
    }

    /// WGSL declarations for every registered struct, in registration order
    pub fn declarations(&mut self) -> String {
        let mut out = String::new();
        // field types may themselves be structs in principle; today they
        // are scalar/vector only, enforced at IR construction
        for i in 0..self.entries.len() {
            let (fields, name) = self.entries[i].clone();
            writeln!(out, "struct {} {{", name).unwrap();
            for (field, ty) in &fields {
                writeln!(out, "    {}: {},", field, self.wgsl_type(ty)).unwrap();
            }
            out.push_str("}\n");
        }
        out
    }
}

struct EmitContext<'r> {
    registry: &'r mut StructRegistry,
    body: String,
    pool: HashMap<String, String>,
    counter: usize,
}

impl<'r> EmitContext<'r> {
    fn new(registry: &'r mut StructRegistry) -> Self {
        EmitContext {
            registry,
            body: String::new(),
            pool: HashMap::new(),
            counter: 0,
        }
    }

    /// Bind an RHS to a temporary, reusing an earlier temp when the
    /// exact same text was already emitted
    fn temp(&mut self, rhs: String) -> String {
        if let Some(existing) = self.pool.get(&rhs) {
            return existing.clone();
        }
        let name = format!("t{}", self.counter);
        self.counter += 1;
        writeln!(self.body, "    let {} = {};", name, rhs).unwrap();
        self.pool.insert(rhs, name.clone());
        name
    }

    /// Emit an expression, returning the WGSL text that references its value
    fn emit(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Const { value } => format_f32(*value),
            // Var names are generated identifiers (position binding,
            // uniform slots, child-function calls), emitted verbatim
            Expr::Var { name, .. } => name.clone(),
            // identity operands fold away; `x + 0`, `x * 1`, `x / 1`
            // never reach the shader
            Expr::Add { a, b } => {
                if is_literal(a, 0.0) {
                    return self.emit(b);
                }
                if is_literal(b, 0.0) {
                    return self.emit(a);
                }
                let (a, b) = (self.emit(a), self.emit(b));
                self.temp(format!("({} + {})", a, b))
            }
            Expr::Sub { a, b } => {
                if is_literal(b, 0.0) {
                    return self.emit(a);
                }
                let (a, b) = (self.emit(a), self.emit(b));
                self.temp(format!("({} - {})", a, b))
            }
            Expr::Mul { a, b } => {
                if is_literal(a, 1.0) {
                    return self.emit(b);
                }
                if is_literal(b, 1.0) {
                    return self.emit(a);
                }
                let (a, b) = (self.emit(a), self.emit(b));
                self.temp(format!("({} * {})", a, b))
            }
            Expr::Div { a, b } => {
                if is_literal(b, 1.0) {
                    return self.emit(a);
                }
                let (a, b) = (self.emit(a), self.emit(b));
                self.temp(format!("({} / {})", a, b))
            }
            Expr::Neg { a } => {
                let a = self.emit(a);
                self.temp(format!("(-{})", a))
            }
            Expr::Min { a, b } => {
                let (a, b) = (self.emit(a), self.emit(b));
                self.temp(format!("min({}, {})", a, b))
            }
            Expr::Max { a, b } => {
                let (a, b) = (self.emit(a), self.emit(b));
                self.temp(format!("max({}, {})", a, b))
            }
            Expr::Abs { a } => {
                let a = self.emit(a);
                self.temp(format!("abs({})", a))
            }
            Expr::Sqrt { a } => {
                let a = self.emit(a);
                self.temp(format!("sqrt({})", a))
            }
            Expr::Sin { a } => {
                let a = self.emit(a);
                self.temp(format!("sin({})", a))
            }
            Expr::Cos { a } => {
                let a = self.emit(a);
                self.temp(format!("cos({})", a))
            }
            Expr::Mix { a, b, t } => {
                let (a, b, t) = (self.emit(a), self.emit(b), self.emit(t));
                self.temp(format!("mix({}, {}, {})", a, b, t))
            }
            Expr::Step { edge, x } => {
                let (edge, x) = (self.emit(edge), self.emit(x));
                self.temp(format!("step({}, {})", edge, x))
            }
            // WGSL's `%` truncates; emit the floored form to match CPU
            // evaluation exactly
            Expr::Mod { a, b } => {
                let (a, b) = (self.emit(a), self.emit(b));
                self.temp(format!("({a} - {b} * floor({a} / {b}))", a = a, b = b))
            }
            Expr::VecConstruct { x, y, z } => {
                let (x, y, z) = (self.emit(x), self.emit(y), self.emit(z));
                self.temp(format!("vec3<f32>({}, {}, {})", x, y, z))
            }
            Expr::VecComponent { v, axis } => {
                let v = self.emit(v);
                format!("{}.{}", v, axis.name())
            }
            Expr::StructConstruct { fields } => {
                let layout: Vec<(String, ExprType)> = fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.ty()))
                    .collect();
                let args: Vec<String> =
                    fields.iter().map(|(_, value)| self.emit(value)).collect();
                let struct_name = self.registry.name_for(&layout);
                self.temp(format!("{}({})", struct_name, args.join(", ")))
            }
            Expr::FieldAccess { base, field } => {
                let base = self.emit(base);
                format!("{}.{}", base, field)
            }
            Expr::TextureSample { slot, coord } => {
                let coord = self.emit(coord);
                self.temp(format!("texture_sample{}({})", slot, coord))
            }
        }
    }
}

/// Emit an expression as one nested inline WGSL expression, without
/// temporaries or de-duplication
///
/// De-duplication is an optimization, not a correctness requirement;
/// this form omits it, trading size for direct readability. Used for
/// diagnostics and golden tests; shader assembly goes through
/// [`emit_function`].
pub fn emit_inline(expr: &Expr, registry: &mut StructRegistry) -> String {
    match expr {
        Expr::Const { value } => format_f32(*value),
        Expr::Var { name, .. } => name.clone(),
        Expr::Add { a, b } => format!(
            "({} + {})",
            emit_inline(a, registry),
            emit_inline(b, registry)
        ),
        Expr::Sub { a, b } => format!(
            "({} - {})",
            emit_inline(a, registry),
            emit_inline(b, registry)
        ),
        Expr::Mul { a, b } => format!(
            "({} * {})",
            emit_inline(a, registry),
            emit_inline(b, registry)
        ),
        Expr::Div { a, b } => format!(
            "({} / {})",
            emit_inline(a, registry),
            emit_inline(b, registry)
        ),
        Expr::Neg { a } => format!("(-{})", emit_inline(a, registry)),
        Expr::Min { a, b } => format!(
            "min({}, {})",
            emit_inline(a, registry),
            emit_inline(b, registry)
        ),
        Expr::Max { a, b } => format!(
            "max({}, {})",
            emit_inline(a, registry),
            emit_inline(b, registry)
        ),
        Expr::Abs { a } => format!("abs({})", emit_inline(a, registry)),
        Expr::Sqrt { a } => format!("sqrt({})", emit_inline(a, registry)),
        Expr::Sin { a } => format!("sin({})", emit_inline(a, registry)),
        Expr::Cos { a } => format!("cos({})", emit_inline(a, registry)),
        Expr::Mix { a, b, t } => format!(
            "mix({}, {}, {})",
            emit_inline(a, registry),
            emit_inline(b, registry),
            emit_inline(t, registry)
        ),
        Expr::Step { edge, x } => format!(
            "step({}, {})",
            emit_inline(edge, registry),
            emit_inline(x, registry)
        ),
        Expr::Mod { a, b } => {
            let (a, b) = (emit_inline(a, registry), emit_inline(b, registry));
            format!("({a} - {b} * floor({a} / {b}))", a = a, b = b)
        }
        Expr::VecConstruct { x, y, z } => format!(
            "vec3<f32>({}, {}, {})",
            emit_inline(x, registry),
            emit_inline(y, registry),
            emit_inline(z, registry)
        ),
        Expr::VecComponent { v, axis } => {
            format!("{}.{}", emit_inline(v, registry), axis.name())
        }
        Expr::StructConstruct { fields } => {
            let layout: Vec<(String, ExprType)> = fields
                .iter()
                .map(|(name, value)| (name.clone(), value.ty()))
                .collect();
            let args: Vec<String> = fields
                .iter()
                .map(|(_, value)| emit_inline(value, registry))
                .collect();
            format!("{}({})", registry.name_for(&layout), args.join(", "))
        }
        Expr::FieldAccess { base, field } => {
            format!("{}.{}", emit_inline(base, registry), field)
        }
        Expr::TextureSample { slot, coord } => {
            format!("texture_sample{}({})", slot, emit_inline(coord, registry))
        }
    }
}

/// Emit a complete WGSL function evaluating `expr` at a point
///
/// The function takes one `vec3<f32>` parameter named `p`; the
/// expression's free position variable must be named `p` too. Struct
/// return types register themselves in `registry`.
pub fn emit_function(name: &str, expr: &Expr, registry: &mut StructRegistry) -> String {
    let ret_ty = registry.wgsl_type(&expr.ty());
    let mut ctx = EmitContext::new(registry);
    let result = ctx.emit(expr);
    format!(
        "fn {}(p: vec3<f32>) -> {} {{\n{}    return {};\n}}\n",
        name, ret_ty, ctx.body, result
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Axis;

    fn sphere_expr() -> Expr {
        let p = Expr::point_var("p");
        let x = p.clone().component(Axis::X).unwrap();
        let y = p.clone().component(Axis::Y).unwrap();
        let z = p.component(Axis::Z).unwrap();
        x.clone()
            .mul(x)
            .unwrap()
            .add(y.clone().mul(y).unwrap())
            .unwrap()
            .add(z.clone().mul(z).unwrap())
            .unwrap()
            .sqrt()
            .unwrap()
            .sub(Expr::constant(1.0))
            .unwrap()
    }

    #[test]
    fn test_emit_is_deterministic() {
        let e = sphere_expr();
        let mut r1 = StructRegistry::new();
        let mut r2 = StructRegistry::new();
        let a = emit_function("node0", &e, &mut r1);
        let b = emit_function("node0", &e, &mut r2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_floats_use_fixed_precision() {
        let e = Expr::constant(0.5).add(Expr::constant(1.0)).unwrap();
        let mut registry = StructRegistry::new();
        let f = emit_function("node0", &e, &mut registry);
        assert!(f.contains("(0.500000 + 1.000000)"));
    }

    #[test]
    fn test_shared_subtrees_emitted_once() {
        // sphere_expr references each component twice via Arc sharing
        let e = sphere_expr();
        let mut registry = StructRegistry::new();
        let f = emit_function("node0", &e, &mut registry);
        assert_eq!(f.matches("(p.x * p.x)").count(), 1);
    }

    #[test]
    fn test_identity_operands_fold_away() {
        let p = Expr::point_var("p");
        let e = p
            .clone()
            .mul(Expr::constant(1.0))
            .unwrap()
            .add(Expr::vec3(
                Expr::constant(0.0),
                Expr::constant(0.0),
                Expr::constant(0.0),
            )
            .unwrap())
            .unwrap();
        // vec3(0,0,0) is not the scalar literal 0; it still emits
        let mut registry = StructRegistry::new();
        let f = emit_function("node0", &e, &mut registry);
        assert!(!f.contains("(p * 1.000000)"));

        let e = Expr::var("d", ExprType::Float)
            .add(Expr::constant(0.0))
            .unwrap()
            .div(Expr::constant(1.0))
            .unwrap();
        let mut registry = StructRegistry::new();
        let f = emit_function("node0", &e, &mut registry);
        assert!(f.contains("    return d;\n"));
    }

    #[test]
    fn test_inline_form_is_nested() {
        let e = sphere_expr();
        let mut registry = StructRegistry::new();
        let inline = emit_inline(&e, &mut registry);
        assert!(inline.starts_with("(sqrt("));
        assert!(inline.ends_with("- 1.000000)"));
        assert!(!inline.contains("let "));
    }

    #[test]
    fn test_mod_uses_floored_form() {
        let e = Expr::constant(7.0).modulo(Expr::constant(3.0)).unwrap();
        let mut registry = StructRegistry::new();
        let f = emit_function("node0", &e, &mut registry);
        assert!(f.contains("floor(7.000000 / 3.000000)"));
    }

    #[test]
    fn test_struct_registry_reuses_layouts() {
        let mut registry = StructRegistry::new();
        let layout = vec![
            ("distance".to_string(), ExprType::Float),
            ("color".to_string(), ExprType::Vec3),
        ];
        assert_eq!(registry.name_for(&layout), "Surface0");
        assert_eq!(registry.name_for(&layout), "Surface0");
        let other = vec![("distance".to_string(), ExprType::Float)];
        assert_eq!(registry.name_for(&other), "Surface1");

        let decls = registry.declarations();
        assert!(decls.contains("struct Surface0 {"));
        assert!(decls.contains("    color: vec3<f32>,"));
        assert!(decls.contains("struct Surface1 {"));
    }

    #[test]
    fn test_struct_construct_and_field_access() {
        let s = Expr::structure(vec![
            ("distance".to_string(), Expr::constant(2.0)),
            ("color".to_string(), Expr::point_var("p")),
        ])
        .unwrap();
        let d = s.field("distance").unwrap();
        let mut registry = StructRegistry::new();
        let f = emit_function("node0", &d, &mut registry);
        assert!(f.contains("Surface0(2.000000, p)"));
        assert!(f.contains(".distance"));
    }

    #[test]
    fn test_texture_sample_call() {
        let e = Expr::texture_sample(2, Expr::point_var("p")).unwrap();
        let mut registry = StructRegistry::new();
        let f = emit_function("node0", &e, &mut registry);
        assert!(f.contains("texture_sample2(p)"));
    }
}
