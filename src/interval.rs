//! Interval Arithmetic for expression trees
//!
//! Evaluates IR expressions over ranges of inputs instead of single
//! points. Returns conservative bounds [lo, hi] guaranteed to contain
//! all possible values of the expression within the input ranges.
//!
//! - If `result.lo > 0`: the distance field is positive over the whole
//!   region (safe to skip during marching)
//! - If `result.hi < 0`: the region is entirely inside the surface
//! - Otherwise: the surface may cross through the region
//!
//! Multiplication uses the four-corner min/max rule; sign-based
//! shortcuts are only used where one operand's sign is statically
//! known (scalar constants).
//!
//! Author: Moroya Sakamoto

use crate::eval::EvalError;
use crate::expr::Expr;
use glam::Vec3;
use std::collections::HashMap;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A closed interval [lo, hi] representing a range of possible values
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    /// Lower bound
    pub lo: f32,
    /// Upper bound
    pub hi: f32,
}

impl Interval {
    /// Create a new interval
    #[inline(always)]
    pub fn new(lo: f32, hi: f32) -> Self {
        debug_assert!(lo <= hi + 1e-6, "lo ({}) > hi ({})", lo, hi);
        Self { lo, hi }
    }

    /// Create a point interval [v, v]
    #[inline(always)]
    pub fn point(v: f32) -> Self {
        Self { lo: v, hi: v }
    }

    /// The entire real line
    pub const EVERYTHING: Self = Self {
        lo: f32::NEG_INFINITY,
        hi: f32::INFINITY,
    };

    /// Zero interval
    pub const ZERO: Self = Self { lo: 0.0, hi: 0.0 };

    /// Check if the interval is entirely positive
    #[inline(always)]
    pub fn is_positive(self) -> bool {
        self.lo > 0.0
    }

    /// Check if the interval is entirely negative
    #[inline(always)]
    pub fn is_negative(self) -> bool {
        self.hi < 0.0
    }

    /// Check if the interval contains a value
    #[inline(always)]
    pub fn contains(self, v: f32) -> bool {
        self.lo <= v && v <= self.hi
    }

    /// Width of the interval
    #[inline(always)]
    pub fn width(self) -> f32 {
        self.hi - self.lo
    }

    /// Absolute value of an interval
    #[inline(always)]
    pub fn abs(self) -> Self {
        if self.lo >= 0.0 {
            self
        } else if self.hi <= 0.0 {
            Self {
                lo: -self.hi,
                hi: -self.lo,
            }
        } else {
            Self {
                lo: 0.0,
                hi: self.hi.max(-self.lo),
            }
        }
    }

    /// Square root (clamped to non-negative)
    #[inline(always)]
    pub fn sqrt(self) -> Self {
        Self {
            lo: self.lo.max(0.0).sqrt(),
            hi: self.hi.max(0.0).sqrt(),
        }
    }

    /// Square of an interval
    #[inline(always)]
    pub fn sqr(self) -> Self {
        if self.lo >= 0.0 {
            Self {
                lo: self.lo * self.lo,
                hi: self.hi * self.hi,
            }
        } else if self.hi <= 0.0 {
            Self {
                lo: self.hi * self.hi,
                hi: self.lo * self.lo,
            }
        } else {
            Self {
                lo: 0.0,
                hi: (self.lo * self.lo).max(self.hi * self.hi),
            }
        }
    }

    /// Reciprocal 1/x
    ///
    /// Precondition: the interval must not straddle zero. A straddling
    /// divisor is a caller error, mirroring the code generator's
    /// assumption that divisors never cross zero in the sampled domain.
    #[inline(always)]
    pub fn recip(self) -> Self {
        debug_assert!(
            self.lo > 0.0 || self.hi < 0.0,
            "reciprocal of zero-straddling interval [{}, {}]",
            self.lo,
            self.hi
        );
        Self {
            lo: 1.0 / self.hi,
            hi: 1.0 / self.lo,
        }
    }

    /// Minimum of two intervals
    #[inline(always)]
    pub fn min(self, other: Self) -> Self {
        Self {
            lo: self.lo.min(other.lo),
            hi: self.hi.min(other.hi),
        }
    }

    /// Maximum of two intervals
    #[inline(always)]
    pub fn max(self, other: Self) -> Self {
        Self {
            lo: self.lo.max(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    /// Clamp to scalar range
    #[inline(always)]
    pub fn clamp(self, lo: f32, hi: f32) -> Self {
        Self {
            lo: self.lo.clamp(lo, hi),
            hi: self.hi.clamp(lo, hi),
        }
    }

    /// Expand interval by a constant in both directions
    #[inline(always)]
    pub fn expand(self, amount: f32) -> Self {
        Self {
            lo: self.lo - amount,
            hi: self.hi + amount,
        }
    }

    /// True if some `phase + 2kπ` lies within the interval
    #[inline]
    fn contains_phase(self, phase: f32) -> bool {
        let k = ((self.lo - phase) / std::f32::consts::TAU).ceil();
        phase + k * std::f32::consts::TAU <= self.hi
    }

    /// Sine bounds; exact at the endpoints, widened to ±1 where the
    /// interval crosses an extremum
    pub fn sin(self) -> Self {
        if self.width() >= std::f32::consts::TAU {
            return Self::new(-1.0, 1.0);
        }
        let (a, b) = (self.lo.sin(), self.hi.sin());
        let mut lo = a.min(b);
        let mut hi = a.max(b);
        if self.contains_phase(std::f32::consts::FRAC_PI_2) {
            hi = 1.0;
        }
        if self.contains_phase(-std::f32::consts::FRAC_PI_2) {
            lo = -1.0;
        }
        Self { lo, hi }
    }

    /// Cosine bounds via the π/2 phase shift
    #[inline]
    pub fn cos(self) -> Self {
        (self + Interval::point(std::f32::consts::FRAC_PI_2)).sin()
    }

    /// `step(self, x)`: [0,0], [1,1], or [0,1] depending on overlap
    #[inline]
    pub fn step(self, x: Self) -> Self {
        if x.hi < self.lo {
            Self::ZERO
        } else if x.lo >= self.hi {
            Self::point(1.0)
        } else {
            Self::new(0.0, 1.0)
        }
    }

    /// Linear blend `self * (1 - t) + other * t`
    #[inline]
    pub fn lerp(self, other: Self, t: Self) -> Self {
        self * (Interval::point(1.0) - t) + other * t
    }

    /// Conservative bounds for the floored modulo `self mod rhs`:
    /// the result sign follows the divisor
    #[inline]
    pub fn floor_mod(self, rhs: Self) -> Self {
        if rhs.lo > 0.0 {
            Self::new(0.0, rhs.hi)
        } else if rhs.hi < 0.0 {
            Self::new(rhs.lo, 0.0)
        } else {
            let m = rhs.abs().hi;
            Self::new(-m, m)
        }
    }
}

impl Add for Interval {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self {
            lo: self.lo + rhs.lo,
            hi: self.hi + rhs.hi,
        }
    }
}

impl Sub for Interval {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self {
            lo: self.lo - rhs.hi,
            hi: self.hi - rhs.lo,
        }
    }
}

impl Mul for Interval {
    type Output = Self;
    // Four-corner rule: correct for every sign combination
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        let a = self.lo * rhs.lo;
        let b = self.lo * rhs.hi;
        let c = self.hi * rhs.lo;
        let d = self.hi * rhs.hi;
        Self {
            lo: a.min(b).min(c).min(d),
            hi: a.max(b).max(c).max(d),
        }
    }
}

impl Div for Interval {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        self * rhs.recip()
    }
}

impl Neg for Interval {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self {
            lo: -self.hi,
            hi: -self.lo,
        }
    }
}

impl Mul<f32> for Interval {
    type Output = Self;
    // Sign shortcut is safe here: the scalar's sign is statically known
    #[inline(always)]
    fn mul(self, rhs: f32) -> Self {
        if rhs >= 0.0 {
            Self {
                lo: self.lo * rhs,
                hi: self.hi * rhs,
            }
        } else {
            Self {
                lo: self.hi * rhs,
                hi: self.lo * rhs,
            }
        }
    }
}

impl Sub<f32> for Interval {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: f32) -> Self {
        Self {
            lo: self.lo - rhs,
            hi: self.hi - rhs,
        }
    }
}

// ============================================================
// Vec3Interval: 3D interval (axis-aligned box)
// ============================================================

/// 3D interval representing an axis-aligned box region
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3Interval {
    /// X interval
    pub x: Interval,
    /// Y interval
    pub y: Interval,
    /// Z interval
    pub z: Interval,
}

impl Vec3Interval {
    /// Create from min/max corners
    #[inline]
    pub fn from_bounds(min: Vec3, max: Vec3) -> Self {
        Self {
            x: Interval::new(min.x, max.x),
            y: Interval::new(min.y, max.y),
            z: Interval::new(min.z, max.z),
        }
    }

    /// Create a point box [v, v] on all axes
    #[inline]
    pub fn point(v: Vec3) -> Self {
        Self {
            x: Interval::point(v.x),
            y: Interval::point(v.y),
            z: Interval::point(v.z),
        }
    }

    /// Componentwise absolute value
    #[inline]
    pub fn abs(self) -> Self {
        Self {
            x: self.x.abs(),
            y: self.y.abs(),
            z: self.z.abs(),
        }
    }

    /// Componentwise minimum
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }

    /// Componentwise maximum
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
        }
    }

    /// Componentwise product (four-corner per axis)
    #[inline]
    pub fn mul_componentwise(self, other: Self) -> Self {
        Self {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z,
        }
    }

    /// Dot product bounds: sum of per-axis products
    #[inline]
    pub fn dot(self, other: Self) -> Interval {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product bounds, componentwise from the four-corner rule
    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// 3D interval length: sqrt(x² + y² + z²)
    ///
    /// Uses `sqr` rather than self-multiplication so that axes
    /// straddling zero do not widen the bound spuriously.
    #[inline]
    pub fn length(self) -> Interval {
        (self.x.sqr() + self.y.sqr() + self.z.sqr()).sqrt()
    }

    /// Component along an axis index (0, 1, 2)
    #[inline]
    pub fn component(self, index: usize) -> Interval {
        match index {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl Add for Vec3Interval {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Vec3Interval {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Mul<Interval> for Vec3Interval {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Interval) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Neg for Vec3Interval {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

// ============================================================
// Interval expression evaluation
// ============================================================

/// Interval-valued result of evaluating an expression
#[derive(Clone, Debug, PartialEq)]
pub enum IntervalValue {
    /// Scalar bounds
    Scalar(Interval),
    /// Per-axis vector bounds
    Vec3(Vec3Interval),
    /// Struct of named bounds, field order preserved
    Struct(Vec<(String, IntervalValue)>),
}

impl IntervalValue {
    fn scalar(self) -> Result<Interval, EvalError> {
        match self {
            IntervalValue::Scalar(i) => Ok(i),
            other => Err(EvalError::Type {
                expected: "float",
                found: other.kind_name(),
            }),
        }
    }

    fn vec3(self) -> Result<Vec3Interval, EvalError> {
        match self {
            IntervalValue::Vec3(v) => Ok(v),
            other => Err(EvalError::Type {
                expected: "vec3",
                found: other.kind_name(),
            }),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            IntervalValue::Scalar(_) => "float",
            IntervalValue::Vec3(_) => "vec3",
            IntervalValue::Struct(_) => "struct",
        }
    }
}

/// Evaluate an expression over interval-valued bindings
///
/// Soundness: for any point binding drawn from the input intervals,
/// the scalar evaluation of `expr` at that point lies within the
/// returned bounds.
///
/// Texture samples have no statically known bounds and evaluate to
/// the unbounded interval.
pub fn eval_expr_interval(
    expr: &Expr,
    bindings: &HashMap<String, IntervalValue>,
) -> Result<IntervalValue, EvalError> {
    use IntervalValue::{Scalar, Vec3 as V3};

    Ok(match expr {
        Expr::Const { value } => Scalar(Interval::point(*value)),
        Expr::Var { name, .. } => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable { name: name.clone() })?,

        Expr::Add { a, b } => {
            match (
                eval_expr_interval(a, bindings)?,
                eval_expr_interval(b, bindings)?,
            ) {
                (Scalar(a), Scalar(b)) => Scalar(a + b),
                (V3(a), V3(b)) => V3(a + b),
                (a, b) => return Err(type_pair("+", &a, &b)),
            }
        }
        Expr::Sub { a, b } => {
            match (
                eval_expr_interval(a, bindings)?,
                eval_expr_interval(b, bindings)?,
            ) {
                (Scalar(a), Scalar(b)) => Scalar(a - b),
                (V3(a), V3(b)) => V3(a - b),
                (a, b) => return Err(type_pair("-", &a, &b)),
            }
        }
        Expr::Mul { a, b } => {
            match (
                eval_expr_interval(a, bindings)?,
                eval_expr_interval(b, bindings)?,
            ) {
                (Scalar(a), Scalar(b)) => Scalar(a * b),
                (V3(a), V3(b)) => V3(a.mul_componentwise(b)),
                (V3(a), Scalar(b)) | (Scalar(b), V3(a)) => V3(a * b),
                (a, b) => return Err(type_pair("*", &a, &b)),
            }
        }
        Expr::Div { a, b } => {
            match (
                eval_expr_interval(a, bindings)?,
                eval_expr_interval(b, bindings)?,
            ) {
                (Scalar(a), Scalar(b)) => Scalar(a / b),
                (V3(a), Scalar(b)) => V3(a * b.recip()),
                (V3(a), V3(b)) => V3(Vec3Interval {
                    x: a.x / b.x,
                    y: a.y / b.y,
                    z: a.z / b.z,
                }),
                (a, b) => return Err(type_pair("/", &a, &b)),
            }
        }
        Expr::Neg { a } => match eval_expr_interval(a, bindings)? {
            Scalar(a) => Scalar(-a),
            V3(a) => V3(-a),
            other => return Err(type_one("-", &other)),
        },
        Expr::Min { a, b } => {
            match (
                eval_expr_interval(a, bindings)?,
                eval_expr_interval(b, bindings)?,
            ) {
                (Scalar(a), Scalar(b)) => Scalar(a.min(b)),
                (V3(a), V3(b)) => V3(a.min(b)),
                (a, b) => return Err(type_pair("min", &a, &b)),
            }
        }
        Expr::Max { a, b } => {
            match (
                eval_expr_interval(a, bindings)?,
                eval_expr_interval(b, bindings)?,
            ) {
                (Scalar(a), Scalar(b)) => Scalar(a.max(b)),
                (V3(a), V3(b)) => V3(a.max(b)),
                (a, b) => return Err(type_pair("max", &a, &b)),
            }
        }
        Expr::Abs { a } => match eval_expr_interval(a, bindings)? {
            Scalar(a) => Scalar(a.abs()),
            V3(a) => V3(a.abs()),
            other => return Err(type_one("abs", &other)),
        },
        Expr::Sqrt { a } => Scalar(eval_expr_interval(a, bindings)?.scalar()?.sqrt()),
        Expr::Sin { a } => Scalar(eval_expr_interval(a, bindings)?.scalar()?.sin()),
        Expr::Cos { a } => Scalar(eval_expr_interval(a, bindings)?.scalar()?.cos()),
        Expr::Mix { a, b, t } => {
            let t = eval_expr_interval(t, bindings)?.scalar()?;
            match (
                eval_expr_interval(a, bindings)?,
                eval_expr_interval(b, bindings)?,
            ) {
                (Scalar(a), Scalar(b)) => Scalar(a.lerp(b, t)),
                (V3(a), V3(b)) => V3(Vec3Interval {
                    x: a.x.lerp(b.x, t),
                    y: a.y.lerp(b.y, t),
                    z: a.z.lerp(b.z, t),
                }),
                (a, b) => return Err(type_pair("mix", &a, &b)),
            }
        }
        Expr::Step { edge, x } => {
            let edge = eval_expr_interval(edge, bindings)?.scalar()?;
            let x = eval_expr_interval(x, bindings)?.scalar()?;
            Scalar(edge.step(x))
        }
        Expr::Mod { a, b } => {
            let a = eval_expr_interval(a, bindings)?.scalar()?;
            let b = eval_expr_interval(b, bindings)?.scalar()?;
            Scalar(a.floor_mod(b))
        }
        Expr::VecConstruct { x, y, z } => V3(Vec3Interval {
            x: eval_expr_interval(x, bindings)?.scalar()?,
            y: eval_expr_interval(y, bindings)?.scalar()?,
            z: eval_expr_interval(z, bindings)?.scalar()?,
        }),
        Expr::VecComponent { v, axis } => {
            let v = eval_expr_interval(v, bindings)?.vec3()?;
            Scalar(v.component(axis.index()))
        }
        Expr::StructConstruct { fields } => IntervalValue::Struct(
            fields
                .iter()
                .map(|(name, value)| Ok((name.clone(), eval_expr_interval(value, bindings)?)))
                .collect::<Result<Vec<_>, EvalError>>()?,
        ),
        Expr::FieldAccess { base, field } => match eval_expr_interval(base, bindings)? {
            IntervalValue::Struct(fields) => fields
                .into_iter()
                .find(|(name, _)| name == field)
                .map(|(_, value)| value)
                .ok_or(EvalError::Type {
                    expected: "struct field",
                    found: "struct",
                })?,
            other => return Err(type_one("field access", &other)),
        },
        // Textures are opaque resources; no bound is known statically
        Expr::TextureSample { .. } => Scalar(Interval::EVERYTHING),
    })
}

fn type_pair(op: &'static str, a: &IntervalValue, _b: &IntervalValue) -> EvalError {
    EvalError::Type {
        expected: op,
        found: a.kind_name(),
    }
}

fn type_one(op: &'static str, a: &IntervalValue) -> EvalError {
    EvalError::Type {
        expected: op,
        found: a.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprType;

    #[test]
    fn test_interval_ops() {
        let a = Interval::new(1.0, 3.0);
        let b = Interval::new(2.0, 5.0);
        assert_eq!((a + b).lo, 3.0);
        assert_eq!((a + b).hi, 8.0);
        assert_eq!((a - b).lo, -4.0);
        assert_eq!((a - b).hi, 1.0);
        assert_eq!((-a).lo, -3.0);
        assert_eq!((-a).hi, -1.0);
    }

    #[test]
    fn test_four_corner_mul() {
        // Negative-straddling ranges must use the full corner scan
        let m = Interval::new(-2.0, 3.0) * Interval::new(-1.0, 4.0);
        assert_eq!(m.lo, -8.0);
        assert_eq!(m.hi, 12.0);
    }

    #[test]
    fn test_interval_abs() {
        assert_eq!(Interval::new(1.0, 3.0).abs().lo, 1.0);
        assert_eq!(Interval::new(-3.0, -1.0).abs().hi, 3.0);
        assert_eq!(Interval::new(-2.0, 3.0).abs().lo, 0.0);
    }

    #[test]
    fn test_interval_div() {
        let d = Interval::new(1.0, 2.0) / Interval::new(2.0, 4.0);
        assert_eq!(d.lo, 0.25);
        assert_eq!(d.hi, 1.0);
    }

    #[test]
    fn test_interval_sin() {
        // Interval crossing the π/2 peak must report hi = 1
        let s = Interval::new(1.0, 2.0).sin();
        assert_eq!(s.hi, 1.0);
        assert!((s.lo - 1.0f32.sin().min(2.0f32.sin())).abs() < 1e-6);
        // Wide interval saturates
        let w = Interval::new(0.0, 10.0).sin();
        assert_eq!((w.lo, w.hi), (-1.0, 1.0));
        // Narrow monotone interval stays tight
        let n = Interval::new(0.1, 0.2).sin();
        assert!((n.lo - 0.1f32.sin()).abs() < 1e-6);
        assert!((n.hi - 0.2f32.sin()).abs() < 1e-6);
    }

    #[test]
    fn test_interval_step() {
        let edge = Interval::point(1.0);
        assert_eq!(edge.step(Interval::new(-1.0, 0.5)), Interval::ZERO);
        assert_eq!(edge.step(Interval::new(2.0, 3.0)), Interval::point(1.0));
        assert_eq!(edge.step(Interval::new(0.5, 2.0)), Interval::new(0.0, 1.0));
    }

    #[test]
    fn test_vec3_length() {
        let b = Vec3Interval::from_bounds(Vec3::new(-1.0, -1.0, -1.0), Vec3::splat(1.0));
        let l = b.length();
        assert_eq!(l.lo, 0.0);
        assert!((l.hi - 3.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_vec3_dot_cross() {
        let a = Vec3Interval::point(Vec3::new(1.0, 0.0, 0.0));
        let b = Vec3Interval::point(Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(a.dot(b), Interval::ZERO);
        let c = a.cross(b);
        assert_eq!(c.z, Interval::point(1.0));
        assert_eq!(c.x, Interval::ZERO);
    }

    #[test]
    fn test_expr_interval_contains_point_eval() {
        use crate::eval::{evaluate, Value};
        use crate::parse::parse_expression;

        let mut env = HashMap::new();
        env.insert("p".to_string(), Expr::point_var("p"));
        let e = parse_expression("vlength(p) - 1.0", &env).unwrap();

        let region = Vec3Interval::from_bounds(Vec3::splat(-2.0), Vec3::splat(2.0));
        let mut ibind = HashMap::new();
        ibind.insert("p".to_string(), IntervalValue::Vec3(region));
        let bounds = match eval_expr_interval(&e, &ibind).unwrap() {
            IntervalValue::Scalar(i) => i,
            other => panic!("expected scalar bounds, got {:?}", other),
        };

        for p in [
            Vec3::ZERO,
            Vec3::new(2.0, -2.0, 2.0),
            Vec3::new(0.5, 0.5, -1.5),
        ] {
            let mut vals = HashMap::new();
            vals.insert("p".to_string(), Value::Vec3(p));
            let d = match evaluate(&e, &vals).unwrap() {
                Value::Float(d) => d,
                other => panic!("expected float, got {:?}", other),
            };
            assert!(
                bounds.contains(d),
                "{} not in [{}, {}]",
                d,
                bounds.lo,
                bounds.hi
            );
        }
    }

    #[test]
    fn test_var_type_annotation_unused_in_bounds() {
        // The declared var type does not constrain bindings; the bound value does
        let e = Expr::var("k", ExprType::Float);
        let mut ibind = HashMap::new();
        ibind.insert(
            "k".to_string(),
            IntervalValue::Scalar(Interval::new(1.0, 2.0)),
        );
        assert_eq!(
            eval_expr_interval(&e, &ibind).unwrap(),
            IntervalValue::Scalar(Interval::new(1.0, 2.0))
        );
    }
}
