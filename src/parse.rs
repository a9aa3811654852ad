//! Textual formula parser
//!
//! Parses user-entered math formulas like `vlength(p) - 1.0` into the
//! expression IR. Recursive descent with the usual precedence ladder:
//! `+` `-` bind loosest, then `*` `/`, then unary minus, then calls and
//! parenthesised groups.
//!
//! Vector helpers that the IR has no dedicated kind for (`vlength`,
//! `dot`, `cross`) are lowered here into scalar compositions over
//! vector components, so the IR's kind set stays closed.
//!
//! Author: Moroya Sakamoto

use crate::expr::{Axis, Expr, ExprError};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while parsing a formula
///
/// Every variant carries the byte offset into the source text where
/// the problem was detected, for editor-side caret placement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Character outside the token alphabet
    #[error("unexpected character `{ch}` at position {pos}")]
    UnexpectedChar {
        /// The offending character
        ch: char,
        /// Byte offset in the source
        pos: usize,
    },

    /// Token that no grammar rule accepts here
    #[error("unexpected `{found}` at position {pos}")]
    UnexpectedToken {
        /// Rendered token text
        found: String,
        /// Byte offset in the source
        pos: usize,
    },

    /// Input ended mid-expression
    #[error("unexpected end of input at position {pos}")]
    UnexpectedEnd {
        /// Byte offset in the source
        pos: usize,
    },

    /// Numeric literal that does not parse as f32
    #[error("malformed number `{text}` at position {pos}")]
    MalformedNumber {
        /// Literal text
        text: String,
        /// Byte offset in the source
        pos: usize,
    },

    /// Identifier with no binding in the variable environment
    #[error("unknown variable `{name}` at position {pos}")]
    UnknownVariable {
        /// Identifier text
        name: String,
        /// Byte offset in the source
        pos: usize,
    },

    /// Call to a function outside the builtin table
    #[error("unknown function `{name}` at position {pos}")]
    UnknownFunction {
        /// Identifier text
        name: String,
        /// Byte offset in the source
        pos: usize,
    },

    /// Builtin called with the wrong number of arguments
    #[error("`{name}` takes {expected} argument(s), got {found} at position {pos}")]
    ArityMismatch {
        /// Function name
        name: String,
        /// Required argument count
        expected: usize,
        /// Supplied argument count
        found: usize,
        /// Byte offset in the source
        pos: usize,
    },

    /// Division by a literal zero, rejected before the tree is built
    #[error("division by zero at position {pos}")]
    DivisionByZero {
        /// Byte offset in the source
        pos: usize,
    },

    /// Well-formed syntax that fails IR typing rules
    #[error("{source} at position {pos}")]
    Type {
        /// Underlying construction error
        source: ExprError,
        /// Byte offset in the source
        pos: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f32),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

impl TokenKind {
    fn render(&self) -> String {
        match self {
            TokenKind::Number(v) => format!("{}", v),
            TokenKind::Ident(s) => s.clone(),
            TokenKind::Plus => "+".to_string(),
            TokenKind::Minus => "-".to_string(),
            TokenKind::Star => "*".to_string(),
            TokenKind::Slash => "/".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::Comma => ",".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
            }
            '+' => {
                tokens.push(Token { kind: TokenKind::Plus, pos: i });
                i += 1;
            }
            '-' => {
                tokens.push(Token { kind: TokenKind::Minus, pos: i });
                i += 1;
            }
            '*' => {
                tokens.push(Token { kind: TokenKind::Star, pos: i });
                i += 1;
            }
            '/' => {
                tokens.push(Token { kind: TokenKind::Slash, pos: i });
                i += 1;
            }
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, pos: i });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, pos: i });
                i += 1;
            }
            ',' => {
                tokens.push(Token { kind: TokenKind::Comma, pos: i });
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                let literal = &text[start..i];
                let value: f32 = literal.parse().map_err(|_| ParseError::MalformedNumber {
                    text: literal.to_string(),
                    pos: start,
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    pos: start,
                });
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && matches!(bytes[i] as char, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
                {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(text[start..i].to_string()),
                    pos: start,
                });
            }
            other => {
                return Err(ParseError::UnexpectedChar { ch: other, pos: i });
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    source_len: usize,
    env: &'a HashMap<String, Expr>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.index).cloned();
        if t.is_some() {
            self.index += 1;
        }
        t
    }

    fn end_pos(&self) -> usize {
        self.source_len
    }

    fn expect(&mut self, kind: TokenKind) -> Result<usize, ParseError> {
        match self.advance() {
            Some(t) if t.kind == kind => Ok(t.pos),
            Some(t) => Err(ParseError::UnexpectedToken {
                found: t.kind.render(),
                pos: t.pos,
            }),
            None => Err(ParseError::UnexpectedEnd { pos: self.end_pos() }),
        }
    }

    fn typed(result: Result<Expr, ExprError>, pos: usize) -> Result<Expr, ParseError> {
        result.map_err(|e| match e {
            ExprError::DivisionByZero => ParseError::DivisionByZero { pos },
            other => ParseError::Type { source: other, pos },
        })
    }

    // additive := multiplicative (('+' | '-') multiplicative)*
    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.multiplicative()?;
        while let Some(t) = self.peek() {
            let (pos, is_add) = match t.kind {
                TokenKind::Plus => (t.pos, true),
                TokenKind::Minus => (t.pos, false),
                _ => break,
            };
            self.index += 1;
            let rhs = self.multiplicative()?;
            lhs = if is_add {
                Self::typed(lhs.add(rhs), pos)?
            } else {
                Self::typed(lhs.sub(rhs), pos)?
            };
        }
        Ok(lhs)
    }

    // multiplicative := unary (('*' | '/') unary)*
    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        while let Some(t) = self.peek() {
            let (pos, is_mul) = match t.kind {
                TokenKind::Star => (t.pos, true),
                TokenKind::Slash => (t.pos, false),
                _ => break,
            };
            self.index += 1;
            let rhs = self.unary()?;
            lhs = if is_mul {
                Self::typed(lhs.mul(rhs), pos)?
            } else {
                Self::typed(lhs.div(rhs), pos)?
            };
        }
        Ok(lhs)
    }

    // unary := '-' unary | primary
    fn unary(&mut self) -> Result<Expr, ParseError> {
        if let Some(t) = self.peek() {
            if t.kind == TokenKind::Minus {
                let pos = t.pos;
                self.index += 1;
                let operand = self.unary()?;
                return Self::typed(operand.neg(), pos);
            }
        }
        self.primary()
    }

    // primary := number | ident | ident '(' args ')' | '(' additive ')'
    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self
            .advance()
            .ok_or(ParseError::UnexpectedEnd { pos: self.end_pos() })?;
        match token.kind {
            TokenKind::Number(value) => Ok(Expr::constant(value)),
            TokenKind::LParen => {
                let inner = self.additive()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                if matches!(self.peek(), Some(t) if t.kind == TokenKind::LParen) {
                    self.index += 1;
                    let args = self.arguments()?;
                    self.call(&name, args, token.pos)
                } else {
                    match self.env.get(&name) {
                        Some(bound) => Ok(bound.clone()),
                        None => Err(ParseError::UnknownVariable {
                            name,
                            pos: token.pos,
                        }),
                    }
                }
            }
            other => Err(ParseError::UnexpectedToken {
                found: other.render(),
                pos: token.pos,
            }),
        }
    }

    // arguments := additive (',' additive)* ')'   (opening paren already consumed)
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(t) if t.kind == TokenKind::RParen) {
            self.index += 1;
            return Ok(args);
        }
        loop {
            args.push(self.additive()?);
            match self.advance() {
                Some(t) if t.kind == TokenKind::Comma => continue,
                Some(t) if t.kind == TokenKind::RParen => return Ok(args),
                Some(t) => {
                    return Err(ParseError::UnexpectedToken {
                        found: t.kind.render(),
                        pos: t.pos,
                    })
                }
                None => return Err(ParseError::UnexpectedEnd { pos: self.end_pos() }),
            }
        }
    }

    fn arity(
        name: &str,
        expected: usize,
        args: &[Expr],
        pos: usize,
    ) -> Result<(), ParseError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(ParseError::ArityMismatch {
                name: name.to_string(),
                expected,
                found: args.len(),
                pos,
            })
        }
    }

    fn call(&mut self, name: &str, mut args: Vec<Expr>, pos: usize) -> Result<Expr, ParseError> {
        match name {
            "sqrt" | "sin" | "cos" | "abs" | "vlength" => {
                Self::arity(name, 1, &args, pos)?;
                let a = args.remove(0);
                match name {
                    "sqrt" => Self::typed(a.sqrt(), pos),
                    "sin" => Self::typed(a.sin(), pos),
                    "cos" => Self::typed(a.cos(), pos),
                    "abs" => Self::typed(a.abs(), pos),
                    "vlength" => Self::typed(lower_vlength(a), pos),
                    _ => unreachable!(),
                }
            }
            "min" | "max" | "step" | "mod" | "dot" | "cross" => {
                Self::arity(name, 2, &args, pos)?;
                let b = args.remove(1);
                let a = args.remove(0);
                match name {
                    "min" => Self::typed(a.min(b), pos),
                    "max" => Self::typed(a.max(b), pos),
                    "step" => Self::typed(a.step(b), pos),
                    "mod" => Self::typed(a.modulo(b), pos),
                    "dot" => Self::typed(lower_dot(a, b), pos),
                    "cross" => Self::typed(lower_cross(a, b), pos),
                    _ => unreachable!(),
                }
            }
            "vec3" => {
                Self::arity(name, 3, &args, pos)?;
                let z = args.remove(2);
                let y = args.remove(1);
                let x = args.remove(0);
                Self::typed(Expr::vec3(x, y, z), pos)
            }
            "mix" => {
                Self::arity(name, 3, &args, pos)?;
                let t = args.remove(2);
                let b = args.remove(1);
                let a = args.remove(0);
                Self::typed(a.mix(b, t), pos)
            }
            _ => Err(ParseError::UnknownFunction {
                name: name.to_string(),
                pos,
            }),
        }
    }
}

/// `vlength(v)` = sqrt(v.x² + v.y² + v.z²), built from components so
/// the IR needs no dedicated length kind
fn lower_vlength(v: Expr) -> Result<Expr, ExprError> {
    let x = v.clone().component(Axis::X)?;
    let y = v.clone().component(Axis::Y)?;
    let z = v.component(Axis::Z)?;
    let xx = x.clone().mul(x)?;
    let yy = y.clone().mul(y)?;
    let zz = z.clone().mul(z)?;
    xx.add(yy)?.add(zz)?.sqrt()
}

fn lower_dot(a: Expr, b: Expr) -> Result<Expr, ExprError> {
    let xx = a.clone().component(Axis::X)?.mul(b.clone().component(Axis::X)?)?;
    let yy = a.clone().component(Axis::Y)?.mul(b.clone().component(Axis::Y)?)?;
    let zz = a.component(Axis::Z)?.mul(b.component(Axis::Z)?)?;
    xx.add(yy)?.add(zz)
}

fn lower_cross(a: Expr, b: Expr) -> Result<Expr, ExprError> {
    let (ax, ay, az) = (
        a.clone().component(Axis::X)?,
        a.clone().component(Axis::Y)?,
        a.component(Axis::Z)?,
    );
    let (bx, by, bz) = (
        b.clone().component(Axis::X)?,
        b.clone().component(Axis::Y)?,
        b.component(Axis::Z)?,
    );
    let cx = ay.clone().mul(bz.clone())?.sub(az.clone().mul(by.clone())?)?;
    let cy = az.mul(bx.clone())?.sub(ax.clone().mul(bz)?)?;
    let cz = ax.mul(by)?.sub(ay.mul(bx)?)?;
    Expr::vec3(cx, cy, cz)
}

/// Parse a formula against a variable environment
///
/// `env` maps identifier names to the expressions they stand for;
/// identifiers outside it are reported as [`ParseError::UnknownVariable`]
/// with the identifier's source position.
pub fn parse_expression(text: &str, env: &HashMap<String, Expr>) -> Result<Expr, ParseError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ParseError::UnexpectedEnd { pos: text.len() });
    }
    let mut parser = Parser {
        tokens,
        index: 0,
        source_len: text.len(),
        env,
    };
    let expr = parser.additive()?;
    if let Some(t) = parser.peek() {
        return Err(ParseError::UnexpectedToken {
            found: t.kind.render(),
            pos: t.pos,
        });
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{evaluate, Value};
    use glam::Vec3;

    fn point_env() -> HashMap<String, Expr> {
        let mut env = HashMap::new();
        env.insert("p".to_string(), Expr::point_var("p"));
        env
    }

    fn eval_at(text: &str, p: Vec3) -> f32 {
        let expr = parse_expression(text, &point_env()).unwrap();
        let mut bindings = HashMap::new();
        bindings.insert("p".to_string(), Value::Vec3(p));
        evaluate(&expr, &bindings).unwrap().as_float().unwrap()
    }

    #[test]
    fn test_sphere_formula() {
        assert!((eval_at("vlength(p) - 1.0", Vec3::ZERO) - (-1.0)).abs() < 1e-6);
        assert!((eval_at("vlength(p) - 1.0", Vec3::new(3.0, 4.0, 0.0)) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_precedence_and_unary() {
        assert_eq!(eval_at("1 + 2 * 3", Vec3::ZERO), 7.0);
        assert_eq!(eval_at("(1 + 2) * 3", Vec3::ZERO), 9.0);
        assert_eq!(eval_at("-2 * 3", Vec3::ZERO), -6.0);
        assert_eq!(eval_at("2 - -3", Vec3::ZERO), 5.0);
    }

    #[test]
    fn test_builtins() {
        assert_eq!(eval_at("min(2, 3)", Vec3::ZERO), 2.0);
        assert_eq!(eval_at("max(2, 3)", Vec3::ZERO), 3.0);
        assert_eq!(eval_at("abs(0 - 5)", Vec3::ZERO), 5.0);
        assert_eq!(eval_at("sqrt(9)", Vec3::ZERO), 3.0);
        assert_eq!(eval_at("mix(0, 10, 0.25)", Vec3::ZERO), 2.5);
        assert_eq!(eval_at("step(1, 2)", Vec3::ZERO), 1.0);
        assert_eq!(eval_at("mod(7, 3)", Vec3::ZERO), 1.0);
        assert_eq!(eval_at("dot(vec3(1, 2, 3), vec3(4, 5, 6))", Vec3::ZERO), 32.0);
        assert_eq!(
            eval_at("vlength(cross(vec3(1, 0, 0), vec3(0, 1, 0)))", Vec3::ZERO),
            1.0
        );
    }

    #[test]
    fn test_unknown_variable_position() {
        let err = parse_expression("q + 1", &point_env()).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownVariable {
                name: "q".to_string(),
                pos: 0
            }
        );
    }

    #[test]
    fn test_unknown_function() {
        let err = parse_expression("tan(1)", &point_env()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownFunction { ref name, pos: 0 } if name == "tan"));
    }

    #[test]
    fn test_arity() {
        let err = parse_expression("min(1)", &point_env()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::ArityMismatch { expected: 2, found: 1, .. }
        ));
    }

    #[test]
    fn test_literal_zero_divisor_rejected() {
        let err = parse_expression("1 / 0", &point_env()).unwrap_err();
        assert_eq!(err, ParseError::DivisionByZero { pos: 2 });
    }

    #[test]
    fn test_type_error_carries_position() {
        // vec3 + scalar fails IR typing, reported at the operator
        let err = parse_expression("p + 1", &point_env()).unwrap_err();
        assert!(matches!(err, ParseError::Type { pos: 2, .. }));
    }

    #[test]
    fn test_malformed_number() {
        let err = parse_expression("1.2.3", &point_env()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedNumber { .. }));
    }

    #[test]
    fn test_unexpected_end() {
        let err = parse_expression("1 +", &point_env()).unwrap_err();
        assert_eq!(err, ParseError::UnexpectedEnd { pos: 3 });
    }

    #[test]
    fn test_unexpected_char() {
        let err = parse_expression("1 & 2", &point_env()).unwrap_err();
        assert_eq!(err, ParseError::UnexpectedChar { ch: '&', pos: 2 });
    }
}
