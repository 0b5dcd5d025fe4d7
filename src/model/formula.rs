// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Formula language for parametric values.
//!
//! Formulas are parsed once into an expression tree and evaluated on every
//! construction pass. The grammar, loosest binding first:
//!
//! ```text
//! expr    = term (("+" | "-") term)*
//! term    = unary (("*" | "/") unary)*
//! unary   = "-" unary | power
//! power   = primary ("^" unary)?
//! primary = number | name | name "(" args ")" | "(" expr ")"
//! ```
//!
//! Names may be dotted (`contours.0.nodes.1.x`); resolution is up to the
//! `Scope`.

use super::value::{Scope, Value};
use crate::error::FormulaError;
use kurbo::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Name(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

/// A parsed formula together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        if let Some(token) = parser.peek() {
            return Err(FormulaError::UnexpectedToken(token.to_string()));
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn evaluate(&self, scope: &mut dyn Scope) -> Result<Value, FormulaError> {
        eval(&self.expr, scope)
    }
}

// ============================================================================
// LEXER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Name(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Name(n) => f.write_str(n),
            Token::Op(c) => write!(f, "{c}"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' | '-' | '*' | '/' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| FormulaError::UnexpectedChar { ch: c, offset: start })?;
                tokens.push(Token::Number(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() {
                    if is_name_char(chars[i]) {
                        i += 1;
                    } else if chars[i] == '.' && chars.get(i + 1).is_some_and(|&n| is_name_char(n))
                    {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            _ => return Err(FormulaError::UnexpectedChar { ch: c, offset: i }),
        }
    }

    Ok(tokens)
}

// ============================================================================
// PARSER
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, FormulaError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(FormulaError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(c)) if ops.contains(c) => {
                let c = *c;
                self.pos += 1;
                Some(c)
            }
            _ => None,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        let token = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(FormulaError::UnexpectedToken(token.to_string()))
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/']) {
            let rhs = self.unary()?;
            let op = if op == '*' { BinaryOp::Mul } else { BinaryOp::Div };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if self.eat_op(&['-']).is_some() {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.primary()?;
        if self.eat_op(&['^']).is_some() {
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.next()? {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Name(name) => {
                if self.peek() != Some(&Token::LParen) {
                    return Ok(Expr::Name(name));
                }
                self.pos += 1;
                let mut args = Vec::new();
                if self.peek() == Some(&Token::RParen) {
                    self.pos += 1;
                    return Ok(Expr::Call(name, args));
                }
                loop {
                    args.push(self.expr()?);
                    match self.next()? {
                        Token::Comma => continue,
                        Token::RParen => break,
                        other => return Err(FormulaError::UnexpectedToken(other.to_string())),
                    }
                }
                Ok(Expr::Call(name, args))
            }
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(FormulaError::UnexpectedToken(other.to_string())),
        }
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

fn eval(expr: &Expr, scope: &mut dyn Scope) -> Result<Value, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Name(name) => scope.lookup(name),
        Expr::Neg(inner) => match eval(inner, scope)? {
            Value::Number(n) => Ok(Value::Number(-n)),
            Value::Vector(v) => Ok(Value::Vector(-v)),
            Value::Text(_) => Err(FormulaError::Type("cannot negate text".to_string())),
        },
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(lhs, scope)?;
            let rhs = eval(rhs, scope)?;
            binary(*op, lhs, rhs)
        }
        Expr::Call(name, args) => {
            let values = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, &values)
        }
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, FormulaError> {
    use BinaryOp::{Add, Div, Mul, Pow, Sub};
    use Value::{Number, Vector};

    let value = match (op, lhs, rhs) {
        (Add, Number(a), Number(b)) => Number(a + b),
        (Sub, Number(a), Number(b)) => Number(a - b),
        (Mul, Number(a), Number(b)) => Number(a * b),
        (Pow, Number(a), Number(b)) => Number(a.powf(b)),
        (Div, Number(_), Number(b)) | (Div, Vector(_), Number(b)) if b == 0.0 => {
            return Err(FormulaError::Type("division by zero".to_string()));
        }
        (Div, Number(a), Number(b)) => Number(a / b),
        (Add, Vector(a), Vector(b)) => Vector(a + b),
        (Sub, Vector(a), Vector(b)) => Vector(a - b),
        (Mul, Vector(v), Number(n)) | (Mul, Number(n), Vector(v)) => Vector(v * n),
        (Div, Vector(v), Number(n)) => Vector(v / n),
        (op, lhs, rhs) => {
            return Err(FormulaError::Type(format!(
                "{op:?} of {} and {}",
                lhs.type_name(),
                rhs.type_name()
            )));
        }
    };
    Ok(value)
}

fn numbers(name: &str, args: &[Value], expected: usize) -> Result<Vec<f64>, FormulaError> {
    if args.len() != expected {
        return Err(FormulaError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    args.iter()
        .map(|v| {
            v.as_number()
                .ok_or_else(|| FormulaError::Type(format!("{name} expects numbers")))
        })
        .collect()
}

fn call(name: &str, args: &[Value]) -> Result<Value, FormulaError> {
    let unary = |f: fn(f64) -> f64| -> Result<Value, FormulaError> {
        Ok(Value::Number(f(numbers(name, args, 1)?[0])))
    };

    match name {
        "abs" => unary(f64::abs),
        "sqrt" => unary(f64::sqrt),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(f64::round),
        "atan2" => {
            let n = numbers(name, args, 2)?;
            Ok(Value::Number(n[0].atan2(n[1])))
        }
        "hypot" => {
            let n = numbers(name, args, 2)?;
            Ok(Value::Number(n[0].hypot(n[1])))
        }
        "clamp" => {
            let n = numbers(name, args, 3)?;
            Ok(Value::Number(n[0].max(n[1]).min(n[2])))
        }
        "vec" => {
            let n = numbers(name, args, 2)?;
            Ok(Value::Vector(Vec2::new(n[0], n[1])))
        }
        "min" | "max" => {
            if args.is_empty() {
                return Err(FormulaError::Arity {
                    name: name.to_string(),
                    expected: 1,
                    got: 0,
                });
            }
            let n = numbers(name, args, args.len())?;
            let pick: fn(f64, f64) -> f64 = if name == "min" { f64::min } else { f64::max };
            Ok(Value::Number(n[1..].iter().fold(n[0], |acc, &x| pick(acc, x))))
        }
        "lerp" => {
            if args.len() != 3 {
                return Err(FormulaError::Arity {
                    name: name.to_string(),
                    expected: 3,
                    got: args.len(),
                });
            }
            let t = args[2]
                .as_number()
                .ok_or_else(|| FormulaError::Type("lerp factor must be a number".to_string()))?;
            match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + (b - a) * t)),
                (Value::Vector(a), Value::Vector(b)) => Ok(Value::Vector(a.lerp(*b, t))),
                _ => Err(FormulaError::Type("lerp of mismatched values".to_string())),
            }
        }
        _ => Err(FormulaError::UnknownFunction(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn eval_str(text: &str) -> Result<Value, FormulaError> {
        let mut env: BTreeMap<String, Value> = BTreeMap::new();
        env.insert("width".to_string(), Value::Number(100.0));
        env.insert("contours.0.nodes.1.x".to_string(), Value::Number(7.0));
        env.insert("shift".to_string(), Value::Vector(Vec2::new(2.0, -2.0)));
        Formula::parse(text)?.evaluate(&mut env)
    }

    #[test]
    fn precedence() {
        assert_eq!(eval_str("1 + 2 * 3").unwrap(), Value::Number(7.0));
        assert_eq!(eval_str("(1 + 2) * 3").unwrap(), Value::Number(9.0));
        assert_eq!(eval_str("-2 ^ 2").unwrap(), Value::Number(-4.0));
        assert_eq!(eval_str("2 ^ 3 ^ 2").unwrap(), Value::Number(512.0));
        assert_eq!(eval_str("10 - 4 - 3").unwrap(), Value::Number(3.0));
    }

    #[test]
    fn dotted_names_and_functions() {
        assert_eq!(
            eval_str("contours.0.nodes.1.x + width / 4").unwrap(),
            Value::Number(32.0)
        );
        assert_eq!(eval_str("max(1, width, 3)").unwrap(), Value::Number(100.0));
        assert_eq!(eval_str("clamp(150, 0, width)").unwrap(), Value::Number(100.0));
        assert_eq!(eval_str("lerp(0, width, 0.25)").unwrap(), Value::Number(25.0));
    }

    #[test]
    fn vector_arithmetic() {
        assert_eq!(
            eval_str("vec(1, 1) + shift * 2").unwrap(),
            Value::Vector(Vec2::new(5.0, -3.0))
        );
        assert!(matches!(
            eval_str("vec(1, 1) * vec(1, 1)"),
            Err(FormulaError::Type(_))
        ));
    }

    #[test]
    fn errors() {
        assert!(matches!(eval_str("1 +"), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(eval_str("1 2"), Err(FormulaError::UnexpectedToken(_))));
        assert!(matches!(eval_str("nope"), Err(FormulaError::UnknownName(_))));
        assert!(matches!(eval_str("frob(1)"), Err(FormulaError::UnknownFunction(_))));
        assert!(matches!(eval_str("sin(1, 2)"), Err(FormulaError::Arity { .. })));
        assert!(matches!(eval_str("1 / 0"), Err(FormulaError::Type(_))));
        assert!(matches!(
            eval_str("1 # 2"),
            Err(FormulaError::UnexpectedChar { ch: '#', offset: 2 })
        ));
    }
}
