// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Resolved values and constant-or-formula definitions.
//!
//! Every font attribute, parameter and skeleton field is stored as a
//! `ConstantOrFormula`. Callers only ever call `resolve` with a `Scope`;
//! they never branch on which variant they hold.

use super::formula::Formula;
use crate::error::FormulaError;
use kurbo::Vec2;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A resolved value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Vector(Vec2),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec2> {
        match self {
            Value::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Vector(_) => "vector",
            Value::Text(_) => "text",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

/// Name lookup used while evaluating formulas.
///
/// Lookups take `&mut self` so scopes can resolve lazily, memoize within a
/// single construction pass and record which names were read.
pub trait Scope {
    fn lookup(&mut self, name: &str) -> Result<Value, FormulaError>;
}

/// Resolve `name`, falling back to `.x`/`.y` projection of a vector value.
///
/// `serif.x` first looks for a value literally named `serif.x`; failing
/// that it looks up `serif` and takes its x component.
pub fn lookup_projected(
    name: &str,
    mut get: impl FnMut(&str) -> Result<Value, FormulaError>,
) -> Result<Value, FormulaError> {
    match get(name) {
        Err(FormulaError::UnknownName(_)) => {}
        other => return other,
    }
    let Some((base, axis)) = name.rsplit_once('.') else {
        return Err(FormulaError::UnknownName(name.to_string()));
    };
    let pick = |v: Vec2| match axis {
        "x" => Some(v.x),
        "y" => Some(v.y),
        _ => None,
    };
    match get(base) {
        Ok(Value::Vector(v)) => pick(v)
            .map(Value::Number)
            .ok_or_else(|| FormulaError::UnknownName(name.to_string())),
        Ok(_) | Err(FormulaError::UnknownName(_)) => {
            Err(FormulaError::UnknownName(name.to_string()))
        }
        Err(e) => Err(e),
    }
}

impl Scope for BTreeMap<String, Value> {
    fn lookup(&mut self, name: &str) -> Result<Value, FormulaError> {
        lookup_projected(name, |n| {
            self.get(n)
                .cloned()
                .ok_or_else(|| FormulaError::UnknownName(n.to_string()))
        })
    }
}

/// A literal value or a formula over the parameter environment
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantOrFormula {
    Literal(Value),
    Formula(Formula),
}

impl ConstantOrFormula {
    pub fn number(n: f64) -> Self {
        Self::Literal(Value::Number(n))
    }

    /// Parse formula text
    pub fn formula(text: &str) -> Result<Self, FormulaError> {
        Formula::parse(text).map(Self::Formula)
    }

    /// Resolve against a scope. Literals ignore the scope.
    pub fn resolve(&self, scope: &mut dyn Scope) -> Result<Value, FormulaError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Formula(formula) => formula.evaluate(scope),
        }
    }
}

impl Default for ConstantOrFormula {
    fn default() -> Self {
        Self::number(0.0)
    }
}

/// Source form: `12`, `"Text"`, `[x, y]` or `{"formula": "a * 2"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Text(String),
    Vector([f64; 2]),
    Formula { formula: String },
}

impl<'de> Deserialize<'de> for ConstantOrFormula {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawValue::deserialize(deserializer)? {
            RawValue::Number(n) => Self::number(n),
            RawValue::Text(s) => Self::Literal(Value::Text(s)),
            RawValue::Vector([x, y]) => Self::Literal(Value::Vector(Vec2::new(x, y))),
            RawValue::Formula { formula } => {
                Self::formula(&formula).map_err(serde::de::Error::custom)?
            }
        })
    }
}
