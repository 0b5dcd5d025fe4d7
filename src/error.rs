// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Error types for path parsing, formula evaluation and construction.
//!
//! The interactive edit engine never surfaces these: a failed lookup there
//! just skips the edit for the current frame.

use thiserror::Error;

/// Failure to parse a dotted point path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty point path")]
    Empty,
    #[error("empty segment in point path '{0}'")]
    EmptySegment(String),
}

/// Failure to parse or evaluate a formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("unknown name '{0}'")]
    UnknownName(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("function '{name}' expects {expected} arguments, got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("type mismatch: {0}")]
    Type(String),
    #[error("reference cycle through '{0}'")]
    Cycle(String),
}

/// Failure while constructing a glyph or a font
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructError {
    #[error("failed to resolve '{path}': {source}")]
    Formula {
        path: String,
        #[source]
        source: FormulaError,
    },
    #[error("'{0}' must resolve to a number")]
    NotANumber(String),
    #[error("component cycle through glyph '{0}'")]
    ComponentCycle(String),
    #[error("component '{component}' of glyph '{glyph}' refers to missing glyph '{base}'")]
    MissingComponentBase {
        glyph: String,
        component: String,
        base: String,
    },
}

impl ConstructError {
    pub(crate) fn formula(path: impl Into<String>, source: FormulaError) -> Self {
        Self::Formula {
            path: path.into(),
            source,
        }
    }
}
