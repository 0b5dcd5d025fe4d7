// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Parametric font data model and construction engine

pub mod construct;
pub mod dependency;
pub mod font;
pub mod formula;
pub mod glyph;
pub mod overrides;
pub mod path;
pub mod source;
pub mod value;

pub use dependency::DependencyTree;
pub use font::{BuildRequest, ConstructedFont, Font};
pub use glyph::{ConstructedGlyph, Contour, Handle, Node, OnCurve, OutlinePoint, Target};
pub use overrides::{Changes, ComponentChoices, GlyphOverrides, ManualChanges};
pub use path::PointPath;
pub use source::{FontSource, Tangency};
pub use value::{ConstantOrFormula, Scope, Value};
