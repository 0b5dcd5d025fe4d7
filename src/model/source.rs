// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Font source definitions: what the parametric font is made of before any
//! parameter values are known.
//!
//! Every numeric field is a `ConstantOrFormula`. Sources are plain serde
//! structs so a host can hand them over as JSON.

use super::value::ConstantOrFormula;
use crate::geometry::TransformKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whole font source: metadata, parameter definitions and glyph templates
#[derive(Debug, Clone, Deserialize)]
pub struct FontSource {
    #[serde(default)]
    pub fontinfo: FontInfoSource,
    #[serde(default)]
    pub parameters: BTreeMap<String, ConstantOrFormula>,
    #[serde(default)]
    pub glyphs: BTreeMap<String, GlyphSource>,
}

impl FontSource {
    /// Parse a font source from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse font source JSON")
    }
}

/// Font-level attributes, each resolved on every construction pass
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontInfoSource {
    #[serde(default)]
    pub family_name: ConstantOrFormula,
    #[serde(default)]
    pub version: ConstantOrFormula,
    #[serde(default)]
    pub description: ConstantOrFormula,
    #[serde(default)]
    pub ascender: ConstantOrFormula,
    #[serde(default)]
    pub descender: ConstantOrFormula,
    #[serde(rename = "cap-height", default)]
    pub cap_height: ConstantOrFormula,
    #[serde(rename = "descendent-height", default)]
    pub descendent_height: ConstantOrFormula,
}

/// Template for one glyph
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphSource {
    pub name: String,
    #[serde(default)]
    pub unicode: Option<u32>,
    /// Glyph this one is an alternate of; overrides are stored under it
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub advance_width: ConstantOrFormula,
    #[serde(default)]
    pub spacing_left: ConstantOrFormula,
    #[serde(default)]
    pub spacing_right: ConstantOrFormula,
    #[serde(default)]
    pub contours: Vec<ContourSource>,
    #[serde(default)]
    pub components: Vec<ComponentSource>,
    #[serde(default)]
    pub transforms: Vec<TransformSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContourSource {
    /// Skeleton contours expand every node into two outline points
    #[serde(default)]
    pub skeleton: bool,
    #[serde(default = "default_closed")]
    pub closed: bool,
    pub nodes: Vec<NodeSource>,
}

/// A skeleton node and its derivation formulas
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSource {
    pub x: ConstantOrFormula,
    pub y: ConstantOrFormula,
    #[serde(default)]
    pub width: ConstantOrFormula,
    #[serde(default)]
    pub angle: ConstantOrFormula,
    #[serde(default = "default_distr")]
    pub distr: ConstantOrFormula,
    /// Incoming handle, relative to the node
    #[serde(default, rename = "in")]
    pub handle_in: HandleSource,
    /// Outgoing handle, relative to the node
    #[serde(default, rename = "out")]
    pub handle_out: HandleSource,
    #[serde(default)]
    pub type_in: Tangency,
    #[serde(default)]
    pub type_out: Tangency,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandleSource {
    #[serde(default)]
    pub x: ConstantOrFormula,
    #[serde(default)]
    pub y: ConstantOrFormula,
}

/// Tangency of one side of an on-curve point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tangency {
    Smooth,
    #[default]
    Corner,
}

/// A sub-glyph placement with interchangeable variants
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentSource {
    pub id: String,
    #[serde(default)]
    pub class: Option<String>,
    /// Default base glyph
    pub base: String,
    /// Every base glyph the user may switch to
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub transforms: Vec<TransformSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformSource {
    pub kind: TransformKind,
    pub param: ConstantOrFormula,
}

fn default_closed() -> bool {
    true
}

fn default_distr() -> ConstantOrFormula {
    ConstantOrFormula::number(0.5)
}
