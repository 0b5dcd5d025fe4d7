// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! The parametric font: holds definitions, builds concrete glyphs on demand.

use super::construct::{GlyphContext, construct_glyph};
use super::glyph::ConstructedGlyph;
use super::overrides::{ComponentChoices, ManualChanges};
use super::source::{FontInfoSource, FontSource, GlyphSource};
use super::value::{ConstantOrFormula, Scope, Value, lookup_projected};
use crate::error::{ConstructError, FormulaError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Inputs of one construction pass
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Parameter values; these win over the font's own definitions
    pub params: BTreeMap<String, Value>,
    pub manual_changes: ManualChanges,
    pub glyph_component_choice: ComponentChoices,
    /// Characters to build
    pub subset: Vec<char>,
    /// Character → glyph name, checked before the unicode table
    pub alt_list: BTreeMap<char, String>,
}

/// Result of a construction pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructedFont {
    /// Resolved font-level attributes, keyed by their source names
    pub attributes: BTreeMap<String, Value>,
    pub glyphs: Vec<ConstructedGlyph>,
}

impl ConstructedFont {
    pub fn glyph(&self, name: &str) -> Option<&ConstructedGlyph> {
        self.glyphs.iter().find(|g| g.name == name)
    }
}

/// Defaults stored with the font, merged under every request
#[derive(Debug, Clone, Default)]
pub struct ParamBase {
    pub manual_changes: ManualChanges,
    pub glyph_component_choice: ComponentChoices,
}

pub struct Font {
    info: FontInfoSource,
    parameters: BTreeMap<String, ConstantOrFormula>,
    glyphs: BTreeMap<String, GlyphSource>,
    unicode_to_glyph: BTreeMap<u32, String>,
    pub param_base: ParamBase,
}

impl Font {
    pub fn new(source: FontSource) -> Self {
        let unicode_to_glyph = source
            .glyphs
            .values()
            .filter_map(|g| Some((g.unicode?, g.name.clone())))
            .collect();
        tracing::info!(
            "[Font] Loaded {} glyphs, {} parameters",
            source.glyphs.len(),
            source.parameters.len()
        );
        Self {
            info: source.fontinfo,
            parameters: source.parameters,
            glyphs: source.glyphs,
            unicode_to_glyph,
            param_base: ParamBase::default(),
        }
    }

    pub fn glyph_source(&self, name: &str) -> Option<&GlyphSource> {
        self.glyphs.get(name)
    }

    /// Glyph name for a character: alternate table first, then unicode
    pub fn glyph_name_for<'a>(
        &'a self,
        ch: char,
        alt_list: &'a BTreeMap<char, String>,
    ) -> Option<&'a str> {
        alt_list
            .get(&ch)
            .map(String::as_str)
            .or_else(|| self.unicode_to_glyph.get(&(ch as u32)).map(String::as_str))
    }

    /// Build the requested characters
    pub fn construct(&self, request: &BuildRequest) -> Result<ConstructedFont, ConstructError> {
        let manual_changes = self.param_base.manual_changes.merged(&request.manual_changes);
        let choices = self
            .param_base
            .glyph_component_choice
            .merged(&request.glyph_component_choice);
        let mut env = FontScope::new(&request.params, &self.parameters);

        let info = &self.info;
        let mut attributes = BTreeMap::new();
        for (name, definition) in [
            ("familyName", &info.family_name),
            ("version", &info.version),
            ("description", &info.description),
            ("ascender", &info.ascender),
            ("descender", &info.descender),
            ("cap-height", &info.cap_height),
            ("descendent-height", &info.descendent_height),
        ] {
            let value = definition
                .resolve(&mut env)
                .map_err(|e| ConstructError::formula(name, e))?;
            attributes.insert(name.to_string(), value);
        }

        let context = GlyphContext {
            glyphs: &self.glyphs,
            manual_changes: &manual_changes,
            component_choices: &choices,
        };
        let mut glyphs = Vec::new();
        for &ch in &request.subset {
            let Some(source) = self
                .glyph_name_for(ch, &request.alt_list)
                .and_then(|name| self.glyphs.get(name))
            else {
                tracing::debug!("[Font] No glyph for {:?}, skipping", ch);
                continue;
            };
            glyphs.push(construct_glyph(source, &context, &mut env)?);
        }

        Ok(ConstructedFont { attributes, glyphs })
    }

    /// Build a single glyph by name
    pub fn construct_glyph(
        &self,
        name: &str,
        request: &BuildRequest,
    ) -> Result<Option<ConstructedGlyph>, ConstructError> {
        let Some(source) = self.glyphs.get(name) else {
            return Ok(None);
        };
        let manual_changes = self.param_base.manual_changes.merged(&request.manual_changes);
        let choices = self
            .param_base
            .glyph_component_choice
            .merged(&request.glyph_component_choice);
        let context = GlyphContext {
            glyphs: &self.glyphs,
            manual_changes: &manual_changes,
            component_choices: &choices,
        };
        let mut env = FontScope::new(&request.params, &self.parameters);
        construct_glyph(source, &context, &mut env).map(Some)
    }
}

/// Font definitions resolved lazily against the caller's values.
///
/// A name the font defines comes from its definition; caller values only
/// fill in names the font leaves undefined, or a definition that names
/// itself.
struct FontScope<'a> {
    params: &'a BTreeMap<String, Value>,
    definitions: &'a BTreeMap<String, ConstantOrFormula>,
    resolved: BTreeMap<String, Value>,
    in_progress: BTreeSet<String>,
}

impl<'a> FontScope<'a> {
    fn new(
        params: &'a BTreeMap<String, Value>,
        definitions: &'a BTreeMap<String, ConstantOrFormula>,
    ) -> Self {
        Self {
            params,
            definitions,
            resolved: BTreeMap::new(),
            in_progress: BTreeSet::new(),
        }
    }

    fn lookup_direct(&mut self, name: &str) -> Result<Value, FormulaError> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.clone());
        }
        let definitions = self.definitions;
        let Some(definition) = definitions.get(name) else {
            return self
                .params
                .get(name)
                .cloned()
                .ok_or_else(|| FormulaError::UnknownName(name.to_string()));
        };
        if !self.in_progress.insert(name.to_string()) {
            return self
                .params
                .get(name)
                .cloned()
                .ok_or_else(|| FormulaError::Cycle(name.to_string()));
        }
        let value = definition.resolve(self);
        self.in_progress.remove(name);
        let value = value?;
        self.resolved.insert(name.to_string(), value.clone());
        Ok(value)
    }
}

impl Scope for FontScope<'_> {
    fn lookup(&mut self, name: &str) -> Result<Value, FormulaError> {
        lookup_projected(name, |n| self.lookup_direct(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    const FONT: &str = r#"{
        "fontinfo": {
            "familyName": "Test Sans",
            "ascender": {"formula": "capHeight + overshoot"},
            "cap-height": {"formula": "capHeight"}
        },
        "parameters": {
            "capHeight": 700,
            "overshoot": {"formula": "capHeight / 70"},
            "a": {"formula": "b"},
            "b": {"formula": "a"},
            "weight": {"formula": "weight * 2"}
        },
        "glyphs": {
            "l": {"name": "l", "unicode": 108,
                  "contours": [{"nodes": [{"x": 0, "y": {"formula": "capHeight"}}]}]},
            "l.alt": {"name": "l.alt", "base": "l",
                      "contours": [{"nodes": [{"x": 5, "y": 0}]}]}
        }
    }"#;

    fn font() -> Font {
        Font::new(FontSource::from_json_str(FONT).unwrap())
    }

    #[test]
    fn resolves_attributes_and_defaults() {
        let constructed = font().construct(&BuildRequest::default()).unwrap();
        assert_eq!(constructed.attributes["ascender"], Value::Number(710.0));
        assert_eq!(constructed.attributes["cap-height"], Value::Number(700.0));
        assert_eq!(
            constructed.attributes["familyName"],
            Value::Text("Test Sans".to_string())
        );
        assert!(constructed.glyphs.is_empty());
    }

    #[test]
    fn definitions_win_over_caller_params() {
        let request = BuildRequest {
            params: BTreeMap::from([
                ("capHeight".to_string(), Value::Number(600.0)),
                ("thickness".to_string(), Value::Number(40.0)),
                ("weight".to_string(), Value::Number(3.0)),
            ]),
            subset: vec!['l'],
            ..Default::default()
        };
        let mut font = font();
        font.info.descender = ConstantOrFormula::formula("-thickness").unwrap();
        font.info.descendent_height = ConstantOrFormula::formula("weight").unwrap();
        let constructed = font.construct(&request).unwrap();
        assert_eq!(
            constructed.glyph("l").unwrap().contours[0].nodes[0].point,
            Point::new(0.0, 700.0)
        );
        assert_eq!(constructed.attributes["ascender"], Value::Number(710.0));
        // no definition: the caller's value is used
        assert_eq!(constructed.attributes["descender"], Value::Number(-40.0));
        // a definition naming itself reads the caller's value
        assert_eq!(constructed.attributes["descendent-height"], Value::Number(6.0));
    }

    #[test]
    fn subset_uses_alternates_and_skips_missing() {
        let request = BuildRequest {
            subset: vec!['l', 'q'],
            alt_list: BTreeMap::from([('l', "l.alt".to_string())]),
            ..Default::default()
        };
        let constructed = font().construct(&request).unwrap();
        assert_eq!(constructed.glyphs.len(), 1);
        let glyph = &constructed.glyphs[0];
        assert_eq!(glyph.name, "l.alt");
        assert_eq!(glyph.override_name(), "l");
    }

    #[test]
    fn parameter_cycles_are_reported() {
        let mut scope_font = font();
        scope_font.info.description = ConstantOrFormula::formula("a").unwrap();
        let err = scope_font.construct(&BuildRequest::default()).unwrap_err();
        assert!(matches!(
            err,
            ConstructError::Formula { source: FormulaError::Cycle(_), .. }
        ));
    }

    #[test]
    fn param_base_merges_under_request() {
        let mut font = font();
        let mut patch = crate::model::overrides::Changes::new();
        patch.insert(crate::model::path::PointPath::node(0, 0).field("x"), 3.0);
        font.param_base.manual_changes.apply("l", &patch);
        let glyph = font
            .construct_glyph("l", &BuildRequest::default())
            .unwrap()
            .unwrap();
        assert_eq!(glyph.contours[0].nodes[0].point.x, 3.0);
        assert!(font.construct_glyph("zz", &BuildRequest::default()).unwrap().is_none());
    }
}
