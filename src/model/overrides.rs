// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Manual overrides and component choices.
//!
//! The overlay is the only thing the edit engine ever writes. Geometry is
//! rebuilt from (parameters, overlay) on every pass, so clearing an entry
//! gives back exactly the formula-derived value.

use super::path::PointPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sparse patch of path → value changes, as produced by one edit
pub type Changes = BTreeMap<PointPath, f64>;

/// Overlay field names that multiply the formula value instead of adding
const FACTOR_FIELDS: &[&str] = &["width"];

/// Manual overrides for a single glyph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlyphOverrides(BTreeMap<PointPath, f64>);

impl GlyphOverrides {
    pub fn get(&self, path: &PointPath) -> Option<f64> {
        self.0.get(path).copied()
    }

    pub fn set(&mut self, path: PointPath, value: f64) {
        self.0.insert(path, value);
    }

    /// Apply a patch, last writer wins per path
    pub fn apply_patch(&mut self, changes: &Changes) {
        for (path, value) in changes {
            self.0.insert(path.clone(), *value);
        }
    }

    /// Drop every entry at or below `point`
    pub fn reset_point(&mut self, point: &PointPath) {
        self.0.retain(|path, _| !path.starts_with(point));
    }

    /// The entries below `prefix`, re-rooted at it
    pub fn scoped(&self, prefix: &PointPath) -> GlyphOverrides {
        GlyphOverrides(
            self.0
                .iter()
                .filter_map(|(path, value)| Some((path.strip_prefix(prefix)?, *value)))
                .collect(),
        )
    }

    /// Apply the entry at `path` to a formula-derived value
    pub fn overlay(&self, path: &PointPath, base: f64) -> f64 {
        match self.get(path) {
            Some(factor) if path.last_field().is_some_and(|f| FACTOR_FIELDS.contains(&f)) => {
                base * factor
            }
            Some(delta) => base + delta,
            None => base,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PointPath, f64)> {
        self.0.iter().map(|(path, value)| (path, *value))
    }
}

/// Manual overrides for every glyph, keyed by glyph name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManualChanges(BTreeMap<String, GlyphOverrides>);

impl ManualChanges {
    pub fn glyph(&self, name: &str) -> Option<&GlyphOverrides> {
        self.0.get(name)
    }

    /// Apply a change patch to one glyph's overlay
    pub fn apply(&mut self, glyph: &str, changes: &Changes) {
        self.0.entry(glyph.to_string()).or_default().apply_patch(changes);
    }

    /// Clear the overlay entries of the given points
    pub fn reset_points<'a>(&mut self, glyph: &str, points: impl IntoIterator<Item = &'a PointPath>) {
        if let Some(overrides) = self.0.get_mut(glyph) {
            for point in points {
                overrides.reset_point(point);
            }
            if overrides.is_empty() {
                self.0.remove(glyph);
            }
        }
    }

    /// Merge `other` on top of `self`; entries of `other` win per path
    pub fn merged(&self, other: &ManualChanges) -> ManualChanges {
        let mut merged = self.clone();
        for (glyph, overrides) in &other.0 {
            merged
                .0
                .entry(glyph.clone())
                .or_default()
                .apply_patch(&overrides.0);
        }
        merged
    }
}

/// User-chosen component variants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentChoices {
    /// glyph name → component id → chosen base glyph
    #[serde(default)]
    pub by_glyph: BTreeMap<String, BTreeMap<String, String>>,
    /// component class → chosen base glyph
    #[serde(default)]
    pub by_class: BTreeMap<String, String>,
}

impl ComponentChoices {
    pub fn set_for_glyph(&mut self, glyph: &str, component: &str, base: &str) {
        self.by_glyph
            .entry(glyph.to_string())
            .or_default()
            .insert(component.to_string(), base.to_string());
    }

    pub fn set_for_class(&mut self, class: &str, base: &str) {
        self.by_class.insert(class.to_string(), base.to_string());
    }

    /// The chosen base for a component: per-glyph choice, then class choice
    pub fn choose(&self, glyph: &str, component: &str, class: Option<&str>) -> Option<&str> {
        self.by_glyph
            .get(glyph)
            .and_then(|choices| choices.get(component))
            .or_else(|| class.and_then(|c| self.by_class.get(c)))
            .map(String::as_str)
    }

    /// Merge `other` on top of `self`; entries of `other` win
    pub fn merged(&self, other: &ComponentChoices) -> ComponentChoices {
        let mut merged = self.clone();
        for (glyph, choices) in &other.by_glyph {
            merged
                .by_glyph
                .entry(glyph.clone())
                .or_default()
                .extend(choices.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
            .by_class
            .extend(other.by_class.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(text: &str) -> PointPath {
        text.parse().unwrap()
    }

    #[test]
    fn overlay_adds_deltas_and_multiplies_width() {
        let mut overrides = GlyphOverrides::default();
        overrides.set(path("contours.0.nodes.0.x"), 5.0);
        overrides.set(path("contours.0.nodes.0.width"), 1.5);
        assert_eq!(overrides.overlay(&path("contours.0.nodes.0.x"), 10.0), 15.0);
        assert_eq!(overrides.overlay(&path("contours.0.nodes.0.width"), 40.0), 60.0);
        assert_eq!(overrides.overlay(&path("contours.0.nodes.0.y"), 7.0), 7.0);
    }

    #[test]
    fn reset_removes_everything_below_the_point() {
        let mut changes = ManualChanges::default();
        let mut patch = Changes::new();
        patch.insert(path("contours.0.nodes.1.x"), 3.0);
        patch.insert(path("contours.0.nodes.1.in.y"), 4.0);
        patch.insert(path("contours.0.nodes.10.x"), 5.0);
        changes.apply("a", &patch);

        changes.reset_points("a", [&PointPath::node(0, 1)]);
        let overrides = changes.glyph("a").unwrap();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides.get(&path("contours.0.nodes.10.x")), Some(5.0));

        changes.reset_points("a", [&PointPath::node(0, 10)]);
        assert!(changes.glyph("a").is_none());
    }

    #[test]
    fn later_patches_win() {
        let mut changes = ManualChanges::default();
        let mut first = Changes::new();
        first.insert(path("spacingLeft"), 3.0);
        changes.apply("a", &first);
        let mut second = Changes::new();
        second.insert(path("spacingLeft"), -2.0);
        changes.apply("a", &second);
        assert_eq!(changes.glyph("a").unwrap().get(&path("spacingLeft")), Some(-2.0));
    }

    #[test]
    fn scoped_reroots_component_entries() {
        let mut overrides = GlyphOverrides::default();
        overrides.set(path("components.1.contours.0.nodes.0.x"), 2.0);
        overrides.set(path("contours.0.nodes.0.x"), 9.0);
        let scoped = overrides.scoped(&PointPath::component(1));
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped.get(&PointPath::node(0, 0).field("x")), Some(2.0));
    }

    #[test]
    fn component_choice_precedence() {
        let mut choices = ComponentChoices::default();
        choices.set_for_class("serif", "serif-round");
        assert_eq!(choices.choose("a", "top", Some("serif")), Some("serif-round"));
        choices.set_for_glyph("a", "top", "serif-flat");
        assert_eq!(choices.choose("a", "top", Some("serif")), Some("serif-flat"));
        assert_eq!(choices.choose("b", "top", None), None);
    }

    #[test]
    fn merge_lets_caller_win() {
        let mut base = ManualChanges::default();
        let mut patch = Changes::new();
        patch.insert(path("contours.0.nodes.0.x"), 1.0);
        patch.insert(path("contours.0.nodes.0.y"), 1.0);
        base.apply("a", &patch);
        let mut caller = ManualChanges::default();
        let mut patch = Changes::new();
        patch.insert(path("contours.0.nodes.0.x"), 8.0);
        caller.apply("a", &patch);

        let merged = base.merged(&caller);
        let a = merged.glyph("a").unwrap();
        assert_eq!(a.get(&path("contours.0.nodes.0.x")), Some(8.0));
        assert_eq!(a.get(&path("contours.0.nodes.0.y")), Some(1.0));
    }
}
