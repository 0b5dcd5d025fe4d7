// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Which points were read while resolving which other points.

use super::path::PointPath;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Per-glyph record of point-to-point references.
///
/// Keys are node paths; each maps a field name (`x`, `in.y`, ...) to the
/// paths of every value read while resolving it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DependencyTree(BTreeMap<PointPath, BTreeMap<String, BTreeSet<PointPath>>>);

impl DependencyTree {
    pub fn record(&mut self, point: PointPath, field: &str, dependency: PointPath) {
        self.0
            .entry(point)
            .or_default()
            .entry(field.to_string())
            .or_default()
            .insert(dependency);
    }

    /// Field-by-field dependencies of one point
    pub fn fields(&self, point: &PointPath) -> Option<&BTreeMap<String, BTreeSet<PointPath>>> {
        self.0.get(point)
    }

    /// Every path any field of `point` depends on
    pub fn dependencies_of(&self, point: &PointPath) -> BTreeSet<PointPath> {
        self.0
            .get(point)
            .map(|fields| fields.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Every point with a field that read something at or below `point`
    pub fn dependents_of(&self, point: &PointPath) -> BTreeSet<PointPath> {
        self.0
            .iter()
            .filter(|(_, fields)| fields.values().flatten().any(|d| d.starts_with(point)))
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Re-root every entry under `prefix`
    pub fn prefixed(&self, prefix: &PointPath) -> DependencyTree {
        DependencyTree(
            self.0
                .iter()
                .map(|(point, fields)| {
                    let fields = fields
                        .iter()
                        .map(|(f, deps)| (f.clone(), deps.iter().map(|d| prefix.join(d)).collect()))
                        .collect();
                    (prefix.join(point), fields)
                })
                .collect(),
        )
    }

    pub fn extend(&mut self, other: DependencyTree) {
        for (point, fields) in other.0 {
            let entry = self.0.entry(point).or_default();
            for (field, deps) in fields {
                entry.entry(field).or_default().extend(deps);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
