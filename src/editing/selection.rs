// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Immutable selection set for tracking which items are selected.
//!
//! `Selection` wraps an `Arc<BTreeMap<PointPath, Item>>` so frame outputs
//! can hold a copy without cloning every item. Mutations go through
//! `Arc::make_mut`. Keying by path gives deterministic iteration order,
//! which keeps multi-point edits and published snapshots stable.

use super::item::Item;
use crate::model::PointPath;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The selected items, at most one per path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    inner: Arc<BTreeMap<PointPath, Item>>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// A selection holding exactly these items
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            inner: Arc::new(items.into_iter().map(|i| (i.id.clone(), i)).collect()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn contains(&self, id: &PointPath) -> bool {
        self.inner.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.inner.values()
    }

    /// The only selected item, if exactly one is selected
    pub fn single(&self) -> Option<&Item> {
        if self.inner.len() == 1 {
            self.inner.values().next()
        } else {
            None
        }
    }

    pub fn insert(&mut self, item: Item) {
        Arc::make_mut(&mut self.inner).insert(item.id.clone(), item);
    }

    pub fn remove(&mut self, id: &PointPath) {
        if self.inner.contains_key(id) {
            Arc::make_mut(&mut self.inner).remove(id);
        }
    }

    pub fn clear(&mut self) {
        if !self.inner.is_empty() {
            self.inner = Arc::default();
        }
    }
}
