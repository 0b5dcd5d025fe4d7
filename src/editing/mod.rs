// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Constraint-preserving edit engine
//!
//! Every edit reads the constructed glyph and produces override changes;
//! nothing here mutates geometry. An edit whose points cannot be resolved
//! returns `None` and the frame simply does nothing.

pub mod edit_types;
pub mod handle;
pub mod item;
pub mod selection;
pub mod skeleton;
pub mod spacing;

pub use edit_types::{Edit, EditModifiers, OnCurveMode};
pub use item::{HandleSide, Item, ItemKind, SpacingSide};
pub use selection::Selection;

use crate::model::ConstructedGlyph;
use kurbo::Point;

/// Compute the edit for moving `item` to the world position `target`
pub fn apply_edit(
    glyph: &ConstructedGlyph,
    item: &Item,
    target: Point,
    modifiers: EditModifiers,
) -> Option<Edit> {
    let edit = match &item.kind {
        ItemKind::Handle { .. } | ItemKind::ContourHandle { .. } => {
            handle::modify_handle(glyph, item, target, modifiers).map(Edit::Points)
        }
        ItemKind::ExpandedNode { .. } => {
            skeleton::modify_on_curve(glyph, item, target, modifiers.on_curve).map(Edit::Points)
        }
        ItemKind::SkeletonNode { .. } if modifiers.distribute => {
            skeleton::modify_distribution(glyph, item, target).map(Edit::Points)
        }
        ItemKind::SkeletonNode { .. } | ItemKind::ContourNode { .. } => {
            skeleton::modify_position(item, target).map(Edit::Points)
        }
        ItemKind::Spacing { .. } => spacing::modify_spacing(glyph, item, target),
        ItemKind::Contour { .. }
        | ItemKind::Component { .. }
        | ItemKind::ComponentChoice { .. }
        | ItemKind::ComponentClassChoice { .. } => return None,
    };
    if edit.is_none() {
        tracing::debug!("[apply_edit] skipped edit of {} ({})", item.id, item.type_name());
    }
    edit
}
