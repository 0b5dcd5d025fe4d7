// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! On-curve edits: width/angle of expanded points, skeleton position and
//! distribution.

use super::edit_types::OnCurveMode;
use super::item::{Item, ItemKind};
use crate::geometry::{self, EPSILON};
use crate::model::{Changes, ConstructedGlyph};
use kurbo::Point;

/// Width factor and angle for dragging an expanded outline point
pub fn modify_on_curve(
    glyph: &ConstructedGlyph,
    item: &Item,
    target: Point,
    mode: OnCurveMode,
) -> Option<Changes> {
    let ItemKind::ExpandedNode {
        node,
        opposite,
        base_width,
        base_angle,
        angle_offset,
    } = &item.kind
    else {
        return None;
    };
    let opposite = glyph.on_curve(opposite)?.point;
    let skeleton = glyph.node(node)?.point;
    let correction = geometry::scale_correction(&item.transforms);

    let mut changes = Changes::new();
    if mode.contains(OnCurveMode::WIDTH) {
        let width = geometry::correct(opposite - target, correction).hypot();
        if base_width.abs() > EPSILON {
            changes.insert(node.child("width"), width / base_width);
        } else {
            tracing::debug!("[modify_on_curve] {} has no base width", node);
        }
    }
    if mode.contains(OnCurveMode::ANGLE) {
        let direction = geometry::correct(target - skeleton, correction);
        changes.insert(node.child("angle"), direction.atan2() - base_angle + angle_offset);
    }
    Some(changes)
}

/// x/y override moving a node from its base to `target`
pub fn modify_position(item: &Item, target: Point) -> Option<Changes> {
    let base = match &item.kind {
        ItemKind::SkeletonNode { base, .. } | ItemKind::ContourNode { base } => *base,
        _ => return None,
    };
    let delta = geometry::correct(target - base, geometry::scale_correction(&item.transforms));
    let mut changes = Changes::new();
    changes.insert(item.id.child("x"), delta.x);
    changes.insert(item.id.child("y"), delta.y);
    Some(changes)
}

/// Slide a skeleton node along the segment between its outline points.
///
/// The projection is clamped to the segment, so the written distribution
/// always lands in `[0, 1]`.
pub fn modify_distribution(glyph: &ConstructedGlyph, item: &Item, target: Point) -> Option<Changes> {
    let ItemKind::SkeletonNode { base, base_distr } = &item.kind else {
        return None;
    };
    let [start, end] = glyph.node(&item.id)?.expanded.as_ref()?;
    let (start, end) = (start.point, end.point);
    let width = (end - start).hypot();
    let direction = geometry::direction(start, end)?;
    let projection = (target - start).dot(direction).clamp(0.0, width);
    let position = start + direction * projection;
    let delta = geometry::correct(position - *base, geometry::scale_correction(&item.transforms));

    let mut changes = Changes::new();
    changes.insert(
        item.id.child("expand").field("distr"),
        projection / width - base_distr,
    );
    changes.insert(item.id.child("x"), delta.x);
    changes.insert(item.id.child("y"), delta.y);
    Some(changes)
}
