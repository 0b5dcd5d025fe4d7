// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Off-curve handle drags with smoothness and parallel constraints.
//!
//! Dragging one handle can write up to four handles: the dragged one, its
//! opposite on a smooth point, and the matching pair on the parallel
//! outline point. Every secondary handle is rotated by the same angle the
//! dragged handle turned through and scaled by the same tension.

use super::edit_types::EditModifiers;
use super::item::{HandleSide, Item, ItemKind};
use crate::geometry::{self, EPSILON};
use crate::model::{Changes, ConstructedGlyph, Handle, OnCurve, PointPath};
use kurbo::{Point, Vec2};

/// Angle and length change of the dragged handle
struct Rotation {
    /// The dragged handle's anchor
    anchor: Point,
    /// Dragged handle base position
    from: Point,
    to: Point,
    /// `|to - anchor| / |from - anchor|`, `None` when the base is on its anchor
    tension: Option<f64>,
    /// `|to - anchor|`, used when a secondary handle has no length
    reference_length: f64,
}

impl Rotation {
    fn angle_delta(&self) -> f64 {
        let new = self.to - self.anchor;
        let old = self.from - self.anchor;
        new.atan2() - old.atan2()
    }

    /// World-space delta for the `side` handle of `point`
    fn secondary(&self, point: &OnCurve, side: HandleSide) -> Vec2 {
        let base = handle_of(point, side).base;
        let own = base - point.point;
        let angle = own.atan2() + self.angle_delta();
        let length = own.hypot();
        let length = if length <= EPSILON {
            self.reference_length
        } else {
            length * self.tension.unwrap_or(1.0)
        };
        (point.point + geometry::polar(angle, length)) - base
    }
}

fn handle_of(point: &OnCurve, side: HandleSide) -> &Handle {
    match side {
        HandleSide::In => &point.handle_in,
        HandleSide::Out => &point.handle_out,
    }
}

fn write(changes: &mut Changes, handle: PointPath, delta: Vec2) {
    changes.insert(handle.child("x"), delta.x);
    changes.insert(handle.child("y"), delta.y);
}

/// Changes for dragging a handle to `target`
pub fn modify_handle(
    glyph: &ConstructedGlyph,
    item: &Item,
    target: Point,
    modifiers: EditModifiers,
) -> Option<Changes> {
    let (side, parent_path, parallel_path) = match &item.kind {
        ItemKind::Handle {
            side,
            parent,
            parallel,
        } => (*side, parent, (!modifiers.unparallel).then_some(parallel)),
        ItemKind::ContourHandle { side, parent } => (*side, parent, None),
        _ => return None,
    };
    let parent = glyph.on_curve(parent_path)?;
    let handle = handle_of(&parent, side);
    let correction = geometry::scale_correction(&item.transforms);

    let reference_length = (target - parent.point).hypot();
    let base_length = (handle.base - parent.point).hypot();
    let rotation = Rotation {
        anchor: parent.point,
        from: handle.base,
        to: target,
        tension: (base_length > EPSILON).then(|| reference_length / base_length),
        reference_length,
    };

    let mut changes = Changes::new();
    write(
        &mut changes,
        parent_path.child(side.field()),
        geometry::correct(target - handle.base, correction),
    );

    let smooth = !modifiers.unsmooth && parent.is_smooth();
    if smooth {
        let opposite = side.opposite();
        write(
            &mut changes,
            parent_path.child(opposite.field()),
            geometry::correct(rotation.secondary(&parent, opposite), correction),
        );
    }

    if let Some(parallel_path) = parallel_path {
        let Some(parallel) = glyph.on_curve(parallel_path) else {
            tracing::debug!("[modify_handle] parallel point {} missing", parallel_path);
            return Some(changes);
        };
        let parallel_correction = geometry::scale_correction(&glyph.transform_chain(parallel_path));
        if smooth {
            write(
                &mut changes,
                parallel_path.child(side.field()),
                geometry::correct(rotation.secondary(&parallel, side), parallel_correction),
            );
        }
        let opposite = side.opposite();
        write(
            &mut changes,
            parallel_path.child(opposite.field()),
            geometry::correct(rotation.secondary(&parallel, opposite), parallel_correction),
        );
    }

    Some(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::item::Item;
    use crate::geometry::{Transform, TransformKind};
    use crate::model::glyph::tests::{glyph_with, node_at};
    use crate::model::glyph::{Contour, Handle, OutlinePoint};
    use crate::model::Tangency;

    const TOLERANCE: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn outline(at: Point, handle_in: Point, handle_out: Point) -> OutlinePoint {
        OutlinePoint {
            point: at,
            handle_in: Handle::at(handle_in),
            handle_out: Handle::at(handle_out),
            type_in: Tangency::Smooth,
            type_out: Tangency::Smooth,
        }
    }

    /// Skeleton node at (60, 100) expanding to (20, 100) and (100, 100),
    /// both with vertical handles.
    fn glyph() -> ConstructedGlyph {
        let mut node = node_at(60.0, 100.0);
        node.expanded = Some([
            outline(
                Point::new(20.0, 100.0),
                Point::new(20.0, 150.0),
                Point::new(20.0, 0.0),
            ),
            outline(
                Point::new(100.0, 100.0),
                Point::new(100.0, 150.0),
                Point::new(100.0, 0.0),
            ),
        ]);
        glyph_with(vec![Contour {
            skeleton: true,
            closed: false,
            nodes: vec![node],
        }])
    }

    fn path(text: &str) -> PointPath {
        text.parse().unwrap()
    }

    fn dragged_out() -> (ConstructedGlyph, Item) {
        let glyph = glyph();
        let item = Item::point(&glyph, &path("contours.0.nodes.0.expandedTo.1.out")).unwrap();
        (glyph, item)
    }

    #[test]
    fn smooth_drag_writes_all_four_handles() {
        let (glyph, item) = dragged_out();
        let changes =
            modify_handle(&glyph, &item, Point::new(120.0, 20.0), EditModifiers::default()).unwrap();
        let get = |p: &str| changes[&path(p)];

        assert!(approx(get("contours.0.nodes.0.expandedTo.1.out.x"), 20.0));
        assert!(approx(get("contours.0.nodes.0.expandedTo.1.out.y"), 20.0));
        // tension is |(20, -80)| / 100; opposite length 50 shrinks to half of that
        assert!(approx(get("contours.0.nodes.0.expandedTo.1.in.x"), -10.0));
        assert!(approx(get("contours.0.nodes.0.expandedTo.1.in.y"), -10.0));
        assert!(approx(get("contours.0.nodes.0.expandedTo.0.out.x"), 20.0));
        assert!(approx(get("contours.0.nodes.0.expandedTo.0.out.y"), 20.0));
        assert!(approx(get("contours.0.nodes.0.expandedTo.0.in.x"), -10.0));
        assert!(approx(get("contours.0.nodes.0.expandedTo.0.in.y"), -10.0));
        assert_eq!(changes.len(), 8);
    }

    #[test]
    fn opposite_stays_collinear() {
        let (glyph, item) = dragged_out();
        let target = Point::new(137.0, -12.0);
        let changes = modify_handle(&glyph, &item, target, EditModifiers::default()).unwrap();
        let anchor = Point::new(100.0, 100.0);
        let opposite = Point::new(
            100.0 + changes[&path("contours.0.nodes.0.expandedTo.1.in.x")],
            150.0 + changes[&path("contours.0.nodes.0.expandedTo.1.in.y")],
        );
        let primary = target - anchor;
        let secondary = opposite - anchor;
        assert!(primary.cross(secondary).abs() < 1e-6);
        assert!(primary.dot(secondary) < 0.0);
        let tension = primary.hypot() / 100.0;
        assert!(approx(secondary.hypot(), 50.0 * tension));
    }

    #[test]
    fn unsmooth_skips_opposite_handles() {
        let (glyph, item) = dragged_out();
        let modifiers = EditModifiers {
            unsmooth: true,
            ..Default::default()
        };
        let changes = modify_handle(&glyph, &item, Point::new(120.0, 20.0), modifiers).unwrap();
        let keys: Vec<String> = changes.keys().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "contours.0.nodes.0.expandedTo.0.in.x",
                "contours.0.nodes.0.expandedTo.0.in.y",
                "contours.0.nodes.0.expandedTo.1.out.x",
                "contours.0.nodes.0.expandedTo.1.out.y",
            ]
        );
    }

    #[test]
    fn unparallel_only_touches_own_point() {
        let (glyph, item) = dragged_out();
        let modifiers = EditModifiers {
            unparallel: true,
            ..Default::default()
        };
        let changes = modify_handle(&glyph, &item, Point::new(120.0, 20.0), modifiers).unwrap();
        assert_eq!(changes.len(), 4);
        assert!(changes.keys().all(|k| k.starts_with(&path("contours.0.nodes.0.expandedTo.1"))));
    }

    #[test]
    fn scale_transforms_are_undone() {
        let (mut glyph, mut item) = dragged_out();
        let scale = Transform::new(TransformKind::ScaleX, 2.0);
        glyph.transforms = vec![scale];
        item.transforms = vec![scale];
        let modifiers = EditModifiers {
            unsmooth: true,
            unparallel: true,
            ..Default::default()
        };
        let changes = modify_handle(&glyph, &item, Point::new(120.0, 20.0), modifiers).unwrap();
        assert!(approx(changes[&path("contours.0.nodes.0.expandedTo.1.out.x")], 10.0));
        assert!(approx(changes[&path("contours.0.nodes.0.expandedTo.1.out.y")], 20.0));
    }

    #[test]
    fn parallel_writes_undo_vertical_scale() {
        let (mut glyph, mut item) = dragged_out();
        let scale = Transform::new(TransformKind::ScaleY, 2.0);
        glyph.transforms = vec![scale];
        item.transforms = vec![scale];
        let changes =
            modify_handle(&glyph, &item, Point::new(120.0, 20.0), EditModifiers::default()).unwrap();
        let get = |p: &str| changes[&path(p)];

        assert!(approx(get("contours.0.nodes.0.expandedTo.1.out.x"), 20.0));
        assert!(approx(get("contours.0.nodes.0.expandedTo.1.out.y"), 10.0));
        // same world deltas as the unscaled drag, y halved on the parallel point
        assert!(approx(get("contours.0.nodes.0.expandedTo.0.out.x"), 20.0));
        assert!(approx(get("contours.0.nodes.0.expandedTo.0.out.y"), 10.0));
        assert!(approx(get("contours.0.nodes.0.expandedTo.0.in.x"), -10.0));
        assert!(approx(get("contours.0.nodes.0.expandedTo.0.in.y"), -5.0));
    }

    #[test]
    fn zero_length_base_keeps_opposite_length() {
        let mut glyph = glyph();
        let [_, right] = glyph.contours[0].nodes[0].expanded.as_mut().unwrap();
        right.handle_out = Handle::at(right.point);
        let item = Item::point(&glyph, &path("contours.0.nodes.0.expandedTo.1.out")).unwrap();
        let modifiers = EditModifiers {
            unparallel: true,
            ..Default::default()
        };
        let changes = modify_handle(&glyph, &item, Point::new(100.0, 60.0), modifiers).unwrap();
        let dx = changes[&path("contours.0.nodes.0.expandedTo.1.in.x")];
        let dy = changes[&path("contours.0.nodes.0.expandedTo.1.in.y")];
        assert!(dx.is_finite() && dy.is_finite());
        let opposite = Point::new(100.0 + dx, 150.0 + dy);
        assert!(approx((opposite - Point::new(100.0, 100.0)).hypot(), 50.0));
    }

    #[test]
    fn missing_parent_is_a_no_op() {
        let (_, item) = dragged_out();
        let other = glyph_with(Vec::new());
        assert!(modify_handle(&other, &item, Point::ZERO, EditModifiers::default()).is_none());
    }
}
