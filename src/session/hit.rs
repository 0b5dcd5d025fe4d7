// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Hit testing seam between the session and the painter.
//!
//! Whatever draws the glyph knows best what is under the pointer, so the
//! session only asks a `HitTester`. `GeometryHitTester` is a plain
//! distance-based implementation for hosts that draw nothing special;
//! component menus only exist in painters that lay them out, so it never
//! reports menu entries.

use super::camera::Camera;
use crate::config::EditorConfig;
use crate::editing::{Item, SpacingSide};
use crate::geometry;
use crate::model::{ConstructedGlyph, PointPath};
use kurbo::{Point, Rect};

pub trait HitTester {
    /// Items under the screen point `pointer`, nearest first
    fn hot_items(&self, glyph: &ConstructedGlyph, camera: &Camera, pointer: Point) -> Vec<Item>;

    /// Points inside the screen rectangle spanned by `a` and `b`
    fn box_items(&self, glyph: &ConstructedGlyph, camera: &Camera, a: Point, b: Point) -> Vec<Item>;
}

/// Hit testing against the constructed geometry only
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryHitTester {
    /// Pick radius in screen pixels
    pub radius: f64,
}

impl Default for GeometryHitTester {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl GeometryHitTester {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Tester using the configured pick radius
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.drag.hit_radius)
    }

    /// Every grabbable point with its world position
    fn point_candidates(glyph: &ConstructedGlyph) -> Vec<(PointPath, Point)> {
        let mut out = Vec::new();
        for (ci, contour) in glyph.contours.iter().enumerate() {
            for (ni, node) in contour.nodes.iter().enumerate() {
                let path = PointPath::node(ci, ni);
                match &node.expanded {
                    Some(expanded) => {
                        out.push((path.clone(), node.point));
                        for (k, o) in expanded.iter().enumerate() {
                            let outline = path.clone().field("expandedTo").index(k);
                            push_handles(&mut out, &outline, o.point, [o.handle_in.point, o.handle_out.point]);
                            out.push((outline, o.point));
                        }
                    }
                    None => {
                        push_handles(&mut out, &path, node.point, [node.handle_in.point, node.handle_out.point]);
                        out.push((path, node.point));
                    }
                }
            }
        }
        out
    }

    fn node_candidates(glyph: &ConstructedGlyph) -> impl Iterator<Item = (PointPath, Point)> + '_ {
        glyph.contours.iter().enumerate().flat_map(|(ci, contour)| {
            contour
                .nodes
                .iter()
                .enumerate()
                .map(move |(ni, node)| (PointPath::node(ci, ni), node.point))
        })
    }

    fn contour_bounds(glyph: &ConstructedGlyph, index: usize) -> Option<Rect> {
        let contour = glyph.contours.get(index)?;
        geometry::bounding_box(contour.nodes.iter().flat_map(|node| match &node.expanded {
            Some(expanded) => expanded.iter().map(|o| o.point).collect::<Vec<_>>(),
            None => vec![node.point],
        }))
    }
}

/// Handles collapsed onto their point are not separately grabbable
fn push_handles(out: &mut Vec<(PointPath, Point)>, owner: &PointPath, on_curve: Point, handles: [Point; 2]) {
    for (field, handle) in ["in", "out"].into_iter().zip(handles) {
        if (handle - on_curve).hypot() > geometry::EPSILON {
            out.push((owner.child(field), handle));
        }
    }
}

impl HitTester for GeometryHitTester {
    fn hot_items(&self, glyph: &ConstructedGlyph, camera: &Camera, pointer: Point) -> Vec<Item> {
        let mut points: Vec<(f64, PointPath)> = Self::point_candidates(glyph)
            .into_iter()
            .filter_map(|(path, world)| {
                let dist = (camera.to_screen(world) - pointer).hypot();
                (dist <= self.radius).then_some((dist, path))
            })
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut items: Vec<Item> = points
            .into_iter()
            .filter_map(|(_, path)| Item::point(glyph, &path))
            .collect();

        for (side, x) in [(SpacingSide::Left, 0.0), (SpacingSide::Right, glyph.advance_width)] {
            let screen_x = camera.to_screen(Point::new(x, 0.0)).x;
            if (screen_x - pointer.x).abs() <= self.radius {
                items.push(Item::spacing(glyph, side));
            }
        }

        let world = camera.to_world(pointer);
        for index in 0..glyph.contours.len() {
            if Self::contour_bounds(glyph, index).is_some_and(|r| r.contains(world)) {
                items.push(Item::contour(index));
            }
        }
        for (index, component) in glyph.components.iter().enumerate() {
            if component.glyph.bounding_box().is_some_and(|r| r.contains(world)) {
                items.push(Item::component(index));
            }
        }
        items
    }

    fn box_items(&self, glyph: &ConstructedGlyph, camera: &Camera, a: Point, b: Point) -> Vec<Item> {
        let area = Rect::from_points(a, b);
        Self::node_candidates(glyph)
            .filter(|(_, world)| area.contains(camera.to_screen(*world)))
            .filter_map(|(path, _)| Item::point(glyph, &path))
            .collect()
    }
}
