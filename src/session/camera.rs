// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! View transform between design space and screen pixels.
//!
//! Design space is y-up, the screen is y-down, so the view matrix is
//! `[z, 0, 0, -z, tx, ty]`.

use crate::config::CameraConfig;
use kurbo::{Affine, Point, Rect, Size, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub zoom: f64,
    /// Screen position of the design-space origin
    pub translation: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            translation: Vec2::ZERO,
        }
    }
}

impl Camera {
    /// Design space to screen
    pub fn affine(&self) -> Affine {
        Affine::new([
            self.zoom,
            0.0,
            0.0,
            -self.zoom,
            self.translation.x,
            self.translation.y,
        ])
    }

    pub fn to_screen(&self, world: Point) -> Point {
        self.affine() * world
    }

    pub fn to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.translation.x) / self.zoom,
            (self.translation.y - screen.y) / self.zoom,
        )
    }

    /// Move the view by a screen-space delta
    pub fn pan(&mut self, delta: Vec2) {
        self.translation += delta;
    }

    /// Zoom by `1 + wheel / divisor` around the screen point `anchor`.
    ///
    /// The design point under `anchor` stays put. Returns false when the
    /// zoom is already at its limit.
    pub fn zoom_at(&mut self, anchor: Point, wheel: f64, config: &CameraConfig) -> bool {
        let factor = 1.0 + wheel / config.wheel_divisor;
        let zoom = (self.zoom * factor).clamp(config.min_zoom, config.max_zoom);
        if zoom == self.zoom {
            return false;
        }
        let world = self.to_world(anchor);
        self.zoom = zoom;
        self.translation = Vec2::new(anchor.x - zoom * world.x, anchor.y + zoom * world.y);
        true
    }

    /// Center the view on a design point at the given zoom
    pub fn center_on(&mut self, center: Point, zoom: f64, viewport: Size) {
        self.zoom = zoom;
        self.translation = Vec2::new(
            viewport.width / 2.0 - zoom * center.x,
            viewport.height / 2.0 + zoom * center.y,
        );
    }

    /// Whether a design-space rectangle lies entirely off screen
    pub fn is_outside(&self, bounds: Rect, viewport: Size) -> bool {
        let on_screen = self.affine().transform_rect_bbox(bounds);
        let screen = viewport.to_rect();
        on_screen.x1 < screen.x0
            || on_screen.x0 > screen.x1
            || on_screen.y1 < screen.y0
            || on_screen.y0 > screen.y1
    }
}
