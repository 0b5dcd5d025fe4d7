// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Canvas modes and the flag set describing where an interaction stands

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Top-level canvas mode, chosen by the host UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanvasMode {
    #[default]
    Move,
    Components,
    SelectPoints,
}

bitflags! {
    /// Interaction state. The empty set is the default state.
    ///
    /// Exactly one primary flag is set at a time; `ZOOMING` is layered on
    /// top of whichever primary state is active.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AppState: u32 {
        const MOVING                  = 1 << 0;
        const BOX_SELECTING           = 1 << 1;
        const DRAGGING_SPACING        = 1 << 2;
        const SPACING_SELECTED        = 1 << 3;
        const CONTOUR_SELECTED        = 1 << 4;
        const DRAGGING_CONTOUR_POINT  = 1 << 5;
        const DRAGGING_CONTOUR        = 1 << 6;
        const CONTOUR_POINT_SELECTED  = 1 << 7;
        const SKELETON_POINT_SELECTED = 1 << 8;
        const POINTS_SELECTED         = 1 << 9;
        const DRAGGING_POINTS         = 1 << 10;
        const COMPONENT_HOVERED       = 1 << 11;
        const COMPONENT_MENU_HOVERED  = 1 << 12;
        const ZOOMING                 = 1 << 13;
    }
}

impl AppState {
    pub const DEFAULT: Self = Self::empty();

    /// States that move points with the pointer
    pub const DRAGGING_ANY_POINT: Self = Self::DRAGGING_CONTOUR_POINT.union(Self::DRAGGING_POINTS);

    /// States that keep a single point selected after a drag
    pub const SINGLE_POINT_SELECTED: Self =
        Self::CONTOUR_POINT_SELECTED.union(Self::SKELETON_POINT_SELECTED);

    /// States that show the nodes of the selected contour
    pub const CONTOUR_ACTIVE: Self = Self::CONTOUR_SELECTED
        .union(Self::DRAGGING_CONTOUR_POINT)
        .union(Self::CONTOUR_POINT_SELECTED)
        .union(Self::DRAGGING_CONTOUR)
        .union(Self::SKELETON_POINT_SELECTED);

    /// The state without the layered zoom flag
    pub fn primary(self) -> Self {
        self.difference(Self::ZOOMING)
    }

    /// Replace the primary state, keeping the zoom flag
    pub fn with_primary(self, primary: Self) -> Self {
        (self & Self::ZOOMING) | primary.primary()
    }

    pub fn is_default(self) -> bool {
        self.primary().is_empty()
    }

    pub fn is_dragging_points(self) -> bool {
        self.intersects(Self::DRAGGING_ANY_POINT)
    }

    /// Whether a drag that edits something is in progress
    pub fn is_dragging(self) -> bool {
        self.intersects(Self::DRAGGING_ANY_POINT | Self::DRAGGING_SPACING)
    }

    /// Arrow keys nudge the selected points
    pub fn nudges_points(self) -> bool {
        self.intersects(Self::POINTS_SELECTED | Self::SINGLE_POINT_SELECTED)
    }

    /// Escape resets the selected points
    pub fn resets_points(self) -> bool {
        self.nudges_points() || self.contains(Self::SPACING_SELECTED)
    }
}
