// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! What the painter needs to draw one frame

use super::camera::Camera;
use super::state::{AppState, CanvasMode};
use crate::editing::{Item, Selection};
use crate::model::PointPath;
use kurbo::{Point, Rect};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorHint {
    #[default]
    Default,
    /// Over a spacing handle
    EwResize,
}

/// Axis a direction-locked drag follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAxis {
    X,
    Y,
}

/// Infinite guide through a locked drag target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub axis: LockAxis,
    pub through: Point,
}

/// A point the selected point was computed from
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyLink {
    pub from_id: PointPath,
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    pub mode: CanvasMode,
    pub state: AppState,
    pub hot_items: Vec<Item>,
    pub selection: Selection,
    /// Items inside the box while box selecting
    pub boxed_items: Vec<Item>,
    /// Box selection in design space
    pub box_rect: Option<Rect>,
    pub selected_contour: Option<Item>,
    pub hovered_component: Option<usize>,
    /// Component whose variant menu is open
    pub component_menu: Option<usize>,
    pub cursor: CursorHint,
    pub guide: Option<GuideLine>,
    pub dependency_links: Vec<DependencyLink>,
    pub camera: Camera,
    /// The preview key is held: draw the glyph only
    pub preview: bool,
    /// Something visible changed this frame
    pub redraw: bool,
}
