// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Interaction settings and configuration constants.
//!
//! These are the compiled-in defaults. A host can override most of them at
//! runtime through `EditorConfig`.

// ============================================================================
// DRAG SETTINGS
// ============================================================================
/// Screen distance (pixels) before a drag produces any edit
const DRAG_START_THRESHOLD: f64 = 6.0;

/// Screen distance (pixels) after which the direction lock is frozen
const DIRECTIONAL_LOCK_THRESHOLD: f64 = 10.0;

/// Two pointer presses closer than this are a double click
const DOUBLE_CLICK_WINDOW_MS: u64 = 400;

/// Label attached to the override flush at the end of a drag
const MANUAL_EDIT_LABEL: &str = "manual edition";

// ============================================================================
// HIT TESTING SETTINGS
// ============================================================================
/// Pick radius around points and handles (pixels)
const HIT_RADIUS: f64 = 6.0;

// ============================================================================
// NUDGE SETTINGS
// ============================================================================
/// Arrow key nudge in design units
const NUDGE_BASE: f64 = 1.0;

/// Shift-arrow nudge in design units
const NUDGE_SHIFT: f64 = 10.0;

// ============================================================================
// CAMERA SETTINGS
// ============================================================================
/// Minimum zoom level
const MIN_ZOOM: f64 = 0.1;

/// Maximum zoom level
const MAX_ZOOM: f64 = 10.0;

/// Zoom used when the view is reset to fit the glyph
const RESET_ZOOM: f64 = 0.5;

/// Wheel units per doubling-ish of zoom: factor is `1 + wheel / WHEEL_DIVISOR`
const WHEEL_DIVISOR: f64 = 1000.0;

// ============================================================================
// KEY CODES
// ============================================================================
const KEY_ESCAPE: u32 = 27;
const KEY_SPACE: u32 = 32;
const KEY_LEFT: u32 = 37;
const KEY_UP: u32 = 38;
const KEY_RIGHT: u32 = 39;
const KEY_DOWN: u32 = 40;
const KEY_A: u32 = 65;
const KEY_D: u32 = 68;
const KEY_W: u32 = 87;
const KEY_Z: u32 = 90;

// ============================================================================
// PUBLIC API - Don't edit below this line unless you know what you're doing
// ============================================================================

/// Drag start and direction lock
pub mod drag {
    pub const START_THRESHOLD: f64 = super::DRAG_START_THRESHOLD;
    pub const DIRECTIONAL_THRESHOLD: f64 = super::DIRECTIONAL_LOCK_THRESHOLD;
    pub const DOUBLE_CLICK_WINDOW_MS: u64 = super::DOUBLE_CLICK_WINDOW_MS;
    pub const MANUAL_EDIT_LABEL: &str = super::MANUAL_EDIT_LABEL;
}

pub mod hit {
    /// Pick radius (pixels)
    pub const RADIUS: f64 = super::HIT_RADIUS;
}

/// Nudge amounts for arrow key point movement
pub mod nudge {
    /// Base nudge (arrow key alone)
    pub const BASE: f64 = super::NUDGE_BASE;

    /// Shift-arrow nudge
    pub const SHIFT: f64 = super::NUDGE_SHIFT;
}

/// Camera zoom limits and reset behavior
pub mod camera {
    pub const MIN_ZOOM: f64 = super::MIN_ZOOM;
    pub const MAX_ZOOM: f64 = super::MAX_ZOOM;
    pub const RESET_ZOOM: f64 = super::RESET_ZOOM;
    pub const WHEEL_DIVISOR: f64 = super::WHEEL_DIVISOR;
}

/// Default key bindings, as key codes
pub mod keys {
    /// Hold to pan regardless of mode
    pub const PAN: u32 = super::KEY_SPACE;
    /// Hold to preview the glyph fitted in view
    pub const PREVIEW: u32 = super::KEY_Z;
    /// Reset selected points to their formula values
    pub const ESCAPE: u32 = super::KEY_ESCAPE;
    /// Hold while dragging an outline point to change its width only
    pub const WIDTH_ONLY: u32 = super::KEY_W;
    /// Hold while dragging an outline point to change its angle only
    pub const ANGLE_ONLY: u32 = super::KEY_A;
    /// Hold while dragging a skeleton node to slide it along its width
    pub const DISTRIBUTE: u32 = super::KEY_D;

    pub const LEFT: u32 = super::KEY_LEFT;
    pub const UP: u32 = super::KEY_UP;
    pub const RIGHT: u32 = super::KEY_RIGHT;
    pub const DOWN: u32 = super::KEY_DOWN;
}
