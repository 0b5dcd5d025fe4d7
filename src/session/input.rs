// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Per-frame input accumulator.
//!
//! The host feeds raw pointer and keyboard events into an `InputState` as
//! they arrive. The session reads it once per frame and then calls
//! `end_frame`, which clears every edge, the pointer delta and the wheel so
//! each physical event is seen exactly once.

use bitflags::bitflags;
use kurbo::{Point, Size, Vec2};
use std::collections::BTreeSet;
use std::time::Duration;

bitflags! {
    /// Keyboard modifiers held this frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS
    pub fn command(self) -> bool {
        self.intersects(Self::CTRL | Self::META)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    /// Pointer position in screen pixels
    pub pointer: Point,
    pub pointer_down: bool,
    /// Set on the frame the button went down
    pub pointer_pressed: bool,
    /// Set on the frame the button went up
    pub pointer_released: bool,
    /// Pointer motion since the last frame, in screen pixels
    pub pointer_delta: Vec2,
    /// Accumulated wheel delta since the last frame
    pub wheel: f64,
    pub modifiers: Modifiers,
    pub keys_down: BTreeSet<u32>,
    pub keys_pressed: BTreeSet<u32>,
    pub keys_released: BTreeSet<u32>,
    /// Canvas size in screen pixels
    pub viewport: Size,
    /// Host clock, used for double-click detection
    pub time: Duration,
}

impl InputState {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn pointer_move(&mut self, position: Point) {
        self.pointer_delta += position - self.pointer;
        self.pointer = position;
    }

    pub fn pointer_press(&mut self) {
        if !self.pointer_down {
            self.pointer_down = true;
            self.pointer_pressed = true;
        }
    }

    pub fn pointer_release(&mut self) {
        if self.pointer_down {
            self.pointer_down = false;
            self.pointer_released = true;
        }
    }

    pub fn scroll(&mut self, delta: f64) {
        self.wheel += delta;
    }

    /// Key-down event. Auto-repeat of a held key is not a new edge.
    pub fn key_down(&mut self, code: u32) {
        if self.keys_down.insert(code) {
            self.keys_pressed.insert(code);
        }
    }

    pub fn key_up(&mut self, code: u32) {
        if self.keys_down.remove(&code) {
            self.keys_released.insert(code);
        }
    }

    pub fn is_key_down(&self, code: u32) -> bool {
        self.keys_down.contains(&code)
    }

    pub fn key_pressed(&self, code: u32) -> bool {
        self.keys_pressed.contains(&code)
    }

    pub fn key_released(&self, code: u32) -> bool {
        self.keys_released.contains(&code)
    }

    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn advance(&mut self, elapsed: Duration) {
        self.time += elapsed;
    }

    /// Clear edges and per-frame deltas
    pub fn end_frame(&mut self) {
        self.pointer_pressed = false;
        self.pointer_released = false;
        self.pointer_delta = Vec2::ZERO;
        self.wheel = 0.0;
        self.keys_pressed.clear();
        self.keys_released.clear();
    }
}
