// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Parafont: interactive editing core for parametric skeleton-based glyphs
//!
//! The crate is split the way data flows through an editor frame:
//!
//! - `model` constructs glyph geometry from formula-driven sources plus the
//!   manual-override overlay.
//! - `editing` turns a pointer target into override changes that keep the
//!   glyph's constraints (smoothness, parallel outlines, width and angle).
//! - `session` is the per-frame interaction state machine: hit testing,
//!   selection, drags, nudges, camera.
//! - `actions` is the message vocabulary the session sends to its host.
//!
//! Nothing here draws or owns a window; the host paints `FrameOutput` and
//! forwards `Action`s to its store.

pub mod actions;
pub mod config;
pub mod editing;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod model;
pub mod session;
pub mod settings;

pub use actions::{Action, ActionSink};
pub use config::EditorConfig;
pub use editing::{Edit, EditModifiers, Item, Selection};
pub use model::{BuildRequest, ConstructedFont, ConstructedGlyph, Font, FontSource, PointPath};
pub use session::{FrameOutput, GeometryHitTester, HitTester, InputState, InteractionSession};
