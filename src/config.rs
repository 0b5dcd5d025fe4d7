// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Runtime editor configuration, loaded from TOML.
//!
//! Every field defaults to the matching constant in `settings`, so a
//! partial file only overrides what it names.

use crate::settings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub drag: DragConfig,
    pub nudge: NudgeConfig,
    pub camera: CameraConfig,
    pub keys: KeyConfig,
}

impl EditorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse editor config")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Pixels before a drag starts editing
    pub start_threshold: f64,
    /// Pixels before the direction lock is frozen
    pub directional_threshold: f64,
    pub double_click_ms: u64,
    /// Pick radius in pixels
    pub hit_radius: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            start_threshold: settings::drag::START_THRESHOLD,
            directional_threshold: settings::drag::DIRECTIONAL_THRESHOLD,
            double_click_ms: settings::drag::DOUBLE_CLICK_WINDOW_MS,
            hit_radius: settings::hit::RADIUS,
        }
    }
}

impl DragConfig {
    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub base: f64,
    pub shift: f64,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            base: settings::nudge::BASE,
            shift: settings::nudge::SHIFT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub reset_zoom: f64,
    pub wheel_divisor: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: settings::camera::MIN_ZOOM,
            max_zoom: settings::camera::MAX_ZOOM,
            reset_zoom: settings::camera::RESET_ZOOM,
            wheel_divisor: settings::camera::WHEEL_DIVISOR,
        }
    }
}

/// Key bindings as key codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub pan: u32,
    pub preview: u32,
    pub escape: u32,
    pub width_only: u32,
    pub angle_only: u32,
    pub distribute: u32,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            pan: settings::keys::PAN,
            preview: settings::keys::PREVIEW,
            escape: settings::keys::ESCAPE,
            width_only: settings::keys::WIDTH_ONLY,
            angle_only: settings::keys::ANGLE_ONLY,
            distribute: settings::keys::DISTRIBUTE,
        }
    }
}
