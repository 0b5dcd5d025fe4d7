// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Edit inputs and outputs

use super::item::SpacingSide;
use crate::model::Changes;
use bitflags::bitflags;

bitflags! {
    /// Which on-curve properties a width/angle drag may write
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OnCurveMode: u8 {
        const WIDTH = 1 << 0;
        const ANGLE = 1 << 1;
    }
}

impl Default for OnCurveMode {
    fn default() -> Self {
        Self::all()
    }
}

/// Modifier state for one edit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditModifiers {
    /// Leave the opposite handle alone on smooth points
    pub unsmooth: bool,
    /// Leave the parallel sibling alone
    pub unparallel: bool,
    pub on_curve: OnCurveMode,
    /// Slide skeleton nodes along their expanded segment
    pub distribute: bool,
}

/// Result of one edit operation
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Override patch for the glyph's overlay
    Points(Changes),
    /// New spacing value for one side of a letter
    Spacing {
        side: SpacingSide,
        value: f64,
        letter: char,
    },
}

impl Edit {
    pub fn is_empty(&self) -> bool {
        match self {
            Edit::Points(changes) => changes.is_empty(),
            Edit::Spacing { .. } => false,
        }
    }
}
