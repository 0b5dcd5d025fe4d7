// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Outbound action messages.
//!
//! The interaction session never touches the store directly. Everything it
//! wants changed goes out as an `Action` through an `ActionSink`, and the
//! host forwards it to its dispatch bus. Serialized actions carry the bus
//! name in `action` and the payload in `payload`.

use crate::editing::{Item, SpacingSide};
use crate::model::{Changes, ComponentChoices, ManualChanges, PointPath};
use kurbo::Point;
use serde::Serialize;
use std::collections::BTreeMap;

/// A named message for the dispatch bus
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "payload", rename_all = "kebab-case")]
pub enum Action {
    ChangeGlyphNodeManually(NodeChanges),
    ResetGlyphPointsManually(PointsReset),
    ChangeComponent(ComponentChange),
    ChangeComponentClass(ComponentClassChange),
    ChangeLetterSpacing(LetterSpacing),
    ChangeParam(ParamChange),
    StoreValue(StoreValue),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeChanges {
    pub changes: Changes,
    pub glyph_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsReset {
    pub glyph_name: String,
    pub unicode: Option<u32>,
    pub points: Vec<ItemSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentChange {
    /// Glyph owning the component
    pub glyph: String,
    /// Component id inside that glyph
    pub id: String,
    /// Chosen base glyph
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentClassChange {
    pub component_class: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterSpacing {
    pub value: f64,
    pub side: SpacingSide,
    pub letter: char,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamChange {
    pub values: ParamValues,
    pub demo: bool,
}

/// Current parameter values plus the export trigger
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParamValues {
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
    pub trigger: bool,
}

/// Ambient UI state. Only the fields that are set get stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyph_view_matrix: Option<ViewMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_items: Option<Vec<ItemSnapshot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyph_outside_view: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas_mode: Option<crate::session::CanvasMode>,
}

/// Camera translation and zoom
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewMatrix {
    pub t: Point,
    pub z: f64,
}

/// The part of an item that outlives the frame it was hit in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSnapshot {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: PointPath,
    pub data: SnapshotData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    pub parent_id: Option<PointPath>,
    pub modif_address: Option<PointPath>,
}

impl ItemSnapshot {
    /// Overlay entries under this path are cleared on reset
    pub fn reset_path(&self) -> &PointPath {
        self.data.modif_address.as_ref().unwrap_or(&self.id)
    }
}

impl From<&Item> for ItemSnapshot {
    fn from(item: &Item) -> Self {
        Self {
            kind: item.type_name().to_string(),
            id: item.id.clone(),
            data: SnapshotData {
                parent_id: item.parent_id().cloned(),
                modif_address: item.modif_address().cloned(),
            },
        }
    }
}

impl Action {
    pub fn node_changes(glyph_name: &str, changes: Changes) -> Self {
        Action::ChangeGlyphNodeManually(NodeChanges {
            changes,
            glyph_name: glyph_name.to_string(),
            label: None,
            force: false,
        })
    }

    /// Empty labelled change that commits the pending edit
    pub fn flush(glyph_name: &str, label: &str) -> Self {
        Action::ChangeGlyphNodeManually(NodeChanges {
            changes: Changes::new(),
            glyph_name: glyph_name.to_string(),
            label: Some(label.to_string()),
            force: true,
        })
    }

    pub fn store(value: StoreValue) -> Self {
        Action::StoreValue(value)
    }

    /// Parameter slider edit
    pub fn change_param(current: &BTreeMap<String, f64>, name: &str, value: f64) -> Self {
        let mut values = current.clone();
        values.insert(name.to_string(), value);
        Action::ChangeParam(ParamChange {
            values: ParamValues {
                values,
                trigger: false,
            },
            demo: true,
        })
    }

    /// Export request with the current parameter values
    pub fn download(current: &BTreeMap<String, f64>) -> Self {
        Action::ChangeParam(ParamChange {
            values: ParamValues {
                values: current.clone(),
                trigger: true,
            },
            demo: true,
        })
    }

    /// Apply this action to a manual-changes overlay.
    ///
    /// Returns whether the action touched the overlay at all.
    pub fn apply_overrides(&self, manual: &mut ManualChanges) -> bool {
        match self {
            Action::ChangeGlyphNodeManually(NodeChanges {
                changes,
                glyph_name,
                ..
            }) => {
                if !changes.is_empty() {
                    manual.apply(glyph_name, changes);
                }
                true
            }
            Action::ResetGlyphPointsManually(PointsReset {
                glyph_name, points, ..
            }) => {
                manual.reset_points(glyph_name, points.iter().map(ItemSnapshot::reset_path));
                true
            }
            _ => false,
        }
    }

    /// Apply a component swap to the stored choices
    pub fn apply_component_choice(&self, choices: &mut ComponentChoices) -> bool {
        match self {
            Action::ChangeComponent(ComponentChange { glyph, id, name }) => {
                choices.set_for_glyph(glyph, id, name);
                true
            }
            Action::ChangeComponentClass(ComponentClassChange {
                component_class,
                name,
            }) => {
                choices.set_for_class(component_class, name);
                true
            }
            _ => false,
        }
    }
}

/// Where the session sends its actions
pub trait ActionSink {
    fn dispatch(&mut self, action: Action);
}

impl ActionSink for Vec<Action> {
    fn dispatch(&mut self, action: Action) {
        self.push(action);
    }
}
