// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Descriptors for things the pointer can grab.
//!
//! An `Item` is built from a hit-test result for the current glyph. It
//! carries the address of what was hit plus whatever its edit needs that
//! cannot be read back from the glyph later (base values, the transform
//! chain). Items never outlive the selection they sit in.

use crate::geometry::Transform;
use crate::model::{ConstructedGlyph, PointPath, Target};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Which handle of an on-curve point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleSide {
    In,
    Out,
}

impl HandleSide {
    pub fn opposite(self) -> Self {
        match self {
            HandleSide::In => HandleSide::Out,
            HandleSide::Out => HandleSide::In,
        }
    }

    /// Field name in a point path
    pub fn field(self) -> &'static str {
        match self {
            HandleSide::In => "in",
            HandleSide::Out => "out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacingSide {
    Left,
    Right,
}

impl SpacingSide {
    /// Glyph field holding this side's spacing
    pub fn field(self) -> &'static str {
        match self {
            SpacingSide::Left => "spacingLeft",
            SpacingSide::Right => "spacingRight",
        }
    }
}

/// What kind of thing an item is, with the data its edit needs
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// Handle of an outline point expanded from a skeleton node
    Handle {
        side: HandleSide,
        /// The outline point owning the handle
        parent: PointPath,
        /// The other outline point of the same skeleton node
        parallel: PointPath,
    },
    /// Handle of a plain contour node, never mirrored
    ContourHandle { side: HandleSide, parent: PointPath },
    /// Outline point expanded from a skeleton node; edits width and angle
    ExpandedNode {
        /// The skeleton node, where width and angle live
        node: PointPath,
        /// The other outline point of the same node
        opposite: PointPath,
        base_width: f64,
        base_angle: f64,
        angle_offset: f64,
    },
    /// Skeleton node: moves position, or slides along its expanded segment
    SkeletonNode { base: Point, base_distr: f64 },
    /// Node of a plain contour
    ContourNode { base: Point },
    Spacing { side: SpacingSide },
    Contour { index: usize },
    Component { index: usize },
    /// Entry of a component's variant menu
    ComponentChoice { component: String, base: String },
    /// Entry of a component-class variant menu
    ComponentClassChoice { class: String, base: String },
}

/// Something the pointer can hit, drag or select
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: PointPath,
    pub kind: ItemKind,
    /// Transforms applied to the item, innermost first
    pub transforms: Vec<Transform>,
}

impl Item {
    /// Describe the on-curve point or handle at `id`.
    ///
    /// Paths ending in `in`/`out` are handles; anything else must resolve to
    /// a node or an outline point.
    pub fn point(glyph: &ConstructedGlyph, id: &PointPath) -> Option<Item> {
        let transforms = glyph.transform_chain(id);
        let kind = match id.last_field() {
            Some(f @ ("in" | "out")) => {
                let side = if f == "in" { HandleSide::In } else { HandleSide::Out };
                let parent = id.parent()?;
                glyph.on_curve(&parent)?;
                match expanded_side(&parent) {
                    Some((node, k)) => ItemKind::Handle {
                        side,
                        parent,
                        parallel: node.field("expandedTo").index(1 - k),
                    },
                    None => ItemKind::ContourHandle { side, parent },
                }
            }
            _ => match glyph.resolve(id)? {
                Target::Outline(_) => {
                    let (node_path, k) = expanded_side(id)?;
                    let node = glyph.node(&node_path)?;
                    ItemKind::ExpandedNode {
                        opposite: node_path.clone().field("expandedTo").index(1 - k),
                        node: node_path,
                        base_width: node.base_width,
                        base_angle: node.base_angle,
                        angle_offset: if k == 0 { -std::f64::consts::PI } else { 0.0 },
                    }
                }
                Target::Node(node) if node.expanded.is_some() => ItemKind::SkeletonNode {
                    base: node.base,
                    base_distr: node.base_distr,
                },
                Target::Node(node) => ItemKind::ContourNode { base: node.base },
                _ => return None,
            },
        };
        Some(Item {
            id: id.clone(),
            kind,
            transforms,
        })
    }

    pub fn spacing(glyph: &ConstructedGlyph, side: SpacingSide) -> Item {
        Item {
            id: PointPath::root().field(side.field()),
            kind: ItemKind::Spacing { side },
            transforms: glyph.transforms.clone(),
        }
    }

    pub fn contour(index: usize) -> Item {
        Item {
            id: PointPath::contour(index),
            kind: ItemKind::Contour { index },
            transforms: Vec::new(),
        }
    }

    pub fn component(index: usize) -> Item {
        Item {
            id: PointPath::component(index),
            kind: ItemKind::Component { index },
            transforms: Vec::new(),
        }
    }

    pub fn component_choice(index: usize, component: &str, base: &str) -> Item {
        Item {
            id: PointPath::component(index).field("choices").field(base),
            kind: ItemKind::ComponentChoice {
                component: component.to_string(),
                base: base.to_string(),
            },
            transforms: Vec::new(),
        }
    }

    pub fn component_class_choice(class: &str, base: &str) -> Item {
        Item {
            id: PointPath::root().field("classes").field(class).field(base),
            kind: ItemKind::ComponentClassChoice {
                class: class.to_string(),
                base: base.to_string(),
            },
            transforms: Vec::new(),
        }
    }

    /// Type tag published with selection snapshots
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ItemKind::Handle { side: HandleSide::In, .. } => "node-in",
            ItemKind::Handle { side: HandleSide::Out, .. } => "node-out",
            ItemKind::ContourHandle { side: HandleSide::In, .. } => "contour-node-in",
            ItemKind::ContourHandle { side: HandleSide::Out, .. } => "contour-node-out",
            ItemKind::ExpandedNode { .. } => "node",
            ItemKind::SkeletonNode { .. } => "node-skeleton",
            ItemKind::ContourNode { .. } => "contour-node",
            ItemKind::Spacing { .. } => "spacing-handle",
            ItemKind::Contour { .. } => "contour",
            ItemKind::Component { .. } => "component",
            ItemKind::ComponentChoice { .. } => "component-choice",
            ItemKind::ComponentClassChoice { .. } => "component-class-choice",
        }
    }

    /// Path of the owning point, for handles and outline points
    pub fn parent_id(&self) -> Option<&PointPath> {
        match &self.kind {
            ItemKind::Handle { parent, .. } | ItemKind::ContourHandle { parent, .. } => Some(parent),
            ItemKind::ExpandedNode { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Where this item's overrides are written
    pub fn modif_address(&self) -> Option<&PointPath> {
        match &self.kind {
            ItemKind::Handle { parent, .. } | ItemKind::ContourHandle { parent, .. } => Some(parent),
            ItemKind::ExpandedNode { node, .. } => Some(node),
            ItemKind::SkeletonNode { .. } | ItemKind::ContourNode { .. } => Some(&self.id),
            _ => None,
        }
    }

    /// Points edited by node drags and nudges
    pub fn is_point(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Handle { .. }
                | ItemKind::ContourHandle { .. }
                | ItemKind::ExpandedNode { .. }
                | ItemKind::SkeletonNode { .. }
                | ItemKind::ContourNode { .. }
        )
    }

    pub fn is_spacing(&self) -> bool {
        matches!(self.kind, ItemKind::Spacing { .. })
    }

    pub fn is_skeleton_node(&self) -> bool {
        matches!(self.kind, ItemKind::SkeletonNode { .. })
    }

    /// Current world position of the item in `glyph`
    pub fn center(&self, glyph: &ConstructedGlyph) -> Option<Point> {
        match &self.kind {
            ItemKind::Spacing { side: SpacingSide::Left } => Some(Point::ZERO),
            ItemKind::Spacing { side: SpacingSide::Right } => Some(Point::new(glyph.advance_width, 0.0)),
            ItemKind::Handle { .. } | ItemKind::ContourHandle { .. } => {
                glyph.handle(&self.id).map(|h| h.point)
            }
            _ => glyph.on_curve(&self.id).map(|p| p.point),
        }
    }
}

/// Split `<node>.expandedTo.<k>` into the node path and `k`
fn expanded_side(path: &PointPath) -> Option<(PointPath, usize)> {
    use crate::model::path::PathSegment;
    let node = path.parent()?.parent()?;
    match &path.segments()[node.len()..] {
        [PathSegment::Field(f), PathSegment::Index(k @ (0 | 1))] if f == "expandedTo" => {
            Some((node, *k))
        }
        _ => None,
    }
}
