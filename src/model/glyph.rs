// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Constructed glyph geometry.
//!
//! Everything here is the output of a construction pass: world-space
//! positions after overrides and transforms, plus the pre-override base
//! values the edit engine needs to turn a pointer position into a delta.

use super::dependency::DependencyTree;
use super::path::{PathSegment, PointPath};
use super::source::Tangency;
use crate::geometry::{self, Transform};
use kurbo::{Affine, Point, Rect};
use serde::Serialize;

/// An off-curve control point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Handle {
    pub point: Point,
    /// Position without this handle's own override
    pub base: Point,
}

impl Handle {
    pub fn at(point: Point) -> Self {
        Self { point, base: point }
    }
}

/// One of the two outline points a skeleton node expands into
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlinePoint {
    pub point: Point,
    pub handle_in: Handle,
    pub handle_out: Handle,
    pub type_in: Tangency,
    pub type_out: Tangency,
}

/// A resolved skeleton or contour node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub point: Point,
    /// Position without this node's own x/y override
    pub base: Point,
    pub width: f64,
    pub base_width: f64,
    pub angle: f64,
    pub base_angle: f64,
    pub distr: f64,
    pub base_distr: f64,
    pub handle_in: Handle,
    pub handle_out: Handle,
    pub type_in: Tangency,
    pub type_out: Tangency,
    /// Left and right outline points, for skeleton contours only
    pub expanded: Option<[OutlinePoint; 2]>,
}

impl Node {
    pub fn is_smooth(&self) -> bool {
        self.type_in == Tangency::Smooth || self.type_out == Tangency::Smooth
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contour {
    pub skeleton: bool,
    pub closed: bool,
    pub nodes: Vec<Node>,
}

/// A placed sub-glyph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub id: String,
    pub class: Option<String>,
    /// The chosen base glyph
    pub base: String,
    pub choices: Vec<String>,
    pub transforms: Vec<Transform>,
    pub glyph: Box<ConstructedGlyph>,
}

/// The resolved geometry of one glyph
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructedGlyph {
    pub name: String,
    pub base: Option<String>,
    pub unicode: Option<u32>,
    pub advance_width: f64,
    pub spacing_left: f64,
    pub spacing_right: f64,
    pub base_spacing_left: f64,
    pub base_spacing_right: f64,
    pub transforms: Vec<Transform>,
    pub contours: Vec<Contour>,
    pub components: Vec<Component>,
    pub dependency_tree: DependencyTree,
}

/// A borrowed view of whatever a path points at
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Glyph(&'a ConstructedGlyph),
    Contour(&'a Contour),
    Node(&'a Node),
    Outline(&'a OutlinePoint),
    Handle(&'a Handle),
    Component(&'a Component),
    Number(f64),
}

/// On-curve data shared by skeleton nodes and outline points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnCurve {
    pub point: Point,
    pub handle_in: Handle,
    pub handle_out: Handle,
    pub type_in: Tangency,
    pub type_out: Tangency,
}

impl OnCurve {
    pub fn is_smooth(&self) -> bool {
        self.type_in == Tangency::Smooth || self.type_out == Tangency::Smooth
    }
}

impl ConstructedGlyph {
    /// Name used to store this glyph's overrides
    pub fn override_name(&self) -> &str {
        self.base.as_deref().unwrap_or(&self.name)
    }

    pub fn character(&self) -> Option<char> {
        self.unicode.and_then(char::from_u32)
    }

    /// Resolve a structured path against this glyph
    pub fn resolve(&self, path: &PointPath) -> Option<Target<'_>> {
        resolve_glyph(self, path.segments())
    }

    pub fn node(&self, path: &PointPath) -> Option<&Node> {
        match self.resolve(path)? {
            Target::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn handle(&self, path: &PointPath) -> Option<&Handle> {
        match self.resolve(path)? {
            Target::Handle(handle) => Some(handle),
            _ => None,
        }
    }

    /// Skeleton node or outline point at `path`
    pub fn on_curve(&self, path: &PointPath) -> Option<OnCurve> {
        match self.resolve(path)? {
            Target::Node(n) => Some(OnCurve {
                point: n.point,
                handle_in: n.handle_in,
                handle_out: n.handle_out,
                type_in: n.type_in,
                type_out: n.type_out,
            }),
            Target::Outline(o) => Some(OnCurve {
                point: o.point,
                handle_in: o.handle_in,
                handle_out: o.handle_out,
                type_in: o.type_in,
                type_out: o.type_out,
            }),
            _ => None,
        }
    }

    /// Transforms applied to the point at `path`, innermost first
    pub fn transform_chain(&self, path: &PointPath) -> Vec<Transform> {
        let mut chain = Vec::new();
        self.collect_chain(path.segments(), &mut chain);
        chain
    }

    fn collect_chain(&self, segments: &[PathSegment], chain: &mut Vec<Transform>) {
        if let [PathSegment::Field(f), PathSegment::Index(i), rest @ ..] = segments
            && f == "components"
            && let Some(component) = self.components.get(*i)
        {
            component.glyph.collect_chain(rest, chain);
            chain.extend_from_slice(&component.transforms);
        }
        chain.extend_from_slice(&self.transforms);
    }

    /// Every path the point at `path` was computed from
    pub fn dependencies_of(&self, path: &PointPath) -> Vec<PointPath> {
        if let [PathSegment::Field(f), PathSegment::Index(i), ..] = path.segments()
            && f == "components"
        {
            let prefix = PointPath::component(*i);
            return match (self.components.get(*i), path.strip_prefix(&prefix)) {
                (Some(component), Some(rest)) => component
                    .glyph
                    .dependencies_of(&rest)
                    .into_iter()
                    .map(|d| prefix.join(&d))
                    .collect(),
                _ => Vec::new(),
            };
        }
        self.dependency_tree.dependencies_of(path).into_iter().collect()
    }

    /// Every on-curve and off-curve point, including component geometry
    pub fn all_points(&self) -> Vec<Point> {
        let mut points = Vec::new();
        for node in self.contours.iter().flat_map(|c| &c.nodes) {
            match &node.expanded {
                Some(expanded) => {
                    for o in expanded {
                        points.extend([o.point, o.handle_in.point, o.handle_out.point]);
                    }
                }
                None => points.extend([node.point, node.handle_in.point, node.handle_out.point]),
            }
        }
        for component in &self.components {
            points.extend(component.glyph.all_points());
        }
        points
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        geometry::bounding_box(self.all_points())
    }

    /// Map every position in the glyph, components included
    pub(crate) fn apply_affine(&mut self, affine: Affine) {
        for node in self.contours.iter_mut().flat_map(|c| &mut c.nodes) {
            node.point = affine * node.point;
            node.base = affine * node.base;
            map_handle(&mut node.handle_in, affine);
            map_handle(&mut node.handle_out, affine);
            if let Some(expanded) = &mut node.expanded {
                for o in expanded {
                    o.point = affine * o.point;
                    map_handle(&mut o.handle_in, affine);
                    map_handle(&mut o.handle_out, affine);
                }
            }
        }
        for component in &mut self.components {
            component.glyph.apply_affine(affine);
        }
    }
}

fn map_handle(handle: &mut Handle, affine: Affine) {
    handle.point = affine * handle.point;
    handle.base = affine * handle.base;
}

fn resolve_glyph<'a>(glyph: &'a ConstructedGlyph, segments: &[PathSegment]) -> Option<Target<'a>> {
    use PathSegment::{Field, Index};
    match segments {
        [] => Some(Target::Glyph(glyph)),
        [Field(f)] => match f.as_str() {
            "advanceWidth" => Some(Target::Number(glyph.advance_width)),
            "spacingLeft" => Some(Target::Number(glyph.spacing_left)),
            "spacingRight" => Some(Target::Number(glyph.spacing_right)),
            _ => None,
        },
        [Field(f), Index(i), rest @ ..] if f == "contours" => {
            let contour = glyph.contours.get(*i)?;
            match rest {
                [] => Some(Target::Contour(contour)),
                [Field(n), Index(j), rest @ ..] if n == "nodes" => {
                    resolve_node(contour.nodes.get(*j)?, rest)
                }
                _ => None,
            }
        }
        [Field(f), Index(i), rest @ ..] if f == "components" => {
            let component = glyph.components.get(*i)?;
            if rest.is_empty() {
                Some(Target::Component(component))
            } else {
                resolve_glyph(&component.glyph, rest)
            }
        }
        _ => None,
    }
}

fn resolve_node<'a>(node: &'a Node, segments: &[PathSegment]) -> Option<Target<'a>> {
    use PathSegment::{Field, Index};
    match segments {
        [] => Some(Target::Node(node)),
        [Field(f), Index(k), rest @ ..] if f == "expandedTo" => {
            let outline = node.expanded.as_ref()?.get(*k)?;
            match rest {
                [] => Some(Target::Outline(outline)),
                [Field(f), rest @ ..] => {
                    resolve_on_curve(outline.point, &outline.handle_in, &outline.handle_out, f, rest)
                }
                _ => None,
            }
        }
        [Field(f)] if f == "width" => Some(Target::Number(node.width)),
        [Field(f)] if f == "angle" => Some(Target::Number(node.angle)),
        [Field(f)] if f == "distr" => Some(Target::Number(node.distr)),
        [Field(f), rest @ ..] => resolve_on_curve(node.point, &node.handle_in, &node.handle_out, f, rest),
        _ => None,
    }
}

fn resolve_on_curve<'a>(
    point: Point,
    handle_in: &'a Handle,
    handle_out: &'a Handle,
    field: &str,
    rest: &[PathSegment],
) -> Option<Target<'a>> {
    let handle = match (field, rest) {
        ("x", []) => return Some(Target::Number(point.x)),
        ("y", []) => return Some(Target::Number(point.y)),
        ("in", _) => handle_in,
        ("out", _) => handle_out,
        _ => return None,
    };
    match rest {
        [] => Some(Target::Handle(handle)),
        [PathSegment::Field(axis)] if axis == "x" => Some(Target::Number(handle.point.x)),
        [PathSegment::Field(axis)] if axis == "y" => Some(Target::Number(handle.point.y)),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::TransformKind;

    pub(crate) fn node_at(x: f64, y: f64) -> Node {
        let p = Point::new(x, y);
        Node {
            point: p,
            base: p,
            width: 0.0,
            base_width: 0.0,
            angle: 0.0,
            base_angle: 0.0,
            distr: 0.5,
            base_distr: 0.5,
            handle_in: Handle::at(p),
            handle_out: Handle::at(p),
            type_in: Tangency::Corner,
            type_out: Tangency::Corner,
            expanded: None,
        }
    }

    pub(crate) fn glyph_with(contours: Vec<Contour>) -> ConstructedGlyph {
        ConstructedGlyph {
            name: "a".to_string(),
            base: None,
            unicode: Some('a' as u32),
            advance_width: 500.0,
            spacing_left: 40.0,
            spacing_right: 40.0,
            base_spacing_left: 40.0,
            base_spacing_right: 40.0,
            transforms: Vec::new(),
            contours,
            components: Vec::new(),
            dependency_tree: DependencyTree::default(),
        }
    }

    #[test]
    fn resolves_nested_paths() {
        let mut node = node_at(10.0, 20.0);
        node.handle_out = Handle::at(Point::new(30.0, 20.0));
        let glyph = glyph_with(vec![Contour {
            skeleton: false,
            closed: true,
            nodes: vec![node_at(0.0, 0.0), node],
        }]);

        let out: PointPath = "contours.0.nodes.1.out.x".parse().unwrap();
        assert!(matches!(glyph.resolve(&out), Some(Target::Number(x)) if x == 30.0));
        assert!(glyph.node(&PointPath::node(0, 1)).is_some());
        assert!(glyph.node(&PointPath::node(0, 2)).is_none());
        assert!(glyph.resolve(&PointPath::node(0, 1).field("bogus")).is_none());
        assert!(glyph.handle(&PointPath::node(0, 1).field("in")).is_some());
        assert!(matches!(
            glyph.resolve(&"advanceWidth".parse().unwrap()),
            Some(Target::Number(w)) if w == 500.0
        ));
    }

    #[test]
    fn component_chains_run_inside_out() {
        let inner_scale = Transform::new(TransformKind::ScaleX, 2.0);
        let placement = Transform::new(TransformKind::TranslateX, 100.0);
        let outer = Transform::new(TransformKind::ScaleY, 3.0);
        let mut inner = glyph_with(vec![Contour {
            skeleton: false,
            closed: true,
            nodes: vec![node_at(1.0, 1.0)],
        }]);
        inner.transforms = vec![inner_scale];
        let mut glyph = glyph_with(Vec::new());
        glyph.transforms = vec![outer];
        glyph.components.push(Component {
            id: "top".to_string(),
            class: None,
            base: "a".to_string(),
            choices: Vec::new(),
            transforms: vec![placement],
            glyph: Box::new(inner),
        });

        let path = PointPath::component(0).join(&PointPath::node(0, 0));
        assert!(glyph.node(&path).is_some());
        assert_eq!(glyph.transform_chain(&path), vec![inner_scale, placement, outer]);
        assert_eq!(glyph.transform_chain(&PointPath::node(0, 0)), vec![outer]);
    }
}
