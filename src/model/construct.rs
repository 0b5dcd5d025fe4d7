// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Glyph construction: formulas + manual overlay → concrete geometry.
//!
//! Node fields are resolved lazily and memoized for one pass. A formula may
//! name another node's field (`contours.0.nodes.2.x`); that lookup goes
//! through the same memo, so it sees the overridden value, and it is
//! recorded in the dependency tree.

use super::dependency::DependencyTree;
use super::glyph::{Component, ConstructedGlyph, Contour, Handle, Node, OutlinePoint};
use super::overrides::{ComponentChoices, GlyphOverrides, ManualChanges};
use super::path::{PathSegment, PointPath};
use super::source::{GlyphSource, NodeSource, TransformSource};
use super::value::{ConstantOrFormula, Scope, Value};
use crate::error::{ConstructError, FormulaError};
use crate::geometry::{self, Transform};
use kurbo::{Affine, Point, Vec2};
use std::collections::BTreeMap;

/// Glyph-level fields a formula may reference by bare name
const GLYPH_FIELDS: &[&str] = &["advanceWidth", "spacingLeft", "spacingRight"];

/// Node fields a formula may reference below `contours.<c>.nodes.<n>`
const NODE_FIELDS: &[&str] = &["x", "y", "width", "angle", "distr", "in.x", "in.y", "out.x", "out.y"];

/// Everything a glyph needs from the font besides the parameter scope
pub struct GlyphContext<'a> {
    pub glyphs: &'a BTreeMap<String, GlyphSource>,
    pub manual_changes: &'a ManualChanges,
    pub component_choices: &'a ComponentChoices,
}

/// Build one glyph with its components
pub fn construct_glyph(
    source: &GlyphSource,
    context: &GlyphContext<'_>,
    env: &mut dyn Scope,
) -> Result<ConstructedGlyph, ConstructError> {
    let override_name = source.base.as_deref().unwrap_or(&source.name);
    let overrides = context
        .manual_changes
        .glyph(override_name)
        .cloned()
        .unwrap_or_default();
    let mut stack = vec![source.name.clone()];
    build(source, override_name, &overrides, context, env, &mut stack)
}

fn build(
    source: &GlyphSource,
    override_name: &str,
    overrides: &GlyphOverrides,
    context: &GlyphContext<'_>,
    env: &mut dyn Scope,
    stack: &mut Vec<String>,
) -> Result<ConstructedGlyph, ConstructError> {
    let mut builder = GlyphBuilder::new(source, overrides, env);

    let mut contours = Vec::with_capacity(source.contours.len());
    for (c, contour) in source.contours.iter().enumerate() {
        let nodes = (0..contour.nodes.len())
            .map(|n| builder.node(c, n, contour.skeleton))
            .collect::<Result<Vec<_>, _>>()?;
        contours.push(Contour {
            skeleton: contour.skeleton,
            closed: contour.closed,
            nodes,
        });
    }

    let (_, advance) = builder.glyph_field("advanceWidth")?;
    let (base_spacing_left, spacing_left) = builder.glyph_field("spacingLeft")?;
    let (base_spacing_right, spacing_right) = builder.glyph_field("spacingRight")?;
    let transforms = resolve_transforms(&source.transforms, &mut builder, "transforms")?;
    let dependency_tree = std::mem::take(&mut builder.dependencies);
    drop(builder);

    let mut components = Vec::with_capacity(source.components.len());
    for (i, component) in source.components.iter().enumerate() {
        let base = context
            .component_choices
            .choose(override_name, &component.id, component.class.as_deref())
            .unwrap_or(&component.base)
            .to_string();
        if stack.contains(&base) {
            return Err(ConstructError::ComponentCycle(base));
        }
        let Some(component_source) = context.glyphs.get(&base) else {
            return Err(ConstructError::MissingComponentBase {
                glyph: source.name.clone(),
                component: component.id.clone(),
                base,
            });
        };
        let placement = resolve_transforms(
            &component.transforms,
            env,
            &format!("components.{i}.transforms"),
        )?;
        stack.push(base.clone());
        let scoped = overrides.scoped(&PointPath::component(i));
        let mut glyph = build(component_source, &base, &scoped, context, env, stack)?;
        stack.pop();
        glyph.apply_affine(geometry::chain_affine(&placement));
        components.push(Component {
            id: component.id.clone(),
            class: component.class.clone(),
            base,
            choices: component.choices.clone(),
            transforms: placement,
            glyph: Box::new(glyph),
        });
    }

    let shift = spacing_left - base_spacing_left;
    let mut glyph = ConstructedGlyph {
        name: source.name.clone(),
        base: source.base.clone(),
        unicode: source.unicode,
        advance_width: advance + shift + (spacing_right - base_spacing_right),
        spacing_left,
        spacing_right,
        base_spacing_left,
        base_spacing_right,
        transforms,
        contours,
        components,
        dependency_tree,
    };
    glyph.apply_affine(Affine::translate((shift, 0.0)) * geometry::chain_affine(&glyph.transforms));
    Ok(glyph)
}

fn resolve_transforms(
    sources: &[TransformSource],
    scope: &mut dyn Scope,
    path: &str,
) -> Result<Vec<Transform>, ConstructError> {
    sources
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let field = format!("{path}.{i}");
            let param = number(&t.param, scope).map_err(|e| ConstructError::formula(&field, e))?;
            Ok(Transform::new(t.kind, param))
        })
        .collect()
}

fn number(value: &ConstantOrFormula, scope: &mut dyn Scope) -> Result<f64, FormulaError> {
    match value.resolve(scope)? {
        Value::Number(n) => Ok(n),
        other => Err(FormulaError::Type(format!(
            "expected a number, found a {}",
            other.type_name()
        ))),
    }
}

/// Split `contours.<c>.nodes.<n>.<field>` into its parts
fn node_field(path: &PointPath) -> Option<(usize, usize, String)> {
    use PathSegment::{Field, Index};
    match path.segments() {
        [Field(c), Index(ci), Field(n), Index(ni), rest @ ..] if c == "contours" && n == "nodes" => {
            let field = rest
                .iter()
                .map(|s| match s {
                    Field(f) => Some(f.as_str()),
                    Index(_) => None,
                })
                .collect::<Option<Vec<_>>>()?
                .join(".");
            NODE_FIELDS.contains(&field.as_str()).then_some((*ci, *ni, field))
        }
        _ => None,
    }
}

/// Resolves one glyph's fields for a single pass
struct GlyphBuilder<'a> {
    source: &'a GlyphSource,
    overrides: &'a GlyphOverrides,
    env: &'a mut dyn Scope,
    /// field path → (formula value, overridden value)
    values: BTreeMap<PointPath, (f64, f64)>,
    in_progress: Vec<PointPath>,
    dependencies: DependencyTree,
}

impl<'a> GlyphBuilder<'a> {
    fn new(source: &'a GlyphSource, overrides: &'a GlyphOverrides, env: &'a mut dyn Scope) -> Self {
        Self {
            source,
            overrides,
            env,
            values: BTreeMap::new(),
            in_progress: Vec::new(),
            dependencies: DependencyTree::default(),
        }
    }

    fn glyph_field(&mut self, name: &str) -> Result<(f64, f64), ConstructError> {
        let path = PointPath::root().field(name);
        self.field(&path)
            .map_err(|e| ConstructError::formula(path.to_string(), e))
    }

    fn node(&mut self, c: usize, n: usize, skeleton: bool) -> Result<Node, ConstructError> {
        let node_path = PointPath::node(c, n);
        let mut get = |field: &str| {
            let path = field.split('.').fold(node_path.clone(), PointPath::field);
            self.field(&path)
                .map_err(|e| ConstructError::formula(path.to_string(), e))
        };
        let (bx, x) = get("x")?;
        let (by, y) = get("y")?;
        let (base_width, width) = get("width")?;
        let (base_angle, angle) = get("angle")?;
        let (base_distr, distr) = get("distr")?;
        let (bix, ix) = get("in.x")?;
        let (biy, iy) = get("in.y")?;
        let (box_, ox) = get("out.x")?;
        let (boy, oy) = get("out.y")?;

        let source = &self.source.contours[c].nodes[n];
        let point = Point::new(x, y);
        let handle_in = Handle {
            point: Point::new(ix, iy),
            base: Point::new(bix, biy),
        };
        let handle_out = Handle {
            point: Point::new(ox, oy),
            base: Point::new(box_, boy),
        };
        let expanded = skeleton.then(|| {
            let dir = geometry::polar(angle, 1.0);
            let left = point - dir * width * distr;
            let right = point + dir * width * (1.0 - distr);
            [
                self.outline_point(&node_path, 0, left, point, &handle_in, &handle_out, source),
                self.outline_point(&node_path, 1, right, point, &handle_in, &handle_out, source),
            ]
        });

        Ok(Node {
            point,
            base: Point::new(bx, by),
            width,
            base_width,
            angle,
            base_angle,
            distr,
            base_distr,
            handle_in,
            handle_out,
            type_in: source.type_in,
            type_out: source.type_out,
            expanded,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn outline_point(
        &self,
        node_path: &PointPath,
        side: usize,
        point: Point,
        skeleton: Point,
        handle_in: &Handle,
        handle_out: &Handle,
        source: &NodeSource,
    ) -> OutlinePoint {
        let side_path = node_path.clone().field("expandedTo").index(side);
        let handle = |name: &str, skeleton_handle: &Handle| {
            let base = point + (skeleton_handle.point - skeleton);
            let path = side_path.child(name);
            Handle {
                point: Point::new(
                    self.overrides.overlay(&path.child("x"), base.x),
                    self.overrides.overlay(&path.child("y"), base.y),
                ),
                base,
            }
        };
        OutlinePoint {
            point,
            handle_in: handle("in", handle_in),
            handle_out: handle("out", handle_out),
            type_in: source.type_in,
            type_out: source.type_out,
        }
    }

    /// Memoized (formula, overridden) value of a field path
    fn field(&mut self, path: &PointPath) -> Result<(f64, f64), FormulaError> {
        if let Some(value) = self.values.get(path) {
            return Ok(*value);
        }
        if self.in_progress.contains(path) {
            return Err(FormulaError::Cycle(path.to_string()));
        }
        self.in_progress.push(path.clone());
        let result = self.compute(path);
        self.in_progress.pop();
        let value = result?;
        self.values.insert(path.clone(), value);
        Ok(value)
    }

    fn compute(&mut self, path: &PointPath) -> Result<(f64, f64), FormulaError> {
        let source = self.source;
        if let Some(name) = path.last_field().filter(|_| path.len() == 1) {
            let definition = match name {
                "advanceWidth" => &source.advance_width,
                "spacingLeft" => &source.spacing_left,
                "spacingRight" => &source.spacing_right,
                _ => return Err(FormulaError::UnknownName(path.to_string())),
            };
            let base = number(definition, self)?;
            return Ok((base, self.overrides.overlay(path, base)));
        }

        let Some((c, n, field)) = node_field(path) else {
            return Err(FormulaError::UnknownName(path.to_string()));
        };
        let Some(node) = source.contours.get(c).and_then(|contour| contour.nodes.get(n)) else {
            return Err(FormulaError::UnknownName(path.to_string()));
        };
        let node_path = PointPath::node(c, n);
        let base = match field.as_str() {
            "x" => number(&node.x, self)?,
            "y" => number(&node.y, self)?,
            "width" => number(&node.width, self)?,
            "angle" => number(&node.angle, self)?,
            "distr" => {
                let base = number(&node.distr, self)?;
                let delta = self
                    .overrides
                    .get(&node_path.child("expand").field("distr"))
                    .unwrap_or(0.0);
                return Ok((base, base + delta));
            }
            handle => {
                let (side, axis) = handle.split_once('.').unwrap_or((handle, "x"));
                let offset = if side == "in" { &node.handle_in } else { &node.handle_out };
                let relative = if axis == "x" { &offset.x } else { &offset.y };
                let relative = number(relative, self)?;
                let (_, anchor) = self.field(&node_path.child(axis))?;
                anchor + relative
            }
        };
        Ok((base, self.overrides.overlay(path, base)))
    }

    /// Record that the field currently being resolved read `dependency`
    fn record(&mut self, dependency: &PointPath) {
        let Some(current) = self.in_progress.last() else {
            return;
        };
        let (point, field) = match node_field(current) {
            Some((c, n, field)) => (PointPath::node(c, n), field),
            None => (PointPath::root(), current.to_string()),
        };
        self.dependencies.record(point, &field, dependency.clone());
    }
}

impl Scope for GlyphBuilder<'_> {
    fn lookup(&mut self, name: &str) -> Result<Value, FormulaError> {
        let Ok(path) = name.parse::<PointPath>() else {
            return self.env.lookup(name);
        };
        if path.len() == 1 && GLYPH_FIELDS.contains(&name) {
            self.record(&path);
            return self.field(&path).map(|(_, value)| Value::Number(value));
        }
        if node_field(&path).is_some() {
            self.record(&path);
            return self.field(&path).map(|(_, value)| Value::Number(value));
        }
        if let [PathSegment::Field(c), PathSegment::Index(ci), PathSegment::Field(n), PathSegment::Index(ni)] =
            path.segments()
            && c == "contours"
            && n == "nodes"
        {
            let node = PointPath::node(*ci, *ni);
            self.record(&node);
            let (_, x) = self.field(&node.child("x"))?;
            let (_, y) = self.field(&node.child("y"))?;
            return Ok(Value::Vector(Vec2::new(x, y)));
        }
        self.env.lookup(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::overrides::Changes;
    use crate::model::source::FontSource;

    const FONT: &str = r#"{
        "parameters": {},
        "glyphs": {
            "i": {
                "name": "i",
                "unicode": 105,
                "advanceWidth": {"formula": "thickness + 100"},
                "spacingLeft": 50,
                "spacingRight": 50,
                "contours": [{
                    "skeleton": true,
                    "closed": false,
                    "nodes": [
                        {"x": 100, "y": 0, "width": {"formula": "thickness"}, "angle": 0,
                         "out": {"x": 0, "y": 40}, "typeOut": "smooth"},
                        {"x": {"formula": "contours.0.nodes.0.x"}, "y": {"formula": "xHeight"},
                         "width": {"formula": "thickness"}, "in": {"x": 0, "y": -40}}
                    ]
                }]
            },
            "dot": {
                "name": "dot",
                "contours": [{"nodes": [{"x": 0, "y": 0}]}]
            },
            "j": {
                "name": "j",
                "components": [{"id": "top", "base": "dot", "choices": ["dot"],
                                "transforms": [{"kind": "translateY", "param": {"formula": "xHeight"}}]}],
                "transforms": [{"kind": "scaleX", "param": 2}]
            },
            "loop": {
                "name": "loop",
                "components": [{"id": "self", "base": "loop"}]
            }
        }
    }"#;

    fn env() -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("thickness".to_string(), Value::Number(80.0)),
            ("xHeight".to_string(), Value::Number(500.0)),
        ])
    }

    fn build_named(name: &str, manual: &ManualChanges) -> Result<ConstructedGlyph, ConstructError> {
        let source = FontSource::from_json_str(FONT).unwrap();
        let choices = ComponentChoices::default();
        let context = GlyphContext {
            glyphs: &source.glyphs,
            manual_changes: manual,
            component_choices: &choices,
        };
        construct_glyph(&source.glyphs[name], &context, &mut env())
    }

    #[test]
    fn expands_skeleton_nodes() {
        let glyph = build_named("i", &ManualChanges::default()).unwrap();
        let node = &glyph.contours[0].nodes[0];
        assert_eq!(node.point, Point::new(100.0, 0.0));
        let [left, right] = node.expanded.as_ref().unwrap();
        assert_eq!(left.point, Point::new(60.0, 0.0));
        assert_eq!(right.point, Point::new(140.0, 0.0));
        assert_eq!(node.handle_out.point, Point::new(100.0, 40.0));
        assert_eq!(right.handle_out.point, Point::new(140.0, 40.0));
        assert_eq!(glyph.advance_width, 180.0);
        assert_eq!(glyph.contours[0].nodes[1].point, Point::new(100.0, 500.0));
    }

    #[test]
    fn overrides_reach_dependents_and_reset_cleanly() {
        let derived = build_named("i", &ManualChanges::default()).unwrap();
        let mut manual = ManualChanges::default();
        let mut patch = Changes::new();
        patch.insert(PointPath::node(0, 0).field("x"), 15.0);
        patch.insert(PointPath::node(0, 0).field("width"), 1.5);
        manual.apply("i", &patch);

        let edited = build_named("i", &manual).unwrap();
        let node = &edited.contours[0].nodes[0];
        assert_eq!(node.point.x, 115.0);
        assert_eq!(node.base.x, 100.0);
        assert_eq!(node.width, 120.0);
        assert_eq!(node.base_width, 80.0);
        // node 1 reads node 0's x through its formula
        assert_eq!(edited.contours[0].nodes[1].point.x, 115.0);
        // handles ride along with their node
        assert_eq!(node.handle_out.point, Point::new(115.0, 40.0));

        manual.reset_points("i", [&PointPath::node(0, 0)]);
        let reset = build_named("i", &manual).unwrap();
        assert_eq!(reset, derived);
    }

    #[test]
    fn construction_is_repeatable() {
        let a = build_named("i", &ManualChanges::default()).unwrap();
        let b = build_named("i", &ManualChanges::default()).unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn records_node_dependencies() {
        let glyph = build_named("i", &ManualChanges::default()).unwrap();
        let deps = glyph.dependencies_of(&PointPath::node(0, 1));
        assert_eq!(deps, vec![PointPath::node(0, 0).field("x")]);
        assert!(glyph.dependencies_of(&PointPath::node(0, 0)).is_empty());
    }

    #[test]
    fn components_are_placed_and_transformed() {
        let glyph = build_named("j", &ManualChanges::default()).unwrap();
        let component = &glyph.components[0];
        assert_eq!(component.base, "dot");
        let path = PointPath::component(0).join(&PointPath::node(0, 0));
        assert_eq!(glyph.node(&path).unwrap().point, Point::new(0.0, 500.0));
        assert_eq!(glyph.transform_chain(&path).len(), 2);
    }

    #[test]
    fn component_overrides_are_scoped() {
        let mut manual = ManualChanges::default();
        let mut patch = Changes::new();
        patch.insert(PointPath::component(0).join(&PointPath::node(0, 0)).field("x"), 10.0);
        manual.apply("j", &patch);
        let glyph = build_named("j", &manual).unwrap();
        let path = PointPath::component(0).join(&PointPath::node(0, 0));
        // x override is local, the glyph's scaleX doubles it
        assert_eq!(glyph.node(&path).unwrap().point, Point::new(20.0, 500.0));
    }

    #[test]
    fn component_cycles_are_errors() {
        let err = build_named("loop", &ManualChanges::default()).unwrap_err();
        assert_eq!(err, ConstructError::ComponentCycle("loop".to_string()));
    }

    #[test]
    fn spacing_overrides_shift_the_outline() {
        let mut manual = ManualChanges::default();
        let mut patch = Changes::new();
        patch.insert("spacingLeft".parse().unwrap(), 10.0);
        manual.apply("i", &patch);
        let glyph = build_named("i", &manual).unwrap();
        assert_eq!(glyph.spacing_left, 60.0);
        assert_eq!(glyph.base_spacing_left, 50.0);
        assert_eq!(glyph.advance_width, 190.0);
        assert_eq!(glyph.contours[0].nodes[0].point.x, 110.0);
    }
}
