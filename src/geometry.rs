// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Vector and transform helpers shared by construction and editing.
//!
//! Points and vectors are plain `kurbo` types. The only thing this module
//! adds is the transform chain attached to glyphs and components, and the
//! "scale correction" that maps a world-space delta back into the local,
//! untransformed space where manual overrides live.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Lengths below this are treated as zero
pub const EPSILON: f64 = 1e-9;

/// Kind of a single transform in a glyph or component chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformKind {
    ScaleX,
    ScaleY,
    TranslateX,
    TranslateY,
    /// Rotation in radians around the origin
    Rotate,
}

/// A resolved transform with its numeric parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub kind: TransformKind,
    pub param: f64,
}

impl Transform {
    pub fn new(kind: TransformKind, param: f64) -> Self {
        Self { kind, param }
    }

    /// The affine matrix for this transform alone
    pub fn to_affine(self) -> Affine {
        match self.kind {
            TransformKind::ScaleX => Affine::scale_non_uniform(self.param, 1.0),
            TransformKind::ScaleY => Affine::scale_non_uniform(1.0, self.param),
            TransformKind::TranslateX => Affine::translate((self.param, 0.0)),
            TransformKind::TranslateY => Affine::translate((0.0, self.param)),
            TransformKind::Rotate => Affine::rotate(self.param),
        }
    }
}

/// Compose a chain into one matrix. The first transform is applied first.
pub fn chain_affine(transforms: &[Transform]) -> Affine {
    transforms
        .iter()
        .fold(Affine::IDENTITY, |acc, t| t.to_affine() * acc)
}

/// Per-axis factors that undo the scales of a transform chain.
///
/// Only `scaleX`/`scaleY` participate. A zero scale is skipped instead of
/// producing an infinite factor.
pub fn scale_correction(transforms: &[Transform]) -> Vec2 {
    transforms
        .iter()
        .fold(Vec2::new(1.0, 1.0), |acc, t| match t.kind {
            TransformKind::ScaleX if t.param.abs() > EPSILON => Vec2::new(acc.x / t.param, acc.y),
            TransformKind::ScaleY if t.param.abs() > EPSILON => Vec2::new(acc.x, acc.y / t.param),
            _ => acc,
        })
}

/// Multiply a vector component-wise by a correction
pub fn correct(v: Vec2, correction: Vec2) -> Vec2 {
    Vec2::new(v.x * correction.x, v.y * correction.y)
}

/// Vector of the given length pointing at `angle`
pub fn polar(angle: f64, length: f64) -> Vec2 {
    Vec2::from_angle(angle) * length
}

/// Wrap an angle into `(-PI, PI]`
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Unit vector from `from` to `to`, or `None` when they coincide
pub fn direction(from: Point, to: Point) -> Option<Vec2> {
    let v = to - from;
    let len = v.hypot();
    (len > EPSILON).then(|| v / len)
}

/// Bounding rectangle of a set of points
pub fn bounding_box(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    Some(iter.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}
