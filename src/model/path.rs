// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Structured addresses into a constructed glyph.
//!
//! A `PointPath` is a sequence of field and index segments, written in
//! dotted form as `contours.0.nodes.3.expandedTo.1.in.x`. The same type
//! keys the manual-override overlay, names dependency-tree entries and
//! identifies hit-test items, so there is exactly one parser for the
//! dotted form and no string concatenation anywhere else.

use crate::error::PathError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One step of a point path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Address of a value inside a glyph
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointPath(Vec<PathSegment>);

impl PointPath {
    /// The empty path, addressing the glyph itself
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// `contours.<contour>`
    pub fn contour(contour: usize) -> Self {
        Self::root().field("contours").index(contour)
    }

    /// `contours.<contour>.nodes.<node>`
    pub fn node(contour: usize, node: usize) -> Self {
        Self::contour(contour).field("nodes").index(node)
    }

    /// `components.<index>`
    pub fn component(index: usize) -> Self {
        Self::root().field("components").index(index)
    }

    /// Append a field segment
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathSegment::Field(name.into()));
        self
    }

    /// Append an index segment
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    /// A copy of this path with a field appended
    pub fn child(&self, name: &str) -> Self {
        self.clone().field(name)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Concatenate two paths
    pub fn join(&self, other: &PointPath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    pub fn starts_with(&self, prefix: &PointPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The remainder after `prefix`, if this path starts with it
    pub fn strip_prefix(&self, prefix: &PointPath) -> Option<Self> {
        self.0
            .strip_prefix(prefix.0.as_slice())
            .map(|rest| Self(rest.to_vec()))
    }

    /// The path without its last segment
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// Keep at most `len` leading segments
    pub fn truncated(&self, len: usize) -> Self {
        Self(self.0.iter().take(len).cloned().collect())
    }

    /// Name of the last segment when it is a field
    pub fn last_field(&self) -> Option<&str> {
        match self.0.last()? {
            PathSegment::Field(name) => Some(name),
            PathSegment::Index(_) => None,
        }
    }

    /// Whether any segment is the given field
    pub fn contains_field(&self, name: &str) -> bool {
        self.0
            .iter()
            .any(|s| matches!(s, PathSegment::Field(f) if f == name))
    }

    /// The innermost `...nodes.<n>` prefix, addressing the owning node
    pub fn node_prefix(&self) -> Option<Self> {
        let at = self.0.windows(2).rposition(|pair| {
            matches!(pair, [PathSegment::Field(f), PathSegment::Index(_)] if f == "nodes")
        })?;
        Some(self.truncated(at + 2))
    }
}

impl fmt::Display for PointPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                PathSegment::Field(name) => f.write_str(name)?,
                PathSegment::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for PointPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let segments = s
            .split('.')
            .map(|part| {
                if part.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else if let Ok(index) = part.parse::<usize>() {
                    Ok(PathSegment::Index(index))
                } else {
                    Ok(PathSegment::Field(part.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(segments))
    }
}

impl Serialize for PointPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PointPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
