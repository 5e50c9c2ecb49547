// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable drawable tree produced by rendering.
//!
//! Rendering never touches an output document: marks, axes and legends return [`Node`] values
//! which are composed into one tree and serialized in a separate step.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Point, Rect, Shape};
use peniko::{Brush, Color};

/// Horizontal anchoring for text.
///
/// In SVG terms, this maps to the `text-anchor` attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    /// Anchor at the start (left in LTR).
    #[default]
    Start,
    /// Anchor in the middle.
    Middle,
    /// Anchor at the end (right in LTR).
    End,
}

/// Vertical alignment for text.
///
/// In SVG terms, this maps to the `dominant-baseline` attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextBaseline {
    /// Baseline is centered on the anchor point.
    #[default]
    Middle,
    /// Baseline is the font's alphabetic baseline.
    Alphabetic,
    /// Baseline is the font's hanging baseline.
    Hanging,
}

/// Paint attributes shared by shapes.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    /// Fill paint, or `None` for no fill.
    pub fill: Option<Brush>,
    /// Stroke paint, or `None` for no stroke.
    pub stroke: Option<Brush>,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Overall opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
        }
    }
}

impl Style {
    /// A solid fill with no stroke.
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(Brush::Solid(color)),
            ..Self::default()
        }
    }

    /// A solid stroke with no fill.
    pub fn stroked(color: Color, width: f64) -> Self {
        Self {
            stroke: Some(Brush::Solid(color)),
            stroke_width: width,
            ..Self::default()
        }
    }

    /// Sets the overall opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

/// A group of nodes sharing a transform and optional clip.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Group {
    /// A class name, serialized as the SVG `class` attribute.
    pub class: Option<Arc<str>>,
    /// Transform applied to the children.
    pub transform: Affine,
    /// Optional clip rectangle, in the group's coordinates.
    pub clip: Option<Rect>,
    /// Child nodes, painted in order.
    pub children: Vec<Node>,
}

/// An axis-aligned rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct RectNode {
    /// Geometry.
    pub rect: Rect,
    /// Paint.
    pub style: Style,
    /// Optional tooltip text.
    pub title: Option<Arc<str>>,
}

/// A vector path.
#[derive(Clone, Debug, PartialEq)]
pub struct PathNode {
    /// Geometry.
    pub path: BezPath,
    /// Paint.
    pub style: Style,
    /// Optional tooltip text.
    pub title: Option<Arc<str>>,
}

/// A text item positioned at a point.
#[derive(Clone, Debug, PartialEq)]
pub struct TextNode {
    /// Anchor position.
    pub pos: Point,
    /// Text content (unshaped).
    pub text: Arc<str>,
    /// Font size in pixels.
    pub font_size: f64,
    /// Rotation in degrees, clockwise.
    pub angle: f64,
    /// Horizontal anchoring.
    pub anchor: TextAnchor,
    /// Vertical alignment.
    pub baseline: TextBaseline,
    /// Fill paint.
    pub fill: Brush,
    /// Overall opacity in `[0, 1]`.
    pub opacity: f64,
}

impl TextNode {
    /// Creates a black text item with default font size and anchoring.
    pub fn new(pos: Point, text: impl Into<Arc<str>>) -> Self {
        Self {
            pos,
            text: text.into(),
            font_size: 10.0,
            angle: 0.0,
            anchor: TextAnchor::Start,
            baseline: TextBaseline::Middle,
            fill: Brush::Solid(Color::BLACK),
            opacity: 1.0,
        }
    }

    /// Sets the horizontal anchoring.
    pub fn with_anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Sets the vertical alignment.
    pub fn with_baseline(mut self, baseline: TextBaseline) -> Self {
        self.baseline = baseline;
        self
    }

    /// Sets the font size.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Sets the rotation angle in degrees.
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Sets the fill paint.
    pub fn with_fill(mut self, fill: impl Into<Brush>) -> Self {
        self.fill = fill.into();
        self
    }
}

/// A drawable node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A group of child nodes.
    Group(Group),
    /// A rectangle.
    Rect(RectNode),
    /// A path.
    Path(PathNode),
    /// A text item.
    Text(TextNode),
}

impl Node {
    /// Creates a group with a class name and no transform.
    pub fn group(class: impl Into<Arc<str>>, children: Vec<Self>) -> Self {
        Self::Group(Group {
            class: Some(class.into()),
            children,
            ..Group::default()
        })
    }

    /// Creates a group translated by `(dx, dy)`.
    pub fn translated(class: impl Into<Arc<str>>, dx: f64, dy: f64, children: Vec<Self>) -> Self {
        Self::Group(Group {
            class: Some(class.into()),
            transform: Affine::translate((dx, dy)),
            clip: None,
            children,
        })
    }

    /// Creates a rectangle.
    pub fn rect(rect: Rect, style: Style) -> Self {
        Self::Rect(RectNode {
            rect,
            style,
            title: None,
        })
    }

    /// Creates a path.
    pub fn path(path: BezPath, style: Style) -> Self {
        Self::Path(PathNode {
            path,
            style,
            title: None,
        })
    }

    /// Returns the class name of a group.
    pub fn class(&self) -> Option<&str> {
        match self {
            Self::Group(g) => g.class.as_deref(),
            _ => None,
        }
    }

    /// Returns the children of a group (empty for leaves).
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Group(g) => &g.children,
            _ => &[],
        }
    }

    /// Visits this node and all of its descendants, depth first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Returns every group with the given class, in document order.
    pub fn find_class<'a>(&'a self, class: &str) -> Vec<&'a Self> {
        let mut out = Vec::new();
        self.walk(&mut |n| {
            if n.class() == Some(class) {
                out.push(n);
            }
        });
        out
    }

    /// Counts the leaf shapes (rects, paths and texts) under this node.
    pub fn leaf_count(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |node| {
            if !matches!(node, Self::Group(_)) {
                n += 1;
            }
        });
        n
    }

    /// Returns the geometric bounds of the shapes under this node, in parent coordinates.
    ///
    /// Text has no known extent here and only contributes its anchor point.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Rect(r) => Some(r.rect),
            Self::Path(p) => (!p.path.elements().is_empty()).then(|| p.path.bounding_box()),
            Self::Text(t) => Some(Rect::from_points(t.pos, t.pos)),
            Self::Group(g) => g
                .children
                .iter()
                .filter_map(Self::bounds)
                .reduce(|a, b| a.union(b))
                .map(|r| g.transform.transform_rect_bbox(r)),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    #[test]
    fn group_bounds_apply_the_transform() {
        let node = Node::translated(
            "cell",
            10.0,
            20.0,
            vec![
                Node::rect(Rect::new(0.0, 0.0, 5.0, 5.0), Style::default()),
                Node::Text(TextNode::new(Point::new(8.0, 1.0), "a")),
            ],
        );
        assert_eq!(node.bounds(), Some(Rect::new(10.0, 20.0, 18.0, 25.0)));
        assert_eq!(node.leaf_count(), 2);
    }

    #[test]
    fn find_class_searches_depth_first() {
        let tree = Node::group(
            "root",
            vec![
                Node::group("mark", vec![]),
                Node::group("axis", vec![Node::group("mark", vec![])]),
            ],
        );
        assert_eq!(tree.find_class("mark").len(), 2);
        assert!(tree.find_class("legend").is_empty());
        assert_eq!(Node::group("empty", vec![]).bounds(), None);
    }
}
