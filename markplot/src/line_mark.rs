// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line mark: one polyline per series.

extern crate alloc;

use alloc::vec::Vec;
use core::str::FromStr;

use hashbrown::HashMap;
use kurbo::{BezPath, Point};
use markplot_core::{ConfigurationError, Node, PathNode, ScaleName, Style, Table};
use peniko::Color;

use crate::mark::{ChannelDef, Mark, MarkRenderer, RenderContext, Values, band_center, finish};
use crate::scale::{Encoded, Scales};

const CHANNELS: &[ChannelDef] = &[
    ChannelDef::new("x", Some(ScaleName::X)).required(),
    ChannelDef::new("y", Some(ScaleName::Y)).required(),
    ChannelDef::new("z", None),
    ChannelDef::new("stroke", Some(ScaleName::Color)),
    ChannelDef::new("stroke_width", None),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
    ChannelDef::new("title", None),
];

/// How consecutive points are joined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Curve {
    /// Straight segments.
    #[default]
    Linear,
    /// Horizontal-vertical-horizontal steps changing at the midpoint.
    Step,
    /// Vertical then horizontal.
    StepBefore,
    /// Horizontal then vertical.
    StepAfter,
}

impl Curve {
    /// Returns the curve name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Step => "step",
            Self::StepBefore => "step-before",
            Self::StepAfter => "step-after",
        }
    }

    /// Appends the segment from `a` to `b` (the pen is at `a`).
    pub(crate) fn segment(self, path: &mut BezPath, a: Point, b: Point) {
        match self {
            Self::Linear => {}
            Self::Step => {
                let mid = (a.x + b.x) / 2.0;
                path.line_to((mid, a.y));
                path.line_to((mid, b.y));
            }
            Self::StepBefore => path.line_to((a.x, b.y)),
            Self::StepAfter => path.line_to((b.x, a.y)),
        }
        path.line_to(b);
    }

    /// Appends `points` to `path` starting with a `move_to`.
    pub(crate) fn trace(self, path: &mut BezPath, points: &[Point]) {
        let Some((&first, rest)) = points.split_first() else {
            return;
        };
        path.move_to(first);
        let mut prev = first;
        for &p in rest {
            self.segment(path, prev, p);
            prev = p;
        }
    }
}

impl FromStr for Curve {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "step" => Ok(Self::Step),
            "step-before" => Ok(Self::StepBefore),
            "step-after" => Ok(Self::StepAfter),
            other => Err(ConfigurationError::UnknownCurve(other.into())),
        }
    }
}

/// A series key: the `z` text, or the encoded color of a per-row paint channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum SeriesKey {
    Z(alloc::sync::Arc<str>),
    Color([u8; 4]),
    Single,
}

/// Splits `index` into series in first-seen order, keyed by `z`, falling back to `paint`.
pub(crate) fn series(values: &Values, index: &[usize], paint: &str) -> Vec<Vec<usize>> {
    let key = |row: usize| {
        if values.has("z") {
            values
                .text("z", row)
                .map_or(SeriesKey::Single, SeriesKey::Z)
        } else if values.has(paint) {
            match values.encoded(paint, row) {
                Some(Encoded::Color(c)) => {
                    let rgba = c.to_rgba8();
                    SeriesKey::Color([rgba.r, rgba.g, rgba.b, rgba.a])
                }
                _ => SeriesKey::Single,
            }
        } else {
            SeriesKey::Single
        }
    };
    let mut slots: HashMap<SeriesKey, usize> = HashMap::new();
    let mut out: Vec<Vec<usize>> = Vec::new();
    for &row in index {
        let slot = *slots.entry(key(row)).or_insert_with(|| {
            out.push(Vec::new());
            out.len() - 1
        });
        out[slot].push(row);
    }
    out
}

/// Draws a line through `(x, y)` for each series, breaking at undefined points.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Line {
    /// Interpolation between points.
    pub curve: Curve,
}

impl Line {
    /// Sets the curve.
    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }
}

impl MarkRenderer for Line {
    fn name(&self) -> &'static str {
        "line"
    }

    fn channels(&self) -> &'static [ChannelDef] {
        CHANNELS
    }

    fn render(
        &self,
        index: &[usize],
        scales: &Scales,
        values: &Values,
        _ctx: &RenderContext<'_>,
    ) -> Option<Node> {
        let dx = band_center(scales, ScaleName::X);
        let dy = band_center(scales, ScaleName::Y);
        let mut children = Vec::new();
        for rows in series(values, index, "stroke") {
            let Some(style) = rows.iter().find_map(|&r| {
                let stroke = values.paint("stroke", r, Some(Color::BLACK))?;
                Some(Style {
                    fill: None,
                    stroke: stroke.map(Into::into),
                    stroke_width: values.number_or("stroke_width", r, 1.5)?,
                    opacity: values.number_or("opacity", r, 1.0)?,
                })
            }) else {
                continue;
            };
            let mut path = BezPath::new();
            let mut run: Vec<Point> = Vec::new();
            for &row in &rows {
                match (values.number("x", row), values.number("y", row)) {
                    (Some(x), Some(y)) => run.push(Point::new(x + dx, y + dy)),
                    _ => {
                        self.curve.trace(&mut path, &run);
                        run.clear();
                    }
                }
            }
            self.curve.trace(&mut path, &run);
            if path.elements().is_empty() {
                continue;
            }
            children.push(Node::Path(PathNode {
                path,
                style,
                title: rows.first().and_then(|&r| values.text("title", r)),
            }));
        }
        finish("line", children)
    }
}

/// A line mark over `data`.
pub fn line(data: Table) -> Mark {
    Mark::new(Line::default(), data)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use kurbo::{PathEl, Rect};
    use markplot_core::{Channel, ScaleBinding, Value};

    use super::*;
    use crate::dimensions::{DimensionOptions, Dimensions, GridShape, Margins};
    use crate::facet::FacetGrid;

    fn raw(name: &'static str, xs: &[Option<f64>]) -> Channel {
        Channel::new(
            name,
            xs.iter()
                .map(|x| x.map_or(Value::Null, Value::from))
                .collect::<Vec<_>>(),
            ScaleBinding::Unscaled,
        )
    }

    #[test]
    fn curves_parse_and_step() {
        assert_eq!("step-after".parse::<Curve>(), Ok(Curve::StepAfter));
        assert!(matches!(
            "basis".parse::<Curve>(),
            Err(ConfigurationError::UnknownCurve(_))
        ));
        let mut path = BezPath::new();
        Curve::StepAfter.trace(&mut path, &[Point::new(0.0, 0.0), Point::new(10.0, 5.0)]);
        assert_eq!(
            path.elements(),
            &[
                PathEl::MoveTo(Point::new(0.0, 0.0)),
                PathEl::LineTo(Point::new(10.0, 0.0)),
                PathEl::LineTo(Point::new(10.0, 5.0)),
            ]
        );
    }

    #[test]
    fn undefined_points_break_the_line() {
        let x = raw("x", &[Some(0.0), Some(1.0), Some(2.0), Some(3.0)]);
        let y = raw("y", &[Some(0.0), None, Some(2.0), Some(3.0)]);
        let values = Values::encode(CHANNELS, &[x, y], &[], &Scales::new());
        let dims = Dimensions::arrange(
            &DimensionOptions::default(),
            Margins::ZERO,
            Margins::ZERO,
            GridShape::default(),
        )
        .expect("fits");
        let cell = FacetGrid::implicit().cell(0);
        let ctx = RenderContext {
            frame: Rect::new(0.0, 0.0, 10.0, 10.0),
            cell: &cell,
            dimensions: &dims,
        };
        let node = Line::default()
            .render(&[0, 1, 2, 3], &Scales::new(), &values, &ctx)
            .expect("drawn");
        let Node::Path(p) = &node.children()[0] else {
            panic!("lines are paths");
        };
        let moves = p
            .path
            .elements()
            .iter()
            .filter(|e| matches!(e, PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
    }

    #[test]
    fn z_splits_series() {
        let values = Values::encode(
            CHANNELS,
            &[Channel::new(
                "z",
                vec![Value::from("a"), Value::from("b"), Value::from("a")],
                ScaleBinding::Unscaled,
            )],
            &[],
            &Scales::new(),
        );
        assert_eq!(series(&values, &[0, 1, 2], "stroke"), vec![vec![0, 2], vec![1]]);
    }
}
