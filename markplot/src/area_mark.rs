// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Area mark: a filled band between two vertical positions.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{BezPath, Point};
use markplot_core::{Node, PathNode, ScaleName, Style, Table};
use peniko::Color;

use crate::line_mark::{Curve, series};
use crate::mark::{ChannelDef, Mark, MarkRenderer, RenderContext, Values, band_center, finish, zero};
use crate::scale::Scales;

const CHANNELS: &[ChannelDef] = &[
    ChannelDef::new("x", Some(ScaleName::X)).required(),
    ChannelDef::new("y", Some(ScaleName::Y)).zero(),
    ChannelDef::new("y1", Some(ScaleName::Y)).zero(),
    ChannelDef::new("y2", Some(ScaleName::Y)).zero(),
    ChannelDef::new("z", None),
    ChannelDef::new("fill", Some(ScaleName::Color)),
    ChannelDef::new("stroke", Some(ScaleName::Color)),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
    ChannelDef::new("title", None),
];

/// Fills between `y1` and `y2` (or `0` and `y`) along `x`, one area per series.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AreaY {
    /// Interpolation along both edges.
    pub curve: Curve,
}

impl AreaY {
    /// Sets the curve.
    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    fn edges(&self, values: &Values, scales: &Scales, row: usize) -> Option<(f64, f64)> {
        let base = || zero(scales, ScaleName::Y);
        match (values.has("y1"), values.has("y2")) {
            (true, true) => Some((values.number("y1", row)?, values.number("y2", row)?)),
            (true, false) => Some((values.number("y1", row)?, base()?)),
            (false, true) => Some((base()?, values.number("y2", row)?)),
            (false, false) => Some((base()?, values.number("y", row)?)),
        }
    }

    fn close(&self, path: &mut BezPath, top: &[Point], bottom: &[Point]) {
        if top.is_empty() {
            return;
        }
        self.curve.trace(path, top);
        // The bottom edge runs backwards, which mirrors the one-sided steps.
        let back = match self.curve {
            Curve::StepAfter => Curve::StepBefore,
            Curve::StepBefore => Curve::StepAfter,
            other => other,
        };
        let mut rev = bottom.iter().rev();
        if let Some(&first) = rev.next() {
            path.line_to(first);
            let mut prev = first;
            for &p in rev {
                back.segment(path, prev, p);
                prev = p;
            }
        }
        path.close_path();
    }
}

impl MarkRenderer for AreaY {
    fn name(&self) -> &'static str {
        "area_y"
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
        let mut children = Vec::new();
        for rows in series(values, index, "fill") {
            let Some(style) = rows.iter().find_map(|&r| {
                let fill = values.paint("fill", r, Some(Color::BLACK))?;
                let stroke = values.paint("stroke", r, None)?;
                Some(Style {
                    fill: fill.map(Into::into),
                    stroke: stroke.map(Into::into),
                    stroke_width: 1.0,
                    opacity: values.number_or("opacity", r, 1.0)?,
                })
            }) else {
                continue;
            };
            let mut path = BezPath::new();
            let mut top: Vec<Point> = Vec::new();
            let mut bottom: Vec<Point> = Vec::new();
            for &row in &rows {
                let edges = values
                    .number("x", row)
                    .zip(self.edges(values, scales, row));
                match edges {
                    Some((x, (y1, y2))) => {
                        top.push(Point::new(x + dx, y2));
                        bottom.push(Point::new(x + dx, y1));
                    }
                    None => {
                        self.close(&mut path, &top, &bottom);
                        top.clear();
                        bottom.clear();
                    }
                }
            }
            self.close(&mut path, &top, &bottom);
            if path.elements().is_empty() {
                continue;
            }
            children.push(Node::Path(PathNode {
                path,
                style,
                title: rows.first().and_then(|&r| values.text("title", r)),
            }));
        }
        finish("area_y", children)
    }
}

/// A vertical area mark over `data`.
pub fn area_y(data: Table) -> Mark {
    Mark::new(AreaY::default(), data)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use kurbo::{Rect, Shape};
    use markplot_core::{Channel, ScaleBinding, ScaleType, Value};

    use super::*;
    use crate::dimensions::{DimensionOptions, Dimensions, GridShape, Margins};
    use crate::facet::FacetGrid;
    use crate::scale::{Continuous, Mapping, Scale, ScaleKind};

    #[test]
    fn area_fills_down_to_zero() {
        let mut scales = Scales::new();
        scales.insert(Scale::new(
            ScaleName::Y,
            ScaleType::Linear,
            ScaleKind::Continuous(Continuous::new(
                Mapping::Linear,
                vec![0.0, 10.0],
                vec![100.0, 0.0],
            )),
        ));
        let x = Channel::new(
            "x",
            vec![Value::from(0.0), Value::from(50.0)],
            ScaleBinding::Unscaled,
        );
        let y = Channel::new(
            "y",
            vec![Value::from(10.0), Value::from(10.0)],
            ScaleBinding::Scale(ScaleName::Y),
        );
        let values = Values::encode(CHANNELS, &[x, y], &[], &scales);
        let dims = Dimensions::arrange(
            &DimensionOptions::default(),
            Margins::ZERO,
            Margins::ZERO,
            GridShape::default(),
        )
        .expect("fits");
        let cell = FacetGrid::implicit().cell(0);
        let ctx = RenderContext {
            frame: Rect::new(0.0, 0.0, 50.0, 100.0),
            cell: &cell,
            dimensions: &dims,
        };
        let node = AreaY::default()
            .render(&[0, 1], &scales, &values, &ctx)
            .expect("drawn");
        let Node::Path(p) = &node.children()[0] else {
            panic!("areas are paths");
        };
        assert!((p.path.area().abs() - 5000.0).abs() < 1e-9);
    }
}
