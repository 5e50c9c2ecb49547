// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bar and cell marks: one rectangle per row.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Rect;
use markplot_core::{Node, ScaleName, Table};
use peniko::Color;

use crate::mark::{ChannelDef, Mark, MarkRenderer, RenderContext, Values, finish, titled, zero};
use crate::scale::Scales;

const BAR_Y: &[ChannelDef] = &[
    ChannelDef::new("x", Some(ScaleName::X)).band(),
    ChannelDef::new("y", Some(ScaleName::Y)).zero(),
    ChannelDef::new("y1", Some(ScaleName::Y)).zero(),
    ChannelDef::new("y2", Some(ScaleName::Y)).zero(),
    ChannelDef::new("fill", Some(ScaleName::Color)),
    ChannelDef::new("stroke", Some(ScaleName::Color)),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
    ChannelDef::new("title", None),
];

const BAR_X: &[ChannelDef] = &[
    ChannelDef::new("y", Some(ScaleName::Y)).band(),
    ChannelDef::new("x", Some(ScaleName::X)).zero(),
    ChannelDef::new("x1", Some(ScaleName::X)).zero(),
    ChannelDef::new("x2", Some(ScaleName::X)).zero(),
    ChannelDef::new("fill", Some(ScaleName::Color)),
    ChannelDef::new("stroke", Some(ScaleName::Color)),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
    ChannelDef::new("title", None),
];

const CELL: &[ChannelDef] = &[
    ChannelDef::new("x", Some(ScaleName::X)).band(),
    ChannelDef::new("y", Some(ScaleName::Y)).band(),
    ChannelDef::new("fill", Some(ScaleName::Color)),
    ChannelDef::new("stroke", Some(ScaleName::Color)),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
    ChannelDef::new("title", None),
];

/// The span of a row along a band axis: `[start, start + bandwidth]`, or the whole frame
/// extent when the channel is absent.
fn band_span(
    values: &Values,
    scales: &Scales,
    channel: &str,
    scale: ScaleName,
    row: usize,
    frame: (f64, f64),
    inset: f64,
) -> Option<(f64, f64)> {
    let (a, b) = if values.has(channel) {
        let start = values.number(channel, row)?;
        let width = scales.get(scale).map_or(1.0, |s| s.bandwidth().max(1.0));
        (start, start + width)
    } else {
        frame
    };
    Some((a + inset, b - inset))
}

/// The span of a row along the value axis: `[v1, v2]`, or `[0, v]` from a single channel.
fn value_span(
    values: &Values,
    scales: &Scales,
    names: [&str; 3],
    scale: ScaleName,
    row: usize,
) -> Option<(f64, f64)> {
    let [v, v1, v2] = names;
    match (values.has(v1), values.has(v2)) {
        (true, true) => Some((values.number(v1, row)?, values.number(v2, row)?)),
        (true, false) => Some((values.number(v1, row)?, zero(scales, scale)?)),
        (false, true) => Some((zero(scales, scale)?, values.number(v2, row)?)),
        (false, false) => Some((zero(scales, scale)?, values.number(v, row)?)),
    }
}

/// Vertical bars: a band `x` and a `y1..y2` extent (or `0..y`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BarY {
    /// Pixels removed from each side of the band.
    pub inset: f64,
}

impl BarY {
    /// Sets the band inset.
    pub fn with_inset(mut self, inset: f64) -> Self {
        self.inset = inset;
        self
    }
}

impl MarkRenderer for BarY {
    fn name(&self) -> &'static str {
        "bar_y"
    }

    fn channels(&self) -> &'static [ChannelDef] {
        BAR_Y
    }

    fn render(
        &self,
        index: &[usize],
        scales: &Scales,
        values: &Values,
        ctx: &RenderContext<'_>,
    ) -> Option<Node> {
        let frame = ctx.frame;
        let children: Vec<Node> = index
            .iter()
            .filter_map(|&row| {
                let (x0, x1) = band_span(
                    values,
                    scales,
                    "x",
                    ScaleName::X,
                    row,
                    (frame.x0, frame.x1),
                    self.inset,
                )?;
                let (y1, y2) = value_span(values, scales, ["y", "y1", "y2"], ScaleName::Y, row)?;
                let style = values.style(row, Some(Color::BLACK), None, 1.0)?;
                let rect = Rect::new(x0, y1, x1, y2).abs();
                Some(titled(Node::rect(rect, style), values.text("title", row)))
            })
            .collect();
        finish("bar_y", children)
    }
}

/// Horizontal bars: a band `y` and an `x1..x2` extent (or `0..x`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BarX {
    /// Pixels removed from each side of the band.
    pub inset: f64,
}

impl BarX {
    /// Sets the band inset.
    pub fn with_inset(mut self, inset: f64) -> Self {
        self.inset = inset;
        self
    }
}

impl MarkRenderer for BarX {
    fn name(&self) -> &'static str {
        "bar_x"
    }

    fn channels(&self) -> &'static [ChannelDef] {
        BAR_X
    }

    fn render(
        &self,
        index: &[usize],
        scales: &Scales,
        values: &Values,
        ctx: &RenderContext<'_>,
    ) -> Option<Node> {
        let frame = ctx.frame;
        let children: Vec<Node> = index
            .iter()
            .filter_map(|&row| {
                let (y0, y1) = band_span(
                    values,
                    scales,
                    "y",
                    ScaleName::Y,
                    row,
                    (frame.y0, frame.y1),
                    self.inset,
                )?;
                let (x1, x2) = value_span(values, scales, ["x", "x1", "x2"], ScaleName::X, row)?;
                let style = values.style(row, Some(Color::BLACK), None, 1.0)?;
                let rect = Rect::new(x1, y0, x2, y1).abs();
                Some(titled(Node::rect(rect, style), values.text("title", row)))
            })
            .collect();
        finish("bar_x", children)
    }
}

/// Cells: a rectangle per `(x, y)` band pair, typically colored by `fill`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cell {
    /// Pixels removed from each side of both bands.
    pub inset: f64,
}

impl MarkRenderer for Cell {
    fn name(&self) -> &'static str {
        "cell"
    }

    fn channels(&self) -> &'static [ChannelDef] {
        CELL
    }

    fn render(
        &self,
        index: &[usize],
        scales: &Scales,
        values: &Values,
        ctx: &RenderContext<'_>,
    ) -> Option<Node> {
        let frame = ctx.frame;
        let children: Vec<Node> = index
            .iter()
            .filter_map(|&row| {
                let (x0, x1) = band_span(
                    values,
                    scales,
                    "x",
                    ScaleName::X,
                    row,
                    (frame.x0, frame.x1),
                    self.inset,
                )?;
                let (y0, y1) = band_span(
                    values,
                    scales,
                    "y",
                    ScaleName::Y,
                    row,
                    (frame.y0, frame.y1),
                    self.inset,
                )?;
                let style = values.style(row, Some(Color::BLACK), None, 1.0)?;
                Some(titled(
                    Node::rect(Rect::new(x0, y0, x1, y1).abs(), style),
                    values.text("title", row),
                ))
            })
            .collect();
        finish("cell", children)
    }
}

/// Vertical bars over `data`.
pub fn bar_y(data: Table) -> Mark {
    Mark::new(BarY::default(), data)
}

/// Horizontal bars over `data`.
pub fn bar_x(data: Table) -> Mark {
    Mark::new(BarX::default(), data)
}

/// Cells over `data`.
pub fn cell(data: Table) -> Mark {
    Mark::new(Cell::default(), data)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use markplot_core::{Channel, ScaleBinding, ScaleType, Value};

    use super::*;
    use crate::dimensions::{DimensionOptions, Dimensions, GridShape, Margins};
    use crate::facet::FacetGrid;
    use crate::scale::{Band, Continuous, Mapping, Scale, ScaleKind};

    #[test]
    fn bars_span_from_zero_to_value() {
        let mut scales = Scales::new();
        scales.insert(Scale::new(
            ScaleName::X,
            ScaleType::Band,
            ScaleKind::Band(
                Band::new(vec![Value::from("a"), Value::from("b")], (0.0, 100.0))
                    .with_padding(0.0, 0.0),
            ),
        ));
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
            vec![Value::from("a"), Value::from("b"), Value::from("zz")],
            ScaleBinding::Scale(ScaleName::X),
        );
        let y = Channel::new(
            "y",
            vec![Value::from(5.0), Value::from(10.0), Value::from(1.0)],
            ScaleBinding::Scale(ScaleName::Y),
        );
        let values = Values::encode(BAR_Y, &[x, y], &[], &scales);
        let dims = Dimensions::arrange(
            &DimensionOptions::default(),
            Margins::ZERO,
            Margins::ZERO,
            GridShape::default(),
        )
        .expect("fits");
        let cell = FacetGrid::implicit().cell(0);
        let ctx = RenderContext {
            frame: Rect::new(0.0, 0.0, 100.0, 100.0),
            cell: &cell,
            dimensions: &dims,
        };
        let node = BarY::default()
            .render(&[0, 1, 2], &scales, &values, &ctx)
            .expect("drawn");
        // The third row is outside the band domain and is skipped.
        assert_eq!(node.leaf_count(), 2);
        let Node::Rect(first) = &node.children()[0] else {
            panic!("bars are rects");
        };
        assert_eq!(first.rect, Rect::new(0.0, 50.0, 50.0, 100.0));
    }
}
