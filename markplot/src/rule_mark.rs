// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rule and tick marks: straight line segments.
//!
//! Rules span a continuous extent (or the whole frame); ticks span one band of the other
//! position scale.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{BezPath, Point};
use markplot_core::{Node, ScaleName, Table};
use peniko::Color;

use crate::mark::{ChannelDef, Mark, MarkRenderer, RenderContext, Values, band_center, finish, titled};
use crate::scale::Scales;

const RULE_X: &[ChannelDef] = &[
    ChannelDef::new("x", Some(ScaleName::X)),
    ChannelDef::new("y1", Some(ScaleName::Y)),
    ChannelDef::new("y2", Some(ScaleName::Y)),
    ChannelDef::new("stroke", Some(ScaleName::Color)),
    ChannelDef::new("stroke_width", None),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
    ChannelDef::new("title", None),
];

const RULE_Y: &[ChannelDef] = &[
    ChannelDef::new("y", Some(ScaleName::Y)),
    ChannelDef::new("x1", Some(ScaleName::X)),
    ChannelDef::new("x2", Some(ScaleName::X)),
    ChannelDef::new("stroke", Some(ScaleName::Color)),
    ChannelDef::new("stroke_width", None),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
    ChannelDef::new("title", None),
];

const TICK_X: &[ChannelDef] = &[
    ChannelDef::new("x", Some(ScaleName::X)).required(),
    ChannelDef::new("y", Some(ScaleName::Y)).band(),
    ChannelDef::new("stroke", Some(ScaleName::Color)),
    ChannelDef::new("stroke_width", None),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
    ChannelDef::new("title", None),
];

fn segment(a: Point, b: Point) -> BezPath {
    let mut p = BezPath::new();
    p.move_to(a);
    p.line_to(b);
    p
}

/// Reads an optional position channel; an absent channel falls back to `default`.
fn position_or(values: &Values, name: &str, row: usize, default: f64) -> Option<f64> {
    if values.has(name) {
        values.number(name, row)
    } else {
        Some(default)
    }
}

/// Vertical rules at `x`, from `y1` to `y2` (the frame's height by default).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RuleX;

impl MarkRenderer for RuleX {
    fn name(&self) -> &'static str {
        "rule_x"
    }

    fn channels(&self) -> &'static [ChannelDef] {
        RULE_X
    }

    fn render(
        &self,
        index: &[usize],
        scales: &Scales,
        values: &Values,
        ctx: &RenderContext<'_>,
    ) -> Option<Node> {
        let frame = ctx.frame;
        let dx = band_center(scales, ScaleName::X);
        let children: Vec<Node> = index
            .iter()
            .filter_map(|&row| {
                let x = position_or(values, "x", row, frame.center().x - dx)? + dx;
                let y1 = position_or(values, "y1", row, frame.y1)?;
                let y2 = position_or(values, "y2", row, frame.y0)?;
                let style = values.style(row, None, Some(Color::BLACK), 1.0)?;
                Some(titled(
                    Node::path(segment(Point::new(x, y1), Point::new(x, y2)), style),
                    values.text("title", row),
                ))
            })
            .collect();
        finish("rule_x", children)
    }
}

/// Horizontal rules at `y`, from `x1` to `x2` (the frame's width by default).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RuleY;

impl MarkRenderer for RuleY {
    fn name(&self) -> &'static str {
        "rule_y"
    }

    fn channels(&self) -> &'static [ChannelDef] {
        RULE_Y
    }

    fn render(
        &self,
        index: &[usize],
        scales: &Scales,
        values: &Values,
        ctx: &RenderContext<'_>,
    ) -> Option<Node> {
        let frame = ctx.frame;
        let dy = band_center(scales, ScaleName::Y);
        let children: Vec<Node> = index
            .iter()
            .filter_map(|&row| {
                let y = position_or(values, "y", row, frame.center().y - dy)? + dy;
                let x1 = position_or(values, "x1", row, frame.x0)?;
                let x2 = position_or(values, "x2", row, frame.x1)?;
                let style = values.style(row, None, Some(Color::BLACK), 1.0)?;
                Some(titled(
                    Node::path(segment(Point::new(x1, y), Point::new(x2, y)), style),
                    values.text("title", row),
                ))
            })
            .collect();
        finish("rule_y", children)
    }
}

/// Vertical ticks at `x`, spanning the band of `y` (the frame's height without `y`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickX;

impl MarkRenderer for TickX {
    fn name(&self) -> &'static str {
        "tick_x"
    }

    fn channels(&self) -> &'static [ChannelDef] {
        TICK_X
    }

    fn render(
        &self,
        index: &[usize],
        scales: &Scales,
        values: &Values,
        ctx: &RenderContext<'_>,
    ) -> Option<Node> {
        let frame = ctx.frame;
        let dx = band_center(scales, ScaleName::X);
        let bandwidth = scales.get(ScaleName::Y).map_or(0.0, |s| s.bandwidth());
        let children: Vec<Node> = index
            .iter()
            .filter_map(|&row| {
                let x = values.number("x", row)? + dx;
                let (y0, y1) = if values.has("y") {
                    let y = values.number("y", row)?;
                    (y, y + bandwidth)
                } else {
                    (frame.y0, frame.y1)
                };
                let style = values.style(row, None, Some(Color::BLACK), 1.0)?;
                Some(titled(
                    Node::path(segment(Point::new(x, y0), Point::new(x, y1)), style),
                    values.text("title", row),
                ))
            })
            .collect();
        finish("tick_x", children)
    }
}

/// Vertical rules over `data`.
pub fn rule_x(data: Table) -> Mark {
    Mark::new(RuleX, data)
}

/// Horizontal rules over `data`.
pub fn rule_y(data: Table) -> Mark {
    Mark::new(RuleY, data)
}

/// Vertical ticks over `data`.
pub fn tick_x(data: Table) -> Mark {
    Mark::new(TickX, data)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use kurbo::Rect;
    use markplot_core::{Channel, ScaleBinding, Value};

    use super::*;
    use crate::dimensions::{DimensionOptions, Dimensions, GridShape, Margins};
    use crate::facet::FacetGrid;

    #[test]
    fn rules_default_to_the_frame_extent() {
        let y = Channel::new(
            "y",
            vec![Value::from(20.0), Value::Null],
            ScaleBinding::Unscaled,
        );
        let values = Values::encode(RULE_Y, &[y], &[], &Scales::new());
        let dims = Dimensions::arrange(
            &DimensionOptions::default(),
            Margins::ZERO,
            Margins::ZERO,
            GridShape::default(),
        )
        .expect("fits");
        let cell = FacetGrid::implicit().cell(0);
        let ctx = RenderContext {
            frame: Rect::new(10.0, 0.0, 90.0, 50.0),
            cell: &cell,
            dimensions: &dims,
        };
        let node = RuleY
            .render(&[0, 1], &Scales::new(), &values, &ctx)
            .expect("drawn");
        assert_eq!(node.leaf_count(), 1);
        assert_eq!(node.bounds(), Some(Rect::new(10.0, 20.0, 90.0, 20.0)));
    }
}
