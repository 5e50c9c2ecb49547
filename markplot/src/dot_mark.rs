// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dot mark: one symbol per row.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Point;
use markplot_core::{Node, PathNode, ScaleName, Table, Value};
use peniko::Color;

use crate::mark::{ChannelDef, Mark, MarkRenderer, RenderContext, Values, band_center, finish};
use crate::scale::Scales;
use crate::symbol::Symbol;

const CHANNELS: &[ChannelDef] = &[
    ChannelDef::new("x", Some(ScaleName::X)),
    ChannelDef::new("y", Some(ScaleName::Y)),
    ChannelDef::new("r", Some(ScaleName::R)),
    ChannelDef::new("fill", Some(ScaleName::Color)),
    ChannelDef::new("stroke", Some(ScaleName::Color)),
    ChannelDef::new("symbol", Some(ScaleName::Symbol)),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
    ChannelDef::new("stroke_width", None),
    ChannelDef::new("title", None),
];

/// Draws a symbol at `(x, y)` for each row.
///
/// A missing `x` or `y` channel centers the dots in the frame. Without a fill, dots are
/// stroked; with a fill they are filled and unstroked. Larger dots are drawn first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dot {
    /// Radius used when there is no `r` channel.
    pub r: f64,
    /// Symbol used when there is no `symbol` channel.
    pub symbol: Symbol,
}

impl Default for Dot {
    fn default() -> Self {
        Self {
            r: 3.0,
            symbol: Symbol::Circle,
        }
    }
}

impl Dot {
    /// Sets the default radius.
    pub fn with_r(mut self, r: f64) -> Self {
        self.r = r;
        self
    }

    /// Sets the default symbol.
    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = symbol;
        self
    }
}

impl MarkRenderer for Dot {
    fn name(&self) -> &'static str {
        "dot"
    }

    fn channels(&self) -> &'static [ChannelDef] {
        CHANNELS
    }

    fn render(
        &self,
        index: &[usize],
        scales: &Scales,
        values: &Values,
        ctx: &RenderContext<'_>,
    ) -> Option<Node> {
        let center = ctx.frame.center();
        let dx = band_center(scales, ScaleName::X);
        let dy = band_center(scales, ScaleName::Y);
        let filled = values.is_set("fill");
        let (fill, stroke) = if filled {
            (Some(Color::BLACK), None)
        } else {
            (None, Some(Color::BLACK))
        };
        let constant_symbol = values
            .constant("symbol")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Symbol>().ok())
            .unwrap_or(self.symbol);

        let mut rows: Vec<usize> = index.to_vec();
        if values.has("r") {
            rows.sort_by(|&a, &b| {
                let ra = values.number("r", a).unwrap_or(0.0);
                let rb = values.number("r", b).unwrap_or(0.0);
                rb.total_cmp(&ra)
            });
        }
        let mut children = Vec::with_capacity(rows.len());
        for row in rows {
            let x = if values.has("x") {
                let Some(x) = values.number("x", row) else { continue };
                x + dx
            } else {
                center.x
            };
            let y = if values.has("y") {
                let Some(y) = values.number("y", row) else { continue };
                y + dy
            } else {
                center.y
            };
            let Some(r) = values.number_or("r", row, self.r) else { continue };
            if !(r > 0.0) {
                continue;
            }
            let symbol = if values.has("symbol") {
                let Some(s) = values.symbol("symbol", row) else { continue };
                s
            } else {
                constant_symbol
            };
            let Some(mut style) = values.style(row, fill, stroke, 1.5) else { continue };
            if symbol.is_stroke_only() && style.stroke.is_none() {
                style.stroke = style.fill.take();
            }
            children.push(Node::Path(PathNode {
                path: symbol.path(Point::new(x, y), r),
                style,
                title: values.text("title", row),
            }));
        }
        finish("dot", children)
    }
}

/// A dot mark over `data`.
pub fn dot(data: Table) -> Mark {
    Mark::new(Dot::default(), data)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use kurbo::Rect;
    use markplot_core::{Channel, ScaleBinding, ScaleType};

    use super::*;
    use crate::dimensions::{DimensionOptions, Dimensions, GridShape, Margins};
    use crate::facet::FacetGrid;
    use crate::scale::{Continuous, Mapping, Scale, ScaleKind};

    #[test]
    fn undefined_positions_skip_rows() {
        let mut scales = Scales::new();
        scales.insert(Scale::new(
            ScaleName::X,
            ScaleType::Linear,
            ScaleKind::Continuous(Continuous::new(
                Mapping::Linear,
                vec![0.0, 1.0],
                vec![0.0, 100.0],
            )),
        ));
        let x = Channel::new(
            "x",
            vec![Value::from(0.5), Value::Null, Value::from(1.0)],
            ScaleBinding::Scale(ScaleName::X),
        );
        let values = Values::encode(CHANNELS, &[x], &[("fill", Value::from("red"))], &scales);
        let dims = Dimensions::arrange(
            &DimensionOptions::default(),
            Margins::ZERO,
            Margins::ZERO,
            GridShape::default(),
        )
        .expect("fits");
        let cell = FacetGrid::implicit().cell(0);
        let ctx = RenderContext {
            frame: Rect::new(0.0, 0.0, 100.0, 50.0),
            cell: &cell,
            dimensions: &dims,
        };
        let node = Dot::default()
            .render(&[0, 1, 2], &scales, &values, &ctx)
            .expect("drawn");
        assert_eq!(node.leaf_count(), 2);
        let bounds = node.bounds().expect("has bounds");
        assert!((bounds.y0 - 22.0).abs() < 1e-6, "centered vertically");
        assert!(Dot::default().render(&[], &scales, &values, &ctx).is_none());
    }
}
