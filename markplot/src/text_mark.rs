// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text mark: a label per row.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Point;
use markplot_core::{Node, ScaleName, Table, TextAnchor, TextBaseline, TextNode};
use peniko::Color;

use crate::mark::{ChannelDef, Mark, MarkRenderer, RenderContext, Values, band_center, finish};
use crate::scale::Scales;

const CHANNELS: &[ChannelDef] = &[
    ChannelDef::new("x", Some(ScaleName::X)),
    ChannelDef::new("y", Some(ScaleName::Y)),
    ChannelDef::new("text", None).required(),
    ChannelDef::new("fill", Some(ScaleName::Color)),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
    ChannelDef::new("font_size", None),
    ChannelDef::new("rotate", None),
];

/// Draws `text` at `(x, y)`, centered by default.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Text {
    /// Horizontal anchoring.
    pub anchor: TextAnchor,
    /// Vertical alignment.
    pub baseline: TextBaseline,
    /// Horizontal offset in pixels.
    pub dx: f64,
    /// Vertical offset in pixels.
    pub dy: f64,
    /// Font size used when there is no `font_size` channel.
    pub font_size: f64,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            anchor: TextAnchor::Middle,
            baseline: TextBaseline::Middle,
            dx: 0.0,
            dy: 0.0,
            font_size: 10.0,
        }
    }
}

impl Text {
    /// Sets the anchoring.
    pub fn with_anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Sets the pixel offset.
    pub fn with_offset(mut self, dx: f64, dy: f64) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }

    /// Sets the default font size.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }
}

impl MarkRenderer for Text {
    fn name(&self) -> &'static str {
        "text"
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
        let dx = band_center(scales, ScaleName::X) + self.dx;
        let dy = band_center(scales, ScaleName::Y) + self.dy;
        let constant = values.constant("text").map(|v| v.to_text());
        let children: Vec<Node> = index
            .iter()
            .filter_map(|&row| {
                let x = if values.has("x") {
                    values.number("x", row)? + dx
                } else {
                    center.x + self.dx
                };
                let y = if values.has("y") {
                    values.number("y", row)? + dy
                } else {
                    center.y + self.dy
                };
                let text = match values.has("text") {
                    true => values.text("text", row)?,
                    false => constant.clone()?,
                };
                let fill = values.paint("fill", row, Some(Color::BLACK))??;
                let node = TextNode {
                    opacity: values.number_or("opacity", row, 1.0)?,
                    ..TextNode::new(Point::new(x, y), text)
                        .with_anchor(self.anchor)
                        .with_baseline(self.baseline)
                        .with_font_size(values.number_or("font_size", row, self.font_size)?)
                        .with_angle(values.number_or("rotate", row, 0.0)?)
                        .with_fill(fill)
                };
                Some(Node::Text(node))
            })
            .collect();
        finish("text", children)
    }
}

/// A text mark over `data`.
pub fn text(data: Table) -> Mark {
    Mark::new(Text::default(), data)
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
    fn labels_use_the_text_channel() {
        let text = Channel::new(
            "text",
            vec![Value::from("a"), Value::Null, Value::from(2.5)],
            ScaleBinding::Unscaled,
        );
        let values = Values::encode(CHANNELS, &[text], &[], &Scales::new());
        let dims = Dimensions::arrange(
            &DimensionOptions::default(),
            Margins::ZERO,
            Margins::ZERO,
            GridShape::default(),
        )
        .expect("fits");
        let cell = FacetGrid::implicit().cell(0);
        let ctx = RenderContext {
            frame: Rect::new(0.0, 0.0, 40.0, 20.0),
            cell: &cell,
            dimensions: &dims,
        };
        let node = Text::default()
            .render(&[0, 1, 2], &Scales::new(), &values, &ctx)
            .expect("drawn");
        let texts: Vec<&str> = node
            .children()
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(&*t.text),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["a", "2.5"]);
        let Node::Text(first) = &node.children()[0] else {
            panic!("text nodes");
        };
        assert_eq!(first.pos, Point::new(20.0, 10.0));
    }
}
