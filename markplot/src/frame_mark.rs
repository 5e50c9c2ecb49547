// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame mark: the outline of each facet cell.

extern crate alloc;

use markplot_core::{Node, ScaleName, Table};
use peniko::Color;

use crate::facet::FacetMode;
use crate::mark::{ChannelDef, Mark, MarkRenderer, RenderContext, Values};
use crate::scale::Scales;

const CHANNELS: &[ChannelDef] = &[
    ChannelDef::new("fill", Some(ScaleName::Color)),
    ChannelDef::new("stroke", Some(ScaleName::Color)),
    ChannelDef::new("stroke_width", None),
    ChannelDef::new("opacity", Some(ScaleName::Opacity)),
];

/// Outlines the frame once per cell in which it has at least one row.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    /// Pixels the outline is inset from the frame.
    pub inset: f64,
}

impl MarkRenderer for Frame {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn channels(&self) -> &'static [ChannelDef] {
        CHANNELS
    }

    fn render(
        &self,
        index: &[usize],
        _scales: &Scales,
        values: &Values,
        ctx: &RenderContext<'_>,
    ) -> Option<Node> {
        let &row = index.first()?;
        let style = values.style(row, None, Some(Color::BLACK), 1.0)?;
        let rect = ctx.frame.inset(-self.inset);
        Some(Node::group("frame", alloc::vec![Node::rect(rect, style)]))
    }
}

/// A frame around every facet cell.
pub fn frame() -> Mark {
    Mark::new(Frame::default(), Table::empty(1)).with_facet(FacetMode::None)
}
