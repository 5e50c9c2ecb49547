// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Legend generation.
//!
//! Discrete color and symbol scales get swatches with labels; continuous color scales get a
//! sampled ramp with tick labels. Other scales have no legend.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use markplot_core::{Node, ScaleName, Style, TextAnchor, TextBaseline, TextNode};
use peniko::color::palette::css;
use peniko::{Brush, Color};

use crate::axis::{Axis, AxisOrient};
use crate::format::{FormatCache, Locale};
use crate::scale::{Encoded, Scale, ScaleKind};
use crate::symbol::Symbol;

/// What a legend row shows next to its label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Swatch {
    /// A filled square.
    Color(Color),
    /// A symbol drawn in the given color.
    Symbol(Symbol, Color),
}

/// A legend row.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendItem {
    /// The label shown next to the swatch.
    pub label: String,
    /// The swatch.
    pub swatch: Swatch,
}

/// Legend layout and styling.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendOptions {
    /// Swatch square size.
    pub swatch_size: f64,
    /// Vertical gap between rows.
    pub row_gap: f64,
    /// Horizontal gap between swatch and label.
    pub label_dx: f64,
    /// Number of columns.
    ///
    /// Items are laid out top-to-bottom, then left-to-right into columns.
    pub columns: usize,
    /// Width reserved per column for labels.
    pub column_width: f64,
    /// Label font size.
    pub font_size: f64,
    /// Label color.
    pub text_fill: Brush,
    /// Width of a continuous ramp.
    pub ramp_width: f64,
    /// Height of a continuous ramp.
    pub ramp_height: f64,
    /// Approximate tick count of a continuous ramp.
    pub ticks: usize,
    /// Title; the scale label when `None`.
    pub label: Option<String>,
}

impl Default for LegendOptions {
    fn default() -> Self {
        Self {
            swatch_size: 10.0,
            row_gap: 6.0,
            label_dx: 6.0,
            columns: 1,
            column_width: 80.0,
            font_size: 10.0,
            text_fill: css::BLACK.into(),
            ramp_width: 240.0,
            ramp_height: 10.0,
            ticks: 5,
            label: None,
        }
    }
}

impl LegendOptions {
    /// Sets the number of columns.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    /// Sets the label font size.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Sets the ramp size.
    pub fn with_ramp_size(mut self, width: f64, height: f64) -> Self {
        self.ramp_width = width;
        self.ramp_height = height;
        self
    }

    /// Sets the title.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

const RAMP_SAMPLES: usize = 64;

/// Returns the swatch rows of a discrete color or symbol scale.
pub fn legend_items(scale: &Scale) -> Vec<LegendItem> {
    let ScaleKind::Ordinal(o) = scale.kind() else {
        return Vec::new();
    };
    o.domain()
        .iter()
        .zip(o.range().iter().cycle())
        .filter_map(|(v, e)| {
            let swatch = match (scale.name(), e) {
                (ScaleName::Color, Encoded::Color(c)) => Swatch::Color(*c),
                (ScaleName::Symbol, Encoded::Symbol(s)) => Swatch::Symbol(*s, Color::BLACK),
                _ => return None,
            };
            Some(LegendItem {
                label: v.to_text().to_string(),
                swatch,
            })
        })
        .collect()
}

/// Builds the legend of `scale` with its top-left corner at the origin.
///
/// Returns `None` for scales without a legend.
pub fn legend(
    scale: &Scale,
    options: &LegendOptions,
    locale: &Locale,
    cache: &FormatCache,
) -> Option<Node> {
    let title = options
        .label
        .as_deref()
        .or(scale.label())
        .map(|t| title_node(t, options));
    let top = if title.is_some() {
        options.font_size + options.row_gap
    } else {
        0.0
    };
    let body = match scale.kind() {
        ScaleKind::Ordinal(_) => {
            let items = legend_items(scale);
            if items.is_empty() {
                return None;
            }
            swatches(&items, options, top)
        }
        ScaleKind::Ramp(_) => ramp(scale, options, locale, cache, top)?,
        _ => return None,
    };
    let mut children = Vec::with_capacity(2);
    children.extend(title);
    children.push(body);
    Some(Node::group(alloc::format!("legend-{}", scale.name()), children))
}

fn title_node(text: &str, options: &LegendOptions) -> Node {
    Node::Text(
        TextNode::new(Point::new(0.0, 0.0), text)
            .with_baseline(TextBaseline::Hanging)
            .with_font_size(options.font_size)
            .with_fill(options.text_fill.clone()),
    )
}

fn swatches(items: &[LegendItem], options: &LegendOptions, top: f64) -> Node {
    let columns = options.columns.max(1);
    let rows_per_col = items.len().div_ceil(columns);
    let row_height = options.swatch_size.max(options.font_size);
    let size = options.swatch_size;

    let mut out = Vec::with_capacity(items.len() * 2);
    for (i, item) in items.iter().enumerate() {
        let col = i / rows_per_col;
        let row = i % rows_per_col;
        let x = col as f64 * (size + options.label_dx + options.column_width);
        let y = top + row as f64 * (row_height + options.row_gap);
        let swatch_y = y + (row_height - size) * 0.5;

        out.push(match item.swatch {
            Swatch::Color(c) => Node::rect(
                Rect::new(x, swatch_y, x + size, swatch_y + size),
                Style::filled(c),
            ),
            Swatch::Symbol(s, c) => {
                let center = Point::new(x + size * 0.5, swatch_y + size * 0.5);
                let style = if s.is_stroke_only() {
                    Style::stroked(c, 1.5)
                } else {
                    Style::filled(c)
                };
                Node::path(s.path(center, size * 0.45), style)
            }
        });
        out.push(Node::Text(
            TextNode::new(Point::new(x + size + options.label_dx, y + row_height * 0.5), item.label.as_str())
                .with_anchor(TextAnchor::Start)
                .with_baseline(TextBaseline::Middle)
                .with_font_size(options.font_size)
                .with_fill(options.text_fill.clone()),
        ));
    }
    Node::group("swatches", out)
}

fn ramp(
    scale: &Scale,
    options: &LegendOptions,
    locale: &Locale,
    cache: &FormatCache,
    top: f64,
) -> Option<Node> {
    let ScaleKind::Ramp(r) = scale.kind() else {
        return None;
    };
    let (w, h) = (options.ramp_width, options.ramp_height);
    let strip = w / RAMP_SAMPLES as f64;
    let mut strips = Vec::with_capacity(RAMP_SAMPLES);
    for i in 0..RAMP_SAMPLES {
        let t = (i as f64 + 0.5) / RAMP_SAMPLES as f64;
        let x0 = i as f64 * strip;
        strips.push(Node::rect(
            Rect::new(x0, top, x0 + strip, top + h),
            Style::filled(r.ramp().at(t)),
        ));
    }

    let axis = Axis::new(scale.name(), AxisOrient::Bottom).with_tick_count(options.ticks);
    let mut labels = Vec::new();
    for (v, label) in axis.tick_labels(scale, locale, cache) {
        let Some(t) = v.as_f64().map(|x| r.position().map(x)) else {
            continue;
        };
        if !(0.0..=1.0).contains(&t) {
            continue;
        }
        labels.push(Node::Text(
            TextNode::new(Point::new(t * w, top + h + 3.0), label)
                .with_anchor(TextAnchor::Middle)
                .with_baseline(TextBaseline::Hanging)
                .with_font_size(options.font_size)
                .with_fill(options.text_fill.clone()),
        ));
    }
    Some(Node::group(
        "ramp",
        alloc::vec![Node::group("strips", strips), Node::group("labels", labels)],
    ))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use markplot_core::{ScaleType, Value};

    use super::*;
    use crate::color::SchemeName;
    use crate::scale::{ColorRamp, Continuous, Mapping, Ordinal};

    #[test]
    fn ordinal_colors_become_swatches() {
        let scale = Scale::new(
            ScaleName::Color,
            ScaleType::Categorical,
            ScaleKind::Ordinal(Ordinal::new(
                vec![Value::from("a"), Value::from("b"), Value::from("c")],
                vec![
                    Encoded::Color(Color::BLACK),
                    Encoded::Color(Color::WHITE),
                ],
            )),
        )
        .with_label(Some("kind".into()));
        let items = legend_items(&scale);
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].swatch, Swatch::Color(Color::BLACK));

        let node = legend(
            &scale,
            &LegendOptions::default().with_columns(2),
            &Locale::default(),
            &FormatCache::new(),
        )
        .expect("legend");
        // Title plus a swatch and a label per item.
        assert_eq!(node.leaf_count(), 7);
        let second_column = node.find_class("swatches")[0].children()[4].bounds();
        assert_eq!(second_column.map(|b| b.x0), Some(96.0));
    }

    #[test]
    fn continuous_colors_become_a_ramp() {
        let scale = Scale::new(
            ScaleName::Color,
            ScaleType::Sequential,
            ScaleKind::Ramp(ColorRamp::new(
                Continuous::new(Mapping::Linear, vec![0.0, 100.0], vec![0.0, 1.0]),
                SchemeName::Viridis.ramp(),
            )),
        );
        let node = legend(
            &scale,
            &LegendOptions::default(),
            &Locale::default(),
            &FormatCache::new(),
        )
        .expect("legend");
        assert_eq!(node.find_class("strips")[0].children().len(), RAMP_SAMPLES);
        let labels = node.find_class("labels")[0].children();
        let Node::Text(last) = &labels[labels.len() - 1] else {
            panic!("labels are text");
        };
        assert_eq!(&*last.text, "100");
        assert_eq!(last.pos.x, 240.0);
    }

    #[test]
    fn position_scales_have_no_legend() {
        let scale = Scale::new(
            ScaleName::X,
            ScaleType::Linear,
            ScaleKind::Continuous(Continuous::new(
                Mapping::Linear,
                vec![0.0, 1.0],
                vec![0.0, 1.0],
            )),
        );
        let none = legend(
            &scale,
            &LegendOptions::default(),
            &Locale::default(),
            &FormatCache::new(),
        );
        assert!(none.is_none());
    }
}
