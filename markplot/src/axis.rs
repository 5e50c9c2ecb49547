// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis generation.
//!
//! An [`Axis`] draws one side of one position scale: an optional domain line, tick marks, tick
//! labels, grid lines and a title. Axes are measured before layout (for automatic margins) and
//! rendered after every scale is final, in the coordinates of the first facet cell.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use kurbo::{BezPath, Point, Rect};
use markplot_core::{ConfigurationError, Node, ScaleName, Style, TextAnchor, TextBaseline, TextNode, Value};
use peniko::Brush;
use peniko::color::palette::css;
use smallvec::SmallVec;

use crate::dimensions::{measure_axis_bottom, measure_axis_left};
use crate::format::{FormatCache, Locale};
use crate::measure::TextMeasurer;
use crate::scale::{Mapping, Scale, tick_precision};
use crate::scale_infer::TickFormatter;
use crate::time;

/// Where a scale's axis goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisAnchor {
    /// Above the frame (horizontal scales).
    Top,
    /// Below the frame (horizontal scales).
    Bottom,
    /// Left of the frame (vertical scales).
    Left,
    /// Right of the frame (vertical scales).
    Right,
    /// On both sides.
    Both,
    /// No axis.
    None,
}

impl AxisAnchor {
    /// Returns the string form accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Both => "both",
            Self::None => "none",
        }
    }

    /// The default anchor of a position scale.
    pub fn default_for(scale: ScaleName) -> Self {
        match scale {
            ScaleName::X => Self::Bottom,
            ScaleName::Y => Self::Left,
            ScaleName::Fx => Self::Top,
            ScaleName::Fy => Self::Right,
            _ => Self::None,
        }
    }

    /// Resolves the anchor into the sides it draws on for `scale`.
    ///
    /// Horizontal scales accept top/bottom, vertical scales left/right.
    pub fn orients(self, scale: ScaleName) -> Result<SmallVec<[AxisOrient; 2]>, ConfigurationError> {
        let horizontal = matches!(scale, ScaleName::X | ScaleName::Fx);
        let vertical = matches!(scale, ScaleName::Y | ScaleName::Fy);
        let sides: &[AxisOrient] = match self {
            Self::None => &[],
            Self::Top if horizontal => &[AxisOrient::Top],
            Self::Bottom if horizontal => &[AxisOrient::Bottom],
            Self::Both if horizontal => &[AxisOrient::Top, AxisOrient::Bottom],
            Self::Left if vertical => &[AxisOrient::Left],
            Self::Right if vertical => &[AxisOrient::Right],
            Self::Both if vertical => &[AxisOrient::Left, AxisOrient::Right],
            _ => {
                return Err(ConfigurationError::InvalidAxis(alloc::format!(
                    "{} on scale {scale}",
                    self.as_str()
                )));
            }
        };
        Ok(sides.iter().copied().collect())
    }
}

impl fmt::Display for AxisAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxisAnchor {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "left" => Self::Left,
            "right" => Self::Right,
            "both" => Self::Both,
            "none" => Self::None,
            other => return Err(ConfigurationError::InvalidAxis(other.into())),
        })
    }
}

/// The side of the frame an axis is drawn on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisOrient {
    /// Above the frame.
    Top,
    /// Below the frame.
    Bottom,
    /// Left of the frame.
    Left,
    /// Right of the frame.
    Right,
}

impl AxisOrient {
    fn is_horizontal(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

/// A paint + width pair for stroked paths (domain lines, ticks, gridlines).
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Stroke paint.
    pub brush: Brush,
    /// Stroke width in pixels.
    pub stroke_width: f64,
}

impl StrokeStyle {
    /// Convenience for a solid stroke.
    pub fn solid(brush: impl Into<Brush>, stroke_width: f64) -> Self {
        Self {
            brush: brush.into(),
            stroke_width,
        }
    }

    fn style(&self) -> Style {
        Style {
            stroke: Some(self.brush.clone()),
            stroke_width: self.stroke_width,
            ..Style::default()
        }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::solid(css::BLACK, 1.0)
    }
}

/// Axis styling defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisStyle {
    /// Style for the axis domain line and tick marks.
    pub rule: StrokeStyle,
    /// Fill paint for tick labels.
    pub label_fill: Brush,
    /// Font size for tick labels.
    pub label_font_size: f64,
    /// Fill paint for the axis title.
    pub title_fill: Brush,
    /// Font size for the axis title.
    pub title_font_size: f64,
}

impl Default for AxisStyle {
    fn default() -> Self {
        let rule = StrokeStyle::default();
        Self {
            rule: rule.clone(),
            label_fill: rule.brush.clone(),
            label_font_size: 10.0,
            title_fill: rule.brush,
            title_font_size: 11.0,
        }
    }
}

/// Gridline styling.
#[derive(Clone, Debug, PartialEq)]
pub struct GridStyle {
    /// Stroke style for gridlines.
    pub stroke: StrokeStyle,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            stroke: StrokeStyle {
                brush: Brush::Solid(css::BLACK.with_alpha(40.0 / 255.0)),
                stroke_width: 1.0,
            },
        }
    }
}

/// A formatted tick: its domain value and label.
pub type Tick = (Value, String);

/// One axis of one position scale.
#[derive(Clone)]
pub struct Axis {
    /// The scale this axis shows.
    pub scale: ScaleName,
    /// The side of the frame.
    pub orient: AxisOrient,
    /// Approximate number of ticks.
    pub tick_count: usize,
    /// Tick line length in pixels.
    pub tick_size: f64,
    /// Gap between the tick end and its label.
    pub tick_padding: f64,
    /// Whether to draw tick marks.
    pub ticks: bool,
    /// Whether to draw the axis domain line.
    pub show_domain: bool,
    /// Axis styling.
    pub style: AxisStyle,
    /// Gridlines spanning the frame, if any.
    pub grid: Option<GridStyle>,
    /// Optional axis title.
    pub title: Option<Arc<str>>,
    /// Gap between the tick labels and the title.
    pub title_offset: f64,
    /// Tick label formatter; replaces the scale's default format.
    pub tick_format: Option<TickFormatter>,
}

impl fmt::Debug for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Axis")
            .field("scale", &self.scale)
            .field("orient", &self.orient)
            .field("tick_count", &self.tick_count)
            .field("tick_size", &self.tick_size)
            .field("tick_padding", &self.tick_padding)
            .field("ticks", &self.ticks)
            .field("show_domain", &self.show_domain)
            .field("style", &self.style)
            .field("grid", &self.grid)
            .field("title", &self.title)
            .field("title_offset", &self.title_offset)
            .field("tick_format", &self.tick_format.is_some())
            .finish()
    }
}

impl Axis {
    /// Creates an axis with tick marks and labels only.
    pub fn new(scale: ScaleName, orient: AxisOrient) -> Self {
        Self {
            scale,
            orient,
            tick_count: 10,
            tick_size: 6.0,
            tick_padding: 3.0,
            ticks: true,
            show_domain: false,
            style: AxisStyle::default(),
            grid: None,
            title: None,
            title_offset: 4.0,
            tick_format: None,
        }
    }

    /// Creates a facet axis: labels only.
    pub fn facet(scale: ScaleName, orient: AxisOrient) -> Self {
        Self {
            ticks: false,
            tick_size: 0.0,
            ..Self::new(scale, orient)
        }
    }

    /// Sets the approximate tick count.
    pub fn with_tick_count(mut self, tick_count: usize) -> Self {
        self.tick_count = tick_count;
        self
    }

    /// Enables or disables the domain line.
    pub fn with_domain(mut self, domain: bool) -> Self {
        self.show_domain = domain;
        self
    }

    /// Sets the axis style.
    pub fn with_style(mut self, style: AxisStyle) -> Self {
        self.style = style;
        self
    }

    /// Enables gridlines using the provided style.
    pub fn with_grid(mut self, grid: GridStyle) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Sets the axis title.
    pub fn with_title(mut self, title: Option<Arc<str>>) -> Self {
        self.title = title;
        self
    }

    /// Sets the tick label formatter.
    pub fn with_tick_format(mut self, format: Option<TickFormatter>) -> Self {
        self.tick_format = format;
        self
    }

    /// Returns the ticks of `scale` with their labels.
    ///
    /// Numbers get just enough fraction digits for the tick step, instants are formatted at
    /// the precision of the tick interval, discrete values print their display text.
    pub fn tick_labels(&self, scale: &Scale, locale: &Locale, cache: &FormatCache) -> Vec<Tick> {
        let ticks = scale.ticks(self.tick_count);
        if let Some(format) = &self.tick_format {
            return ticks
                .into_iter()
                .map(|v| {
                    let label = format(&v);
                    (v, label)
                })
                .collect();
        }
        let Some(c) = scale.continuous() else {
            return ticks
                .into_iter()
                .map(|v| {
                    let label = v.to_text().to_string();
                    (v, label)
                })
                .collect();
        };
        let (lo, hi) = c.extent();
        if c.is_temporal() {
            #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
            let unit = time::tick_interval(lo as i64, hi as i64, self.tick_count).unit;
            let format = cache.time_format(locale, unit);
            return ticks
                .into_iter()
                .map(|v| {
                    let label = match v {
                        Value::Date(ms) => format.format(ms),
                        ref other => other.to_text().to_string(),
                    };
                    (v, label)
                })
                .collect();
        }
        let precision = match c.mapping() {
            Mapping::Log { .. } => None,
            _ => Some(tick_precision(lo, hi, self.tick_count)),
        };
        let format = cache.number_format(locale);
        ticks
            .into_iter()
            .map(|v| {
                let label = match v.as_f64() {
                    Some(x) => format.format(x, precision),
                    None => v.to_text().to_string(),
                };
                (v, label)
            })
            .collect()
    }

    /// Returns the thickness this axis needs outside the frame.
    pub fn measure(&self, measurer: &dyn TextMeasurer, ticks: &[Tick]) -> f64 {
        let tick_size = if self.ticks { self.tick_size } else { 0.0 };
        let labels = if self.orient.is_horizontal() {
            measure_axis_bottom(
                measurer,
                tick_size,
                self.tick_padding,
                self.style.label_font_size,
            )
        } else {
            let labels: Vec<&str> = ticks.iter().map(|(_, l)| l.as_str()).collect();
            measure_axis_left(
                measurer,
                &labels,
                tick_size,
                self.tick_padding,
                self.style.label_font_size,
            )
        };
        match &self.title {
            Some(_) if self.orient.is_horizontal() => {
                labels + self.title_offset + self.style.title_font_size
            }
            _ => labels,
        }
    }

    /// Draws the axis around `frame`, in the coordinates `scale` maps into.
    ///
    /// Ticks outside the frame are skipped.
    pub fn render(&self, scale: &Scale, frame: Rect, ticks: &[Tick]) -> Node {
        let rule = self.style.rule.style();
        let tick_size = if self.ticks { self.tick_size } else { 0.0 };
        let offset = tick_size + self.tick_padding;
        let horizontal = self.orient.is_horizontal();
        let (lo, hi) = if horizontal {
            (frame.x0, frame.x1)
        } else {
            (frame.y0, frame.y1)
        };

        let mut rules = Vec::new();
        let mut labels = Vec::new();
        for (p, label) in self.positions(scale, frame, ticks) {
            let (edge, out, anchor, baseline) = match self.orient {
                AxisOrient::Bottom => (
                    Point::new(p, frame.y1),
                    (0.0, 1.0),
                    TextAnchor::Middle,
                    TextBaseline::Hanging,
                ),
                AxisOrient::Top => (
                    Point::new(p, frame.y0),
                    (0.0, -1.0),
                    TextAnchor::Middle,
                    TextBaseline::Alphabetic,
                ),
                AxisOrient::Left => (
                    Point::new(frame.x0, p),
                    (-1.0, 0.0),
                    TextAnchor::End,
                    TextBaseline::Middle,
                ),
                AxisOrient::Right => (
                    Point::new(frame.x1, p),
                    (1.0, 0.0),
                    TextAnchor::Start,
                    TextBaseline::Middle,
                ),
            };
            if self.ticks {
                let end = Point::new(edge.x + out.0 * tick_size, edge.y + out.1 * tick_size);
                rules.push(Node::path(segment(edge, end), rule.clone()));
            }
            let at = Point::new(edge.x + out.0 * offset, edge.y + out.1 * offset);
            labels.push(Node::Text(
                TextNode::new(at, label)
                    .with_anchor(anchor)
                    .with_baseline(baseline)
                    .with_font_size(self.style.label_font_size)
                    .with_fill(self.style.label_fill.clone()),
            ));
        }

        if self.show_domain {
            let (a, b) = match self.orient {
                AxisOrient::Bottom => (Point::new(lo, frame.y1), Point::new(hi, frame.y1)),
                AxisOrient::Top => (Point::new(lo, frame.y0), Point::new(hi, frame.y0)),
                AxisOrient::Left => (Point::new(frame.x0, lo), Point::new(frame.x0, hi)),
                AxisOrient::Right => (Point::new(frame.x1, lo), Point::new(frame.x1, hi)),
            };
            rules.push(Node::path(segment(a, b), rule));
        }

        let mut children = Vec::with_capacity(4);
        children.extend(self.render_grid(scale, frame, ticks));
        children.push(Node::group("ticks", rules));
        children.push(Node::group("labels", labels));
        if let Some(title) = self.title_node(frame, offset) {
            children.push(title);
        }
        Node::group(alloc::format!("axis-{}", self.scale), children)
    }

    /// Draws only the gridlines of this axis, or `None` without a grid.
    ///
    /// Facet cells away from the axis edge still show the grid.
    pub fn render_grid(&self, scale: &Scale, frame: Rect, ticks: &[Tick]) -> Option<Node> {
        let style = self.grid.as_ref()?.stroke.style();
        let lines: Vec<Node> = self
            .positions(scale, frame, ticks)
            .map(|(p, _)| {
                let (a, b) = if self.orient.is_horizontal() {
                    (Point::new(p, frame.y0), Point::new(p, frame.y1))
                } else {
                    (Point::new(frame.x0, p), Point::new(frame.x1, p))
                };
                Node::path(segment(a, b), style.clone())
            })
            .collect();
        (!lines.is_empty()).then(|| Node::group("grid", lines))
    }

    /// Pixel positions of the ticks that fall within the frame.
    fn positions<'t>(
        &self,
        scale: &'t Scale,
        frame: Rect,
        ticks: &'t [Tick],
    ) -> impl Iterator<Item = (f64, &'t str)> + 't {
        let (lo, hi) = if self.orient.is_horizontal() {
            (frame.x0, frame.x1)
        } else {
            (frame.y0, frame.y1)
        };
        ticks.iter().filter_map(move |(v, label)| {
            let p = scale.tick_position(v)?;
            (p >= lo - 1e-9 && p <= hi + 1e-9).then_some((p, label.as_str()))
        })
    }

    /// The title sits at the far end of horizontal axes and above vertical ones.
    fn title_node(&self, frame: Rect, offset: f64) -> Option<Node> {
        let title = self.title.as_ref()?;
        let size = self.style.title_font_size;
        let (pos, anchor, baseline) = match self.orient {
            AxisOrient::Bottom => (
                Point::new(
                    frame.x1,
                    frame.y1 + offset + self.style.label_font_size + self.title_offset,
                ),
                TextAnchor::End,
                TextBaseline::Hanging,
            ),
            AxisOrient::Top => (
                Point::new(
                    frame.x1,
                    frame.y0 - offset - self.style.label_font_size - self.title_offset,
                ),
                TextAnchor::End,
                TextBaseline::Alphabetic,
            ),
            AxisOrient::Left => (
                Point::new(frame.x0 - offset, frame.y0 - self.title_offset - size / 2.0),
                TextAnchor::Start,
                TextBaseline::Alphabetic,
            ),
            AxisOrient::Right => (
                Point::new(frame.x1 + offset, frame.y0 - self.title_offset - size / 2.0),
                TextAnchor::End,
                TextBaseline::Alphabetic,
            ),
        };
        Some(Node::Text(
            TextNode::new(pos, title.clone())
                .with_anchor(anchor)
                .with_baseline(baseline)
                .with_font_size(size)
                .with_fill(self.style.title_fill.clone()),
        ))
    }
}

fn segment(a: Point, b: Point) -> BezPath {
    let mut p = BezPath::new();
    p.move_to(a);
    p.line_to(b);
    p
}
