// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plot assembly: the two-phase `collect` / `render` pipeline.
//!
//! [`collect`] does everything that needs no pixels: facet partitioning, transforms, channel
//! resolution and scale inference. [`Collected::render`] then measures guides, arranges the
//! layout, materializes every scale, runs initializers and only then renders marks, axes and
//! legends into a [`Figure`].

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use kurbo::{Affine, Point, Rect};
use markplot_core::{
    Channel, ChannelSpec, ChannelValue, DataShapeError, Group, Index, Node, Resolved,
    ScaleBinding, ScaleName, Style, Table, TextAnchor, TextBaseline, TextNode, Value, check_indices,
};
use markplot_transforms::apply_all;
use peniko::Color;
use peniko::color::palette::css;

use crate::axis::{Axis, AxisAnchor, AxisOrient, GridStyle, Tick};
use crate::dimensions::{
    DEFAULT_HEIGHT, DEFAULT_WIDTH, DimensionOptions, Dimensions, GridShape, Margins,
};
use crate::error::{PlotError, Result};
use crate::facet::{
    FacetCell, FacetGrid, FacetMode, FacetOptions, FacetSource, broadcast, exclude, partition,
    reindex,
};
use crate::format::{FormatCache, Locale};
use crate::initializer::InitializerInput;
use crate::legend::{LegendOptions, legend};
use crate::mark::{Mark, RenderContext, Values};
use crate::measure::{HeuristicTextMeasurer, TextMeasurer};
use crate::scale::{Scale, Scales};
use crate::scale_infer::{ScaleOptions, ScaleSpec, infer, resolve_binding};
use crate::svg;

/// Margins used when no guide asks for more.
const BASE_MARGINS: Margins = Margins {
    top: 20.0,
    right: 20.0,
    bottom: 30.0,
    left: 40.0,
};

/// Vertical space between the plot, legends and the caption.
const BLOCK_GAP: f64 = 8.0;

/// Figure-wide styling.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotStyle {
    /// Background fill; transparent when `None`.
    pub background: Option<Color>,
    /// Font family written to the SVG root.
    pub font_family: Arc<str>,
    /// Caption font size.
    pub font_size: f64,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            background: Some(css::WHITE),
            font_family: "system-ui, sans-serif".into(),
            font_size: 10.0,
        }
    }
}

/// Everything a plot is built from.
///
/// Plot-level `clamp`, `nice`, `zero`, `round`, `align`, `padding`, `grid` and `inset*` apply
/// to the `x` and `y` scales unless their own options set them; `axis` applies to every
/// position scale that accepts it.
#[derive(Clone, Debug, Default)]
pub struct PlotOptions {
    /// Outer width; 640 when unset.
    pub width: Option<f64>,
    /// Outer height; derived from `aspect_ratio`, else 400, when unset.
    pub height: Option<f64>,
    /// Inner width over inner height.
    pub aspect_ratio: Option<f64>,
    /// Top margin; measured from the guides when unset.
    pub margin_top: Option<f64>,
    /// Right margin.
    pub margin_right: Option<f64>,
    /// Bottom margin.
    pub margin_bottom: Option<f64>,
    /// Left margin.
    pub margin_left: Option<f64>,
    /// Inset of the `x` and `y` ranges on every side.
    pub inset: Option<f64>,
    /// Top inset of the `y` range.
    pub inset_top: Option<f64>,
    /// Right inset of the `x` range.
    pub inset_right: Option<f64>,
    /// Bottom inset of the `y` range.
    pub inset_bottom: Option<f64>,
    /// Left inset of the `x` range.
    pub inset_left: Option<f64>,
    /// Text drawn below the plot.
    pub caption: Option<Arc<str>>,
    /// Figure styling.
    pub style: PlotStyle,
    /// Default clamping of `x` and `y`.
    pub clamp: Option<bool>,
    /// Default domain niceing of `x` and `y`.
    pub nice: Option<bool>,
    /// Default zero inclusion of `x` and `y`.
    pub zero: Option<bool>,
    /// Default pixel rounding of `x` and `y`.
    pub round: Option<bool>,
    /// Default band/point alignment of `x` and `y`.
    pub align: Option<f64>,
    /// Default band/point padding of `x` and `y`.
    pub padding: Option<f64>,
    /// Default gridlines of `x` and `y`.
    pub grid: Option<bool>,
    /// Label of `x` and `y` when neither options nor channels give one.
    pub label: Option<Arc<str>>,
    /// Default axis placement.
    pub axis: Option<AxisAnchor>,
    /// Per-scale options.
    pub scales: HashMap<ScaleName, ScaleOptions>,
    /// Faceting.
    pub facet: Option<FacetOptions>,
    /// Marks, drawn in order.
    pub marks: Vec<Mark>,
    /// Locale of tick labels.
    pub locale: Locale,
}

impl PlotOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outer width.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Sets the outer height.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Derives the height from the inner width.
    pub fn with_aspect_ratio(mut self, ratio: f64) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Sets all four margins.
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin_top = Some(margin);
        self.margin_right = Some(margin);
        self.margin_bottom = Some(margin);
        self.margin_left = Some(margin);
        self
    }

    /// Sets the margins individually.
    pub fn with_margins(mut self, top: f64, right: f64, bottom: f64, left: f64) -> Self {
        self.margin_top = Some(top);
        self.margin_right = Some(right);
        self.margin_bottom = Some(bottom);
        self.margin_left = Some(left);
        self
    }

    /// Insets the `x` and `y` ranges.
    pub fn with_inset(mut self, inset: f64) -> Self {
        self.inset = Some(inset);
        self
    }

    /// Sets the caption.
    pub fn with_caption(mut self, caption: impl Into<Arc<str>>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Sets the figure style.
    pub fn with_style(mut self, style: PlotStyle) -> Self {
        self.style = style;
        self
    }

    /// Clamps `x` and `y` by default.
    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = Some(clamp);
        self
    }

    /// Nices `x` and `y` by default.
    pub fn with_nice(mut self, nice: bool) -> Self {
        self.nice = Some(nice);
        self
    }

    /// Includes zero in `x` and `y` by default.
    pub fn with_zero(mut self, zero: bool) -> Self {
        self.zero = Some(zero);
        self
    }

    /// Rounds `x` and `y` pixels by default.
    pub fn with_round(mut self, round: bool) -> Self {
        self.round = Some(round);
        self
    }

    /// Sets the default band/point alignment.
    pub fn with_align(mut self, align: f64) -> Self {
        self.align = Some(align);
        self
    }

    /// Sets the default band/point padding.
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Draws `x` and `y` gridlines by default.
    pub fn with_grid(mut self, grid: bool) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Sets the fallback label of `x` and `y`.
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the default axis placement.
    pub fn with_axis(mut self, axis: AxisAnchor) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Sets the options of one scale.
    pub fn with_scale(mut self, name: ScaleName, options: ScaleOptions) -> Self {
        self.scales.insert(name, options);
        self
    }

    /// Sets the `x` scale options.
    pub fn with_x(self, options: ScaleOptions) -> Self {
        self.with_scale(ScaleName::X, options)
    }

    /// Sets the `y` scale options.
    pub fn with_y(self, options: ScaleOptions) -> Self {
        self.with_scale(ScaleName::Y, options)
    }

    /// Sets the `fx` scale options.
    pub fn with_fx(self, options: ScaleOptions) -> Self {
        self.with_scale(ScaleName::Fx, options)
    }

    /// Sets the `fy` scale options.
    pub fn with_fy(self, options: ScaleOptions) -> Self {
        self.with_scale(ScaleName::Fy, options)
    }

    /// Sets the `color` scale options.
    pub fn with_color(self, options: ScaleOptions) -> Self {
        self.with_scale(ScaleName::Color, options)
    }

    /// Sets the `r` scale options.
    pub fn with_r(self, options: ScaleOptions) -> Self {
        self.with_scale(ScaleName::R, options)
    }

    /// Sets the `opacity` scale options.
    pub fn with_opacity(self, options: ScaleOptions) -> Self {
        self.with_scale(ScaleName::Opacity, options)
    }

    /// Sets the `symbol` scale options.
    pub fn with_symbol(self, options: ScaleOptions) -> Self {
        self.with_scale(ScaleName::Symbol, options)
    }

    /// Sets the `length` scale options.
    pub fn with_length(self, options: ScaleOptions) -> Self {
        self.with_scale(ScaleName::Length, options)
    }

    /// Facets the plot.
    pub fn with_facet(mut self, facet: FacetOptions) -> Self {
        self.facet = Some(facet);
        self
    }

    /// Appends a mark.
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    /// Appends several marks.
    pub fn with_marks(mut self, marks: impl IntoIterator<Item = Mark>) -> Self {
        self.marks.extend(marks);
        self
    }

    /// Sets the tick label locale.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Returns the options of `name` with the plot-level defaults merged in.
    pub fn scale_options(&self, name: ScaleName) -> ScaleOptions {
        let mut o = self.scales.get(&name).cloned().unwrap_or_default();
        match name {
            ScaleName::X | ScaleName::Y => {
                o.clamp = o.clamp.or(self.clamp);
                o.nice = o.nice.or(self.nice);
                o.zero = o.zero.or(self.zero);
                o.round = o.round.or(self.round);
                o.align = o.align.or(self.align);
                o.padding = o.padding.or(self.padding);
                o.grid = o.grid.or(self.grid);
                o.inset = o.inset.or(self.inset);
                if name == ScaleName::X {
                    o.inset_left = o.inset_left.or(self.inset_left);
                    o.inset_right = o.inset_right.or(self.inset_right);
                } else {
                    o.inset_top = o.inset_top.or(self.inset_top);
                    o.inset_bottom = o.inset_bottom.or(self.inset_bottom);
                }
            }
            ScaleName::Fx | ScaleName::Fy => {
                if let Some(facet) = &self.facet {
                    o.label = o.label.or_else(|| facet.label.clone());
                    o.grid = o.grid.or(facet.grid.then_some(true));
                }
            }
            _ => {}
        }
        if o.axis.is_none() && name.is_position() {
            o.axis = self.axis.filter(|a| a.orients(name).is_ok());
        }
        o
    }

    fn dimension_options(&self) -> DimensionOptions {
        let facet = self.facet.as_ref();
        DimensionOptions {
            width: self.width,
            height: self.height,
            aspect_ratio: self.aspect_ratio,
            margin_top: self.margin_top,
            margin_right: self.margin_right,
            margin_bottom: self.margin_bottom,
            margin_left: self.margin_left,
            facet_margin_top: facet.and_then(|f| f.margin_top),
            facet_margin_right: facet.and_then(|f| f.margin_right),
            facet_margin_bottom: facet.and_then(|f| f.margin_bottom),
            facet_margin_left: facet.and_then(|f| f.margin_left),
        }
    }
}

/// An event of the render pass, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// A scale was materialized with its final range.
    ScaleFinalized(ScaleName),
    /// A mark was rendered in a facet cell.
    MarkRendered {
        /// The mark name.
        mark: &'static str,
        /// The cell index.
        cell: usize,
    },
}

/// One mark after transforms and channel resolution.
#[derive(Clone, Debug)]
struct MarkState<'a> {
    mark: &'a Mark,
    data: Table,
    facets: Vec<Index>,
    channels: Vec<Channel>,
    constants: Vec<(&'static str, Value)>,
}

/// The outcome of [`collect`]: everything but pixels.
#[derive(Debug)]
pub struct Collected<'a> {
    options: &'a PlotOptions,
    grid: FacetGrid,
    marks: Vec<MarkState<'a>>,
    specs: Vec<ScaleSpec>,
}

/// Resolves a facet channel, repeating a constant for every row.
fn facet_channel(
    scale: ScaleName,
    value: &ChannelValue,
    data: &Table,
) -> Result<Channel, DataShapeError> {
    let name = scale.as_str();
    let spec = ChannelSpec::new(name, value.clone(), ScaleBinding::Scale(scale));
    Ok(match spec.resolve(data)? {
        Resolved::Channel(c) => c,
        Resolved::Constant(v) => Channel::new(
            name,
            alloc::vec![v; data.len()],
            ScaleBinding::Scale(scale),
        ),
    })
}

fn bound<'c>(marks: &'c [MarkState<'_>], name: ScaleName) -> Vec<&'c Channel> {
    marks
        .iter()
        .flat_map(|m| m.channels.iter())
        .filter(|c| resolve_binding(c) == Some(name))
        .collect()
}

/// Partitions, transforms and resolves every mark, then infers every scale.
pub fn collect(options: &PlotOptions) -> Result<Collected<'_>> {
    // Plot-level facet channels, read from the facet data.
    let facet = options.facet.as_ref();
    let facet_data = facet.and_then(|f| f.data.as_ref());
    let (plot_fx, plot_fy) = match (facet, facet_data) {
        (Some(f), Some(data)) => (
            f.x.as_ref()
                .map(|v| facet_channel(ScaleName::Fx, v, data))
                .transpose()?,
            f.y.as_ref()
                .map(|v| facet_channel(ScaleName::Fy, v, data))
                .transpose()?,
        ),
        _ => (None, None),
    };
    let plot_faceted = plot_fx.is_some() || plot_fy.is_some();

    let mut sources = Vec::with_capacity(options.marks.len());
    for mark in &options.marks {
        let own = mark.fx.is_some() || mark.fy.is_some();
        let same = facet_data.is_some_and(|d| d.ptr_eq(&mark.data));
        let source = mark.facet.source(same, own, plot_faceted);
        let keys = match source {
            FacetSource::Own => (
                mark.fx
                    .as_ref()
                    .map(|v| facet_channel(ScaleName::Fx, v, &mark.data))
                    .transpose()?,
                mark.fy
                    .as_ref()
                    .map(|v| facet_channel(ScaleName::Fy, v, &mark.data))
                    .transpose()?,
            ),
            FacetSource::Plot => {
                let expected = facet_data.map_or(0, Table::len);
                if !same && mark.data.len() != expected {
                    return Err(DataShapeError::FacetDataLength {
                        expected,
                        actual: mark.data.len(),
                    }
                    .into());
                }
                (plot_fx.clone(), plot_fy.clone())
            }
            FacetSource::Unfaceted => (None, None),
        };
        sources.push((source, keys));
    }

    // The facet domains cover the plot's facet values and every mark's own.
    let domain = |name: ScaleName, plot: &Option<Channel>| -> Result<Option<ScaleSpec>> {
        let mut channels: Vec<&Channel> = plot.iter().collect();
        for (mark, (source, (fx, fy))) in options.marks.iter().zip(&sources) {
            if *source == FacetSource::Own && mark.facet != FacetMode::Exclude {
                let own = if name == ScaleName::Fx { fx } else { fy };
                channels.extend(own.iter());
            }
        }
        Ok(infer(name, &channels, &options.scale_options(name))?)
    };
    let fx_spec = domain(ScaleName::Fx, &plot_fx)?;
    let fy_spec = domain(ScaleName::Fy, &plot_fy)?;
    let grid = FacetGrid::new(
        fx_spec.as_ref().map(ScaleSpec::domain_values),
        fy_spec.as_ref().map(ScaleSpec::domain_values),
    );
    tracing::debug!(cols = grid.cols(), rows = grid.rows(), "facet grid");

    let mut marks = Vec::with_capacity(options.marks.len());
    for (mark, (source, (fx, fy))) in options.marks.iter().zip(sources) {
        let name = mark.name();
        let index = mark.data.indices();
        let unfaceted = source == FacetSource::Unfaceted;
        let mut input = mark.data.clone();
        let facets = if unfaceted {
            alloc::vec![index]
        } else {
            let groups = partition(
                &index,
                fx.as_ref().map(|c| &*c.values),
                fy.as_ref().map(|c| &*c.values),
            );
            let (cells, dropped) = grid.arrange(&groups);
            if dropped > 0 {
                tracing::warn!(mark = name, dropped, "rows outside the facet domain are not drawn");
            }
            if mark.facet == FacetMode::Exclude && mark.transforms.is_empty() {
                exclude(&cells)
            } else if mark.facet == FacetMode::Exclude {
                // Cells overlap; each occurrence gets its own row so transforms that write
                // per-row outputs keep one value per cell.
                let (rows, cells) = reindex(&exclude(&cells));
                input = mark.data.take(&rows)?;
                cells
            } else {
                cells
            }
        };

        let (data, out) = apply_all(&mark.transforms, &input, &facets)
            .map_err(|source| PlotError::Transform { mark: name, source })?;
        if out.len() != facets.len() {
            return Err(DataShapeError::FacetCountMismatch {
                expected: facets.len(),
                actual: out.len(),
            }
            .into());
        }
        check_indices(&out, data.len())?;
        // Unfaceted marks transform once and draw the same rows in every cell.
        let facets = if unfaceted {
            broadcast(&out[0], grid.len())
        } else {
            out
        };

        let mut channels = Vec::new();
        let mut constants = Vec::new();
        for spec in mark.channel_specs()? {
            match spec.resolve(&data)? {
                Resolved::Channel(c) => channels.push(c),
                Resolved::Constant(v) => constants.push((spec.name, v)),
            }
        }
        tracing::trace!(
            mark = name,
            rows = data.len(),
            channels = channels.len(),
            "collected mark"
        );
        marks.push(MarkState {
            mark,
            data,
            facets,
            channels,
            constants,
        });
    }

    let mut specs: Vec<ScaleSpec> = fx_spec.into_iter().chain(fy_spec).collect();
    for name in ScaleName::ALL.into_iter().filter(|n| !n.is_facet()) {
        let channels = bound(&marks, name);
        if let Some(mut spec) = infer(name, &channels, &options.scale_options(name))? {
            if matches!(name, ScaleName::X | ScaleName::Y) && spec.label.is_none() {
                spec.label = options.label.clone();
            }
            specs.push(spec);
        }
    }
    Ok(Collected {
        options,
        grid,
        marks,
        specs,
    })
}

/// Builds and renders a plot.
pub fn plot(options: &PlotOptions) -> Result<Figure> {
    collect(options)?.render()
}

impl Collected<'_> {
    /// Returns the facet grid.
    pub fn grid(&self) -> &FacetGrid {
        &self.grid
    }

    /// Returns the inferred spec of a scale.
    pub fn scale_spec(&self, name: ScaleName) -> Option<&ScaleSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Returns the number of marks.
    pub fn mark_count(&self) -> usize {
        self.marks.len()
    }

    /// Returns the working data of mark `i`, after transforms.
    pub fn mark_data(&self, i: usize) -> Option<&Table> {
        self.marks.get(i).map(|m| &m.data)
    }

    /// Returns the per-cell indices of mark `i`.
    pub fn mark_facets(&self, i: usize) -> Option<&[Index]> {
        self.marks.get(i).map(|m| &*m.facets)
    }

    /// Returns the resolved channels of mark `i`.
    pub fn mark_channels(&self, i: usize) -> Option<&[Channel]> {
        self.marks.get(i).map(|m| &*m.channels)
    }

    /// Renders with the heuristic text measurer.
    pub fn render(&self) -> Result<Figure> {
        self.render_with(&HeuristicTextMeasurer)
    }

    /// Renders, measuring guide labels with `measurer`.
    pub fn render_with(&self, measurer: &dyn TextMeasurer) -> Result<Figure> {
        let options = self.options;
        let locale = &options.locale;
        let cache = FormatCache::new();
        let mut trace = Vec::new();

        // Measure: margins from provisional ticks (domains are already final).
        let axes = self.axes()?;
        let mut auto = BASE_MARGINS;
        let mut facet_auto = Margins::ZERO;
        for axis in &axes {
            let Some(spec) = self.scale_spec(axis.scale) else {
                continue;
            };
            let provisional = spec.instantiate(None)?;
            let need = axis.measure(measurer, &axis.tick_labels(&provisional, locale, &cache));
            let (side, minimum) = if axis.scale.is_facet() {
                (&mut facet_auto, facet_margin(axis.orient))
            } else {
                (&mut auto, 0.0)
            };
            let slot = match axis.orient {
                AxisOrient::Top => &mut side.top,
                AxisOrient::Bottom => &mut side.bottom,
                AxisOrient::Left => &mut side.left,
                AxisOrient::Right => &mut side.right,
            };
            *slot = slot.max(need).max(minimum);
        }

        // Arrange.
        let padding = |name: ScaleName| {
            self.scale_spec(name).map_or(0.0, |s| {
                let o = s.options();
                o.padding_inner.or(o.padding).unwrap_or(0.1)
            })
        };
        let dims = Dimensions::arrange(
            &options.dimension_options(),
            auto,
            facet_auto,
            GridShape {
                cols: self.grid.cols(),
                rows: self.grid.rows(),
                padding_x: padding(ScaleName::Fx),
                padding_y: padding(ScaleName::Fy),
            },
        )?;

        // Materialize every scale before anything renders.
        let mut scales = Scales::new();
        for spec in &self.specs {
            scales.insert(instantiate(spec, &dims)?);
            trace.push(TraceEvent::ScaleFinalized(spec.name));
        }

        // Initializers see final scales; scales their channels bind to are inferred again.
        let mut marks = self.marks.clone();
        let mut affected: Vec<ScaleName> = Vec::new();
        for state in &mut marks {
            let Some(init) = &state.mark.initializer else {
                continue;
            };
            let input = InitializerInput {
                data: &state.data,
                facets: &state.facets,
                channels: &state.channels,
                scales: &scales,
                dimensions: &dims,
            };
            let out = init.apply(&input)?;
            affected.extend(out.scales().filter(|n| !n.is_facet()));
            if let Some(facets) = out.facets {
                if facets.len() != state.facets.len() {
                    return Err(DataShapeError::FacetCountMismatch {
                        expected: state.facets.len(),
                        actual: facets.len(),
                    }
                    .into());
                }
                check_indices(&facets, state.data.len())?;
                state.facets = facets;
            }
            for channel in out.channels {
                if channel.values.len() != state.data.len() {
                    return Err(DataShapeError::LiteralLength {
                        channel: channel.name.into(),
                        expected: state.data.len(),
                        actual: channel.values.len(),
                    }
                    .into());
                }
                match state.channels.iter_mut().find(|c| c.name == channel.name) {
                    Some(slot) => *slot = channel,
                    None => state.channels.push(channel),
                }
            }
        }
        let mut seen = HashSet::new();
        affected.retain(|n| seen.insert(*n));
        for name in affected {
            let channels = bound(&marks, name);
            if let Some(spec) = infer(name, &channels, &options.scale_options(name))? {
                tracing::debug!(scale = %name, "scale inferred again after initializers");
                scales.insert(instantiate(&spec, &dims)?);
                trace.push(TraceEvent::ScaleFinalized(name));
            }
        }

        let values: Vec<Values> = marks
            .iter()
            .map(|m| {
                Values::encode(m.mark.renderer.channels(), &m.channels, &m.constants, &scales)
            })
            .collect();

        // Render: per cell, axes first, then marks in declaration order.
        let ticked: Vec<(&Axis, &Scale, Vec<Tick>)> = axes
            .iter()
            .filter_map(|a| {
                let scale = scales.get(a.scale)?;
                Some((a, scale, a.tick_labels(scale, locale, &cache)))
            })
            .collect();
        let frame = dims.frame(0, 0);
        let mut children = Vec::new();
        for cell in self.grid.cells() {
            let cell_frame = dims.frame(cell.col, cell.row);
            let mut content = Vec::new();
            for (axis, scale, ticks) in ticked.iter().filter(|(a, ..)| !a.scale.is_facet()) {
                if on_edge(&cell, axis.orient, &self.grid) {
                    content.push(axis.render(scale, frame, ticks));
                } else {
                    content.extend(axis.render_grid(scale, frame, ticks));
                }
            }
            for (state, values) in marks.iter().zip(&values) {
                let ctx = RenderContext {
                    frame,
                    cell: &cell,
                    dimensions: &dims,
                };
                let index = state.facets.get(cell.index).map_or(&[][..], |i| &i[..]);
                let node = state
                    .mark
                    .renderer
                    .render(index, &scales, values, &ctx);
                trace.push(TraceEvent::MarkRendered {
                    mark: state.mark.name(),
                    cell: cell.index,
                });
                content.extend(node.map(|n| {
                    if state.mark.clip {
                        clipped(n, frame)
                    } else {
                        n
                    }
                }));
            }
            children.push(Node::translated(
                "facet",
                cell_frame.x0 - frame.x0,
                cell_frame.y0 - frame.y0,
                content,
            ));
        }
        let facet_axes: Vec<Node> = ticked
            .iter()
            .filter(|(a, ..)| a.scale.is_facet())
            .map(|(axis, scale, ticks)| axis.render(scale, dims.grid_area(), ticks))
            .collect();
        if !facet_axes.is_empty() {
            children.push(Node::group("facet-axes", facet_axes));
        }

        // Legends and the caption stack below the plot.
        let mut bottom = dims.height;
        let legend_options = LegendOptions::default();
        for scale in scales.iter() {
            let wanted = self
                .scale_spec(scale.name())
                .is_some_and(|s| s.options().legend);
            if !wanted {
                continue;
            }
            if let Some(node) = legend(scale, &legend_options, locale, &cache) {
                let height = node.bounds().map_or(0.0, |b| b.y1) + legend_options.font_size;
                children.push(Node::translated(
                    "legend",
                    dims.margin.left,
                    bottom + BLOCK_GAP,
                    alloc::vec![node],
                ));
                bottom += BLOCK_GAP + height;
            }
        }
        if let Some(caption) = &options.caption {
            children.push(Node::Text(
                TextNode::new(Point::new(dims.margin.left, bottom + BLOCK_GAP), caption.clone())
                    .with_anchor(TextAnchor::Start)
                    .with_baseline(TextBaseline::Hanging)
                    .with_font_size(options.style.font_size),
            ));
            bottom += BLOCK_GAP + options.style.font_size * 1.5;
        }
        let height = bottom;
        if let Some(bg) = options.style.background {
            children.insert(
                0,
                Node::rect(Rect::new(0.0, 0.0, dims.width, height), Style::filled(bg)),
            );
        }

        tracing::debug!(
            marks = marks.len(),
            cells = self.grid.len(),
            scales = scales.len(),
            "rendered plot"
        );
        Ok(Figure {
            root: Node::group("plot", children),
            scales,
            dimensions: dims,
            trace,
            width: dims.width,
            height,
            locale: locale.clone(),
            style: options.style.clone(),
            cache,
        })
    }

    /// Plans the axes of every position scale that has one.
    fn axes(&self) -> Result<Vec<Axis>> {
        let options = self.options;
        let width = options.width.unwrap_or(DEFAULT_WIDTH);
        let height = options.height.unwrap_or(DEFAULT_HEIGHT);
        let mut out = Vec::new();
        for spec in self.specs.iter().filter(|s| s.name.is_position()) {
            let o = spec.options();
            let anchor = o.axis.unwrap_or_else(|| AxisAnchor::default_for(spec.name));
            for orient in anchor.orients(spec.name)? {
                let axis = if spec.name.is_facet() {
                    // Every facet value gets a label.
                    Axis::facet(spec.name, orient).with_tick_count(0)
                } else {
                    let extent = if spec.name == ScaleName::X {
                        width / 80.0
                    } else {
                        height / 35.0
                    };
                    #[allow(clippy::cast_possible_truncation, reason = "small positive counts")]
                    let count = o.ticks.unwrap_or((extent as usize).max(2));
                    Axis::new(spec.name, orient).with_tick_count(count)
                };
                let axis = axis
                    .with_title(spec.label.clone())
                    .with_tick_format(o.tick_format.clone());
                out.push(if o.grid.unwrap_or(false) {
                    axis.with_grid(GridStyle::default())
                } else {
                    axis
                });
            }
        }
        Ok(out)
    }
}

/// The smallest facet margin on the side of a facet axis.
fn facet_margin(orient: AxisOrient) -> f64 {
    match orient {
        AxisOrient::Top | AxisOrient::Bottom => 30.0,
        AxisOrient::Left | AxisOrient::Right => 40.0,
    }
}

/// Whether `cell` sits on the side of the grid an axis is drawn on.
fn on_edge(cell: &FacetCell, orient: AxisOrient, grid: &FacetGrid) -> bool {
    match orient {
        AxisOrient::Top => cell.row == 0,
        AxisOrient::Bottom => cell.row + 1 == grid.rows(),
        AxisOrient::Left => cell.col == 0,
        AxisOrient::Right => cell.col + 1 == grid.cols(),
    }
}

fn clipped(node: Node, frame: Rect) -> Node {
    Node::Group(Group {
        class: Some("clip".into()),
        transform: Affine::IDENTITY,
        clip: Some(frame),
        children: alloc::vec![node],
    })
}

/// Materializes `spec` with the pixel range of its position in the layout.
fn instantiate(spec: &ScaleSpec, dims: &Dimensions) -> Result<Scale> {
    let frame = dims.frame(0, 0);
    let grid = dims.grid_area();
    let (start, end) = spec.options().insets(spec.name);
    let pixels = match spec.name {
        ScaleName::X => Some((frame.x0 + start, frame.x1 - end)),
        // Discrete values run top-down; continuous values grow upward.
        ScaleName::Y if spec.is_band_or_point() => Some((frame.y0 + start, frame.y1 - end)),
        ScaleName::Y => Some((frame.y1 - end, frame.y0 + start)),
        ScaleName::Fx => Some((grid.x0, grid.x1)),
        ScaleName::Fy => Some((grid.y0, grid.y1)),
        _ => None,
    };
    Ok(spec.instantiate(pixels)?)
}

/// A rendered plot.
#[derive(Debug)]
pub struct Figure {
    /// The drawable tree.
    pub root: Node,
    /// The finalized scales.
    pub scales: Scales,
    /// The layout.
    pub dimensions: Dimensions,
    /// Render events, in order.
    pub trace: Vec<TraceEvent>,
    /// Outer width.
    pub width: f64,
    /// Outer height, including legends and the caption.
    pub height: f64,
    locale: Locale,
    style: PlotStyle,
    cache: FormatCache,
}

impl Figure {
    /// Returns a finalized scale.
    pub fn scale(&self, name: ScaleName) -> Option<&Scale> {
        self.scales.get(name)
    }

    /// Builds a standalone legend for a scale, or `None` if the scale has none.
    pub fn legend(&self, name: ScaleName, options: &LegendOptions) -> Option<Node> {
        legend(self.scales.get(name)?, options, &self.locale, &self.cache)
    }

    /// Returns the render events in the order they happened.
    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    /// Returns the formatter caches used by this figure's guides.
    pub fn format_cache(&self) -> &FormatCache {
        &self.cache
    }

    /// Serializes the figure to an SVG document.
    pub fn to_svg(&self) -> String {
        svg::to_svg(&self.root, self.width, self.height, &self.style.font_family)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use markplot_transforms::{Stack, Transform};

    use super::*;
    use crate::bar_mark::bar_y;
    use crate::dot_mark::dot;
    use crate::frame_mark::frame;
    use crate::initializer::{Initializer, InitializerOutput};

    fn points() -> Table {
        Table::from_columns([
            ("a", vec![Value::from(0.0), Value::from(10.0), Value::from(5.0)]),
            ("b", vec![Value::from(1.0), Value::from(2.0), Value::from(3.0)]),
            ("k", vec![Value::from("p"), Value::from("q"), Value::from("p")]),
        ])
        .expect("valid table")
    }

    #[test]
    fn scales_are_final_before_any_mark_renders() {
        let data = points();
        let options = PlotOptions::new()
            .with_facet(FacetOptions::new(data.clone()).with_x("k"))
            .with_mark(dot(data).x("a").y("b"))
            .with_mark(frame());
        let figure = plot(&options).expect("plot renders");
        let first_mark = figure
            .trace()
            .iter()
            .position(|e| matches!(e, TraceEvent::MarkRendered { .. }))
            .expect("marks rendered");
        assert!(figure.trace()[first_mark..]
            .iter()
            .all(|e| matches!(e, TraceEvent::MarkRendered { .. })));
        // Two marks in two cells.
        assert_eq!(figure.trace().len() - first_mark, 4);
        assert!(figure.scale(ScaleName::Fx).is_some());
    }

    #[test]
    fn faceted_rows_land_in_their_cells() {
        let data = points();
        let options = PlotOptions::new()
            .with_facet(FacetOptions::new(data.clone()).with_x("k"))
            .with_mark(dot(data).x("a").y("b"));
        let collected = collect(&options).expect("collects");
        assert_eq!(collected.grid().len(), 2);
        assert_eq!(collected.mark_facets(0), Some(&[vec![0, 2], vec![1]][..]));
    }

    #[test]
    fn unrelated_data_is_drawn_in_every_cell() {
        let data = points();
        let other = Table::from_columns([("a", vec![Value::from(3.0)])]).expect("valid table");
        let options = PlotOptions::new()
            .with_facet(FacetOptions::new(data.clone()).with_x("k"))
            .with_mark(dot(data).x("a"))
            .with_mark(dot(other).x("a"));
        let collected = collect(&options).expect("collects");
        assert_eq!(collected.mark_facets(1), Some(&[vec![0], vec![0]][..]));
    }

    #[test]
    fn included_marks_must_align_with_the_facet_data() {
        let data = points();
        let short = Table::from_columns([("a", vec![Value::from(3.0)])]).expect("valid table");
        let options = PlotOptions::new()
            .with_facet(FacetOptions::new(data).with_x("k"))
            .with_mark(dot(short).x("a").with_facet(FacetMode::Include));
        assert!(matches!(
            collect(&options),
            Err(PlotError::DataShape(DataShapeError::FacetDataLength {
                expected: 3,
                actual: 1
            }))
        ));
    }

    #[test]
    fn transforms_must_keep_the_facet_count() {
        let drop_facets = Transform::custom(|data: &Table, _: &[Index]| Ok((data.clone(), Vec::new())));
        let options = PlotOptions::new().with_mark(dot(points()).x("a").with_transform(drop_facets));
        assert!(matches!(
            collect(&options),
            Err(PlotError::DataShape(DataShapeError::FacetCountMismatch {
                expected: 1,
                actual: 0
            }))
        ));
    }

    #[test]
    fn initializer_channels_reinfer_their_scale() {
        let init = Initializer::custom(|input| {
            let r = (0..input.data.len()).map(|i| Value::from(i as f64 * 10.0)).collect::<Vec<_>>();
            Ok(InitializerOutput {
                facets: None,
                channels: vec![Channel::new("r", r, ScaleBinding::Scale(ScaleName::R))],
            })
        });
        let options = PlotOptions::new().with_mark(dot(points()).x("a").with_initializer(init));
        let figure = plot(&options).expect("plot renders");
        let r = figure.scale(ScaleName::R).expect("r scale");
        assert_eq!(r.domain(), vec![Value::from(0.0), Value::from(20.0)]);
        assert!(figure.trace().contains(&TraceEvent::ScaleFinalized(ScaleName::R)));
    }

    #[test]
    fn excluded_stacks_restart_in_every_cell() {
        let data = Table::from_columns([
            ("f", vec![Value::from("A"), Value::from("B"), Value::from("C")]),
            ("k", vec![Value::from("x"), Value::from("x"), Value::from("x")]),
            ("v", vec![Value::from(1.0), Value::from(10.0), Value::from(100.0)]),
        ])
        .expect("valid table");
        let bars = bar_y(data.clone())
            .x("k")
            .with_channel("y1", "y1")
            .with_channel("y2", "y2")
            .with_transform(Transform::Stack(Stack::new("v", "k")))
            .with_facet(FacetMode::Exclude);
        let options = PlotOptions::new()
            .with_facet(FacetOptions::new(data).with_x("f"))
            .with_mark(bars);
        let collected = collect(&options).expect("collects");
        let out = collected.mark_data(0).expect("one mark");
        let (y1, y2) = (
            out.column("y1").expect("stack start"),
            out.column("y2").expect("stack end"),
        );
        let spans: Vec<Vec<(f64, f64)>> = collected
            .mark_facets(0)
            .expect("one mark")
            .iter()
            .map(|cell| {
                cell.iter()
                    .map(|&r| (y1[r].as_f64().unwrap_or(f64::NAN), y2[r].as_f64().unwrap_or(f64::NAN)))
                    .collect()
            })
            .collect();
        assert_eq!(
            spans,
            vec![
                vec![(0.0, 10.0), (10.0, 110.0)],
                vec![(0.0, 1.0), (1.0, 101.0)],
                vec![(0.0, 1.0), (1.0, 11.0)],
            ]
        );
        assert!(plot(&options).is_ok());
    }

    #[test]
    fn initializer_channels_must_align_with_the_data() {
        let init = Initializer::custom(|_| {
            Ok(InitializerOutput {
                facets: None,
                channels: vec![Channel::new(
                    "r",
                    vec![Value::from(4.0)],
                    ScaleBinding::Scale(ScaleName::R),
                )],
            })
        });
        let options = PlotOptions::new().with_mark(dot(points()).x("a").with_initializer(init));
        assert!(matches!(
            plot(&options),
            Err(PlotError::DataShape(DataShapeError::LiteralLength {
                expected: 3,
                actual: 1,
                ..
            }))
        ));
    }

    #[test]
    fn plot_defaults_merge_into_position_scales() {
        let options = PlotOptions::new()
            .with_grid(true)
            .with_axis(AxisAnchor::Top)
            .with_x(ScaleOptions::new().with_grid(false));
        assert_eq!(options.scale_options(ScaleName::X).grid, Some(false));
        assert_eq!(options.scale_options(ScaleName::Y).grid, Some(true));
        assert_eq!(options.scale_options(ScaleName::X).axis, Some(AxisAnchor::Top));
        // `top` does not fit a vertical scale and is left to the default.
        assert_eq!(options.scale_options(ScaleName::Y).axis, None);
        assert_eq!(options.scale_options(ScaleName::Color).grid, None);
    }

    #[test]
    fn invalid_axis_for_a_scale_is_rejected() {
        let options = PlotOptions::new()
            .with_y(ScaleOptions::new().with_axis(AxisAnchor::Bottom))
            .with_mark(dot(points()).y("b"));
        assert!(matches!(
            plot(&options),
            Err(PlotError::Configuration(
                markplot_core::ConfigurationError::InvalidAxis(_)
            ))
        ));
    }
}
