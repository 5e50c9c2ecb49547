// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A declarative mark/scale/facet plotting grammar.
//!
//! A plot is a list of [`Mark`]s over tabular data plus [`PlotOptions`]. Building it runs in two
//! phases:
//! - **Collect** ([`collect`]): facet partitioning, transforms, channel resolution and scale
//!   inference. Every mark's channels bound to the same scale name contribute to one shared
//!   domain.
//! - **Render** ([`Collected::render`]): guide measurement, layout, scale materialization,
//!   initializers, then marks, axes and legends.
//!
//! The result is a [`Figure`] holding an immutable [`Node`](markplot_core::Node) tree, which
//! [`Figure::to_svg`] serializes.
//!
//! ```
//! use markplot::{PlotOptions, dot};
//! use markplot_core::{Table, Value};
//!
//! let data = Table::from_columns([
//!     ("x", vec![Value::from(1.0), Value::from(2.0), Value::from(3.0)]),
//!     ("y", vec![Value::from(4.0), Value::from(1.0), Value::from(2.0)]),
//! ])?;
//! let figure = markplot::plot(&PlotOptions::new().with_mark(dot(data).x("x").y("y")))?;
//! assert!(figure.to_svg().starts_with("<svg"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![no_std]

extern crate alloc;

mod area_mark;
mod axis;
mod bar_mark;
mod color;
mod dimensions;
mod dot_mark;
mod error;
mod facet;
#[cfg(not(feature = "std"))]
mod float;
mod format;
mod frame_mark;
mod initializer;
mod legend;
mod line_mark;
mod mark;
mod measure;
mod plot;
mod rounding;
mod rule_mark;
mod scale;
mod scale_infer;
mod svg;
mod symbol;
mod text_mark;
mod time;

pub use area_mark::{AreaY, area_y};
pub use axis::{Axis, AxisAnchor, AxisOrient, AxisStyle, GridStyle, StrokeStyle, Tick};
pub use bar_mark::{BarX, BarY, Cell, bar_x, bar_y, cell};
pub use color::{Ramp, SchemeName, parse_css};
pub use dimensions::{
    DEFAULT_HEIGHT, DEFAULT_WIDTH, DimensionOptions, Dimensions, GridShape, Margins,
};
pub use dot_mark::{Dot, dot};
pub use error::{PlotError, Result};
pub use facet::{
    FacetCell, FacetGrid, FacetGroup, FacetGroups, FacetMode, FacetOptions, broadcast, exclude,
    partition, reindex,
};
pub use format::{FormatCache, Locale, Memo1, NumberFormat, TimeFormat};
pub use frame_mark::{Frame, frame};
pub use initializer::{Initializer, InitializerFn, InitializerInput, InitializerOutput};
pub use legend::{LegendItem, LegendOptions, Swatch, legend, legend_items};
pub use line_mark::{Curve, Line, line};
pub use mark::{ChannelDef, Mark, MarkRenderer, RenderContext, Values};
pub use measure::{HeuristicTextMeasurer, TextMeasurer};
pub use plot::{Collected, Figure, PlotOptions, PlotStyle, TraceEvent, collect, plot};
pub use rounding::Rounding;
pub use rule_mark::{RuleX, RuleY, TickX, rule_x, rule_y, tick_x};
pub use scale::{Band, ColorRamp, Continuous, Encoded, Mapping, Ordinal, Scale, ScaleKind, Scales};
pub use scale_infer::{
    ScaleInterval, ScaleOptions, ScaleSpec, SpecDomain, TickFormatter, infer, resolve_binding,
};
pub use symbol::Symbol;
pub use text_mark::{Text, text};
pub use time::{TimeInterval, TimeUnit};
