// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scale inference: type, domain and range from the channels bound to a scale.
//!
//! Inference runs once per scale name over every channel of every mark bound to it, so a
//! scale's domain always covers all of its contributors. The result is a [`ScaleSpec`] (domain
//! and options, no pixel range yet) which is instantiated once the layout is known.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashSet;
use markplot_core::{
    Channel, ConfigurationError, MS_PER_DAY, ScaleBinding, ScaleName, ScaleType, Value, ValueKey,
    ValueKind,
};
use markplot_transforms::SortOrder;

use crate::axis::AxisAnchor;
use crate::color::{Ramp, SchemeName, parse_css, require_css};
#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::scale::{
    Band, ColorRamp, Continuous, Encoded, Mapping, Ordinal, Scale, ScaleKind, nice_linear,
    nice_log,
};
use crate::symbol::Symbol;
use crate::time::{self, TimeInterval};

/// Formats a tick value into label text.
pub type TickFormatter = Arc<dyn Fn(&Value) -> alloc::string::String + Send + Sync>;

/// A regular interval of a scale's domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleInterval {
    /// Multiples of a number.
    Step(f64),
    /// A calendar interval.
    Time(TimeInterval),
}

impl ScaleInterval {
    fn floor(self, x: f64) -> f64 {
        match self {
            Self::Step(s) => (x / s).floor() * s,
            #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
            Self::Time(t) => t.floor(x as i64) as f64,
        }
    }

    fn ceil(self, x: f64) -> f64 {
        match self {
            Self::Step(s) => (x / s).ceil() * s,
            #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
            Self::Time(t) => t.ceil(x as i64) as f64,
        }
    }

    fn next(self, x: f64) -> f64 {
        match self {
            Self::Step(s) => x + s,
            #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
            Self::Time(t) => t.offset(x as i64, 1) as f64,
        }
    }
}

/// Options of one scale.
///
/// Every field is optional; unset fields are inferred from the bound channels or inherited from
/// the plot-level defaults.
#[derive(Clone, Default)]
pub struct ScaleOptions {
    /// Scale type; inferred when `None`.
    pub scale_type: Option<ScaleType>,
    /// Explicit domain.
    pub domain: Option<Vec<Value>>,
    /// Explicit range (pixels, numbers, CSS colors or symbol names).
    pub range: Option<Vec<Value>>,
    /// Output for undefined or out-of-domain values; such rows are skipped when `None`.
    pub unknown: Option<Value>,
    /// Reverses the domain.
    pub reverse: bool,
    /// Clamps continuous inputs to the domain.
    pub clamp: Option<bool>,
    /// Extends continuous domains to nice round values.
    pub nice: Option<bool>,
    /// Forces continuous domains to include zero.
    pub zero: Option<bool>,
    /// Multiplies values by 100 and marks the label as a percentage.
    pub percent: bool,
    /// Color scheme.
    pub scheme: Option<SchemeName>,
    /// Pivot of a diverging scale (default 0).
    pub pivot: Option<f64>,
    /// Exponent of a pow scale (default 1).
    pub exponent: Option<f64>,
    /// Base of a log scale (default 10).
    pub base: Option<f64>,
    /// Linear constant of a symlog scale (default 1).
    pub constant: Option<f64>,
    /// Regular interval: fills discrete domains and aligns continuous ones.
    pub interval: Option<ScaleInterval>,
    /// Band/point padding (inner and outer).
    pub padding: Option<f64>,
    /// Band inner padding.
    pub padding_inner: Option<f64>,
    /// Band/point outer padding.
    pub padding_outer: Option<f64>,
    /// Band/point alignment in `[0, 1]`.
    pub align: Option<f64>,
    /// Inset on both sides of a position range.
    pub inset: Option<f64>,
    /// Inset on the left of an `x` range.
    pub inset_left: Option<f64>,
    /// Inset on the right of an `x` range.
    pub inset_right: Option<f64>,
    /// Inset on the top of a `y` range.
    pub inset_top: Option<f64>,
    /// Inset on the bottom of a `y` range.
    pub inset_bottom: Option<f64>,
    /// Rounds pixel outputs to integers.
    pub round: Option<bool>,
    /// Axis/legend label; inferred from the first labelled channel when `None`.
    pub label: Option<Arc<str>>,
    /// Sorts a discrete domain (first-seen order otherwise).
    pub sort: Option<SortOrder>,
    /// Axis placement.
    pub axis: Option<AxisAnchor>,
    /// Draws grid lines.
    pub grid: Option<bool>,
    /// Approximate tick count.
    pub ticks: Option<usize>,
    /// Tick label formatter.
    pub tick_format: Option<TickFormatter>,
    /// Includes a legend in the figure.
    pub legend: bool,
}

impl fmt::Debug for ScaleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaleOptions")
            .field("scale_type", &self.scale_type)
            .field("domain", &self.domain)
            .field("range", &self.range)
            .field("unknown", &self.unknown)
            .field("reverse", &self.reverse)
            .field("clamp", &self.clamp)
            .field("nice", &self.nice)
            .field("zero", &self.zero)
            .field("percent", &self.percent)
            .field("scheme", &self.scheme)
            .field("pivot", &self.pivot)
            .field("exponent", &self.exponent)
            .field("base", &self.base)
            .field("constant", &self.constant)
            .field("interval", &self.interval)
            .field("padding", &self.padding)
            .field("padding_inner", &self.padding_inner)
            .field("padding_outer", &self.padding_outer)
            .field("align", &self.align)
            .field("inset", &self.inset)
            .field("inset_left", &self.inset_left)
            .field("inset_right", &self.inset_right)
            .field("inset_top", &self.inset_top)
            .field("inset_bottom", &self.inset_bottom)
            .field("round", &self.round)
            .field("label", &self.label)
            .field("sort", &self.sort)
            .field("axis", &self.axis)
            .field("grid", &self.grid)
            .field("ticks", &self.ticks)
            .field("tick_format", &self.tick_format.is_some())
            .field("legend", &self.legend)
            .finish()
    }
}

impl ScaleOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scale type.
    pub fn with_type(mut self, scale_type: ScaleType) -> Self {
        self.scale_type = Some(scale_type);
        self
    }

    /// Sets an explicit domain.
    pub fn with_domain<I>(mut self, domain: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.domain = Some(domain.into_iter().map(Into::into).collect());
        self
    }

    /// Sets an explicit range.
    pub fn with_range<I>(mut self, range: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.range = Some(range.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the output for unknown values.
    pub fn with_unknown(mut self, unknown: impl Into<Value>) -> Self {
        self.unknown = Some(unknown.into());
        self
    }

    /// Reverses the domain.
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Sets clamping.
    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = Some(clamp);
        self
    }

    /// Sets domain niceing.
    pub fn with_nice(mut self, nice: bool) -> Self {
        self.nice = Some(nice);
        self
    }

    /// Sets whether the domain includes zero.
    pub fn with_zero(mut self, zero: bool) -> Self {
        self.zero = Some(zero);
        self
    }

    /// Sets percent mode.
    pub fn with_percent(mut self, percent: bool) -> Self {
        self.percent = percent;
        self
    }

    /// Sets the color scheme.
    pub fn with_scheme(mut self, scheme: SchemeName) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Sets the pivot of a diverging scale.
    pub fn with_pivot(mut self, pivot: f64) -> Self {
        self.pivot = Some(pivot);
        self
    }

    /// Sets the exponent of a pow scale.
    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = Some(exponent);
        self
    }

    /// Sets the base of a log scale.
    pub fn with_base(mut self, base: f64) -> Self {
        self.base = Some(base);
        self
    }

    /// Sets the constant of a symlog scale.
    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = Some(constant);
        self
    }

    /// Sets the domain interval.
    pub fn with_interval(mut self, interval: ScaleInterval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Sets band/point padding.
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Sets band inner and outer padding separately.
    pub fn with_paddings(mut self, inner: f64, outer: f64) -> Self {
        self.padding_inner = Some(inner);
        self.padding_outer = Some(outer);
        self
    }

    /// Sets band/point alignment.
    pub fn with_align(mut self, align: f64) -> Self {
        self.align = Some(align);
        self
    }

    /// Sets the inset on both sides of the range.
    pub fn with_inset(mut self, inset: f64) -> Self {
        self.inset = Some(inset);
        self
    }

    /// Sets pixel rounding.
    pub fn with_round(mut self, round: bool) -> Self {
        self.round = Some(round);
        self
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sorts the discrete domain.
    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort = Some(order);
        self
    }

    /// Sets the axis placement.
    pub fn with_axis(mut self, axis: AxisAnchor) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Draws grid lines.
    pub fn with_grid(mut self, grid: bool) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Sets the approximate tick count.
    pub fn with_ticks(mut self, ticks: usize) -> Self {
        self.ticks = Some(ticks);
        self
    }

    /// Sets a tick label formatter.
    pub fn with_tick_format(
        mut self,
        f: impl Fn(&Value) -> alloc::string::String + Send + Sync + 'static,
    ) -> Self {
        self.tick_format = Some(Arc::new(f));
        self
    }

    /// Includes a legend for this scale.
    pub fn with_legend(mut self, legend: bool) -> Self {
        self.legend = legend;
        self
    }

    /// Returns the `(start, end)` insets for a position scale.
    pub(crate) fn insets(&self, name: ScaleName) -> (f64, f64) {
        let both = self.inset.unwrap_or(0.0);
        match name {
            ScaleName::Y | ScaleName::Fy => (
                self.inset_top.unwrap_or(both),
                self.inset_bottom.unwrap_or(both),
            ),
            _ => (
                self.inset_left.unwrap_or(both),
                self.inset_right.unwrap_or(both),
            ),
        }
    }
}

/// An inferred domain, before a range is attached.
#[derive(Clone, Debug, PartialEq)]
pub enum SpecDomain {
    /// Continuous stops (two, or three with a diverging pivot), in domain units.
    Continuous(Vec<f64>),
    /// Ordered discrete values.
    Discrete(Vec<Value>),
    /// Values pass through.
    Identity,
}

/// A scale with an inferred type and domain but no range yet.
#[derive(Clone, Debug)]
pub struct ScaleSpec {
    /// Scale name.
    pub name: ScaleName,
    /// Resolved type.
    pub scale_type: ScaleType,
    /// Merged domain.
    pub domain: SpecDomain,
    /// Axis/legend label.
    pub label: Option<Arc<str>>,
    pub(crate) options: ScaleOptions,
    pub(crate) coerce_text: bool,
    pub(crate) temporal: bool,
}

/// Run-time kinds observed across a scale's channels.
#[derive(Clone, Copy, Debug, Default)]
struct Kinds {
    numbers: bool,
    dates: bool,
    texts: bool,
}

impl Kinds {
    fn observe(&mut self, v: &Value) {
        match v.kind() {
            ValueKind::Number => self.numbers = true,
            ValueKind::Date => self.dates = true,
            ValueKind::Text | ValueKind::Bool => self.texts = true,
            ValueKind::Undefined => {}
        }
    }

    fn is_mixed(self) -> bool {
        self.texts && (self.numbers || self.dates)
    }
}

/// Resolves the scale a channel binds to.
///
/// An [`ScaleBinding::Auto`] channel stays unscaled when every defined value is already a
/// literal for its scale: CSS colors for `color`, symbol names for `symbol`.
pub fn resolve_binding(channel: &Channel) -> Option<ScaleName> {
    match channel.scale {
        ScaleBinding::Scale(name) => Some(name),
        ScaleBinding::Unscaled => None,
        ScaleBinding::Auto(name) => {
            let literal: fn(&str) -> bool = match name {
                ScaleName::Color => |s| parse_css(s).is_some(),
                ScaleName::Symbol => |s| s.parse::<Symbol>().is_ok(),
                _ => return Some(name),
            };
            let mut defined = channel.values.iter().filter(|v| v.is_defined()).peekable();
            let all_literal = defined.peek().is_some()
                && defined.all(|v| v.as_str().is_some_and(literal));
            (!all_literal).then_some(name)
        }
    }
}

/// Infers the spec of scale `name` from every channel bound to it.
///
/// Returns `None` when nothing binds to the scale and no domain is given.
pub fn infer(
    name: ScaleName,
    channels: &[&Channel],
    options: &ScaleOptions,
) -> Result<Option<ScaleSpec>, ConfigurationError> {
    if channels.is_empty() && options.domain.is_none() {
        return Ok(None);
    }
    let mut kinds = Kinds::default();
    match &options.domain {
        Some(domain) => domain.iter().for_each(|v| kinds.observe(v)),
        None => channels
            .iter()
            .flat_map(|c| c.values.iter())
            .for_each(|v| kinds.observe(v)),
    }
    let band = channels.iter().any(|c| c.hint.band);
    let zero_hint = channels.iter().any(|c| c.hint.zero);

    let mut coerce_text = false;
    if kinds.is_mixed() {
        tracing::warn!(
            scale = %name,
            "scale receives both text and numeric or temporal values; coercing to text"
        );
        coerce_text = true;
    } else if kinds.numbers && kinds.dates {
        tracing::warn!(scale = %name, "scale receives both numbers and dates; treating dates as numbers");
    }

    let scale_type = match options.scale_type {
        Some(t) => {
            validate_type(name, t, kinds)?;
            if t.is_continuous() && kinds.texts {
                if coerce_text {
                    tracing::warn!(scale = %name, scale_type = %t, "ignoring text values bound to a continuous scale");
                }
                coerce_text = false;
            }
            t
        }
        None => infer_type(name, kinds, band, coerce_text, options),
    };
    let temporal = scale_type.is_temporal()
        || (kinds.dates && !kinds.numbers && !kinds.texts && scale_type.is_continuous());

    let domain = if scale_type == ScaleType::Identity {
        SpecDomain::Identity
    } else if scale_type.is_continuous() {
        let zero = options.zero.unwrap_or(
            zero_hint
                || (matches!(name, ScaleName::R | ScaleName::Length)
                    && options.scale_type.is_none()),
        );
        SpecDomain::Continuous(continuous_domain(
            name,
            scale_type,
            channels,
            options,
            zero,
            temporal,
        )?)
    } else {
        SpecDomain::Discrete(discrete_domain(channels, options, coerce_text))
    };

    let label = options
        .label
        .clone()
        .or_else(|| channels.iter().find_map(|c| c.label.clone()))
        .map(|l| {
            if options.percent {
                Arc::from(alloc::format!("{l} (%)").as_str())
            } else {
                l
            }
        });

    tracing::debug!(
        scale = %name,
        scale_type = %scale_type,
        channels = channels.len(),
        ?domain,
        "inferred scale"
    );
    Ok(Some(ScaleSpec {
        name,
        scale_type,
        domain,
        label,
        options: options.clone(),
        coerce_text,
        temporal,
    }))
}

fn validate_type(
    name: ScaleName,
    t: ScaleType,
    kinds: Kinds,
) -> Result<(), ConfigurationError> {
    let incompatible = |reason| ConfigurationError::IncompatibleScaleType {
        scale: name,
        scale_type: t,
        reason,
    };
    if t.is_continuous() && kinds.texts && !kinds.numbers && !kinds.dates {
        return Err(incompatible("text values need a discrete scale"));
    }
    if matches!(t, ScaleType::Band | ScaleType::Point) && !name.is_position() {
        return Err(incompatible("band and point scales are positional"));
    }
    if matches!(
        t,
        ScaleType::Sequential | ScaleType::Diverging | ScaleType::Categorical
    ) && name != ScaleName::Color
    {
        return Err(incompatible("color scale types apply to color only"));
    }
    // Cell gaps come from band padding; a point scale has no bands to lay cells out on.
    if name.is_facet() && t != ScaleType::Band {
        return Err(incompatible("facet scales are band scales"));
    }
    Ok(())
}

fn infer_type(
    name: ScaleName,
    kinds: Kinds,
    band: bool,
    coerce_text: bool,
    options: &ScaleOptions,
) -> ScaleType {
    if name.is_facet() {
        return ScaleType::Band;
    }
    let discrete = coerce_text || (kinds.texts && !kinds.numbers && !kinds.dates);
    match name {
        ScaleName::X | ScaleName::Y if discrete || band => {
            if band {
                ScaleType::Band
            } else {
                ScaleType::Point
            }
        }
        ScaleName::X | ScaleName::Y if kinds.dates && !kinds.numbers => ScaleType::Utc,
        ScaleName::Color if discrete => ScaleType::Categorical,
        ScaleName::Color
            if options.pivot.is_some()
                || matches!(
                    options.scheme,
                    Some(SchemeName::RedBlue | SchemeName::BlueOrange)
                ) =>
        {
            ScaleType::Diverging
        }
        ScaleName::Color if options.scheme.is_some_and(SchemeName::is_discrete) => {
            ScaleType::Categorical
        }
        ScaleName::Color => ScaleType::Sequential,
        ScaleName::Symbol => ScaleType::Ordinal,
        _ if discrete => ScaleType::Ordinal,
        ScaleName::R => ScaleType::Sqrt,
        _ => ScaleType::Linear,
    }
}

fn numbers<'a>(
    channels: &'a [&Channel],
    percent: bool,
) -> impl Iterator<Item = f64> + 'a {
    let factor = if percent { 100.0 } else { 1.0 };
    channels
        .iter()
        .flat_map(|c| c.values.iter())
        .filter_map(move |v| match v {
            Value::Number(n) if n.is_finite() => Some(n * factor),
            other => other.as_f64(),
        })
}

fn continuous_domain(
    name: ScaleName,
    t: ScaleType,
    channels: &[&Channel],
    options: &ScaleOptions,
    zero: bool,
    temporal: bool,
) -> Result<Vec<f64>, ConfigurationError> {
    let explicit: Option<Vec<f64>> = options.domain.as_ref().and_then(|d| {
        let v: Vec<f64> = d.iter().filter_map(Value::as_f64).collect();
        (v.len() >= 2).then_some(v)
    });
    let base = options.base.unwrap_or(10.0);
    if let Some(domain) = explicit {
        check_log(name, t, &domain)?;
        let mut domain = domain;
        if options.reverse {
            domain.reverse();
        }
        return Ok(domain);
    }

    let (mut lo, mut hi) = numbers(channels, options.percent)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
    if !(lo.is_finite() && hi.is_finite()) {
        (lo, hi) = if t == ScaleType::Log { (1.0, base) } else { (0.0, 1.0) };
    }
    if zero && t != ScaleType::Log && !temporal {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    check_log(name, t, &[lo, hi])?;
    if lo == hi {
        (lo, hi) = if temporal {
            let day = MS_PER_DAY as f64;
            (lo - day, hi + day)
        } else if t == ScaleType::Log && lo < 0.0 {
            (lo * base, hi / base)
        } else if t == ScaleType::Log {
            (lo / base, hi * base)
        } else {
            (lo - 1.0, hi + 1.0)
        };
    }
    if let Some(interval) = options.interval {
        lo = interval.floor(lo);
        hi = interval.ceil(hi);
    }
    if options.nice.unwrap_or(false) {
        (lo, hi) = if temporal {
            #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
            let interval = time::tick_interval(lo as i64, hi as i64, 10);
            #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
            let nice = (interval.floor(lo as i64) as f64, interval.ceil(hi as i64) as f64);
            nice
        } else if t == ScaleType::Log {
            if lo < 0.0 {
                let (a, b) = nice_log(-hi, -lo, base);
                (-b, -a)
            } else {
                nice_log(lo, hi, base)
            }
        } else {
            nice_linear(lo, hi, 10)
        };
    }
    let mut domain = if t == ScaleType::Diverging {
        let pivot = options.pivot.unwrap_or(0.0);
        alloc::vec![lo.min(pivot), pivot, hi.max(pivot)]
    } else {
        alloc::vec![lo, hi]
    };
    if options.reverse {
        domain.reverse();
    }
    Ok(domain)
}

fn check_log(name: ScaleName, t: ScaleType, domain: &[f64]) -> Result<(), ConfigurationError> {
    if t != ScaleType::Log {
        return Ok(());
    }
    let (min, max) = domain
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    if min <= 0.0 && max >= 0.0 {
        return Err(ConfigurationError::LogDomainCrossesZero {
            scale: name,
            min,
            max,
        });
    }
    Ok(())
}

fn discrete_domain(channels: &[&Channel], options: &ScaleOptions, coerce_text: bool) -> Vec<Value> {
    let prepare = |v: &Value| {
        if coerce_text {
            Value::Text(v.to_text())
        } else {
            v.clone()
        }
    };
    let mut seen: HashSet<ValueKey> = HashSet::new();
    let mut domain: Vec<Value> = Vec::new();
    let explicit = options.domain.is_some();
    let source: Vec<&Value> = match &options.domain {
        Some(d) => d.iter().collect(),
        None => channels
            .iter()
            .flat_map(|c| c.values.iter())
            .filter(|v| v.is_defined())
            .collect(),
    };
    for v in source {
        let v = prepare(v);
        if seen.insert(v.key()) {
            domain.push(v);
        }
    }
    if !explicit {
        if let Some(interval) = options.interval {
            domain = fill_interval(domain, interval);
        }
        if let Some(order) = options.sort {
            domain.sort_by(|a, b| match order {
                SortOrder::Asc => a.natural_cmp(b),
                SortOrder::Desc => b.natural_cmp(a),
            });
        }
    }
    if options.reverse {
        domain.reverse();
    }
    domain
}

/// Replaces a numeric or temporal domain with every interval step between its extremes.
fn fill_interval(domain: Vec<Value>, interval: ScaleInterval) -> Vec<Value> {
    let dates = domain.iter().all(|v| v.kind() == ValueKind::Date);
    let (lo, hi) = domain
        .iter()
        .filter_map(Value::as_f64)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
    if !(lo.is_finite() && hi.is_finite()) || domain.iter().any(|v| v.as_f64().is_none()) {
        return domain;
    }
    let mut out = Vec::new();
    let mut x = interval.floor(lo);
    while x <= hi && out.len() < 10_000 {
        out.push(if dates {
            #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
            Value::Date(x as i64)
        } else {
            Value::Number(x)
        });
        let next = interval.next(x);
        if next <= x {
            break;
        }
        x = next;
    }
    out
}

impl ScaleSpec {
    /// Returns the domain as values (dates for temporal scales).
    pub fn domain_values(&self) -> Vec<Value> {
        match &self.domain {
            SpecDomain::Continuous(d) => d
                .iter()
                .map(|&x| {
                    if self.temporal {
                        #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
                        Value::Date(x as i64)
                    } else {
                        Value::Number(x)
                    }
                })
                .collect(),
            SpecDomain::Discrete(d) => d.clone(),
            SpecDomain::Identity => Vec::new(),
        }
    }

    /// Returns the options this spec was inferred with.
    pub fn options(&self) -> &ScaleOptions {
        &self.options
    }

    /// Returns `true` for band and point types.
    pub fn is_band_or_point(&self) -> bool {
        matches!(self.scale_type, ScaleType::Band | ScaleType::Point)
    }

    /// Materializes the scale.
    ///
    /// Position scales take their pixel range from `pixels` unless the options give an explicit
    /// range; other scales ignore it.
    pub fn instantiate(&self, pixels: Option<(f64, f64)>) -> Result<Scale, ConfigurationError> {
        let o = &self.options;
        let kind = match &self.domain {
            SpecDomain::Identity => ScaleKind::Identity,
            SpecDomain::Continuous(domain) => self.continuous_kind(domain, pixels)?,
            SpecDomain::Discrete(domain) => self.discrete_kind(domain, pixels)?,
        };
        let unknown = match &o.unknown {
            Some(v) => Some(self.encode_literal(v)?),
            None => None,
        };
        let mut scale = Scale::new(self.name, self.scale_type, kind)
            .with_label(self.label.clone())
            .with_unknown(unknown);
        scale.percent = o.percent;
        scale.coerce_text = self.coerce_text;
        Ok(scale)
    }

    fn mapping(&self, domain: &[f64]) -> Mapping {
        let o = &self.options;
        match self.scale_type {
            ScaleType::Pow => Mapping::Pow(o.exponent.unwrap_or(1.0)),
            ScaleType::Sqrt => Mapping::Pow(0.5),
            ScaleType::Log => Mapping::Log {
                base: o.base.unwrap_or(10.0),
                negative: domain.iter().all(|&x| x < 0.0),
            },
            ScaleType::Symlog => Mapping::Symlog(o.constant.unwrap_or(1.0)),
            _ => Mapping::Linear,
        }
    }

    fn numeric_range(&self) -> Option<Vec<f64>> {
        let range = self.options.range.as_ref()?;
        let v: Vec<f64> = range.iter().filter_map(Value::as_f64).collect();
        (v.len() >= 2).then_some(v)
    }

    fn continuous_kind(
        &self,
        domain: &[f64],
        pixels: Option<(f64, f64)>,
    ) -> Result<ScaleKind, ConfigurationError> {
        let o = &self.options;
        let mapping = self.mapping(domain);
        if self.name == ScaleName::Color {
            let unit: Vec<f64> = if domain.len() == 3 {
                alloc::vec![0.0, 0.5, 1.0]
            } else {
                alloc::vec![0.0, 1.0]
            };
            let position = Continuous::new(mapping, domain.to_vec(), unit)
                .with_clamp(true)
                .with_temporal(self.temporal);
            let ramp = match &o.range {
                Some(colors) if colors.len() >= 2 => Ramp::new(
                    colors
                        .iter()
                        .map(|c| require_css(&c.to_text()))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                _ => o
                    .scheme
                    .unwrap_or(if self.scale_type == ScaleType::Diverging {
                        SchemeName::RedBlue
                    } else {
                        SchemeName::Viridis
                    })
                    .ramp(),
            };
            return Ok(ScaleKind::Ramp(ColorRamp::new(position, ramp)));
        }
        let range = match (self.numeric_range(), pixels) {
            (Some(r), _) => r,
            (None, Some((r0, r1))) if self.name.is_position() => alloc::vec![r0, r1],
            (None, _) => match self.name {
                ScaleName::R => alloc::vec![0.0, 8.0],
                ScaleName::Opacity => alloc::vec![0.0, 1.0],
                ScaleName::Length => alloc::vec![0.0, 12.0],
                _ => alloc::vec![0.0, 1.0],
            },
        };
        let range = if domain.len() == 3 && range.len() == 2 {
            alloc::vec![range[0], (range[0] + range[1]) / 2.0, range[1]]
        } else {
            range
        };
        Ok(ScaleKind::Continuous(
            Continuous::new(mapping, domain.to_vec(), range)
                .with_clamp(o.clamp.unwrap_or(false))
                .with_round(o.round.unwrap_or(false))
                .with_temporal(self.temporal),
        ))
    }

    fn discrete_kind(
        &self,
        domain: &[Value],
        pixels: Option<(f64, f64)>,
    ) -> Result<ScaleKind, ConfigurationError> {
        let o = &self.options;
        if self.is_band_or_point() {
            let (r0, r1) = match self.numeric_range() {
                Some(r) => (r[0], r[r.len() - 1]),
                None => pixels.unwrap_or((0.0, 1.0)),
            };
            let band = if self.scale_type == ScaleType::Band {
                let padding = o.padding.unwrap_or(0.1);
                // Facet bands span the grid edge to edge so each band is exactly one cell.
                let outer = if self.name.is_facet() { 0.0 } else { padding };
                Band::new(domain.to_vec(), (r0, r1)).with_padding(
                    o.padding_inner.unwrap_or(padding),
                    o.padding_outer.unwrap_or(outer),
                )
            } else {
                Band::point(domain.to_vec(), (r0, r1))
                    .with_padding(1.0, o.padding_outer.or(o.padding).unwrap_or(0.5))
            };
            return Ok(ScaleKind::Band(
                band.with_align(o.align.unwrap_or(0.5))
                    .with_round(o.round.unwrap_or(false)),
            ));
        }
        let n = domain.len();
        let range: Vec<Encoded> = match &o.range {
            Some(r) => r
                .iter()
                .map(|v| self.encode_literal(v))
                .collect::<Result<_, _>>()?,
            None => match self.name {
                ScaleName::Color => o
                    .scheme
                    .unwrap_or(SchemeName::Tableau10)
                    .colors(n)
                    .into_iter()
                    .map(Encoded::Color)
                    .collect(),
                ScaleName::Symbol => Symbol::FILL.iter().map(|&s| Encoded::Symbol(s)).collect(),
                name => {
                    let max = match name {
                        ScaleName::Opacity => 1.0,
                        ScaleName::Length => 12.0,
                        _ => 8.0,
                    };
                    (0..n)
                        .map(|i| Encoded::Number(max * (i + 1) as f64 / n.max(1) as f64))
                        .collect()
                }
            },
        };
        Ok(ScaleKind::Ordinal(Ordinal::new(domain.to_vec(), range)))
    }

    fn encode_literal(&self, v: &Value) -> Result<Encoded, ConfigurationError> {
        Ok(match self.name {
            ScaleName::Color => Encoded::Color(require_css(&v.to_text())?),
            ScaleName::Symbol => Encoded::Symbol(v.to_text().parse::<Symbol>()?),
            _ => v
                .as_f64()
                .map_or_else(|| Encoded::Raw(v.clone()), Encoded::Number),
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use markplot_core::ChannelHint;

    use super::*;

    fn channel(name: &'static str, scale: ScaleName, values: Vec<Value>) -> Channel {
        Channel::new(name, values, ScaleBinding::Scale(scale))
    }

    fn nums(xs: &[f64]) -> Vec<Value> {
        xs.iter().map(|&x| Value::from(x)).collect()
    }

    #[test]
    fn continuous_domains_merge_across_marks() {
        let a = channel("x", ScaleName::X, nums(&[0.0, 10.0]));
        let b = channel("x", ScaleName::X, nums(&[5.0, 20.0]));
        let spec = infer(ScaleName::X, &[&a, &b], &ScaleOptions::new())
            .expect("valid")
            .expect("bound");
        assert_eq!(spec.scale_type, ScaleType::Linear);
        assert_eq!(spec.domain, SpecDomain::Continuous(vec![0.0, 20.0]));
    }

    #[test]
    fn ordinal_domains_keep_first_seen_order() {
        let a = channel("x", ScaleName::X, vec![Value::from("b"), Value::from("a")]);
        let b = channel("x", ScaleName::X, vec![Value::from("c"), Value::from("a")]);
        let spec = infer(ScaleName::X, &[&a, &b], &ScaleOptions::new())
            .expect("valid")
            .expect("bound");
        assert_eq!(spec.scale_type, ScaleType::Point);
        assert_eq!(
            spec.domain_values(),
            vec![Value::from("b"), Value::from("a"), Value::from("c")]
        );
        let sorted = infer(
            ScaleName::X,
            &[&a, &b],
            &ScaleOptions::new().with_sort(SortOrder::Asc),
        )
        .expect("valid")
        .expect("bound");
        assert_eq!(sorted.domain_values()[0], Value::from("a"));
    }

    #[test]
    fn band_hints_and_facets_make_band_scales() {
        let mut a = channel("x", ScaleName::X, nums(&[1.0, 2.0]));
        a.hint = ChannelHint::BAND;
        let spec = infer(ScaleName::X, &[&a], &ScaleOptions::new())
            .expect("valid")
            .expect("bound");
        assert_eq!(spec.scale_type, ScaleType::Band);
        let fx = channel("fx", ScaleName::Fx, vec![Value::from("A")]);
        let spec = infer(ScaleName::Fx, &[&fx], &ScaleOptions::new())
            .expect("valid")
            .expect("bound");
        assert_eq!(spec.scale_type, ScaleType::Band);
        let point = infer(
            ScaleName::Fx,
            &[&fx],
            &ScaleOptions::new().with_type(ScaleType::Point),
        );
        assert!(matches!(
            point,
            Err(ConfigurationError::IncompatibleScaleType { .. })
        ));
    }

    #[test]
    fn mixed_kinds_coerce_to_text() {
        let a = channel("x", ScaleName::X, nums(&[1.0]));
        let b = channel("x", ScaleName::X, vec![Value::from("one")]);
        let spec = infer(ScaleName::X, &[&a, &b], &ScaleOptions::new())
            .expect("mixed kinds are not fatal")
            .expect("bound");
        assert!(spec.coerce_text);
        assert_eq!(
            spec.domain_values(),
            vec![Value::from("1"), Value::from("one")]
        );
        let scale = spec.instantiate(Some((0.0, 100.0))).expect("instantiates");
        assert_eq!(scale.apply_f64(&Value::from(1.0)), Some(25.0));
    }

    #[test]
    fn log_domains_must_not_cross_zero() {
        let a = channel("y", ScaleName::Y, nums(&[-1.0, 10.0]));
        let err = infer(
            ScaleName::Y,
            &[&a],
            &ScaleOptions::new().with_type(ScaleType::Log),
        )
        .expect_err("crosses zero");
        assert!(matches!(err, ConfigurationError::LogDomainCrossesZero { .. }));
        let b = channel("y", ScaleName::Y, nums(&[-100.0, -1.0]));
        let spec = infer(
            ScaleName::Y,
            &[&b],
            &ScaleOptions::new().with_type(ScaleType::Log),
        )
        .expect("negative log domains are fine")
        .expect("bound");
        let scale = spec.instantiate(Some((100.0, 0.0))).expect("instantiates");
        assert!((scale.apply_f64(&Value::from(-10.0)).expect("mapped") - 50.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_domains_widen() {
        let a = channel("x", ScaleName::X, nums(&[5.0, 5.0]));
        let spec = infer(ScaleName::X, &[&a], &ScaleOptions::new())
            .expect("valid")
            .expect("bound");
        assert_eq!(spec.domain, SpecDomain::Continuous(vec![4.0, 6.0]));
        let d = channel("x", ScaleName::X, vec![Value::ymd(2024, 1, 2)]);
        let spec = infer(ScaleName::X, &[&d], &ScaleOptions::new())
            .expect("valid")
            .expect("bound");
        assert_eq!(spec.scale_type, ScaleType::Utc);
        assert_eq!(
            spec.domain_values(),
            vec![Value::ymd(2024, 1, 1), Value::ymd(2024, 1, 3)]
        );

        let log = ScaleOptions::new().with_type(ScaleType::Log);
        let p = channel("y", ScaleName::Y, nums(&[10.0]));
        let spec = infer(ScaleName::Y, &[&p], &log).expect("valid").expect("bound");
        assert_eq!(spec.domain, SpecDomain::Continuous(vec![1.0, 100.0]));
        let n = channel("y", ScaleName::Y, nums(&[-10.0]));
        let spec = infer(ScaleName::Y, &[&n], &log).expect("valid").expect("bound");
        assert_eq!(spec.domain, SpecDomain::Continuous(vec![-100.0, -1.0]));
    }

    #[test]
    fn zero_nice_and_percent() {
        let mut a = channel("y", ScaleName::Y, nums(&[0.23, 0.87]));
        a.hint = ChannelHint::ZERO;
        a.label = Some("share".into());
        let spec = infer(
            ScaleName::Y,
            &[&a],
            &ScaleOptions::new().with_percent(true).with_nice(true),
        )
        .expect("valid")
        .expect("bound");
        assert_eq!(spec.domain, SpecDomain::Continuous(vec![0.0, 90.0]));
        assert_eq!(spec.label.as_deref(), Some("share (%)"));
    }

    #[test]
    fn incompatible_types_are_configuration_errors() {
        let a = channel("x", ScaleName::X, vec![Value::from("a")]);
        assert!(matches!(
            infer(
                ScaleName::X,
                &[&a],
                &ScaleOptions::new().with_type(ScaleType::Linear)
            ),
            Err(ConfigurationError::IncompatibleScaleType { .. })
        ));
        let c = channel("fill", ScaleName::Color, vec![Value::from("a")]);
        assert!(matches!(
            infer(
                ScaleName::Color,
                &[&c],
                &ScaleOptions::new().with_type(ScaleType::Band)
            ),
            Err(ConfigurationError::IncompatibleScaleType { .. })
        ));
    }

    #[test]
    fn auto_color_bindings_detect_literals() {
        let literal = Channel::new(
            "fill",
            vec![Value::from("red"), Value::from("#00ff00"), Value::Null],
            ScaleBinding::Auto(ScaleName::Color),
        );
        assert_eq!(resolve_binding(&literal), None);
        let data = Channel::new(
            "fill",
            vec![Value::from("red"), Value::from("setosa")],
            ScaleBinding::Auto(ScaleName::Color),
        );
        assert_eq!(resolve_binding(&data), Some(ScaleName::Color));
    }

    #[test]
    fn color_scales_default_to_schemes() {
        let c = channel("fill", ScaleName::Color, vec![Value::from("a"), Value::from("b")]);
        let scale = infer(ScaleName::Color, &[&c], &ScaleOptions::new())
            .expect("valid")
            .expect("bound")
            .instantiate(None)
            .expect("instantiates");
        assert_eq!(scale.scale_type(), ScaleType::Categorical);
        let first = scale.apply(&Value::from("a")).and_then(|e| e.as_color());
        assert_eq!(first.map(|c| c.to_rgba8().r), Some(0x4c));

        let n = channel("fill", ScaleName::Color, nums(&[-5.0, 10.0]));
        let spec = infer(ScaleName::Color, &[&n], &ScaleOptions::new().with_pivot(0.0))
            .expect("valid")
            .expect("bound");
        assert_eq!(spec.scale_type, ScaleType::Diverging);
        assert_eq!(spec.domain, SpecDomain::Continuous(vec![-5.0, 0.0, 10.0]));
    }

    #[test]
    fn intervals_fill_discrete_domains() {
        let mut a = channel("x", ScaleName::X, nums(&[2000.0, 2003.0]));
        a.hint = ChannelHint::BAND;
        let spec = infer(
            ScaleName::X,
            &[&a],
            &ScaleOptions::new().with_interval(ScaleInterval::Step(1.0)),
        )
        .expect("valid")
        .expect("bound");
        assert_eq!(spec.domain_values().len(), 4);
    }
}
