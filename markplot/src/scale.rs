// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Materialized scales.
//!
//! A [`Scale`] is one of a closed set of kinds sharing a common interface: `apply`, `invert`
//! (continuous kinds only), `domain`, `range`, `ticks` and `bandwidth`. Scales are produced by
//! [`ScaleSpec::instantiate`](crate::ScaleSpec::instantiate) once every mark has contributed its
//! channels, and are read-only afterwards.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use markplot_core::{ScaleName, ScaleType, Value, ValueKey};
use peniko::Color;

use crate::color::Ramp;
#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::symbol::Symbol;
use crate::time;

/// A value encoded by a scale.
#[derive(Clone, Debug, PartialEq)]
pub enum Encoded {
    /// A number: pixels for position scales, a radius, an opacity, a length.
    Number(f64),
    /// A color.
    Color(Color),
    /// A symbol shape.
    Symbol(Symbol),
    /// A value passed through unchanged.
    Raw(Value),
}

impl Encoded {
    /// Returns the number, if this is one (raw numbers included).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Raw(v) => v.as_f64(),
            _ => None,
        }
    }

    /// Returns the color, if this is one.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns the symbol, if this is one.
    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Self::Symbol(s) => Some(*s),
            _ => None,
        }
    }
}

/// The transform a continuous scale applies before interpolating.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mapping {
    /// Identity.
    Linear,
    /// Signed power with the given exponent.
    Pow(f64),
    /// Logarithm in the given base; `negative` domains map through `-ln(-x)`.
    Log {
        /// The base (used for ticks).
        base: f64,
        /// Whether the domain is strictly negative.
        negative: bool,
    },
    /// Bi-symmetric log with the given linear constant.
    Symlog(f64),
}

impl Mapping {
    fn forward(self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Pow(k) => x.signum() * x.abs().powf(k),
            Self::Log { negative, .. } => {
                if negative {
                    -(-x).ln()
                } else {
                    x.ln()
                }
            }
            Self::Symlog(c) => x.signum() * (x.abs() / c).ln_1p(),
        }
    }

    fn inverse(self, y: f64) -> f64 {
        match self {
            Self::Linear => y,
            Self::Pow(k) => y.signum() * y.abs().powf(1.0 / k),
            Self::Log { negative, .. } => {
                if negative {
                    -(-y).exp()
                } else {
                    y.exp()
                }
            }
            Self::Symlog(c) => y.signum() * y.abs().exp_m1() * c,
        }
    }
}

/// A continuous, piecewise scale from numbers (or instants) to numbers.
///
/// The domain and range have the same length (two, or three for a diverging pivot). Values are
/// transformed by the [`Mapping`], located in their domain segment and interpolated linearly.
#[derive(Clone, Debug, PartialEq)]
pub struct Continuous {
    mapping: Mapping,
    domain: Vec<f64>,
    mapped: Vec<f64>,
    range: Vec<f64>,
    clamp: bool,
    round: bool,
    temporal: bool,
}

impl Continuous {
    /// Creates a scale mapping `domain` to `range` through `mapping`.
    ///
    /// `domain` and `range` are truncated to a common length of at least two.
    pub fn new(mapping: Mapping, mut domain: Vec<f64>, mut range: Vec<f64>) -> Self {
        let n = domain.len().min(range.len());
        domain.truncate(n);
        range.truncate(n);
        while domain.len() < 2 {
            domain.push(domain.last().copied().unwrap_or(0.0));
            range.push(range.last().copied().unwrap_or(0.0));
        }
        let mapped = domain.iter().map(|&d| mapping.forward(d)).collect();
        Self {
            mapping,
            domain,
            mapped,
            range,
            clamp: false,
            round: false,
            temporal: false,
        }
    }

    /// Clamps inputs to the domain extent.
    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    /// Rounds outputs to integers.
    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    /// Marks the domain as epoch milliseconds.
    pub fn with_temporal(mut self, temporal: bool) -> Self {
        self.temporal = temporal;
        self
    }

    /// Returns the mapping.
    pub fn mapping(&self) -> Mapping {
        self.mapping
    }

    /// Returns the domain stops.
    pub fn domain(&self) -> &[f64] {
        &self.domain
    }

    /// Returns the range stops.
    pub fn range(&self) -> &[f64] {
        &self.range
    }

    /// Returns `true` if the domain is epoch milliseconds.
    pub fn is_temporal(&self) -> bool {
        self.temporal
    }

    /// Returns the `(min, max)` of the domain.
    pub fn extent(&self) -> (f64, f64) {
        extent(&self.domain)
    }

    /// Returns the `(min, max)` of the range.
    pub fn range_extent(&self) -> (f64, f64) {
        extent(&self.range)
    }

    /// Maps a domain value into the range; `NaN` if the value cannot be mapped.
    pub fn map(&self, x: f64) -> f64 {
        let mut fx = self.mapping.forward(x);
        if !fx.is_finite() {
            return f64::NAN;
        }
        if self.clamp {
            let (lo, hi) = extent(&self.mapped);
            fx = fx.clamp(lo, hi);
        }
        let y = piecewise(&self.mapped, &self.range, fx);
        if self.round { y.round() } else { y }
    }

    /// Maps a range value back into the domain; `NaN` if it cannot be inverted.
    pub fn invert(&self, y: f64) -> f64 {
        if !y.is_finite() {
            return f64::NAN;
        }
        let y = if self.clamp {
            let (lo, hi) = extent(&self.range);
            y.clamp(lo, hi)
        } else {
            y
        };
        self.mapping.inverse(piecewise(&self.range, &self.mapped, y))
    }

    /// Returns roughly `count` tick values within the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = self.extent();
        if self.temporal {
            #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
            let (ticks, _) = time::ticks(lo as i64, hi as i64, count);
            return ticks.into_iter().map(|t| t as f64).collect();
        }
        match self.mapping {
            Mapping::Log { base, negative } => log_ticks(lo, hi, base, count, negative),
            _ => linear_ticks(lo, hi, count),
        }
    }
}

fn extent(v: &[f64]) -> (f64, f64) {
    v.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        })
}

/// Interpolates `x` from the monotone stops `from` onto `to`.
fn piecewise(from: &[f64], to: &[f64], x: f64) -> f64 {
    let n = from.len();
    let ascending = from[n - 1] >= from[0];
    let mut i = 0;
    while i + 2 < n && if ascending { x > from[i + 1] } else { x < from[i + 1] } {
        i += 1;
    }
    let span = from[i + 1] - from[i];
    let t = if span == 0.0 { 0.5 } else { (x - from[i]) / span };
    to[i] + t * (to[i + 1] - to[i])
}

/// A continuous color scale: a [`Continuous`] scale onto `[0, 1]` followed by a ramp.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRamp {
    position: Continuous,
    ramp: Ramp,
}

impl ColorRamp {
    /// Creates a color scale.
    ///
    /// `position` maps the domain into `[0, 1]`; `ramp` colors the result.
    pub fn new(position: Continuous, ramp: Ramp) -> Self {
        Self { position, ramp }
    }

    /// Returns the underlying unit mapping.
    pub fn position(&self) -> &Continuous {
        &self.position
    }

    /// Returns the ramp.
    pub fn ramp(&self) -> &Ramp {
        &self.ramp
    }

    /// Colors a domain value.
    pub fn map(&self, x: f64) -> Option<Color> {
        let t = self.position.map(x);
        t.is_finite().then(|| self.ramp.at(t))
    }
}

/// Index of an ordered discrete domain.
#[derive(Clone, Debug, PartialEq)]
struct DomainIndex {
    values: Vec<Value>,
    slots: HashMap<ValueKey, usize>,
}

impl DomainIndex {
    fn new(values: Vec<Value>) -> Self {
        let mut slots = HashMap::with_capacity(values.len());
        for (i, v) in values.iter().enumerate() {
            slots.entry(v.key()).or_insert(i);
        }
        Self { values, slots }
    }

    fn position(&self, v: &Value) -> Option<usize> {
        self.slots.get(&v.key()).copied()
    }
}

/// A discrete scale mapping each domain value to an entry of its range, cycling if the range is
/// shorter than the domain.
#[derive(Clone, Debug, PartialEq)]
pub struct Ordinal {
    domain: DomainIndex,
    range: Vec<Encoded>,
}

impl Ordinal {
    /// Creates an ordinal scale.
    pub fn new(domain: Vec<Value>, range: Vec<Encoded>) -> Self {
        Self {
            domain: DomainIndex::new(domain),
            range,
        }
    }

    /// Returns the domain.
    pub fn domain(&self) -> &[Value] {
        &self.domain.values
    }

    /// Returns the range.
    pub fn range(&self) -> &[Encoded] {
        &self.range
    }

    /// Maps a domain value; `None` if it is not in the domain.
    pub fn map(&self, v: &Value) -> Option<&Encoded> {
        let i = self.domain.position(v)?;
        if self.range.is_empty() {
            return None;
        }
        self.range.get(i % self.range.len())
    }
}

/// A discrete position scale dividing a pixel interval into uniform bands.
///
/// A point scale is a band scale with an inner padding of one (zero bandwidth).
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    domain: DomainIndex,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
    round: bool,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl Band {
    /// Creates a band scale with the default paddings (0.1 inner and outer, centered).
    pub fn new(domain: Vec<Value>, range: (f64, f64)) -> Self {
        let mut band = Self {
            domain: DomainIndex::new(domain),
            range,
            padding_inner: 0.1,
            padding_outer: 0.1,
            align: 0.5,
            round: false,
            start: 0.0,
            step: 0.0,
            bandwidth: 0.0,
        };
        band.rescale();
        band
    }

    /// Creates a point scale with an outer padding of half a step.
    pub fn point(domain: Vec<Value>, range: (f64, f64)) -> Self {
        Self::new(domain, range).with_padding(1.0, 0.5)
    }

    /// Sets the inner and outer padding, in steps.
    pub fn with_padding(mut self, inner: f64, outer: f64) -> Self {
        self.padding_inner = inner.clamp(0.0, 1.0);
        self.padding_outer = outer.max(0.0);
        self.rescale();
        self
    }

    /// Sets how leftover space is distributed, from 0 (start) to 1 (end).
    pub fn with_align(mut self, align: f64) -> Self {
        self.align = align.clamp(0.0, 1.0);
        self.rescale();
        self
    }

    /// Rounds the step and band edges to whole pixels.
    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self.rescale();
        self
    }

    fn rescale(&mut self) {
        let n = self.domain.values.len() as f64;
        let (r0, r1) = self.range;
        let (lo, hi) = if r1 < r0 { (r1, r0) } else { (r0, r1) };
        let mut step = (hi - lo) / (n - self.padding_inner + self.padding_outer * 2.0).max(1.0);
        if self.round {
            step = step.floor();
        }
        let mut start = lo + (hi - lo - step * (n - self.padding_inner)) * self.align;
        let mut bandwidth = step * (1.0 - self.padding_inner);
        if self.round {
            start = start.round();
            bandwidth = bandwidth.round();
        }
        self.start = start;
        self.step = step;
        self.bandwidth = bandwidth;
    }

    /// Returns the domain.
    pub fn domain(&self) -> &[Value] {
        &self.domain.values
    }

    /// Returns the pixel range.
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Returns the width of each band.
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Returns the distance between the starts of adjacent bands.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Returns the start of the band at `index` (in domain order).
    pub fn position(&self, index: usize) -> f64 {
        let n = self.domain.values.len();
        // A reversed range lays the bands out from the far end.
        let i = if self.range.1 < self.range.0 {
            n.saturating_sub(index + 1)
        } else {
            index
        };
        self.start + self.step * i as f64
    }

    /// Maps a domain value to the start of its band.
    pub fn map(&self, v: &Value) -> Option<f64> {
        self.domain.position(v).map(|i| self.position(i))
    }
}

/// The kind of a materialized scale.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleKind {
    /// Numbers or instants to numbers.
    Continuous(Continuous),
    /// Numbers or instants to colors.
    Ramp(ColorRamp),
    /// Discrete values to a list of outputs.
    Ordinal(Ordinal),
    /// Discrete values to pixel bands (or points).
    Band(Band),
    /// Values pass through.
    Identity,
}

/// A materialized, shared scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Scale {
    pub(crate) name: ScaleName,
    pub(crate) scale_type: ScaleType,
    pub(crate) kind: ScaleKind,
    pub(crate) label: Option<Arc<str>>,
    pub(crate) percent: bool,
    pub(crate) coerce_text: bool,
    pub(crate) unknown: Option<Encoded>,
}

impl Scale {
    /// Creates a scale from its parts.
    pub fn new(name: ScaleName, scale_type: ScaleType, kind: ScaleKind) -> Self {
        Self {
            name,
            scale_type,
            kind,
            label: None,
            percent: false,
            coerce_text: false,
            unknown: None,
        }
    }

    /// Sets the axis/legend label.
    pub fn with_label(mut self, label: Option<Arc<str>>) -> Self {
        self.label = label;
        self
    }

    /// Sets the output for undefined or out-of-domain values.
    pub fn with_unknown(mut self, unknown: Option<Encoded>) -> Self {
        self.unknown = unknown;
        self
    }

    /// Returns the scale name.
    pub fn name(&self) -> ScaleName {
        self.name
    }

    /// Returns the scale type.
    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    /// Returns the scale kind.
    pub fn kind(&self) -> &ScaleKind {
        &self.kind
    }

    /// Returns the axis/legend label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns `true` if values are multiplied by 100 before mapping.
    pub fn is_percent(&self) -> bool {
        self.percent
    }

    /// Returns `true` for kinds with a continuous domain.
    pub fn is_continuous(&self) -> bool {
        matches!(self.kind, ScaleKind::Continuous(_) | ScaleKind::Ramp(_))
    }

    /// Returns `true` if the domain is made of instants.
    pub fn is_temporal(&self) -> bool {
        self.continuous().is_some_and(Continuous::is_temporal)
    }

    /// Returns the continuous mapping behind this scale (position or color).
    pub fn continuous(&self) -> Option<&Continuous> {
        match &self.kind {
            ScaleKind::Continuous(c) => Some(c),
            ScaleKind::Ramp(r) => Some(r.position()),
            _ => None,
        }
    }

    /// Brings a value into the scale's domain space (percent and text coercion).
    fn prepare(&self, v: &Value) -> Value {
        if self.coerce_text && v.is_defined() {
            return Value::Text(v.to_text());
        }
        match v {
            Value::Number(n) if self.percent => Value::Number(n * 100.0),
            other => other.clone(),
        }
    }

    /// Encodes a value; `None` means there is nothing to draw for it.
    pub fn apply(&self, v: &Value) -> Option<Encoded> {
        let v = self.prepare(v);
        let out = match &self.kind {
            ScaleKind::Continuous(c) => v
                .as_f64()
                .map(|x| c.map(x))
                .filter(|y| y.is_finite())
                .map(Encoded::Number),
            ScaleKind::Ramp(r) => v.as_f64().and_then(|x| r.map(x)).map(Encoded::Color),
            ScaleKind::Ordinal(o) => o.map(&v).cloned(),
            ScaleKind::Band(b) => b.map(&v).map(Encoded::Number),
            ScaleKind::Identity => v.is_defined().then(|| identity(self.name, &v)),
        };
        out.or_else(|| self.unknown.clone())
    }

    /// Encodes a value expected to be numeric (positions, radii, opacities).
    pub fn apply_f64(&self, v: &Value) -> Option<f64> {
        self.apply(v).and_then(|e| e.as_f64())
    }

    /// Maps a value already in domain space (a tick) to the center of its position.
    pub(crate) fn tick_position(&self, v: &Value) -> Option<f64> {
        match &self.kind {
            ScaleKind::Continuous(c) => v.as_f64().map(|x| c.map(x)).filter(|y| y.is_finite()),
            ScaleKind::Band(b) => b.map(v).map(|p| p + b.bandwidth() / 2.0),
            _ => None,
        }
    }

    /// Maps a range value back into the domain.
    ///
    /// Only continuous position kinds are invertible; instants invert to dates.
    pub fn invert(&self, y: f64) -> Option<Value> {
        let ScaleKind::Continuous(c) = &self.kind else {
            return None;
        };
        let x = c.invert(y);
        if !x.is_finite() {
            return None;
        }
        Some(if c.is_temporal() {
            #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
            Value::Date(x.round() as i64)
        } else {
            Value::Number(x)
        })
    }

    /// Returns the domain: `[min, max]` (or the diverging stops) for continuous kinds, the
    /// ordered values for discrete kinds, empty for identity scales.
    pub fn domain(&self) -> Vec<Value> {
        match &self.kind {
            ScaleKind::Continuous(_) | ScaleKind::Ramp(_) => {
                let c = self.continuous().map_or(&[][..], Continuous::domain);
                c.iter().map(|&x| self.number_value(x)).collect()
            }
            ScaleKind::Ordinal(o) => o.domain().to_vec(),
            ScaleKind::Band(b) => b.domain().to_vec(),
            ScaleKind::Identity => Vec::new(),
        }
    }

    /// Returns the range.
    pub fn range(&self) -> Vec<Encoded> {
        match &self.kind {
            ScaleKind::Continuous(c) => c.range().iter().map(|&y| Encoded::Number(y)).collect(),
            ScaleKind::Ramp(r) => r.ramp().stops().iter().map(|&c| Encoded::Color(c)).collect(),
            ScaleKind::Ordinal(o) => o.range().to_vec(),
            ScaleKind::Band(b) => {
                let (r0, r1) = b.range();
                alloc::vec![Encoded::Number(r0), Encoded::Number(r1)]
            }
            ScaleKind::Identity => Vec::new(),
        }
    }

    /// Returns roughly `count` tick values.
    ///
    /// Discrete kinds return their domain, thinned to at most `count` values when `count` is
    /// smaller than the domain.
    pub fn ticks(&self, count: usize) -> Vec<Value> {
        match &self.kind {
            ScaleKind::Continuous(_) | ScaleKind::Ramp(_) => self
                .continuous()
                .map(|c| c.ticks(count))
                .unwrap_or_default()
                .into_iter()
                .map(|x| self.number_value(x))
                .collect(),
            ScaleKind::Ordinal(_) | ScaleKind::Band(_) => {
                let domain = self.domain();
                if count == 0 || domain.len() <= count {
                    return domain;
                }
                let every = domain.len().div_ceil(count);
                domain.into_iter().step_by(every).collect()
            }
            ScaleKind::Identity => Vec::new(),
        }
    }

    /// Returns the band width (zero for kinds other than band).
    pub fn bandwidth(&self) -> f64 {
        match &self.kind {
            ScaleKind::Band(b) => b.bandwidth(),
            _ => 0.0,
        }
    }

    /// Returns the step of a band or point scale.
    pub fn step(&self) -> Option<f64> {
        match &self.kind {
            ScaleKind::Band(b) => Some(b.step()),
            _ => None,
        }
    }

    /// Returns the pixel extent of a position scale, ascending.
    pub fn pixel_extent(&self) -> Option<(f64, f64)> {
        match &self.kind {
            ScaleKind::Continuous(c) => Some(c.range_extent()),
            ScaleKind::Band(b) => {
                let (r0, r1) = b.range();
                Some((r0.min(r1), r0.max(r1)))
            }
            _ => None,
        }
    }

    fn number_value(&self, x: f64) -> Value {
        if self.is_temporal() {
            #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
            Value::Date(x.round() as i64)
        } else {
            Value::Number(x)
        }
    }
}

/// The finalized scales of a plot, by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scales {
    map: HashMap<ScaleName, Scale>,
}

impl Scales {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scale named `name`.
    pub fn get(&self, name: ScaleName) -> Option<&Scale> {
        self.map.get(&name)
    }

    /// Adds or replaces a scale.
    pub fn insert(&mut self, scale: Scale) {
        self.map.insert(scale.name, scale);
    }

    /// Iterates the scales in [`ScaleName::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &Scale> + '_ {
        ScaleName::ALL
            .into_iter()
            .filter_map(move |n| self.map.get(&n))
    }

    /// Returns the number of scales.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no scales.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Passes a value through an identity scale, interpreting it for the scale's output type.
pub(crate) fn identity(name: ScaleName, v: &Value) -> Encoded {
    match name {
        ScaleName::Color => v
            .as_str()
            .and_then(crate::color::parse_css)
            .map_or_else(|| Encoded::Raw(v.clone()), Encoded::Color),
        ScaleName::Symbol => v
            .as_str()
            .and_then(|s| s.parse::<Symbol>().ok())
            .map_or_else(|| Encoded::Raw(v.clone()), Encoded::Symbol),
        _ => v
            .as_f64()
            .map_or_else(|| Encoded::Raw(v.clone()), Encoded::Number),
    }
}

/// Returns the d3-style tick increment for `[start, stop]`.
///
/// Positive results are the step itself; negative results `-k` stand for a step of `1 / k`,
/// which keeps fractional ticks exact.
pub(crate) fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count.max(1) as f64;
    if !(step.is_finite() && step > 0.0) {
        return 0.0;
    }
    let power = step.log10().floor();
    let error = step / 10_f64.powf(power);
    let factor = if error >= 50_f64.sqrt() {
        10.0
    } else if error >= 10_f64.sqrt() {
        5.0
    } else if error >= 2_f64.sqrt() {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        10_f64.powf(power) * factor
    } else {
        -10_f64.powf(-power) / factor
    }
}

/// Returns nice ticks within `[lo, hi]`.
pub(crate) fn linear_ticks(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    if count == 0 || !(lo.is_finite() && hi.is_finite()) {
        return Vec::new();
    }
    if lo == hi {
        return alloc::vec![lo];
    }
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let inc = tick_increment(lo, hi, count);
    if inc == 0.0 {
        return Vec::new();
    }
    let (i0, i1) = if inc > 0.0 {
        ((lo / inc).ceil(), (hi / inc).floor())
    } else {
        ((lo * -inc).ceil(), (hi * -inc).floor())
    };
    let at = |i: f64| if inc > 0.0 { i * inc } else { i / -inc };
    if i1 < i0 || i1 - i0 > 10_000.0 {
        return Vec::new();
    }
    #[allow(clippy::cast_possible_truncation, reason = "bounded by the check above")]
    let n = (i1 - i0) as usize;
    (0..=n).map(|k| at(i0 + k as f64)).collect()
}

/// Returns the number of fraction digits needed to print ticks over `[lo, hi]`.
pub(crate) fn tick_precision(lo: f64, hi: f64, count: usize) -> usize {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let inc = tick_increment(lo, hi, count);
    if inc >= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, reason = "a small digit count")]
    let digits = ((-inc).log10() - 1e-9).ceil().max(0.0) as usize;
    digits
}

/// Extends `[lo, hi]` outward to tick boundaries.
pub(crate) fn nice_linear(lo: f64, hi: f64, count: usize) -> (f64, f64) {
    let (mut start, mut stop) = (lo, hi);
    let mut prestep = f64::NAN;
    for _ in 0..10 {
        let step = tick_increment(start, stop, count);
        if step == prestep || step == 0.0 {
            break;
        }
        if step > 0.0 {
            start = (start / step).floor() * step;
            stop = (stop / step).ceil() * step;
        } else {
            start = (start * -step).floor() / -step;
            stop = (stop * -step).ceil() / -step;
        }
        prestep = step;
    }
    (start, stop)
}

/// Extends a positive `[lo, hi]` outward to powers of `base`.
pub(crate) fn nice_log(lo: f64, hi: f64, base: f64) -> (f64, f64) {
    let log = |x: f64| x.ln() / base.ln();
    let lo = base.powf(log(lo).floor());
    let hi = base.powf(log(hi).ceil());
    (lo, hi)
}

fn log_ticks(lo: f64, hi: f64, base: f64, count: usize, negative: bool) -> Vec<f64> {
    if negative {
        let mut t = log_ticks(-hi, -lo, base, count, false);
        t.iter_mut().for_each(|x| *x = -*x);
        t.reverse();
        return t;
    }
    if !(lo > 0.0 && hi >= lo && lo.is_finite() && hi.is_finite()) {
        return Vec::new();
    }
    let log = |x: f64| x.ln() / base.ln();
    let (i, j) = (log(lo).floor(), log(hi).ceil());
    let within = |t: f64| t >= lo * (1.0 - 1e-12) && t <= hi * (1.0 + 1e-12);
    let mut out = Vec::new();
    let integral_base = base % 1.0 == 0.0 && base >= 2.0;
    if integral_base && j - i < count.max(1) as f64 {
        let mut p = i;
        while p <= j {
            let mut k = 1.0;
            while k < base {
                let t = if p < 0.0 {
                    k / base.powf(-p)
                } else {
                    k * base.powf(p)
                };
                if within(t) {
                    out.push(t);
                }
                k += 1.0;
            }
            p += 1.0;
        }
    } else {
        // Too many decades: thin the exponents with linear ticks.
        for e in linear_ticks(i, j, count.max(1)) {
            let t = base.powf(e);
            if within(t) {
                out.push(t);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn linear(domain: (f64, f64), range: (f64, f64)) -> Continuous {
        Continuous::new(
            Mapping::Linear,
            vec![domain.0, domain.1],
            vec![range.0, range.1],
        )
    }

    #[test]
    fn linear_maps_and_inverts() {
        let s = linear((0.0, 20.0), (0.0, 400.0));
        assert_eq!(s.map(5.0), 100.0);
        assert_eq!(s.invert(100.0), 5.0);
        let clamped = s.clone().with_clamp(true);
        assert_eq!(clamped.map(40.0), 400.0);
        assert_eq!(s.map(40.0), 800.0);
    }

    #[test]
    fn diverging_pivot_splits_the_range() {
        let s = Continuous::new(
            Mapping::Linear,
            vec![-10.0, 0.0, 30.0],
            vec![0.0, 0.5, 1.0],
        );
        assert_eq!(s.map(-5.0), 0.25);
        assert_eq!(s.map(15.0), 0.75);
    }

    #[test]
    fn log_scale_maps_endpoints_to_range() {
        let s = Continuous::new(
            Mapping::Log {
                base: 10.0,
                negative: false,
            },
            vec![1.0, 100.0],
            vec![0.0, 10.0],
        );
        assert!((s.map(10.0) - 5.0).abs() < 1e-9);
        assert!(s.map(-1.0).is_nan());
        assert_eq!(s.ticks(10).first(), Some(&1.0));
        assert_eq!(s.ticks(10).len(), 19);
    }

    #[test]
    fn linear_ticks_are_exact() {
        assert_eq!(linear_ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(linear_ticks(0.0, 20.0, 5), vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert_eq!(tick_precision(0.0, 1.0, 5), 1);
        assert_eq!(tick_precision(0.0, 0.1, 10), 2);
        assert_eq!(tick_precision(0.0, 100.0, 5), 0);
        assert_eq!(nice_linear(0.3, 9.7, 10), (0.0, 10.0));
    }

    #[test]
    fn band_layout_matches_padding() {
        let domain = vec![Value::from("a"), Value::from("b"), Value::from("c")];
        let band = Band::new(domain.clone(), (0.0, 310.0));
        // step = 310 / (3 - 0.1 + 0.2) = 100
        assert!((band.step() - 100.0).abs() < 1e-9);
        assert!((band.bandwidth() - 90.0).abs() < 1e-9);
        let a = band.map(&Value::from("a")).expect("in domain");
        assert!((a - 10.0).abs() < 1e-9);
        assert_eq!(band.map(&Value::from("z")), None);

        let point = Band::point(domain, (0.0, 300.0));
        assert_eq!(point.bandwidth(), 0.0);
        assert_eq!(point.map(&Value::from("a")), Some(50.0));
        assert_eq!(point.map(&Value::from("c")), Some(250.0));
    }

    #[test]
    fn reversed_band_ranges_lay_out_from_the_end() {
        let band = Band::new(vec![Value::from(1.0), Value::from(2.0)], (200.0, 0.0))
            .with_padding(0.0, 0.0);
        assert_eq!(band.map(&Value::from(1.0)), Some(100.0));
        assert_eq!(band.map(&Value::from(2.0)), Some(0.0));
    }

    #[test]
    fn ordinal_ranges_cycle_and_unknowns_fall_back() {
        let o = Ordinal::new(
            vec![Value::from("a"), Value::from("b"), Value::from("c")],
            vec![Encoded::Number(1.0), Encoded::Number(2.0)],
        );
        let scale = Scale::new(ScaleName::R, ScaleType::Ordinal, ScaleKind::Ordinal(o))
            .with_unknown(Some(Encoded::Number(0.0)));
        assert_eq!(scale.apply(&Value::from("c")), Some(Encoded::Number(1.0)));
        assert_eq!(scale.apply(&Value::from("q")), Some(Encoded::Number(0.0)));
        assert_eq!(scale.invert(1.0), None);
    }

    #[test]
    fn temporal_scales_speak_dates() {
        let (Value::Date(a), Value::Date(b)) = (Value::ymd(2024, 1, 1), Value::ymd(2024, 1, 11))
        else {
            panic!("valid dates");
        };
        let c = Continuous::new(Mapping::Linear, vec![a as f64, b as f64], vec![0.0, 100.0])
            .with_temporal(true);
        let scale = Scale::new(ScaleName::X, ScaleType::Utc, ScaleKind::Continuous(c));
        assert_eq!(scale.apply_f64(&Value::ymd(2024, 1, 6)), Some(50.0));
        assert_eq!(scale.invert(50.0), Some(Value::ymd(2024, 1, 6)));
        assert_eq!(scale.domain()[0], Value::ymd(2024, 1, 1));
    }
}
