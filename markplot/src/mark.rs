// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Marks: data, declared channels and a renderer.
//!
//! A [`Mark`] pairs a dataset with channel declarations, optional transforms and an optional
//! initializer. Rendering is delegated to a [`MarkRenderer`], which only sees encoded
//! [`Values`] and the finalized [`Scales`]; it never touches the data or scale inference.

extern crate alloc;

use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::Rect;
use markplot_core::{
    Channel, ChannelHint, ChannelSpec, ChannelValue, ConfigurationError, Node, ScaleBinding,
    ScaleName, Style, Table, Value,
};
use markplot_transforms::Transform;
use peniko::Color;

use crate::color::parse_css;
use crate::dimensions::Dimensions;
use crate::facet::{FacetCell, FacetMode};
use crate::initializer::Initializer;
use crate::scale::{Encoded, Scales, identity};
use crate::scale_infer::resolve_binding;
use crate::symbol::Symbol;

/// A channel a mark accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelDef {
    /// Channel name.
    pub name: &'static str,
    /// Default scale, or `None` for raw channels such as `text` or `z`.
    pub scale: Option<ScaleName>,
    /// Hints for scale inference.
    pub hint: ChannelHint,
    /// Whether the mark cannot render without this channel.
    pub required: bool,
}

impl ChannelDef {
    /// An optional channel bound to `scale`.
    pub const fn new(name: &'static str, scale: Option<ScaleName>) -> Self {
        Self {
            name,
            scale,
            hint: ChannelHint {
                band: false,
                zero: false,
            },
            required: false,
        }
    }

    /// Marks the channel as required.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Asks for a band scale.
    pub const fn band(mut self) -> Self {
        self.hint.band = true;
        self
    }

    /// Asks for a domain including zero.
    pub const fn zero(mut self) -> Self {
        self.hint.zero = true;
        self
    }

    /// The default binding: color and symbol channels are bound automatically so literal
    /// colors and symbol names pass through.
    pub fn binding(&self) -> ScaleBinding {
        match self.scale {
            Some(s @ (ScaleName::Color | ScaleName::Symbol)) => ScaleBinding::Auto(s),
            Some(s) => ScaleBinding::Scale(s),
            None => ScaleBinding::Unscaled,
        }
    }
}

/// Encoded per-row channel values of one mark, plus its style constants.
///
/// Channel vectors are aligned with the mark's working data; `None` marks an undefined or
/// unknown value.
#[derive(Clone, Debug, Default)]
pub struct Values {
    channels: HashMap<&'static str, Arc<[Option<Encoded>]>>,
    constants: HashMap<&'static str, Value>,
}

impl Values {
    /// Encodes resolved channels through their scales.
    ///
    /// Unscaled channels are interpreted for their default scale (CSS colors, symbol names,
    /// numbers); channels with no default scale keep their raw values.
    pub fn encode(
        defs: &[ChannelDef],
        channels: &[Channel],
        constants: &[(&'static str, Value)],
        scales: &Scales,
    ) -> Self {
        let mut out = Self::default();
        for channel in channels {
            let default = defs
                .iter()
                .find(|d| d.name == channel.name)
                .and_then(|d| d.scale)
                .or(channel.scale.scale_name());
            let scale = resolve_binding(channel).and_then(|n| scales.get(n));
            let encoded: Arc<[Option<Encoded>]> = channel
                .values
                .iter()
                .map(|v| match (scale, default) {
                    (Some(s), _) => s.apply(v),
                    _ if !v.is_defined() => None,
                    (None, Some(name)) => Some(identity(name, v)),
                    (None, None) => Some(Encoded::Raw(v.clone())),
                })
                .collect();
            out.channels.insert(channel.name, encoded);
        }
        for (name, v) in constants {
            out.constants.insert(*name, v.clone());
        }
        out
    }

    /// Returns `true` if `name` is a per-row channel.
    pub fn has(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Returns the encoded values of a channel.
    pub fn get(&self, name: &str) -> Option<&[Option<Encoded>]> {
        self.channels.get(name).map(|v| &**v)
    }

    /// Returns the encoded value of a channel at `row`.
    pub fn encoded(&self, name: &str, row: usize) -> Option<&Encoded> {
        self.get(name)?.get(row)?.as_ref()
    }

    /// Returns a numeric channel value.
    pub fn number(&self, name: &str, row: usize) -> Option<f64> {
        self.encoded(name, row)?.as_f64()
    }

    /// Returns a color channel value.
    pub fn color(&self, name: &str, row: usize) -> Option<Color> {
        self.encoded(name, row)?.as_color()
    }

    /// Returns a symbol channel value.
    pub fn symbol(&self, name: &str, row: usize) -> Option<Symbol> {
        self.encoded(name, row)?.as_symbol()
    }

    /// Returns a channel value as display text.
    pub fn text(&self, name: &str, row: usize) -> Option<Arc<str>> {
        match self.encoded(name, row)? {
            Encoded::Raw(v) => Some(v.to_text()),
            Encoded::Number(n) => Some(Value::Number(*n).to_text()),
            Encoded::Symbol(s) => Some(s.as_str().into()),
            Encoded::Color(_) => None,
        }
    }

    /// Returns a style constant.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// Returns a numeric channel value at `row`, or the numeric constant, or `default`.
    ///
    /// `None` means the channel exists but is undefined at `row`.
    pub fn number_or(&self, name: &str, row: usize, default: f64) -> Option<f64> {
        if self.has(name) {
            return self.number(name, row);
        }
        Some(self.constant(name).and_then(Value::as_f64).unwrap_or(default))
    }

    /// Returns `true` if `name` is set, as a channel or a constant.
    pub fn is_set(&self, name: &str) -> bool {
        self.has(name) || self.constants.contains_key(name)
    }

    /// Resolves a paint (`fill` or `stroke`) at `row`.
    ///
    /// The outer `None` means the channel exists but is undefined at `row`; the inner `None`
    /// means no paint (the constant `"none"`).
    pub fn paint(&self, name: &str, row: usize, default: Option<Color>) -> Option<Option<Color>> {
        if self.has(name) {
            return self.color(name, row).map(Some);
        }
        Some(match self.constant(name) {
            Some(Value::Text(s)) if &**s == "none" => None,
            Some(Value::Text(s)) => parse_css(s).or(default),
            _ => default,
        })
    }

    /// Resolves the common style channels at `row`; `None` skips the row.
    pub fn style(
        &self,
        row: usize,
        fill: Option<Color>,
        stroke: Option<Color>,
        stroke_width: f64,
    ) -> Option<Style> {
        let fill = self.paint("fill", row, fill)?;
        let stroke = self.paint("stroke", row, stroke)?;
        Some(Style {
            fill: fill.map(Into::into),
            stroke: stroke.map(Into::into),
            stroke_width: self.number_or("stroke_width", row, stroke_width)?,
            opacity: self.number_or("opacity", row, 1.0)?,
        })
    }
}

/// Where a mark is being rendered.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    /// The frame scales map into. Cells other than the first are translated into place.
    pub frame: Rect,
    /// The facet cell.
    pub cell: &'a FacetCell,
    /// Plot dimensions.
    pub dimensions: &'a Dimensions,
}

/// Draws one mark in one facet cell.
pub trait MarkRenderer: fmt::Debug + Send + Sync {
    /// Mark name, used in logs, errors and the node class.
    fn name(&self) -> &'static str;

    /// Channels the mark accepts.
    fn channels(&self) -> &'static [ChannelDef];

    /// Renders the rows of `index`; `None` when nothing is drawn.
    ///
    /// Rows with a missing required position are skipped.
    fn render(
        &self,
        index: &[usize],
        scales: &Scales,
        values: &Values,
        ctx: &RenderContext<'_>,
    ) -> Option<Node>;
}

/// Half the bandwidth of a scale, so band positions land on band centers.
pub(crate) fn band_center(scales: &Scales, scale: ScaleName) -> f64 {
    scales.get(scale).map_or(0.0, |s| s.bandwidth() / 2.0)
}

/// Returns the encoded value of `Value::Number(0)` on a scale (the baseline of bars and
/// areas).
pub(crate) fn zero(scales: &Scales, scale: ScaleName) -> Option<f64> {
    scales.get(scale)?.apply_f64(&Value::Number(0.0))
}

/// Attaches tooltip text to a shape.
pub(crate) fn titled(mut node: Node, title: Option<Arc<str>>) -> Node {
    match &mut node {
        Node::Rect(r) => r.title = title,
        Node::Path(p) => p.title = title,
        Node::Group(_) | Node::Text(_) => {}
    }
    node
}

/// Wraps rendered children in a class group, or `None` if nothing was drawn.
pub(crate) fn finish(class: &'static str, children: Vec<Node>) -> Option<Node> {
    (!children.is_empty()).then(|| Node::group(class, children))
}

/// A channel as declared on a mark, before validation.
#[derive(Clone, Debug)]
struct Declared {
    name: Arc<str>,
    value: ChannelValue,
    binding: Option<ScaleBinding>,
    label: Option<Arc<str>>,
}

/// A mark: data, channels, transforms and a renderer.
#[derive(Clone, Debug)]
pub struct Mark {
    pub(crate) renderer: Arc<dyn MarkRenderer>,
    pub(crate) data: Table,
    declared: Vec<Declared>,
    pub(crate) transforms: Vec<Transform>,
    pub(crate) initializer: Option<Initializer>,
    pub(crate) facet: FacetMode,
    pub(crate) fx: Option<ChannelValue>,
    pub(crate) fy: Option<ChannelValue>,
    pub(crate) clip: bool,
}

impl Mark {
    /// Creates a mark drawing `data` with `renderer`.
    pub fn new(renderer: impl MarkRenderer + 'static, data: Table) -> Self {
        Self {
            renderer: Arc::new(renderer),
            data,
            declared: Vec::new(),
            transforms: Vec::new(),
            initializer: None,
            facet: FacetMode::Auto,
            fx: None,
            fy: None,
            clip: false,
        }
    }

    /// Returns the mark name.
    pub fn name(&self) -> &'static str {
        self.renderer.name()
    }

    /// Returns the mark's data.
    pub fn data(&self) -> &Table {
        &self.data
    }

    /// Declares a channel: a column name, an accessor, a literal array or a constant.
    pub fn with_channel(mut self, name: impl Into<Arc<str>>, value: impl Into<ChannelValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.declared.iter_mut().find(|d| d.name == name) {
            Some(d) => d.value = value,
            None => self.declared.push(Declared {
                name,
                value,
                binding: None,
                label: None,
            }),
        }
        self
    }

    /// Shorthand for the `x` channel.
    pub fn x(self, value: impl Into<ChannelValue>) -> Self {
        self.with_channel("x", value)
    }

    /// Shorthand for the `y` channel.
    pub fn y(self, value: impl Into<ChannelValue>) -> Self {
        self.with_channel("y", value)
    }

    /// Shorthand for the `fill` channel.
    pub fn fill(self, value: impl Into<ChannelValue>) -> Self {
        self.with_channel("fill", value)
    }

    /// Shorthand for the `stroke` channel.
    pub fn stroke(self, value: impl Into<ChannelValue>) -> Self {
        self.with_channel("stroke", value)
    }

    /// Overrides how a declared channel binds to scales (for example to force raw values).
    pub fn with_binding(mut self, name: &str, binding: ScaleBinding) -> Self {
        if let Some(d) = self.declared.iter_mut().find(|d| &*d.name == name) {
            d.binding = Some(binding);
        }
        self
    }

    /// Overrides the label a declared channel gives its scale.
    pub fn with_label(mut self, name: &str, label: impl Into<Arc<str>>) -> Self {
        if let Some(d) = self.declared.iter_mut().find(|d| &*d.name == name) {
            d.label = Some(label.into());
        }
        self
    }

    /// Appends a transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Sets the initializer.
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = Some(initializer);
        self
    }

    /// Sets the facet mode.
    pub fn with_facet(mut self, mode: FacetMode) -> Self {
        self.facet = mode;
        self
    }

    /// Facets this mark horizontally by its own channel.
    pub fn with_fx(mut self, fx: impl Into<ChannelValue>) -> Self {
        self.fx = Some(fx.into());
        self
    }

    /// Facets this mark vertically by its own channel.
    pub fn with_fy(mut self, fy: impl Into<ChannelValue>) -> Self {
        self.fy = Some(fy.into());
        self
    }

    /// Clips the mark to its cell frame.
    pub fn with_clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }

    /// Validates the declared channels and turns them into channel specs.
    pub(crate) fn channel_specs(&self) -> Result<Vec<ChannelSpec>, ConfigurationError> {
        let defs = self.renderer.channels();
        let mut specs = Vec::with_capacity(self.declared.len());
        for d in &self.declared {
            let def = defs.iter().find(|def| *def.name == *d.name).ok_or_else(|| {
                ConfigurationError::UnknownChannel {
                    mark: self.name(),
                    channel: d.name.to_string(),
                }
            })?;
            let mut spec = ChannelSpec::new(
                def.name,
                d.value.clone(),
                d.binding.unwrap_or_else(|| def.binding()),
            )
            .with_hint(def.hint);
            spec.label = d.label.clone();
            specs.push(spec);
        }
        if let Some(missing) = defs
            .iter()
            .find(|def| def.required && !self.declared.iter().any(|d| *d.name == *def.name))
        {
            return Err(ConfigurationError::MissingChannel {
                mark: self.name(),
                channel: missing.name,
            });
        }
        Ok(specs)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use markplot_core::ScaleType;

    use super::*;
    use crate::scale::{Continuous, Mapping, Scale, ScaleKind};

    #[derive(Debug)]
    struct Probe;

    const PROBE: &[ChannelDef] = &[
        ChannelDef::new("x", Some(ScaleName::X)).required(),
        ChannelDef::new("fill", Some(ScaleName::Color)),
        ChannelDef::new("text", None),
    ];

    impl MarkRenderer for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn channels(&self) -> &'static [ChannelDef] {
            PROBE
        }

        fn render(&self, _: &[usize], _: &Scales, _: &Values, _: &RenderContext<'_>) -> Option<Node> {
            None
        }
    }

    #[test]
    fn declared_channels_are_validated() {
        let mark = Mark::new(Probe, Table::empty(1)).with_channel("size", 3.0);
        assert!(matches!(
            mark.channel_specs(),
            Err(ConfigurationError::UnknownChannel { mark: "probe", .. })
        ));
        let mark = Mark::new(Probe, Table::empty(1)).fill("red");
        assert!(matches!(
            mark.channel_specs(),
            Err(ConfigurationError::MissingChannel { channel: "x", .. })
        ));
        let specs = Mark::new(Probe, Table::empty(1))
            .x("a")
            .fill("red")
            .channel_specs()
            .expect("valid channels");
        assert_eq!(specs[1].scale, ScaleBinding::Auto(ScaleName::Color));
    }

    #[test]
    fn values_encode_through_scales_or_identity() {
        let mut scales = Scales::new();
        scales.insert(Scale::new(
            ScaleName::X,
            ScaleType::Linear,
            ScaleKind::Continuous(Continuous::new(
                Mapping::Linear,
                vec![0.0, 10.0],
                vec![0.0, 100.0],
            )),
        ));
        let x = Channel::new(
            "x",
            vec![Value::from(5.0), Value::Null],
            ScaleBinding::Scale(ScaleName::X),
        );
        let fill = Channel::new(
            "fill",
            vec![Value::from("red"), Value::from("blue")],
            ScaleBinding::Unscaled,
        );
        let values = Values::encode(PROBE, &[x, fill], &[("stroke", Value::from("none"))], &scales);
        assert_eq!(values.number("x", 0), Some(50.0));
        assert_eq!(values.number("x", 1), None);
        assert_eq!(values.color("fill", 1).map(|c| c.to_rgba8().b), Some(255));
        assert_eq!(values.paint("stroke", 0, Some(Color::BLACK)), Some(None));
        let style = values.style(0, None, None, 1.5).expect("defined");
        assert!(style.fill.is_some() && style.stroke.is_none());
    }
}
