// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Channel classification and materialization.
//!
//! A mark declares its visual properties with [`ChannelSpec`]s. Each declared value is one of a
//! column reference, a per-row accessor, a literal array aligned with the data, or a plain
//! constant. Resolution against the mark's (transformed) table happens once, producing either a
//! materialized [`Channel`] or a style constant.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::error::DataShapeError;
use crate::scale_name::ScaleName;
use crate::table::{RowRef, Table};
use crate::value::Value;

/// A per-row accessor.
pub type Accessor = Arc<dyn Fn(&RowRef<'_>) -> Value + Send + Sync>;

/// A declared channel value, before resolution.
#[derive(Clone)]
pub enum ChannelValue {
    /// A column name; a name absent from the data is a constant instead.
    Column(Arc<str>),
    /// A function evaluated for each row.
    Accessor(Accessor),
    /// Pre-computed values aligned with the data rows.
    Literal(Arc<[Value]>),
    /// A constant (not a channel).
    Constant(Value),
}

impl ChannelValue {
    /// Creates an accessor channel value.
    pub fn accessor(f: impl Fn(&RowRef<'_>) -> Value + Send + Sync + 'static) -> Self {
        Self::Accessor(Arc::new(f))
    }

    /// Creates a literal channel value.
    pub fn literal(values: impl Into<Arc<[Value]>>) -> Self {
        Self::Literal(values.into())
    }
}

impl fmt::Debug for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(name) => f.debug_tuple("Column").field(name).finish(),
            Self::Accessor(_) => f.write_str("Accessor(..)"),
            Self::Literal(values) => f.debug_tuple("Literal").field(&values.len()).finish(),
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
        }
    }
}

impl From<&str> for ChannelValue {
    fn from(value: &str) -> Self {
        Self::Column(Arc::from(value))
    }
}

impl From<String> for ChannelValue {
    fn from(value: String) -> Self {
        Self::Column(Arc::from(value.as_str()))
    }
}

impl From<f64> for ChannelValue {
    fn from(value: f64) -> Self {
        Self::Constant(Value::Number(value))
    }
}

impl From<i32> for ChannelValue {
    fn from(value: i32) -> Self {
        Self::Constant(Value::from(value))
    }
}

impl From<bool> for ChannelValue {
    fn from(value: bool) -> Self {
        Self::Constant(Value::Bool(value))
    }
}

impl From<Value> for ChannelValue {
    fn from(value: Value) -> Self {
        Self::Constant(value)
    }
}

impl From<Vec<Value>> for ChannelValue {
    fn from(values: Vec<Value>) -> Self {
        Self::Literal(values.into())
    }
}

/// How a channel binds to a shared scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleBinding {
    /// Always encoded through the named scale.
    Scale(ScaleName),
    /// Encoded through the named scale unless every value is already a literal for it
    /// (CSS colors for `color`, symbol names for `symbol`).
    Auto(ScaleName),
    /// Raw values, never scaled.
    Unscaled,
}

impl ScaleBinding {
    /// Returns the scale this binding may resolve to.
    pub fn scale_name(self) -> Option<ScaleName> {
        match self {
            Self::Scale(n) | Self::Auto(n) => Some(n),
            Self::Unscaled => None,
        }
    }
}

/// Hints a mark gives the scale engine about a channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelHint {
    /// The mark wants a band (rather than point) ordinal scale.
    pub band: bool,
    /// The mark wants the continuous domain to include zero.
    pub zero: bool,
}

impl ChannelHint {
    /// A band hint.
    pub const BAND: Self = Self {
        band: true,
        zero: false,
    };

    /// A zero hint.
    pub const ZERO: Self = Self {
        band: false,
        zero: true,
    };
}

/// A declared visual property of a mark.
#[derive(Clone, Debug)]
pub struct ChannelSpec {
    /// Channel name, e.g. `x` or `fill`.
    pub name: &'static str,
    /// The declared value.
    pub value: ChannelValue,
    /// Scale binding.
    pub scale: ScaleBinding,
    /// Scale hints.
    pub hint: ChannelHint,
    /// Label override; columns otherwise label themselves.
    pub label: Option<Arc<str>>,
}

impl ChannelSpec {
    /// Creates a channel spec.
    pub fn new(name: &'static str, value: impl Into<ChannelValue>, scale: ScaleBinding) -> Self {
        Self {
            name,
            value: value.into(),
            scale,
            hint: ChannelHint::default(),
            label: None,
        }
    }

    /// Sets scale hints.
    pub fn with_hint(mut self, hint: ChannelHint) -> Self {
        self.hint = hint;
        self
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Resolves this spec against `table`.
    ///
    /// A column name that is absent from the table resolves to a text constant.
    pub fn resolve(&self, table: &Table) -> Result<Resolved, DataShapeError> {
        let (values, label): (Arc<[Value]>, Option<Arc<str>>) = match &self.value {
            ChannelValue::Column(name) => match table.column(name) {
                Some(values) => (values.clone(), Some(name.clone())),
                None => return Ok(Resolved::Constant(Value::Text(name.clone()))),
            },
            ChannelValue::Accessor(f) => (
                (0..table.len()).map(|i| f(&table.row(i))).collect(),
                None,
            ),
            ChannelValue::Literal(values) => {
                if values.len() != table.len() {
                    return Err(DataShapeError::LiteralLength {
                        channel: self.name.into(),
                        expected: table.len(),
                        actual: values.len(),
                    });
                }
                (values.clone(), None)
            }
            ChannelValue::Constant(v) => return Ok(Resolved::Constant(v.clone())),
        };
        Ok(Resolved::Channel(Channel {
            name: self.name,
            values,
            scale: self.scale,
            hint: self.hint,
            label: self.label.clone().or(label),
        }))
    }
}

/// The outcome of resolving a [`ChannelSpec`].
#[derive(Clone, Debug)]
pub enum Resolved {
    /// A materialized channel.
    Channel(Channel),
    /// A style constant.
    Constant(Value),
}

/// A materialized channel: one value per row of the mark's working data.
#[derive(Clone, Debug)]
pub struct Channel {
    /// Channel name.
    pub name: &'static str,
    /// Values, aligned with the mark's working data.
    pub values: Arc<[Value]>,
    /// Scale binding.
    pub scale: ScaleBinding,
    /// Scale hints.
    pub hint: ChannelHint,
    /// Axis/legend label.
    pub label: Option<Arc<str>>,
}

impl Channel {
    /// Creates a channel with no hint and no label.
    pub fn new(name: &'static str, values: impl Into<Arc<[Value]>>, scale: ScaleBinding) -> Self {
        Self {
            name,
            values: values.into(),
            scale,
            hint: ChannelHint::default(),
            label: None,
        }
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the channel has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
