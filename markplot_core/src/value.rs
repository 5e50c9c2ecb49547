// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamically typed cell values.
//!
//! Datasets handed to a plot are heterogeneous: a column may hold numbers, strings, dates or
//! nothing at all. [`Value`] is the closed set of run-time types the scale engine knows how to
//! reason about, and [`ValueKey`] is its normalized, hashable form used for ordinal domains and
//! facet grouping.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use core::cmp::Ordering;
use core::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Timelike};

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// A single cell value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. `NaN` is treated as undefined.
    Number(f64),
    /// A string.
    Text(Arc<str>),
    /// A UTC instant, in milliseconds since the Unix epoch.
    Date(i64),
}

/// The run-time type of a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Null`] or a `NaN` number.
    Undefined,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::Number`].
    Number,
    /// [`Value::Text`].
    Text,
    /// [`Value::Date`].
    Date,
}

impl Value {
    /// Creates a text value.
    pub fn text(s: impl Into<Arc<str>>) -> Self {
        Self::Text(s.into())
    }

    /// Creates a date value from a calendar date (UTC midnight).
    ///
    /// Returns [`Value::Null`] for an invalid date.
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map_or(Self::Null, |dt| Self::Date(dt.and_utc().timestamp_millis()))
    }

    /// Returns the run-time kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Undefined,
            Self::Number(n) if n.is_nan() => ValueKind::Undefined,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
            Self::Date(_) => ValueKind::Date,
        }
    }

    /// Returns `false` for nulls and `NaN`.
    pub fn is_defined(&self) -> bool {
        self.kind() != ValueKind::Undefined
    }

    /// Returns the numeric interpretation of this value.
    ///
    /// Dates map to their epoch milliseconds. Non-finite numbers return `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Date(ms) => Some(*ms as f64),
            _ => None,
        }
    }

    /// Returns the string slice for text values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Coerces this value into display text.
    ///
    /// Dates use an ISO 8601 form, omitting the time of day at UTC midnight.
    pub fn to_text(&self) -> Arc<str> {
        match self {
            Self::Text(s) => s.clone(),
            Self::Null => Arc::from(""),
            other => Arc::from(alloc::format!("{other}").as_str()),
        }
    }

    /// Returns the normalized grouping key for this value.
    pub fn key(&self) -> ValueKey {
        match self {
            Self::Null => ValueKey::Undefined,
            Self::Bool(b) => ValueKey::Bool(*b),
            Self::Number(n) if n.is_nan() => ValueKey::Undefined,
            // Collapse -0.0 into 0.0.
            Self::Number(n) if *n == 0.0 => ValueKey::Number(0.0_f64.to_bits()),
            Self::Number(n) => ValueKey::Number(n.to_bits()),
            Self::Text(s) => ValueKey::Text(s.clone()),
            Self::Date(ms) => ValueKey::Date(*ms),
        }
    }

    /// Natural ascending order: booleans, numbers, dates, text, then undefined last.
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v.kind() {
                ValueKind::Bool => 0,
                ValueKind::Number => 1,
                ValueKind::Date => 2,
                ValueKind::Text => 3,
                ValueKind::Undefined => 4,
            }
        }
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) if !a.is_nan() && !b.is_nan() => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Date(ms) => write_iso(f, *ms),
        }
    }
}

fn write_iso(f: &mut fmt::Formatter<'_>, ms: i64) -> fmt::Result {
    let Some(dt) = DateTime::from_timestamp_millis(ms) else {
        return write!(f, "{ms}");
    };
    let (year, month, day) = (dt.year(), dt.month(), dt.day());
    if ms.rem_euclid(MS_PER_DAY) == 0 {
        return write!(f, "{year:04}-{month:02}-{day:02}");
    }
    let (h, m, s) = (dt.hour(), dt.minute(), dt.second());
    let millis = ms.rem_euclid(1000);
    if millis == 0 {
        write!(f, "{year:04}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}Z")
    } else {
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}.{millis:03}Z"
        )
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(Arc::from(value.as_str()))
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A normalized, hashable form of a [`Value`].
///
/// Keys compare by strict equality after normalization: `NaN` and null collapse into
/// [`ValueKey::Undefined`], and `-0.0` collapses into `0.0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKey {
    /// Null or `NaN`.
    Undefined,
    /// A boolean.
    Bool(bool),
    /// Bit pattern of a normalized number.
    Number(u64),
    /// A string.
    Text(Arc<str>),
    /// Epoch milliseconds.
    Date(i64),
}

impl ValueKey {
    /// Reconstructs a representative value for this key.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Undefined => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(bits) => Value::Number(f64::from_bits(*bits)),
            Self::Text(s) => Value::Text(s.clone()),
            Self::Date(ms) => Value::Date(*ms),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;

    use super::*;

    #[test]
    fn nan_and_null_share_a_key() {
        assert_eq!(Value::Number(f64::NAN).key(), Value::Null.key());
        assert_eq!(Value::Number(-0.0).key(), Value::Number(0.0).key());
        assert_ne!(Value::from("1").key(), Value::from(1.0).key());
    }

    #[test]
    fn dates_display_as_iso() {
        assert_eq!(Value::ymd(2024, 3, 5).to_string(), "2024-03-05");
        let Value::Date(ms) = Value::ymd(2024, 3, 5) else {
            panic!("expected a date");
        };
        assert_eq!(
            Value::Date(ms + 3_600_000 + 1).to_string(),
            "2024-03-05T01:00:00.001Z"
        );
    }

    #[test]
    fn natural_order_puts_undefined_last() {
        let mut v = [
            Value::Null,
            Value::from(3.0),
            Value::from(-1.0),
            Value::Number(f64::NAN),
        ];
        v.sort_by(Value::natural_cmp);
        assert_eq!(v[0], Value::from(-1.0));
        assert_eq!(v[1], Value::from(3.0));
        assert!(!v[2].is_defined());
        assert!(!v[3].is_defined());
    }
}
