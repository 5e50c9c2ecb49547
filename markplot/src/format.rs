// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Locale-aware tick label formatting.
//!
//! Formatter construction goes through [`Memo1`] slots: each slot keeps exactly the most
//! recently requested formatter, so alternating between two keys reconstructs every time while
//! repeated requests for one key construct once.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use core::cell::RefCell;
use core::fmt;

use chrono::{DateTime, Datelike, Timelike};

use crate::time::TimeUnit;

/// A BCP 47 locale tag, e.g. `en-US`.
///
/// Formatting depends on the primary language only; unsupported languages fall back to English.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Locale(Arc<str>);

impl Locale {
    /// Creates a locale from a tag.
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag.
    pub fn tag(&self) -> &str {
        &self.0
    }

    fn language(&self) -> Language {
        let primary = self.0.split(['-', '_']).next().unwrap_or("");
        if primary.eq_ignore_ascii_case("fr") {
            Language::French
        } else if primary.eq_ignore_ascii_case("de") {
            Language::German
        } else {
            Language::English
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en-US")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Language {
    English,
    French,
    German,
}

/// A single-entry memoization slot.
///
/// Holds the value for the most recently requested key only; a request for a different key
/// evicts it.
#[derive(Debug)]
pub struct Memo1<K, V> {
    slot: Option<(K, V)>,
    constructions: usize,
}

impl<K, V> Default for Memo1<K, V> {
    fn default() -> Self {
        Self {
            slot: None,
            constructions: 0,
        }
    }
}

impl<K: PartialEq, V: Clone> Memo1<K, V> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, constructing it if the slot holds another key.
    pub fn get_or_insert_with(&mut self, key: K, make: impl FnOnce(&K) -> V) -> V {
        if let Some((k, v)) = &self.slot {
            if *k == key {
                return v.clone();
            }
        }
        let value = make(&key);
        self.constructions += 1;
        self.slot = Some((key, value.clone()));
        value
    }

    /// Returns how many values this slot has constructed.
    pub fn constructions(&self) -> usize {
        self.constructions
    }
}

/// Formatter caches shared by the axes and legends of one render pass.
#[derive(Debug, Default)]
pub struct FormatCache {
    number: RefCell<Memo1<Locale, NumberFormat>>,
    time: RefCell<Memo1<(Locale, TimeUnit), TimeFormat>>,
}

impl FormatCache {
    /// Creates empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number formatter for `locale`.
    pub fn number_format(&self, locale: &Locale) -> NumberFormat {
        self.number
            .borrow_mut()
            .get_or_insert_with(locale.clone(), NumberFormat::new)
    }

    /// Returns the date formatter for `locale` at `unit` precision.
    pub fn time_format(&self, locale: &Locale, unit: TimeUnit) -> TimeFormat {
        self.time
            .borrow_mut()
            .get_or_insert_with((locale.clone(), unit), |(l, u)| TimeFormat::new(l, *u))
    }

    /// Returns how many formatters have been constructed, across both slots.
    pub fn constructions(&self) -> usize {
        self.number.borrow().constructions() + self.time.borrow().constructions()
    }
}

/// Formats numbers with locale grouping and decimal separators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberFormat {
    group: &'static str,
    decimal: char,
}

impl NumberFormat {
    /// Creates the number format for `locale`.
    pub fn new(locale: &Locale) -> Self {
        match locale.language() {
            Language::English => Self {
                group: ",",
                decimal: '.',
            },
            Language::French => Self {
                group: "\u{202f}",
                decimal: ',',
            },
            Language::German => Self {
                group: ".",
                decimal: ',',
            },
        }
    }

    /// Formats `x` with `precision` fraction digits, or the shortest exact form when `None`.
    ///
    /// Negative numbers use the Unicode minus sign.
    pub fn format(&self, x: f64, precision: Option<usize>) -> String {
        if !x.is_finite() {
            return alloc::format!("{x}");
        }
        let digits = match precision {
            Some(p) => alloc::format!("{:.*}", p, x.abs()),
            None => alloc::format!("{}", x.abs()),
        };
        let (int, frac) = digits.split_once('.').unwrap_or((&digits, ""));
        let negative = x < 0.0 && digits.bytes().any(|b| b.is_ascii_digit() && b != b'0');

        let mut out = String::new();
        if negative {
            out.push('\u{2212}');
        }
        let len = int.len();
        for (i, c) in int.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 && len > 3 {
                out.push_str(self.group);
            }
            out.push(c);
        }
        if !frac.is_empty() {
            out.push(self.decimal);
            out.push_str(frac);
        }
        out
    }
}

const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTHS_FR: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];
const MONTHS_DE: [&str; 12] = [
    "Jan.", "Feb.", "März", "Apr.", "Mai", "Juni", "Juli", "Aug.", "Sep.", "Okt.", "Nov.", "Dez.",
];

/// Formats instants at a given calendar precision.
///
/// Ticks that fall on a coarser boundary show the coarser field: the first month of a year shows
/// the year, the first day of a month shows the month.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeFormat {
    language: Language,
    unit: TimeUnit,
}

impl TimeFormat {
    /// Creates the date format for `locale` at `unit` precision.
    pub fn new(locale: &Locale, unit: TimeUnit) -> Self {
        Self {
            language: locale.language(),
            unit,
        }
    }

    /// Formats epoch milliseconds.
    pub fn format(&self, ms: i64) -> String {
        let Some(dt) = DateTime::from_timestamp_millis(ms) else {
            return alloc::format!("{ms}");
        };
        let months = match self.language {
            Language::English => &MONTHS_EN,
            Language::French => &MONTHS_FR,
            Language::German => &MONTHS_DE,
        };
        let month = months[dt.month0() as usize];
        let (h, m, s) = (dt.hour(), dt.minute(), dt.second());
        let midnight = h == 0 && m == 0 && s == 0 && ms.rem_euclid(1000) == 0;
        match self.unit {
            TimeUnit::Year => alloc::format!("{}", dt.year()),
            TimeUnit::Month if dt.month0() == 0 => alloc::format!("{}", dt.year()),
            TimeUnit::Month => month.into(),
            TimeUnit::Day | TimeUnit::Week if dt.day() == 1 && dt.month0() == 0 => {
                alloc::format!("{}", dt.year())
            }
            TimeUnit::Day | TimeUnit::Week if dt.day() == 1 => month.into(),
            TimeUnit::Day | TimeUnit::Week => self.day_month(dt.day(), month),
            TimeUnit::Hour | TimeUnit::Minute if midnight => self.day_month(dt.day(), month),
            TimeUnit::Hour | TimeUnit::Minute => alloc::format!("{h:02}:{m:02}"),
            TimeUnit::Second => alloc::format!("{h:02}:{m:02}:{s:02}"),
            TimeUnit::Millisecond => {
                alloc::format!("{h:02}:{m:02}:{s:02}.{:03}", ms.rem_euclid(1000))
            }
        }
    }

    fn day_month(&self, day: u32, month: &str) -> String {
        match self.language {
            Language::English => alloc::format!("{month} {day}"),
            Language::French => alloc::format!("{day} {month}"),
            Language::German => alloc::format!("{day}. {month}"),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use markplot_core::Value;

    use super::*;

    #[test]
    fn memo_holds_only_the_last_key() {
        let cache = FormatCache::new();
        let (en, fr) = (Locale::new("en-US"), Locale::new("fr-FR"));
        cache.number_format(&en);
        cache.number_format(&fr);
        cache.number_format(&en);
        assert_eq!(cache.constructions(), 3);

        let cache = FormatCache::new();
        cache.number_format(&en);
        cache.number_format(&en);
        assert_eq!(cache.constructions(), 1);
    }

    #[test]
    fn numbers_group_by_locale() {
        let en = NumberFormat::new(&Locale::new("en-US"));
        assert_eq!(en.format(1234567.5, Some(1)), "1,234,567.5");
        assert_eq!(en.format(-20.0, Some(0)), "\u{2212}20");
        assert_eq!(en.format(-0.001, Some(1)), "0.0");
        assert_eq!(en.format(0.25, None), "0.25");
        let de = NumberFormat::new(&Locale::new("de-DE"));
        assert_eq!(de.format(1234.5, Some(2)), "1.234,50");
        let fr = NumberFormat::new(&Locale::new("fr"));
        assert_eq!(fr.format(1000.0, Some(0)), "1\u{202f}000");
    }

    #[test]
    fn dates_show_the_coarsest_boundary() {
        let ms = |v: Value| match v {
            Value::Date(ms) => ms,
            other => panic!("invalid date: {other:?}"),
        };
        let en = Locale::default();
        let month = TimeFormat::new(&en, TimeUnit::Month);
        assert_eq!(month.format(ms(Value::ymd(2024, 1, 1))), "2024");
        assert_eq!(month.format(ms(Value::ymd(2024, 3, 1))), "Mar");
        let day = TimeFormat::new(&Locale::new("fr-FR"), TimeUnit::Day);
        assert_eq!(day.format(ms(Value::ymd(2024, 3, 5))), "5 mars");
        let hour = TimeFormat::new(&en, TimeUnit::Hour);
        assert_eq!(hour.format(ms(Value::ymd(2024, 3, 5)) + 3_600_000 * 13), "13:00");
    }
}
