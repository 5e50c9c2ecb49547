// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! UTC calendar intervals for temporal ticks and rounding.
//!
//! Instants are epoch milliseconds, matching [`Value::Date`](markplot_core::Value::Date).
//! Fixed-length units are aligned to the epoch; weeks start on Sunday; months and years follow
//! the calendar.

extern crate alloc;

use alloc::vec::Vec;

use chrono::{DateTime, Datelike, NaiveDate};
use markplot_core::MS_PER_DAY;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// Milliseconds in one second.
pub(crate) const MS_PER_SECOND: i64 = 1_000;
/// Milliseconds in one minute.
pub(crate) const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
/// Milliseconds in one hour.
pub(crate) const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
/// Milliseconds in one week.
pub(crate) const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;

/// A calendar unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeUnit {
    /// Milliseconds.
    Millisecond,
    /// Seconds.
    Second,
    /// Minutes.
    Minute,
    /// Hours.
    Hour,
    /// Days.
    Day,
    /// Sunday-based weeks.
    Week,
    /// Calendar months.
    Month,
    /// Calendar years.
    Year,
}

impl TimeUnit {
    /// Returns the nominal length of one unit in milliseconds.
    ///
    /// Months and years report their longest length (31 and 366 days).
    pub fn max_ms(self) -> i64 {
        match self {
            Self::Millisecond => 1,
            Self::Second => MS_PER_SECOND,
            Self::Minute => MS_PER_MINUTE,
            Self::Hour => MS_PER_HOUR,
            Self::Day => MS_PER_DAY,
            Self::Week => MS_PER_WEEK,
            Self::Month => 31 * MS_PER_DAY,
            Self::Year => 366 * MS_PER_DAY,
        }
    }

    /// Returns `true` for units with a fixed length in milliseconds.
    pub fn is_fixed(self) -> bool {
        !matches!(self, Self::Month | Self::Year)
    }
}

/// A calendar interval: `step` consecutive units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    /// The unit.
    pub unit: TimeUnit,
    /// Units per interval (at least 1).
    pub step: i64,
}

impl TimeInterval {
    /// Creates an interval of `step` units.
    pub fn new(unit: TimeUnit, step: i64) -> Self {
        Self {
            unit,
            step: step.max(1),
        }
    }

    /// Creates an interval of one unit.
    pub fn every(unit: TimeUnit) -> Self {
        Self::new(unit, 1)
    }

    /// Returns the longest length of this interval in milliseconds.
    pub fn max_ms(&self) -> i64 {
        self.unit.max_ms().saturating_mul(self.step)
    }

    /// Rounds `ms` down to the start of its interval.
    pub fn floor(&self, ms: i64) -> i64 {
        match self.unit {
            TimeUnit::Week => {
                // The epoch fell on a Thursday.
                let sunday = 3 * MS_PER_DAY;
                let width = MS_PER_WEEK * self.step;
                ms - (ms - sunday).rem_euclid(width)
            }
            TimeUnit::Month | TimeUnit::Year => {
                let Some((year, month0)) = year_month(ms) else {
                    return ms;
                };
                let (year, month0) = if self.unit == TimeUnit::Month {
                    let total = i64::from(year) * 12 + i64::from(month0);
                    split_months(total - total.rem_euclid(self.step))
                } else {
                    (year - year.rem_euclid(i32::try_from(self.step).unwrap_or(1)), 0)
                };
                month_start(year, month0).unwrap_or(ms)
            }
            _ => {
                let width = self.max_ms();
                ms - ms.rem_euclid(width)
            }
        }
    }

    /// Rounds `ms` up to the start of the next interval, unless it is already aligned.
    pub fn ceil(&self, ms: i64) -> i64 {
        let floor = self.floor(ms);
        if floor == ms { ms } else { self.offset(floor, 1) }
    }

    /// Moves `ms` by `n` intervals.
    pub fn offset(&self, ms: i64, n: i64) -> i64 {
        match self.unit {
            TimeUnit::Month | TimeUnit::Year => {
                let months = if self.unit == TimeUnit::Month {
                    n * self.step
                } else {
                    n * self.step * 12
                };
                add_months(ms, months).unwrap_or(ms)
            }
            _ => ms.saturating_add(self.max_ms().saturating_mul(n)),
        }
    }

    /// Returns every interval boundary in `[start, stop]`.
    pub fn range(&self, start: i64, stop: i64) -> Vec<i64> {
        let mut out = Vec::new();
        let mut t = self.ceil(start);
        while t <= stop && out.len() < 10_000 {
            out.push(t);
            let next = self.offset(t, 1);
            if next <= t {
                break;
            }
            t = next;
        }
        out
    }
}

fn year_month(ms: i64) -> Option<(i32, u32)> {
    let dt = DateTime::from_timestamp_millis(ms)?;
    Some((dt.year(), dt.month0()))
}

fn split_months(total: i64) -> (i32, u32) {
    let year = i32::try_from(total.div_euclid(12)).unwrap_or(i32::MAX);
    #[allow(clippy::cast_possible_truncation, reason = "rem_euclid(12) is in 0..12")]
    let month0 = total.rem_euclid(12) as u32;
    (year, month0)
}

fn month_start(year: i32, month0: u32) -> Option<i64> {
    let date = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

fn add_months(ms: i64, months: i64) -> Option<i64> {
    let dt = DateTime::from_timestamp_millis(ms)?;
    let total = i64::from(dt.year()) * 12 + i64::from(dt.month0()) + months;
    let within = ms - month_start(dt.year(), dt.month0())?;
    let (year, month0) = split_months(total);
    let start = month_start(year, month0)?;
    let (next_year, next_month0) = split_months(total + 1);
    let days = (month_start(next_year, next_month0)? - start) / MS_PER_DAY;
    // Jan 31 + 1 month lands on the last day of February.
    let day = (within / MS_PER_DAY).min(days - 1);
    Some(start + day * MS_PER_DAY + within.rem_euclid(MS_PER_DAY))
}

/// Candidate tick intervals, shortest first.
const TICK_INTERVALS: [(TimeUnit, i64); 20] = [
    (TimeUnit::Second, 1),
    (TimeUnit::Second, 5),
    (TimeUnit::Second, 15),
    (TimeUnit::Second, 30),
    (TimeUnit::Minute, 1),
    (TimeUnit::Minute, 5),
    (TimeUnit::Minute, 15),
    (TimeUnit::Minute, 30),
    (TimeUnit::Hour, 1),
    (TimeUnit::Hour, 3),
    (TimeUnit::Hour, 6),
    (TimeUnit::Hour, 12),
    (TimeUnit::Day, 1),
    (TimeUnit::Day, 2),
    (TimeUnit::Week, 1),
    (TimeUnit::Month, 1),
    (TimeUnit::Month, 3),
    (TimeUnit::Month, 6),
    (TimeUnit::Year, 1),
    (TimeUnit::Year, 2),
];

fn nominal_ms(unit: TimeUnit, step: i64) -> f64 {
    let unit_ms = match unit {
        TimeUnit::Month => 30 * MS_PER_DAY,
        TimeUnit::Year => 365 * MS_PER_DAY,
        u => u.max_ms(),
    };
    (unit_ms * step) as f64
}

/// Chooses a tick interval producing roughly `count` ticks over `[lo, hi]`.
pub(crate) fn tick_interval(lo: i64, hi: i64, count: usize) -> TimeInterval {
    let target = (hi - lo).unsigned_abs() as f64 / count.max(1) as f64;
    if target < MS_PER_SECOND as f64 {
        #[allow(clippy::cast_possible_truncation, reason = "nice steps below 1000 ms")]
        let step = nice_step(target).max(1.0) as i64;
        return TimeInterval::new(TimeUnit::Millisecond, step);
    }
    let i = TICK_INTERVALS.partition_point(|&(u, s)| nominal_ms(u, s) < target);
    if i >= TICK_INTERVALS.len() {
        let years = target / nominal_ms(TimeUnit::Year, 1);
        #[allow(clippy::cast_possible_truncation, reason = "years fit in i64")]
        let step = nice_step(years).max(1.0) as i64;
        return TimeInterval::new(TimeUnit::Year, step);
    }
    // Pick the closer of the two neighbouring candidates.
    let (unit, step) = if i > 0 {
        let (a, b) = (TICK_INTERVALS[i - 1], TICK_INTERVALS[i]);
        if target / nominal_ms(a.0, a.1) < nominal_ms(b.0, b.1) / target {
            a
        } else {
            b
        }
    } else {
        TICK_INTERVALS[0]
    };
    TimeInterval::new(unit, step)
}

/// Returns roughly `count` calendar ticks over `[lo, hi]` and the interval used.
pub(crate) fn ticks(lo: i64, hi: i64, count: usize) -> (Vec<i64>, TimeInterval) {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let interval = tick_interval(lo, hi, count);
    (interval.range(lo, hi), interval)
}

fn nice_step(raw: f64) -> f64 {
    if !(raw.is_finite() && raw > 0.0) {
        return 1.0;
    }
    let power = 10_f64.powi(raw.log10().floor() as i32);
    let error = raw / power;
    let factor = if error >= 7.5 {
        10.0
    } else if error >= 3.5 {
        5.0
    } else if error >= 1.5 {
        2.0
    } else {
        1.0
    };
    power * factor
}

#[cfg(test)]
mod tests {
    extern crate std;

    use markplot_core::Value;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> i64 {
        match Value::ymd(y, m, d) {
            Value::Date(ms) => ms,
            other => panic!("invalid date: {other:?}"),
        }
    }

    #[test]
    fn months_floor_and_offset_on_the_calendar() {
        let month = TimeInterval::every(TimeUnit::Month);
        assert_eq!(month.floor(date(2024, 3, 17) + 5), date(2024, 3, 1));
        assert_eq!(month.offset(date(2024, 1, 31), 1), date(2024, 2, 29));
        let quarter = TimeInterval::new(TimeUnit::Month, 3);
        assert_eq!(quarter.floor(date(2024, 5, 2)), date(2024, 4, 1));
    }

    #[test]
    fn weeks_start_on_sunday() {
        // 2024-03-06 is a Wednesday.
        let week = TimeInterval::every(TimeUnit::Week);
        assert_eq!(week.floor(date(2024, 3, 6)), date(2024, 3, 3));
    }

    #[test]
    fn ticks_pick_calendar_units() {
        let (ticks, interval) = ticks(date(2020, 1, 1), date(2024, 1, 1), 5);
        assert_eq!(interval, TimeInterval::every(TimeUnit::Year));
        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks[1], date(2021, 1, 1));

        let (_, interval) = super::ticks(0, 90 * MS_PER_MINUTE, 6);
        assert_eq!(interval, TimeInterval::new(TimeUnit::Minute, 15));

        let (ms, interval) = super::ticks(0, 100, 10);
        assert_eq!(interval, TimeInterval::new(TimeUnit::Millisecond, 10));
        assert_eq!(ms.len(), 11);
    }
}
