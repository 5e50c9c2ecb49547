// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel-precision rounding of continuous domains.
//!
//! A [`Rounding`] is the coarsest rounding of domain values that still tells every pair of
//! adjacent pixels apart: inverting two neighbouring pixel positions and rounding the results
//! never yields the same value, and rounding is monotone across the range.

use crate::scale::{Scale, ScaleKind};
#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::time::{TimeInterval, TimeUnit};

/// Relative slack keeping the chosen step strictly finer than the per-pixel delta.
const SLACK: f64 = 1e-9;

/// Pixel positions examined exhaustively; wider ranges are sampled at their ends.
const MAX_SCAN: usize = 10_000;

/// A rounding of domain values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rounding {
    /// No rounding.
    Identity,
    /// Round to the nearest multiple of `10^power`.
    Decimal {
        /// The decimal exponent of the step.
        power: i32,
    },
    /// Floor to a multiple of a fixed number of milliseconds since the epoch.
    Fixed {
        /// Step in milliseconds.
        ms: i64,
    },
    /// Floor to the start of a calendar interval.
    Calendar(TimeInterval),
}

impl Rounding {
    /// Rounds a domain value.
    pub fn apply(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return x;
        }
        match *self {
            Self::Identity => x,
            Self::Decimal { power } if power < 0 => {
                let inv = 10_f64.powi(-power);
                (x * inv).round() / inv
            }
            Self::Decimal { power } => {
                let step = 10_f64.powi(power);
                (x / step).round() * step
            }
            Self::Fixed { ms } => {
                let step = ms as f64;
                let r = x % step;
                if r < 0.0 { x - r - step } else { x - r }
            }
            Self::Calendar(interval) => {
                #[allow(clippy::cast_possible_truncation, reason = "instants fit in i64")]
                let t = x.floor() as i64;
                interval.floor(t) as f64
            }
        }
    }

    /// Returns the (maximal) step of this rounding in domain units.
    pub fn step(&self) -> Option<f64> {
        match *self {
            Self::Identity => None,
            Self::Decimal { power } => Some(10_f64.powi(power)),
            Self::Fixed { ms } => Some(ms as f64),
            Self::Calendar(interval) => Some(interval.max_ms() as f64),
        }
    }
}

impl Scale {
    /// Returns the coarsest rounding that keeps adjacent pixels distinct.
    ///
    /// Only continuous position scales round; other kinds (and degenerate ranges) return
    /// [`Rounding::Identity`].
    ///
    /// This is an introspection helper for callers mapping pixels back to data (pointer
    /// readouts, tooltips); it does not feed tick generation or label formatting, which use
    /// the nice tick step and the calendar tick interval.
    pub fn pixel_rounding(&self) -> Rounding {
        let ScaleKind::Continuous(c) = self.kind() else {
            return Rounding::Identity;
        };
        let (lo, hi) = c.range_extent();
        let span = hi - lo;
        if !(span.is_finite() && span >= 1.0) {
            return Rounding::Identity;
        }
        let Some(delta) = min_pixel_delta(|p| c.invert(p), lo, hi) else {
            return Rounding::Identity;
        };
        if c.is_temporal() {
            temporal_rounding(delta)
        } else {
            let power = (delta * (1.0 - SLACK)).log10().floor();
            #[allow(clippy::cast_possible_truncation, reason = "a decimal exponent")]
            let power = power.clamp(-300.0, 300.0) as i32;
            Rounding::Decimal { power }
        }
    }
}

/// Returns the smallest domain distance between two adjacent pixels in `[lo, hi]`.
fn min_pixel_delta(invert: impl Fn(f64) -> f64, lo: f64, hi: f64) -> Option<f64> {
    #[allow(clippy::cast_possible_truncation, reason = "bounded by MAX_SCAN")]
    let pixels = (hi - lo).floor().min(MAX_SCAN as f64) as usize;
    let delta_at = |p: f64| (invert(p + 1.0) - invert(p)).abs();
    let mut delta = delta_at(lo).min(delta_at(hi - 1.0));
    for i in 1..pixels {
        delta = delta.min(delta_at(lo + i as f64));
    }
    (delta.is_finite() && delta > 0.0).then_some(delta)
}

fn temporal_rounding(delta: f64) -> Rounding {
    // Instants are floored to whole milliseconds, which can eat up to one millisecond of the
    // per-pixel delta.
    let budget = (delta - 1.0) * (1.0 - SLACK);
    if budget < 1.0 {
        return Rounding::Identity;
    }
    let mut best = Rounding::Identity;
    for unit in [
        TimeUnit::Millisecond,
        TimeUnit::Second,
        TimeUnit::Minute,
        TimeUnit::Hour,
        TimeUnit::Day,
        TimeUnit::Week,
    ] {
        for (num, den) in [(2, 2), (3, 2), (4, 2), (5, 2)] {
            let twice = unit.max_ms() * num;
            if twice % den != 0 {
                continue;
            }
            let ms = twice / den;
            if ms as f64 <= budget {
                best = Rounding::Fixed { ms };
            }
        }
    }
    for unit in [TimeUnit::Month, TimeUnit::Year] {
        if unit.max_ms() as f64 <= budget {
            best = Rounding::Calendar(TimeInterval::every(unit));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use markplot_core::{MS_PER_DAY, ScaleName, ScaleType};

    use super::*;
    use crate::scale::{Continuous, Mapping};

    fn position(domain: (f64, f64), px: f64, temporal: bool) -> Scale {
        let c = Continuous::new(Mapping::Linear, vec![domain.0, domain.1], vec![0.0, px])
            .with_temporal(temporal);
        Scale::new(ScaleName::X, ScaleType::Linear, ScaleKind::Continuous(c))
    }

    #[test]
    fn linear_rounding_tracks_pixel_size() {
        // 0.25 per pixel rounds to tenths.
        let r = position((0.0, 100.0), 400.0, false).pixel_rounding();
        assert_eq!(r, Rounding::Decimal { power: -1 });
        assert_eq!(r.apply(1.234), 1.2);
        // 25 per pixel rounds to tens.
        let r = position((0.0, 10_000.0), 400.0, false).pixel_rounding();
        assert_eq!(r.step(), Some(10.0));
    }

    #[test]
    fn temporal_rounding_uses_calendar_multipliers() {
        // Ten days over 400 px: 36 minutes per pixel rounds to 2.5 minutes.
        let r = position((0.0, 10.0 * MS_PER_DAY as f64), 400.0, true).pixel_rounding();
        assert_eq!(r, Rounding::Fixed { ms: 150_000 });
        // Forty years over 400 px rounds to months.
        let r = position((0.0, 40.0 * 365.0 * MS_PER_DAY as f64), 400.0, true).pixel_rounding();
        assert_eq!(r, Rounding::Calendar(TimeInterval::every(TimeUnit::Month)));
    }

    #[test]
    fn degenerate_ranges_do_not_round() {
        assert_eq!(
            position((0.0, 1.0), 0.0, false).pixel_rounding(),
            Rounding::Identity
        );
        assert_eq!(
            position((0.0, 1.0), 400.0, true).pixel_rounding(),
            Rounding::Identity
        );
    }
}
