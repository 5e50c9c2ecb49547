// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scale names and scale types.

use core::fmt;
use core::str::FromStr;

use crate::error::ConfigurationError;

/// The name of a shared scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScaleName {
    /// Horizontal position.
    X,
    /// Vertical position.
    Y,
    /// Horizontal facet position.
    Fx,
    /// Vertical facet position.
    Fy,
    /// Color (fill/stroke).
    Color,
    /// Radius.
    R,
    /// Opacity.
    Opacity,
    /// Symbol shape.
    Symbol,
    /// Vector length.
    Length,
}

impl ScaleName {
    /// All scale names, in resolution order (facet scales first).
    pub const ALL: [Self; 9] = [
        Self::Fx,
        Self::Fy,
        Self::X,
        Self::Y,
        Self::Color,
        Self::R,
        Self::Opacity,
        Self::Symbol,
        Self::Length,
    ];

    /// Returns the option key for this scale.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Fx => "fx",
            Self::Fy => "fy",
            Self::Color => "color",
            Self::R => "r",
            Self::Opacity => "opacity",
            Self::Symbol => "symbol",
            Self::Length => "length",
        }
    }

    /// Returns `true` for pixel-position scales (`x`, `y`, `fx`, `fy`).
    pub fn is_position(self) -> bool {
        matches!(self, Self::X | Self::Y | Self::Fx | Self::Fy)
    }

    /// Returns `true` for facet scales.
    pub fn is_facet(self) -> bool {
        matches!(self, Self::Fx | Self::Fy)
    }
}

impl fmt::Display for ScaleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScaleName {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownScaleName(s.into()))
    }
}

/// The type of a scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScaleType {
    /// Continuous linear.
    Linear,
    /// Continuous power (see the scale `exponent` option).
    Pow,
    /// Continuous square root (power with exponent 0.5).
    Sqrt,
    /// Continuous logarithmic.
    Log,
    /// Continuous bi-symmetric log.
    Symlog,
    /// Temporal, UTC calendar.
    Utc,
    /// Temporal, treated as UTC (no local time zone is available).
    Time,
    /// Discrete mapping to an output list.
    Ordinal,
    /// Discrete positions without width.
    Point,
    /// Discrete positions with a band width.
    Band,
    /// Values pass through unchanged.
    Identity,
    /// Continuous color ramp.
    Sequential,
    /// Continuous color ramp around a pivot.
    Diverging,
    /// Discrete color palette.
    Categorical,
}

impl ScaleType {
    const NAMES: [(&'static str, Self); 14] = [
        ("linear", Self::Linear),
        ("pow", Self::Pow),
        ("sqrt", Self::Sqrt),
        ("log", Self::Log),
        ("symlog", Self::Symlog),
        ("utc", Self::Utc),
        ("time", Self::Time),
        ("ordinal", Self::Ordinal),
        ("point", Self::Point),
        ("band", Self::Band),
        ("identity", Self::Identity),
        ("sequential", Self::Sequential),
        ("diverging", Self::Diverging),
        ("categorical", Self::Categorical),
    ];

    /// Returns the option string for this type.
    pub fn as_str(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, t)| *t == self)
            .map_or("linear", |(n, _)| n)
    }

    /// Returns `true` for types with a continuous `[min, max]` domain.
    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            Self::Linear
                | Self::Pow
                | Self::Sqrt
                | Self::Log
                | Self::Symlog
                | Self::Utc
                | Self::Time
                | Self::Sequential
                | Self::Diverging
        )
    }

    /// Returns `true` for temporal types.
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Utc | Self::Time)
    }

    /// Returns `true` for types with a discrete domain.
    pub fn is_ordinal(self) -> bool {
        matches!(
            self,
            Self::Ordinal | Self::Point | Self::Band | Self::Categorical
        )
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScaleType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim();
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(lower))
            .map(|(_, t)| *t)
            .ok_or_else(|| ConfigurationError::UnknownScaleType(s.into()))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn parses_scale_types_case_insensitively() {
        assert_eq!("Log".parse::<ScaleType>(), Ok(ScaleType::Log));
        assert_eq!("band".parse::<ScaleType>(), Ok(ScaleType::Band));
        assert!(matches!(
            "quantile".parse::<ScaleType>(),
            Err(ConfigurationError::UnknownScaleType(_))
        ));
    }

    #[test]
    fn scale_names_round_trip_through_their_keys() {
        for name in ScaleName::ALL {
            assert_eq!(name.as_str().parse::<ScaleName>(), Ok(name));
        }
    }
}
