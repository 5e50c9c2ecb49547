// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color schemes and CSS color parsing.
//!
//! Schemes are stored compactly: discrete palettes as hex strings, continuous schemes as a run of
//! concatenated `rrggbb` stops that are interpolated linearly in sRGB.

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use markplot_core::ConfigurationError;
use peniko::Color;
use peniko::color::{Srgb, parse_color};

const TABLEAU10: &[&str] = &[
    "#4c78a8", "#f58518", "#e45756", "#72b7b2", "#54a24b", "#eeca3b", "#b279a2", "#ff9da6",
    "#9d755d", "#bab0ac",
];

const CATEGORY10: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const VIRIDIS: &str = concat!(
    "440154470e61481a6c482575472f7d443a834144873d4e8a39568c35608d31688e2d708e",
    "2a788e27818e23888e21918d1f988b1fa08822a8842ab07f35b77943bf7154c56866cc5d",
    "7ad1518fd744a5db36bcdf27d2e21be9e51afde725"
);

const MAGMA: &str = concat!(
    "0000040404130b0924150e3720114b2c11603b0f704a107957157e651a80721f817f24",
    "828c29819a2e80a8327db6377ac43c75d1426fde4968e95462f1605df76f5cfa7f5efc",
    "8f65fe9f6dfeaf78febf84fece91fddea0fcedaffcfdbf"
);

const INFERNO: &str = concat!(
    "0000040403130c0826170c3b240c4f330a5f420a68500d6c5d126e6b176e781c6d86",
    "216b932667a12b62ae305cbb3755c73e4cd24644dd513ae65c30ed6925f3771af8850f",
    "fb9506fca50afcb519fac62df6d645f2e661f3f484fcffa4"
);

const PLASMA: &str = concat!(
    "0d088723069033059742039d5002a25d01a66a00a87801a88405a7900da49c179ea721",
    "98b12a90ba3488c33d80cb4779d35171da5a69e16462e76e5bed7953f2834cf68f44fa",
    "9a3dfca636fdb32ffec029fcce25f9dc24f5ea27f0f921"
);

const BLUES: &str = "cfe1f2bed8eca8cee58fc1de74b2d75ba3cf4592c63181bd206fb2125ca40a4a90";
const YELLOW_GREEN_BLUE: &str =
    "eff9bddbf1b4bde5b594d5b969c5be45b4c22c9ec02182b82163aa23479c1c3185";
const BLUE_ORANGE: &str = "134b852f78b35da2cb9dcae1d2e5eff2f0ebfce0bafbbf74e8932fc5690d994a07";
const RED_BLUE: &str = "67001fb2182bd6604df4a582fddbc7f7f7f7d1e5f092c5de4393c32166ac053061";

/// A built-in color scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemeName {
    /// Ten categorical colors (the default for ordinal color scales).
    Tableau10,
    /// The classic ten categorical colors.
    Category10,
    /// Perceptually uniform, dark purple to yellow (the default for sequential scales).
    Viridis,
    /// Perceptually uniform, black to light yellow through magenta.
    Magma,
    /// Perceptually uniform, black to light yellow through red.
    Inferno,
    /// Perceptually uniform, blue to yellow through magenta.
    Plasma,
    /// Single-hue blues.
    Blues,
    /// Yellow to blue through green.
    YellowGreenBlue,
    /// Diverging blue to orange.
    BlueOrange,
    /// Diverging red to blue (the default for diverging scales).
    RedBlue,
}

enum Palette {
    Discrete(&'static [&'static str]),
    Continuous(&'static str),
}

impl SchemeName {
    const NAMES: [(&'static str, Self); 10] = [
        ("tableau10", Self::Tableau10),
        ("category10", Self::Category10),
        ("viridis", Self::Viridis),
        ("magma", Self::Magma),
        ("inferno", Self::Inferno),
        ("plasma", Self::Plasma),
        ("blues", Self::Blues),
        ("ylgnbu", Self::YellowGreenBlue),
        ("blueorange", Self::BlueOrange),
        ("rdbu", Self::RedBlue),
    ];

    /// Returns the scheme name.
    pub fn as_str(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, s)| *s == self)
            .map_or("tableau10", |(n, _)| n)
    }

    /// Returns `true` for categorical palettes.
    pub fn is_discrete(self) -> bool {
        matches!(self.palette(), Palette::Discrete(_))
    }

    fn palette(self) -> Palette {
        match self {
            Self::Tableau10 => Palette::Discrete(TABLEAU10),
            Self::Category10 => Palette::Discrete(CATEGORY10),
            Self::Viridis => Palette::Continuous(VIRIDIS),
            Self::Magma => Palette::Continuous(MAGMA),
            Self::Inferno => Palette::Continuous(INFERNO),
            Self::Plasma => Palette::Continuous(PLASMA),
            Self::Blues => Palette::Continuous(BLUES),
            Self::YellowGreenBlue => Palette::Continuous(YELLOW_GREEN_BLUE),
            Self::BlueOrange => Palette::Continuous(BLUE_ORANGE),
            Self::RedBlue => Palette::Continuous(RED_BLUE),
        }
    }

    /// Returns `n` colors from this scheme.
    ///
    /// Discrete palettes cycle; continuous schemes are sampled evenly (a single color is taken
    /// from the middle of the ramp).
    pub fn colors(self, n: usize) -> Vec<Color> {
        match self.palette() {
            Palette::Discrete(hex) => {
                let base: Vec<Color> = hex.iter().filter_map(|h| parse_css(h)).collect();
                base.iter().copied().cycle().take(n).collect()
            }
            Palette::Continuous(_) => {
                let ramp = self.ramp();
                match n {
                    0 => Vec::new(),
                    1 => alloc::vec![ramp.at(0.5)],
                    _ => (0..n).map(|i| ramp.at(i as f64 / (n - 1) as f64)).collect(),
                }
            }
        }
    }

    /// Returns this scheme as a continuous ramp.
    pub fn ramp(self) -> Ramp {
        match self.palette() {
            Palette::Discrete(hex) => Ramp::new(hex.iter().filter_map(|h| parse_css(h)).collect()),
            Palette::Continuous(stops) => Ramp::new(decode_stops(stops)),
        }
    }
}

impl fmt::Display for SchemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeName {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(s.trim()))
            .map(|(_, scheme)| *scheme)
            .ok_or_else(|| ConfigurationError::UnknownScheme(s.into()))
    }
}

fn decode_stops(hex: &str) -> Vec<Color> {
    hex.as_bytes()
        .chunks_exact(6)
        .filter_map(|chunk| {
            let byte = |i: usize| {
                let pair = core::str::from_utf8(&chunk[i..i + 2]).ok()?;
                u8::from_str_radix(pair, 16).ok()
            };
            Some(Color::from_rgb8(byte(0)?, byte(2)?, byte(4)?))
        })
        .collect()
}

/// A piecewise-linear color ramp over `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Ramp {
    stops: Vec<Color>,
}

impl Ramp {
    /// Creates a ramp with evenly spaced stops.
    pub fn new(stops: Vec<Color>) -> Self {
        Self { stops }
    }

    /// Returns the stops.
    pub fn stops(&self) -> &[Color] {
        &self.stops
    }

    /// Returns the color at `t`, clamped to `[0, 1]`.
    pub fn at(&self, t: f64) -> Color {
        let n = self.stops.len();
        match n {
            0 => Color::BLACK,
            1 => self.stops[0],
            _ => {
                let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
                let x = t * (n - 1) as f64;
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "x is in [0, n - 1] so its floor fits in usize"
                )]
                let i = (x as usize).min(n - 2);
                lerp(self.stops[i], self.stops[i + 1], x - i as f64)
            }
        }
    }
}

/// Interpolates two colors componentwise in sRGB.
fn lerp(a: Color, b: Color, t: f64) -> Color {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "color components are f32; t is a unit fraction"
    )]
    let t = t as f32;
    Color::new(core::array::from_fn(|i| {
        a.components[i] + (b.components[i] - a.components[i]) * t
    }))
}

/// Parses a CSS color string (named colors, hex, `rgb()`, `hsl()`, …).
pub fn parse_css(s: &str) -> Option<Color> {
    parse_color(s.trim())
        .ok()
        .map(|c| c.to_alpha_color::<Srgb>())
}

/// Parses a CSS color, failing with [`ConfigurationError::InvalidColor`].
pub(crate) fn require_css(s: &str) -> Result<Color, ConfigurationError> {
    parse_css(s).ok_or_else(|| ConfigurationError::InvalidColor(s.into()))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn schemes_parse_by_name() {
        assert_eq!("Viridis".parse::<SchemeName>(), Ok(SchemeName::Viridis));
        assert!(matches!(
            "rainbow-unicorn".parse::<SchemeName>(),
            Err(ConfigurationError::UnknownScheme(_))
        ));
    }

    #[test]
    fn discrete_palettes_cycle() {
        let colors = SchemeName::Tableau10.colors(12);
        assert_eq!(colors.len(), 12);
        assert_eq!(colors[0], colors[10]);
        assert_eq!(colors[0].to_rgba8().r, 0x4c);
    }

    #[test]
    fn ramps_hit_their_end_stops() {
        let ramp = SchemeName::Viridis.ramp();
        assert_eq!(ramp.at(0.0).to_rgba8().r, 0x44);
        assert_eq!(ramp.at(1.0).to_rgba8().g, 0xe7);
        assert_eq!(ramp.at(-3.0), ramp.at(0.0));
    }

    #[test]
    fn css_names_are_colors() {
        assert!(parse_css("red").is_some());
        assert!(parse_css("#abc").is_some());
        assert!(parse_css("species").is_none());
        assert!(matches!(
            require_css("nope"),
            Err(ConfigurationError::InvalidColor(_))
        ));
    }
}
