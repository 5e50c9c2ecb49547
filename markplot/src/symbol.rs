// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Symbol shapes for dots and symbol legends.

use core::f64::consts::PI;
use core::fmt;
use core::str::FromStr;

use kurbo::{Affine, BezPath, Circle, Point, Shape};
use markplot_core::ConfigurationError;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// A symbol shape.
///
/// Shapes are sized by area so that symbols of the same radius look equally heavy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A circle.
    Circle,
    /// A filled plus sign.
    Cross,
    /// A rhombus.
    Diamond,
    /// An axis-aligned square.
    Square,
    /// A five-pointed star.
    Star,
    /// An upward-pointing triangle.
    Triangle,
    /// A three-armed "Y".
    Wye,
    /// A stroked plus sign.
    Plus,
    /// A stroked diagonal cross.
    Times,
}

impl Symbol {
    /// The default range of the symbol scale (shapes that read well when filled).
    pub const FILL: [Self; 7] = [
        Self::Circle,
        Self::Cross,
        Self::Diamond,
        Self::Square,
        Self::Star,
        Self::Triangle,
        Self::Wye,
    ];

    const NAMES: [(&'static str, Self); 9] = [
        ("circle", Self::Circle),
        ("cross", Self::Cross),
        ("diamond", Self::Diamond),
        ("square", Self::Square),
        ("star", Self::Star),
        ("triangle", Self::Triangle),
        ("wye", Self::Wye),
        ("plus", Self::Plus),
        ("times", Self::Times),
    ];

    /// Returns the symbol name.
    pub fn as_str(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, s)| *s == self)
            .map_or("circle", |(n, _)| n)
    }

    /// Returns `true` for open shapes that must be stroked rather than filled.
    pub fn is_stroke_only(self) -> bool {
        matches!(self, Self::Plus | Self::Times)
    }

    /// Returns the outline of this symbol centered at `center` with the area of a circle of
    /// radius `r`.
    pub fn path(self, center: Point, r: f64) -> BezPath {
        let size = PI * r * r;
        let mut p = match self {
            Self::Circle => Circle::new((0.0, 0.0), r).path_elements(0.1).collect(),
            Self::Cross => cross(size),
            Self::Diamond => diamond(size),
            Self::Square => square(size),
            Self::Star => star(size),
            Self::Triangle => triangle(size),
            Self::Wye => wye(size),
            Self::Plus => plus(size),
            Self::Times => times(size),
        };
        p.apply_affine(Affine::translate(center.to_vec2()));
        p
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(s.trim()))
            .map(|(_, sym)| *sym)
            .ok_or_else(|| ConfigurationError::UnknownSymbol(s.into()))
    }
}

fn polygon(points: &[(f64, f64)]) -> BezPath {
    let mut p = BezPath::new();
    for (i, &pt) in points.iter().enumerate() {
        if i == 0 {
            p.move_to(pt);
        } else {
            p.line_to(pt);
        }
    }
    p.close_path();
    p
}

fn cross(size: f64) -> BezPath {
    let r = (size / 5.0).sqrt() / 2.0;
    polygon(&[
        (-3.0 * r, -r),
        (-r, -r),
        (-r, -3.0 * r),
        (r, -3.0 * r),
        (r, -r),
        (3.0 * r, -r),
        (3.0 * r, r),
        (r, r),
        (r, 3.0 * r),
        (-r, 3.0 * r),
        (-r, r),
        (-3.0 * r, r),
    ])
}

fn diamond(size: f64) -> BezPath {
    let tan30 = (1.0_f64 / 3.0).sqrt();
    let y = (size / (2.0 * tan30)).sqrt();
    let x = y * tan30;
    polygon(&[(0.0, -y), (x, 0.0), (0.0, y), (-x, 0.0)])
}

fn square(size: f64) -> BezPath {
    let h = size.sqrt() / 2.0;
    polygon(&[(-h, -h), (h, -h), (h, h), (-h, h)])
}

fn star(size: f64) -> BezPath {
    const KA: f64 = 0.890_813_091_529_285_2;
    let kr = (PI / 10.0).sin() / (7.0 * PI / 10.0).sin();
    let kx = (2.0 * PI / 10.0).sin() * kr;
    let ky = -(2.0 * PI / 10.0).cos() * kr;
    let r = (size * KA).sqrt();
    let (x, y) = (kx * r, ky * r);
    let mut pts = alloc::vec![(0.0, -r), (x, y)];
    for i in 1..5 {
        let a = 2.0 * PI * f64::from(i) / 5.0;
        let (s, c) = (a.sin(), a.cos());
        pts.push((s * r, -c * r));
        pts.push((c * x - s * y, s * x + c * y));
    }
    polygon(&pts)
}

fn triangle(size: f64) -> BezPath {
    let sqrt3 = 3.0_f64.sqrt();
    let y = -(size / (sqrt3 * 3.0)).sqrt();
    polygon(&[(0.0, y * 2.0), (-sqrt3 * y, -y), (sqrt3 * y, -y)])
}

fn wye(size: f64) -> BezPath {
    let c = -0.5;
    let s = 3.0_f64.sqrt() / 2.0;
    let k = 1.0 / 12.0_f64.sqrt();
    let a = (k / 2.0 + 1.0) * 3.0;
    let r = (size / a).sqrt();
    let (x0, y0) = (r / 2.0, r * k);
    let (x1, y1) = (x0, r * k + r);
    let (x2, y2) = (-x1, y1);
    polygon(&[
        (x0, y0),
        (x1, y1),
        (x2, y2),
        (c * x0 - s * y0, s * x0 + c * y0),
        (c * x1 - s * y1, s * x1 + c * y1),
        (c * x2 - s * y2, s * x2 + c * y2),
        (c * x0 + s * y0, c * y0 - s * x0),
        (c * x1 + s * y1, c * y1 - s * x1),
        (c * x2 + s * y2, c * y2 - s * x2),
    ])
}

fn plus(size: f64) -> BezPath {
    let r = (size - (size / 7.0).min(2.0)).max(0.0).sqrt() * 0.282_09;
    let mut p = BezPath::new();
    p.move_to((-r, 0.0));
    p.line_to((r, 0.0));
    p.move_to((0.0, r));
    p.line_to((0.0, -r));
    p
}

fn times(size: f64) -> BezPath {
    let r = (size - (size / 6.0).min(1.7)).max(0.0).sqrt() * 0.618_9 / 2.0;
    let mut p = BezPath::new();
    p.move_to((-r, -r));
    p.line_to((r, r));
    p.move_to((-r, r));
    p.line_to((r, -r));
    p
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("Diamond".parse::<Symbol>(), Ok(Symbol::Diamond));
        assert!(matches!(
            "hexagon".parse::<Symbol>(),
            Err(ConfigurationError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn square_matches_the_circle_area() {
        let r = 4.0;
        let bounds = Symbol::Square.path(Point::new(10.0, 10.0), r).bounding_box();
        let side = (PI * r * r).sqrt();
        assert!((bounds.width() - side).abs() < 1e-9);
        assert!((bounds.center().x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn filled_symbols_are_closed() {
        for sym in Symbol::FILL {
            let p = sym.path(Point::ORIGIN, 3.0);
            assert!(!p.elements().is_empty());
            assert!(!sym.is_stroke_only());
        }
        assert!(Symbol::Times.is_stroke_only());
    }
}
