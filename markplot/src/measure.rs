// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text measurement hooks for margin layout.
//!
//! Automatic margins need label extents before anything is rendered. Shaping is out of scope,
//! so layout goes through a [`TextMeasurer`]; callers with a real text stack can plug it in.

/// Estimates the extent of a single line of text.
pub trait TextMeasurer {
    /// Returns `(width, height)` in pixels.
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64);
}

/// A heuristic measurer using per-glyph width classes of a proportional sans-serif font.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicTextMeasurer;

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64) {
        let ems: f64 = text.chars().map(glyph_em).sum();
        (ems * font_size, font_size)
    }
}

fn glyph_em(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' | ' ' => 0.3,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.4,
        '0'..='9' => 0.56,
        'm' | 'w' | 'M' | 'W' | '\u{2212}' => 0.85,
        c if c.is_ascii_uppercase() => 0.68,
        _ => 0.6,
    }
}
