// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel dimensions: margins, facet margins and per-cell frames.
//!
//! Layout is a small measure/arrange pass:
//! - **Measure**: guides report the margin they need (see [`measure_axis_left`]).
//! - **Arrange**: [`Dimensions::arrange`] fixes the outer size, subtracts margins and splits
//!   the remaining area into identical facet cells.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Rect;
use markplot_core::ConfigurationError;

use crate::measure::TextMeasurer;

/// Default outer width.
pub const DEFAULT_WIDTH: f64 = 640.0;
/// Default outer height.
pub const DEFAULT_HEIGHT: f64 = 400.0;

/// Space reserved on each side of a rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margins {
    /// Top.
    pub top: f64,
    /// Right.
    pub right: f64,
    /// Bottom.
    pub bottom: f64,
    /// Left.
    pub left: f64,
}

impl Margins {
    /// No margins.
    pub const ZERO: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    /// The same margin on every side.
    pub fn uniform(m: f64) -> Self {
        Self {
            top: m,
            right: m,
            bottom: m,
            left: m,
        }
    }
}

/// Explicit layout inputs; unset fields are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DimensionOptions {
    /// Outer width.
    pub width: Option<f64>,
    /// Outer height; derived from `aspect_ratio` when unset.
    pub height: Option<f64>,
    /// Inner width over inner height, used when `height` is unset.
    pub aspect_ratio: Option<f64>,
    /// Top margin.
    pub margin_top: Option<f64>,
    /// Right margin.
    pub margin_right: Option<f64>,
    /// Bottom margin.
    pub margin_bottom: Option<f64>,
    /// Left margin.
    pub margin_left: Option<f64>,
    /// Facet top margin.
    pub facet_margin_top: Option<f64>,
    /// Facet right margin.
    pub facet_margin_right: Option<f64>,
    /// Facet bottom margin.
    pub facet_margin_bottom: Option<f64>,
    /// Facet left margin.
    pub facet_margin_left: Option<f64>,
}

/// The facet grid shape and the padding between cells (as a fraction of the cell step).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridShape {
    /// Columns.
    pub cols: usize,
    /// Rows.
    pub rows: usize,
    /// Horizontal padding fraction.
    pub padding_x: f64,
    /// Vertical padding fraction.
    pub padding_y: f64,
}

impl Default for GridShape {
    fn default() -> Self {
        Self {
            cols: 1,
            rows: 1,
            padding_x: 0.0,
            padding_y: 0.0,
        }
    }
}

/// Final plot dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    /// Outer width.
    pub width: f64,
    /// Outer height.
    pub height: f64,
    /// Plot margins (axes, labels).
    pub margin: Margins,
    /// Margins between the plot area and the facet grid (facet axes).
    pub facet_margin: Margins,
    /// Grid shape.
    pub grid: GridShape,
    /// Horizontal gap between cells.
    pub gap_x: f64,
    /// Vertical gap between cells.
    pub gap_y: f64,
}

impl Dimensions {
    /// Arranges the plot.
    ///
    /// `auto` and `facet_auto` are the margins guides asked for; explicit options win over
    /// them. Every cell gets the same size, the grid area split evenly after gaps.
    pub fn arrange(
        options: &DimensionOptions,
        auto: Margins,
        facet_auto: Margins,
        grid: GridShape,
    ) -> Result<Self, ConfigurationError> {
        let margin = Margins {
            top: options.margin_top.unwrap_or(auto.top),
            right: options.margin_right.unwrap_or(auto.right),
            bottom: options.margin_bottom.unwrap_or(auto.bottom),
            left: options.margin_left.unwrap_or(auto.left),
        };
        let facet_margin = Margins {
            top: options.facet_margin_top.unwrap_or(facet_auto.top),
            right: options.facet_margin_right.unwrap_or(facet_auto.right),
            bottom: options.facet_margin_bottom.unwrap_or(facet_auto.bottom),
            left: options.facet_margin_left.unwrap_or(facet_auto.left),
        };
        let width = options.width.unwrap_or(DEFAULT_WIDTH);
        let inner_width = width - margin.left - margin.right - facet_margin.left - facet_margin.right;
        let height = match (options.height, options.aspect_ratio) {
            (Some(h), _) => h,
            (None, Some(ratio)) if ratio > 0.0 && inner_width > 0.0 => {
                inner_width / ratio
                    + margin.top
                    + margin.bottom
                    + facet_margin.top
                    + facet_margin.bottom
            }
            _ => DEFAULT_HEIGHT,
        };
        let inner_height =
            height - margin.top - margin.bottom - facet_margin.top - facet_margin.bottom;

        let grid = GridShape {
            cols: grid.cols.max(1),
            rows: grid.rows.max(1),
            ..grid
        };
        let gap_x = gap(inner_width, grid.cols, grid.padding_x);
        let gap_y = gap(inner_height, grid.rows, grid.padding_y);
        let dims = Self {
            width,
            height,
            margin,
            facet_margin,
            grid,
            gap_x,
            gap_y,
        };
        let (cell_w, cell_h) = dims.cell_size();
        if !(cell_w > 0.0 && cell_h > 0.0) {
            return Err(ConfigurationError::MarginsExceedSize {
                width: inner_width,
                height: inner_height,
            });
        }
        tracing::debug!(
            width,
            height,
            cols = grid.cols,
            rows = grid.rows,
            cell_w,
            cell_h,
            "arranged plot"
        );
        Ok(dims)
    }

    /// Returns the outer bounds.
    pub fn view(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Returns the area inside the plot margins.
    pub fn plot_area(&self) -> Rect {
        Rect::new(
            self.margin.left,
            self.margin.top,
            self.width - self.margin.right,
            self.height - self.margin.bottom,
        )
    }

    /// Returns the area the facet cells tile.
    pub fn grid_area(&self) -> Rect {
        let p = self.plot_area();
        Rect::new(
            p.x0 + self.facet_margin.left,
            p.y0 + self.facet_margin.top,
            p.x1 - self.facet_margin.right,
            p.y1 - self.facet_margin.bottom,
        )
    }

    /// Returns the size of one cell.
    pub fn cell_size(&self) -> (f64, f64) {
        let area = self.grid_area();
        let cols = self.grid.cols as f64;
        let rows = self.grid.rows as f64;
        (
            (area.width() - (cols - 1.0) * self.gap_x) / cols,
            (area.height() - (rows - 1.0) * self.gap_y) / rows,
        )
    }

    /// Returns the frame of the cell at `(col, row)`.
    pub fn frame(&self, col: usize, row: usize) -> Rect {
        let area = self.grid_area();
        let (w, h) = self.cell_size();
        let x0 = area.x0 + col as f64 * (w + self.gap_x);
        let y0 = area.y0 + row as f64 * (h + self.gap_y);
        Rect::new(x0, y0, x0 + w, y0 + h)
    }

    /// Returns every cell frame in cell order (rows outer, columns inner).
    pub fn frames(&self) -> Vec<Rect> {
        (0..self.grid.rows)
            .flat_map(|row| (0..self.grid.cols).map(move |col| self.frame(col, row)))
            .collect()
    }
}

/// The gap between `n` cells tiling `extent` with band padding `padding` and no outer padding.
fn gap(extent: f64, n: usize, padding: f64) -> f64 {
    if n <= 1 || padding <= 0.0 {
        return 0.0;
    }
    let step = extent / (n as f64 - padding);
    step * padding
}

/// Margin needed by a left (or right) axis with the given tick labels.
pub(crate) fn measure_axis_left(
    measurer: &dyn TextMeasurer,
    tick_labels: &[&str],
    tick_size: f64,
    tick_padding: f64,
    font_size: f64,
) -> f64 {
    let max_w = tick_labels
        .iter()
        .map(|s| measurer.measure(s, font_size).0)
        .fold(0.0_f64, f64::max);
    tick_size.abs() + tick_padding.max(0.0) + max_w
}

/// Margin needed by a bottom (or top) axis.
pub(crate) fn measure_axis_bottom(
    measurer: &dyn TextMeasurer,
    tick_size: f64,
    tick_padding: f64,
    font_size: f64,
) -> f64 {
    let (_w, h) = measurer.measure("Mg", font_size);
    tick_size.abs() + tick_padding.max(0.0) + h
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::measure::HeuristicTextMeasurer;

    fn auto() -> Margins {
        Margins {
            top: 20.0,
            right: 20.0,
            bottom: 30.0,
            left: 40.0,
        }
    }

    #[test]
    fn single_cell_uses_the_margin_box() {
        let dims = Dimensions::arrange(
            &DimensionOptions::default(),
            auto(),
            Margins::ZERO,
            GridShape::default(),
        )
        .expect("fits");
        assert_eq!(dims.frame(0, 0), Rect::new(40.0, 20.0, 620.0, 370.0));
        assert_eq!(dims.frames().len(), 1);
    }

    #[test]
    fn cells_are_identical_and_gapped() {
        let dims = Dimensions::arrange(
            &DimensionOptions {
                width: Some(440.0),
                ..DimensionOptions::default()
            },
            Margins::uniform(20.0),
            Margins::ZERO,
            GridShape {
                cols: 2,
                rows: 1,
                padding_x: 0.1,
                padding_y: 0.1,
            },
        )
        .expect("fits");
        let frames = dims.frames();
        assert_eq!(frames.len(), 2);
        assert!((frames[0].width() - frames[1].width()).abs() < 1e-9);
        // Step 400 / 1.9, gap a tenth of it.
        assert!((dims.gap_x - 400.0 / 1.9 * 0.1).abs() < 1e-9);
        assert!((frames[1].x1 - 420.0).abs() < 1e-9);
    }

    #[test]
    fn aspect_ratio_derives_height() {
        let dims = Dimensions::arrange(
            &DimensionOptions {
                width: Some(240.0),
                aspect_ratio: Some(2.0),
                ..DimensionOptions::default()
            },
            Margins::uniform(20.0),
            Margins::ZERO,
            GridShape::default(),
        )
        .expect("fits");
        assert_eq!(dims.height, 140.0);
    }

    #[test]
    fn oversized_margins_are_rejected() {
        let err = Dimensions::arrange(
            &DimensionOptions {
                width: Some(50.0),
                ..DimensionOptions::default()
            },
            auto(),
            Margins::ZERO,
            GridShape::default(),
        );
        assert!(matches!(
            err,
            Err(ConfigurationError::MarginsExceedSize { .. })
        ));
    }

    #[test]
    fn axis_margins_grow_with_labels() {
        let m = HeuristicTextMeasurer;
        let short = measure_axis_left(&m, &["1"], 5.0, 3.0, 10.0);
        let long = measure_axis_left(&m, &["1", "100,000"], 5.0, 3.0, 10.0);
        assert!(long > short);
        assert_eq!(measure_axis_bottom(&m, 5.0, 3.0, 10.0), 18.0);
    }
}
