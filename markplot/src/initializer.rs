// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Initializers: post-scale transforms that see pixel positions.
//!
//! An initializer runs once scales are materialized. It may replace a mark's facet indices
//! and add channels; added channels bound to a scale cause that scale to be inferred again
//! before anything renders.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use markplot_core::{Channel, Index, ScaleBinding, ScaleName, Table};

use crate::dimensions::Dimensions;
use crate::error::PlotError;
#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::scale::Scales;
use crate::scale_infer::resolve_binding;

/// What an initializer sees.
#[derive(Clone, Copy, Debug)]
pub struct InitializerInput<'a> {
    /// The mark's working data.
    pub data: &'a Table,
    /// One index per facet cell.
    pub facets: &'a [Index],
    /// The mark's resolved channels.
    pub channels: &'a [Channel],
    /// Finalized scales.
    pub scales: &'a Scales,
    /// Plot dimensions.
    pub dimensions: &'a Dimensions,
}

impl InitializerInput<'_> {
    /// Returns a channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Returns the pixel position of `row` on a position channel (band centers for bands).
    pub fn position(&self, name: &str, row: usize) -> Option<f64> {
        let channel = self.channel(name)?;
        let v = channel.values.get(row)?;
        match resolve_binding(channel).and_then(|n| self.scales.get(n)) {
            Some(scale) => Some(scale.apply_f64(v)? + scale.bandwidth() / 2.0),
            None => v.as_f64(),
        }
    }
}

/// What an initializer returns.
#[derive(Clone, Debug, Default)]
pub struct InitializerOutput {
    /// Replacement facet indices, one per cell.
    pub facets: Option<Vec<Index>>,
    /// Added or replaced channels, aligned with the mark's data.
    pub channels: Vec<Channel>,
}

impl InitializerOutput {
    /// Scales the added channels bind to.
    pub(crate) fn scales(&self) -> impl Iterator<Item = ScaleName> + '_ {
        self.channels
            .iter()
            .filter(|c| c.scale != ScaleBinding::Unscaled)
            .filter_map(resolve_binding)
    }
}

/// A user-supplied initializer.
pub type InitializerFn =
    Arc<dyn Fn(&InitializerInput<'_>) -> Result<InitializerOutput, PlotError> + Send + Sync>;

/// A post-scale transform.
#[derive(Clone)]
pub enum Initializer {
    /// Keeps, in each cell, the row nearest to a pixel position (a static pointer).
    Nearest {
        /// Pointer x, in frame pixels.
        x: f64,
        /// Pointer y, in frame pixels.
        y: f64,
        /// Rows farther away than this are never selected.
        max_distance: f64,
    },
    /// A user-supplied initializer.
    Custom(InitializerFn),
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest { x, y, max_distance } => f
                .debug_struct("Nearest")
                .field("x", x)
                .field("y", y)
                .field("max_distance", max_distance)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Initializer {
    /// Selects the row nearest to `(x, y)` in each cell.
    pub fn nearest(x: f64, y: f64) -> Self {
        Self::Nearest {
            x,
            y,
            max_distance: 40.0,
        }
    }

    /// Wraps a closure as an initializer.
    pub fn custom(
        f: impl Fn(&InitializerInput<'_>) -> Result<InitializerOutput, PlotError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub(crate) fn apply(
        &self,
        input: &InitializerInput<'_>,
    ) -> Result<InitializerOutput, PlotError> {
        match self {
            Self::Nearest { x, y, max_distance } => Ok(InitializerOutput {
                facets: Some(
                    input
                        .facets
                        .iter()
                        .map(|facet| nearest(input, facet, *x, *y, *max_distance))
                        .collect(),
                ),
                channels: Vec::new(),
            }),
            Self::Custom(f) => f(input),
        }
    }
}

fn nearest(
    input: &InitializerInput<'_>,
    facet: &[usize],
    px: f64,
    py: f64,
    max_distance: f64,
) -> Index {
    let has_x = input.channel("x").is_some();
    let has_y = input.channel("y").is_some();
    let mut best: Option<(f64, usize)> = None;
    for &row in facet {
        let dx = if has_x {
            match input.position("x", row) {
                Some(x) => x - px,
                None => continue,
            }
        } else {
            0.0
        };
        let dy = if has_y {
            match input.position("y", row) {
                Some(y) => y - py,
                None => continue,
            }
        } else {
            0.0
        };
        let d = (dx * dx + dy * dy).sqrt();
        if d <= max_distance && best.is_none_or(|(b, _)| d < b) {
            best = Some((d, row));
        }
    }
    best.map(|(_, row)| alloc::vec![row]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use markplot_core::{ScaleType, Value};

    use super::*;
    use crate::dimensions::{DimensionOptions, GridShape, Margins};
    use crate::scale::{Continuous, Mapping, Scale, ScaleKind};

    #[test]
    fn nearest_keeps_one_row_per_cell() {
        let mut scales = Scales::new();
        scales.insert(Scale::new(
            ScaleName::X,
            ScaleType::Linear,
            ScaleKind::Continuous(Continuous::new(
                Mapping::Linear,
                vec![0.0, 10.0],
                vec![0.0, 100.0],
            )),
        ));
        let x = Channel::new(
            "x",
            vec![Value::from(1.0), Value::from(4.0), Value::from(9.0)],
            ScaleBinding::Scale(ScaleName::X),
        );
        let data = Table::empty(3);
        let dims = Dimensions::arrange(
            &DimensionOptions::default(),
            Margins::ZERO,
            Margins::ZERO,
            GridShape::default(),
        )
        .expect("fits");
        let channels = [x];
        let facets = [vec![0, 1], vec![2], vec![]];
        let input = InitializerInput {
            data: &data,
            facets: &facets,
            channels: &channels,
            scales: &scales,
            dimensions: &dims,
        };
        let out = Initializer::nearest(35.0, 0.0)
            .apply(&input)
            .expect("nearest applies");
        assert_eq!(out.facets, Some(vec![vec![1], vec![], vec![]]));
    }
}
