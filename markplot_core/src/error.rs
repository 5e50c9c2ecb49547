// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fatal error types shared by the markplot crates.
//!
//! Mixed-type domains are not errors: they are coerced and logged by the scale engine.
//! Undefined positions are not errors either: the affected rows are simply not drawn.

extern crate alloc;

use alloc::string::String;

use thiserror::Error;

use crate::scale_name::{ScaleName, ScaleType};

/// Invalid plot, scale, or mark options.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    /// A log scale was asked to cover zero or negative values.
    #[error("log scale `{scale}` domain [{min}, {max}] includes or crosses zero")]
    LogDomainCrossesZero {
        /// The offending scale.
        scale: ScaleName,
        /// Domain minimum.
        min: f64,
        /// Domain maximum.
        max: f64,
    },
    /// A scale type does not fit the values bound to the scale.
    #[error("scale `{scale}` cannot be of type `{scale_type}`: {reason}")]
    IncompatibleScaleType {
        /// The offending scale.
        scale: ScaleName,
        /// The requested type.
        scale_type: ScaleType,
        /// Why the type does not fit.
        reason: &'static str,
    },
    /// An unknown color scheme name.
    #[error("unknown color scheme `{0}`")]
    UnknownScheme(String),
    /// An unknown curve name.
    #[error("unknown curve `{0}`")]
    UnknownCurve(String),
    /// An unknown scale type name.
    #[error("unknown scale type `{0}`")]
    UnknownScaleType(String),
    /// An unknown scale name.
    #[error("unknown scale `{0}`")]
    UnknownScaleName(String),
    /// An unknown symbol name.
    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),
    /// A color string that does not parse as a CSS color.
    #[error("invalid color `{0}`")]
    InvalidColor(String),
    /// A channel name the mark does not declare.
    #[error("mark `{mark}` has no channel `{channel}`")]
    UnknownChannel {
        /// The mark name.
        mark: &'static str,
        /// The offending channel name.
        channel: String,
    },
    /// A mark is missing a channel it requires.
    #[error("mark `{mark}` requires channel `{channel}`")]
    MissingChannel {
        /// The mark name.
        mark: &'static str,
        /// The required channel name.
        channel: &'static str,
    },
    /// An axis option outside the allowed set.
    #[error("invalid axis anchor `{0}` (expected top, bottom, left, right, both or none)")]
    InvalidAxis(String),
    /// A facet mode outside the allowed set.
    #[error("unknown facet mode `{0}` (expected auto, include, exclude or none)")]
    UnknownFacetMode(String),
    /// Margins leave no room for the plot area.
    #[error("margins exceed the plot size (inner area {width}x{height})")]
    MarginsExceedSize {
        /// Computed inner width.
        width: f64,
        /// Computed inner height.
        height: f64,
    },
    /// A window transform with a zero-sized window.
    #[error("window size must be at least 1, got {0}")]
    InvalidWindow(usize),
    /// A bin transform with no usable thresholds.
    #[error("bin thresholds must be a positive count or at least one threshold")]
    InvalidBins,
}

/// Data whose shape breaks an index/value invariant.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DataShapeError {
    /// An index references a row past the end of its table.
    #[error("index {index} is out of bounds for {len} rows")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The table length.
        len: usize,
    },
    /// A transform returned a different number of facets than it received.
    #[error("transform returned {actual} facets, expected {expected}")]
    FacetCountMismatch {
        /// Facets handed to the transform.
        expected: usize,
        /// Facets returned.
        actual: usize,
    },
    /// A literal channel array is not aligned with its data.
    #[error("channel `{channel}` has {actual} values for {expected} rows")]
    LiteralLength {
        /// The channel name.
        channel: String,
        /// Rows in the data.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },
    /// A column is not aligned with its table.
    #[error("column `{column}` has {actual} values for {expected} rows")]
    ColumnLength {
        /// The column name.
        column: String,
        /// Rows in the table.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },
    /// A mark opted into faceting with data that does not align with the facet data.
    #[error("mark data has {actual} rows but the facet data has {expected}")]
    FacetDataLength {
        /// Rows in the facet data.
        expected: usize,
        /// Rows in the mark data.
        actual: usize,
    },
}
