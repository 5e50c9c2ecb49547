// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use markplot_core::{ConfigurationError, DataShapeError};
use markplot_transforms::TransformError;
use thiserror::Error;

/// Errors returned by [`plot`](crate::plot) and the two-phase API.
///
/// Every error is fatal: no partial plot is produced.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PlotError {
    /// Invalid plot, scale or mark options.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Data whose shape breaks an index/value invariant.
    #[error(transparent)]
    DataShape(#[from] DataShapeError),
    /// A transform failed.
    #[error("mark `{mark}`: {source}")]
    Transform {
        /// The mark whose transform failed.
        mark: &'static str,
        /// The underlying failure.
        source: TransformError,
    },
}

/// Result alias for plotting.
pub type Result<T, E = PlotError> = core::result::Result<T, E>;
