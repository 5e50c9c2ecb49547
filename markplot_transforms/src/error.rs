// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

extern crate alloc;

use alloc::string::String;

use markplot_core::{ConfigurationError, DataShapeError};
use thiserror::Error;

/// Errors returned by transforms.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TransformError {
    /// A transform read a column the data does not have.
    #[error("transform `{transform}` reads missing column `{column}`")]
    MissingColumn {
        /// The transform name.
        transform: &'static str,
        /// The missing column.
        column: String,
    },
    /// Invalid transform options.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Misaligned data.
    #[error(transparent)]
    DataShape(#[from] DataShapeError),
    /// A failure reported by a custom transform.
    #[error("custom transform failed: {0}")]
    Custom(String),
}
