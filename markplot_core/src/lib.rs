// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data model for `markplot`.
//!
//! This crate holds the pieces every layer of a plot shares:
//! - **Values and tables**: dynamically typed cells in immutable, cheaply cloneable columns.
//! - **Channels**: a mark's declared visual properties, classified and materialized per row.
//! - **Nodes**: the immutable drawable tree rendering produces.
//! - **Errors**: the fatal error taxonomy.
//!
//! Scales, faceting and rendering live in `markplot`; data transforms in `markplot_transforms`.

#![no_std]

extern crate alloc;

mod channel;
mod error;
mod node;
mod scale_name;
mod table;
mod value;

pub use channel::{
    Accessor, Channel, ChannelHint, ChannelSpec, ChannelValue, Resolved, ScaleBinding,
};
pub use error::{ConfigurationError, DataShapeError};
pub use node::{Group, Node, PathNode, RectNode, Style, TextAnchor, TextBaseline, TextNode};
pub use scale_name::{ScaleName, ScaleType};
pub use table::{Column, Index, RowRef, Table, check_indices};
pub use value::{MS_PER_DAY, Value, ValueKey, ValueKind};
