// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pure data transforms for `markplot`.
//!
//! A transform maps a mark's data and its facet partition to a new table and a new partition:
//! `(Table, [Index]) -> (Table, [Index])`. Every built-in transform returns exactly one output
//! facet per input facet, and every emitted index is valid against the emitted table.
//!
//! Transforms never mutate their input: derived columns are added with
//! [`Table::with_column`](markplot_core::Table::with_column), and aggregating transforms
//! synthesize a fresh table.

#![no_std]

extern crate alloc;

mod bin;
mod error;
#[cfg(not(feature = "std"))]
mod float;
mod group;
mod map;
mod reduce;
mod select;
mod stack;
mod transform;
mod window;

pub use bin::{Bin, Thresholds};
pub use error::TransformError;
pub use group::Group;
pub use map::{Map, MapOp};
pub use reduce::{Output, Reduce};
pub use select::{Select, Selector};
pub use stack::{Stack, StackOffset};
pub use transform::{CompareOp, CustomTransform, Predicate, SortOrder, Transform, apply_all};
pub use window::{Window, WindowAnchor};
