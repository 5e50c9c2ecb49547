// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Facet partitioning: splitting row indices into an ordered grid of cells.
//!
//! A plot with `fx` and/or `fy` facet channels is drawn as a grid of small multiples. Each cell
//! is keyed by an `(fx, fy)` pair taken from the facet scales' domains; every faceted mark owns
//! one index per cell. Cells iterate `fy` outer, `fx` inner.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::str::FromStr;

use hashbrown::HashMap;
use markplot_core::{ChannelValue, ConfigurationError, Index, Table, Value, ValueKey};

/// How a mark participates in faceting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FacetMode {
    /// Faceted when the mark's data is the facet data, or when the mark has its own facet
    /// channels.
    #[default]
    Auto,
    /// Faceted by the plot's facet channels, read by row position from the facet data.
    Include,
    /// In each cell, drawn with the rows of every other cell.
    Exclude,
    /// Drawn identically in every cell.
    None,
}

impl FromStr for FacetMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            "none" => Ok(Self::None),
            other => Err(ConfigurationError::UnknownFacetMode(other.into())),
        }
    }
}

/// Which facet values a mark is partitioned by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FacetSource {
    /// The plot's facet channels.
    Plot,
    /// The mark's own `fx`/`fy` channels.
    Own,
    /// Not partitioned.
    Unfaceted,
}

impl FacetMode {
    /// Decides where a mark's facet values come from.
    ///
    /// `same_data` is whether the mark's data is the plot's facet data, `own` whether the mark
    /// declares its own facet channels and `plot` whether the plot declares any.
    pub(crate) fn source(self, same_data: bool, own: bool, plot: bool) -> FacetSource {
        match self {
            Self::None => FacetSource::Unfaceted,
            _ if own => FacetSource::Own,
            Self::Auto if plot && same_data => FacetSource::Plot,
            Self::Include | Self::Exclude if plot => FacetSource::Plot,
            _ => FacetSource::Unfaceted,
        }
    }
}

/// Plot-level facet options.
#[derive(Clone, Debug, Default)]
pub struct FacetOptions {
    /// Facet data; marks with the same table are faceted automatically.
    pub data: Option<Table>,
    /// Horizontal facet channel (`fx`).
    pub x: Option<ChannelValue>,
    /// Vertical facet channel (`fy`).
    pub y: Option<ChannelValue>,
    /// Space above the grid for the `fx` axis.
    pub margin_top: Option<f64>,
    /// Space right of the grid for the `fy` axis.
    pub margin_right: Option<f64>,
    /// Space below the grid.
    pub margin_bottom: Option<f64>,
    /// Space left of the grid.
    pub margin_left: Option<f64>,
    /// Draws grid lines between cells at each facet value.
    pub grid: bool,
    /// Label of the facet axes.
    pub label: Option<Arc<str>>,
}

impl FacetOptions {
    /// Facets `data`.
    pub fn new(data: Table) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// Sets the horizontal facet channel.
    pub fn with_x(mut self, x: impl Into<ChannelValue>) -> Self {
        self.x = Some(x.into());
        self
    }

    /// Sets the vertical facet channel.
    pub fn with_y(mut self, y: impl Into<ChannelValue>) -> Self {
        self.y = Some(y.into());
        self
    }

    /// Sets all four facet margins.
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin_top = Some(margin);
        self.margin_right = Some(margin);
        self.margin_bottom = Some(margin);
        self.margin_left = Some(margin);
        self
    }

    /// Draws facet grid lines.
    pub fn with_grid(mut self, grid: bool) -> Self {
        self.grid = grid;
        self
    }

    /// Sets the facet axis label.
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns `true` if any facet channel is declared.
    pub fn is_faceted(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}

/// Rows sharing an `(fx, fy)` key.
#[derive(Clone, Debug, PartialEq)]
pub struct FacetGroup {
    /// The `fx` value of the group, if faceted horizontally.
    pub fx: Option<Value>,
    /// The `fy` value of the group, if faceted vertically.
    pub fy: Option<Value>,
    /// Rows of the group, in input order.
    pub index: Index,
}

/// The groups of one partitioned index, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FacetGroups {
    groups: Vec<FacetGroup>,
}

impl FacetGroups {
    /// Returns the groups.
    pub fn groups(&self) -> &[FacetGroup] {
        &self.groups
    }

    /// Returns the number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Groups `index` by the facet values of each row.
///
/// Without facet values the result is a single group holding the whole index.
pub fn partition(index: &[usize], fx: Option<&[Value]>, fy: Option<&[Value]>) -> FacetGroups {
    if fx.is_none() && fy.is_none() {
        return FacetGroups {
            groups: alloc::vec![FacetGroup {
                fx: None,
                fy: None,
                index: index.to_vec(),
            }],
        };
    }
    let mut slots: HashMap<(Option<ValueKey>, Option<ValueKey>), usize> = HashMap::new();
    let mut groups: Vec<FacetGroup> = Vec::new();
    for &i in index {
        let x = fx.map(|v| &v[i]);
        let y = fy.map(|v| &v[i]);
        let key = (x.map(Value::key), y.map(Value::key));
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(FacetGroup {
                fx: x.cloned(),
                fy: y.cloned(),
                index: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].index.push(i);
    }
    FacetGroups { groups }
}

/// One cell of the facet grid.
#[derive(Clone, Debug, PartialEq)]
pub struct FacetCell {
    /// Position in cell order (`fy` outer, `fx` inner).
    pub index: usize,
    /// Column in the grid.
    pub col: usize,
    /// Row in the grid.
    pub row: usize,
    /// The cell's `fx` value.
    pub fx: Option<Value>,
    /// The cell's `fy` value.
    pub fy: Option<Value>,
}

/// The ordered facet grid: the cross product of the `fx` and `fy` domains.
#[derive(Clone, Debug, Default)]
pub struct FacetGrid {
    fx: Option<Vec<Value>>,
    fy: Option<Vec<Value>>,
    fx_slots: HashMap<ValueKey, usize>,
    fy_slots: HashMap<ValueKey, usize>,
}

fn slots(domain: Option<&Vec<Value>>) -> HashMap<ValueKey, usize> {
    domain
        .map(|d| d.iter().enumerate().map(|(i, v)| (v.key(), i)).collect())
        .unwrap_or_default()
}

impl FacetGrid {
    /// Creates a grid from the facet domains; a missing domain is a single implicit column
    /// (or row).
    pub fn new(fx: Option<Vec<Value>>, fy: Option<Vec<Value>>) -> Self {
        let fx_slots = slots(fx.as_ref());
        let fy_slots = slots(fy.as_ref());
        Self {
            fx,
            fy,
            fx_slots,
            fy_slots,
        }
    }

    /// The single implicit cell of an unfaceted plot.
    pub fn implicit() -> Self {
        Self::default()
    }

    /// Returns `true` unless this is the implicit grid.
    pub fn is_faceted(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }

    /// Returns the `fx` domain.
    pub fn fx(&self) -> Option<&[Value]> {
        self.fx.as_deref()
    }

    /// Returns the `fy` domain.
    pub fn fy(&self) -> Option<&[Value]> {
        self.fy.as_deref()
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.fx.as_ref().map_or(1, |d| d.len().max(1))
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.fy.as_ref().map_or(1, |d| d.len().max(1))
    }

    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        self.cols() * self.rows()
    }

    /// Returns `true` if the grid has no cells; a grid always has at least one.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cell at `index`.
    pub fn cell(&self, index: usize) -> FacetCell {
        let cols = self.cols();
        let (row, col) = (index / cols, index % cols);
        FacetCell {
            index,
            col,
            row,
            fx: self.fx.as_ref().and_then(|d| d.get(col).cloned()),
            fy: self.fy.as_ref().and_then(|d| d.get(row).cloned()),
        }
    }

    /// Iterates the cells, `fy` outer and `fx` inner.
    pub fn cells(&self) -> impl Iterator<Item = FacetCell> + '_ {
        (0..self.len()).map(|i| self.cell(i))
    }

    /// Returns the cell a key belongs to, or `None` if the key is outside the grid.
    ///
    /// A key with no `fx` value matches every column only in an unfaceted direction.
    pub fn cell_of(&self, fx: Option<&Value>, fy: Option<&Value>) -> Option<usize> {
        let col = match (&self.fx, fx) {
            (None, _) => 0,
            (Some(_), Some(v)) => *self.fx_slots.get(&v.key())?,
            (Some(_), None) => return None,
        };
        let row = match (&self.fy, fy) {
            (None, _) => 0,
            (Some(_), Some(v)) => *self.fy_slots.get(&v.key())?,
            (Some(_), None) => return None,
        };
        Some(row * self.cols() + col)
    }

    /// Places partitioned groups into cells, one index per cell.
    ///
    /// Groups whose key falls outside the grid are dropped; their row count is returned.
    pub fn arrange(&self, groups: &FacetGroups) -> (Vec<Index>, usize) {
        let mut cells: Vec<Index> = alloc::vec![Vec::new(); self.len()];
        let mut dropped = 0;
        for group in groups.groups() {
            match self.cell_of(group.fx.as_ref(), group.fy.as_ref()) {
                Some(c) => cells[c].extend_from_slice(&group.index),
                None => dropped += group.index.len(),
            }
        }
        (cells, dropped)
    }
}

/// Gives every cell the full index.
pub fn broadcast(index: &[usize], cells: usize) -> Vec<Index> {
    alloc::vec![index.to_vec(); cells]
}

/// Gives every cell the rows of every other cell, in cell order.
pub fn exclude(cells: &[Index]) -> Vec<Index> {
    (0..cells.len())
        .map(|c| {
            cells
                .iter()
                .enumerate()
                .filter(|&(other, _)| other != c)
                .flat_map(|(_, rows)| rows.iter().copied())
                .collect()
        })
        .collect()
}

/// Gives every occurrence of a row across `cells` a position of its own.
///
/// Returns the rows to take from the data, in cell order, and per-cell indices into the taken
/// rows. The emitted indices are unique across cells.
pub fn reindex(cells: &[Index]) -> (Index, Vec<Index>) {
    let mut rows = Vec::with_capacity(cells.iter().map(Vec::len).sum());
    let mut out = Vec::with_capacity(cells.len());
    for cell in cells {
        let start = rows.len();
        rows.extend_from_slice(cell);
        out.push((start..rows.len()).collect());
    }
    (rows, out)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn text(xs: &[&str]) -> Vec<Value> {
        xs.iter().map(|&s| Value::from(s)).collect()
    }

    #[test]
    fn partition_groups_in_first_seen_order() {
        let fx = text(&["b", "a", "b", "a", "c"]);
        let groups = partition(&[0, 1, 2, 3, 4], Some(&fx), None);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups.groups()[0].fx, Some(Value::from("b")));
        assert_eq!(groups.groups()[0].index, vec![0, 2]);
        assert_eq!(groups.groups()[2].index, vec![4]);

        let implicit = partition(&[3, 1], None, None);
        assert_eq!(implicit.groups()[0].index, vec![3, 1]);
    }

    #[test]
    fn cells_iterate_rows_outer_columns_inner() {
        let grid = FacetGrid::new(Some(text(&["a", "b"])), Some(text(&["p", "q", "r"])));
        assert_eq!(grid.len(), 6);
        let cell = grid.cell(3);
        assert_eq!((cell.row, cell.col), (1, 1));
        assert_eq!(cell.fx, Some(Value::from("b")));
        assert_eq!(cell.fy, Some(Value::from("q")));
        assert_eq!(
            grid.cell_of(Some(&Value::from("a")), Some(&Value::from("r"))),
            Some(4)
        );
    }

    #[test]
    fn arrange_keeps_empty_cells_and_drops_unknown_keys() {
        let fx = text(&["A", "A", "Z"]);
        let grid = FacetGrid::new(Some(text(&["A", "B"])), None);
        let (cells, dropped) = grid.arrange(&partition(&[0, 1, 2], Some(&fx), None));
        assert_eq!(cells, vec![vec![0, 1], vec![]]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn exclude_draws_every_other_cell() {
        let cells = vec![vec![0, 1], vec![2], vec![]];
        assert_eq!(exclude(&cells), vec![vec![2], vec![0, 1], vec![0, 1, 2]]);
        assert_eq!(broadcast(&[5, 6], 2), vec![vec![5, 6], vec![5, 6]]);
    }

    #[test]
    fn reindex_separates_overlapping_cells() {
        let cells = exclude(&[vec![0], vec![1], vec![2]]);
        let (rows, cells) = reindex(&cells);
        assert_eq!(rows, vec![1, 2, 0, 2, 0, 1]);
        assert_eq!(cells, vec![vec![0, 1], vec![2, 3], vec![4, 5]]);
    }

    #[test]
    fn modes_pick_their_facet_source() {
        assert_eq!(FacetMode::Auto.source(true, false, true), FacetSource::Plot);
        assert_eq!(
            FacetMode::Auto.source(false, false, true),
            FacetSource::Unfaceted
        );
        assert_eq!(FacetMode::Include.source(false, false, true), FacetSource::Plot);
        assert_eq!(FacetMode::Auto.source(false, true, false), FacetSource::Own);
        assert_eq!(FacetMode::None.source(true, true, true), FacetSource::Unfaceted);
        assert!("sideways".parse::<FacetMode>().is_err());
    }
}
