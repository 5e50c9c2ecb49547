// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection of one row per series.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;

use markplot_core::{Index, Table};

use crate::error::TransformError;
use crate::transform::{require, series};

/// Which row of a series to keep.
#[derive(Clone, Debug, PartialEq)]
pub enum Selector {
    /// The first row in facet order.
    First,
    /// The last row in facet order.
    Last,
    /// The row with the smallest defined value of a column (first on ties).
    Min(Arc<str>),
    /// The row with the largest defined value of a column (first on ties).
    Max(Arc<str>),
}

/// Keeps one row per series of each facet, preserving facet order among the kept rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    /// The selector.
    pub selector: Selector,
    /// Optional series column.
    pub z: Option<Arc<str>>,
}

impl Select {
    /// Creates a selection.
    pub fn new(selector: Selector) -> Self {
        Self { selector, z: None }
    }

    /// Sets the series column.
    pub fn with_z(mut self, z: impl Into<Arc<str>>) -> Self {
        self.z = Some(z.into());
        self
    }

    pub(crate) fn apply(
        &self,
        data: &Table,
        facets: &[Index],
    ) -> Result<(Table, Vec<Index>), TransformError> {
        let extreme = match &self.selector {
            Selector::Min(f) => Some((require(data, "select", f)?, Ordering::Less)),
            Selector::Max(f) => Some((require(data, "select", f)?, Ordering::Greater)),
            Selector::First | Selector::Last => None,
        };
        let out = facets
            .iter()
            .map(|facet| {
                let mut picked: Vec<usize> = series(data, facet, self.z.as_deref())
                    .into_iter()
                    .filter_map(|run| match (&self.selector, extreme) {
                        (Selector::First, _) => run.first().copied(),
                        (Selector::Last, _) => run.last().copied(),
                        (_, Some((values, want))) => run
                            .iter()
                            .copied()
                            .filter(|&r| values[r].is_defined())
                            .reduce(|best, r| {
                                if values[r].natural_cmp(&values[best]) == want {
                                    r
                                } else {
                                    best
                                }
                            }),
                        (_, None) => None,
                    })
                    .collect();
                // Restore facet order.
                picked.sort_by_key(|r| facet.iter().position(|i| i == r));
                picked
            })
            .collect();
        Ok((data.clone(), out))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use markplot_core::Value;

    use super::*;

    fn table() -> Table {
        Table::from_columns([
            (
                "v",
                vec![Value::from(3.0), Value::from(9.0), Value::from(1.0), Value::from(4.0)],
            ),
            (
                "z",
                vec![Value::from("a"), Value::from("b"), Value::from("a"), Value::from("b")],
            ),
        ])
        .expect("valid table")
    }

    #[test]
    fn selects_extremes_per_series() {
        let t = table();
        let (_, facets) = Select::new(Selector::Max("v".into()))
            .with_z("z")
            .apply(&t, &[t.indices()])
            .expect("select applies");
        assert_eq!(facets, vec![vec![0, 1]]);
        let (_, facets) = Select::new(Selector::Min("v".into()))
            .apply(&t, &[t.indices()])
            .expect("select applies");
        assert_eq!(facets, vec![vec![2]]);
    }

    #[test]
    fn last_follows_facet_order() {
        let t = table();
        let (_, facets) = Select::new(Selector::Last)
            .with_z("z")
            .apply(&t, &[vec![3, 2, 1, 0], vec![]])
            .expect("select applies");
        assert_eq!(facets, vec![vec![1, 0], vec![]]);
    }
}
