// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Series-wise mappings of a column.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;

use markplot_core::{Index, Table, Value};

use crate::error::TransformError;
use crate::transform::{require, series};

/// A mapping over one series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapOp {
    /// Running sum in series order; undefined values contribute nothing.
    Cumsum,
    /// Zero-based rank among defined values; ties share the lowest rank.
    Rank,
    /// Rank scaled to `[0, 1]`.
    Quantile,
}

/// Maps a column series by series, writing a new column.
#[derive(Clone, Debug, PartialEq)]
pub struct Map {
    /// Input column.
    pub field: Arc<str>,
    /// Output column.
    pub output: Arc<str>,
    /// The mapping.
    pub op: MapOp,
    /// Optional series column.
    pub z: Option<Arc<str>>,
}

impl Map {
    /// Maps `field` into `output`.
    pub fn new(field: impl Into<Arc<str>>, output: impl Into<Arc<str>>, op: MapOp) -> Self {
        Self {
            field: field.into(),
            output: output.into(),
            op,
            z: None,
        }
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
        let values = require(data, "map", &self.field)?;
        let mut out = alloc::vec![Value::Null; data.len()];
        for facet in facets {
            for run in series(data, facet, self.z.as_deref()) {
                match self.op {
                    MapOp::Cumsum => {
                        let mut acc = 0.0;
                        for &r in &run {
                            acc += values[r].as_f64().unwrap_or(0.0);
                            out[r] = Value::from(acc);
                        }
                    }
                    MapOp::Rank | MapOp::Quantile => {
                        let mut defined: Vec<usize> = run
                            .iter()
                            .copied()
                            .filter(|&r| values[r].is_defined())
                            .collect();
                        defined.sort_by(|&a, &b| values[a].natural_cmp(&values[b]));
                        let n = defined.len();
                        let mut rank = 0;
                        for (i, &r) in defined.iter().enumerate() {
                            if i > 0 && values[defined[i - 1]].natural_cmp(&values[r]) != Ordering::Equal {
                                rank = i;
                            }
                            out[r] = match self.op {
                                MapOp::Quantile if n > 1 => Value::from(rank as f64 / (n - 1) as f64),
                                MapOp::Quantile => Value::from(0.0),
                                _ => Value::from(rank as f64),
                            };
                        }
                    }
                }
            }
        }
        Ok((data.with_column(self.output.clone(), out)?, facets.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    #[test]
    fn cumsum_runs_per_series_in_facet_order() {
        let t = Table::from_columns([
            (
                "v",
                vec![Value::from(1.0), Value::from(2.0), Value::from(3.0), Value::Null],
            ),
            (
                "z",
                vec![Value::from("a"), Value::from("b"), Value::from("a"), Value::from("b")],
            ),
        ])
        .expect("valid table");
        let (out, _) = Map::new("v", "c", MapOp::Cumsum)
            .with_z("z")
            .apply(&t, &[vec![2, 1, 0, 3]])
            .expect("map applies");
        let c = out.column("c").expect("output column");
        assert_eq!(&**c, &[Value::from(4.0), Value::from(2.0), Value::from(3.0), Value::from(2.0)]);
    }

    #[test]
    fn ranks_share_ties() {
        let t = Table::from_columns([(
            "v",
            vec![Value::from(5.0), Value::from(1.0), Value::from(5.0), Value::Null],
        )])
        .expect("valid table");
        let (out, _) = Map::new("v", "r", MapOp::Rank)
            .apply(&t, &[t.indices()])
            .expect("map applies");
        let r = out.column("r").expect("output column");
        assert_eq!(&**r, &[Value::from(1.0), Value::from(0.0), Value::from(1.0), Value::Null]);
    }
}
