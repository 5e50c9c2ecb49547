// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binning of a quantitative column.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use markplot_core::{ConfigurationError, Index, Table, Value, ValueKind};

use crate::error::TransformError;
#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::group::{RowsBuilder, input_columns, split_by};
use crate::reduce::Output;
use crate::transform::require;

/// How bin edges are chosen.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Thresholds {
    /// Sturges' rule on the number of binned values, rounded to a nice step.
    #[default]
    Auto,
    /// Approximately this many bins, rounded to a nice step.
    Count(usize),
    /// Bins of exactly this width, aligned to multiples of the width.
    Step(f64),
    /// Explicit edges; values outside the first and last edge are dropped.
    Values(Vec<f64>),
}

/// Bins a column and reduces each non-empty bin.
///
/// Bins are shared by every facet (the extent is taken over all facets). Each facet emits one
/// row per non-empty `(group, bin)`, groups in first-seen order and bins ascending. The output
/// table holds the bin bounds, the group columns and the reducer outputs.
#[derive(Clone, Debug, PartialEq)]
pub struct Bin {
    /// Column to bin.
    pub field: Arc<str>,
    /// Edge selection.
    pub thresholds: Thresholds,
    /// Extra grouping columns (for example a series or fill column).
    pub group_by: Vec<Arc<str>>,
    /// Reducer outputs.
    pub outputs: Vec<Output>,
    /// Output column for the lower bound.
    pub start: Arc<str>,
    /// Output column for the upper bound.
    pub end: Arc<str>,
}

impl Bin {
    /// Bins `field` into `x1`/`x2` with the given outputs.
    pub fn new(field: impl Into<Arc<str>>, outputs: Vec<Output>) -> Self {
        Self {
            field: field.into(),
            thresholds: Thresholds::Auto,
            group_by: Vec::new(),
            outputs,
            start: "x1".into(),
            end: "x2".into(),
        }
    }

    /// Sets the thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Adds a grouping column.
    pub fn with_group_by(mut self, column: impl Into<Arc<str>>) -> Self {
        self.group_by.push(column.into());
        self
    }

    /// Sets the bound column names.
    pub fn with_outputs(mut self, start: impl Into<Arc<str>>, end: impl Into<Arc<str>>) -> Self {
        self.start = start.into();
        self.end = end.into();
        self
    }

    pub(crate) fn apply(
        &self,
        data: &Table,
        facets: &[Index],
    ) -> Result<(Table, Vec<Index>), TransformError> {
        let values = require(data, "bin", &self.field)?;
        let groups = self
            .group_by
            .iter()
            .map(|g| require(data, "bin", g))
            .collect::<Result<Vec<_>, _>>()?;
        let inputs = input_columns(data, "bin", &self.outputs)?;

        let mut n = 0_usize;
        let mut extent: Option<(f64, f64)> = None;
        let mut dates = true;
        for &i in facets.iter().flatten() {
            if let Some(x) = values[i].as_f64() {
                n += 1;
                dates &= values[i].kind() == ValueKind::Date;
                extent = Some(extent.map_or((x, x), |(lo, hi)| (lo.min(x), hi.max(x))));
            }
        }
        let edges = match extent {
            Some((lo, hi)) => self.edges(lo, hi, n)?,
            None => {
                self.edges(0.0, 1.0, 1)?;
                Vec::new()
            }
        };
        let bound = |x: f64| {
            if dates {
                Value::Date(x as i64)
            } else {
                Value::from(x)
            }
        };

        let mut builder = RowsBuilder::new(2 + groups.len(), self.outputs.len());
        let mut out_facets = Vec::with_capacity(facets.len());
        for facet in facets {
            let mut out_facet = Vec::new();
            for rows in split_by(facet, &groups) {
                let mut bins: Vec<Vec<usize>> = alloc::vec![Vec::new(); edges.len().saturating_sub(1)];
                for &r in &rows {
                    if let Some(b) = values[r].as_f64().and_then(|x| bin_of(&edges, x)) {
                        bins[b].push(r);
                    }
                }
                for (b, members) in bins.iter().enumerate() {
                    if members.is_empty() {
                        continue;
                    }
                    let first = members[0];
                    let keys = [bound(edges[b]), bound(edges[b + 1])]
                        .into_iter()
                        .chain(groups.iter().map(|g| g[first].clone()));
                    let outputs = self
                        .outputs
                        .iter()
                        .zip(&inputs)
                        .map(|(o, col)| o.reduce_rows(*col, members));
                    out_facet.push(builder.push(keys, outputs));
                }
            }
            out_facets.push(out_facet);
        }
        let names = [self.start.clone(), self.end.clone()]
            .into_iter()
            .chain(self.group_by.iter().cloned());
        Ok((builder.finish(names, &self.outputs)?, out_facets))
    }

    fn edges(&self, lo: f64, hi: f64, n: usize) -> Result<Vec<f64>, ConfigurationError> {
        match &self.thresholds {
            Thresholds::Values(v) => {
                if v.is_empty() {
                    return Err(ConfigurationError::InvalidBins);
                }
                let mut v = v.clone();
                v.retain(|x| x.is_finite());
                v.sort_by(f64::total_cmp);
                v.dedup();
                if v.len() == 1 {
                    v.push(v[0]);
                }
                Ok(v)
            }
            Thresholds::Step(step) => {
                if !(step.is_finite() && *step > 0.0) {
                    return Err(ConfigurationError::InvalidBins);
                }
                Ok(aligned_edges(lo, hi, *step))
            }
            Thresholds::Count(0) => Err(ConfigurationError::InvalidBins),
            Thresholds::Count(count) => Ok(aligned_edges(lo, hi, tick_step(lo, hi, *count))),
            Thresholds::Auto => {
                let count = sturges(n);
                Ok(aligned_edges(lo, hi, tick_step(lo, hi, count)))
            }
        }
    }
}

/// Sturges' formula: `ceil(log2(n)) + 1`.
fn sturges(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (usize::BITS - (n - 1).leading_zeros()) as usize + 1
}

/// A nice 1/2/5 step splitting `[lo, hi]` into roughly `count` bins.
fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let span = hi - lo;
    if span <= 0.0 {
        return 1.0;
    }
    let raw = span / count.max(1) as f64;
    let power = 10_f64.powi(raw.log10().floor() as i32);
    let error = raw / power;
    let factor = if error >= 50_f64.sqrt() {
        10.0
    } else if error >= 10_f64.sqrt() {
        5.0
    } else if error >= 2_f64.sqrt() {
        2.0
    } else {
        1.0
    };
    power * factor
}

/// Edges at multiples of `step` covering `[lo, hi]`.
fn aligned_edges(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    let k0 = (lo / step).floor();
    let mut k1 = (hi / step).ceil();
    if k1 <= k0 {
        k1 = k0 + 1.0;
    }
    // Fractional steps divide by the (integral) inverse to avoid accumulating error.
    let inverse = 1.0 / step;
    let at = |k: f64| {
        if step < 1.0 && (inverse - (inverse + 0.5).floor()).abs() < 1e-9 {
            k / (inverse + 0.5).floor()
        } else {
            k * step
        }
    };
    let count = (k1 - k0) as usize;
    (0..=count).map(|i| at(k0 + i as f64)).collect()
}

/// Returns the bin of `x`: `[e_i, e_i+1)`, with the last bin closed.
fn bin_of(edges: &[f64], x: f64) -> Option<usize> {
    let (&first, &last) = (edges.first()?, edges.last()?);
    if x < first || x > last {
        return None;
    }
    let bins = edges.len() - 1;
    if bins == 0 {
        return None;
    }
    let j = edges.partition_point(|&e| e <= x);
    Some((j.max(1) - 1).min(bins - 1))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;
    use crate::reduce::Reduce;

    fn table(xs: &[f64]) -> Table {
        Table::from_columns([
            ("v", xs.iter().map(|&x| Value::from(x)).collect()),
            (
                "s",
                xs.iter()
                    .enumerate()
                    .map(|(i, _)| Value::from(if i % 2 == 0 { "even" } else { "odd" }))
                    .collect(),
            ),
        ])
        .expect("valid table")
    }

    #[test]
    fn step_bins_count_rows() {
        let t = table(&[0.5, 1.5, 1.7, 4.0]);
        let bin = Bin::new("v", vec![Output::count("y")]).with_thresholds(Thresholds::Step(1.0));
        let (out, facets) = bin.apply(&t, &[t.indices()]).expect("bin applies");
        // Bin [3, 4) is empty, and 4.0 falls in the last (closed) bin.
        assert_eq!(facets, vec![vec![0, 1, 2]]);
        assert_eq!(out.get(0, "x1"), &Value::from(0.0));
        assert_eq!(out.get(1, "y"), &Value::from(2.0));
        assert_eq!(out.get(2, "x2"), &Value::from(4.0));
    }

    #[test]
    fn counts_round_to_nice_steps() {
        assert_eq!(tick_step(0.0, 10.0, 5), 2.0);
        assert_eq!(tick_step(0.0, 1.0, 10), 0.1);
        assert_eq!(aligned_edges(0.05, 0.3, 0.1), vec![0.0, 0.1, 0.2, 0.3]);
        assert_eq!(sturges(8), 4);
        assert_eq!(sturges(9), 5);
    }

    #[test]
    fn groups_split_bins_per_facet() {
        let t = table(&[1.0, 1.0, 2.0, 2.0]);
        let bin = Bin::new("v", vec![Output::new("total", Reduce::Sum, "v")])
            .with_thresholds(Thresholds::Values(vec![0.0, 1.5, 3.0]))
            .with_group_by("s");
        let (out, facets) = bin
            .apply(&t, &[vec![0, 1], vec![2, 3]])
            .expect("bin applies");
        assert_eq!(facets, vec![vec![0, 1], vec![2, 3]]);
        assert_eq!(out.get(0, "s"), &Value::from("even"));
        assert_eq!(out.get(3, "total"), &Value::from(2.0));
        assert_eq!(out.get(3, "x1"), &Value::from(1.5));
    }

    #[test]
    fn empty_thresholds_are_rejected() {
        let t = table(&[1.0]);
        let bin = Bin::new("v", vec![]).with_thresholds(Thresholds::Count(0));
        assert!(matches!(
            bin.apply(&t, &[t.indices()]),
            Err(TransformError::Configuration(ConfigurationError::InvalidBins))
        ));
    }
}
