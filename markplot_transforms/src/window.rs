// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Moving-window reductions.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use markplot_core::{ConfigurationError, Index, Table, Value};

use crate::error::TransformError;
use crate::reduce::Reduce;
use crate::transform::{require, series};

/// Where the output of a window is written relative to the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WindowAnchor {
    /// The window is centered on the output row (leaning backward for even sizes).
    #[default]
    Middle,
    /// The window starts at the output row.
    Start,
    /// The window ends at the output row.
    End,
}

impl WindowAnchor {
    /// Offset of the output row from the window's first row.
    fn shift(self, k: usize) -> usize {
        match self {
            Self::Middle => (k - 1) >> 1,
            Self::Start => 0,
            Self::End => k - 1,
        }
    }
}

/// A moving window over each series of each facet, in index order.
#[derive(Clone, Debug, PartialEq)]
pub struct Window {
    /// Input column.
    pub field: Arc<str>,
    /// Output column.
    pub output: Arc<str>,
    /// Window size in rows.
    pub k: usize,
    /// Output anchoring.
    pub anchor: WindowAnchor,
    /// Reducer applied to each window.
    pub reduce: Reduce,
    /// When set, windows that extend past the series or contain an undefined value (for
    /// non-positional reducers) produce an undefined output instead of being truncated.
    pub strict: bool,
    /// Optional series column; each series is windowed independently.
    pub z: Option<Arc<str>>,
}

impl Window {
    /// A centered, non-strict moving mean of size `k`.
    pub fn new(field: impl Into<Arc<str>>, output: impl Into<Arc<str>>, k: usize) -> Self {
        Self {
            field: field.into(),
            output: output.into(),
            k,
            anchor: WindowAnchor::Middle,
            reduce: Reduce::Mean,
            strict: false,
            z: None,
        }
    }

    /// Sets the anchor.
    pub fn with_anchor(mut self, anchor: WindowAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Sets the reducer.
    pub fn with_reduce(mut self, reduce: Reduce) -> Self {
        self.reduce = reduce;
        self
    }

    /// Sets strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
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
        if self.k == 0 {
            return Err(ConfigurationError::InvalidWindow(self.k).into());
        }
        let values = require(data, "window", &self.field)?;
        let mut out = alloc::vec![Value::Null; data.len()];
        for facet in facets {
            for run in series(data, facet, self.z.as_deref()) {
                self.reduce_run(values, &run, &mut out);
            }
        }
        Ok((data.with_column(self.output.clone(), out)?, facets.to_vec()))
    }

    fn reduce_run(&self, values: &[Value], run: &[usize], out: &mut [Value]) {
        let n = run.len();
        let k = self.k;
        let s = self.anchor.shift(k);
        for (i, &row) in run.iter().enumerate() {
            // The window for output position `i` starts at `i - s`.
            let (lo, hi) = if self.strict {
                if i < s || i - s + k > n {
                    continue;
                }
                (i - s, i - s + k)
            } else {
                let lo = i.saturating_sub(s);
                let hi = (i + k - s).min(n);
                (lo, hi)
            };
            let window: Vec<&Value> = run[lo..hi].iter().map(|&r| &values[r]).collect();
            if self.strict
                && !self.reduce.is_positional()
                && window.iter().any(|v| !v.is_defined())
            {
                continue;
            }
            out[row] = self.reduce.reduce(&window);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn numbers(xs: &[f64]) -> Table {
        Table::from_columns([("v", xs.iter().map(|&x| Value::from(x)).collect())])
            .expect("valid table")
    }

    fn run(w: &Window, t: &Table) -> Vec<Value> {
        let (out, facets) = w.apply(t, &[t.indices()]).expect("window applies");
        assert_eq!(facets, vec![t.indices()]);
        out.column("m").expect("output column").to_vec()
    }

    #[test]
    fn strict_mean_is_undefined_at_both_ends() {
        let t = numbers(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let w = Window::new("v", "m", 3).with_strict(true);
        assert_eq!(
            run(&w, &t),
            vec![
                Value::Null,
                Value::from(1.0),
                Value::from(2.0),
                Value::from(3.0),
                Value::from(4.0),
                Value::Null,
            ]
        );
    }

    #[test]
    fn non_strict_windows_truncate() {
        let t = numbers(&[0.0, 1.0, 2.0, 3.0]);
        let w = Window::new("v", "m", 3);
        assert_eq!(
            run(&w, &t),
            vec![
                Value::from(0.5),
                Value::from(1.0),
                Value::from(2.0),
                Value::from(2.5),
            ]
        );
    }

    #[test]
    fn end_anchor_and_undefined_values() {
        let t = Table::from_columns([(
            "v",
            vec![
                Value::from(1.0),
                Value::from(2.0),
                Value::Null,
                Value::from(4.0),
            ],
        )])
        .expect("valid table");
        let w = Window::new("v", "m", 2)
            .with_anchor(WindowAnchor::End)
            .with_reduce(Reduce::Sum)
            .with_strict(true);
        assert_eq!(
            run(&w, &t),
            vec![Value::Null, Value::from(3.0), Value::Null, Value::Null]
        );
    }

    #[test]
    fn zero_sized_windows_are_rejected() {
        let t = numbers(&[1.0]);
        assert!(matches!(
            Window::new("v", "m", 0).apply(&t, &[t.indices()]),
            Err(TransformError::Configuration(
                ConfigurationError::InvalidWindow(0)
            ))
        ));
    }

    #[test]
    fn windows_respect_facet_order() {
        let t = numbers(&[10.0, 20.0, 30.0]);
        let w = Window::new("v", "m", 2)
            .with_anchor(WindowAnchor::Start)
            .with_reduce(Reduce::Difference)
            .with_strict(true);
        let (out, _) = w.apply(&t, &[vec![2, 1, 0]]).expect("window applies");
        let m = out.column("m").expect("output column");
        assert_eq!(m[2], Value::from(-10.0));
        assert_eq!(m[1], Value::from(-10.0));
        assert_eq!(m[0], Value::Null);
    }
}
