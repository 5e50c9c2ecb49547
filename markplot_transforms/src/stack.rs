// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stack layout.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use markplot_core::{Index, Table, Value};

use crate::error::TransformError;
use crate::transform::{SortOrder, compare_defined, require, series};

/// Stack baseline offset mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StackOffset {
    /// Stack positive values upward and negative values downward from zero.
    #[default]
    Zero,
    /// Center each stack against the tallest stack of the facet (absolute values).
    Center,
    /// Scale each stack to the range `[0, 1]` (absolute values).
    Normalize,
}

/// Stacks a column within groups of rows sharing a `by` key.
///
/// Each facet is stacked independently. Within a group, rows stack in facet order unless
/// `order` is set; the facet order itself is left untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct Stack {
    /// Column providing the stacked length.
    pub field: Arc<str>,
    /// Group column (typically the other position); `None` stacks the whole facet.
    pub by: Option<Arc<str>>,
    /// Optional stacking order within each group.
    pub order: Option<(Arc<str>, SortOrder)>,
    /// Baseline offset.
    pub offset: StackOffset,
    /// Output column for the start offset.
    pub start: Arc<str>,
    /// Output column for the end offset.
    pub end: Arc<str>,
}

impl Stack {
    /// Stacks `field` grouped by `by`, writing `y1`/`y2`.
    pub fn new(field: impl Into<Arc<str>>, by: impl Into<Arc<str>>) -> Self {
        Self {
            field: field.into(),
            by: Some(by.into()),
            order: None,
            offset: StackOffset::Zero,
            start: "y1".into(),
            end: "y2".into(),
        }
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: StackOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the stacking order within groups.
    pub fn with_order(mut self, field: impl Into<Arc<str>>, order: SortOrder) -> Self {
        self.order = Some((field.into(), order));
        self
    }

    /// Sets the output column names.
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
        let values = require(data, "stack", &self.field)?;
        if let Some(by) = &self.by {
            require(data, "stack", by)?;
        }
        let order = match &self.order {
            Some((field, order)) => Some((require(data, "stack", field)?, *order)),
            None => None,
        };
        let n = data.len();
        let mut y1 = alloc::vec![Value::Null; n];
        let mut y2 = alloc::vec![Value::Null; n];
        let number = |row: usize| values[row].as_f64();

        for facet in facets {
            let mut groups = series(data, facet, self.by.as_deref());
            if let Some((key, order)) = order {
                for group in &mut groups {
                    group.sort_by(|&a, &b| compare_defined(&key[a], &key[b], order));
                }
            }
            let abs_sum = |group: &[usize]| -> f64 {
                group.iter().filter_map(|&r| number(r)).map(f64::abs).sum()
            };
            let max_abs_sum = match self.offset {
                StackOffset::Center => groups.iter().map(|g| abs_sum(g.as_slice())).fold(0.0, f64::max),
                _ => 0.0,
            };
            for group in &groups {
                match self.offset {
                    StackOffset::Zero => {
                        let mut last_pos = 0.0_f64;
                        let mut last_neg = 0.0_f64;
                        for &row in group {
                            let Some(v) = number(row) else { continue };
                            let last = if v < 0.0 { &mut last_neg } else { &mut last_pos };
                            y1[row] = Value::from(*last);
                            *last += v;
                            y2[row] = Value::from(*last);
                        }
                    }
                    StackOffset::Center => {
                        let mut last = (max_abs_sum - abs_sum(group)) * 0.5;
                        for &row in group {
                            let Some(v) = number(row) else { continue };
                            y1[row] = Value::from(last);
                            last += v.abs();
                            y2[row] = Value::from(last);
                        }
                    }
                    StackOffset::Normalize => {
                        let total = abs_sum(group);
                        let unit = |acc: f64| if total == 0.0 { 0.0 } else { acc / total };
                        let mut acc = 0.0_f64;
                        for &row in group {
                            let Some(v) = number(row) else { continue };
                            y1[row] = Value::from(unit(acc));
                            acc += v.abs();
                            y2[row] = Value::from(unit(acc));
                        }
                    }
                }
            }
        }
        let out = data
            .with_column(self.start.clone(), y1)?
            .with_column(self.end.clone(), y2)?;
        Ok((out, facets.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn table() -> Table {
        Table::from_columns([
            (
                "x",
                vec![
                    Value::from("a"),
                    Value::from("a"),
                    Value::from("a"),
                    Value::from("b"),
                ],
            ),
            (
                "y",
                vec![
                    Value::from(1.0),
                    Value::from(-2.0),
                    Value::from(3.0),
                    Value::Null,
                ],
            ),
            (
                "k",
                vec![
                    Value::from(2.0),
                    Value::from(1.0),
                    Value::from(0.0),
                    Value::from(0.0),
                ],
            ),
        ])
        .expect("valid table")
    }

    fn col(t: &Table, name: &str) -> Vec<Value> {
        t.column(name).expect("output column").to_vec()
    }

    #[test]
    fn zero_offset_splits_signs() {
        let t = table();
        let (out, facets) = Stack::new("y", "x")
            .apply(&t, &[t.indices()])
            .expect("stack applies");
        assert_eq!(facets, vec![t.indices()]);
        assert_eq!(
            col(&out, "y1"),
            vec![
                Value::from(0.0),
                Value::from(0.0),
                Value::from(1.0),
                Value::Null
            ]
        );
        assert_eq!(
            col(&out, "y2"),
            vec![
                Value::from(1.0),
                Value::from(-2.0),
                Value::from(4.0),
                Value::Null
            ]
        );
    }

    #[test]
    fn order_changes_layout_not_row_order() {
        let t = table();
        let (out, facets) = Stack::new("y", "x")
            .with_order("k", SortOrder::Asc)
            .apply(&t, &[t.indices()])
            .expect("stack applies");
        assert_eq!(facets, vec![t.indices()]);
        // Row 2 (k = 0) stacks first, then row 0.
        assert_eq!(col(&out, "y1")[2], Value::from(0.0));
        assert_eq!(col(&out, "y1")[0], Value::from(3.0));
    }

    #[test]
    fn normalize_produces_unit_stacks() {
        let t = table();
        let (out, _) = Stack::new("y", "x")
            .with_offset(StackOffset::Normalize)
            .apply(&t, &[t.indices()])
            .expect("stack applies");
        assert_eq!(col(&out, "y2")[2], Value::from(1.0));
        assert_eq!(col(&out, "y1")[1], Value::from(1.0 / 6.0));
    }

    #[test]
    fn center_uses_the_tallest_stack() {
        let t = Table::from_columns([
            (
                "x",
                vec![Value::from("a"), Value::from("a"), Value::from("b")],
            ),
            (
                "y",
                vec![Value::from(2.0), Value::from(2.0), Value::from(2.0)],
            ),
        ])
        .expect("valid table");
        let (out, _) = Stack::new("y", "x")
            .with_offset(StackOffset::Center)
            .apply(&t, &[t.indices()])
            .expect("stack applies");
        assert_eq!(col(&out, "y1")[2], Value::from(1.0));
        assert_eq!(col(&out, "y2")[2], Value::from(3.0));
    }
}
