// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grouping and reduction.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use markplot_core::{Index, Table, Value, ValueKey};
use smallvec::SmallVec;

use crate::error::TransformError;
use crate::reduce::Output;
use crate::transform::require;

/// A group key: one normalized value per key column.
pub(crate) type GroupKey = SmallVec<[ValueKey; 2]>;

/// Groups each facet by key columns and emits one row per group.
///
/// The output table holds the key columns (with each group's first value) followed by the
/// reducer outputs. Groups are emitted in first-seen order within each facet.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    /// Key columns.
    pub by: Vec<Arc<str>>,
    /// Reducer outputs.
    pub outputs: Vec<Output>,
}

impl Group {
    /// Groups by `by` with the given outputs.
    pub fn new<I>(by: I, outputs: Vec<Output>) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<str>>,
    {
        Self {
            by: by.into_iter().map(Into::into).collect(),
            outputs,
        }
    }

    pub(crate) fn apply(
        &self,
        data: &Table,
        facets: &[Index],
    ) -> Result<(Table, Vec<Index>), TransformError> {
        let keys = self
            .by
            .iter()
            .map(|b| require(data, "group", b))
            .collect::<Result<Vec<_>, _>>()?;
        let inputs = input_columns(data, "group", &self.outputs)?;

        let mut builder = RowsBuilder::new(self.by.len(), self.outputs.len());
        let mut out_facets = Vec::with_capacity(facets.len());
        for facet in facets {
            let mut out_facet = Vec::new();
            for rows in split_by(facet, &keys) {
                let first = rows[0];
                let row = builder.push(
                    keys.iter().map(|k| k[first].clone()),
                    self.outputs
                        .iter()
                        .zip(&inputs)
                        .map(|(o, col)| o.reduce_rows(*col, &rows)),
                );
                out_facet.push(row);
            }
            out_facets.push(out_facet);
        }
        let names = self.by.iter().cloned();
        Ok((builder.finish(names, &self.outputs)?, out_facets))
    }
}

/// Splits `rows` by the values of `keys`, in first-seen order.
pub(crate) fn split_by(rows: &[usize], keys: &[&[Value]]) -> Vec<Vec<usize>> {
    let mut slots: HashMap<GroupKey, usize> = HashMap::new();
    let mut out: Vec<Vec<usize>> = Vec::new();
    for &i in rows {
        let key: GroupKey = keys.iter().map(|k| k[i].key()).collect();
        let slot = *slots.entry(key).or_insert_with(|| {
            out.push(Vec::new());
            out.len() - 1
        });
        out[slot].push(i);
    }
    out
}

/// Looks up the input columns of reducer outputs.
pub(crate) fn input_columns<'a>(
    data: &'a Table,
    transform: &'static str,
    outputs: &[Output],
) -> Result<Vec<Option<&'a [Value]>>, TransformError> {
    outputs
        .iter()
        .map(|o| match &o.field {
            Some(f) => require(data, transform, f).map(Some),
            None => Ok(None),
        })
        .collect()
}

/// Accumulates synthesized rows column by column.
pub(crate) struct RowsBuilder {
    keys: Vec<Vec<Value>>,
    outputs: Vec<Vec<Value>>,
    len: usize,
}

impl RowsBuilder {
    pub(crate) fn new(keys: usize, outputs: usize) -> Self {
        Self {
            keys: alloc::vec![Vec::new(); keys],
            outputs: alloc::vec![Vec::new(); outputs],
            len: 0,
        }
    }

    /// Appends one row and returns its index.
    pub(crate) fn push(
        &mut self,
        keys: impl Iterator<Item = Value>,
        outputs: impl Iterator<Item = Value>,
    ) -> usize {
        for (col, v) in self.keys.iter_mut().zip(keys) {
            col.push(v);
        }
        for (col, v) in self.outputs.iter_mut().zip(outputs) {
            col.push(v);
        }
        self.len += 1;
        self.len - 1
    }

    pub(crate) fn finish(
        self,
        key_names: impl Iterator<Item = Arc<str>>,
        outputs: &[Output],
    ) -> Result<Table, TransformError> {
        let len = self.len;
        let columns = key_names
            .zip(self.keys)
            .chain(outputs.iter().map(|o| o.name.clone()).zip(self.outputs));
        let table = Table::from_columns(columns)?;
        // A table with no columns still needs the right row count.
        Ok(if table.columns().is_empty() {
            Table::empty(len)
        } else {
            table
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;
    use crate::reduce::Reduce;

    fn table() -> Table {
        Table::from_columns([
            (
                "g",
                vec![
                    Value::from("b"),
                    Value::from("a"),
                    Value::from("b"),
                    Value::from("a"),
                ],
            ),
            (
                "v",
                vec![
                    Value::from(1.0),
                    Value::from(2.0),
                    Value::from(3.0),
                    Value::from(4.0),
                ],
            ),
        ])
        .expect("valid table")
    }

    #[test]
    fn groups_emit_one_row_per_key_in_first_seen_order() {
        let t = table();
        let group = Group::new(
            ["g"],
            vec![Output::count("n"), Output::new("total", Reduce::Sum, "v")],
        );
        let (out, facets) = group.apply(&t, &[t.indices()]).expect("group applies");
        assert_eq!(out.len(), 2);
        assert_eq!(facets, vec![vec![0, 1]]);
        assert_eq!(out.get(0, "g"), &Value::from("b"));
        assert_eq!(out.get(0, "total"), &Value::from(4.0));
        assert_eq!(out.get(1, "n"), &Value::from(2.0));
    }

    #[test]
    fn each_facet_groups_independently() {
        let t = table();
        let group = Group::new(["g"], vec![Output::count("n")]);
        let (out, facets) = group
            .apply(&t, &[vec![0, 1], vec![], vec![2, 3]])
            .expect("group applies");
        assert_eq!(facets, vec![vec![0, 1], vec![], vec![2, 3]]);
        assert_eq!(out.len(), 4);
    }
}
