// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The transform enum and its executor.

extern crate alloc;

use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

use hashbrown::HashMap;
use markplot_core::{Index, RowRef, Table, Value, ValueKey};

use crate::bin::Bin;
use crate::error::TransformError;
use crate::group::Group;
use crate::map::Map;
use crate::select::Select;
use crate::stack::Stack;
use crate::window::Window;

/// Sorting order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// Comparison operators for column predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

/// A row predicate used by [`Transform::Filter`].
#[derive(Clone)]
pub enum Predicate {
    /// Compare a column against a constant. Undefined values never match.
    Compare {
        /// Column to read.
        field: Arc<str>,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand constant.
        value: Value,
    },
    /// Keep rows whose column value is defined.
    Defined(Arc<str>),
    /// An arbitrary row test.
    Fn(Arc<dyn Fn(&RowRef<'_>) -> bool + Send + Sync>),
}

impl Predicate {
    /// Compares `field` against `value`.
    pub fn compare(field: impl Into<Arc<str>>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Wraps a row test.
    pub fn from_fn(f: impl Fn(&RowRef<'_>) -> bool + Send + Sync + 'static) -> Self {
        Self::Fn(Arc::new(f))
    }

    fn eval(&self, row: &RowRef<'_>) -> bool {
        match self {
            Self::Compare { field, op, value } => {
                let v = row.get(field);
                if !v.is_defined() || !value.is_defined() {
                    return false;
                }
                let ord = v.natural_cmp(value);
                match op {
                    CompareOp::Lt => ord == Ordering::Less,
                    CompareOp::Le => ord != Ordering::Greater,
                    CompareOp::Gt => ord == Ordering::Greater,
                    CompareOp::Ge => ord != Ordering::Less,
                    CompareOp::Eq => v.key() == value.key(),
                    CompareOp::Ne => v.key() != value.key(),
                }
            }
            Self::Defined(field) => row.get(field).is_defined(),
            Self::Fn(f) => f(row),
        }
    }

    fn field(&self) -> Option<&str> {
        match self {
            Self::Compare { field, .. } | Self::Defined(field) => Some(field),
            Self::Fn(_) => None,
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { field, op, value } => f
                .debug_struct("Compare")
                .field("field", field)
                .field("op", op)
                .field("value", value)
                .finish(),
            Self::Defined(field) => f.debug_tuple("Defined").field(field).finish(),
            Self::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

/// A user-supplied transform.
pub type CustomTransform =
    Arc<dyn Fn(&Table, &[Index]) -> Result<(Table, Vec<Index>), TransformError> + Send + Sync>;

/// A data transform `(table, facets) -> (table, facets)`.
///
/// Every transform maps each input facet to exactly one output facet, and every emitted index
/// is valid against the emitted table.
#[derive(Clone)]
pub enum Transform {
    /// Keep only the rows that satisfy a predicate.
    Filter(Predicate),
    /// Stable sort of each facet by a column; undefined values sort last in either order.
    Sort {
        /// Sort key column.
        by: Arc<str>,
        /// Sort order.
        order: SortOrder,
    },
    /// Reverse each facet.
    Reverse,
    /// Bin a quantitative column and reduce each bin.
    Bin(Bin),
    /// Group by key columns and reduce each group.
    Group(Group),
    /// Stack a column within groups, writing start and end offsets.
    Stack(Stack),
    /// Moving-window reduction.
    Window(Window),
    /// Cumulative or rank mapping of a column.
    Map(Map),
    /// Keep one row per series.
    Select(Select),
    /// A user-supplied transform.
    Custom(CustomTransform),
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(p) => f.debug_tuple("Filter").field(p).finish(),
            Self::Sort { by, order } => f
                .debug_struct("Sort")
                .field("by", by)
                .field("order", order)
                .finish(),
            Self::Reverse => f.write_str("Reverse"),
            Self::Bin(b) => f.debug_tuple("Bin").field(b).finish(),
            Self::Group(g) => f.debug_tuple("Group").field(g).finish(),
            Self::Stack(s) => f.debug_tuple("Stack").field(s).finish(),
            Self::Window(w) => f.debug_tuple("Window").field(w).finish(),
            Self::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Self::Select(s) => f.debug_tuple("Select").field(s).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Transform {
    /// Wraps a closure as a custom transform.
    pub fn custom(
        f: impl Fn(&Table, &[Index]) -> Result<(Table, Vec<Index>), TransformError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// A short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Filter(_) => "filter",
            Self::Sort { .. } => "sort",
            Self::Reverse => "reverse",
            Self::Bin(_) => "bin",
            Self::Group(_) => "group",
            Self::Stack(_) => "stack",
            Self::Window(_) => "window",
            Self::Map(_) => "map",
            Self::Select(_) => "select",
            Self::Custom(_) => "custom",
        }
    }

    /// Applies this transform.
    ///
    /// Built-in transforms always return one facet per input facet; custom transforms are not
    /// checked here.
    pub fn apply(
        &self,
        data: &Table,
        facets: &[Index],
    ) -> Result<(Table, Vec<Index>), TransformError> {
        let out = match self {
            Self::Filter(predicate) => {
                if let Some(field) = predicate.field() {
                    require(data, "filter", field)?;
                }
                let facets = facets
                    .iter()
                    .map(|facet| {
                        facet
                            .iter()
                            .copied()
                            .filter(|&i| predicate.eval(&data.row(i)))
                            .collect()
                    })
                    .collect();
                (data.clone(), facets)
            }
            Self::Sort { by, order } => {
                let values = require(data, "sort", by)?;
                let facets = facets
                    .iter()
                    .map(|facet| {
                        let mut facet = facet.clone();
                        facet.sort_by(|&a, &b| compare_defined(&values[a], &values[b], *order));
                        facet
                    })
                    .collect();
                (data.clone(), facets)
            }
            Self::Reverse => {
                let facets = facets
                    .iter()
                    .map(|facet| facet.iter().rev().copied().collect())
                    .collect();
                (data.clone(), facets)
            }
            Self::Bin(bin) => bin.apply(data, facets)?,
            Self::Group(group) => group.apply(data, facets)?,
            Self::Stack(stack) => stack.apply(data, facets)?,
            Self::Window(window) => window.apply(data, facets)?,
            Self::Map(map) => map.apply(data, facets)?,
            Self::Select(select) => select.apply(data, facets)?,
            Self::Custom(f) => f(data, facets)?,
        };
        tracing::trace!(
            transform = self.name(),
            rows_in = data.len(),
            rows_out = out.0.len(),
            facets = out.1.len(),
            "applied transform"
        );
        Ok(out)
    }
}

/// Applies `transforms` in order.
pub fn apply_all(
    transforms: &[Transform],
    data: &Table,
    facets: &[Index],
) -> Result<(Table, Vec<Index>), TransformError> {
    let mut out = (data.clone(), facets.to_vec());
    for t in transforms {
        out = t.apply(&out.0, &out.1)?;
    }
    Ok(out)
}

/// Orders defined values by `order`, keeping undefined values last.
pub(crate) fn compare_defined(a: &Value, b: &Value, order: SortOrder) -> Ordering {
    match (a.is_defined(), b.is_defined()) {
        (true, true) => match order {
            SortOrder::Asc => a.natural_cmp(b),
            SortOrder::Desc => b.natural_cmp(a),
        },
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Returns the values of a column the transform needs.
pub(crate) fn require<'a>(
    data: &'a Table,
    transform: &'static str,
    field: &str,
) -> Result<&'a [Value], TransformError> {
    data.column(field)
        .map(|c| &**c)
        .ok_or_else(|| TransformError::MissingColumn {
            transform,
            column: field.to_string(),
        })
}

/// Splits a facet into series by the `z` column, in first-seen order.
///
/// Each series keeps the facet's row order. A missing or absent `z` yields one series.
pub(crate) fn series(data: &Table, facet: &[usize], z: Option<&str>) -> Vec<Vec<usize>> {
    let Some(column) = z.and_then(|z| data.column(z)) else {
        return alloc::vec![facet.to_vec()];
    };
    let mut slots: HashMap<ValueKey, usize> = HashMap::new();
    let mut out: Vec<Vec<usize>> = Vec::new();
    for &i in facet {
        let slot = *slots.entry(column[i].key()).or_insert_with(|| {
            out.push(Vec::new());
            out.len() - 1
        });
        out[slot].push(i);
    }
    out
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn table() -> Table {
        Table::from_columns([
            (
                "v",
                vec![
                    Value::from(3.0),
                    Value::Null,
                    Value::from(1.0),
                    Value::from(2.0),
                ],
            ),
            (
                "g",
                vec![
                    Value::from("a"),
                    Value::from("b"),
                    Value::from("a"),
                    Value::from("b"),
                ],
            ),
        ])
        .expect("valid table")
    }

    #[test]
    fn filter_keeps_facet_count_and_order() {
        let t = table();
        let (_, facets) = Transform::Filter(Predicate::compare("v", CompareOp::Ge, 2.0))
            .apply(&t, &[vec![0, 1], vec![2, 3]])
            .expect("filter applies");
        assert_eq!(facets, vec![vec![0], vec![3]]);
    }

    #[test]
    fn sort_keeps_undefined_last_in_both_orders() {
        let t = table();
        let sort = |order| {
            Transform::Sort {
                by: "v".into(),
                order,
            }
            .apply(&t, &[t.indices()])
            .expect("sort applies")
            .1
        };
        assert_eq!(sort(SortOrder::Asc), vec![vec![2, 3, 0, 1]]);
        assert_eq!(sort(SortOrder::Desc), vec![vec![0, 3, 2, 1]]);
    }

    #[test]
    fn chained_transforms_thread_facets() {
        let t = table();
        let (_, facets) = apply_all(
            &[
                Transform::Filter(Predicate::Defined("v".into())),
                Transform::Reverse,
            ],
            &t,
            &[t.indices()],
        )
        .expect("transforms apply");
        assert_eq!(facets, vec![vec![3, 2, 0]]);
    }

    #[test]
    fn missing_columns_are_reported() {
        let t = table();
        let err = Transform::Sort {
            by: "nope".into(),
            order: SortOrder::Asc,
        }
        .apply(&t, &[t.indices()])
        .expect_err("column is missing");
        assert!(matches!(
            err,
            TransformError::MissingColumn {
                transform: "sort",
                ..
            }
        ));
    }

    #[test]
    fn series_split_in_first_seen_order() {
        let t = table();
        assert_eq!(
            series(&t, &[3, 0, 1, 2], Some("g")),
            vec![vec![3, 1], vec![0, 2]]
        );
        assert_eq!(series(&t, &[1, 0], None), vec![vec![1, 0]]);
    }
}
