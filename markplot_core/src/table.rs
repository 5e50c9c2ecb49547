// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable columnar tables.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::error::DataShapeError;
use crate::value::Value;

static NULL: Value = Value::Null;

/// A row index: an ordered list of row positions into a [`Table`].
pub type Index = Vec<usize>;

/// A named column of values.
#[derive(Clone, Debug)]
pub struct Column {
    /// Column name.
    pub name: Arc<str>,
    /// Column values (one per row).
    pub values: Arc<[Value]>,
}

#[derive(Debug)]
struct TableInner {
    len: usize,
    columns: Vec<Column>,
}

/// An immutable, cheaply cloneable columnar table.
///
/// Rows are read-only records: a key absent from a record reads as [`Value::Null`].
/// Clones share storage; [`Table::ptr_eq`] tells whether two tables are the same dataset.
#[derive(Clone, Debug)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Default for Table {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl Table {
    /// Creates a table with `len` rows and no columns.
    pub fn empty(len: usize) -> Self {
        Self {
            inner: Arc::new(TableInner {
                len,
                columns: Vec::new(),
            }),
        }
    }

    /// Creates a table from named columns.
    ///
    /// All columns must have the same length.
    pub fn from_columns<N, I>(columns: I) -> Result<Self, DataShapeError>
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = (N, Vec<Value>)>,
    {
        let mut out: Vec<Column> = Vec::new();
        let mut len = None;
        for (name, values) in columns {
            let name = name.into();
            let expected = *len.get_or_insert(values.len());
            if values.len() != expected {
                return Err(DataShapeError::ColumnLength {
                    column: name.as_ref().into(),
                    expected,
                    actual: values.len(),
                });
            }
            upsert(&mut out, name, values.into());
        }
        Ok(Self {
            inner: Arc::new(TableInner {
                len: len.unwrap_or(0),
                columns: out,
            }),
        })
    }

    /// Creates a table from row records.
    ///
    /// Columns appear in first-seen key order. Keys missing from a record are null.
    pub fn from_records<R, K, V>(records: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut names: Vec<Arc<str>> = Vec::new();
        let mut cols: Vec<Vec<Value>> = Vec::new();
        let mut len = 0;
        for record in records {
            for (key, value) in record {
                let key = key.as_ref();
                let ci = match names.iter().position(|n| n.as_ref() == key) {
                    Some(ci) => ci,
                    None => {
                        names.push(Arc::from(key));
                        cols.push(alloc::vec![Value::Null; len]);
                        names.len() - 1
                    }
                };
                let col = &mut cols[ci];
                col.resize(len, Value::Null);
                col.push(value.into());
            }
            len += 1;
            for col in &mut cols {
                col.resize(len, Value::Null);
            }
        }
        let columns = names
            .into_iter()
            .zip(cols)
            .map(|(name, values)| Column {
                name,
                values: values.into(),
            })
            .collect();
        Self {
            inner: Arc::new(TableInner { len, columns }),
        }
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Returns the full row index `0..len`.
    pub fn indices(&self) -> Index {
        (0..self.inner.len).collect()
    }

    /// Returns `true` if any record carried the named key.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Returns a column's values.
    pub fn column(&self, name: &str) -> Option<&Arc<[Value]>> {
        self.inner
            .columns
            .iter()
            .find(|c| c.name.as_ref() == name)
            .map(|c| &c.values)
    }

    /// Returns the columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.inner.columns
    }

    /// Returns the value at `(row, name)`, or null if absent.
    pub fn get(&self, row: usize, name: &str) -> &Value {
        self.column(name)
            .and_then(|c| c.get(row))
            .unwrap_or(&NULL)
    }

    /// Returns a read-only view of one row.
    pub fn row(&self, row: usize) -> RowRef<'_> {
        RowRef { table: self, row }
    }

    /// Returns `true` if both handles share the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns a new table with `name` added (or replaced).
    pub fn with_column(
        &self,
        name: impl Into<Arc<str>>,
        values: impl Into<Arc<[Value]>>,
    ) -> Result<Self, DataShapeError> {
        let name = name.into();
        let values = values.into();
        if values.len() != self.inner.len {
            return Err(DataShapeError::ColumnLength {
                column: name.as_ref().into(),
                expected: self.inner.len,
                actual: values.len(),
            });
        }
        let mut columns = self.inner.columns.clone();
        upsert(&mut columns, name, values);
        Ok(Self {
            inner: Arc::new(TableInner {
                len: self.inner.len,
                columns,
            }),
        })
    }

    /// Returns a new table containing the given rows, in order.
    ///
    /// Rows may repeat. Out-of-range positions are an error.
    pub fn take(&self, rows: &[usize]) -> Result<Self, DataShapeError> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.inner.len) {
            return Err(DataShapeError::IndexOutOfBounds {
                index: bad,
                len: self.inner.len,
            });
        }
        let columns = self
            .inner
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: rows.iter().map(|&r| c.values[r].clone()).collect(),
            })
            .collect();
        Ok(Self {
            inner: Arc::new(TableInner {
                len: rows.len(),
                columns,
            }),
        })
    }
}

fn upsert(columns: &mut Vec<Column>, name: Arc<str>, values: Arc<[Value]>) {
    match columns.iter_mut().find(|c| c.name == name) {
        Some(c) => c.values = values,
        None => columns.push(Column { name, values }),
    }
}

/// A borrowed row of a [`Table`], passed to channel accessors.
#[derive(Clone, Copy, Debug)]
pub struct RowRef<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> RowRef<'a> {
    /// Returns the value of `name` in this row (null if absent).
    pub fn get(&self, name: &str) -> &'a Value {
        self.table.get(self.row, name)
    }

    /// Returns the position of this row in its table.
    pub fn index(&self) -> usize {
        self.row
    }
}

/// Checks that every index of every facet is in bounds for a table of length `len`.
pub fn check_indices(facets: &[Index], len: usize) -> Result<(), DataShapeError> {
    for index in facets {
        if let Some(&bad) = index.iter().find(|&&i| i >= len) {
            return Err(DataShapeError::IndexOutOfBounds { index: bad, len });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    #[test]
    fn records_fill_missing_keys_with_null() {
        let t = Table::from_records([
            vec![("a", Value::from(1.0))],
            vec![("b", Value::from("x"))],
            vec![("a", Value::from(3.0)), ("b", Value::from("y"))],
        ]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(0, "b"), &Value::Null);
        assert_eq!(t.get(1, "a"), &Value::Null);
        assert_eq!(t.get(2, "a"), &Value::from(3.0));
        assert!(t.has_column("b"));
        assert!(!t.has_column("c"));
    }

    #[test]
    fn take_rejects_out_of_range_rows() {
        let t = Table::from_columns([("x", vec![Value::from(1.0), Value::from(2.0)])])
            .expect("valid table");
        let sub = t.take(&[1, 1, 0]).expect("in range");
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.get(0, "x"), &Value::from(2.0));
        assert!(matches!(
            t.take(&[2]),
            Err(DataShapeError::IndexOutOfBounds { index: 2, len: 2 })
        ));
    }

    #[test]
    fn with_column_keeps_the_original_untouched() {
        let t = Table::from_columns([("x", vec![Value::from(1.0)])]).expect("valid table");
        let t2 = t.with_column("y", vec![Value::from(2.0)]).expect("same length");
        assert!(!t.has_column("y"));
        assert!(t2.has_column("y"));
        assert!(!t.ptr_eq(&t2));
        assert!(t.ptr_eq(&t.clone()));
    }
}
