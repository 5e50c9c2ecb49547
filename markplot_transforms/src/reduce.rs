// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reducers shared by the group, bin and window transforms.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;

use hashbrown::HashSet;
use markplot_core::{Value, ValueKey, ValueKind};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// A reduction over a run of rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reduce {
    /// Number of rows (or of defined values when reading a field).
    Count,
    /// Number of distinct defined values.
    Distinct,
    /// Sum of defined numbers.
    Sum,
    /// Mean of defined numbers.
    Mean,
    /// Median of defined numbers.
    Median,
    /// Smallest defined value.
    Min,
    /// Largest defined value.
    Max,
    /// First value.
    First,
    /// Last value.
    Last,
    /// Last value minus first value.
    Difference,
    /// Last value divided by first value.
    Ratio,
    /// Sample standard deviation.
    Deviation,
    /// Sample variance.
    Variance,
}

impl Reduce {
    /// Returns `true` for reducers that only look at the ends of a run.
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            Self::First | Self::Last | Self::Difference | Self::Ratio
        )
    }

    /// Reduces `values`.
    ///
    /// Undefined values are skipped, except by positional reducers which read the ends of the
    /// run as they are.
    pub fn reduce(self, values: &[&Value]) -> Value {
        match self {
            Self::Count => Value::from(values.iter().filter(|v| v.is_defined()).count() as f64),
            Self::Distinct => {
                let keys: HashSet<ValueKey> = values
                    .iter()
                    .filter(|v| v.is_defined())
                    .map(|v| v.key())
                    .collect();
                Value::from(keys.len() as f64)
            }
            Self::Sum => Value::from(numbers(values).sum::<f64>()),
            Self::Mean => {
                let (n, sum) = numbers(values).fold((0_usize, 0.0), |(n, s), x| (n + 1, s + x));
                if n == 0 {
                    Value::Null
                } else {
                    mean_value(values, sum / n as f64)
                }
            }
            Self::Median => {
                let mut xs: Vec<f64> = numbers(values).collect();
                if xs.is_empty() {
                    return Value::Null;
                }
                xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
                let mid = xs.len() / 2;
                let m = if xs.len() % 2 == 0 {
                    (xs[mid - 1] + xs[mid]) / 2.0
                } else {
                    xs[mid]
                };
                mean_value(values, m)
            }
            Self::Min => extreme(values, Ordering::Less),
            Self::Max => extreme(values, Ordering::Greater),
            Self::First => values.first().map_or(Value::Null, |v| (*v).clone()),
            Self::Last => values.last().map_or(Value::Null, |v| (*v).clone()),
            Self::Difference => match ends(values) {
                Some((a, b)) => Value::from(b - a),
                None => Value::Null,
            },
            Self::Ratio => match ends(values) {
                Some((a, b)) => Value::from(b / a),
                None => Value::Null,
            },
            Self::Variance => variance(values).map_or(Value::Null, Value::from),
            Self::Deviation => variance(values).map_or(Value::Null, |v| Value::from(v.sqrt())),
        }
    }
}

/// A named reducer output of a group or bin transform.
#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    /// Output column name.
    pub name: Arc<str>,
    /// Reducer.
    pub reduce: Reduce,
    /// Input column; `None` reduces over rows (only meaningful for [`Reduce::Count`]).
    pub field: Option<Arc<str>>,
}

impl Output {
    /// Counts rows into `name`.
    pub fn count(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            reduce: Reduce::Count,
            field: None,
        }
    }

    /// Reduces `field` into `name`.
    pub fn new(name: impl Into<Arc<str>>, reduce: Reduce, field: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            reduce,
            field: Some(field.into()),
        }
    }

    /// Reduces `rows` of `column` (or counts the rows when there is no field).
    pub(crate) fn reduce_rows(&self, column: Option<&[Value]>, rows: &[usize]) -> Value {
        match column {
            Some(col) => {
                let values: Vec<&Value> = rows.iter().map(|&r| &col[r]).collect();
                self.reduce.reduce(&values)
            }
            None => Value::from(rows.len() as f64),
        }
    }
}

fn numbers<'a>(values: &'a [&'a Value]) -> impl Iterator<Item = f64> + 'a {
    values.iter().filter_map(|v| v.as_f64())
}

/// Means and medians of dates stay dates.
fn mean_value(values: &[&Value], x: f64) -> Value {
    let all_dates = values
        .iter()
        .filter(|v| v.is_defined())
        .all(|v| v.kind() == ValueKind::Date);
    if all_dates {
        Value::Date(x as i64)
    } else {
        Value::from(x)
    }
}

fn extreme(values: &[&Value], want: Ordering) -> Value {
    values
        .iter()
        .filter(|v| v.is_defined())
        .copied()
        .reduce(|best, v| if v.natural_cmp(best) == want { v } else { best })
        .map_or(Value::Null, Clone::clone)
}

fn ends(values: &[&Value]) -> Option<(f64, f64)> {
    let a = values.first()?.as_f64()?;
    let b = values.last()?.as_f64()?;
    Some((a, b))
}

fn variance(values: &[&Value]) -> Option<f64> {
    // Welford's online update.
    let mut n = 0_usize;
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for x in numbers(values) {
        n += 1;
        let delta = x - mean;
        mean += delta / n as f64;
        m2 += delta * (x - mean);
    }
    (n > 1).then(|| m2 / (n - 1) as f64)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn run(reduce: Reduce, values: &[Value]) -> Value {
        let refs: Vec<&Value> = values.iter().collect();
        reduce.reduce(&refs)
    }

    #[test]
    fn numeric_reducers_skip_undefined() {
        let vs = vec![
            Value::from(1.0),
            Value::Null,
            Value::from(3.0),
            Value::Number(f64::NAN),
        ];
        assert_eq!(run(Reduce::Count, &vs), Value::from(2.0));
        assert_eq!(run(Reduce::Sum, &vs), Value::from(4.0));
        assert_eq!(run(Reduce::Mean, &vs), Value::from(2.0));
        assert_eq!(run(Reduce::Median, &vs), Value::from(2.0));
        assert_eq!(run(Reduce::Max, &vs), Value::from(3.0));
        assert_eq!(run(Reduce::Variance, &vs), Value::from(2.0));
    }

    #[test]
    fn positional_reducers_read_the_ends() {
        let vs = vec![Value::from(2.0), Value::from(5.0), Value::from(8.0)];
        assert_eq!(run(Reduce::First, &vs), Value::from(2.0));
        assert_eq!(run(Reduce::Difference, &vs), Value::from(6.0));
        assert_eq!(run(Reduce::Ratio, &vs), Value::from(4.0));
        assert_eq!(run(Reduce::Mean, &[]), Value::Null);
    }

    #[test]
    fn date_extremes_stay_dates() {
        let vs = vec![Value::ymd(2020, 1, 2), Value::ymd(2020, 1, 1)];
        assert_eq!(run(Reduce::Min, &vs), Value::ymd(2020, 1, 1));
        assert!(matches!(run(Reduce::Mean, &vs), Value::Date(_)));
        assert_eq!(
            run(Reduce::Distinct, &[Value::from("a"), Value::from("a")]),
            Value::from(1.0)
        );
    }
}
