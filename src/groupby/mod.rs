use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::column::{Column, ColumnType};
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::na::NA;

/// Rows of a DataFrame grouped by key
///
/// Groups iterate in ascending key order. Rows whose key is missing belong to
/// no group.
#[derive(Debug)]
pub struct GroupBy<'a, K>
where
    K: Ord + Clone,
{
    /// Row indices per key
    groups: BTreeMap<K, Vec<usize>>,
    /// Source frame
    source: &'a DataFrame,
}

impl<'a, K> GroupBy<'a, K>
where
    K: Ord + Clone,
{
    /// Group `source` by one key per row
    pub fn new(keys: Vec<NA<K>>, source: &'a DataFrame) -> Result<Self> {
        if keys.len() != source.row_count() {
            return Err(Error::LengthMismatch {
                expected: source.row_count(),
                actual: keys.len(),
            });
        }

        let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
        for (i, key) in keys.into_iter().enumerate() {
            if let NA::Value(k) = key {
                groups.entry(k).or_default().push(i);
            }
        }

        Ok(GroupBy { groups, source })
    }

    /// Number of groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Keys in ascending order
    pub fn keys(&self) -> Vec<K> {
        self.groups.keys().cloned().collect()
    }

    /// Sum of a numeric column per group; missing cells add nothing
    pub fn sum(&self, column: &str) -> Result<Vec<(K, f64)>> {
        let values = self.source.numeric_values(column)?;
        Ok(self
            .groups
            .iter()
            .map(|(k, rows)| {
                let total: f64 = rows.iter().filter_map(|&i| values[i].get()).sum();
                (k.clone(), total)
            })
            .collect())
    }

    /// Count of non-missing cells per group
    pub fn count(&self, column: &str) -> Result<Vec<(K, usize)>> {
        let col = self.source.require_column(column)?;
        Ok(self
            .groups
            .iter()
            .map(|(k, rows)| (k.clone(), rows.iter().filter(|&&i| !col.is_na_at(i)).count()))
            .collect())
    }

    /// Mean of a numeric column per group; NA for groups without values
    pub fn mean(&self, column: &str) -> Result<Vec<(K, NA<f64>)>> {
        let values = self.source.numeric_values(column)?;
        Ok(self
            .groups
            .iter()
            .map(|(k, rows)| {
                let present: Vec<f64> = rows.iter().filter_map(|&i| values[i].get()).collect();
                let mean = if present.is_empty() {
                    NA::NA
                } else {
                    NA::Value(present.iter().sum::<f64>() / present.len() as f64)
                };
                (k.clone(), mean)
            })
            .collect())
    }

    /// Group sum broadcast back to every row of the source
    pub fn transform_sum(&self, column: &str) -> Result<Vec<NA<f64>>> {
        let mut out = vec![NA::NA; self.source.row_count()];
        let values = self.source.numeric_values(column)?;
        for rows in self.groups.values() {
            let total: f64 = rows.iter().filter_map(|&i| values[i].get()).sum();
            for &i in rows {
                out[i] = NA::Value(total);
            }
        }
        Ok(out)
    }

    /// Number of distinct non-missing values per group, broadcast to every row
    pub fn transform_nunique(&self, column: &str) -> Result<Vec<NA<i64>>> {
        let col = self.source.require_column(column)?;
        let mut out = vec![NA::NA; self.source.row_count()];
        for rows in self.groups.values() {
            let distinct: HashSet<String> =
                rows.iter().filter_map(|&i| col.display_value(i)).collect();
            for &i in rows {
                out[i] = NA::Value(distinct.len() as i64);
            }
        }
        Ok(out)
    }
}

/// Grouping entry points for DataFrame
pub trait GroupByExt {
    /// Group by a String column (numeric ids are grouped by their text form)
    fn groupby_str(&self, column: &str) -> Result<GroupBy<'_, String>>;

    /// Group by a Date column
    fn groupby_date(&self, column: &str) -> Result<GroupBy<'_, NaiveDate>>;
}

impl GroupByExt for DataFrame {
    fn groupby_str(&self, column: &str) -> Result<GroupBy<'_, String>> {
        let col = self.require_column(column)?;
        let keys: Vec<NA<String>> = match col {
            Column::String(v) => v.clone(),
            Column::Int64(_) | Column::Float64(_) => (0..col.len())
                .map(|i| NA::<String>::from(col.display_value(i)))
                .collect(),
            other => {
                return Err(Error::ColumnTypeMismatch {
                    name: column.to_string(),
                    expected: ColumnType::String,
                    found: other.column_type(),
                })
            }
        };
        GroupBy::new(keys, self)
    }

    fn groupby_date(&self, column: &str) -> Result<GroupBy<'_, NaiveDate>> {
        let keys = self.date_values(column)?.to_vec();
        GroupBy::new(keys, self)
    }
}
