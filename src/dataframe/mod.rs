//! Column-ordered table of typed, nullable columns

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

use crate::column::{Column, ColumnType};
use crate::error::{Error, Result};
use crate::na::NA;

/// DataFrame: named columns of equal length, kept in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    /// Column order
    columns: Vec<String>,
    /// Column data by name
    data: HashMap<String, Column>,
    /// Number of rows shared by every column
    row_count: usize,
}

impl DataFrame {
    /// Create an empty DataFrame
    pub fn new() -> Self {
        DataFrame {
            columns: Vec::new(),
            data: HashMap::new(),
            row_count: 0,
        }
    }

    /// Append a column
    ///
    /// The first column fixes the row count; later columns must match it.
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.data.contains_key(&name) {
            return Err(Error::DuplicateColumnName(name));
        }
        self.check_length(&column)?;

        if self.columns.is_empty() {
            self.row_count = column.len();
        }
        self.columns.push(name.clone());
        self.data.insert(name, column);
        Ok(())
    }

    /// Insert a column, replacing an existing one of the same name in place
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if !self.data.contains_key(&name) {
            return self.add_column(name, column);
        }
        if self.columns.len() == 1 {
            self.row_count = column.len();
        } else {
            self.check_length(&column)?;
        }
        self.data.insert(name, column);
        Ok(())
    }

    fn check_length(&self, column: &Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: column.len(),
            });
        }
        Ok(())
    }

    /// Borrow a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.data.get(name)
    }

    /// Borrow a column by name, failing with `ColumnNotFound`
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.data
            .get(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Fail with `MissingColumns` naming every absent column
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !self.contains_column(n))
            .map(|n| n.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingColumns(missing))
        }
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Column names in order
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Names of the Int64 and Float64 columns, in order
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| self.data[c.as_str()].is_numeric())
            .cloned()
            .collect()
    }

    /// Numeric cells of a column (integers widened)
    pub fn numeric_values(&self, name: &str) -> Result<Vec<NA<f64>>> {
        let column = self.require_column(name)?;
        column.to_f64().ok_or_else(|| Error::ColumnTypeMismatch {
            name: name.to_string(),
            expected: ColumnType::Float64,
            found: column.column_type(),
        })
    }

    /// Numeric cells of a column with missing cells as NaN
    pub fn get_column_numeric_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self
            .numeric_values(name)?
            .into_iter()
            .map(|c| c.get().unwrap_or(f64::NAN))
            .collect())
    }

    /// Borrow the cells of a String column
    pub fn string_values(&self, name: &str) -> Result<&[NA<String>]> {
        match self.require_column(name)? {
            Column::String(v) => Ok(v),
            other => Err(Error::ColumnTypeMismatch {
                name: name.to_string(),
                expected: ColumnType::String,
                found: other.column_type(),
            }),
        }
    }

    /// Borrow the cells of a Date column
    pub fn date_values(&self, name: &str) -> Result<&[NA<NaiveDate>]> {
        match self.require_column(name)? {
            Column::Date(v) => Ok(v),
            other => Err(Error::ColumnTypeMismatch {
                name: name.to_string(),
                expected: ColumnType::Date,
                found: other.column_type(),
            }),
        }
    }

    /// New DataFrame holding the rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> Result<DataFrame> {
        let mut result = DataFrame::new();
        for name in &self.columns {
            result.add_column(name.clone(), self.data[name].take(indices)?)?;
        }
        Ok(result)
    }

    /// New DataFrame holding the rows where `mask` is true
    pub fn filter(&self, mask: &[bool]) -> Result<DataFrame> {
        if mask.len() != self.row_count {
            return Err(Error::LengthMismatch {
                expected: self.row_count,
                actual: mask.len(),
            });
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect();
        self.take(&indices)
    }

    /// New DataFrame with only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<DataFrame> {
        self.require_columns(names)?;
        let mut result = DataFrame::new();
        for name in names {
            result.add_column(name.to_string(), self.data[*name].clone())?;
        }
        Ok(result)
    }

    /// Empty DataFrame with the same columns and types
    pub fn empty_like(&self) -> Result<DataFrame> {
        self.take(&[])
    }
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join(" | "))?;
        for row in 0..self.row_count {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| {
                    self.data[c.as_str()]
                        .display_value(row)
                        .unwrap_or_else(|| "NA".to_string())
                })
                .collect();
            writeln!(f, "{}", cells.join(" | "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        let mut df = DataFrame::new();
        df.add_column("id", Column::from_i64(vec![1, 2, 3])).unwrap();
        df.add_column("value", Column::from_f64(vec![1.5, 2.5, 3.5]))
            .unwrap();
        df.add_column("label", Column::from_strings(vec!["a", "b", "c"]))
            .unwrap();
        df
    }

    #[test]
    fn test_add_column_checks() {
        let mut df = sample();
        assert_eq!(df.row_count(), 3);
        assert_eq!(df.column_count(), 3);

        let dup = df.add_column("id", Column::from_i64(vec![1, 2, 3]));
        assert!(matches!(dup, Err(Error::DuplicateColumnName(_))));

        let short = df.add_column("short", Column::from_i64(vec![1]));
        assert!(matches!(
            short,
            Err(Error::InconsistentRowCount {
                expected: 3,
                found: 1
            })
        ));
    }

    #[test]
    fn test_set_column_keeps_position() {
        let mut df = sample();
        df.set_column("value", Column::from_f64(vec![0.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(df.column_names(), &["id", "value", "label"]);
        assert_eq!(df.get_column_numeric_values("value").unwrap(), vec![0.0; 3]);
    }

    #[test]
    fn test_require_columns_lists_missing() {
        let df = sample();
        match df.require_columns(&["id", "x", "y"]) {
            Err(Error::MissingColumns(missing)) => assert_eq!(missing, vec!["x", "y"]),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_take_filter_select() {
        let df = sample();
        let taken = df.take(&[2, 0]).unwrap();
        assert_eq!(taken.get_column_numeric_values("id").unwrap(), vec![3.0, 1.0]);

        let filtered = df.filter(&[false, true, true]).unwrap();
        assert_eq!(filtered.row_count(), 2);

        let selected = df.select(&["label", "id"]).unwrap();
        assert_eq!(selected.column_names(), &["label", "id"]);
        assert_eq!(df.numeric_column_names(), vec!["id", "value"]);

        let empty = df.empty_like().unwrap();
        assert_eq!(empty.row_count(), 0);
        assert_eq!(empty.column_count(), 3);
    }

    #[test]
    fn test_numeric_values_type_mismatch() {
        let df = sample();
        assert!(matches!(
            df.numeric_values("label"),
            Err(Error::ColumnTypeMismatch { .. })
        ));
        assert!(matches!(
            df.numeric_values("nope"),
            Err(Error::ColumnNotFound(_))
        ));
    }
}
