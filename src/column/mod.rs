//! Typed, nullable columns
//!
//! A [`Column`] owns one vector of [`NA`] cells. Four physical types are
//! enough for sales data: integers, floats, strings and calendar dates.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::na::NA;

/// Identifies the physical type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    String,
    Date,
}

impl ColumnType {
    /// Whether columns of this type take part in numeric modelling
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }
}

/// A column of nullable cells
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int64(Vec<NA<i64>>),
    Float64(Vec<NA<f64>>),
    String(Vec<NA<String>>),
    Date(Vec<NA<NaiveDate>>),
}

impl Column {
    /// Build a Float64 column without gaps
    pub fn from_f64(values: Vec<f64>) -> Self {
        Column::Float64(values.into_iter().map(NA::Value).collect())
    }

    /// Build an Int64 column without gaps
    pub fn from_i64(values: Vec<i64>) -> Self {
        Column::Int64(values.into_iter().map(NA::Value).collect())
    }

    /// Build a String column without gaps
    pub fn from_strings<S: Into<String>>(values: Vec<S>) -> Self {
        Column::String(values.into_iter().map(|s| NA::Value(s.into())).collect())
    }

    /// Build a Date column without gaps
    pub fn from_dates(values: Vec<NaiveDate>) -> Self {
        Column::Date(values.into_iter().map(NA::Value).collect())
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::String(v) => v.len(),
            Column::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physical type of the column
    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::String(_) => ColumnType::String,
            Column::Date(_) => ColumnType::Date,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.column_type().is_numeric()
    }

    /// Number of missing cells
    pub fn null_count(&self) -> usize {
        match self {
            Column::Int64(v) => v.iter().filter(|c| c.is_na()).count(),
            Column::Float64(v) => v.iter().filter(|c| c.is_na()).count(),
            Column::String(v) => v.iter().filter(|c| c.is_na()).count(),
            Column::Date(v) => v.iter().filter(|c| c.is_na()).count(),
        }
    }

    /// Whether the cell at `index` is missing
    pub fn is_na_at(&self, index: usize) -> bool {
        match self {
            Column::Int64(v) => v.get(index).map_or(true, |c| c.is_na()),
            Column::Float64(v) => v.get(index).map_or(true, |c| c.is_na()),
            Column::String(v) => v.get(index).map_or(true, |c| c.is_na()),
            Column::Date(v) => v.get(index).map_or(true, |c| c.is_na()),
        }
    }

    /// Numeric view of the column (integers widened to f64)
    ///
    /// Returns `None` for non-numeric columns.
    pub fn to_f64(&self) -> Option<Vec<NA<f64>>> {
        match self {
            Column::Int64(v) => Some(v.iter().map(|c| c.map(|&x| x as f64)).collect()),
            Column::Float64(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Numeric value of a single cell
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            Column::Int64(v) => v.get(index).and_then(|c| c.get()).map(|x| x as f64),
            Column::Float64(v) => v.get(index).and_then(|c| c.get()),
            _ => None,
        }
    }

    /// Text rendering of a single cell, `None` when missing
    ///
    /// Dates render in ISO form; CSV output and distinct-value counting both
    /// go through this.
    pub fn display_value(&self, index: usize) -> Option<String> {
        match self {
            Column::Int64(v) => v.get(index).and_then(|c| c.get()).map(|x| x.to_string()),
            Column::Float64(v) => v.get(index).and_then(|c| c.get()).map(|x| x.to_string()),
            Column::String(v) => v.get(index).and_then(|c| c.value().cloned()),
            Column::Date(v) => v
                .get(index)
                .and_then(|c| c.get())
                .map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Gather the cells at `indices` into a new column
    pub fn take(&self, indices: &[usize]) -> Result<Column> {
        let len = self.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: len,
            });
        }

        Ok(match self {
            Column::Int64(v) => Column::Int64(indices.iter().map(|&i| v[i]).collect()),
            Column::Float64(v) => Column::Float64(indices.iter().map(|&i| v[i]).collect()),
            Column::String(v) => Column::String(indices.iter().map(|&i| v[i].clone()).collect()),
            Column::Date(v) => Column::Date(indices.iter().map(|&i| v[i]).collect()),
        })
    }
}
