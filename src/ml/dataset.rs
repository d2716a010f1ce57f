//! Dense row-major feature matrix handed to models

use crate::dataframe::DataFrame;
use crate::error::{Error, Result};

/// Named features, one row per sample
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    feature_names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Every row must have one value per feature name
    pub fn new(feature_names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|r| r.len() != feature_names.len()) {
            return Err(Error::DimensionMismatch(format!(
                "row has {} values but there are {} features",
                bad.len(),
                feature_names.len()
            )));
        }
        Ok(FeatureMatrix {
            feature_names,
            rows,
        })
    }

    /// Collect the named numeric columns; missing cells become NaN
    pub fn from_dataframe(df: &DataFrame, features: &[String]) -> Result<Self> {
        let columns = features
            .iter()
            .map(|name| df.get_column_numeric_values(name))
            .collect::<Result<Vec<_>>>()?;

        let rows = (0..df.row_count())
            .map(|i| columns.iter().map(|col| col[i]).collect())
            .collect();

        Ok(FeatureMatrix {
            feature_names: features.to_vec(),
            rows,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// All values of one feature
    pub fn column(&self, feature: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[feature]).collect()
    }

    /// Rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        let n = self.rows.len();
        let rows = indices
            .iter()
            .map(|&i| {
                self.rows
                    .get(i)
                    .cloned()
                    .ok_or(Error::IndexOutOfBounds { index: i, size: n })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureMatrix {
            feature_names: self.feature_names.clone(),
            rows,
        })
    }

    pub(crate) fn map_rows<F>(&self, f: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        FeatureMatrix {
            feature_names: self.feature_names.clone(),
            rows: self.rows.iter().map(|r| f(r)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    #[test]
    fn test_from_dataframe() {
        let mut df = DataFrame::new();
        df.add_column("a", Column::from_i64(vec![1, 2])).unwrap();
        df.add_column("b", Column::from_f64(vec![0.5, 1.5])).unwrap();
        let x = FeatureMatrix::from_dataframe(&df, &["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(x.rows(), &[vec![0.5, 1.0], vec![1.5, 2.0]]);
        assert_eq!(x.column(1), vec![1.0, 2.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = FeatureMatrix::new(vec!["a".into()], vec![vec![1.0, 2.0]]);
        assert!(matches!(result, Err(Error::DimensionMismatch(_))));
    }
}
