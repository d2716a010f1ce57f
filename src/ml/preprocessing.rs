//! Feature preprocessing

use crate::error::{Error, Result};
use crate::ml::dataset::FeatureMatrix;

/// A learned, reusable transformation of a feature matrix
pub trait Transformer {
    /// Learn parameters from the data
    fn fit(&mut self, x: &FeatureMatrix) -> Result<()>;

    /// Apply the learned parameters
    fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix>;

    /// Learn, then apply
    fn fit_transform(&mut self, x: &FeatureMatrix) -> Result<FeatureMatrix> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Rescales every feature to zero mean and unit variance
///
/// Uses the population standard deviation; a constant feature gets scale 1
/// so that it maps to zero instead of dividing by zero.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
    fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, x: &FeatureMatrix) -> Result<()> {
        if x.n_samples() == 0 {
            return Err(Error::EmptyData(
                "cannot fit a scaler on zero samples".to_string(),
            ));
        }
        let n = x.n_samples() as f64;
        self.means.clear();
        self.scales.clear();

        for j in 0..x.n_features() {
            let values = x.column(j);
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            self.means.push(mean);
            self.scales.push(if std > 0.0 { std } else { 1.0 });
        }
        self.fitted = true;
        Ok(())
    }

    fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix> {
        if !self.fitted {
            return Err(Error::NotTrained("scaler has not been fitted".to_string()));
        }
        if x.n_features() != self.means.len() {
            return Err(Error::DimensionMismatch(format!(
                "scaler was fitted on {} features, got {}",
                self.means.len(),
                x.n_features()
            )));
        }
        Ok(x.map_rows(|row| {
            row.iter()
                .zip(self.means.iter().zip(&self.scales))
                .map(|(v, (mean, scale))| (v - mean) / scale)
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardize() {
        let x = FeatureMatrix::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 5.0], vec![3.0, 5.0]],
        )
        .unwrap();
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        assert_eq!(scaler.means(), &[2.0, 5.0]);
        assert_eq!(scaler.scales(), &[1.0, 1.0]);
        assert_eq!(scaled.rows(), &[vec![-1.0, 0.0], vec![1.0, 0.0]]);
    }

    #[test]
    fn test_transform_before_fit() {
        let x = FeatureMatrix::new(vec!["a".into()], vec![vec![1.0]]).unwrap();
        assert!(matches!(
            StandardScaler::new().transform(&x),
            Err(Error::NotTrained(_))
        ));
    }
}
