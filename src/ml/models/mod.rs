//! Regression models and the traits they share

pub mod ensemble;
pub mod linear;
pub mod tree;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::dataset::FeatureMatrix;
use crate::ml::metrics;

pub use ensemble::{RandomForestConfig, RandomForestConfigBuilder, RandomForestRegressor};
pub use linear::LinearRegression;
pub use tree::{DecisionTreeConfig, DecisionTreeConfigBuilder, DecisionTreeRegressor, TreeNode};

/// Common interface of supervised regression models
pub trait SupervisedModel {
    /// Fit the model to features `x` and targets `y`
    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Per-feature importance, if the model defines one
    fn feature_importances(&self) -> Option<HashMap<String, f64>> {
        None
    }
}

/// Named evaluation scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    metrics: BTreeMap<String, f64>,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }

    pub fn get_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }
}

/// Scoring of a fitted model on held-out data
pub trait ModelEvaluator: SupervisedModel {
    /// `mae`, `mse`, `rmse` and `r2` of the predictions for `x` against `y`
    fn evaluate(&self, x: &FeatureMatrix, y: &[f64]) -> Result<ModelMetrics> {
        let predictions = self.predict(x)?;
        regression_metrics(y, &predictions)
    }
}

impl<T: SupervisedModel> ModelEvaluator for T {}

/// Standard regression scores of `y_pred` against `y_true`
pub fn regression_metrics(y_true: &[f64], y_pred: &[f64]) -> Result<ModelMetrics> {
    let mut result = ModelMetrics::new();
    result.add_metric("mae", metrics::mean_absolute_error(y_true, y_pred)?);
    result.add_metric("mse", metrics::mean_squared_error(y_true, y_pred)?);
    result.add_metric("rmse", metrics::root_mean_squared_error(y_true, y_pred)?);
    result.add_metric("r2", metrics::r2_score(y_true, y_pred)?);
    Ok(result)
}

/// Importance of a single feature, as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}
