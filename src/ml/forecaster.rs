//! Sales forecaster: a regression model chosen at runtime
//!
//! `SalesForecaster` wraps either a random forest or a standardized linear
//! regression behind one train / predict / evaluate / importance contract.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::ml::dataset::FeatureMatrix;
use crate::ml::model_selection::train_test_split;
use crate::ml::models::{
    regression_metrics, FeatureImportance, LinearRegression, ModelMetrics,
    RandomForestConfigBuilder, RandomForestRegressor, SupervisedModel,
};
use crate::ml::preprocessing::{StandardScaler, Transformer};

/// Regression algorithm behind a forecaster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    RandomForest,
    LinearRegression,
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::RandomForest
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelType::RandomForest => write!(f, "random_forest"),
            ModelType::LinearRegression => write!(f, "linear_regression"),
        }
    }
}

impl FromStr for ModelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "random_forest" => Ok(ModelType::RandomForest),
            "linear_regression" => Ok(ModelType::LinearRegression),
            other => Err(Error::UnsupportedModel(other.to_string())),
        }
    }
}

/// Train and test partitions of a feature table
#[derive(Debug, Clone)]
pub struct TrainTestData {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
}

impl TrainTestData {
    pub fn feature_names(&self) -> &[String] {
        self.x_train.feature_names()
    }
}

/// Fitted state of the selected algorithm
#[derive(Debug, Clone)]
enum FittedModel {
    RandomForest(RandomForestRegressor),
    LinearRegression {
        scaler: StandardScaler,
        model: LinearRegression,
    },
}

impl FittedModel {
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        match self {
            FittedModel::RandomForest(forest) => forest.predict(x),
            FittedModel::LinearRegression { scaler, model } => {
                model.predict(&scaler.transform(x)?)
            }
        }
    }
}

/// Regression forecaster for an aggregated sales table
///
/// Lifecycle is untrained, then trained; training again replaces the fitted
/// state.
#[derive(Debug, Clone)]
pub struct SalesForecaster {
    model_type: ModelType,
    config: ModelConfig,
    fitted: Option<FittedModel>,
}

impl SalesForecaster {
    /// Forecaster with default settings for `model_type`
    pub fn new(model_type: ModelType) -> Self {
        Self::with_config(ModelConfig {
            model_type,
            ..ModelConfig::default()
        })
    }

    /// Forecaster for a model name, `"random_forest"` or `"linear_regression"`
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    pub fn with_config(config: ModelConfig) -> Self {
        SalesForecaster {
            model_type: config.model_type,
            config,
            fitted: None,
        }
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    fn fitted(&self) -> Result<&FittedModel> {
        self.fitted
            .as_ref()
            .ok_or_else(|| Error::NotTrained(format!("{} forecaster", self.model_type)))
    }

    /// Split the numeric columns of `frame` into shuffled train/test sets
    ///
    /// Every numeric column except `target` becomes a feature. Rows with a
    /// missing cell in any numeric column are dropped before splitting.
    pub fn prepare_data_for_training(
        &self,
        frame: &DataFrame,
        target: &str,
        test_fraction: f64,
    ) -> Result<TrainTestData> {
        let numeric = frame.numeric_column_names();
        if !numeric.iter().any(|c| c == target) {
            return Err(Error::MissingColumns(vec![target.to_string()]));
        }
        let features: Vec<String> = numeric.iter().filter(|c| *c != target).cloned().collect();
        if features.is_empty() {
            return Err(Error::InvalidInput(
                "no numeric feature columns besides the target".to_string(),
            ));
        }

        let x = FeatureMatrix::from_dataframe(frame, &features)?;
        let y = frame.get_column_numeric_values(target)?;
        let complete: Vec<usize> = (0..x.n_samples())
            .filter(|&i| y[i].is_finite() && x.row(i).iter().all(|v| v.is_finite()))
            .collect();
        if complete.len() < x.n_samples() {
            debug!(
                "dropping {} rows with missing values before splitting",
                x.n_samples() - complete.len()
            );
        }

        let (train_pos, test_pos) =
            train_test_split(complete.len(), test_fraction, self.config.random_seed)?;
        let train_idx: Vec<usize> = train_pos.iter().map(|&p| complete[p]).collect();
        let test_idx: Vec<usize> = test_pos.iter().map(|&p| complete[p]).collect();

        Ok(TrainTestData {
            x_train: x.take(&train_idx)?,
            x_test: x.take(&test_idx)?,
            y_train: train_idx.iter().map(|&i| y[i]).collect(),
            y_test: test_idx.iter().map(|&i| y[i]).collect(),
        })
    }

    /// Fit the selected algorithm
    pub fn train(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<&mut Self> {
        if x.n_samples() == 0 || y.is_empty() {
            return Err(Error::EmptyData("cannot train on zero samples".to_string()));
        }
        if x.n_samples() != y.len() {
            return Err(Error::LengthMismatch {
                expected: x.n_samples(),
                actual: y.len(),
            });
        }

        let fitted = match self.model_type {
            ModelType::RandomForest => {
                let mut builder = RandomForestConfigBuilder::new()
                    .n_estimators(self.config.n_estimators)
                    .min_samples_split(self.config.min_samples_split)
                    .min_samples_leaf(self.config.min_samples_leaf)
                    .bootstrap(self.config.bootstrap)
                    .random_seed(self.config.random_seed)
                    .n_jobs(self.config.n_jobs);
                if let Some(depth) = self.config.max_depth {
                    builder = builder.max_depth(depth);
                }
                if let Some(features) = self.config.max_features {
                    builder = builder.max_features(features);
                }
                if let Some(samples) = self.config.max_samples {
                    builder = builder.max_samples(samples);
                }
                let mut forest = RandomForestRegressor::new(builder.build());
                forest.fit(x, y)?;
                FittedModel::RandomForest(forest)
            }
            ModelType::LinearRegression => {
                let mut scaler = StandardScaler::new();
                let scaled = scaler.fit_transform(x)?;
                let mut model = LinearRegression::new();
                model.fit(&scaled, y)?;
                FittedModel::LinearRegression { scaler, model }
            }
        };

        info!(
            "trained {} on {} samples with {} features",
            self.model_type,
            x.n_samples(),
            x.n_features()
        );
        self.fitted = Some(fitted);
        Ok(self)
    }

    /// Predict one value per row of `x`
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        self.fitted()?.predict(x)
    }

    /// `mae`, `mse`, `rmse` and `r2` on held-out data
    pub fn evaluate(&self, x: &FeatureMatrix, y: &[f64]) -> Result<ModelMetrics> {
        let predictions = self.predict(x)?;
        regression_metrics(y, &predictions)
    }

    /// Importance per feature, largest first
    ///
    /// Forest: normalized impurity decrease. Linear: the raw coefficient on
    /// standardized features, ordered by absolute value. `names` must list the
    /// features in training order.
    pub fn get_feature_importance(&self, names: &[String]) -> Result<Vec<FeatureImportance>> {
        let fitted = self.fitted()?;

        let values: Vec<f64> = match fitted {
            FittedModel::RandomForest(forest) => {
                let importances = forest.feature_importances().unwrap_or_default();
                forest
                    .feature_names()
                    .iter()
                    .map(|n| importances.get(n).copied().unwrap_or(0.0))
                    .collect()
            }
            FittedModel::LinearRegression { model, .. } => model.coefficients().to_vec(),
        };

        if values.len() != names.len() {
            return Err(Error::DimensionMismatch(format!(
                "model has {} features but {} names were given",
                values.len(),
                names.len()
            )));
        }

        let mut ranked: Vec<FeatureImportance> = names
            .iter()
            .zip(values)
            .map(|(feature, importance)| FeatureImportance {
                feature: feature.clone(),
                importance,
            })
            .collect();

        let key = |f: &FeatureImportance| match fitted {
            FittedModel::RandomForest(_) => f.importance,
            FittedModel::LinearRegression { .. } => f.importance.abs(),
        };
        ranked.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
        Ok(ranked)
    }
}
