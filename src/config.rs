//! Pipeline configuration
//!
//! Every field has a default, so a configuration file only needs to name what
//! it changes. Files are read as TOML, YAML or JSON depending on their
//! extension.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ml::forecaster::ModelType;

/// File name looked up by [`PipelineConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "salesrs.toml";

/// Settings of the pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input CSV file
    pub data_path: PathBuf,
    /// Fail the run when any of the expected input columns is missing
    pub strict_schema: bool,
    /// Column holding the order date in the loaded table
    pub date_column: String,
    /// Column summed per day
    pub value_column: String,
    /// Column of the daily table the forecaster predicts
    pub target_column: String,
    /// z-score above which a daily total counts as an outlier
    pub outlier_threshold: f64,
    pub model: ModelConfig,
    pub forecast: ForecastConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data_path: PathBuf::from("data/sample_sales_data.csv"),
            strict_schema: false,
            date_column: "Order Date".to_string(),
            value_column: "Sales".to_string(),
            target_column: "sales".to_string(),
            outlier_threshold: 3.0,
            model: ModelConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }
}

/// Forecaster settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model_type: ModelType,
    /// Trees in the random forest
    pub n_estimators: usize,
    /// Depth limit of each tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Seed of the train/test shuffle and of the forest
    pub random_seed: u64,
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
    /// Threads for forest fitting (1 = sequential, 0 = all cores)
    pub n_jobs: usize,
    /// Smallest node a tree may split
    pub min_samples_split: usize,
    /// Smallest leaf a split may leave
    pub min_samples_leaf: usize,
    /// Features drawn per split (None = all)
    pub max_features: Option<usize>,
    /// Grow each tree on a bootstrap sample instead of every row
    pub bootstrap: bool,
    /// Rows drawn per bootstrap sample (None = as many as there are rows)
    pub max_samples: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            model_type: ModelType::RandomForest,
            n_estimators: 100,
            max_depth: None,
            random_seed: 42,
            test_fraction: 0.2,
            n_jobs: 1,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            max_samples: None,
        }
    }
}

/// Projection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Days projected
    pub horizon: usize,
    /// Trailing points averaged as the base level
    pub window: usize,
    /// Compound growth per day
    pub growth_rate: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            horizon: 30,
            window: 30,
            growth_rate: 0.02,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file; the format follows the extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(Error::Io)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let config: PipelineConfig = match extension.as_deref() {
            Some("toml") => toml::from_str(&text)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            _ => {
                return Err(Error::Config(format!(
                    "unsupported configuration format: {}",
                    path.display()
                )))
            }
        };
        config.validate()?;
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Configuration from `./salesrs.toml`, then from the user config
    /// directory (`<config dir>/salesrs/config.toml`), else the defaults
    pub fn discover() -> Result<Self> {
        match Self::candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("salesrs").join("config.toml"));
        }
        paths
    }

    /// Reject values no stage can work with
    pub fn validate(&self) -> Result<()> {
        let fraction = self.model.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(Error::Config(format!(
                "model.test_fraction must be within (0, 1), got {}",
                fraction
            )));
        }
        if self.model.n_estimators == 0 {
            return Err(Error::Config("model.n_estimators must be positive".to_string()));
        }
        if self.model.min_samples_split < 2 {
            return Err(Error::Config("model.min_samples_split must be at least 2".to_string()));
        }
        if self.model.min_samples_leaf == 0 {
            return Err(Error::Config("model.min_samples_leaf must be positive".to_string()));
        }
        if self.model.max_features == Some(0) || self.model.max_samples == Some(0) {
            return Err(Error::Config(
                "model.max_features and model.max_samples must be positive when set".to_string(),
            ));
        }
        if self.forecast.window == 0 {
            return Err(Error::Config("forecast.window must be positive".to_string()));
        }
        if !self.outlier_threshold.is_finite() || self.outlier_threshold < 0.0 {
            return Err(Error::Config(format!(
                "outlier_threshold must be a non-negative number, got {}",
                self.outlier_threshold
            )));
        }
        Ok(())
    }
}
