//! Machine learning: feature matrices, preprocessing, regression models,
//! evaluation and the sales forecaster built on them

pub mod anomaly_detection;
pub mod dataset;
pub mod forecaster;
pub mod metrics;
pub mod model_selection;
pub mod models;
pub mod preprocessing;

pub use anomaly_detection::{detect_outliers, z_scores, DEFAULT_Z_THRESHOLD};
pub use dataset::FeatureMatrix;
pub use forecaster::{ModelType, SalesForecaster, TrainTestData};
pub use models::{FeatureImportance, ModelMetrics, SupervisedModel};
