//! Random forest regression
//!
//! An ensemble of CART regression trees, each grown on its own bootstrap
//! sample. Trees are independent, so they can be grown on a rayon pool; every
//! tree derives its seed from the forest seed and its index, which keeps the
//! result identical whatever the number of jobs.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ml::dataset::FeatureMatrix;
use crate::ml::models::tree::{DecisionTreeConfig, DecisionTreeRegressor};
use crate::ml::models::SupervisedModel;

/// Seed used when the configuration does not fix one
const DEFAULT_SEED: u64 = 42;

/// Configuration for Random Forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestConfig {
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Maximum depth of each tree (None = no limit)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples required at a leaf node
    pub min_samples_leaf: usize,
    /// Number of features to consider at each split (None = all features)
    pub max_features: Option<usize>,
    /// Whether to bootstrap samples
    pub bootstrap: bool,
    /// Maximum number of samples to draw for each tree (None = n_samples)
    pub max_samples: Option<usize>,
    /// Random seed
    pub random_seed: Option<u64>,
    /// Number of parallel jobs (0 = use all cores, 1 = sequential)
    pub n_jobs: usize,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        RandomForestConfig {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            max_samples: None,
            random_seed: None,
            n_jobs: 1,
        }
    }
}

/// Builder for RandomForestConfig
pub struct RandomForestConfigBuilder {
    config: RandomForestConfig,
}

impl RandomForestConfigBuilder {
    pub fn new() -> Self {
        RandomForestConfigBuilder {
            config: RandomForestConfig::default(),
        }
    }

    pub fn n_estimators(mut self, n: usize) -> Self {
        self.config.n_estimators = n;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    pub fn min_samples_split(mut self, samples: usize) -> Self {
        self.config.min_samples_split = samples;
        self
    }

    pub fn min_samples_leaf(mut self, samples: usize) -> Self {
        self.config.min_samples_leaf = samples;
        self
    }

    pub fn max_features(mut self, features: usize) -> Self {
        self.config.max_features = Some(features);
        self
    }

    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.config.bootstrap = bootstrap;
        self
    }

    pub fn max_samples(mut self, samples: usize) -> Self {
        self.config.max_samples = Some(samples);
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    pub fn n_jobs(mut self, jobs: usize) -> Self {
        self.config.n_jobs = jobs;
        self
    }

    pub fn build(self) -> RandomForestConfig {
        self.config
    }
}

impl Default for RandomForestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Random Forest Regressor
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    config: RandomForestConfig,
    trees: Vec<DecisionTreeRegressor>,
    feature_names: Vec<String>,
    feature_importances_: Option<HashMap<String, f64>>,
    is_fitted: bool,
}

impl RandomForestRegressor {
    /// Create a new random forest regressor
    pub fn new(config: RandomForestConfig) -> Self {
        RandomForestRegressor {
            config,
            trees: Vec::new(),
            feature_names: Vec::new(),
            feature_importances_: None,
            is_fitted: false,
        }
    }

    /// Create with default configuration
    pub fn default_config() -> Self {
        Self::new(RandomForestConfig::default())
    }

    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    /// Feature names seen during fit, in training order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn tree_seed(config: &RandomForestConfig, tree_idx: usize) -> u64 {
        config
            .random_seed
            .unwrap_or(DEFAULT_SEED)
            .wrapping_add(tree_idx as u64)
    }

    /// Bootstrap sample indices, drawn with replacement
    fn bootstrap_indices(config: &RandomForestConfig, n_samples: usize, tree_idx: usize) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(Self::tree_seed(config, tree_idx));
        let max_samples = config.max_samples.unwrap_or(n_samples).clamp(1, n_samples);
        (0..max_samples)
            .map(|_| rng.random_range(0..n_samples))
            .collect()
    }

    fn fit_tree(
        config: &RandomForestConfig,
        x: &FeatureMatrix,
        y: &[f64],
        tree_idx: usize,
    ) -> Result<DecisionTreeRegressor> {
        let tree_config = DecisionTreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.max_features,
            random_seed: Some(Self::tree_seed(config, tree_idx)),
        };

        let indices = if config.bootstrap {
            Self::bootstrap_indices(config, x.n_samples(), tree_idx)
        } else {
            (0..x.n_samples()).collect()
        };

        let mut tree = DecisionTreeRegressor::new(tree_config);
        tree.fit_indices(x, y, indices)?;
        Ok(tree)
    }

    fn grow_trees(&self, x: &FeatureMatrix, y: &[f64]) -> Result<Vec<DecisionTreeRegressor>> {
        let config = &self.config;
        let n_trees = config.n_estimators;

        match config.n_jobs {
            1 => (0..n_trees)
                .map(|t| Self::fit_tree(config, x, y, t))
                .collect(),
            0 => (0..n_trees)
                .into_par_iter()
                .map(|t| Self::fit_tree(config, x, y, t))
                .collect(),
            jobs => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build()
                    .map_err(|e| Error::Computation(format!("cannot start thread pool: {}", e)))?;
                pool.install(|| {
                    (0..n_trees)
                        .into_par_iter()
                        .map(|t| Self::fit_tree(config, x, y, t))
                        .collect()
                })
            }
        }
    }

    /// Mean of the per-tree importances, renormalized to sum to 1
    fn calculate_feature_importances(&mut self) {
        let mut totals: HashMap<String, f64> = self
            .feature_names
            .iter()
            .map(|name| (name.clone(), 0.0))
            .collect();

        for tree in &self.trees {
            if let Some(importances) = tree.feature_importances() {
                for (name, value) in importances {
                    *totals.entry(name).or_insert(0.0) += value;
                }
            }
        }

        let sum: f64 = totals.values().sum();
        if sum > 0.0 {
            for value in totals.values_mut() {
                *value /= sum;
            }
        }
        self.feature_importances_ = Some(totals);
    }
}

impl SupervisedModel for RandomForestRegressor {
    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        if self.config.n_estimators == 0 {
            return Err(Error::InvalidInput(
                "a random forest needs at least one tree".to_string(),
            ));
        }
        if x.n_samples() == 0 {
            return Err(Error::EmptyData(
                "cannot fit a random forest on zero samples".to_string(),
            ));
        }

        self.trees = self.grow_trees(x, y)?;
        self.feature_names = x.feature_names().to_vec();
        self.calculate_feature_importances();
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        if !self.is_fitted {
            return Err(Error::NotTrained("random forest has not been fitted".to_string()));
        }

        let mut avg_predictions = vec![0.0; x.n_samples()];
        for tree in &self.trees {
            for (avg, pred) in avg_predictions.iter_mut().zip(tree.predict(x)?) {
                *avg += pred;
            }
        }

        let n_trees = self.trees.len() as f64;
        for pred in &mut avg_predictions {
            *pred /= n_trees;
        }
        Ok(avg_predictions)
    }

    fn feature_importances(&self) -> Option<HashMap<String, f64>> {
        self.feature_importances_.clone()
    }
}
