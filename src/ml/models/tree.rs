//! Decision tree regressor
//!
//! CART regression tree grown with the mean squared error criterion. Split
//! search sorts each candidate feature once per node and scans prefix sums, so
//! a node costs `O(n log n)` per feature.

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ml::dataset::FeatureMatrix;
use crate::ml::models::SupervisedModel;

/// Nodes whose impurity falls below this are not split further
const MIN_IMPURITY: f64 = 1e-10;

/// Configuration for decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeConfig {
    /// Maximum depth of the tree (None = no limit)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples required at a leaf node
    pub min_samples_leaf: usize,
    /// Maximum number of features to consider for splits (None = all features)
    pub max_features: Option<usize>,
    /// Random seed for reproducibility
    pub random_seed: Option<u64>,
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        DecisionTreeConfig {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_seed: None,
        }
    }
}

/// Builder for DecisionTreeConfig
pub struct DecisionTreeConfigBuilder {
    config: DecisionTreeConfig,
}

impl DecisionTreeConfigBuilder {
    pub fn new() -> Self {
        DecisionTreeConfigBuilder {
            config: DecisionTreeConfig::default(),
        }
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

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    pub fn build(self) -> DecisionTreeConfig {
        self.config
    }
}

impl Default for DecisionTreeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A node in the decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature index used for splitting
    pub feature_index: Option<usize>,
    /// Threshold for the split; samples `<= threshold` go left
    pub threshold: Option<f64>,
    /// Mean target of the samples at this node
    pub prediction: f64,
    /// Left child node index
    pub left_child: Option<usize>,
    /// Right child node index
    pub right_child: Option<usize>,
    /// Number of samples at this node
    pub n_samples: usize,
    /// Mean squared error at this node
    pub impurity: f64,
    /// Depth of this node
    pub depth: usize,
    /// Whether this is a leaf node
    pub is_leaf: bool,
}

impl TreeNode {
    fn new_leaf(prediction: f64, n_samples: usize, impurity: f64, depth: usize) -> Self {
        TreeNode {
            feature_index: None,
            threshold: None,
            prediction,
            left_child: None,
            right_child: None,
            n_samples,
            impurity,
            depth,
            is_leaf: true,
        }
    }

    fn new_split(
        feature_index: usize,
        threshold: f64,
        prediction: f64,
        n_samples: usize,
        impurity: f64,
        depth: usize,
    ) -> Self {
        TreeNode {
            feature_index: Some(feature_index),
            threshold: Some(threshold),
            prediction,
            left_child: None,
            right_child: None,
            n_samples,
            impurity,
            depth,
            is_leaf: false,
        }
    }
}

/// Chosen split of a node
struct Split {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Decision Tree Regressor
#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    config: DecisionTreeConfig,
    nodes: Vec<TreeNode>,
    feature_names: Vec<String>,
    feature_importances_: Option<HashMap<String, f64>>,
    is_fitted: bool,
}

impl DecisionTreeRegressor {
    /// Create a new decision tree regressor
    pub fn new(config: DecisionTreeConfig) -> Self {
        DecisionTreeRegressor {
            config,
            nodes: Vec::new(),
            feature_names: Vec::new(),
            feature_importances_: None,
            is_fitted: false,
        }
    }

    /// Create with default configuration
    pub fn default_config() -> Self {
        Self::new(DecisionTreeConfig::default())
    }

    /// Get the tree nodes
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Get the tree depth
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Get the number of leaves
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf).count()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Grow the tree on the rows at `indices` (repeats allowed)
    pub(crate) fn fit_indices(
        &mut self,
        x: &FeatureMatrix,
        y: &[f64],
        indices: Vec<usize>,
    ) -> Result<()> {
        if x.n_samples() != y.len() {
            return Err(Error::DimensionMismatch(format!(
                "{} feature rows but {} targets",
                x.n_samples(),
                y.len()
            )));
        }
        if indices.is_empty() || x.n_features() == 0 {
            return Err(Error::EmptyData(
                "a tree needs at least one sample and one feature".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.config.random_seed.unwrap_or(0));
        self.feature_names = x.feature_names().to_vec();
        self.nodes.clear();
        self.build_tree(x.rows(), y, indices, 0, &mut rng);
        self.calculate_feature_importances();
        self.is_fitted = true;
        Ok(())
    }

    /// Mean and mean squared error of the targets at `indices`
    fn node_stats(y: &[f64], indices: &[usize]) -> (f64, f64) {
        let n = indices.len() as f64;
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n;
        let mse = indices.iter().map(|&i| (y[i] - mean).powi(2)).sum::<f64>() / n;
        (mean, mse)
    }

    fn candidate_features(&self, n_features: usize, rng: &mut StdRng) -> Vec<usize> {
        let mut features: Vec<usize> = (0..n_features).collect();
        match self.config.max_features {
            Some(max) if max < n_features => {
                features.shuffle(rng);
                features.truncate(max.max(1));
                features
            }
            _ => features,
        }
    }

    /// Find the split with the largest decrease in summed squared error
    fn find_best_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        rng: &mut StdRng,
    ) -> Option<Split> {
        let n = indices.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;

        let mut best_gain = 0.0;
        let mut best: Option<(usize, f64)> = None;

        for feature in self.candidate_features(x[0].len(), rng) {
            let mut pairs: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (x[i][feature], y[i]))
                .filter(|(v, _)| v.is_finite())
                .collect();
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            // rows with a non-finite value always fall to the right
            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 0..pairs.len().saturating_sub(1) {
                let (value, target) = pairs[k];
                left_sum += target;
                left_sq += target * target;

                let next = pairs[k + 1].0;
                if next <= value {
                    continue;
                }
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let left_sse = left_sq - left_sum * left_sum / n_left as f64;
                let right_sse = right_sq - right_sum * right_sum / n_right as f64;
                let gain = parent_sse - left_sse - right_sse;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature, (value + next) / 2.0));
                }
            }
        }

        let (feature, threshold) = best?;
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| x[i][feature] <= threshold);
        Some(Split {
            feature,
            threshold,
            left,
            right,
        })
    }

    /// Build the tree recursively
    fn build_tree(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let (prediction, impurity) = Self::node_stats(y, &indices);
        let total = indices.len();

        let should_stop = self.config.max_depth.map(|d| depth >= d).unwrap_or(false)
            || total < self.config.min_samples_split
            || impurity < MIN_IMPURITY;

        let split = if should_stop {
            None
        } else {
            self.find_best_split(x, y, &indices, rng)
        };

        let node_idx = self.nodes.len();
        match split {
            Some(split) => {
                self.nodes.push(TreeNode::new_split(
                    split.feature,
                    split.threshold,
                    prediction,
                    total,
                    impurity,
                    depth,
                ));
                let left_child_idx = self.build_tree(x, y, split.left, depth + 1, rng);
                let right_child_idx = self.build_tree(x, y, split.right, depth + 1, rng);
                self.nodes[node_idx].left_child = Some(left_child_idx);
                self.nodes[node_idx].right_child = Some(right_child_idx);
            }
            None => {
                self.nodes
                    .push(TreeNode::new_leaf(prediction, total, impurity, depth));
            }
        }
        node_idx
    }

    /// Predict for a single sample
    fn predict_single(&self, sample: &[f64]) -> f64 {
        let mut node_idx = 0;
        loop {
            let node = &self.nodes[node_idx];
            match (node.feature_index, node.threshold, node.left_child, node.right_child) {
                (Some(feature), Some(threshold), Some(left), Some(right)) => {
                    node_idx = if sample[feature] <= threshold { left } else { right };
                }
                _ => return node.prediction,
            }
        }
    }

    /// Weighted impurity decrease per feature, normalized to sum to 1
    fn calculate_feature_importances(&mut self) {
        let mut importances = vec![0.0f64; self.feature_names.len()];
        let total_samples = self.nodes.first().map(|n| n.n_samples).unwrap_or(1) as f64;

        for node in &self.nodes {
            if let (Some(feature_idx), Some(left_idx), Some(right_idx)) =
                (node.feature_index, node.left_child, node.right_child)
            {
                let left_node = &self.nodes[left_idx];
                let right_node = &self.nodes[right_idx];
                let n = node.n_samples as f64;

                let weighted_impurity_decrease = (n / total_samples)
                    * (node.impurity
                        - (left_node.n_samples as f64 / n) * left_node.impurity
                        - (right_node.n_samples as f64 / n) * right_node.impurity);

                importances[feature_idx] += weighted_impurity_decrease;
            }
        }

        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut importances {
                *imp /= sum;
            }
        }

        self.feature_importances_ = Some(
            self.feature_names
                .iter()
                .cloned()
                .zip(importances)
                .collect(),
        );
    }
}

impl SupervisedModel for DecisionTreeRegressor {
    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        let indices: Vec<usize> = (0..x.n_samples()).collect();
        self.fit_indices(x, y, indices)
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        if !self.is_fitted {
            return Err(Error::NotTrained("decision tree has not been fitted".to_string()));
        }
        if x.n_features() != self.feature_names.len() {
            return Err(Error::DimensionMismatch(format!(
                "tree was fitted on {} features, got {}",
                self.feature_names.len(),
                x.n_features()
            )));
        }
        Ok(x.rows().iter().map(|sample| self.predict_single(sample)).collect())
    }

    fn feature_importances(&self) -> Option<HashMap<String, f64>> {
        self.feature_importances_.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::models::ModelEvaluator;

    fn create_regression_data() -> (FeatureMatrix, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (1..=10)
            .map(|i| vec![i as f64, if i % 2 == 0 { 1.0 } else { 0.0 }])
            .collect();
        let y: Vec<f64> = (1..=10).map(|i| 2.0 * i as f64).collect();
        let x = FeatureMatrix::new(vec!["x1".into(), "noise".into()], rows).unwrap();
        (x, y)
    }

    #[test]
    fn test_decision_tree_regressor() {
        let (x, y) = create_regression_data();
        let mut tree = DecisionTreeRegressor::default_config();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions, y);

        let metrics = tree.evaluate(&x, &y).unwrap();
        assert!(metrics.get_metric("r2").unwrap() > 0.99);
    }

    #[test]
    fn test_tree_depth_limit() {
        let (x, y) = create_regression_data();
        let config = DecisionTreeConfigBuilder::new().max_depth(2).build();
        let mut tree = DecisionTreeRegressor::new(config);
        tree.fit(&x, &y).unwrap();

        assert!(tree.depth() <= 2);
        assert!(tree.n_leaves() <= 4);
    }

    #[test]
    fn test_feature_importances() {
        let (x, y) = create_regression_data();
        let mut tree = DecisionTreeRegressor::default_config();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        let sum: f64 = importances.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(importances["x1"] > importances["noise"]);
    }

    #[test]
    fn test_leaf_and_split_sizes() {
        let (x, y) = create_regression_data();
        let config = DecisionTreeConfigBuilder::new()
            .min_samples_leaf(3)
            .min_samples_split(7)
            .build();
        let mut tree = DecisionTreeRegressor::new(config);
        tree.fit(&x, &y).unwrap();

        for node in tree.nodes() {
            if node.is_leaf {
                assert!(node.n_samples >= 3);
            } else {
                assert!(node.n_samples >= 7);
            }
        }
    }

    #[test]
    fn test_max_features_samples_split_candidates() {
        let (x, y) = create_regression_data();
        let root_feature = |config: DecisionTreeConfig| {
            let mut tree = DecisionTreeRegressor::new(config);
            tree.fit(&x, &y).unwrap();
            tree.nodes()[0].feature_index
        };

        // with every feature available the root always splits on x1
        assert_eq!(root_feature(DecisionTreeConfig::default()), Some(0));
        let roots: Vec<Option<usize>> = (0..20)
            .map(|seed| {
                root_feature(
                    DecisionTreeConfigBuilder::new()
                        .max_features(1)
                        .random_seed(seed)
                        .build(),
                )
            })
            .collect();
        assert!(roots.contains(&Some(0)));
        assert!(roots.contains(&Some(1)));
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let (x, _) = create_regression_data();
        let mut tree = DecisionTreeRegressor::default_config();
        tree.fit(&x, &[3.0; 10]).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict(&x).unwrap(), vec![3.0; 10]);
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _) = create_regression_data();
        let tree = DecisionTreeRegressor::default_config();
        assert!(matches!(tree.predict(&x), Err(Error::NotTrained(_))));
    }
}
