//! Isolation forest over price/volume delta features
//!
//! Rows are (abs price delta, abs volume delta) pairs. A shock row sits far
//! from the bulk along at least one axis, so random axis-aligned splits cut it
//! off after few steps and its mean path length over the forest is short.

use super::{AnomalyConfig, AnomalyResult, MultivariateDetector};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;
use rand::seq::index;

/// Default upper bound on the rows drawn for each tree
///
/// Populations up to this size are scored by trees that have seen every row.
pub const DEFAULT_MAX_SAMPLES: usize = 4096;

/// Euler-Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_9;

/// A node in an isolation tree
#[derive(Debug, Clone)]
enum IsolationNode {
    /// Internal node with split information
    Internal {
        feature: usize,
        threshold: f64,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    /// Leaf node with size (number of samples)
    Leaf { size: usize },
}

/// Single isolation tree
#[derive(Debug, Clone)]
struct IsolationTree {
    root: IsolationNode,
}

impl IsolationTree {
    /// Build an isolation tree over the given rows of `data`
    fn build(data: &Array2<f64>, rows: &mut [usize], max_depth: usize, rng: &mut impl Rng) -> Self {
        let root = Self::build_node(data, rows, 0, max_depth, rng);
        Self { root }
    }

    /// Recursively build tree nodes
    fn build_node(
        data: &Array2<f64>,
        rows: &mut [usize],
        depth: usize,
        max_depth: usize,
        rng: &mut impl Rng,
    ) -> IsolationNode {
        let n_samples = rows.len();

        // Stop conditions: max depth reached or only one sample
        if depth >= max_depth || n_samples <= 1 {
            return IsolationNode::Leaf { size: n_samples };
        }

        // Only features that still vary inside this node can split it
        let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
            .filter_map(|feature| {
                let (min_val, max_val) = rows.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &r| (lo.min(data[[r, feature]]), hi.max(data[[r, feature]])),
                );
                (max_val > min_val).then_some((feature, min_val, max_val))
            })
            .collect();

        if candidates.is_empty() {
            return IsolationNode::Leaf { size: n_samples };
        }

        let (feature, min_val, max_val) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(min_val..max_val);

        // Partition rows in place: [..split] goes left
        let mut split = 0;
        for i in 0..n_samples {
            if data[[rows[i], feature]] < threshold {
                rows.swap(i, split);
                split += 1;
            }
        }

        // A threshold drawn exactly at the minimum leaves one side empty
        if split == 0 || split == n_samples {
            return IsolationNode::Leaf { size: n_samples };
        }

        let (left_rows, right_rows) = rows.split_at_mut(split);
        let left = Self::build_node(data, left_rows, depth + 1, max_depth, rng);
        let right = Self::build_node(data, right_rows, depth + 1, max_depth, rng);

        IsolationNode::Internal {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Compute path length for a single sample
    fn path_length(&self, sample: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                IsolationNode::Leaf { size } => return depth as f64 + average_path_length(*size),
                IsolationNode::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] < *threshold { &**left } else { &**right };
                    depth += 1;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` items
pub fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else if n == 2 {
        1.0
    } else {
        let n = n as f64;
        2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
    }
}

/// Isolation Forest for anomaly detection
#[derive(Clone)]
pub struct IsolationForest {
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Maximum number of samples per tree
    pub max_samples: usize,
    /// Contamination rate (expected proportion of anomalies)
    pub contamination: f64,
    /// Random seed; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Trained trees
    trees: Vec<IsolationTree>,
    /// Rows each tree was built from
    sample_size: usize,
    /// Threshold for anomaly detection
    threshold: Option<f64>,
}

impl IsolationForest {
    /// Create a new Isolation Forest
    ///
    /// # Arguments
    /// * `n_estimators` - Number of trees (default: 100)
    /// * `contamination` - Expected anomaly rate (default: 0.001)
    pub fn new(n_estimators: usize, contamination: f64) -> Self {
        Self {
            n_estimators,
            max_samples: DEFAULT_MAX_SAMPLES,
            contamination,
            seed: None,
            trees: Vec::new(),
            sample_size: 0,
            threshold: None,
        }
    }

    /// Create from the anomaly stage configuration
    pub fn from_config(config: &AnomalyConfig) -> Self {
        Self {
            seed: config.random_seed,
            ..Self::new(config.ensemble_size, config.contamination_fraction)
        }
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set max samples per tree
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Compute anomaly scores for samples
    ///
    /// Scores lie in (0, 1]; values near 1 are isolated after few splits.
    pub fn score_samples(&self, data: &Array2<f64>) -> Vec<f64> {
        let c = average_path_length(self.sample_size);

        data.rows()
            .into_iter()
            .map(|sample| {
                let avg_path_length: f64 = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(sample))
                    .sum::<f64>()
                    / self.trees.len() as f64;

                // Anomaly score: 2^(-E[h(x)] / c(n))
                if c > 0.0 {
                    2.0_f64.powf(-avg_path_length / c)
                } else {
                    0.5
                }
            })
            .collect()
    }
}

impl MultivariateDetector for IsolationForest {
    fn fit(&mut self, data: &Array2<f64>) -> Result<()> {
        let n_samples = data.nrows();
        if n_samples < 2 {
            return Err(Error::InsufficientData(format!(
                "isolation forest needs at least 2 samples, got {}",
                n_samples
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(
                "feature matrix contains non-finite values".to_string(),
            ));
        }

        let actual_samples = self.max_samples.clamp(2, n_samples);
        // Height limit based on sample size
        let max_depth = (actual_samples as f64).log2().ceil() as usize;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Build trees
        self.trees = (0..self.n_estimators)
            .map(|_| {
                let mut rows = index::sample(&mut rng, n_samples, actual_samples).into_vec();
                IsolationTree::build(data, &mut rows, max_depth, &mut rng)
            })
            .collect();
        self.sample_size = actual_samples;

        // Compute threshold based on contamination
        let mut sorted_scores = self.score_samples(data);
        sorted_scores.sort_by(|a, b| b.total_cmp(a)); // Descending

        // The top `k` scores are anomalous, along with anything tied with the k-th
        let k = ((n_samples as f64 * self.contamination).ceil() as usize).clamp(1, n_samples);
        let cutoff = sorted_scores[k - 1];
        let lowest = sorted_scores[n_samples - 1];
        // A cut-off that reaches the lowest score singles nothing out
        let threshold = if cutoff > lowest { cutoff } else { f64::INFINITY };
        self.threshold = Some(threshold);

        log::debug!(
            "Fitted {} trees on {} of {} rows (height limit {}), score threshold {:.4}",
            self.trees.len(),
            actual_samples,
            n_samples,
            max_depth,
            threshold
        );
        Ok(())
    }

    fn detect(&self, data: &Array2<f64>) -> AnomalyResult {
        if self.trees.is_empty() {
            return AnomalyResult::new(vec![], vec![], f64::NAN);
        }

        let scores = self.score_samples(data);
        let threshold = self.threshold.unwrap_or(0.5);

        let is_anomaly: Vec<bool> = scores.iter().map(|&s| s >= threshold).collect();

        AnomalyResult::new(is_anomaly, scores, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_forest_basic() {
        // Create normal data
        let mut rng = StdRng::seed_from_u64(42);
        let n_normal = 100;
        let n_features = 2;

        let mut data = Array2::zeros((n_normal + 2, n_features));

        // Normal points around (0, 0)
        for i in 0..n_normal {
            data[[i, 0]] = rng.gen_range(-1.0..1.0);
            data[[i, 1]] = rng.gen_range(-1.0..1.0);
        }

        // Anomalies far from the cluster
        data[[n_normal, 0]] = 10.0;
        data[[n_normal, 1]] = 10.0;
        data[[n_normal + 1, 0]] = -10.0;
        data[[n_normal + 1, 1]] = -10.0;

        let mut forest = IsolationForest::new(50, 0.02).with_seed(42);
        let result = forest.fit_detect(&data).unwrap();

        // The last two points should have the highest anomaly scores
        let max_normal = result.scores[..n_normal]
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(result.scores[n_normal] > max_normal);
        assert!(result.scores[n_normal + 1] > max_normal);
        assert!(result.is_anomaly[n_normal]);
        assert!(result.is_anomaly[n_normal + 1]);
    }

    #[test]
    fn test_few_outliers_in_large_cluster() {
        let outliers = [(200.0, 3.0), (25.0, 80.0), (150.0, 60.0)];
        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed + 10);
            let mut data = Array2::zeros((3000, 2));
            for i in 0..2997 {
                data[[i, 0]] = 25.0 + rng.gen_range(-0.05..0.05);
                data[[i, 1]] = 3.0 + rng.gen_range(-0.05..0.05);
            }
            for (j, &(p, v)) in outliers.iter().enumerate() {
                data[[2997 + j, 0]] = p;
                data[[2997 + j, 1]] = v;
            }

            let mut forest = IsolationForest::new(100, 0.001).with_seed(seed);
            let result = forest.fit_detect(&data).unwrap();

            for i in 2997..3000 {
                assert!(result.is_anomaly[i], "seed {}: row {} not flagged", seed, i);
            }
            let count = result.anomaly_count();
            assert!((3..=6).contains(&count), "seed {}: {} flagged", seed, count);
        }
    }

    #[test]
    fn test_ties_at_cutoff_are_flagged() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut data = Array2::from_shape_fn((302, 2), |_| rng.gen_range(0.0..1.0));
        // two identical outliers share every leaf, so their scores are equal
        for row in [300, 301] {
            data[[row, 0]] = 500.0;
            data[[row, 1]] = 500.0;
        }

        // 0.1% of 302 rows rounds up to a single slot
        let mut forest = IsolationForest::new(100, 0.001).with_seed(4);
        let result = forest.fit_detect(&data).unwrap();
        assert_eq!(result.scores[300], result.scores[301]);
        assert_eq!(result.anomaly_indices(), vec![300, 301]);
    }

    #[test]
    fn test_c_function() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(100) > average_path_length(10));
    }

    #[test]
    fn test_same_seed_same_scores() {
        let mut rng = StdRng::seed_from_u64(3);
        let data = Array2::from_shape_fn((200, 2), |_| rng.gen_range(0.0..1.0));

        let mut a = IsolationForest::new(20, 0.05).with_seed(11);
        let mut b = IsolationForest::new(20, 0.05).with_seed(11);
        let ra = a.fit_detect(&data).unwrap();
        let rb = b.fit_detect(&data).unwrap();

        assert_eq!(ra.scores, rb.scores);
        assert_eq!(ra.is_anomaly, rb.is_anomaly);
    }

    #[test]
    fn test_constant_population_flags_nothing() {
        let data = Array2::from_elem((500, 2), 3.0);
        let mut forest = IsolationForest::new(100, 0.01).with_seed(1);
        let result = forest.fit_detect(&data).unwrap();

        assert_eq!(result.anomaly_count(), 0);
        assert!(result.scores.iter().all(|&s| s == result.scores[0]));
    }

    #[test]
    fn test_one_constant_feature_still_splits() {
        // volume delta never moves; price delta carries one outlier
        let mut data = Array2::from_elem((300, 2), 0.0);
        for i in 0..300 {
            data[[i, 0]] = (i % 7) as f64 * 0.1;
        }
        data[[150, 0]] = 500.0;

        let mut forest = IsolationForest::new(100, 0.001).with_seed(9);
        let result = forest.fit_detect(&data).unwrap();
        assert_eq!(result.anomaly_indices(), vec![150]);
    }

    #[test]
    fn test_subsampled_trees() {
        let mut rng = StdRng::seed_from_u64(5);
        let data = Array2::from_shape_fn((1000, 2), |_| rng.gen_range(0.0..1.0));

        let mut forest = IsolationForest::new(10, 0.01)
            .with_seed(5)
            .with_max_samples(64);
        forest.fit(&data).unwrap();

        assert_eq!(forest.trees.len(), 10);
        assert_eq!(forest.sample_size, 64);
        let result = forest.detect(&data);
        assert_eq!(result.scores.len(), 1000);
        // 1% of 1000, plus whatever ties with the 10th score
        assert!(result.anomaly_count() >= 10);
        assert!(result.anomaly_count() < 50);
    }

    #[test]
    fn test_fit_rejects_tiny_or_non_finite_input() {
        let mut forest = IsolationForest::new(10, 0.01);
        assert!(matches!(
            forest.fit(&Array2::zeros((1, 2))),
            Err(Error::InsufficientData(_))
        ));

        let mut data = Array2::zeros((10, 2));
        data[[3, 1]] = f64::NAN;
        assert!(matches!(forest.fit(&data), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_unfitted_detect_is_empty() {
        let forest = IsolationForest::new(10, 0.01);
        let result = forest.detect(&Array2::zeros((5, 2)));
        assert!(result.is_anomaly.is_empty());
    }
}
