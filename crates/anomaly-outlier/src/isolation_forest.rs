//! Isolation forest outlier scoring
//!
//! Each tree isolates points by recursive random splits; anomalies need
//! fewer splits. The score of a point is `2^(-E[h(x)] / c(psi))` where `h` is
//! its path length, `psi` the per-tree sub-sample size and `c` the average
//! path length of an unsuccessful binary-search-tree lookup. Scores near 1
//! are anomalous, scores well below 0.5 are normal.
//!
//! The scorer treats each value as a single feature with no temporal
//! context, and refits the forest on every call.
//!
//! The scorer's output is deterministic if and only if the caller pins the
//! random seed.

use anomaly_core::{Error, PointScorer, PointScores, Result, ScorerProperties, TimeSeries};
use anomaly_quantile::PercentileThreshold;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Isolation forest parameters
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForestParameters {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Upper bound on the sub-sample drawn for each tree
    pub max_samples: usize,
    /// Expected fraction of outliers, in `(0, 0.5]`
    pub contamination: f64,
    /// Seed for sub-sampling and split selection; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for IsolationForestParameters {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.05,
            seed: None,
        }
    }
}

impl IsolationForestParameters {
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(Error::InvalidParameter(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.max_samples < 2 {
            return Err(Error::InvalidParameter(
                "max_samples must be at least 2".to_string(),
            ));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(Error::InvalidParameter(format!(
                "contamination = {} must be in (0, 0.5]",
                self.contamination
            )));
        }
        Ok(())
    }
}

/// Average path length of an unsuccessful search in a BST of `n` nodes
pub(crate) fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let m = (n - 1) as f64;
            2.0 * (m.ln() + EULER_GAMMA) - 2.0 * m / n as f64
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One isolation tree stored as a node arena; node 0 is the root
#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn fit<R: Rng>(sample: Vec<f64>, depth_limit: usize, rng: &mut R) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(sample, 0, depth_limit, rng);
        tree
    }

    fn grow<R: Rng>(&mut self, data: Vec<f64>, depth: usize, depth_limit: usize, rng: &mut R) -> usize {
        let id = self.nodes.len();
        let (min, max) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if data.len() <= 1 || depth >= depth_limit || min >= max {
            self.nodes.push(Node::Leaf { size: data.len() });
            return id;
        }

        let threshold = rng.gen_range(min..max);
        // placeholder, patched once both children exist
        self.nodes.push(Node::Leaf { size: 0 });
        let (lower, upper): (Vec<f64>, Vec<f64>) = data.into_iter().partition(|&v| v < threshold);
        let left = self.grow(lower, depth + 1, depth_limit, rng);
        let right = self.grow(upper, depth + 1, depth_limit, rng);
        self.nodes[id] = Node::Split {
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, x: f64) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[node] {
                Node::Split {
                    threshold,
                    left,
                    right,
                } => {
                    node = if x < threshold { left } else { right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(size),
            }
        }
    }
}

/// A fitted forest; lives only for the duration of one scoring call
#[derive(Debug, Clone)]
pub(crate) struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
}

impl IsolationForest {
    pub(crate) fn fit<R: Rng>(values: &[f64], n_trees: usize, max_samples: usize, rng: &mut R) -> Self {
        let sample_size = max_samples.min(values.len());
        let depth_limit = (sample_size as f64).log2().ceil() as usize;
        let trees = (0..n_trees)
            .map(|_| {
                let sample: Vec<f64> = index::sample(rng, values.len(), sample_size)
                    .into_iter()
                    .map(|i| values[i])
                    .collect();
                IsolationTree::fit(sample, depth_limit, rng)
            })
            .collect();
        Self { trees, sample_size }
    }

    /// Anomaly score in `(0, 1]`
    pub(crate) fn score(&self, x: f64) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(x)).sum::<f64>()
            / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size);
        if norm == 0.0 {
            return 0.5;
        }
        2f64.powf(-mean_path / norm)
    }
}

/// Statistical scorer backed by an isolation forest
///
/// Labels the `contamination` fraction of points with the highest anomaly
/// scores. The threshold is the `100 * (1 - contamination)` percentile of the
/// scores of the series itself, so slightly fewer points are labelled when
/// scores tie at the threshold.
#[derive(Debug, Clone, Default)]
pub struct IsolationForestScorer {
    params: IsolationForestParameters,
}

impl IsolationForestScorer {
    pub fn new(params: IsolationForestParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Scorer with default forest shape and the given contamination and seed
    pub fn with_contamination(contamination: f64, seed: Option<u64>) -> Result<Self> {
        Self::new(IsolationForestParameters {
            contamination,
            seed,
            ..Default::default()
        })
    }

    pub fn parameters(&self) -> &IsolationForestParameters {
        &self.params
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

impl ScorerProperties for IsolationForestScorer {
    fn algorithm_name(&self) -> &'static str {
        "IsolationForest"
    }

    fn minimum_sample_size(&self) -> usize {
        2
    }
}

impl PointScorer for IsolationForestScorer {
    fn score_points(&self, series: &TimeSeries) -> Result<PointScores> {
        let values = series.complete_values()?;
        if values.len() < self.minimum_sample_size() {
            return Err(Error::insufficient(self.minimum_sample_size(), values.len()));
        }

        let mut rng = self.rng();
        let forest = IsolationForest::fit(&values, self.params.n_trees, self.params.max_samples, &mut rng);
        let scores: Vec<f64> = values.iter().map(|&v| forest.score(v)).collect();

        let cutoff = PercentileThreshold::new(100.0 * (1.0 - self.params.contamination))?;
        let (threshold, flags) = cutoff.fit_flag(&scores)?;

        let result = PointScores {
            scores,
            flags,
            threshold,
        };
        debug!(
            series = series.name(),
            samples = values.len(),
            trees = self.params.n_trees,
            contamination = self.params.contamination,
            threshold,
            anomalies = result.anomaly_count(),
            "isolation forest scored series"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(256) from Liu et al.
        assert_relative_eq!(average_path_length(256), 10.2448, epsilon = 1e-3);
    }

    #[test]
    fn test_extreme_value_scores_highest() {
        let mut values: Vec<f64> = (0..200).map(|i| (i % 20) as f64 * 0.1).collect();
        values.push(50.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let forest = IsolationForest::fit(&values, 100, 256, &mut rng);
        let outlier = forest.score(50.0);
        let inlier = forest.score(1.0);
        assert!(outlier > 0.6, "outlier score {outlier}");
        assert!(outlier > inlier);
    }

    #[test]
    fn test_constant_series_flags_nothing() {
        let series = TimeSeries::from_values("flat", &[3.0; 50]);
        let scorer = IsolationForestScorer::with_contamination(0.05, Some(0)).unwrap();
        let result = scorer.score_points(&series).unwrap();
        assert_eq!(result.anomaly_count(), 0);
        assert!(result.scores.iter().all(|&s| s == result.scores[0]));
    }

    #[test]
    fn test_rejects_gaps_and_bad_parameters() {
        let series = TimeSeries::from_values("sensor", &[1.0, f64::NAN, 2.0]);
        let scorer = IsolationForestScorer::default();
        assert!(matches!(
            scorer.score_points(&series),
            Err(Error::MissingValues { count: 1 })
        ));

        assert!(IsolationForestScorer::with_contamination(0.0, None).is_err());
        assert!(IsolationForestScorer::with_contamination(0.6, None).is_err());
        assert!(IsolationForestScorer::new(IsolationForestParameters {
            n_trees: 0,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let series = TimeSeries::from_values("sensor", &[1.0]);
        let scorer = IsolationForestScorer::default();
        assert!(matches!(
            scorer.score_points(&series),
            Err(Error::InsufficientData { expected: 2, actual: 1 })
        ));
    }
}
