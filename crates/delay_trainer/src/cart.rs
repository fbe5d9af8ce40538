//! CART (Classification and Regression Tree) builder
//!
//! Second-order boosting trees over pre-binned integer features. Each node
//! accumulates per-bin gradient/hessian histograms, and split gains and leaf
//! values are computed in fixed-point integers only.

use flightdelay_core::{Node, Tree, SCALE};

use crate::deterministic::SplitTieBreaker;
use crate::errors::TrainerError;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Minimum hessian sum per child (fixed-point)
    pub min_child_weight: i64,
    /// L2 penalty on leaf values (fixed-point)
    pub lambda: i64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_samples_leaf: 1,
            min_child_weight: SCALE,
            lambda: SCALE,
        }
    }
}

/// Feature values mapped to dense per-feature bin codes
///
/// `thresholds[f]` holds the sorted distinct values of feature `f`; bin `b`
/// covers exactly `thresholds[f][b]`. Codes are stored column-major.
#[derive(Clone, Debug)]
pub struct BinnedFeatures {
    thresholds: Vec<Vec<i64>>,
    codes: Vec<Vec<u32>>,
    n_samples: usize,
}

impl BinnedFeatures {
    pub fn from_rows(rows: &[Vec<i64>], n_features: usize) -> Result<Self, TrainerError> {
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_features) {
            return Err(TrainerError::Training(format!(
                "row {} has {} features, expected {}",
                row,
                r.len(),
                n_features
            )));
        }

        let mut thresholds = Vec::with_capacity(n_features);
        let mut codes = Vec::with_capacity(n_features);

        for f in 0..n_features {
            let mut values: Vec<i64> = rows.iter().map(|r| r[f]).collect();
            values.sort_unstable();
            values.dedup();

            let column = rows
                .iter()
                .map(|r| values.binary_search(&r[f]).unwrap_or(0) as u32)
                .collect();

            thresholds.push(values);
            codes.push(column);
        }

        Ok(Self {
            thresholds,
            codes,
            n_samples: rows.len(),
        })
    }

    pub fn n_features(&self) -> usize {
        self.thresholds.len()
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_bins(&self, feature: usize) -> usize {
        self.thresholds[feature].len()
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    bin: usize,
    threshold: i64,
    gain: i128,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain
            || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

#[derive(Clone, Copy, Default)]
struct BinStats {
    gradient: i64,
    hessian: i64,
    count: usize,
}

/// Build a regression tree on gradient statistics
pub struct CartBuilder<'a> {
    config: TreeConfig,
    bins: &'a BinnedFeatures,
    gradients: &'a [i64],
    hessians: &'a [i64],
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        bins: &'a BinnedFeatures,
        gradients: &'a [i64],
        hessians: &'a [i64],
        config: TreeConfig,
    ) -> Result<Self, TrainerError> {
        if gradients.len() != bins.n_samples() || hessians.len() != bins.n_samples() {
            return Err(TrainerError::Training(format!(
                "{} samples but {} gradients and {} hessians",
                bins.n_samples(),
                gradients.len(),
                hessians.len()
            )));
        }

        Ok(Self {
            config,
            bins,
            gradients,
            hessians,
        })
    }

    /// Build a tree over the given samples; `weight` is the shrinkage
    pub fn build(&self, indices: &[usize], weight: i64) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(indices, 0, &mut nodes, 0);
        Tree::new(nodes, weight)
    }

    /// Recursively build nodes in pre-order; returns the node's index
    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        node_id: usize,
    ) -> i32 {
        let current_idx = nodes.len() as i32;
        let (sum_g, sum_h) = self.sum_gradients_hessians(indices);

        let split = if depth >= self.config.max_depth
            || indices.len() < 2 * self.config.min_samples_leaf
        {
            None
        } else {
            self.find_best_split(indices, sum_g, sum_h, node_id)
        };

        let Some(split) = split else {
            nodes.push(Node::leaf(current_idx, self.leaf_value(sum_g, sum_h)));
            return current_idx;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| (self.bins.codes[split.feature_idx][i] as usize) <= split.bin);

        // Reserve the slot; children are patched in once built
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        ));

        let left = self.build_node(&left_indices, depth + 1, nodes, node_id * 2 + 1);
        let right = self.build_node(&right_indices, depth + 1, nodes, node_id * 2 + 2);

        let node = &mut nodes[current_idx as usize];
        node.left = left;
        node.right = right;

        current_idx
    }

    /// Best positive-gain split over all features, scanning bin histograms
    fn find_best_split(
        &self,
        indices: &[usize],
        sum_g: i64,
        sum_h: i64,
        node_id: usize,
    ) -> Option<SplitCandidate> {
        let parent_score = self.score(sum_g, sum_h);
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in 0..self.bins.n_features() {
            let n_bins = self.bins.n_bins(feature_idx);
            if n_bins < 2 {
                continue;
            }

            let mut histogram = vec![BinStats::default(); n_bins];
            let codes = &self.bins.codes[feature_idx];
            for &i in indices {
                let stats = &mut histogram[codes[i] as usize];
                stats.gradient += self.gradients[i];
                stats.hessian += self.hessians[i];
                stats.count += 1;
            }

            let mut left = BinStats::default();
            for (bin, stats) in histogram.iter().enumerate().take(n_bins - 1) {
                left.gradient += stats.gradient;
                left.hessian += stats.hessian;
                left.count += stats.count;

                let right_count = indices.len() - left.count;
                let right_g = sum_g - left.gradient;
                let right_h = sum_h - left.hessian;

                if left.count < self.config.min_samples_leaf
                    || right_count < self.config.min_samples_leaf
                    || left.hessian < self.config.min_child_weight
                    || right_h < self.config.min_child_weight
                {
                    continue;
                }

                let gain = self.score(left.gradient, left.hessian)
                    + self.score(right_g, right_h)
                    - parent_score;
                if gain <= 0 {
                    continue;
                }

                let threshold = self.bins.thresholds[feature_idx][bin];
                let candidate = SplitCandidate {
                    feature_idx,
                    bin,
                    threshold,
                    gain,
                    tie_breaker: SplitTieBreaker::new(feature_idx, threshold, node_id),
                };

                if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Structure score G² / (H + λ), in i128 to avoid overflow
    fn score(&self, g: i64, h: i64) -> i128 {
        let denom = h as i128 + self.config.lambda as i128;
        if denom <= 0 {
            return 0;
        }
        (g as i128 * g as i128) / denom
    }

    /// Sum gradients and hessians for a set of samples
    fn sum_gradients_hessians(&self, indices: &[usize]) -> (i64, i64) {
        indices.iter().fold((0i64, 0i64), |(g, h), &i| {
            (
                g.saturating_add(self.gradients[i]),
                h.saturating_add(self.hessians[i]),
            )
        })
    }

    /// Optimal leaf value -G / (H + λ), fixed-point
    fn leaf_value(&self, sum_g: i64, sum_h: i64) -> i64 {
        let denom = sum_h as i128 + self.config.lambda as i128;
        if denom <= 0 {
            return 0;
        }
        let value = -(sum_g as i128 * SCALE as i128) / denom;
        value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}
