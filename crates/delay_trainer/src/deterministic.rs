//! Deterministic utilities for reproducible training
//!
//! LCG-based RNG, seeded permutations for the train/test split, and the
//! split tie-breaker, so the same data and seed always give the same model.

use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses constants from Numerical Recipes (glibc)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<i64>,
}

impl LcgRng {
    const MULTIPLIER: i64 = 1103515245;
    const INCREMENT: i64 = 12345;
    const MODULUS: i64 = 1 << 31;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Wrapping((seed % Self::MODULUS as u64) as i64),
        }
    }

    /// Next value in `[0, MODULUS)`
    pub fn next_i64(&mut self) -> i64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0 & (Self::MODULUS - 1)
    }

    /// Next value in `[0, max)`
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_i64() as u64 % max as u64) as usize
    }
}

/// Fisher-Yates permutation of `0..n` driven by `LcgRng`
pub fn permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = LcgRng::new(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.next_range(i + 1);
        indices.swap(i, j);
    }
    indices
}

/// Row indices of a seeded train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split `0..n` so the test side holds `ceil(n * test_percent / 100)` rows
pub fn train_test_split(n: usize, test_percent: usize, seed: u64) -> SplitIndices {
    let test_len = (n * test_percent).div_ceil(100).min(n);
    let mut order = permutation(n, seed);
    let train = order.split_off(test_len);
    SplitIndices { train, test: order }
}

/// Deterministic tie-breaker for split selection
/// Returns consistent ordering based on (feature_idx, threshold, node_id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: i64,
    pub node_id: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: i64, node_id: usize) -> Self {
        Self {
            feature_idx,
            threshold,
            node_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lcg_determinism() {
        let mut rng1 = LcgRng::new(42);
        let mut rng2 = LcgRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_i64(), rng2.next_i64());
        }
    }

    #[test]
    fn test_lcg_range() {
        let mut rng = LcgRng::new(42);
        for _ in 0..100 {
            assert!(rng.next_range(10) < 10);
        }
        assert_eq!(rng.next_range(0), 0);
    }

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(100, 33, 42);
        assert_eq!(split.test.len(), 33);
        assert_eq!(split.train.len(), 67);

        // ceil(0.33 * 10) = 4
        let split = train_test_split(10, 33, 42);
        assert_eq!(split.test.len(), 4);
        assert_eq!(split.train.len(), 6);
    }

    #[test]
    fn test_split_depends_on_seed() {
        assert_eq!(train_test_split(50, 33, 42), train_test_split(50, 33, 42));
        assert_ne!(permutation(50, 42), permutation(50, 43));
    }

    #[test]
    fn test_tie_breaker_ordering() {
        let t1 = SplitTieBreaker::new(0, 100, 0);
        let t2 = SplitTieBreaker::new(0, 100, 1);
        let t3 = SplitTieBreaker::new(1, 50, 0);

        assert!(t1 < t2);
        assert!(t1 < t3);
    }

    proptest! {
        #[test]
        fn prop_permutation_is_bijection(n in 0usize..300, seed in any::<u64>()) {
            let mut p = permutation(n, seed);
            p.sort_unstable();
            prop_assert_eq!(p, (0..n).collect::<Vec<_>>());
        }
    }
}
