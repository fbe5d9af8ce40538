//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Log-loss boosting with fixed-point trees. Gradient statistics are taken
//! from the logistic of the running margin and converted to fixed-point
//! before split search, so split selection is pure integer arithmetic.

use chrono::Utc;
use flightdelay_core::{
    logistic, preprocess_training, ArtifactMetadata, Classifier, DelayArtifact, FlightRecord,
    Model, Tree, SCALE,
};
use tracing::{debug, info, instrument};

use crate::cart::{BinnedFeatures, CartBuilder, TreeConfig};
use crate::deterministic::train_test_split;
use crate::errors::TrainerError;
use crate::metrics::ClassificationReport;

/// Clamp for the positive rate when deriving the initial log-odds
const MIN_RATE: f64 = 1e-6;

/// Default seed for the train/test split
pub const DEFAULT_SEED: u64 = 42;

/// Default held-out share, in percent
pub const DEFAULT_TEST_PERCENT: usize = 33;

/// GBDT training configuration
#[derive(Clone, Debug)]
pub struct GbdtConfig {
    pub num_rounds: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fixed-point, e.g. 10_000 = 0.01
    pub learning_rate: i64,
    /// Minimum child hessian sum (fixed-point)
    pub min_child_weight: i64,
    /// L2 regularisation (fixed-point)
    pub lambda: i64,
}

impl Default for GbdtConfig {
    fn default() -> Self {
        Self {
            num_rounds: 200,
            max_depth: 4,
            min_samples_leaf: 1,
            learning_rate: 10_000, // 0.01 in fixed-point
            min_child_weight: SCALE,
            lambda: SCALE,
        }
    }
}

impl GbdtConfig {
    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            min_child_weight: self.min_child_weight,
            lambda: self.lambda,
        }
    }
}

/// GBDT trainer
pub struct GbdtTrainer {
    config: GbdtConfig,
}

impl GbdtTrainer {
    pub fn new(config: GbdtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GbdtConfig {
        &self.config
    }

    /// Train a binary classifier on `width`-wide integer rows
    pub fn train(&self, rows: &[Vec<i64>], labels: &[u8], width: usize) -> Result<Model, TrainerError> {
        if rows.is_empty() {
            return Err(TrainerError::Training("no training rows".into()));
        }
        if rows.len() != labels.len() {
            return Err(TrainerError::Training(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let bins = BinnedFeatures::from_rows(rows, width)?;
        let indices: Vec<usize> = (0..rows.len()).collect();
        let tree_config = self.config.tree_config();

        let bias = Self::initial_bias(labels);
        let mut margins = vec![bias; rows.len()];
        let mut trees = Vec::with_capacity(self.config.num_rounds);

        for round in 0..self.config.num_rounds {
            let (gradients, hessians) = Self::gradients_hessians(labels, &margins);

            let builder = CartBuilder::new(&bins, &gradients, &hessians, tree_config.clone())?;
            let tree = builder.build(&indices, self.config.learning_rate);

            self.update_margins(&tree, rows, &mut margins);

            if (round + 1) % 50 == 0 || round + 1 == self.config.num_rounds {
                info!(
                    round = round + 1,
                    rounds = self.config.num_rounds,
                    logloss = log_loss(labels, margins.iter().map(|&m| logistic(m, SCALE))),
                    "boosting progress"
                );
            } else {
                debug!(round = round + 1, nodes = tree.nodes.len(), "tree built");
            }

            trees.push(tree);
        }

        let model = Model::new(trees, bias);
        model
            .validate()
            .map_err(|e| TrainerError::Training(e.to_string()))?;
        Ok(model)
    }

    /// Log-odds of the positive rate, fixed-point
    fn initial_bias(labels: &[u8]) -> i64 {
        let positives = labels.iter().filter(|&&l| l == 1).count();
        let rate = (positives as f64 / labels.len() as f64).clamp(MIN_RATE, 1.0 - MIN_RATE);
        to_fixed((rate / (1.0 - rate)).ln())
    }

    /// Log-loss gradient `p - y` and hessian `p (1 - p)`, fixed-point
    fn gradients_hessians(labels: &[u8], margins: &[i64]) -> (Vec<i64>, Vec<i64>) {
        labels
            .iter()
            .zip(margins)
            .map(|(&y, &m)| {
                let p = logistic(m, SCALE);
                (to_fixed(p - f64::from(y)), to_fixed(p * (1.0 - p)))
            })
            .unzip()
    }

    /// Add each tree's shrunken output with the same arithmetic as `Model::score`
    fn update_margins(&self, tree: &Tree, rows: &[Vec<i64>], margins: &mut [i64]) {
        for (margin, row) in margins.iter_mut().zip(rows) {
            let leaf = tree.evaluate(row) as i128;
            let step = (leaf * tree.weight as i128) / SCALE as i128;
            *margin = margin.saturating_add(step as i64);
        }
    }
}

/// Mean binary cross-entropy of predicted probabilities against labels
pub fn log_loss<I>(labels: &[u8], probabilities: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let total: f64 = labels
        .iter()
        .zip(probabilities)
        .map(|(&y, p)| {
            let p = p.clamp(MIN_RATE, 1.0 - MIN_RATE);
            if y == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    total / labels.len().max(1) as f64
}

fn to_fixed(value: f64) -> i64 {
    (value * SCALE as f64).round() as i64
}

/// Result of a full training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: DelayArtifact,
    pub report: ClassificationReport,
}

/// End-to-end trainer: preprocess, split, boost, evaluate, package
pub struct DelayTrainer {
    config: GbdtConfig,
    seed: u64,
    test_percent: usize,
}

impl Default for DelayTrainer {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl DelayTrainer {
    pub fn new(seed: u64) -> Self {
        Self {
            config: GbdtConfig::default(),
            seed,
            test_percent: DEFAULT_TEST_PERCENT,
        }
    }

    pub fn with_config(mut self, config: GbdtConfig) -> Self {
        self.config = config;
        self
    }

    #[instrument(skip(self, records), fields(rows = records.len(), seed = self.seed))]
    pub fn train(&self, records: &[FlightRecord]) -> Result<TrainingOutcome, TrainerError> {
        let set = preprocess_training(records)?;
        let split = train_test_split(set.len(), self.test_percent, self.seed);
        if split.train.is_empty() {
            return Err(TrainerError::Training(format!(
                "{} rows leave no training partition",
                set.len()
            )));
        }

        let train = set.matrix.select_rows(&split.train);
        let test = set.matrix.select_rows(&split.test);
        let train_labels: Vec<u8> = split.train.iter().map(|&i| set.labels[i]).collect();
        let test_labels: Vec<u8> = split.test.iter().map(|&i| set.labels[i]).collect();

        info!(
            train_rows = train.n_rows(),
            test_rows = test.n_rows(),
            features = set.schema.width(),
            positive_rate = set.positive_rate(),
            "split dataset"
        );

        let model = GbdtTrainer::new(self.config.clone()).train(
            &train.rows,
            &train_labels,
            set.schema.width(),
        )?;

        let predicted = model
            .predict(&test)
            .map_err(|e| TrainerError::Training(e.to_string()))?;
        let report = ClassificationReport::evaluate(&test_labels, &predicted);
        let probabilities = test.rows.iter().map(|r| model.probability(r));
        let held_out_loss = log_loss(&test_labels, probabilities);
        info!(
            accuracy = report.accuracy,
            log_loss = held_out_loss,
            "held-out evaluation\n{}",
            report
        );

        let mut metrics = report.to_metric_map();
        metrics.insert("log_loss".to_string(), held_out_loss);

        let metadata = ArtifactMetadata {
            created_at: Utc::now().timestamp(),
            crate_version: crate::VERSION.to_string(),
            train_rows: train.n_rows(),
            test_rows: test.n_rows(),
            seed: self.seed,
            metrics,
            ..ArtifactMetadata::default()
        };

        let artifact = DelayArtifact::new(model, set.schema, metadata)?;
        Ok(TrainingOutcome { artifact, report })
    }
}
