//! The train command pipeline: split, balance, vectorize, fit, evaluate

use crate::core::{Loss, OptimizerConfig, Result, StackSampleError};
use crate::data::{label_counts, CombinedRecord};
use crate::metrics::ClassificationReport;
use crate::optimizer::SVMOptimizer;
use crate::sampling::{seeded_rng, train_test_split, OverSampler, RandomOverSampler};
use crate::solver::SolverKind;
use crate::text::TfidfVectorizer;
use log::{debug, info, warn};

/// Training configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    /// Share of rows held out for evaluation, in (0, 1)
    pub test_size: f64,
    pub random_state: Option<u64>,
    /// Oversample minority tags in the train partition
    pub balance_train_dataset: bool,
    /// SVM regularization parameter
    pub c_value: f64,
    /// Split each tag separately
    pub stratify: bool,
    pub solver: SolverKind,
    pub loss: Loss,
    pub max_iterations: usize,
    pub epsilon: f64,
    pub min_df: usize,
    pub max_df: f64,
    pub max_features: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: None,
            balance_train_dataset: false,
            c_value: 1.0,
            stratify: false,
            solver: SolverKind::default(),
            loss: Loss::SquaredHinge,
            max_iterations: 1000,
            epsilon: 1e-4,
            min_df: 1,
            max_df: 1.0,
            max_features: None,
        }
    }
}

impl TrainConfig {
    fn validate(&self) -> Result<()> {
        if !(self.c_value > 0.0) {
            return Err(StackSampleError::InvalidParameter(format!(
                "C must be positive, got: {}",
                self.c_value
            )));
        }
        Ok(())
    }

    fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            c: self.c_value,
            epsilon: self.epsilon,
            max_iterations: self.max_iterations,
            loss: self.loss,
            seed: self.random_state,
            ..OptimizerConfig::default()
        }
    }
}

/// Outcome of one training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub train_size: usize,
    pub test_size: usize,
    /// Train rows after oversampling; equals `train_size` without balancing
    pub balanced_train_size: usize,
    pub vocabulary_size: usize,
    /// Tags the model was trained on, sorted
    pub classes: Vec<String>,
    pub report: ClassificationReport,
}

/// Train and evaluate a tag classifier with random oversampling
pub fn train_model(records: &[CombinedRecord], config: &TrainConfig) -> Result<TrainingReport> {
    train_model_with_sampler(records, config, &RandomOverSampler)
}

/// Train and evaluate a tag classifier with the given oversampling strategy
///
/// The sampler only runs when `balance_train_dataset` is set, and only
/// ever sees the train partition.
pub fn train_model_with_sampler(
    records: &[CombinedRecord],
    config: &TrainConfig,
    sampler: &dyn OverSampler,
) -> Result<TrainingReport> {
    config.validate()?;
    if records.is_empty() {
        return Err(StackSampleError::EmptyDataset);
    }

    let mut rng = seeded_rng(config.random_state);
    let split = train_test_split(records, config.test_size, config.stratify, &mut rng)?;
    let (train_size, test_size) = (split.train.len(), split.test.len());
    info!("Split {} rows into {train_size} train and {test_size} test", records.len());

    let test_tags = label_counts(&split.test);
    for tag in label_counts(&split.train).keys() {
        if !test_tags.contains_key(tag) {
            warn!("Tag {tag:?} has no rows in the test partition");
        }
    }

    let train = if config.balance_train_dataset {
        let balanced = sampler.resample(split.train, &mut rng);
        info!("Balanced train partition to {} rows", balanced.len());
        balanced
    } else {
        split.train
    };
    let balanced_train_size = train.len();

    let train_text: Vec<&str> = train.iter().map(|r| r.text.as_str()).collect();
    let train_tags: Vec<String> = train.iter().map(|r| r.tag.clone()).collect();

    let mut vectorizer = TfidfVectorizer::new()
        .with_min_df(config.min_df)
        .with_max_df(config.max_df)
        .with_max_features(config.max_features);
    let train_features = vectorizer.fit_transform(&train_text)?;
    info!("Vocabulary has {} terms", vectorizer.vocabulary_size());

    let optimizer = SVMOptimizer::new(config.solver, config.optimizer_config());
    let model = optimizer.train_one_vs_rest(&train_features, &train_tags)?;

    let test_text: Vec<&str> = split.test.iter().map(|r| r.text.as_str()).collect();
    let test_features = vectorizer.transform_batch(&test_text);
    let empty_rows = test_features.iter().filter(|f| f.is_empty()).count();
    if empty_rows > 0 {
        debug!("{empty_rows} test rows share no terms with the vocabulary");
    }

    let predicted = model.predict_batch(&test_features);
    let truth: Vec<String> = split.test.iter().map(|r| r.tag.clone()).collect();
    let report = ClassificationReport::new(&truth, &predicted)?;
    info!("Test accuracy: {:.4}", report.accuracy());

    Ok(TrainingReport {
        train_size,
        test_size,
        balanced_train_size,
        vocabulary_size: vectorizer.vocabulary_size(),
        classes: model.classes().to_vec(),
        report,
    })
}
