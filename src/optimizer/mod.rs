//! Linear SVM training on top of the binary solvers
//!
//! [`SVMOptimizer`] turns a solver result into an explicit weight vector
//! ([`LinearSVM`]) and extends binary training to many tags with the
//! one-vs-rest scheme ([`OneVsRestSVM`]).

use crate::core::{
    OptimizationResult, OptimizerConfig, Prediction, Result, SVMModel, Sample, SparseVector,
    StackSampleError,
};
use crate::solver::{Solver, SolverKind};
use log::{debug, info};
use std::collections::BTreeSet;

/// Builds linear SVMs with a configured solver
pub struct SVMOptimizer {
    solver: Box<dyn Solver>,
    config: OptimizerConfig,
}

impl SVMOptimizer {
    /// Create an optimizer using the given solver kind and configuration
    pub fn new(kind: SolverKind, config: OptimizerConfig) -> Self {
        Self {
            solver: kind.build(config.clone()),
            config,
        }
    }

    /// Create an optimizer with the default solver
    pub fn with_config(config: OptimizerConfig) -> Self {
        Self::new(SolverKind::default(), config)
    }

    /// Get the optimizer configuration
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Train a binary model on samples labelled -1 / +1
    pub fn train_binary(&self, samples: &[Sample]) -> Result<LinearSVM> {
        let result = self.solver.solve(samples)?;
        Ok(LinearSVM::from_solution(samples, &result))
    }

    /// Train one binary model per distinct label
    pub fn train_one_vs_rest(
        &self,
        features: &[SparseVector],
        labels: &[String],
    ) -> Result<OneVsRestSVM> {
        if features.len() != labels.len() {
            return Err(StackSampleError::InvalidDataset(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if features.is_empty() {
            return Err(StackSampleError::EmptyDataset);
        }

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if classes.len() < 2 {
            return Err(StackSampleError::InvalidDataset(format!(
                "at least two distinct tags are needed for training, found {}",
                classes.len()
            )));
        }

        info!(
            "Training {} one-vs-rest classifiers on {} samples",
            classes.len(),
            features.len()
        );

        let mut samples: Vec<Sample> = features
            .iter()
            .map(|f| Sample::new(f.clone(), -1.0))
            .collect();
        let mut models = Vec::with_capacity(classes.len());

        for class in &classes {
            for (sample, label) in samples.iter_mut().zip(labels) {
                sample.label = if label == class { 1.0 } else { -1.0 };
            }
            let model = self.train_binary(&samples)?;
            debug!(
                "Class {class:?}: {} support vectors, {} iterations, bias {:.6}",
                model.n_support_vectors(),
                model.iterations(),
                model.bias()
            );
            models.push(model);
        }

        Ok(OneVsRestSVM { classes, models })
    }
}

/// A trained binary linear SVM: f(x) = w^T x + b
#[derive(Debug, Clone)]
pub struct LinearSVM {
    weights: Vec<f64>,
    bias: f64,
    n_support_vectors: usize,
    iterations: usize,
}

impl LinearSVM {
    /// Collapse the dual solution into w = sum(alpha_i * y_i * x_i)
    pub(crate) fn from_solution(samples: &[Sample], result: &OptimizationResult) -> Self {
        let mut weights = Vec::new();
        for &i in &result.support_vectors {
            let sample = &samples[i];
            sample
                .features
                .add_scaled_to(&mut weights, result.alpha[i] * sample.label);
        }

        Self {
            weights,
            bias: result.b,
            n_support_vectors: result.support_vectors.len(),
            iterations: result.iterations,
        }
    }

    /// Get the decision function value for a feature vector
    pub fn decision_function(&self, features: &SparseVector) -> f64 {
        features.dot_dense(&self.weights) + self.bias
    }

    /// Dense weight vector
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Solver iterations used to fit this model
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl SVMModel for LinearSVM {
    fn predict(&self, sample: &Sample) -> Prediction {
        let decision_value = self.decision_function(&sample.features);
        let label = if decision_value >= 0.0 { 1.0 } else { -1.0 };
        Prediction::new(label, decision_value)
    }

    fn n_support_vectors(&self) -> usize {
        self.n_support_vectors
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}

/// Multiclass linear SVM, one binary model per class
#[derive(Debug, Clone)]
pub struct OneVsRestSVM {
    classes: Vec<String>,
    models: Vec<LinearSVM>,
}

impl OneVsRestSVM {
    /// Class labels, sorted
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Binary models, in the same order as [`classes`](Self::classes)
    pub fn models(&self) -> &[LinearSVM] {
        &self.models
    }

    /// Decision value of every class for one feature vector
    pub fn decision_function(&self, features: &SparseVector) -> Vec<f64> {
        self.models
            .iter()
            .map(|m| m.decision_function(features))
            .collect()
    }

    /// The class with the largest decision value; ties go to the first class
    pub fn predict(&self, features: &SparseVector) -> &str {
        let mut best = 0;
        let mut best_value = f64::NEG_INFINITY;
        for (i, model) in self.models.iter().enumerate() {
            let value = model.decision_function(features);
            if value > best_value {
                best = i;
                best_value = value;
            }
        }
        &self.classes[best]
    }

    /// Predict every row
    pub fn predict_batch(&self, features: &[SparseVector]) -> Vec<String> {
        features
            .iter()
            .map(|f| self.predict(f).to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> OptimizerConfig {
        OptimizerConfig {
            seed: Some(3),
            ..OptimizerConfig::default()
        }
    }

    #[test]
    fn test_binary_training_predicts_training_data() {
        let optimizer = SVMOptimizer::with_config(seeded());
        let samples = vec![
            Sample::new(SparseVector::new(vec![0], vec![2.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-2.0]), -1.0),
            Sample::new(SparseVector::new(vec![0], vec![1.5]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-1.5]), -1.0),
        ];

        let model = optimizer.train_binary(&samples).expect("Should train");
        assert!(model.n_support_vectors() > 0);
        for sample in &samples {
            assert_eq!(model.predict(sample).label, sample.label);
        }
        let predictions = model.predict_batch(&samples);
        assert_eq!(predictions.len(), 4);
    }

    #[test]
    fn test_one_vs_rest_three_classes() {
        // One axis per class
        let features = vec![
            SparseVector::new(vec![0], vec![1.0]),
            SparseVector::new(vec![0], vec![0.9]),
            SparseVector::new(vec![1], vec![1.0]),
            SparseVector::new(vec![1], vec![0.8]),
            SparseVector::new(vec![2], vec![1.0]),
            SparseVector::new(vec![2], vec![0.7]),
        ];
        let labels: Vec<String> = ["c#", "c#", "java", "java", "python", "python"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        for kind in [SolverKind::DualCoordinateDescent, SolverKind::Smo] {
            let model = SVMOptimizer::new(kind, seeded())
                .train_one_vs_rest(&features, &labels)
                .expect("Should train");

            assert_eq!(model.classes(), &["c#", "java", "python"]);
            assert_eq!(model.models().len(), 3);
            assert_eq!(model.predict_batch(&features), labels, "{kind:?}");
            assert_eq!(model.predict(&SparseVector::new(vec![1], vec![0.5])), "java");
        }
    }

    #[test]
    fn test_one_vs_rest_needs_two_classes() {
        let features = vec![SparseVector::new(vec![0], vec![1.0]); 3];
        let labels = vec!["python".to_string(); 3];
        let result = SVMOptimizer::with_config(seeded()).train_one_vs_rest(&features, &labels);
        assert!(matches!(result, Err(StackSampleError::InvalidDataset(_))));
    }

    #[test]
    fn test_one_vs_rest_length_mismatch() {
        let features = vec![SparseVector::empty()];
        let labels = vec!["a".to_string(), "b".to_string()];
        let result = SVMOptimizer::with_config(seeded()).train_one_vs_rest(&features, &labels);
        assert!(matches!(result, Err(StackSampleError::InvalidDataset(_))));
    }

    #[test]
    fn test_empty_decision_ties_go_to_first_class() {
        let model = OneVsRestSVM {
            classes: vec!["a".into(), "b".into()],
            models: vec![
                LinearSVM {
                    weights: vec![],
                    bias: 0.0,
                    n_support_vectors: 0,
                    iterations: 0,
                },
                LinearSVM {
                    weights: vec![],
                    bias: 0.0,
                    n_support_vectors: 0,
                    iterations: 0,
                },
            ],
        };
        assert_eq!(model.predict(&SparseVector::empty()), "a");
        assert_eq!(model.decision_function(&SparseVector::empty()), vec![0.0, 0.0]);
    }
}
