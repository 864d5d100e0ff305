//! Binary linear SVM solvers
//!
//! Two solvers share the [`Solver`] seam:
//! - [`DualCoordinateDescent`]: the liblinear dual coordinate descent method
//!   (Hsieh et al., 2008), linear in the number of non-zeros per epoch.
//! - [`SMOSolver`]: Sequential Minimal Optimization over a [`Kernel`](crate::kernel::Kernel)
//!   with an LRU kernel cache. Quadratic in the sample count.

pub mod dcd;
pub mod smo;

pub use self::dcd::*;
pub use self::smo::*;

use crate::core::{OptimizationResult, OptimizerConfig, Result, Sample, StackSampleError};
use crate::kernel::LinearKernel;
use std::sync::Arc;

/// Alpha values at or below this are treated as zero
pub(crate) const ALPHA_THRESHOLD: f64 = 1e-8;

/// A solver for the binary SVM dual problem
pub trait Solver: Send + Sync {
    /// Solve for labels in {-1, +1}
    fn solve(&self, samples: &[Sample]) -> Result<OptimizationResult>;
}

/// Which solver to use for each one-vs-rest sub-problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverKind {
    #[default]
    DualCoordinateDescent,
    Smo,
}

impl SolverKind {
    /// Build a solver of this kind with the given configuration
    pub fn build(self, config: OptimizerConfig) -> Box<dyn Solver> {
        match self {
            SolverKind::DualCoordinateDescent => Box::new(DualCoordinateDescent::new(config)),
            SolverKind::Smo => Box::new(SMOSolver::new(Arc::new(LinearKernel::new()), config)),
        }
    }
}

/// Checks shared by every solver before optimization starts
pub(crate) fn validate_problem(samples: &[Sample], config: &OptimizerConfig) -> Result<()> {
    if samples.is_empty() {
        return Err(StackSampleError::EmptyDataset);
    }
    if !(config.c > 0.0) {
        return Err(StackSampleError::InvalidParameter(format!(
            "C must be positive, got: {}",
            config.c
        )));
    }
    if !(config.epsilon > 0.0) {
        return Err(StackSampleError::InvalidParameter(format!(
            "epsilon must be positive, got: {}",
            config.epsilon
        )));
    }
    for sample in samples {
        if sample.label != 1.0 && sample.label != -1.0 {
            return Err(StackSampleError::InvalidLabel(sample.label));
        }
    }
    Ok(())
}

/// Reject solutions that diverged to NaN or infinity
pub(crate) fn ensure_finite(result: OptimizationResult) -> Result<OptimizationResult> {
    if result.b.is_finite() && result.alpha.iter().all(|a| a.is_finite()) {
        Ok(result)
    } else {
        Err(StackSampleError::OptimizationError(format!(
            "solution diverged after {} iterations",
            result.iterations
        )))
    }
}

/// Indices whose alpha is non-zero
pub(crate) fn support_indices(alpha: &[f64]) -> Vec<usize> {
    alpha
        .iter()
        .enumerate()
        .filter_map(|(i, &a)| (a > ALPHA_THRESHOLD).then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;

    fn separable() -> Vec<Sample> {
        vec![
            Sample::new(SparseVector::new(vec![0], vec![2.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-2.0]), -1.0),
            Sample::new(SparseVector::new(vec![0], vec![1.5]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-1.5]), -1.0),
        ]
    }

    #[test]
    fn test_every_kind_solves_separable_problem() {
        for kind in [SolverKind::DualCoordinateDescent, SolverKind::Smo] {
            let config = OptimizerConfig {
                seed: Some(7),
                ..OptimizerConfig::default()
            };
            let result = kind.build(config).solve(&separable()).expect("Should solve");
            assert!(!result.support_vectors.is_empty(), "{kind:?}");
        }
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let config = OptimizerConfig::default();
        assert!(matches!(
            validate_problem(&[], &config),
            Err(StackSampleError::EmptyDataset)
        ));

        let bad_label = vec![Sample::new(SparseVector::empty(), 0.5)];
        assert!(matches!(
            validate_problem(&bad_label, &config),
            Err(StackSampleError::InvalidLabel(_))
        ));

        let zero_c = OptimizerConfig {
            c: 0.0,
            ..OptimizerConfig::default()
        };
        assert!(matches!(
            validate_problem(&separable(), &zero_c),
            Err(StackSampleError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_diverged_solution_is_error() {
        let result = OptimizationResult {
            alpha: vec![f64::NAN, 1.0],
            b: 0.0,
            support_vectors: vec![1],
            iterations: 3,
            objective_value: 0.0,
        };
        assert!(matches!(
            ensure_finite(result),
            Err(StackSampleError::OptimizationError(_))
        ));
    }

    #[test]
    fn test_support_indices_threshold() {
        assert_eq!(support_indices(&[0.0, 0.3, 1e-12, 1.0]), vec![1, 3]);
    }
}
