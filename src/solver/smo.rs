//! Sequential Minimal Optimization (SMO) solver
//!
//! Platt's SMO for the binary SVM dual: repeatedly pick a pair of Lagrange
//! multipliers violating the KKT conditions and optimize them analytically.
//! The squared hinge loss is handled by adding `1 / (2C)` to the kernel
//! diagonal and lifting the upper bound on alpha.

use crate::cache::KernelCache;
use crate::core::{Loss, OptimizationResult, OptimizerConfig, Result, Sample};
use crate::kernel::Kernel;
use crate::solver::{ensure_finite, support_indices, validate_problem, Solver};
use log::debug;
use std::sync::Arc;

/// SMO solver for SVM optimization
pub struct SMOSolver<K: Kernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
}

/// Mutable optimization state for one `solve` call
struct SmoState {
    alpha: Vec<f64>,
    /// E_i = f(x_i) - y_i, where f(x) = sum_j alpha_j y_j K(x_j, x) - threshold
    errors: Vec<f64>,
    threshold: f64,
    cache: KernelCache,
}

impl<K: Kernel> SMOSolver<K> {
    /// Create a new SMO solver with the given kernel and configuration
    pub fn new(kernel: Arc<K>, config: OptimizerConfig) -> Self {
        Self { kernel, config }
    }

    fn upper_bound(&self) -> f64 {
        match self.config.loss {
            Loss::Hinge => self.config.c,
            Loss::SquaredHinge => f64::INFINITY,
        }
    }

    fn diagonal_shift(&self) -> f64 {
        match self.config.loss {
            Loss::Hinge => 0.0,
            Loss::SquaredHinge => 0.5 / self.config.c,
        }
    }

    /// Kernel value with the loss-dependent diagonal shift applied
    fn q(&self, state: &mut SmoState, samples: &[Sample], i: usize, j: usize) -> f64 {
        let kernel = &self.kernel;
        let value = state.cache.get_or_compute(i, j, || {
            if i == j {
                kernel.diagonal(&samples[i].features)
            } else {
                kernel.compute(&samples[i].features, &samples[j].features)
            }
        });
        if i == j {
            value + self.diagonal_shift()
        } else {
            value
        }
    }

    fn is_free(&self, alpha: f64) -> bool {
        alpha > 0.0 && alpha < self.upper_bound()
    }

    /// Examine one multiplier and try to make progress with a partner
    fn examine_example(&self, i2: usize, samples: &[Sample], state: &mut SmoState) -> bool {
        let y2 = samples[i2].label;
        let alpha2 = state.alpha[i2];
        let r2 = state.errors[i2] * y2;
        let tol = self.config.epsilon;

        let violates = (r2 < -tol && alpha2 < self.upper_bound()) || (r2 > tol && alpha2 > 0.0);
        if !violates {
            return false;
        }

        // Second-choice heuristic: maximize |E1 - E2| over free multipliers
        let e2 = state.errors[i2];
        let best = (0..samples.len())
            .filter(|&i| i != i2 && self.is_free(state.alpha[i]))
            .max_by(|&a, &b| {
                let da = (state.errors[a] - e2).abs();
                let db = (state.errors[b] - e2).abs();
                da.total_cmp(&db)
            });
        if let Some(i1) = best {
            if self.take_step(i1, i2, samples, state) {
                return true;
            }
        }

        // Fall back to free multipliers, then to everything, starting after i2
        let n = samples.len();
        let order: Vec<usize> = (1..n).map(|offset| (i2 + offset) % n).collect();
        for &i1 in &order {
            if self.is_free(state.alpha[i1]) && self.take_step(i1, i2, samples, state) {
                return true;
            }
        }
        for &i1 in &order {
            if self.take_step(i1, i2, samples, state) {
                return true;
            }
        }

        false
    }

    /// Jointly optimize alpha[i1] and alpha[i2]
    fn take_step(&self, i1: usize, i2: usize, samples: &[Sample], state: &mut SmoState) -> bool {
        if i1 == i2 {
            return false;
        }

        let upper = self.upper_bound();
        let (y1, y2) = (samples[i1].label, samples[i2].label);
        let (alpha1, alpha2) = (state.alpha[i1], state.alpha[i2]);
        let (e1, e2) = (state.errors[i1], state.errors[i2]);
        let s = y1 * y2;

        let (low, high) = if y1 != y2 {
            ((alpha2 - alpha1).max(0.0), upper.min(upper + alpha2 - alpha1))
        } else {
            ((alpha1 + alpha2 - upper).max(0.0), upper.min(alpha1 + alpha2))
        };
        if low >= high {
            return false;
        }

        let k11 = self.q(state, samples, i1, i1);
        let k12 = self.q(state, samples, i1, i2);
        let k22 = self.q(state, samples, i2, i2);
        let eta = k11 + k22 - 2.0 * k12;
        if eta <= 0.0 {
            // Degenerate pair (duplicate points); skip it
            return false;
        }

        let a2 = (alpha2 + y2 * (e1 - e2) / eta).clamp(low, high);
        let eps = self.config.epsilon;
        if (a2 - alpha2).abs() < eps * (a2 + alpha2 + eps) {
            return false;
        }
        let a1 = alpha1 + s * (alpha2 - a2);

        let delta1 = y1 * (a1 - alpha1);
        let delta2 = y2 * (a2 - alpha2);
        let b1 = e1 + delta1 * k11 + delta2 * k12 + state.threshold;
        let b2 = e2 + delta1 * k12 + delta2 * k22 + state.threshold;
        let new_threshold = if self.is_free(a1) {
            b1
        } else if self.is_free(a2) {
            b2
        } else {
            (b1 + b2) / 2.0
        };
        let delta_threshold = new_threshold - state.threshold;

        state.alpha[i1] = a1;
        state.alpha[i2] = a2;
        state.threshold = new_threshold;

        for k in 0..samples.len() {
            let q1k = self.q(state, samples, i1, k);
            let q2k = self.q(state, samples, i2, k);
            state.errors[k] += delta1 * q1k + delta2 * q2k - delta_threshold;
        }

        true
    }

    /// Dual objective: sum(alpha) - 1/2 alpha^T Q alpha
    fn objective(&self, samples: &[Sample], state: &mut SmoState) -> f64 {
        let support = support_indices(&state.alpha);
        let mut obj: f64 = support.iter().map(|&i| state.alpha[i]).sum();
        for &i in &support {
            for &j in &support {
                let qij = self.q(state, samples, i, j);
                obj -= 0.5
                    * state.alpha[i]
                    * state.alpha[j]
                    * samples[i].label
                    * samples[j].label
                    * qij;
            }
        }
        obj
    }
}

impl<K: Kernel> Solver for SMOSolver<K> {
    fn solve(&self, samples: &[Sample]) -> Result<OptimizationResult> {
        validate_problem(samples, &self.config)?;

        let n = samples.len();
        let mut state = SmoState {
            alpha: vec![0.0; n],
            errors: samples.iter().map(|s| -s.label).collect(),
            threshold: 0.0,
            cache: KernelCache::with_memory_limit(self.config.cache_size),
        };

        let mut iterations = 0;
        let mut examine_all = true;
        let mut num_changed = 0;

        while (num_changed > 0 || examine_all) && iterations < self.config.max_iterations {
            num_changed = 0;
            for i in 0..n {
                if (examine_all || self.is_free(state.alpha[i]))
                    && self.examine_example(i, samples, &mut state)
                {
                    num_changed += 1;
                }
            }

            if examine_all {
                examine_all = false;
            } else if num_changed == 0 {
                examine_all = true;
            }
            iterations += 1;
        }

        let stats = state.cache.stats();
        debug!(
            "SMO finished after {iterations} passes, kernel cache hit rate {:.2} ({} entries)",
            state.cache.hit_rate(),
            stats.size
        );

        let objective_value = self.objective(samples, &mut state);
        ensure_finite(OptimizationResult {
            support_vectors: support_indices(&state.alpha),
            b: -state.threshold,
            alpha: state.alpha,
            iterations,
            objective_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SparseVector, StackSampleError};
    use crate::kernel::LinearKernel;

    fn solver(config: OptimizerConfig) -> SMOSolver<LinearKernel> {
        SMOSolver::new(Arc::new(LinearKernel::new()), config)
    }

    fn hinge() -> OptimizerConfig {
        OptimizerConfig {
            loss: Loss::Hinge,
            epsilon: 1e-3,
            ..OptimizerConfig::default()
        }
    }

    fn decision(samples: &[Sample], result: &OptimizationResult, x: &SparseVector) -> f64 {
        let kernel = LinearKernel::new();
        samples
            .iter()
            .zip(&result.alpha)
            .map(|(s, &a)| a * s.label * kernel.compute(&s.features, x))
            .sum::<f64>()
            + result.b
    }

    #[test]
    fn test_smo_empty_dataset() {
        let result = solver(hinge()).solve(&[]);
        assert!(matches!(result, Err(StackSampleError::EmptyDataset)));
    }

    #[test]
    fn test_smo_invalid_labels() {
        let samples = vec![Sample::new(SparseVector::new(vec![0], vec![1.0]), 0.5)];
        let result = solver(hinge()).solve(&samples);
        assert!(matches!(result, Err(StackSampleError::InvalidLabel(l)) if l == 0.5));
    }

    #[test]
    fn test_smo_symmetric_pair_margin() {
        // Points at +/-1: the max-margin solution is w = 1, b = 0, alpha = 0.5
        let samples = vec![
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-1.0]), -1.0),
        ];
        let result = solver(hinge()).solve(&samples).expect("Should solve");

        assert_eq!(result.support_vectors, vec![0, 1]);
        approx::assert_abs_diff_eq!(result.alpha[0], 0.5, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(result.alpha[1], 0.5, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(result.b, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_smo_separates_training_data() {
        let samples = vec![
            Sample::new(SparseVector::new(vec![0, 1], vec![2.0, 1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0, 1], vec![1.8, 0.9]), 1.0),
            Sample::new(SparseVector::new(vec![0, 1], vec![1.5, 1.2]), 1.0),
            Sample::new(SparseVector::new(vec![0, 1], vec![-2.0, -1.0]), -1.0),
            Sample::new(SparseVector::new(vec![0, 1], vec![-1.7, -1.1]), -1.0),
            Sample::new(SparseVector::new(vec![0, 1], vec![-1.4, -0.8]), -1.0),
        ];
        let result = solver(hinge()).solve(&samples).expect("Should solve");

        for sample in &samples {
            let f = decision(&samples, &result, &sample.features);
            assert_eq!(f.signum(), sample.label, "decision {f} for {sample:?}");
        }
        // Equality constraint of the dual
        let balance: f64 = samples
            .iter()
            .zip(&result.alpha)
            .map(|(s, &a)| a * s.label)
            .sum();
        approx::assert_abs_diff_eq!(balance, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_smo_respects_box_constraint() {
        let config = OptimizerConfig {
            c: 0.01,
            ..hinge()
        };
        let samples = vec![
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-1.0]), -1.0),
            Sample::new(SparseVector::new(vec![0], vec![0.2]), -1.0),
        ];
        let result = solver(config).solve(&samples).expect("Should solve");
        assert!(result.alpha.iter().all(|&a| (-1e-12..=0.01 + 1e-12).contains(&a)));
    }

    #[test]
    fn test_smo_squared_hinge_separates() {
        let samples = vec![
            Sample::new(SparseVector::new(vec![0], vec![2.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-1.0]), -1.0),
            Sample::new(SparseVector::new(vec![0], vec![-2.0]), -1.0),
        ];
        let config = OptimizerConfig {
            epsilon: 1e-3,
            ..OptimizerConfig::default()
        };
        let result = solver(config).solve(&samples).expect("Should solve");
        for sample in &samples {
            let f = decision(&samples, &result, &sample.features);
            assert_eq!(f.signum(), sample.label);
        }
        assert!(result.objective_value > 0.0);
    }

    #[test]
    fn test_smo_max_iterations() {
        let config = OptimizerConfig {
            max_iterations: 1,
            ..hinge()
        };
        let samples = vec![
            Sample::new(SparseVector::new(vec![0, 1], vec![1.0, 1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0, 1], vec![-1.0, -1.0]), -1.0),
            Sample::new(SparseVector::new(vec![0, 1], vec![1.0, -1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0, 1], vec![-1.0, 1.0]), -1.0),
        ];
        let result = solver(config).solve(&samples).expect("Should solve");
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_smo_identical_points_different_labels() {
        let samples = vec![
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![1.0]), -1.0),
            Sample::new(SparseVector::new(vec![0], vec![2.0]), 1.0),
        ];
        let result = solver(hinge()).solve(&samples).expect("Should solve");
        assert_eq!(result.alpha.len(), 3);
        assert!(result.b.is_finite());
    }
}
