//! Kernel trait definition

use crate::core::SparseVector;

/// Kernel function K(x, y) over sparse feature vectors
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64;

    /// K(x, x); kernels with a cheaper closed form override this
    fn diagonal(&self, x: &SparseVector) -> f64 {
        self.compute(x, x)
    }
}
