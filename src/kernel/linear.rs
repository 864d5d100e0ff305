//! Linear kernel implementation

use crate::core::SparseVector;
use crate::kernel::Kernel;

/// Linear kernel: K(x, y) = x^T * y
///
/// TF-IDF rows are high-dimensional and sparse, so the dot product walks
/// both sorted index lists once instead of densifying.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        sparse_dot(x, y)
    }

    fn diagonal(&self, x: &SparseVector) -> f64 {
        x.norm_squared()
    }
}

/// Merge-style dot product of two sorted sparse vectors
pub fn sparse_dot(x: &SparseVector, y: &SparseVector) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut result = 0.0;

    while i < x.indices.len() && j < y.indices.len() {
        match x.indices[i].cmp(&y.indices[j]) {
            std::cmp::Ordering::Equal => {
                result += x.values[i] * y.values[j];
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }

    result
}
