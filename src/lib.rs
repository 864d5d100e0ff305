//! Tag classification for the StackSample question dataset
//!
//! Loads the answers, questions and tags files, joins them into tagged text
//! rows and trains a one-vs-rest linear SVM on TF-IDF features.

pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod metrics;
pub mod optimizer;
pub mod sampling;
pub mod solver;
pub mod text;
pub mod training;

// Re-export main types for convenience
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::error::*;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::{
    combine_and_format, label_counts, load_all, CombinedRecord, FormatConfig, LoaderConfig,
};
pub use crate::kernel::{Kernel, LinearKernel};
pub use crate::metrics::ClassificationReport;
pub use crate::optimizer::{LinearSVM, OneVsRestSVM, SVMOptimizer};
pub use crate::solver::{Solver, SolverKind};
pub use crate::text::TfidfVectorizer;
pub use crate::training::{train_model, TrainConfig, TrainingReport};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
