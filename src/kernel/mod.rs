//! Kernel functions for the SMO solver

pub mod linear;
pub mod traits;

pub use self::linear::*;
pub use self::traits::*;
