//! Dataset loading and preparation
//!
//! The loader reads the answers, questions and tags files of a Stack
//! Exchange export; the combiner joins them into one tagged text table.

pub mod combine;
pub mod loader;
pub mod records;

pub use self::combine::*;
pub use self::loader::*;
pub use self::records::*;
