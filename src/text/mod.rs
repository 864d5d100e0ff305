//! Text cleaning and vectorization

pub mod cleaning;
pub mod tokenizer;
pub mod vectorizer;

pub use self::cleaning::*;
pub use self::tokenizer::*;
pub use self::vectorizer::*;
