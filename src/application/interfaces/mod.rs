mod embedding_sink;
mod language_extractor;
mod relationship_extractor;
mod store;

pub use embedding_sink::*;
pub use language_extractor::*;
pub use relationship_extractor::*;
pub use store::*;
