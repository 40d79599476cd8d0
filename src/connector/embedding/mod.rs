//! Embedding sink adapters (§4.8).

mod mock_sink;

pub use mock_sink::MockEmbeddingSink;
