//! # Connector Layer
//!
//! External integrations implementing domain interfaces:
//! - Parsing (Tree-sitter parser cache + per-language block/relationship extractors)
//! - Storage (DuckDB)
//! - Embedding (mock sink; the real embedding model is an opaque collaborator, §4.8)

pub mod adapter;
pub mod embedding;
pub mod extractors;
pub mod relationships;
pub mod store;

pub use embedding::*;
pub use extractors::*;
pub use relationships::*;
pub use store::*;
