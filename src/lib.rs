//! # codeindexer
//!
//! A multi-language source-code indexer: parses repositories with tree-sitter,
//! extracts a hierarchical code-block model, resolves cross-file import
//! relationships, and persists both to a relational store (for full/incremental
//! indexing) and to an embedding collaborator (treated as an opaque sink).
//!
//! ## Architecture
//!
//! The crate follows the same layering the teacher uses:
//!
//! - `domain`: Core business models and the error type
//! - `application`: Use cases (`IndexProjectUseCase`, `ReconcileProjectUseCase`) and
//!   port interfaces (`Store`, `EmbeddingSink`, `LanguageExtractor`,
//!   `RelationshipExtractor`) — never references `connector` directly
//! - `connector`: Adapters implementing those ports (tree-sitter extractors, DuckDB
//!   store, mock embedding sink)
//! - `config`/`cli`: layered configuration and the CLI surface

pub mod application;
pub mod cli;
pub mod config;
pub mod connector;
pub mod domain;

pub use application::*;
pub use domain::*;
