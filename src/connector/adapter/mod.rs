//! The teacher's other adapters (vector repositories, rerankers, the LLM-backed query
//! expander, SCIP import/export, the MCP server) had no counterpart in this spec and were
//! removed in the final trim pass (see DESIGN.md). `parser_cache` is the one adapter this
//! crate's extractors actually depend on.

mod parser_cache;

pub use parser_cache::*;
