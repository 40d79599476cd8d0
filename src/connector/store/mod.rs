//! DuckDB-backed [`Store`](crate::application::interfaces::Store) implementation (§4.6).

mod duckdb_store;

pub use duckdb_store::DuckdbStore;
