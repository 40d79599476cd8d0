//! # Domain Layer
//!
//! Core business models and the error type. Independent of external frameworks
//! and infrastructure; the application and connector layers depend on this one,
//! never the reverse.

mod error;
pub mod models;

pub use error::DomainError;
pub use models::*;
