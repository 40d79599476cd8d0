//! # Application Layer
//!
//! Use cases and orchestration logic coordinating domain and connector layers. Ports
//! (`interfaces`) are implemented by adapters in the connector layer and wired up in
//! `main.rs`; this layer never references `connector` directly.

pub mod interfaces;
pub mod module_registry;
pub mod snapshot_io;
pub mod text;
pub mod use_cases;

pub use module_registry::ModuleRegistry;
pub use text::decode_text;
pub use use_cases::*;
