//! Per-language `RelationshipExtractor` adapters (§4.4).

mod go;
mod python;
mod rust_lang;
mod typescript;

pub use go::GoRelationshipExtractor;
pub use python::PythonRelationshipExtractor;
pub use rust_lang::RustRelationshipExtractor;
pub use typescript::{JavaScriptRelationshipExtractor, TypeScriptRelationshipExtractor};
