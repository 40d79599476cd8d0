//! Per-language `LanguageExtractor` adapters (§4.3).

mod common;
mod go;
mod javascript;
mod python;
mod rust_lang;
mod typescript;

pub use go::GoExtractor;
pub use javascript::JavaScriptExtractor;
pub use python::PythonExtractor;
pub use rust_lang::RustExtractor;
pub use typescript::TypeScriptExtractor;
