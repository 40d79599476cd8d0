use std::collections::HashMap;
use std::sync::Mutex;

use tree_sitter::Parser;
use tracing::warn;

use crate::domain::Language;

fn grammar_for(language: Language) -> Option<tree_sitter::Language> {
    match language {
        Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
        Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
        Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
        Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
        Language::Unknown => None,
    }
}

/// Memoized grammar cache (§4.2). `tree_sitter::Parser` carries mutable internal
/// state and isn't meant to be shared across concurrent callers, so what's actually
/// memoized here is the `tree_sitter::Language` handle (cheap, `Copy`-like, safe to
/// hand out repeatedly); `get_parser` builds a fresh `Parser` around it on each call.
/// Grounded on the teacher's `TreeSitterParser::get_ts_language` match table, trimmed
/// to this crate's five supported languages.
pub struct ParserCache {
    grammars: Mutex<HashMap<Language, Option<tree_sitter::Language>>>,
}

impl ParserCache {
    pub fn new() -> Self {
        Self {
            grammars: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a ready-to-use parser for `language`, or `None` if the grammar is
    /// unknown or failed to load — the caller records the file as unsupported.
    pub fn get_parser(&self, language: Language) -> Option<Parser> {
        let grammar = {
            let mut grammars = self.grammars.lock().expect("parser cache mutex poisoned");
            grammars
                .entry(language)
                .or_insert_with(|| grammar_for(language))
                .clone()
        }?;

        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&grammar) {
            warn!("Failed to set tree-sitter language for {}: {}", language, e);
            return None;
        }
        Some(parser)
    }
}

impl Default for ParserCache {
    fn default() -> Self {
        Self::new()
    }
}
