use crate::application::interfaces::{ParsedImport, RelationshipExtractor};
use crate::domain::Language;

/// Parses Python import statement text into a [`ParsedImport`] (§4.4), grounded on
/// `original_source/indexer/relationship_extractors/python_extractor.py`'s
/// `_fallback_extract_module_path`/`_resolve_relative_import` string handling —
/// reimplemented without Tree-sitter re-parsing, since the import text is already
/// small and regular enough for direct string splitting.
pub struct PythonRelationshipExtractor;

impl RelationshipExtractor for PythonRelationshipExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn parse_import(&self, import_content: &str) -> Option<ParsedImport> {
        let content = import_content.trim();

        if let Some(rest) = content.strip_prefix("from ") {
            let (module_spec, after) = rest.split_once(" import ")?;
            let symbols = after
                .trim()
                .trim_matches(|c| c == '(' || c == ')')
                .trim_end_matches(';')
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty() && *s != "*")
                .map(|s| s.split_whitespace().last().unwrap_or(s).to_string())
                .collect();
            let (module_path, is_relative) = normalize_module(module_spec.trim());
            return Some(ParsedImport::new(module_path, symbols, is_relative));
        }

        if let Some(rest) = content.strip_prefix("import ") {
            let first = rest.split(',').next()?.trim().trim_end_matches(';');
            let mut parts = first.split_whitespace();
            let module_spec = parts.next()?;
            let symbol = parts.last().unwrap_or(module_spec).to_string();
            let (module_path, is_relative) = normalize_module(module_spec);
            return Some(ParsedImport::new(module_path, vec![symbol], is_relative));
        }

        if content.contains("import_module") || content.contains("__import__") {
            let start = content.find(['\'', '"'])?;
            let quote = content.as_bytes()[start] as char;
            let rest = &content[start + 1..];
            let end = rest.find(quote)?;
            let (module_path, is_relative) = normalize_module(&rest[..end]);
            return Some(ParsedImport::new(module_path, Vec::new(), is_relative));
        }

        None
    }
}

/// Converts Python's dotted module syntax (`..pkg.mod`) into the slash-separated,
/// `./`/`../`-prefixed convention `ModuleRegistry` expects.
fn normalize_module(spec: &str) -> (String, bool) {
    let dot_count = spec.chars().take_while(|&c| c == '.').count();
    let remainder = spec[dot_count..].replace('.', "/");

    if dot_count == 0 {
        return (remainder, false);
    }

    let prefix = if dot_count == 1 { "./".to_string() } else { "../".repeat(dot_count - 1) };
    let path = if remainder.is_empty() { prefix.trim_end_matches('/').to_string() } else { format!("{prefix}{remainder}") };
    (path, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_import() {
        let parsed = PythonRelationshipExtractor.parse_import("import os").unwrap();
        assert_eq!(parsed.module_path, "os");
        assert!(!parsed.is_relative);
    }

    #[test]
    fn test_from_import_multiple_symbols() {
        let parsed = PythonRelationshipExtractor.parse_import("from pkg.mod import a, b as c").unwrap();
        assert_eq!(parsed.module_path, "pkg/mod");
        assert_eq!(parsed.symbols, vec!["a".to_string(), "c".to_string()]);
        assert!(!parsed.is_relative);
    }

    #[test]
    fn test_single_dot_relative_import() {
        let parsed = PythonRelationshipExtractor.parse_import("from .utils import helpers").unwrap();
        assert_eq!(parsed.module_path, "./utils");
        assert!(parsed.is_relative);
    }

    #[test]
    fn test_double_dot_relative_import() {
        let parsed = PythonRelationshipExtractor.parse_import("from ..pkg.mod import x").unwrap();
        assert_eq!(parsed.module_path, "../pkg/mod");
        assert!(parsed.is_relative);
    }

    #[test]
    fn test_dynamic_import_module() {
        let parsed = PythonRelationshipExtractor.parse_import("importlib.import_module('pkg.mod')").unwrap();
        assert_eq!(parsed.module_path, "pkg/mod");
    }

    #[test]
    fn test_unrecognized_returns_none() {
        assert!(PythonRelationshipExtractor.parse_import("x = 1").is_none());
    }
}
