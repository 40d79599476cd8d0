use crate::application::interfaces::{ParsedImport, RelationshipExtractor};
use crate::domain::Language;

/// Shared JS/TS import-text parsing, grounded on
/// `original_source/indexer/relationship_extractors/typescript_extractor.py`'s
/// `_fallback_extract_module_path` regexes — reimplemented as direct string
/// scans since the `from`/`require`/`import(` markers are fixed literals.
fn parse_module_path(content: &str) -> Option<(String, bool)> {
    let module_path = extract_quoted_after(content, "from")
        .or_else(|| extract_quoted_after(content, "require"))
        .or_else(|| extract_quoted_after(content, "import"))?;
    let is_relative = module_path.starts_with('.');
    Some((module_path, is_relative))
}

fn extract_quoted_after(content: &str, marker: &str) -> Option<String> {
    let idx = content.find(marker)?;
    let rest = &content[idx + marker.len()..];
    let start = rest.find(['\'', '"'])?;
    let quote = rest.as_bytes()[start] as char;
    let after_quote = &rest[start + 1..];
    let end = after_quote.find(quote)?;
    Some(after_quote[..end].to_string())
}

fn named_import_symbols(content: &str) -> Vec<String> {
    let Some(open) = content.find('{') else { return Vec::new() };
    let Some(close) = content[open..].find('}') else { return Vec::new() };
    content[open + 1..open + close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.split_whitespace().last().unwrap_or(s).to_string())
        .collect()
}

/// Parses JavaScript `import`/`require`/dynamic-`import()` text (§4.4).
pub struct JavaScriptRelationshipExtractor;

impl RelationshipExtractor for JavaScriptRelationshipExtractor {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn parse_import(&self, import_content: &str) -> Option<ParsedImport> {
        let (module_path, is_relative) = parse_module_path(import_content)?;
        let symbols = named_import_symbols(import_content);
        Some(ParsedImport::new(module_path, symbols, is_relative))
    }
}

/// Parses TypeScript import text; identical grammar to JavaScript for this
/// purpose (type-only imports use the same `from '...'` shape).
pub struct TypeScriptRelationshipExtractor;

impl RelationshipExtractor for TypeScriptRelationshipExtractor {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn parse_import(&self, import_content: &str) -> Option<ParsedImport> {
        let (module_path, is_relative) = parse_module_path(import_content)?;
        let symbols = named_import_symbols(import_content);
        Some(ParsedImport::new(module_path, symbols, is_relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_import() {
        let parsed = JavaScriptRelationshipExtractor.parse_import("import { readFile } from './fs-utils'").unwrap();
        assert_eq!(parsed.module_path, "./fs-utils");
        assert!(parsed.is_relative);
        assert_eq!(parsed.symbols, vec!["readFile".to_string()]);
    }

    #[test]
    fn test_require_call() {
        let parsed = JavaScriptRelationshipExtractor.parse_import("const fs = require('fs')").unwrap();
        assert_eq!(parsed.module_path, "fs");
        assert!(!parsed.is_relative);
    }

    #[test]
    fn test_dynamic_import() {
        let parsed = JavaScriptRelationshipExtractor.parse_import("import('./lazy')").unwrap();
        assert_eq!(parsed.module_path, "./lazy");
    }

    #[test]
    fn test_typescript_type_import() {
        let parsed = TypeScriptRelationshipExtractor.parse_import("import type { Foo } from '../types'").unwrap();
        assert_eq!(parsed.module_path, "../types");
        assert_eq!(parsed.symbols, vec!["Foo".to_string()]);
    }
}
