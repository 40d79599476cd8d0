use crate::application::interfaces::{ParsedImport, RelationshipExtractor};
use crate::domain::Language;

/// Parses a Rust `use` declaration's text (§4.4). `crate::`-rooted and bare
/// external-crate paths resolve as absolute (via `ModuleRegistry`'s `src/` root
/// prefix); `self::`/`super::` paths resolve relative to the importing module.
pub struct RustRelationshipExtractor;

impl RelationshipExtractor for RustRelationshipExtractor {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn parse_import(&self, import_content: &str) -> Option<ParsedImport> {
        let content = import_content.trim();
        let idx = content.find("use ")?;
        let rest = content[idx + 4..].trim_end_matches(';').trim();

        let (path_part, symbols) = split_symbols(rest);
        let (module_path, is_relative) = normalize_path(path_part);
        Some(ParsedImport::new(module_path, symbols, is_relative))
    }
}

fn split_symbols(rest: &str) -> (&str, Vec<String>) {
    if let Some(open) = rest.find("::{") {
        let close = rest.rfind('}').unwrap_or(rest.len());
        let symbols = rest[open + 3..close]
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.split("as").last().unwrap_or(s).trim().to_string())
            .collect();
        return (&rest[..open], symbols);
    }

    if rest.ends_with('*') {
        let path = rest.trim_end_matches("::*").trim_end_matches('*');
        return (path, vec!["*".to_string()]);
    }

    match rest.rsplit_once("::") {
        Some((path, last)) => {
            let symbol = last.split("as").last().unwrap_or(last).trim();
            (path, vec![symbol.to_string()])
        }
        None => (rest, vec![rest.to_string()]),
    }
}

fn normalize_path(path: &str) -> (String, bool) {
    if let Some(rest) = path.strip_prefix("self::") {
        return (format!("./{}", rest.replace("::", "/")), true);
    }
    if let Some(mut rest) = path.strip_prefix("super::") {
        let mut depth = 1;
        while let Some(stripped) = rest.strip_prefix("super::") {
            depth += 1;
            rest = stripped;
        }
        let prefix = "../".repeat(depth);
        return (format!("{prefix}{}", rest.replace("::", "/")), true);
    }
    let rest = path.strip_prefix("crate::").unwrap_or(path);
    (rest.replace("::", "/"), false)
}
