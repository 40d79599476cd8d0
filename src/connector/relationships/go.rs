use crate::application::interfaces::{ParsedImport, RelationshipExtractor};
use crate::domain::Language;

/// Parses a Go import spec's text (§4.4). Go import paths are always absolute
/// (module-path-rooted); Go has no relative-import syntax, so `is_relative` is
/// always `false` here.
pub struct GoRelationshipExtractor;

impl RelationshipExtractor for GoRelationshipExtractor {
    fn language(&self) -> Language {
        Language::Go
    }

    fn parse_import(&self, import_content: &str) -> Option<ParsedImport> {
        let content = import_content.trim();
        let start = content.find('"')?;
        let rest = &content[start + 1..];
        let end = rest.find('"')?;
        let path = rest[..end].to_string();
        let package = path.rsplit('/').next().unwrap_or(&path).to_string();
        Some(ParsedImport::new(path, vec![package], false))
    }
}
