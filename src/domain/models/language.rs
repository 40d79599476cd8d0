use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Go,
    Rust,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" | "pyi" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "go" => Language::Go,
            "rs" => Language::Rust,
            _ => Language::Unknown,
        }
    }

    /// Inspects the full filename first (for extensionless names like `Makefile`,
    /// `Dockerfile`), then falls back to the extension, per SPEC_FULL.md §4.1. None of
    /// the languages this crate supports use a fixed extensionless filename, so this
    /// always falls through to extension-based classification today; the hook exists
    /// so a future language (e.g. a `BUILD` file grammar) has somewhere to plug in.
    pub fn from_filename(_filename: &str) -> Self {
        Language::Unknown
    }

    pub fn language_of(path: &Path) -> Self {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            let by_name = Self::from_filename(name);
            if by_name.is_known() {
                return by_name;
            }
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Kept as an alias for callers coming from the teacher's `from_path` naming.
    pub fn from_path(path: &Path) -> Self {
        Self::language_of(path)
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "python" => Language::Python,
            "javascript" => Language::JavaScript,
            "typescript" => Language::TypeScript,
            "go" => Language::Go,
            "rust" => Language::Rust,
            _ => Language::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Unknown)
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx"],
            Language::Go => &["go"],
            Language::Rust => &["rs"],
            Language::Unknown => &[],
        }
    }

    /// Index-file basenames that collapse to their parent directory's module name
    /// when building the relationship-resolution module registry (§4.4).
    pub fn index_file_stems(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["__init__"],
            Language::JavaScript | Language::TypeScript => &["index"],
            Language::Go | Language::Rust | Language::Unknown => &[],
        }
    }

    /// The line-comment prefix used when writing a `[BLOCK_REF:<id>]` marker (§4.3).
    pub fn line_comment_prefix(&self) -> &'static str {
        match self {
            Language::Python => "#",
            Language::JavaScript | Language::TypeScript | Language::Go | Language::Rust => "//",
            Language::Unknown => "//",
        }
    }

    pub fn all_supported() -> Vec<Language> {
        vec![
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Go,
            Language::Rust,
        ]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("js"), Language::JavaScript);
        assert_eq!(Language::from_extension("ts"), Language::TypeScript);
        assert_eq!(Language::from_extension("go"), Language::Go);
        assert_eq!(Language::from_extension("rs"), Language::Rust);
        assert_eq!(Language::from_extension("txt"), Language::Unknown);
    }

    #[test]
    fn test_language_of_path() {
        assert_eq!(Language::language_of(Path::new("src/main.rs")), Language::Rust);
        assert_eq!(Language::language_of(Path::new("script.py")), Language::Python);
        assert_eq!(Language::language_of(Path::new("README.md")), Language::Unknown);
    }

    #[test]
    fn test_index_file_stems() {
        assert_eq!(Language::Python.index_file_stems(), &["__init__"]);
        assert_eq!(Language::TypeScript.index_file_stems(), &["index"]);
        assert!(Language::Rust.index_file_stems().is_empty());
    }

    #[test]
    fn test_all_supported_excludes_unknown() {
        let supported = Language::all_supported();
        assert!(supported.contains(&Language::Python));
        assert!(!supported.contains(&Language::Unknown));
    }
}
