use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::domain::{FileData, Language};

/// Maps a file's "potential module names" to its id, built once per indexing batch
/// and consulted by relationship resolution (§4.4).
///
/// `direct` holds the full, un-shortened module name for each file (extension
/// stripped, index files collapsed to their parent directory). `suffix` additionally
/// holds every shorter suffix of that name, so `"utils/helpers"` and `"helpers"` both
/// point back at `src/utils/helpers.py`. A suffix with more than one candidate is
/// ambiguous and is dropped at resolution time rather than guessed at.
pub struct ModuleRegistry {
    direct: HashMap<String, u64>,
    suffix: HashMap<String, Vec<u64>>,
}

const ROOT_PREFIXES: &[&str] = &["src/", "lib/", "dist/"];

impl ModuleRegistry {
    pub fn build(files: &BTreeMap<String, FileData>) -> Self {
        let mut direct = HashMap::new();
        let mut suffix: HashMap<String, Vec<u64>> = HashMap::new();

        for file in files.values() {
            if file.unsupported {
                continue;
            }
            let full_name = module_name(&file.file_path, file.language);
            direct.entry(full_name.clone()).or_insert(file.id);

            for suffix_name in suffixes_of(&full_name) {
                suffix.entry(suffix_name).or_default().push(file.id);
            }
        }

        Self { direct, suffix }
    }

    /// Resolves a parsed import from `importing_file_path` (with id
    /// `importing_file_id`) to a target file id, or `None` if unresolved (§4.4).
    pub fn resolve(
        &self,
        importing_file_path: &str,
        importing_file_id: u64,
        module_path: &str,
        is_relative: bool,
    ) -> Option<u64> {
        let resolved = if is_relative {
            self.resolve_relative(importing_file_path, module_path)
        } else {
            self.resolve_absolute(module_path)
        }?;

        if resolved == importing_file_id {
            None
        } else {
            Some(resolved)
        }
    }

    fn resolve_relative(&self, importing_file_path: &str, module_path: &str) -> Option<u64> {
        let dir = Path::new(importing_file_path).parent().unwrap_or_else(|| Path::new(""));
        let joined = normalize_path(&dir.join(module_path));
        self.direct.get(&joined).copied().or_else(|| self.lookup_suffix(&joined))
    }

    fn resolve_absolute(&self, module_path: &str) -> Option<u64> {
        if let Some(id) = self.direct.get(module_path) {
            return Some(*id);
        }
        for prefix in ROOT_PREFIXES {
            let candidate = format!("{prefix}{module_path}");
            if let Some(id) = self.direct.get(&candidate) {
                return Some(*id);
            }
        }
        self.lookup_suffix(module_path)
    }

    fn lookup_suffix(&self, name: &str) -> Option<u64> {
        match self.suffix.get(name) {
            Some(candidates) if candidates.len() == 1 => Some(candidates[0]),
            _ => None,
        }
    }
}

/// Strips a path's extension and collapses index-file basenames to their parent
/// directory, producing the "full" module name for `path` under `language`.
fn module_name(path: &str, language: Language) -> String {
    let path = path.trim_start_matches("./");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return String::new();
    }

    let last = segments[segments.len() - 1];
    let stem = strip_known_extension(last, language);

    if language.index_file_stems().contains(&stem.as_str()) {
        segments[..segments.len() - 1].join("/")
    } else {
        let mut parent = segments[..segments.len() - 1].to_vec();
        let owned_stem;
        parent.push({
            owned_stem = stem;
            owned_stem.as_str()
        });
        parent.join("/")
    }
}

fn strip_known_extension(basename: &str, language: Language) -> String {
    for ext in language.extensions() {
        let dotted = format!(".{ext}");
        if let Some(stripped) = basename.strip_suffix(&dotted) {
            return stripped.to_string();
        }
    }
    basename.to_string()
}

/// Every suffix of a `/`-separated name, e.g. `"src/utils/helpers"` yields
/// `["src/utils/helpers", "utils/helpers", "helpers"]`.
fn suffixes_of(name: &str) -> Vec<String> {
    let segments: Vec<&str> = name.split('/').filter(|s| !s.is_empty()).collect();
    (0..segments.len()).map(|i| segments[i..].join("/")).collect()
}

fn normalize_path(path: &Path) -> String {
    let mut out: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::Normal(segment) => {
                out.push(segment.to_str().unwrap_or(""));
            }
            _ => {}
        }
    }
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileData;

    fn sample_files() -> BTreeMap<String, FileData> {
        let mut files = BTreeMap::new();
        files.insert(
            "src/utils/helpers.py".to_string(),
            FileData::new(1, "src/utils/helpers.py", Language::Python, "", "h1"),
        );
        files.insert(
            "src/utils/__init__.py".to_string(),
            FileData::new(2, "src/utils/__init__.py", Language::Python, "", "h2"),
        );
        files.insert(
            "src/main.py".to_string(),
            FileData::new(3, "src/main.py", Language::Python, "", "h3"),
        );
        files
    }

    #[test]
    fn test_index_file_collapses_to_parent_dir() {
        let registry = ModuleRegistry::build(&sample_files());
        assert_eq!(registry.direct.get("src/utils"), Some(&2));
    }

    #[test]
    fn test_direct_module_name() {
        let registry = ModuleRegistry::build(&sample_files());
        assert_eq!(registry.direct.get("src/utils/helpers"), Some(&1));
    }

    #[test]
    fn test_resolve_relative_import() {
        let registry = ModuleRegistry::build(&sample_files());
        let resolved = registry.resolve("src/main.py", 3, "./utils/helpers", true);
        assert_eq!(resolved, Some(1));
    }

    #[test]
    fn test_resolve_relative_to_index_file() {
        let registry = ModuleRegistry::build(&sample_files());
        let resolved = registry.resolve("src/main.py", 3, "./utils", true);
        assert_eq!(resolved, Some(2));
    }

    #[test]
    fn test_resolve_absolute_with_root_prefix() {
        let registry = ModuleRegistry::build(&sample_files());
        let resolved = registry.resolve("src/main.py", 3, "utils/helpers", false);
        assert_eq!(resolved, Some(1));
    }

    #[test]
    fn test_self_reference_dropped() {
        let registry = ModuleRegistry::build(&sample_files());
        let resolved = registry.resolve("src/main.py", 3, "./main", true);
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_unresolved_import_returns_none() {
        let registry = ModuleRegistry::build(&sample_files());
        let resolved = registry.resolve("src/main.py", 3, "nonexistent/module", false);
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_ambiguous_suffix_dropped() {
        let mut files = sample_files();
        files.insert(
            "vendor/utils/helpers.py".to_string(),
            FileData::new(4, "vendor/utils/helpers.py", Language::Python, "", "h4"),
        );
        let registry = ModuleRegistry::build(&files);
        // "helpers" now has two candidates (file 1 and file 4) so a bare suffix lookup
        // must not silently pick one.
        let resolved = registry.resolve("src/main.py", 3, "helpers", false);
        assert_eq!(resolved, None);
    }
}
