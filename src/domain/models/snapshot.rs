use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CodeBlock, Language};

/// Semver-ish tag stamped into every snapshot's metadata. Bumped when the on-disk
/// shape of `ExtractionSnapshot` changes in a way downstream readers must know about.
pub const EXTRACTOR_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub export_timestamp: String,
    pub total_files: usize,
    pub extractor_version: String,
}

impl SnapshotMetadata {
    pub fn new(export_timestamp: impl Into<String>, total_files: usize) -> Self {
        Self {
            export_timestamp: export_timestamp.into(),
            total_files,
            extractor_version: EXTRACTOR_VERSION.to_string(),
        }
    }
}

/// A single relationship edge as it appears inside a snapshot file (§6.1). Distinct
/// from `domain::Relationship`, which additionally tracks the persisted edge's kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source_id: u64,
    pub target_id: u64,
    pub import_content: String,
}

/// Per-file entry of an `ExtractionSnapshot` (§6.1). `content` is empty for
/// unsupported files; `blocks`/`relationships` are empty until extraction completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    pub id: u64,
    pub file_path: String,
    pub language: Language,
    pub content: String,
    pub content_hash: String,
    pub unsupported: bool,
    pub blocks: Vec<CodeBlock>,
    pub relationships: Vec<RelationshipEdge>,
}

impl FileData {
    pub fn new(
        id: u64,
        file_path: impl Into<String>,
        language: Language,
        content: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            file_path: file_path.into(),
            language,
            content: content.into(),
            content_hash: content_hash.into(),
            unsupported: false,
            blocks: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn unsupported(
        id: u64,
        file_path: impl Into<String>,
        language: Language,
    ) -> Self {
        Self {
            id,
            file_path: file_path.into(),
            language,
            content: String::new(),
            content_hash: String::new(),
            unsupported: true,
            blocks: Vec::new(),
            relationships: Vec::new(),
        }
    }
}

/// The full on-disk extraction snapshot document (§6.1). Keys of `files` are
/// project-relative paths so a snapshot produced on one machine can be read on
/// another; only the in-memory structures built during a run may carry absolute paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSnapshot {
    pub metadata: SnapshotMetadata,
    pub files: BTreeMap<String, FileData>,
}

impl ExtractionSnapshot {
    pub fn new(export_timestamp: impl Into<String>) -> Self {
        Self {
            metadata: SnapshotMetadata::new(export_timestamp, 0),
            files: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, path: impl Into<String>, data: FileData) {
        self.files.insert(path.into(), data);
        self.metadata.total_files = self.files.len();
    }

    pub fn remove(&mut self, path: &str) -> Option<FileData> {
        let removed = self.files.remove(path);
        self.metadata.total_files = self.files.len();
        removed
    }

    pub fn get(&self, path: &str) -> Option<&FileData> {
        self.files.get(path)
    }

    /// File name of the snapshot as written under the parser-results directory:
    /// `<project>_extraction_<yyyymmdd_hhmmss>.json` (§6.1).
    pub fn file_name(project_name: &str, timestamp_compact: &str) -> String {
        format!("{project_name}_extraction_{timestamp_compact}.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_insert_updates_total_files() {
        let mut snapshot = ExtractionSnapshot::new("2026-07-28T00:00:00Z");
        assert_eq!(snapshot.metadata.total_files, 0);

        let data = FileData::new(1, "src/main.rs", Language::Rust, "fn main() {}", "hash1");
        snapshot.insert("src/main.rs", data);

        assert_eq!(snapshot.metadata.total_files, 1);
        assert!(snapshot.get("src/main.rs").is_some());
    }

    #[test]
    fn test_snapshot_remove_updates_total_files() {
        let mut snapshot = ExtractionSnapshot::new("2026-07-28T00:00:00Z");
        snapshot.insert(
            "a.py",
            FileData::new(1, "a.py", Language::Python, "x = 1", "h"),
        );
        snapshot.remove("a.py");
        assert_eq!(snapshot.metadata.total_files, 0);
        assert!(snapshot.get("a.py").is_none());
    }

    #[test]
    fn test_unsupported_file_entry_has_empty_content() {
        let data = FileData::unsupported(2, "logo.png", Language::Unknown);
        assert!(data.unsupported);
        assert_eq!(data.content, "");
        assert_eq!(data.content_hash, "");
    }

    #[test]
    fn test_snapshot_file_name_format() {
        let name = ExtractionSnapshot::file_name("my-project", "20260728_120000");
        assert_eq!(name, "my-project_extraction_20260728_120000.json");
    }

    #[test]
    fn test_roundtrip_serialization() {
        let mut snapshot = ExtractionSnapshot::new("2026-07-28T00:00:00Z");
        snapshot.insert(
            "src/lib.rs",
            FileData::new(1, "src/lib.rs", Language::Rust, "pub fn x() {}", "abc"),
        );
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ExtractionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metadata.total_files, 1);
        assert_eq!(back.metadata.extractor_version, EXTRACTOR_VERSION);
    }
}
