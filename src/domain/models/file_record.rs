use serde::{Deserialize, Serialize};

use super::Language;

/// One row per distinct path per project (SPEC_FULL.md §3). `content_hash` is the
/// authoritative change-detection key the reconciler diffs against on each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    id: u64,
    project_id: String,
    file_path: String,
    language: Language,
    content_hash: String,
    size: Option<u64>,
    unsupported: bool,
}

impl FileRecord {
    pub fn new(
        id: u64,
        project_id: impl Into<String>,
        file_path: impl Into<String>,
        language: Language,
        content_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            project_id: project_id.into(),
            file_path: file_path.into(),
            language,
            content_hash: content_hash.into(),
            size: None,
            unsupported: false,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn unsupported(mut self) -> Self {
        self.unsupported = true;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn is_unsupported(&self) -> bool {
        self.unsupported
    }

    /// Whether `other_hash` represents a change against this record's stored hash,
    /// i.e. the reconciler must delete and re-insert this file's blocks and edges.
    pub fn has_changed(&self, other_hash: &str) -> bool {
        self.content_hash != other_hash
    }
}

/// Computes the SHA-256 content hash used for incremental-indexing change detection.
pub fn compute_content_hash(content: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(content);
    format!("{:x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_record_creation() {
        let record = FileRecord::new(1, "proj-1", "src/main.rs", Language::Rust, "abc123");
        assert_eq!(record.file_path(), "src/main.rs");
        assert_eq!(record.language(), Language::Rust);
        assert!(!record.is_unsupported());
    }

    #[test]
    fn test_unsupported_marker() {
        let record = FileRecord::new(2, "proj-1", "data.bin", Language::Unknown, "").unsupported();
        assert!(record.is_unsupported());
    }

    #[test]
    fn test_has_changed() {
        let record = FileRecord::new(1, "proj-1", "a.py", Language::Python, "hash1");
        assert!(record.has_changed("hash2"));
        assert!(!record.has_changed("hash1"));
    }

    #[test]
    fn test_compute_content_hash_deterministic() {
        let h1 = compute_content_hash(b"fn main() {}");
        let h2 = compute_content_hash(b"fn main() {}");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, compute_content_hash(b"fn main() { println!(); }"));
    }
}
