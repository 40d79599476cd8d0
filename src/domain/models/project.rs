use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A logical repository being indexed (SPEC_FULL.md §3). Created once by the caller
/// and reused across runs; owns every `FileRecord` beneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    id: String,
    name: String,
    path: String,
    language: Option<String>,
    version: Option<String>,
    description: Option<String>,
    created_at: i64,
    updated_at: i64,
    source_file: Option<String>,
}

impl Project {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        let now = current_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            path: path.into(),
            language: None,
            version: None,
            description: None,
            created_at: now,
            updated_at: now,
            source_file: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    /// Reconstitutes a `Project` from persisted data (used by storage adapters).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        name: String,
        path: String,
        language: Option<String>,
        version: Option<String>,
        description: Option<String>,
        created_at: i64,
        updated_at: i64,
        source_file: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            path,
            language,
            version,
            description,
            created_at,
            updated_at,
            source_file,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    pub fn touch(&mut self) {
        self.updated_at = current_timestamp();
    }

    pub fn matches_path(&self, path: &str) -> bool {
        self.path == path
    }
}

fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_creation() {
        let project = Project::new("my-project", "/path/to/project");
        assert_eq!(project.name(), "my-project");
        assert_eq!(project.path(), "/path/to/project");
        assert!(project.language().is_none());
        assert_eq!(project.created_at(), project.updated_at());
    }

    #[test]
    fn test_builder_fields() {
        let project = Project::new("p", "/p")
            .with_language("rust")
            .with_version("1.0.0")
            .with_description("a test project");
        assert_eq!(project.language(), Some("rust"));
        assert_eq!(project.version(), Some("1.0.0"));
        assert_eq!(project.description(), Some("a test project"));
    }

    #[test]
    fn test_matches_path() {
        let project = Project::new("p", "/a/b");
        assert!(project.matches_path("/a/b"));
        assert!(!project.matches_path("/a/c"));
    }
}
