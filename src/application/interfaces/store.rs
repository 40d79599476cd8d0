use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{CodeBlock, DomainError, Language, Project, RelationshipEdge};

/// Persistence for projects, files, blocks, and relationships (SPEC_FULL.md §4.6).
/// Block ids are assigned by the extractor, never by the store.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_project(&self, project: &Project) -> Result<(), DomainError>;

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, DomainError>;

    async fn find_project_by_id(&self, id: &str) -> Result<Option<Project>, DomainError>;

    #[allow(clippy::too_many_arguments)]
    async fn upsert_file(
        &self,
        project_id: &str,
        file_path: &str,
        content_hash: &str,
        language: Language,
        size: Option<u64>,
        unsupported: bool,
    ) -> Result<u64, DomainError>;

    /// Looks up the file id previously assigned to `file_path` within `project_id`,
    /// needed by the reconciler to address a file it only knows by path.
    async fn find_file_id(&self, project_id: &str, file_path: &str) -> Result<Option<u64>, DomainError>;

    async fn bulk_insert_blocks(&self, file_id: u64, blocks: &[CodeBlock]) -> Result<(), DomainError>;

    async fn bulk_insert_relationships(
        &self,
        source_file_id: u64,
        edges: &[RelationshipEdge],
    ) -> Result<(), DomainError>;

    /// Deletes a file; cascades its blocks and edges where it is the source, and
    /// separately removes edges where it is the target (§3 ownership rules).
    async fn delete_file(&self, file_id: u64) -> Result<(), DomainError>;

    async fn get_file_hashes(&self, project_id: &str) -> Result<HashMap<String, String>, DomainError>;

    async fn clear_project(&self, project_id: &str, force: bool) -> Result<(), DomainError>;
}
