use async_trait::async_trait;

use crate::domain::{CodeBlock, DomainError, FileRecord};

/// The indexer never computes vectors itself; it hands finished files and blocks to
/// this collaborator and lets it decide how to chunk, embed, and store them (§4.8).
/// Keys passed to `delete_embeddings` are always prefixed (`file_<id>`/`block_<id>`)
/// so a single shared table can disambiguate file- from block-level vectors.
#[async_trait]
pub trait EmbeddingSink: Send + Sync {
    async fn embed_and_store(
        &self,
        project_id: &str,
        file: &FileRecord,
        blocks: &[CodeBlock],
    ) -> Result<(), DomainError>;

    async fn delete_embeddings(&self, project_id: &str, node_ids: &[String]) -> Result<(), DomainError>;
}
