use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::interfaces::EmbeddingSink;
use crate::domain::{block_node_id, file_node_id, CodeBlock, DomainError, FileRecord, NodeEmbedding};

/// In-memory [`EmbeddingSink`] test double (§4.8). Vectors are deterministic
/// pseudo-embeddings derived from a content hash rather than `rand`-seeded noise
/// (the teacher's `MockEmbeddingService` reseeds an RNG per call; this crate has no
/// use for non-reproducible vectors, so the hash itself is the seed and the source
/// of every component).
pub struct MockEmbeddingSink {
    dimensions: usize,
    store: Arc<Mutex<HashMap<String, NodeEmbedding>>>,
}

impl MockEmbeddingSink {
    pub fn new() -> Self {
        Self::with_dimensions(384)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            store: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn get(&self, node_id: &str) -> Option<NodeEmbedding> {
        self.store.lock().await.get(node_id).cloned()
    }

    fn pseudo_vector(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut vector = Vec::with_capacity(self.dimensions);
        for _ in 0..self.dimensions {
            // xorshift64 step — cheap, deterministic, no external RNG dependency.
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let component = (state as f64 / u64::MAX as f64) * 2.0 - 1.0;
            vector.push(component as f32);
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }
        vector
    }

    fn block_text(block: &CodeBlock) -> String {
        format!("{} [{}] {}", block.name(), block.block_type(), block.content())
    }
}

impl Default for MockEmbeddingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingSink for MockEmbeddingSink {
    async fn embed_and_store(&self, project_id: &str, file: &FileRecord, blocks: &[CodeBlock]) -> Result<(), DomainError> {
        let mut store = self.store.lock().await;

        let file_text = format!("{} [{}]", file.file_path(), file.language());
        let file_id = file_node_id(file.id());
        store.insert(file_id.clone(), NodeEmbedding::new(file_id, project_id, self.pseudo_vector(&file_text)));

        for block in blocks {
            for flat in block.flatten() {
                let node_id = block_node_id(flat.id());
                let vector = self.pseudo_vector(&Self::block_text(flat));
                store.insert(node_id.clone(), NodeEmbedding::new(node_id, project_id, vector));
            }
        }

        debug!("stored {} mock embeddings for {}", blocks.len() + 1, file.file_path());
        Ok(())
    }

    async fn delete_embeddings(&self, _project_id: &str, node_ids: &[String]) -> Result<(), DomainError> {
        let mut store = self.store.lock().await;
        for id in node_ids {
            store.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockType, Language};

    #[tokio::test]
    async fn test_embed_and_store_is_deterministic() {
        let sink = MockEmbeddingSink::with_dimensions(16);
        let file = FileRecord::new(1, "proj", "a.py", Language::Python, "hash");
        let block = CodeBlock::new(1, BlockType::Function, "f", "def f(): pass", 1, 1, 0, 13);

        sink.embed_and_store("proj", &file, &[block.clone()]).await.unwrap();
        let first = sink.get(&block_node_id(1)).await.unwrap();

        sink.embed_and_store("proj", &file, &[block]).await.unwrap();
        let second = sink.get(&block_node_id(1)).await.unwrap();

        assert_eq!(first.vector(), second.vector());
        assert_eq!(first.dimensions(), 16);
    }

    #[tokio::test]
    async fn test_embed_and_store_includes_file_and_block_nodes() {
        let sink = MockEmbeddingSink::new();
        let file = FileRecord::new(7, "proj", "a.py", Language::Python, "hash");
        let block = CodeBlock::new((7u64 << 12) | 1, BlockType::Function, "f", "", 1, 1, 0, 1);

        sink.embed_and_store("proj", &file, &[block]).await.unwrap();

        assert!(sink.get(&file_node_id(7)).await.is_some());
        assert!(sink.get(&block_node_id((7u64 << 12) | 1)).await.is_some());
        assert_eq!(sink.len().await, 2);
    }

    #[tokio::test]
    async fn test_delete_embeddings_removes_by_node_id() {
        let sink = MockEmbeddingSink::new();
        let file = FileRecord::new(1, "proj", "a.py", Language::Python, "hash");
        let block = CodeBlock::new(1, BlockType::Function, "f", "", 1, 1, 0, 1);
        sink.embed_and_store("proj", &file, &[block]).await.unwrap();

        sink.delete_embeddings("proj", &[file_node_id(1), block_node_id(1)]).await.unwrap();

        assert_eq!(sink.len().await, 0);
    }
}
