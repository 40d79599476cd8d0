use serde::{Deserialize, Serialize};

/// Prefix used for file-level embedding node ids (SPEC_FULL.md §3).
pub const FILE_NODE_PREFIX: &str = "file_";
/// Prefix used for block-level embedding node ids (SPEC_FULL.md §3).
pub const BLOCK_NODE_PREFIX: &str = "block_";

pub fn file_node_id(file_id: u64) -> String {
    format!("{FILE_NODE_PREFIX}{file_id}")
}

pub fn block_node_id(block_id: u64) -> String {
    format!("{BLOCK_NODE_PREFIX}{block_id}")
}

/// An opaque vector keyed by a prefixed node id plus project id. The indexer never
/// computes or interprets the vector's contents — it only inserts on create/update
/// and deletes on remove, treating the embedding collaborator as a sealed box (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEmbedding {
    node_id: String,
    project_id: String,
    vector: Vec<f32>,
}

impl NodeEmbedding {
    pub fn new(node_id: impl Into<String>, project_id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            node_id: node_id.into(),
            project_id: project_id.into(),
            vector,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }

    pub fn is_file_node(&self) -> bool {
        self.node_id.starts_with(FILE_NODE_PREFIX)
    }

    pub fn is_block_node(&self) -> bool {
        self.node_id.starts_with(BLOCK_NODE_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_prefixes() {
        assert_eq!(file_node_id(42), "file_42");
        assert_eq!(block_node_id(7), "block_7");
    }

    #[test]
    fn test_node_embedding_creation() {
        let emb = NodeEmbedding::new(file_node_id(1), "proj-1", vec![0.1, 0.2, 0.3]);
        assert_eq!(emb.dimensions(), 3);
        assert!(emb.is_file_node());
        assert!(!emb.is_block_node());
    }

    #[test]
    fn test_block_node_detection() {
        let emb = NodeEmbedding::new(block_node_id(99), "proj-1", vec![0.0; 4]);
        assert!(emb.is_block_node());
        assert!(!emb.is_file_node());
    }
}
