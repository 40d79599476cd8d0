mod block_id;
mod code_block;
mod embedding;
mod file_record;
mod language;
mod project;
mod relationship;
mod snapshot;

pub use block_id::{hash_path, BlockIdAllocator, MAX_BLOCKS_PER_FILE};
pub use code_block::{BlockType, CodeBlock};
pub use embedding::{block_node_id, file_node_id, NodeEmbedding, BLOCK_NODE_PREFIX, FILE_NODE_PREFIX};
pub use file_record::{compute_content_hash, FileRecord};
pub use language::Language;
pub use project::Project;
pub use relationship::{Relationship, RelationshipKind};
pub use snapshot::{ExtractionSnapshot, FileData, RelationshipEdge, SnapshotMetadata, EXTRACTOR_VERSION};
