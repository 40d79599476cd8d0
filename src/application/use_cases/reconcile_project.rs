use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::application::interfaces::{EmbeddingSink, LanguageExtractor, RelationshipExtractor, Store};
use crate::application::module_registry::ModuleRegistry;
use crate::application::snapshot_io::{read_latest_snapshot, write_snapshot};
use crate::application::text::decode_text;
use crate::domain::{
    block_node_id, compute_content_hash, file_node_id, hash_path, BlockIdAllocator, BlockType,
    DomainError, ExtractionSnapshot, FileData, FileRecord, Language, RelationshipEdge,
};

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct ReconcileStats {
    pub files_added: u64,
    pub files_changed: u64,
    pub files_deleted: u64,
    pub nodes_added: u64,
    pub nodes_deleted: u64,
    pub relationships_added: u64,
    pub relationships_deleted: u64,
}

/// Incremental reconciler (§4.7): diffs the current filesystem against the store's
/// recorded content hashes and applies the minimal set of deletes/inserts to bring
/// both the store and the on-disk snapshot back in sync.
pub struct ReconcileProjectUseCase {
    store: Arc<dyn Store>,
    embedding_sink: Arc<dyn EmbeddingSink>,
    extractors: HashMap<Language, Arc<dyn LanguageExtractor>>,
    relationship_extractors: HashMap<Language, Arc<dyn RelationshipExtractor>>,
    parser_results_dir: PathBuf,
}

impl ReconcileProjectUseCase {
    pub fn new(
        store: Arc<dyn Store>,
        embedding_sink: Arc<dyn EmbeddingSink>,
        extractors: HashMap<Language, Arc<dyn LanguageExtractor>>,
        relationship_extractors: HashMap<Language, Arc<dyn RelationshipExtractor>>,
        parser_results_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            embedding_sink,
            extractors,
            relationship_extractors,
            parser_results_dir,
        }
    }

    pub async fn execute(&self, project_name: &str) -> Result<ReconcileStats, DomainError> {
        let project = self
            .store
            .find_project_by_name(project_name)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("project '{project_name}'")))?;

        let root = PathBuf::from(project.path());
        let start = Instant::now();

        let current = hash_tree(&root).await;
        let stored = self.store.get_file_hashes(project.id()).await?;

        let current_paths: HashSet<&String> = current.keys().collect();
        let stored_paths: HashSet<&String> = stored.keys().collect();

        let added: Vec<String> = current_paths
            .difference(&stored_paths)
            .map(|p| (*p).clone())
            .collect();
        let deleted: Vec<String> = stored_paths
            .difference(&current_paths)
            .map(|p| (*p).clone())
            .collect();
        let modified: Vec<String> = current_paths
            .intersection(&stored_paths)
            .filter(|p| current.get(**p) != stored.get(**p))
            .map(|p| (*p).clone())
            .collect();

        info!(
            "Reconcile '{}': {} added, {} modified, {} deleted",
            project_name,
            added.len(),
            modified.len(),
            deleted.len()
        );

        if added.is_empty() && modified.is_empty() && deleted.is_empty() {
            return Ok(ReconcileStats::default());
        }

        let mut snapshot = read_latest_snapshot(&self.parser_results_dir, project_name)
            .await?
            .unwrap_or_else(|| ExtractionSnapshot::new(current_timestamp_rfc3339()));

        let mut stats = ReconcileStats {
            files_added: added.len() as u64,
            files_changed: modified.len() as u64,
            files_deleted: deleted.len() as u64,
            ..Default::default()
        };

        // Tear down the old entries for deleted/modified files before touching the
        // store, so we still have their block/relationship ids for embedding cleanup.
        for path in deleted.iter().chain(modified.iter()) {
            if let Some(old) = snapshot.get(path) {
                stats.nodes_deleted += 1 + old.blocks.iter().map(count_nested).sum::<u64>();
                stats.relationships_deleted += old.relationships.len() as u64;

                let mut node_ids = vec![file_node_id(old.id)];
                collect_block_node_ids(&old.blocks, &mut node_ids);
                self.embedding_sink.delete_embeddings(project.id(), &node_ids).await?;
            }

            if let Some(file_id) = self.store.find_file_id(project.id(), path).await? {
                self.store.delete_file(file_id).await?;
            }
        }

        for path in &deleted {
            snapshot.remove(path);
        }

        // Re-extract added/modified files.
        let changed: Vec<String> = added.iter().chain(modified.iter()).cloned().collect();
        for path in &changed {
            let content_hash = current.get(path).cloned().unwrap_or_default();
            let absolute = root.join(path);
            let data = self.extract_file(&absolute, path, &content_hash).await;
            stats.nodes_added += 1 + data.blocks.iter().map(count_nested).sum::<u64>();
            snapshot.insert(path.clone(), data);
        }

        // Relationship extraction re-runs only for changed files, against the full
        // updated registry (§4.7 step 9).
        let registry = ModuleRegistry::build(&snapshot.files);
        let mut relationships_by_file: HashMap<String, Vec<RelationshipEdge>> = HashMap::new();

        for path in &changed {
            let Some(data) = snapshot.get(path) else { continue };
            if data.unsupported {
                continue;
            }
            let Some(extractor) = self.relationship_extractors.get(&data.language) else {
                continue;
            };
            let mut edges = Vec::new();
            for block in data.blocks.iter().filter(|b| b.block_type() == BlockType::Import) {
                let Some(parsed) = extractor.parse_import(block.content()) else { continue };
                if let Some(target_id) =
                    registry.resolve(path, data.id, &parsed.module_path, parsed.is_relative)
                {
                    edges.push(RelationshipEdge {
                        source_id: data.id,
                        target_id,
                        import_content: block.content().to_string(),
                    });
                }
            }
            stats.relationships_added += edges.len() as u64;
            relationships_by_file.insert(path.clone(), edges);
        }

        for (path, edges) in &relationships_by_file {
            if let Some(data) = snapshot.files.get_mut(path) {
                data.relationships = edges.clone();
            }
        }

        write_snapshot(&self.parser_results_dir, project_name, &timestamp_compact(), &snapshot).await?;

        // Apply the new state to the store.
        for path in &changed {
            let Some(data) = snapshot.get(path) else { continue };
            let size = if data.unsupported { None } else { Some(data.content.len() as u64) };
            self.store
                .upsert_file(project.id(), path, &data.content_hash, data.language, size, data.unsupported)
                .await?;

            if data.unsupported {
                continue;
            }

            self.store.bulk_insert_blocks(data.id, &data.blocks).await?;
            if let Some(edges) = relationships_by_file.get(path) {
                self.store.bulk_insert_relationships(data.id, edges).await?;
            }

            let file_record = FileRecord::new(data.id, project.id(), path, data.language, &data.content_hash);
            self.embedding_sink
                .embed_and_store(project.id(), &file_record, &data.blocks)
                .await?;
        }

        let elapsed = start.elapsed();
        info!(
            "Reconcile complete: {}+{} files touched, {} nodes added, {} nodes deleted in {:.2}s",
            stats.files_added,
            stats.files_changed,
            stats.nodes_added,
            stats.nodes_deleted,
            elapsed.as_secs_f64()
        );

        Ok(stats)
    }

    async fn extract_file(&self, absolute_path: &Path, relative_path: &str, expected_hash: &str) -> FileData {
        let language = Language::language_of(absolute_path);
        let file_id = hash_path(relative_path) as u64;

        let content = match tokio::fs::read(absolute_path).await {
            Ok(bytes) => match decode_text(&bytes) {
                Some(text) => text,
                None => {
                    debug!("Skipping binary or undecodable file: {}", relative_path);
                    return FileData::unsupported(file_id, relative_path, language);
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", relative_path, e);
                return FileData::unsupported(file_id, relative_path, language);
            }
        };

        let content_hash = if expected_hash.is_empty() {
            compute_content_hash(content.as_bytes())
        } else {
            expected_hash.to_string()
        };

        let Some(extractor) = self.extractors.get(&language) else {
            return FileData::unsupported(file_id, relative_path, language);
        };

        let mut allocator = BlockIdAllocator::new(relative_path);
        match extractor.extract_all(&content, &mut allocator).await {
            Ok(blocks) => {
                let mut data = FileData::new(file_id, relative_path, language, &content, &content_hash);
                data.blocks = blocks;
                data
            }
            Err(e) => {
                warn!("Failed to parse {}: {}", relative_path, e);
                FileData::unsupported(file_id, relative_path, language)
            }
        }
    }
}

fn count_nested(block: &crate::domain::CodeBlock) -> u64 {
    block.flatten().len() as u64
}

fn collect_block_node_ids(blocks: &[crate::domain::CodeBlock], out: &mut Vec<String>) {
    for block in blocks {
        out.push(block_node_id(block.id()));
        collect_block_node_ids(block.children(), out);
    }
}

async fn hash_tree(root: &Path) -> HashMap<String, String> {
    use ignore::WalkBuilder;

    use super::index_project::{is_ignored_dir, is_ignored_file};

    let mut hashes = HashMap::new();
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(|entry| {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                return !is_ignored_dir(&entry.file_name().to_string_lossy());
            }
            true
        })
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error walking directory: {}", e);
                continue;
            }
        };
        if !entry.path().is_file() {
            continue;
        }
        if is_ignored_file(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let relative_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        match tokio::fs::read(entry.path()).await {
            Ok(bytes) => {
                debug!("Hashing {}", relative_path);
                hashes.insert(relative_path, compute_content_hash(&bytes));
            }
            Err(e) => warn!("Failed to read {}: {}", relative_path, e),
        }
    }

    hashes
}

fn current_timestamp_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn timestamp_compact() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
