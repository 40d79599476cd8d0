use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::application::interfaces::{EmbeddingSink, LanguageExtractor, RelationshipExtractor, Store};
use crate::application::module_registry::ModuleRegistry;
use crate::application::snapshot_io::write_snapshot;
use crate::application::text::decode_text;
use crate::domain::{
    compute_content_hash, hash_path, BlockIdAllocator, BlockType, CodeBlock, DomainError,
    ExtractionSnapshot, FileData, FileRecord, Language, Project, RelationshipEdge,
};

/// Directory basenames skipped outright by the walker (§4.1): version control, IDE
/// metadata, and the usual language build/cache/vendor directories.
const IGNORED_DIRS: &[&str] = &[
    ".git", ".hg", ".svn", ".idea", ".vscode", "node_modules", "__pycache__", "target", "dist",
    "build", ".venv", "venv", "vendor", ".mypy_cache", ".pytest_cache",
];

/// File basenames/suffixes skipped outright by the walker (§4.1): compiled artifacts,
/// lockfiles, binary media, archives, and minified/source-map outputs.
const IGNORED_FILE_SUFFIXES: &[&str] = &[
    ".pyc", ".so", ".o", ".class", ".exe", ".dll", ".dylib", ".png", ".jpg", ".jpeg", ".gif",
    ".ico", ".svg", ".zip", ".tar", ".gz", ".tar.gz", ".min.js", ".map",
];

const IGNORED_FILE_NAMES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "poetry.lock",
    ".DS_Store",
];

pub(crate) fn is_ignored_dir(name: &str) -> bool {
    IGNORED_DIRS.contains(&name)
}

pub(crate) fn is_ignored_file(name: &str) -> bool {
    if IGNORED_FILE_NAMES.contains(&name) {
        return true;
    }
    IGNORED_FILE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct IndexStats {
    pub files_indexed: u64,
    pub files_unsupported: u64,
    pub blocks_extracted: u64,
    pub relationships_extracted: u64,
}

/// One file's result after the parallel read+hash+parse phase, before relationship
/// resolution (§4.5 steps 1-2).
struct FileExtraction {
    relative_path: String,
    language: Language,
    content: String,
    content_hash: String,
    blocks: Vec<CodeBlock>,
    unsupported: bool,
}

/// Full-index orchestrator (§4.5). Walks a project root, extracts blocks per file with
/// bounded concurrency, resolves cross-file relationships in a single barrier phase,
/// persists everything to the store, hands files to the embedding collaborator, and
/// writes the resulting extraction snapshot to disk.
pub struct IndexProjectUseCase {
    store: Arc<dyn Store>,
    embedding_sink: Arc<dyn EmbeddingSink>,
    extractors: HashMap<Language, Arc<dyn LanguageExtractor>>,
    relationship_extractors: HashMap<Language, Arc<dyn RelationshipExtractor>>,
    parser_results_dir: PathBuf,
    concurrency: usize,
}

impl IndexProjectUseCase {
    pub fn new(
        store: Arc<dyn Store>,
        embedding_sink: Arc<dyn EmbeddingSink>,
        extractors: HashMap<Language, Arc<dyn LanguageExtractor>>,
        relationship_extractors: HashMap<Language, Arc<dyn RelationshipExtractor>>,
        parser_results_dir: PathBuf,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            embedding_sink,
            extractors,
            relationship_extractors,
            parser_results_dir,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn execute(
        &self,
        root: &Path,
        project_name: Option<&str>,
        force: bool,
    ) -> Result<(Project, IndexStats), DomainError> {
        let absolute_path = root
            .canonicalize()
            .map_err(|e| DomainError::invalid_input(format!("invalid project path: {e}")))?;

        let name = project_name.map(String::from).unwrap_or_else(|| {
            absolute_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("project")
                .to_string()
        });

        let existing = self.store.find_project_by_name(&name).await?;
        if force {
            if let Some(existing) = &existing {
                info!("Force re-indexing project (clearing existing data): {}", name);
                self.store.clear_project(existing.id(), true).await?;
            }
        }

        let project = match (existing, force) {
            (Some(project), false) => project,
            _ => {
                let project = Project::new(name.clone(), absolute_path.to_string_lossy().to_string());
                self.store.insert_project(&project).await?;
                project
            }
        };

        info!("Indexing project: {} at {}", name, absolute_path.display());
        let start = Instant::now();

        let paths = collect_paths(&absolute_path);
        let total = paths.len() as u64;
        let progress = new_progress_bar(total);

        let extractions = self.extract_all(&absolute_path, paths, &progress).await;
        progress.finish_and_clear();

        let mut stats = IndexStats::default();
        let mut snapshot = ExtractionSnapshot::new(current_timestamp_rfc3339());
        let mut next_file_id: HashMap<String, u64> = HashMap::new();

        // Assign file ids deterministically up front so relationship resolution can
        // see every file before any store round-trip (§4.5 step 2). File ids reuse the
        // same path hash that seeds each file's block id allocator.
        for extraction in &extractions {
            let file_id = hash_path(&extraction.relative_path) as u64;
            next_file_id.insert(extraction.relative_path.clone(), file_id);
        }

        for extraction in extractions {
            let file_id = next_file_id[&extraction.relative_path];
            if extraction.unsupported {
                stats.files_unsupported += 1;
            } else {
                stats.files_indexed += 1;
                stats.blocks_extracted += extraction.blocks.len() as u64;
            }

            let data = if extraction.unsupported {
                FileData::unsupported(file_id, &extraction.relative_path, extraction.language)
            } else {
                let mut data = FileData::new(
                    file_id,
                    &extraction.relative_path,
                    extraction.language,
                    &extraction.content,
                    &extraction.content_hash,
                );
                data.blocks = extraction.blocks;
                data
            };
            snapshot.insert(extraction.relative_path.clone(), data);
        }

        // Relationship-resolution barrier (§4.4, §5): begins only after every file's
        // blocks and id are visible, via the registry built from the full snapshot.
        let registry = ModuleRegistry::build(&snapshot.files);
        let mut relationships_by_file: HashMap<String, Vec<RelationshipEdge>> = HashMap::new();

        for (path, data) in snapshot.files.iter() {
            if data.unsupported {
                continue;
            }
            let Some(extractor) = self.relationship_extractors.get(&data.language) else {
                continue;
            };
            let mut edges = Vec::new();
            for block in data.blocks.iter().filter(|b| b.block_type() == BlockType::Import) {
                let Some(parsed) = extractor.parse_import(block.content()) else {
                    continue;
                };
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
            if !edges.is_empty() {
                stats.relationships_extracted += edges.len() as u64;
                relationships_by_file.insert(path.clone(), edges);
            }
        }

        for (path, edges) in &relationships_by_file {
            if let Some(data) = snapshot.files.get_mut(path) {
                data.relationships = edges.clone();
            }
        }

        // Persist everything: project already exists, now files/blocks/edges/embeddings.
        for (path, data) in snapshot.files.iter() {
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

        write_snapshot(&self.parser_results_dir, &name, &timestamp_compact(), &snapshot).await?;

        let elapsed = start.elapsed();
        info!(
            "Indexing complete: {} files ({} unsupported), {} blocks, {} relationships in {:.2}s",
            stats.files_indexed,
            stats.files_unsupported,
            stats.blocks_extracted,
            stats.relationships_extracted,
            elapsed.as_secs_f64()
        );

        Ok((project, stats))
    }

    async fn extract_all(
        &self,
        absolute_path: &Path,
        paths: Vec<PathBuf>,
        progress: &ProgressBar,
    ) -> Vec<FileExtraction> {
        let concurrency = self.concurrency;
        let extractors = &self.extractors;

        stream::iter(paths)
            .map(|path| async move {
                let relative_path = path
                    .strip_prefix(absolute_path)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                let language = Language::language_of(&path);

                let result = self.extract_one(&path, &relative_path, language, extractors).await;
                progress.inc(1);
                result
            })
            .buffer_unordered(concurrency)
            .collect()
            .await
    }

    async fn extract_one(
        &self,
        path: &Path,
        relative_path: &str,
        language: Language,
        extractors: &HashMap<Language, Arc<dyn LanguageExtractor>>,
    ) -> FileExtraction {
        let content = match tokio::fs::read(path).await {
            Ok(bytes) => match decode_text(&bytes) {
                Some(text) => text,
                None => {
                    debug!("Skipping binary or undecodable file: {}", relative_path);
                    return FileExtraction {
                        relative_path: relative_path.to_string(),
                        language,
                        content: String::new(),
                        content_hash: String::new(),
                        blocks: Vec::new(),
                        unsupported: true,
                    };
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", relative_path, e);
                return FileExtraction {
                    relative_path: relative_path.to_string(),
                    language,
                    content: String::new(),
                    content_hash: String::new(),
                    blocks: Vec::new(),
                    unsupported: true,
                };
            }
        };

        let content_hash = compute_content_hash(content.as_bytes());

        let Some(extractor) = extractors.get(&language) else {
            return FileExtraction {
                relative_path: relative_path.to_string(),
                language,
                content,
                content_hash,
                blocks: Vec::new(),
                unsupported: true,
            };
        };

        let mut allocator = BlockIdAllocator::new(relative_path);
        match extractor.extract_all(&content, &mut allocator).await {
            Ok(blocks) => FileExtraction {
                relative_path: relative_path.to_string(),
                language,
                content,
                content_hash,
                blocks,
                unsupported: false,
            },
            Err(e) => {
                warn!("Failed to parse {}: {}", relative_path, e);
                FileExtraction {
                    relative_path: relative_path.to_string(),
                    language,
                    content,
                    content_hash,
                    blocks: Vec::new(),
                    unsupported: true,
                }
            }
        }
    }
}

fn collect_paths(root: &Path) -> Vec<PathBuf> {
    WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(|entry| {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                let name = entry.file_name().to_string_lossy();
                return !is_ignored_dir(&name);
            }
            true
        })
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            !is_ignored_file(&name)
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn new_progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.green} {bar:40.green/dim} {pos}/{len} {msg:.dim}")
            .expect("invalid progress bar template")
            .progress_chars("━━─"),
    );
    bar
}

fn current_timestamp_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn timestamp_compact() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignored_dir_basenames() {
        assert!(is_ignored_dir("node_modules"));
        assert!(is_ignored_dir(".git"));
        assert!(!is_ignored_dir("src"));
    }

    #[test]
    fn test_ignored_file_suffixes_and_names() {
        assert!(is_ignored_file("module.pyc"));
        assert!(is_ignored_file("bundle.min.js"));
        assert!(is_ignored_file("Cargo.lock"));
        assert!(!is_ignored_file("main.rs"));
    }
}
