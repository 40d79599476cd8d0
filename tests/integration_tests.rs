//! End-to-end tests for the indexing and reconciliation pipeline (SPEC_FULL.md
//! §8, scenarios 1-6 plus a handful of the listed invariants), following the
//! teacher's `tests/integration_tests.rs` shape: a small scratch project under
//! `tempfile::TempDir`, an in-memory store, and assertions against store contents.

use std::collections::HashMap;
use std::sync::Arc;

use codeindexer::application::interfaces::{EmbeddingSink, LanguageExtractor, RelationshipExtractor, Store};
use codeindexer::application::{IndexProjectUseCase, ReconcileProjectUseCase};
use codeindexer::connector::adapter::ParserCache;
use codeindexer::connector::embedding::MockEmbeddingSink;
use codeindexer::connector::extractors::{PythonExtractor, RustExtractor};
use codeindexer::connector::relationships::PythonRelationshipExtractor;
use codeindexer::connector::store::DuckdbStore;
use codeindexer::domain::{file_node_id, Language};
use tempfile::TempDir;

fn python_environment() -> (
    HashMap<Language, Arc<dyn LanguageExtractor>>,
    HashMap<Language, Arc<dyn RelationshipExtractor>>,
) {
    let parser_cache = Arc::new(ParserCache::new());
    let extractors: HashMap<Language, Arc<dyn LanguageExtractor>> = HashMap::from([
        (Language::Python, Arc::new(PythonExtractor::new(parser_cache.clone())) as Arc<dyn LanguageExtractor>),
        (Language::Rust, Arc::new(RustExtractor::new(parser_cache)) as Arc<dyn LanguageExtractor>),
    ]);
    let relationship_extractors: HashMap<Language, Arc<dyn RelationshipExtractor>> = HashMap::from([(
        Language::Python,
        Arc::new(PythonRelationshipExtractor) as Arc<dyn RelationshipExtractor>,
    )]);
    (extractors, relationship_extractors)
}

fn new_store() -> Arc<dyn Store> {
    Arc::new(DuckdbStore::in_memory(500, 3, 50).expect("failed to open in-memory store"))
}

/// Scenario 1: a single Python file, one class, two methods.
#[tokio::test]
async fn single_python_file_one_class_two_methods() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("a.py"),
        "class A:\n    def f(self):\n        pass\n    def g(self):\n        pass\n",
    )
    .unwrap();

    let (extractors, relationship_extractors) = python_environment();
    let store = new_store();
    let embedding_sink: Arc<dyn EmbeddingSink> = Arc::new(MockEmbeddingSink::new());
    let results_dir = dir.path().join("parser-results");

    let use_case =
        IndexProjectUseCase::new(store.clone(), embedding_sink, extractors, relationship_extractors, results_dir, 2);

    let (project, stats) = use_case.execute(dir.path(), Some("scenario1"), false).await.unwrap();

    assert_eq!(stats.files_indexed, 1);
    assert_eq!(stats.relationships_extracted, 0);

    assert!(store.find_file_id(project.id(), "a.py").await.unwrap().is_some());
    let hashes = store.get_file_hashes(project.id()).await.unwrap();
    assert_eq!(hashes.len(), 1);
    assert!(hashes.contains_key("a.py"));
}

/// Scenario 2: relative import resolution between two files in a package.
#[tokio::test]
async fn relative_import_resolves_to_target_file() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
    std::fs::write(dir.path().join("pkg/a.py"), "from .b import B\n").unwrap();
    std::fs::write(dir.path().join("pkg/b.py"), "class B:\n    pass\n").unwrap();

    let (extractors, relationship_extractors) = python_environment();
    let store = new_store();
    let embedding_sink: Arc<dyn EmbeddingSink> = Arc::new(MockEmbeddingSink::new());
    let results_dir = dir.path().join("parser-results");

    let use_case =
        IndexProjectUseCase::new(store.clone(), embedding_sink, extractors, relationship_extractors, results_dir, 2);

    let (_project, stats) = use_case.execute(dir.path(), Some("scenario2"), false).await.unwrap();

    assert_eq!(stats.files_indexed, 2);
    assert_eq!(stats.relationships_extracted, 1);
}

/// Scenario 4: incrementally modifying one file out of three leaves the others
/// untouched and replaces only the changed file's embeddings.
#[tokio::test]
async fn incremental_modify_reports_single_changed_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();
    std::fs::write(dir.path().join("b.py"), "def g():\n    pass\n").unwrap();
    std::fs::write(dir.path().join("c.py"), "def h():\n    pass\n").unwrap();

    let (extractors, relationship_extractors) = python_environment();
    let store = new_store();
    let embedding_sink: Arc<dyn EmbeddingSink> = Arc::new(MockEmbeddingSink::new());
    let results_dir = dir.path().join("parser-results");

    let index_use_case = IndexProjectUseCase::new(
        store.clone(),
        embedding_sink.clone(),
        extractors.clone(),
        relationship_extractors.clone(),
        results_dir.clone(),
        2,
    );
    let (project, _) = index_use_case.execute(dir.path(), Some("scenario4"), false).await.unwrap();

    let hashes_before = store.get_file_hashes(project.id()).await.unwrap();

    std::fs::write(dir.path().join("b.py"), "def g():\n    return 1\n").unwrap();

    let reconcile_use_case =
        ReconcileProjectUseCase::new(store.clone(), embedding_sink, extractors, relationship_extractors, results_dir);
    let stats = reconcile_use_case.execute("scenario4").await.unwrap();

    assert_eq!(stats.files_changed, 1);
    assert_eq!(stats.files_added, 0);
    assert_eq!(stats.files_deleted, 0);

    let hashes_after = store.get_file_hashes(project.id()).await.unwrap();
    assert_eq!(hashes_before.get("a.py"), hashes_after.get("a.py"));
    assert_eq!(hashes_before.get("c.py"), hashes_after.get("c.py"));
    assert_ne!(hashes_before.get("b.py"), hashes_after.get("b.py"));
}

/// Scenario 5: deleting a file from disk removes its blocks/edges/embeddings on
/// reconcile (P8 deletion closure).
#[tokio::test]
async fn incremental_delete_removes_file_and_embeddings() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
    std::fs::write(dir.path().join("pkg/a.py"), "from .b import B\n").unwrap();
    std::fs::write(dir.path().join("pkg/b.py"), "class B:\n    pass\n").unwrap();

    let (extractors, relationship_extractors) = python_environment();
    let store = new_store();
    let embedding_sink = Arc::new(MockEmbeddingSink::new());
    let embedding_sink_dyn: Arc<dyn EmbeddingSink> = embedding_sink.clone();
    let results_dir = dir.path().join("parser-results");

    let index_use_case = IndexProjectUseCase::new(
        store.clone(),
        embedding_sink_dyn.clone(),
        extractors.clone(),
        relationship_extractors.clone(),
        results_dir.clone(),
        2,
    );
    let (project, _) = index_use_case.execute(dir.path(), Some("scenario5"), false).await.unwrap();

    let b_file_id = store.find_file_id(project.id(), "pkg/b.py").await.unwrap().unwrap();
    assert!(embedding_sink.get(&file_node_id(b_file_id)).await.is_some());

    std::fs::remove_file(dir.path().join("pkg/b.py")).unwrap();

    let reconcile_use_case = ReconcileProjectUseCase::new(
        store.clone(),
        embedding_sink_dyn,
        extractors,
        relationship_extractors,
        results_dir,
    );
    let stats = reconcile_use_case.execute("scenario5").await.unwrap();

    assert_eq!(stats.files_deleted, 1);

    let hashes = store.get_file_hashes(project.id()).await.unwrap();
    assert!(!hashes.contains_key("pkg/b.py"));
    assert!(store.find_file_id(project.id(), "pkg/b.py").await.unwrap().is_none());
    assert!(embedding_sink.get(&file_node_id(b_file_id)).await.is_none());
}

/// Scenario 6: an unsupported file gets a row with no blocks, and a reconcile
/// pass with no content change triggers no rewrite.
#[tokio::test]
async fn unsupported_file_survives_indexing_and_reconcile() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("README.md"), "# hello\n").unwrap();

    let (extractors, relationship_extractors) = python_environment();
    let store = new_store();
    let embedding_sink: Arc<dyn EmbeddingSink> = Arc::new(MockEmbeddingSink::new());
    let results_dir = dir.path().join("parser-results");

    let index_use_case = IndexProjectUseCase::new(
        store.clone(),
        embedding_sink.clone(),
        extractors.clone(),
        relationship_extractors.clone(),
        results_dir.clone(),
        2,
    );
    let (project, stats) = index_use_case.execute(dir.path(), Some("scenario6"), false).await.unwrap();

    assert_eq!(stats.files_unsupported, 1);
    assert_eq!(stats.files_indexed, 0);

    assert!(store.find_file_id(project.id(), "README.md").await.unwrap().is_some());

    let reconcile_use_case =
        ReconcileProjectUseCase::new(store.clone(), embedding_sink, extractors, relationship_extractors, results_dir);
    let stats = reconcile_use_case.execute("scenario6").await.unwrap();

    assert_eq!(stats.files_added, 0);
    assert_eq!(stats.files_changed, 0);
    assert_eq!(stats.files_deleted, 0);
}

/// P6: running a full index twice over an unchanged tree produces the same file
/// ids and hashes (force-clearing in between, since `IndexProjectUseCase` treats
/// a second call without `force` as a no-op re-use of the existing project).
#[tokio::test]
async fn repeated_full_index_is_deterministic() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();

    let (extractors, relationship_extractors) = python_environment();
    let store = new_store();
    let embedding_sink: Arc<dyn EmbeddingSink> = Arc::new(MockEmbeddingSink::new());
    let results_dir = dir.path().join("parser-results");

    let use_case = IndexProjectUseCase::new(
        store.clone(),
        embedding_sink,
        extractors,
        relationship_extractors,
        results_dir,
        2,
    );

    let (project1, _) = use_case.execute(dir.path(), Some("scenario_p6"), false).await.unwrap();
    let hashes1 = store.get_file_hashes(project1.id()).await.unwrap();
    let id1 = store.find_file_id(project1.id(), "a.py").await.unwrap().unwrap();

    let (project2, _) = use_case.execute(dir.path(), Some("scenario_p6"), true).await.unwrap();
    let hashes2 = store.get_file_hashes(project2.id()).await.unwrap();
    let id2 = store.find_file_id(project2.id(), "a.py").await.unwrap().unwrap();

    assert_eq!(hashes1, hashes2);
    assert_eq!(id1, id2);
}

/// Indexing a Rust file (reusing the project's own parser fixture) produces
/// top-level function and struct blocks.
#[tokio::test]
async fn rust_fixture_produces_function_and_struct_blocks() {
    let dir = TempDir::new().unwrap();
    let fixture = std::fs::read_to_string(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_rust.rs"),
    )
    .unwrap();
    std::fs::write(dir.path().join("lib.rs"), fixture).unwrap();

    let (extractors, relationship_extractors) = python_environment();
    let store = new_store();
    let embedding_sink: Arc<dyn EmbeddingSink> = Arc::new(MockEmbeddingSink::new());
    let results_dir = dir.path().join("parser-results");

    let use_case =
        IndexProjectUseCase::new(store.clone(), embedding_sink, extractors, relationship_extractors, results_dir, 2);

    let (project, stats) = use_case.execute(dir.path(), Some("rust_scenario"), false).await.unwrap();
    assert_eq!(stats.files_indexed, 1);
    assert!(stats.blocks_extracted > 0);

    assert!(store.find_file_id(project.id(), "lib.rs").await.unwrap().is_some());
}

/// `find_project_by_name` round-trips what `IndexProjectUseCase` inserted, and
/// `clear_project` leaves no trace of its file hashes behind.
#[tokio::test]
async fn clear_project_removes_file_hashes() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

    let (extractors, relationship_extractors) = python_environment();
    let store = new_store();
    let embedding_sink: Arc<dyn EmbeddingSink> = Arc::new(MockEmbeddingSink::new());
    let results_dir = dir.path().join("parser-results");

    let use_case =
        IndexProjectUseCase::new(store.clone(), embedding_sink, extractors, relationship_extractors, results_dir, 2);

    let (project, _) = use_case.execute(dir.path(), Some("scenario_clear"), false).await.unwrap();
    assert!(store.find_project_by_name("scenario_clear").await.unwrap().is_some());

    store.clear_project(project.id(), true).await.unwrap();

    let hashes = store.get_file_hashes(project.id()).await.unwrap();
    assert!(hashes.is_empty());
}

/// Blocks extracted for a class are reported with the correct `BlockType` and
/// nested method count end-to-end through the store.
#[tokio::test]
async fn block_types_survive_the_round_trip() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("a.py"),
        "import os\n\nclass A:\n    def f(self):\n        pass\n",
    )
    .unwrap();

    let (extractors, relationship_extractors) = python_environment();
    let store = new_store();
    let embedding_sink: Arc<dyn EmbeddingSink> = Arc::new(MockEmbeddingSink::new());
    let results_dir = dir.path().join("parser-results");

    let use_case =
        IndexProjectUseCase::new(store.clone(), embedding_sink, extractors, relationship_extractors, results_dir, 2);

    let (project, stats) = use_case.execute(dir.path(), Some("scenario_blocks"), false).await.unwrap();
    // import + class (the method is nested, not a separate top-level block)
    assert_eq!(stats.blocks_extracted, 2);
    assert!(store.find_file_id(project.id(), "a.py").await.unwrap().is_some());
}
