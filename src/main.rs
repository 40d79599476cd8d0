//! `codeindexer` CLI entry point: wires the connector adapters into the two use
//! cases and dispatches on the subcommand (SPEC_FULL.md §6.4).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use codeindexer::application::interfaces::{EmbeddingSink, LanguageExtractor, RelationshipExtractor, Store};
use codeindexer::application::{IndexProjectUseCase, ReconcileProjectUseCase};
use codeindexer::cli::{Cli, Commands};
use codeindexer::config::Settings;
use codeindexer::connector::adapter::ParserCache;
use codeindexer::connector::embedding::MockEmbeddingSink;
use codeindexer::connector::extractors::{
    GoExtractor, JavaScriptExtractor, PythonExtractor, RustExtractor, TypeScriptExtractor,
};
use codeindexer::connector::relationships::{
    GoRelationshipExtractor, JavaScriptRelationshipExtractor, PythonRelationshipExtractor,
    RustRelationshipExtractor, TypeScriptRelationshipExtractor,
};
use codeindexer::connector::store::DuckdbStore;
use codeindexer::domain::Language;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install tracing subscriber")?;

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path).context("failed to load configuration")?,
        None => Settings::load().context("failed to load configuration")?,
    };

    if let Err(e) = run(&cli, &settings).await {
        error!("{e:#}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    let parser_cache = Arc::new(ParserCache::new());

    let extractors: HashMap<Language, Arc<dyn LanguageExtractor>> = HashMap::from([
        (Language::Python, Arc::new(PythonExtractor::new(parser_cache.clone())) as Arc<dyn LanguageExtractor>),
        (Language::JavaScript, Arc::new(JavaScriptExtractor::new(parser_cache.clone())) as Arc<dyn LanguageExtractor>),
        (Language::TypeScript, Arc::new(TypeScriptExtractor::new(parser_cache.clone())) as Arc<dyn LanguageExtractor>),
        (Language::Go, Arc::new(GoExtractor::new(parser_cache.clone())) as Arc<dyn LanguageExtractor>),
        (Language::Rust, Arc::new(RustExtractor::new(parser_cache.clone())) as Arc<dyn LanguageExtractor>),
    ]);

    let relationship_extractors: HashMap<Language, Arc<dyn RelationshipExtractor>> = HashMap::from([
        (Language::Python, Arc::new(PythonRelationshipExtractor) as Arc<dyn RelationshipExtractor>),
        (Language::JavaScript, Arc::new(JavaScriptRelationshipExtractor) as Arc<dyn RelationshipExtractor>),
        (Language::TypeScript, Arc::new(TypeScriptRelationshipExtractor) as Arc<dyn RelationshipExtractor>),
        (Language::Go, Arc::new(GoRelationshipExtractor) as Arc<dyn RelationshipExtractor>),
        (Language::Rust, Arc::new(RustRelationshipExtractor) as Arc<dyn RelationshipExtractor>),
    ]);

    std::fs::create_dir_all(&settings.storage.parser_results_dir)
        .context("failed to create parser results directory")?;
    if let Some(parent) = settings.database.path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let store: Arc<dyn Store> = Arc::new(
        DuckdbStore::new(
            &settings.database.path,
            settings.database.batch_size,
            settings.database.max_retries,
            settings.database.retry_backoff_ms,
        )
        .context("failed to open store")?,
    );
    let embedding_sink: Arc<dyn EmbeddingSink> =
        Arc::new(MockEmbeddingSink::with_dimensions(settings.embedding.dimensions));

    match &cli.command {
        Commands::Index { path, project_name, force } => {
            let root = PathBuf::from(path);
            if !root.is_dir() {
                anyhow::bail!("'{}' is not a directory", root.display());
            }

            let use_case = IndexProjectUseCase::new(
                store,
                embedding_sink,
                extractors,
                relationship_extractors,
                settings.storage.parser_results_dir.clone(),
                num_cpus(),
            );

            let (project, stats) = use_case
                .execute(&root, project_name.as_deref(), *force)
                .await
                .context("indexing failed")?;

            info!(
                "Indexed '{}': {} files ({} unsupported), {} blocks, {} relationships",
                project.name(),
                stats.files_indexed,
                stats.files_unsupported,
                stats.blocks_extracted,
                stats.relationships_extracted
            );
        }

        Commands::Reindex { project_name } => {
            let use_case = ReconcileProjectUseCase::new(
                store,
                embedding_sink,
                extractors,
                relationship_extractors,
                settings.storage.parser_results_dir.clone(),
            );

            let stats = use_case.execute(project_name).await.context("reconcile failed")?;

            info!(
                "Reconciled '{}': +{} ~{} -{} files, +{} -{} nodes, +{} -{} relationships",
                project_name,
                stats.files_added,
                stats.files_changed,
                stats.files_deleted,
                stats.nodes_added,
                stats.nodes_deleted,
                stats.relationships_added,
                stats.relationships_deleted
            );
        }
    }

    Ok(())
}

fn num_cpus() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}
