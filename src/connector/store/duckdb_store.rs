use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::application::interfaces::Store;
use crate::domain::{hash_path, CodeBlock, DomainError, Language, Project, RelationshipEdge};

/// DuckDB-backed [`Store`] (SPEC_FULL.md §4.6), grounded on
/// `DuckdbMetadataRepository`/`DuckdbFileHashRepository`'s schema-on-connect +
/// `ON CONFLICT DO UPDATE` + shared-connection pattern. File and block ids are
/// computed upstream by the caller (`hash_path`-derived), never store-assigned —
/// `upsert_file` recomputes the same deterministic id from `file_path` so it never
/// depends on its own return value, matching how `IndexProjectUseCase`/
/// `ReconcileProjectUseCase` actually call it.
pub struct DuckdbStore {
    conn: Arc<Mutex<Connection>>,
    batch_size: usize,
    max_retries: u32,
    retry_backoff: Duration,
}

impl DuckdbStore {
    pub fn new(db_path: &Path, batch_size: usize, max_retries: u32, retry_backoff_ms: u64) -> Result<Self, DomainError> {
        let conn = Connection::open(db_path)
            .map_err(|e| DomainError::storage(format!("failed to open DuckDB database: {e}")))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            batch_size,
            max_retries,
            retry_backoff: Duration::from_millis(retry_backoff_ms),
        })
    }

    pub fn in_memory(batch_size: usize, max_retries: u32, retry_backoff_ms: u64) -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DomainError::storage(format!("failed to open in-memory DuckDB: {e}")))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            batch_size,
            max_retries,
            retry_backoff: Duration::from_millis(retry_backoff_ms),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                path TEXT NOT NULL,
                language TEXT,
                version TEXT,
                description TEXT,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                source_file TEXT
            );

            CREATE TABLE IF NOT EXISTS files (
                id BIGINT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                file_path TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                language TEXT NOT NULL,
                size BIGINT,
                unsupported BOOLEAN NOT NULL DEFAULT FALSE,
                UNIQUE (project_id, file_path)
            );
            CREATE INDEX IF NOT EXISTS idx_files_project_path ON files(project_id, file_path);
            CREATE INDEX IF NOT EXISTS idx_files_content_hash ON files(content_hash);

            CREATE TABLE IF NOT EXISTS code_blocks (
                id BIGINT PRIMARY KEY,
                file_id BIGINT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
                parent_id BIGINT,
                block_type TEXT NOT NULL,
                name TEXT NOT NULL,
                content TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                start_col INTEGER NOT NULL,
                end_col INTEGER NOT NULL,
                properties TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_code_blocks_file ON code_blocks(file_id);
            CREATE INDEX IF NOT EXISTS idx_code_blocks_name ON code_blocks(name);

            CREATE TABLE IF NOT EXISTS relationships (
                id BIGINT PRIMARY KEY,
                source_id BIGINT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
                target_id BIGINT,
                kind TEXT NOT NULL,
                import_content TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_relationships_source ON relationships(source_id);
            CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships(target_id);
            "#,
        )
        .map_err(|e| DomainError::storage(format!("failed to initialize schema: {e}")))?;

        debug!("DuckDB indexer schema initialized");
        Ok(())
    }

    /// Retries `f` up to `max_retries` times when it returns a transient storage
    /// error, sleeping `retry_backoff` between attempts (§5).
    async fn with_retry<T, F, Fut>(&self, f: F) -> Result<T, DomainError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) if is_transient(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, "transient store error, retrying: {e}");
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn flatten_with_parent(block: &CodeBlock, parent_id: Option<u64>, out: &mut Vec<(u64, Option<u64>, CodeBlock)>) {
        out.push((block.id(), parent_id, block.clone()));
        for child in block.children() {
            Self::flatten_with_parent(child, Some(block.id()), out);
        }
    }
}

fn is_transient(err: &DomainError) -> bool {
    matches!(err, DomainError::StorageError { transient: true, .. })
}

#[async_trait]
impl Store for DuckdbStore {
    async fn insert_project(&self, project: &Project) -> Result<(), DomainError> {
        self.with_retry(|| async {
            let conn = self.conn.lock().await;
            conn.execute(
                r#"
                INSERT INTO projects (id, name, path, language, version, description, created_at, updated_at, source_file)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    path = excluded.path,
                    language = excluded.language,
                    version = excluded.version,
                    description = excluded.description,
                    updated_at = excluded.updated_at,
                    source_file = excluded.source_file
                "#,
                params![
                    project.id(),
                    project.name(),
                    project.path(),
                    project.language(),
                    project.version(),
                    project.description(),
                    project.created_at(),
                    project.updated_at(),
                    project.source_file(),
                ],
            )
            .map_err(classify)?;
            Ok(())
        })
        .await
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, DomainError> {
        let conn = self.conn.lock().await;
        query_project(&conn, "SELECT id, name, path, language, version, description, created_at, updated_at, source_file FROM projects WHERE name = ?1", name)
    }

    async fn find_project_by_id(&self, id: &str) -> Result<Option<Project>, DomainError> {
        let conn = self.conn.lock().await;
        query_project(&conn, "SELECT id, name, path, language, version, description, created_at, updated_at, source_file FROM projects WHERE id = ?1", id)
    }

    async fn upsert_file(
        &self,
        project_id: &str,
        file_path: &str,
        content_hash: &str,
        language: Language,
        size: Option<u64>,
        unsupported: bool,
    ) -> Result<u64, DomainError> {
        let file_id = hash_path(file_path) as u64;
        self.with_retry(|| async {
            let conn = self.conn.lock().await;
            conn.execute(
                r#"
                INSERT INTO files (id, project_id, file_path, content_hash, language, size, unsupported)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT (project_id, file_path) DO UPDATE SET
                    content_hash = excluded.content_hash,
                    language = excluded.language,
                    size = excluded.size,
                    unsupported = excluded.unsupported
                "#,
                params![
                    file_id as i64,
                    project_id,
                    file_path,
                    content_hash,
                    language.as_str(),
                    size.map(|s| s as i64),
                    unsupported,
                ],
            )
            .map_err(classify)?;
            Ok(())
        })
        .await?;
        Ok(file_id)
    }

    async fn find_file_id(&self, project_id: &str, file_path: &str) -> Result<Option<u64>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT id FROM files WHERE project_id = ?1 AND file_path = ?2")
            .map_err(|e| DomainError::storage(format!("failed to prepare statement: {e}")))?;

        match stmt.query_row(params![project_id, file_path], |row| row.get::<_, i64>(0)) {
            Ok(id) => Ok(Some(id as u64)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!("failed to query file id: {e}"))),
        }
    }

    async fn bulk_insert_blocks(&self, file_id: u64, blocks: &[CodeBlock]) -> Result<(), DomainError> {
        if blocks.is_empty() {
            return Ok(());
        }

        let mut flat = Vec::new();
        for block in blocks {
            Self::flatten_with_parent(block, None, &mut flat);
        }

        for chunk in flat.chunks(self.batch_size) {
            self.with_retry(|| async {
                let mut conn = self.conn.lock().await;
                let tx = conn.transaction().map_err(classify)?;
                {
                    let mut stmt = tx
                        .prepare(
                            r#"
                            INSERT INTO code_blocks (id, file_id, parent_id, block_type, name, content, start_line, end_line, start_col, end_col, properties)
                            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                            ON CONFLICT (id) DO UPDATE SET
                                file_id = excluded.file_id,
                                parent_id = excluded.parent_id,
                                block_type = excluded.block_type,
                                name = excluded.name,
                                content = excluded.content,
                                start_line = excluded.start_line,
                                end_line = excluded.end_line,
                                start_col = excluded.start_col,
                                end_col = excluded.end_col,
                                properties = excluded.properties
                            "#,
                        )
                        .map_err(classify)?;

                    for (id, parent_id, block) in chunk {
                        let properties = serde_json::to_string(block.symbols()).ok();
                        stmt.execute(params![
                            *id as i64,
                            file_id as i64,
                            parent_id.map(|p| p as i64),
                            block.block_type().as_str(),
                            block.name(),
                            block.content(),
                            block.start_line(),
                            block.end_line(),
                            block.start_col(),
                            block.end_col(),
                            properties,
                        ])
                        .map_err(classify)?;
                    }
                }
                tx.commit().map_err(classify)?;
                Ok(())
            })
            .await?;
        }

        Ok(())
    }

    async fn bulk_insert_relationships(&self, source_file_id: u64, edges: &[RelationshipEdge]) -> Result<(), DomainError> {
        if edges.is_empty() {
            return Ok(());
        }

        for chunk in edges.chunks(self.batch_size) {
            self.with_retry(|| async {
                let mut conn = self.conn.lock().await;
                let tx = conn.transaction().map_err(classify)?;
                {
                    let mut stmt = tx
                        .prepare(
                            r#"
                            INSERT INTO relationships (id, source_id, target_id, kind, import_content)
                            VALUES (?1, ?2, ?3, ?4, ?5)
                            ON CONFLICT (id) DO UPDATE SET
                                source_id = excluded.source_id,
                                target_id = excluded.target_id,
                                kind = excluded.kind,
                                import_content = excluded.import_content
                            "#,
                        )
                        .map_err(classify)?;

                    for edge in chunk {
                        let id = next_relationship_id(edge.source_id, edge.target_id, &edge.import_content);
                        stmt.execute(params![
                            id as i64,
                            source_file_id as i64,
                            edge.target_id as i64,
                            "import",
                            edge.import_content,
                        ])
                        .map_err(classify)?;
                    }
                }
                tx.commit().map_err(classify)?;
                Ok(())
            })
            .await?;
        }

        Ok(())
    }

    async fn delete_file(&self, file_id: u64) -> Result<(), DomainError> {
        self.with_retry(|| async {
            let conn = self.conn.lock().await;
            conn.execute("DELETE FROM relationships WHERE target_id = ?1", params![file_id as i64])
                .map_err(classify)?;
            conn.execute("DELETE FROM files WHERE id = ?1", params![file_id as i64])
                .map_err(classify)?;
            Ok(())
        })
        .await
    }

    async fn get_file_hashes(&self, project_id: &str) -> Result<HashMap<String, String>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT file_path, content_hash FROM files WHERE project_id = ?1")
            .map_err(|e| DomainError::storage(format!("failed to prepare statement: {e}")))?;

        let rows = stmt
            .query_map(params![project_id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| DomainError::storage(format!("failed to query file hashes: {e}")))?;

        let mut map = HashMap::new();
        for row in rows {
            let (path, hash) = row.map_err(|e| DomainError::storage(format!("failed to read row: {e}")))?;
            map.insert(path, hash);
        }
        Ok(map)
    }

    async fn clear_project(&self, project_id: &str, force: bool) -> Result<(), DomainError> {
        self.with_retry(|| async {
            let conn = self.conn.lock().await;
            if !force {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM files WHERE project_id = ?1", params![project_id], |row| row.get(0))
                    .map_err(classify)?;
                if count == 0 {
                    return Ok(());
                }
            }
            conn.execute("DELETE FROM files WHERE project_id = ?1", params![project_id])
                .map_err(classify)?;
            conn.execute("DELETE FROM projects WHERE id = ?1", params![project_id])
                .map_err(classify)?;
            Ok(())
        })
        .await
    }
}

fn query_project(conn: &Connection, sql: &str, key: &str) -> Result<Option<Project>, DomainError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DomainError::storage(format!("failed to prepare statement: {e}")))?;

    match stmt.query_row(params![key], |row| {
        Ok(Project::reconstitute(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
        ))
    }) {
        Ok(project) => Ok(Some(project)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DomainError::storage(format!("failed to query project: {e}"))),
    }
}

/// Relationship row ids don't need the block-id scheme's collision guarantees — a
/// relationship is uniquely identified by (source, target, import text), so a simple
/// FNV-style fold of the triple is sufficient as a primary key. `import_content` must be
/// folded in: a file with two imports resolving to the same target (e.g. `import pkg` and
/// `from pkg import thing`) would otherwise collide on (source, target) alone.
fn next_relationship_id(source_id: u64, target_id: u64, import_content: &str) -> u64 {
    let mut hash = source_id ^ 0x9E37_79B9_7F4A_7C15;
    hash = hash.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    hash ^= target_id;
    hash = hash.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    for byte in import_content.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01B3);
    }
    hash
}

fn classify(e: duckdb::Error) -> DomainError {
    let message = e.to_string();
    let transient = message.to_lowercase().contains("lock") || message.to_lowercase().contains("busy");
    DomainError::StorageError { message, transient }
}
