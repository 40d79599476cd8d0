use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::{DomainError, ExtractionSnapshot};

/// Writes `snapshot` under `parser_results_dir` as
/// `<project>_extraction_<yyyymmdd_hhmmss>.json` (§6.1), atomically: the document is
/// written to a sibling temp file, fsynced, then renamed into place so a reader never
/// observes a partially written snapshot.
pub async fn write_snapshot(
    parser_results_dir: &Path,
    project_name: &str,
    timestamp_compact: &str,
    snapshot: &ExtractionSnapshot,
) -> Result<PathBuf, DomainError> {
    tokio::fs::create_dir_all(parser_results_dir).await?;

    let file_name = ExtractionSnapshot::file_name(project_name, timestamp_compact);
    let final_path = parser_results_dir.join(&file_name);
    let temp_path = parser_results_dir.join(format!("{file_name}.tmp"));

    let body = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| DomainError::internal(format!("failed to serialize snapshot: {e}")))?;

    let mut file = tokio::fs::File::create(&temp_path).await?;
    file.write_all(&body).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&temp_path, &final_path).await?;
    debug!("Wrote snapshot to {}", final_path.display());

    Ok(final_path)
}

/// Loads the most recent snapshot for `project_name` under `parser_results_dir`, or
/// `Ok(None)` if no snapshot exists yet (§4.7 step 6).
pub async fn read_latest_snapshot(
    parser_results_dir: &Path,
    project_name: &str,
) -> Result<Option<ExtractionSnapshot>, DomainError> {
    let Some(path) = latest_snapshot_path(parser_results_dir, project_name).await? else {
        return Ok(None);
    };

    let body = tokio::fs::read(&path).await?;
    let snapshot: ExtractionSnapshot = serde_json::from_slice(&body)
        .map_err(|e| DomainError::internal(format!("failed to parse snapshot {}: {e}", path.display())))?;
    Ok(Some(snapshot))
}

async fn latest_snapshot_path(
    parser_results_dir: &Path,
    project_name: &str,
) -> Result<Option<PathBuf>, DomainError> {
    if !parser_results_dir.exists() {
        return Ok(None);
    }

    let prefix = format!("{project_name}_extraction_");
    let mut entries = tokio::fs::read_dir(parser_results_dir).await?;
    let mut candidates: Vec<String> = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(&prefix) && name.ends_with(".json") {
                candidates.push(name.to_string());
            }
        }
    }

    candidates.sort();
    Ok(candidates.pop().map(|name| parser_results_dir.join(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExtractionSnapshot;

    #[tokio::test]
    async fn test_write_and_read_latest_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = ExtractionSnapshot::new("2026-07-28T00:00:00Z");

        write_snapshot(dir.path(), "proj", "20260728_000000", &snapshot)
            .await
            .unwrap();

        let loaded = read_latest_snapshot(dir.path(), "proj").await.unwrap();
        assert!(loaded.is_some());
    }

    #[tokio::test]
    async fn test_picks_most_recent_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = ExtractionSnapshot::new("2026-07-28T00:00:00Z");

        write_snapshot(dir.path(), "proj", "20260728_000000", &snapshot)
            .await
            .unwrap();
        write_snapshot(dir.path(), "proj", "20260728_010000", &snapshot)
            .await
            .unwrap();

        let path = latest_snapshot_path(dir.path(), "proj").await.unwrap().unwrap();
        assert!(path.to_string_lossy().contains("20260728_010000"));
    }

    #[tokio::test]
    async fn test_no_snapshot_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = read_latest_snapshot(dir.path(), "proj").await.unwrap();
        assert!(loaded.is_none());
    }
}
