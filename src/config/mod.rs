//! Layered configuration (SPEC_FULL.md §6.3), grounded on `bartolli-codanna`'s
//! `config.rs` (`Settings::load`/`load_from`/`save`/`init_config_file`, figment
//! layering order), restructured around this crate's semantic groups.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "CODEINDEXER_";
const CONFIG_PATH_VAR: &str = "CODEINDEXER_CONFIG";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: PathBuf,
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
    #[serde(default = "default_parser_results_dir")]
    pub parser_results_dir: PathBuf,
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

/// LLM provider credentials are passed through, never read by this crate — only the
/// name of the environment variable holding the key is configured here (§6.3).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub provider: String,
    pub api_key_env_var: String,
}

fn default_database_path() -> PathBuf {
    expand_tilde("~/.codeindexer/index.duckdb")
}
fn default_batch_size() -> usize {
    500
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    100
}
fn default_data_dir() -> PathBuf {
    expand_tilde("~/.codeindexer/data")
}
fn default_sessions_dir() -> PathBuf {
    expand_tilde("~/.codeindexer/sessions")
}
fn default_models_dir() -> PathBuf {
    expand_tilde("~/.codeindexer/models")
}
fn default_parser_results_dir() -> PathBuf {
    expand_tilde("~/.codeindexer/parser-results")
}
fn default_logs_dir() -> PathBuf {
    expand_tilde("~/.codeindexer/logs")
}
fn default_model_path() -> PathBuf {
    expand_tilde("~/.codeindexer/models/embedding.onnx")
}
fn default_max_sequence_length() -> usize {
    512
}
fn default_dimensions() -> usize {
    384
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sessions_dir: default_sessions_dir(),
            models_dir: default_models_dir(),
            parser_results_dir: default_parser_results_dir(),
            logs_dir: default_logs_dir(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            max_sequence_length: default_max_sequence_length(),
            dimensions: default_dimensions(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: None,
        }
    }
}

/// Expands a leading `~` to the invoking user's home directory (§6.3). Paths without
/// a leading `~` pass through unchanged.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

impl Settings {
    /// Loads configuration from `CODEINDEXER_CONFIG` (falling back to
    /// `~/.codeindexer/config.toml`), creating the file on first run if missing.
    pub fn load() -> Result<Self, figment::Error> {
        let path = Self::config_path();
        Self::load_from(path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| expand_tilde("~/.codeindexer/config.toml"))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Writes a default config file at `config_path()` if one doesn't already exist.
    pub fn check_init() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = Self::config_path();
        if !path.exists() {
            Settings::default().save(&path)?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.database.batch_size, 500);
        assert_eq!(settings.embedding.dimensions, 384);
        assert!(settings.llm.is_none());
    }

    #[test]
    fn test_load_from_toml_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
            [database]
            batch_size = 250
            max_retries = 5

            [embedding]
            dimensions = 768
            "#,
        )
        .unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.database.batch_size, 250);
        assert_eq!(settings.database.max_retries, 5);
        assert_eq!(settings.embedding.dimensions, 768);
        // Untouched groups keep their defaults.
        assert_eq!(settings.database.retry_backoff_ms, 100);
    }

    #[test]
    fn test_save_and_reload_round_trips() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.database.batch_size = 42;
        settings.save(&config_path).unwrap();

        let reloaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(reloaded.database.batch_size, 42);
    }

    #[test]
    fn test_expand_tilde() {
        std::env::set_var("HOME", "/home/tester");
        assert_eq!(expand_tilde("~/x/y"), PathBuf::from("/home/tester/x/y"));
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
