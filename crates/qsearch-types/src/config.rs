//! Configuration loading for queued search.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! Default config file lives at `~/.config/qsearch/config.toml` (or the
//! platform equivalent from `directories`).

use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_NAME: &str = "qsearch";

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to RocksDB storage directory (queue + entity repository)
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Path to the Tantivy search index directory
    #[serde(default = "default_search_index_path")]
    pub search_index_path: String,

    /// Name of the queue drained by `qsearch process`
    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Memory budget for the index writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Entity types that get a registered search index.
    ///
    /// Queue messages for any other type are skipped at flush time.
    #[serde(default)]
    pub indexed_types: Vec<String>,
}

fn data_dir(leaf: &str) -> String {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.data_local_dir().join(leaf))
        .unwrap_or_else(|| PathBuf::from(".").join(leaf))
        .to_string_lossy()
        .to_string()
}

fn default_db_path() -> String {
    data_dir("db")
}

fn default_search_index_path() -> String {
    data_dir("search-index")
}

fn default_queue_name() -> String {
    "search_queue".to_string()
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_writer_memory_mb() -> usize {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            search_index_path: default_search_index_path(),
            queue_name: default_queue_name(),
            log_level: default_log_level(),
            writer_memory_mb: default_writer_memory_mb(),
            indexed_types: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/qsearch/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (QSEARCH_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())?
            .set_default("search_index_path", default_search_index_path())?
            .set_default("queue_name", default_queue_name())?
            .set_default("log_level", default_log_level())?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)?
            .set_default("indexed_types", Vec::<String>::new())?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: QSEARCH_DB_PATH, QSEARCH_QUEUE_NAME, QSEARCH_INDEXED_TYPES=a.b,c.d
        builder = builder.add_source(
            Environment::with_prefix("QSEARCH")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("indexed_types")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "queue_name must not be empty".to_string(),
            ));
        }
        if self.queue_name.contains(':') {
            return Err(ConfigError::Invalid(format!(
                "queue_name must not contain ':', got {}",
                self.queue_name
            )));
        }
        if self.writer_memory_mb == 0 {
            return Err(ConfigError::Invalid(
                "writer_memory_mb must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }

    /// Expand ~ in search_index_path to the home directory
    pub fn expanded_search_index_path(&self) -> PathBuf {
        expand_home(&self.search_index_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.queue_name, "search_queue");
        assert_eq!(settings.log_level, "error");
        assert_eq!(settings.writer_memory_mb, 50);
        assert!(settings.indexed_types.is_empty());
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.writer_memory_mb, 50);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "queue_name = \"blog_queue\"\nlog_level = \"debug\"\nindexed_types = [\"blog.post\", \"blog.comment\"]"
        )
        .unwrap();

        let settings = Settings::load(Some(&file.path().to_string_lossy())).unwrap();
        assert_eq!(settings.queue_name, "blog_queue");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.indexed_types, vec!["blog.post", "blog.comment"]);
    }

    #[test]
    fn test_load_missing_cli_file_fails() {
        assert!(Settings::load(Some("/nonexistent/qsearch-config.toml")).is_err());
    }

    #[test]
    fn test_validate() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.queue_name = "  ".to_string();
        assert!(settings.validate().is_err());

        settings.queue_name = "a:b".to_string();
        assert!(settings.validate().is_err());

        settings.queue_name = "ok".to_string();
        settings.writer_memory_mb = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/lib/qsearch"), PathBuf::from("/var/lib/qsearch"));
        if BaseDirs::new().is_some() {
            assert!(!expand_home("~/db").starts_with("~"));
        }
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings {
            indexed_types: vec!["a".to_string()],
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.indexed_types, vec!["a"]);
        assert_eq!(decoded.queue_name, "search_queue");
    }
}
