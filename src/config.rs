//! Configuration management using the prefer crate for discovery.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::repository::DbContext;
use crate::services::UploadLimits;
use crate::storage::BlobStore;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "marginalia.db";

/// Default documents subdirectory name.
const DOCUMENTS_SUBDIR: &str = "documents";

pub const DEFAULT_MAX_SIZE_MB: u64 = 100;
pub const DEFAULT_PROCESSING_INTERVAL_MINUTES: u64 = 30;

fn default_allowed_extensions() -> Vec<String> {
    vec![".pdf".to_string(), ".xls".to_string(), ".xlsx".to_string()]
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Root for stored uploads.
    pub documents_dir: PathBuf,
    /// Largest accepted upload in MB.
    pub max_size_mb: u64,
    /// Accepted extensions, lowercase with leading dot.
    pub allowed_extensions: Vec<String>,
    /// Minutes between background sweeps.
    pub processing_interval_minutes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marginalia");

        Self {
            documents_dir: data_dir.join(DOCUMENTS_SUBDIR),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            allowed_extensions: default_allowed_extensions(),
            processing_interval_minutes: DEFAULT_PROCESSING_INTERVAL_MINUTES,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            documents_dir: data_dir.join(DOCUMENTS_SUBDIR),
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Interval between sweeps. Never shorter than a minute.
    pub fn processing_interval(&self) -> Duration {
        Duration::from_secs(self.processing_interval_minutes.max(1) * 60)
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits::new(self.max_size_mb, &self.allowed_extensions)
    }

    pub fn blob_store(&self) -> BlobStore {
        BlobStore::new(&self.documents_dir)
    }

    pub fn create_db_context(&self) -> DbContext {
        DbContext::new(&self.database_url())
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })?;
        fs::create_dir_all(&self.documents_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create documents directory '{}': {}",
                    self.documents_dir.display(),
                    e
                ),
            )
        })?;
        Ok(())
    }
}

/// Upload and processing section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_interval_minutes: Option<u64>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default)]
    pub files: FileSettings,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers marginalia config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("marginalia").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Format is chosen by extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
            settings.documents_dir = settings.data_dir.join(DOCUMENTS_SUBDIR);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(max) = self.files.max_size_mb {
            settings.max_size_mb = max;
        }
        if let Some(ref extensions) = self.files.allowed_extensions {
            settings.allowed_extensions = extensions.clone();
        }
        if let Some(minutes) = self.files.processing_interval_minutes {
            settings.processing_interval_minutes = minutes;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Data directory or database file (--data flag).
    pub data: Option<PathBuf>,
}

fn is_db_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
        || path.is_file()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

/// Look for a config file next to the database.
fn find_config_next_to_db(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["toml", "yaml", "yml", "json"];
    let basenames = ["marginalia", "config"];

    for basename in basenames {
        for ext in extensions {
            let path = data_dir.join(format!("{}.{}", basename, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

async fn load_file_config(options: &LoadOptions, data_dir: Option<&Path>) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Config::default()
            });
    }

    // Priority 2: Config next to data dir
    if let Some(dir) = data_dir {
        if let Some(config_path) = find_config_next_to_db(dir) {
            tracing::debug!("Found config next to data dir: {}", config_path.display());
            return Config::load_from_path(&config_path)
                .await
                .unwrap_or_else(|_| Config::default());
        }
    }

    // Priority 3: Auto-discover via prefer
    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings(options: LoadOptions) -> (Settings, Config) {
    let data = options.data.as_deref().map(absolute);
    let (data_dir, database_filename) = match data {
        Some(ref path) if is_db_file(path) => (
            path.parent().map(Path::to_path_buf),
            path.file_name().and_then(|n| n.to_str()).map(String::from),
        ),
        Some(ref path) => (Some(path.clone()), None),
        None => (None, None),
    };

    let config = load_file_config(&options, data_dir.as_deref()).await;

    let mut settings = Settings::default();

    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    config.apply_to_settings(&mut settings, &base_dir);

    // --data override takes precedence for data_dir and documents_dir
    if let Some(dir) = data_dir {
        settings.data_dir = dir;
        settings.documents_dir = settings.data_dir.join(DOCUMENTS_SUBDIR);
    }
    if let Some(filename) = database_filename {
        settings.database_filename = filename;
    }

    // DATABASE_URL environment variable takes highest precedence
    if let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using DATABASE_URL from environment: {}", database_url);
        settings.database_url = Some(database_url);
    }

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("marginalia.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "store"
database = "docs.db"

[files]
max_size_mb = 5
allowed_extensions = [".pdf"]
processing_interval_minutes = 2
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.database.as_deref(), Some("docs.db"));
        assert_eq!(config.files.max_size_mb, Some(5));
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, dir.path());
        assert_eq!(settings.data_dir, dir.path().join("store"));
        assert_eq!(settings.documents_dir, dir.path().join("store").join("documents"));
        assert_eq!(settings.database_path(), dir.path().join("store").join("docs.db"));
        assert_eq!(settings.allowed_extensions, vec![".pdf"]);
        assert_eq!(settings.processing_interval(), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("c.yaml");
        std::fs::write(&yaml, "files:\n  max_size_mb: 7\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.files.max_size_mb, Some(7));
        assert_eq!(config.data_dir, None);

        let json = dir.path().join("c.json");
        std::fs::write(&json, r#"{"database": "x.db"}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.database.as_deref(), Some("x.db"));
        assert_eq!(config.files, FileSettings::default());
    }

    #[tokio::test]
    async fn test_invalid_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "files = [").unwrap();
        assert!(Config::load_from_path(&path).await.is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::with_data_dir(PathBuf::from("/srv/m"));
        assert_eq!(settings.max_size_mb, 100);
        assert_eq!(settings.allowed_extensions, vec![".pdf", ".xls", ".xlsx"]);
        assert_eq!(settings.processing_interval(), Duration::from_secs(30 * 60));
        assert_eq!(settings.database_url(), "sqlite:/srv/m/marginalia.db");
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let mut settings = Settings::default();
        settings.processing_interval_minutes = 0;
        assert_eq!(settings.processing_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_resolve_path() {
        let config = Config::default();
        let base = Path::new("/etc/marginalia");
        assert_eq!(
            config.resolve_path("/abs/data", base),
            PathBuf::from("/abs/data")
        );
        assert_eq!(
            config.resolve_path("rel", base),
            PathBuf::from("/etc/marginalia/rel")
        );
    }

    #[tokio::test]
    async fn test_data_flag_with_db_file() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("custom.db");
        std::fs::write(
            dir.path().join("marginalia.toml"),
            "[files]\nmax_size_mb = 3\n",
        )
        .unwrap();

        let (settings, _) = load_settings(LoadOptions {
            data: Some(db),
            ..Default::default()
        })
        .await;
        assert_eq!(settings.data_dir, dir.path());
        assert_eq!(settings.database_filename, "custom.db");
        assert_eq!(settings.max_size_mb, 3);
    }
}
