//! Configuration loading and resolution
//!
//! Settings are resolved once at startup in priority order:
//! 1. Command-line arguments
//! 2. Environment variables (`MIRA_*`, read by the binary's argument parser)
//! 3. TOML config file (`--config`, else `~/.config/mira/config.toml`)
//! 4. Compiled defaults
//!
//! Items 1 and 2 arrive together as [`ConfigOverrides`]; the TOML layer is
//! [`TomlConfig`]. [`ReviewConfig::resolve`] merges them.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default HTTP bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5080;

/// Largest accepted upload body (16 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Remote sheet cache lifetime
pub const DEFAULT_SHEET_CACHE_TTL_SECS: u64 = 300;

/// Secret used when none is configured; startup warns about it
pub const DEFAULT_SECRET_KEY: &str = "dev-key-change-in-production";

/// Spreadsheet extensions accepted by the importer
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

/// Bootstrap configuration loaded from a TOML file
///
/// Every field is optional; absent values fall through to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,
    #[serde(default)]
    pub allowed_extensions: Option<Vec<String>>,
    /// URL of the external review spreadsheet
    #[serde(default)]
    pub sheets_url: Option<String>,
    /// JSON file holding the spreadsheet API access token
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub sheet_cache_ttl_secs: Option<u64>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// File this layer was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl TomlConfig {
    /// Path of the file that stores `secret_key`, if any
    ///
    /// Loading happens before logging is set up, so the caller reports this.
    pub fn secret_source(&self) -> Option<&Path> {
        self.secret_key.as_ref().and(self.source.as_deref())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub level: Option<String>,
}

/// Values supplied on the command line or through `MIRA_*` environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub secret_key: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
    pub allowed_extensions: Option<Vec<String>>,
    pub sheets_url: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub sheet_cache_ttl_secs: Option<u64>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration, built once and passed explicitly
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub secret_key: String,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Lowercase extensions without the leading dot
    pub allowed_extensions: Vec<String>,
    pub sheets_url: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub database_path: PathBuf,
    pub sheet_cache_ttl: Duration,
    pub log_level: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            sheets_url: None,
            credentials_file: None,
            database_path: default_database_path(),
            sheet_cache_ttl: Duration::from_secs(DEFAULT_SHEET_CACHE_TTL_SECS),
            log_level: "info".to_string(),
        }
    }
}

impl ReviewConfig {
    /// Merge overrides over the TOML layer over compiled defaults, then validate
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let defaults = Self::default();

        let extensions = overrides
            .allowed_extensions
            .or(file.allowed_extensions)
            .map(|list| normalize_extensions(&list))
            .unwrap_or(defaults.allowed_extensions);

        let config = Self {
            secret_key: overrides.secret_key.or(file.secret_key).unwrap_or(defaults.secret_key),
            host: overrides.host.or(file.host).unwrap_or(defaults.host),
            port: overrides.port.or(file.port).unwrap_or(defaults.port),
            max_upload_bytes: overrides
                .max_upload_bytes
                .or(file.max_upload_bytes)
                .unwrap_or(defaults.max_upload_bytes),
            allowed_extensions: extensions,
            sheets_url: overrides.sheets_url.or(file.sheets_url).filter(|s| !s.trim().is_empty()),
            credentials_file: overrides.credentials_file.or(file.credentials_file),
            database_path: overrides
                .database_path
                .or(file.database_path)
                .unwrap_or(defaults.database_path),
            sheet_cache_ttl: overrides
                .sheet_cache_ttl_secs
                .or(file.sheet_cache_ttl_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sheet_cache_ttl),
            log_level: overrides
                .log_level
                .or(file.logging.level)
                .unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be positive".to_string()));
        }
        if self.allowed_extensions.is_empty() {
            return Err(Error::Config("allowed_extensions must not be empty".to_string()));
        }
        if self.secret_key.is_empty() {
            return Err(Error::Config("secret_key must not be empty".to_string()));
        }
        Ok(())
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Sheet URL and credential file; sync runs only when both are configured
    pub fn sync_target(&self) -> Option<(&str, &Path)> {
        match (&self.sheets_url, &self.credentials_file) {
            (Some(url), Some(credentials)) => Some((url.as_str(), credentials.as_path())),
            _ => None,
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }

    /// Whether the filename carries one of the allowed extensions (case-insensitive)
    pub fn is_allowed_extension(&self, filename: &str) -> bool {
        file_extension(filename)
            .map(|ext| self.allowed_extensions.iter().any(|allowed| *allowed == ext))
            .unwrap_or(false)
    }
}

/// Lowercased extension of a filename, without the dot
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn normalize_extensions(list: &[String]) -> Vec<String> {
    list.iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Load the TOML layer
///
/// An explicitly named file must exist and parse. Without one, the default
/// location is tried and a missing file yields an empty layer.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let mut config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    config.source = Some(path);

    Ok(config)
}

/// Get default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mira").join("config.toml"))
}

/// Get OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mira").join("mira.db"))
        .unwrap_or_else(|| PathBuf::from("./mira_data/mira.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_lowercases() {
        assert_eq!(file_extension("Sessions.XLSX").as_deref(), Some("xlsx"));
        assert_eq!(file_extension("noext"), None);
    }

    #[test]
    fn test_normalize_extensions() {
        let list = vec![".CSV".to_string(), " xlsx ".to_string(), "".to_string()];
        assert_eq!(normalize_extensions(&list), vec!["csv", "xlsx"]);
    }

    #[test]
    fn test_default_database_path_ends_with_mira_db() {
        assert!(default_database_path().ends_with("mira/mira.db"));
    }
}
