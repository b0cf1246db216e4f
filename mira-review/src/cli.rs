//! Command-line arguments
//!
//! Every option falls back to a `MIRA_*` environment variable. Anything left
//! unset is taken from the TOML file, then from compiled defaults.

use clap::Parser;
use mira_common::config::ConfigOverrides;
use std::path::PathBuf;

/// Command-line arguments for mira-review
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mira-review")]
#[command(about = "Review tool for generated astrology sessions")]
#[command(version)]
pub struct Args {
    /// TOML config file (default: ~/.config/mira/config.toml)
    #[arg(short, long, env = "MIRA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "MIRA_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "MIRA_PORT")]
    pub port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "MIRA_DATABASE")]
    pub database: Option<PathBuf>,

    /// Key used to sign the reviewer cookie
    #[arg(long, env = "MIRA_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Largest accepted upload in bytes
    #[arg(long, env = "MIRA_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Accepted upload extensions, comma separated
    #[arg(long, env = "MIRA_ALLOWED_EXTENSIONS", value_delimiter = ',')]
    pub allowed_extensions: Option<Vec<String>>,

    /// Google Sheets URL to mirror reviews to
    #[arg(long, env = "MIRA_SHEETS_URL")]
    pub sheets_url: Option<String>,

    /// JSON file holding the Sheets access token
    #[arg(long, env = "MIRA_CREDENTIALS_FILE")]
    pub credentials_file: Option<PathBuf>,

    /// Seconds the sheet cache stays fresh
    #[arg(long, env = "MIRA_SHEET_CACHE_TTL_SECS")]
    pub sheet_cache_ttl_secs: Option<u64>,

    /// Log filter, e.g. "info" or "mira_review=debug"
    #[arg(long, env = "MIRA_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            secret_key: self.secret_key.clone(),
            host: self.host.clone(),
            port: self.port,
            max_upload_bytes: self.max_upload_bytes,
            allowed_extensions: self.allowed_extensions.clone(),
            sheets_url: self.sheets_url.clone(),
            credentials_file: self.credentials_file.clone(),
            database_path: self.database.clone(),
            sheet_cache_ttl_secs: self.sheet_cache_ttl_secs,
            log_level: self.log_level.clone(),
        }
    }
}
