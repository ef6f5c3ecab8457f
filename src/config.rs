//! Configuration loading for mcp-catalyst.
//!
//! Configuration is resolved from three fallback sources (tried in order):
//!
//! 1. **JSON file** via `--config <path>` CLI flag
//! 2. **JSON file** via `CATALYST_CONFIG` environment variable
//! 3. **Environment variables** — `CATALYST_URL`, `CATALYST_USERNAME`,
//!    `CATALYST_PASSWORD` and optionally `CATALYST_VERIFY_TLS`
//!
//! ```json
//! {
//!   "url": "https://sandboxdnac.cisco.com",
//!   "username": "devnetuser",
//!   "password": "...",
//!   "verify_tls": false,
//!   "timeout_secs": 30,
//!   "log_level": "info"
//! }
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

/// CLI arguments parsed by `clap`.
#[derive(Parser)]
#[command(name = "mcp-catalyst", version, about = "MCP server for Cisco Catalyst Center")]
pub struct Cli {
    /// Path to controller config file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Controller connection settings.
#[derive(Deserialize, Clone, Debug)]
pub struct ControllerConfig {
    /// Base URL or bare host of the Catalyst Center cluster.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Lab controllers ship self-signed certificates, so this defaults to off.
    #[serde(default)]
    pub verify_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Default tracing filter; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Startup configuration errors. These are the only fatal errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no config file and {0} not set")]
    MissingEnv(&'static str),
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("invalid value for CATALYST_VERIFY_TLS: '{0}' (expected true or false)")]
    InvalidVerifyTls(String),
}

/// Load and validate configuration from CLI args, env vars, or config file.
pub fn load_config(cli: &Cli) -> Result<ControllerConfig, ConfigError> {
    let config = if let Some(path) = &cli.config {
        load_from_file(&expand_tilde(path))?
    } else if let Ok(path) = std::env::var("CATALYST_CONFIG") {
        load_from_file(&expand_tilde(Path::new(&path)))?
    } else {
        load_from_env(|key| std::env::var(key).ok())?
    };
    validate(config)
}

/// Expand a leading `~` to `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

fn load_from_file(path: &Path) -> Result<ControllerConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_config(contents: &str) -> Result<ControllerConfig, serde_json::Error> {
    serde_json::from_str(contents)
}

fn load_from_env<F>(var: F) -> Result<ControllerConfig, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let url = var("CATALYST_URL").ok_or(ConfigError::MissingEnv("CATALYST_URL"))?;
    let username = var("CATALYST_USERNAME").ok_or(ConfigError::MissingEnv("CATALYST_USERNAME"))?;
    let password = var("CATALYST_PASSWORD").ok_or(ConfigError::MissingEnv("CATALYST_PASSWORD"))?;
    let verify_tls = match var("CATALYST_VERIFY_TLS") {
        None => false,
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" | "" => false,
            _ => return Err(ConfigError::InvalidVerifyTls(v)),
        },
    };

    Ok(ControllerConfig {
        url,
        username,
        password,
        verify_tls,
        timeout_secs: default_timeout_secs(),
        log_level: default_log_level(),
    })
}

/// Reject empty credentials and expand a bare host to an `https://` URL.
fn validate(mut config: ControllerConfig) -> Result<ControllerConfig, ConfigError> {
    if config.url.trim().is_empty() {
        return Err(ConfigError::Empty("url"));
    }
    if config.username.is_empty() {
        return Err(ConfigError::Empty("username"));
    }
    if config.password.is_empty() {
        return Err(ConfigError::Empty("password"));
    }

    let url = config.url.trim().trim_end_matches('/');
    config.url = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };
    Ok(config)
}
