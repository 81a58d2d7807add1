use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_RELEASE_FIELD: &str = "Custom.Release";
pub const DEFAULT_NOTES_FIELD: &str = "System.Description";
pub const DEFAULT_PRODUCTION_ENVIRONMENT: &str = "PROD";

/// Settings read from `config.toml`. Every key is optional; CLI flags and
/// environment variables take precedence.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    pub organization_url: Option<String>,
    pub project: Option<String>,
    pub pat: Option<String>,
    pub release_field: Option<String>,
    pub notes_field: Option<String>,
    pub production_environment: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Validated settings for talking to one project.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub organization_url: String,
    pub project: String,
    pub pat: String,
    pub release_field: String,
    pub notes_field: String,
    pub production_environment: String,
    pub timeout: Option<Duration>,
}

impl ConnectionConfig {
    pub fn new(organization_url: &str, project: &str, pat: &str) -> Result<Self, ConfigError> {
        let organization_url = organization_url.trim_end_matches('/');
        if organization_url.is_empty() {
            return Err(ConfigError::MissingField("organization URL"));
        }
        if project.is_empty() {
            return Err(ConfigError::MissingField("project"));
        }
        if pat.is_empty() {
            return Err(ConfigError::MissingField(
                "PAT token (use --pat or set AZURE_DEVOPS_PAT)",
            ));
        }

        Ok(Self {
            organization_url: organization_url.to_string(),
            project: project.to_string(),
            pat: pat.to_string(),
            release_field: DEFAULT_RELEASE_FIELD.to_string(),
            notes_field: DEFAULT_NOTES_FIELD.to_string(),
            production_environment: DEFAULT_PRODUCTION_ENVIRONMENT.to_string(),
            timeout: None,
        })
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".release-notes")
        .join("config.toml")
}

/// Load `path`, or the default location when `path` is `None`. Only the
/// default location may be absent.
pub fn load_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path(), false),
    };
    if !explicit && !path.exists() {
        return Ok(FileConfig::default());
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}
