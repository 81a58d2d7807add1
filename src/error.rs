use std::path::PathBuf;

use thiserror::Error;

/// Invalid or missing connection settings. Raised before any request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Failed to read config from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failure of a single request against the tracker.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{status} {reason}. Response: {body}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    /// No response at all: DNS, TLS, refused connection, timeout.
    #[error("{0}")]
    Transport(String),

    #[error("unexpected response shape")]
    Decode(#[from] serde_json::Error),
}

/// A request the report cannot do without failed.
#[derive(Debug, Error)]
#[error("{}", heading(.operation, .source))]
pub struct RemoteError {
    pub operation: &'static str,
    #[source]
    pub source: FetchError,
}

impl RemoteError {
    pub fn during(operation: &'static str) -> impl FnOnce(FetchError) -> RemoteError {
        move |source| RemoteError { operation, source }
    }
}

fn heading(operation: &str, source: &FetchError) -> String {
    match source {
        FetchError::Transport(_) => format!("Error connecting to Azure DevOps while {operation}"),
        _ => format!("Error {operation}"),
    }
}
