use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by a sync run. None of them are retried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The configuration file could not be read.
    #[error("error reading config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid or misses a required key.
    #[error("error parsing config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Network-level failure (DNS, connect, TLS, body read).
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Filesystem failure while listing or writing.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn http(url: &str, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.to_owned(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
