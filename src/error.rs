use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("failed to parse {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("failed to serialize {what}: {message}")]
    Encode { what: &'static str, message: String },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn decode(path: impl Into<PathBuf>, err: &serde_json::Error) -> Self {
        Self::Decode {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid URL {url}: {details}")]
    InvalidUrl { url: String, details: String },

    #[error("request to {url} failed: {details}")]
    Request { url: String, details: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode {url}: {details}")]
    Decode { url: String, details: String },
}

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("bundled archive is unreadable: {0}")]
    Archive(String),

    #[error("IO error at {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl SeedError {
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Failures that end a whole sync cycle. Per-app failures never reach this type.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error("sync cancelled")]
    Cancelled,
}
