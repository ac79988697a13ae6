use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid message: {0}")]
    Invalid(&'static str),
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Errors surfaced by the HTTP routes. Each maps to one status code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid message data")]
    InvalidMessage,
    #[error("Invalid user id")]
    InvalidUserId,
    #[error("Message not found")]
    NotFound,
    #[error("Failed to {action}")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

impl warp::reject::Reject for ApiError {}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse PEM in {path}: {source}")]
    Pem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No {kind} found in {path}")]
    Empty { kind: &'static str, path: PathBuf },
}
