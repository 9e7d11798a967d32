//! Error types for vault-render.
//!
//! Every fatal failure in the render pipeline maps onto one of the nested
//! enums below. Messages name the offending path, key or file but never a
//! secret value.
//!
//! Token renewal failures are deliberately not part of [`Error`]: they travel
//! as [`AuthError`] inside `RenewalOutcome` and are logged, not propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for all pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors, all raised at startup before any network call.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unsupported KV engine version '{0}' (expected 1 or 2)")]
    UnsupportedKvVersion(String),

    #[error("no secret paths configured")]
    NoSecretPaths,

    #[error("invalid secret path '{0}': KV v2 paths need a mount and a sub-path")]
    InvalidSecretPath(String),

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors from talking to the secret store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to reach secret store for '{path}': {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for '{path}' timed out after {secs}s")]
    Timeout { path: String, secs: u64 },

    #[error("malformed response for '{path}': {reason}")]
    Format { path: String, reason: String },

    #[error("secret store rejected '{path}' (HTTP {status}): {}", .errors.join("; "))]
    Rejected {
        path: String,
        status: u16,
        errors: Vec<String>,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl StoreError {
    /// The secret path the failing request was for, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Transport { path, .. }
            | Self::Timeout { path, .. }
            | Self::Format { path, .. }
            | Self::Rejected { path, .. } => Some(path),
            Self::Client(_) => None,
        }
    }
}

/// Token renewal rejected by the secret store.
///
/// Non-fatal: reported and then ignored by the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("token renewal rejected: {}", .errors.join("; "))]
pub struct AuthError {
    pub errors: Vec<String>,
}

/// Validation errors for secret key names.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("invalid key '{key}' from '{path}': {reason}")]
    InvalidKey {
        key: String,
        path: String,
        reason: String,
    },
}

/// Template file errors. Raised before the file is modified.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("template is not writable: {}", .0.display())]
    ReadOnly(PathBuf),

    #[error("failed to read template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write template {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
