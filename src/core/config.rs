//! Configuration loading and resolution.
//!
//! Settings come from command-line flags and environment variables (already
//! merged by clap into [`Overrides`]) layered over an optional
//! `.vault-render.toml`. Everything is validated here, before any network
//! call is made.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants::{CONFIG_FILE, DEFAULT_KV_VERSION, DEFAULT_TIMEOUT_SECS};
use crate::core::store::KvVersion;
use crate::core::types::SecretPath;
use crate::error::{ConfigError, Result};

/// Contents of `.vault-render.toml`. The token is never read from disk.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Secret store address, e.g. `https://vault.example.com:8200`
    pub address: Option<String>,
    /// Namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,
    /// Template file to render in place
    pub template: Option<PathBuf>,
    /// Ordered secret paths; later paths win on key collisions
    pub secrets: Option<Vec<String>>,
    /// KV engine version (1 or 2)
    pub kv_version: Option<u32>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file can't be read, or
    /// `ConfigError::Parse` if the TOML is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    /// Load `explicit` if given, else `.vault-render.toml` when present.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing or explicitly named file can't be loaded.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Default, Clone)]
pub struct Overrides {
    pub address: Option<String>,
    pub token: Option<String>,
    pub namespace: Option<String>,
    pub timeout_secs: Option<u64>,
    pub template: Option<PathBuf>,
    pub secrets: Option<String>,
    pub kv_version: Option<String>,
    pub work_dir: Option<PathBuf>,
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("namespace", &self.namespace)
            .field("timeout_secs", &self.timeout_secs)
            .field("template", &self.template)
            .field("secrets", &self.secrets)
            .field("kv_version", &self.kv_version)
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

/// How to reach the secret store.
#[derive(Clone)]
pub struct Connection {
    pub address: String,
    pub token: Zeroizing<String>,
    pub namespace: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address)
            .field("token", &"[redacted]")
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Which secrets to fetch, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub paths: Vec<SecretPath>,
    pub kv_version: KvVersion,
}

/// Layered configuration: overrides first, then the file.
#[derive(Debug, Default)]
pub struct Config {
    file: FileConfig,
    overrides: Overrides,
}

impl Config {
    pub fn new(file: FileConfig, overrides: Overrides) -> Self {
        Self { file, overrides }
    }

    /// Discover the config file and layer `overrides` on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but can't be loaded.
    pub fn load(explicit: Option<&Path>, overrides: Overrides) -> Result<Self> {
        Ok(Self::new(FileConfig::discover(explicit)?, overrides))
    }

    /// Resolve the store connection.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` for a missing address or token and
    /// `ConfigError::InvalidValue` for a malformed address or zero timeout.
    pub fn connection(&self) -> Result<Connection> {
        let address = self
            .overrides
            .address
            .clone()
            .or_else(|| self.file.address.clone())
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or(ConfigError::MissingField { field: "address" })?;

        if !(address.starts_with("http://") || address.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "address",
                reason: format!("'{}' must start with http:// or https://", address),
            }
            .into());
        }

        let token = self
            .overrides
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Zeroizing::new(t.to_string()))
            .ok_or(ConfigError::MissingField { field: "token" })?;

        let timeout_secs = self
            .overrides
            .timeout_secs
            .or(self.file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "must be at least one second".to_string(),
            }
            .into());
        }

        let namespace = self
            .overrides
            .namespace
            .clone()
            .or_else(|| self.file.namespace.clone())
            .filter(|ns| !ns.trim().is_empty());

        Ok(Connection {
            address,
            token,
            namespace,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Resolve the ordered secret paths and KV engine version.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnsupportedKvVersion`, `ConfigError::NoSecretPaths`
    /// or `ConfigError::InvalidSecretPath`.
    pub fn sources(&self) -> Result<Sources> {
        let kv_version: KvVersion = match (&self.overrides.kv_version, self.file.kv_version) {
            (Some(v), _) => v.parse()?,
            (None, Some(v)) => v.to_string().parse()?,
            (None, None) => DEFAULT_KV_VERSION.parse()?,
        };

        let raw: Vec<String> = match (&self.overrides.secrets, &self.file.secrets) {
            (Some(list), _) => vec![list.clone()],
            (None, Some(list)) => list.clone(),
            (None, None) => Vec::new(),
        };

        let paths = parse_secret_paths(&raw, kv_version)?;
        debug!(paths = paths.len(), kv = %kv_version, "secret sources resolved");

        Ok(Sources { paths, kv_version })
    }

    /// Resolve the template path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` if no template is configured.
    pub fn template(&self) -> Result<PathBuf> {
        self.overrides
            .template
            .clone()
            .or_else(|| self.file.template.clone())
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| ConfigError::MissingField { field: "template" }.into())
    }

    /// Directory for the assignment log, if not the system temp directory.
    pub fn work_dir(&self) -> Option<&Path> {
        self.overrides.work_dir.as_deref()
    }
}

/// Split comma-separated entries into clean secret paths.
///
/// Whitespace and surrounding slashes are trimmed and empty entries dropped;
/// order is preserved.
///
/// # Errors
///
/// Returns `ConfigError::NoSecretPaths` if nothing is left, or
/// `ConfigError::InvalidSecretPath` for a KV v2 path without a sub-path.
pub fn parse_secret_paths(raw: &[String], kv: KvVersion) -> Result<Vec<SecretPath>> {
    let paths: Vec<SecretPath> = raw
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(|p| p.trim().trim_matches('/').to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if paths.is_empty() {
        return Err(ConfigError::NoSecretPaths.into());
    }

    if kv == KvVersion::V2 {
        if let Some(bad) = paths.iter().find(|p| !p.contains('/')) {
            return Err(ConfigError::InvalidSecretPath(bad.clone()).into());
        }
    }

    Ok(paths)
}
