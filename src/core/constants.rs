//! Constants used throughout vault-render.
//!
//! Centralizes magic strings and default values.

/// Optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".vault-render.toml";

/// Default KV engine version when none is configured.
pub const DEFAULT_KV_VERSION: &str = "2";

/// Default per-request timeout against the secret store, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the store token.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// Header carrying the store namespace (enterprise stores only).
pub const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// API endpoint for renewing the caller's own token.
pub const RENEW_SELF_ENDPOINT: &str = "v1/auth/token/renew-self";

/// Delimiter around placeholder identifiers in templates.
pub const PLACEHOLDER_DELIMITER: char = '%';

/// Prefix for the transient assignment log file.
pub const ASSIGNMENT_LOG_PREFIX: &str = ".vault-render-";

/// Prefix for the staged copy of a template being rewritten.
pub const STAGED_TEMPLATE_PREFIX: &str = ".vault-render-staged-";

/// Exit status used when interrupted by a signal.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;
