//! Secret store access.
//!
//! Abstracts the remote key-value secret store behind the [`SecretStore`]
//! trait so the pipeline can run against the HTTP client or an in-memory
//! stand-in.
//!
//! ## Adding a New Store Backend
//!
//! 1. Implement the `SecretStore` trait
//! 2. Add the implementation in a new file (e.g., `file.rs`)
//! 3. Re-export from this module

use serde_json::Value;

use crate::core::secrets::SecretRecord;
use crate::error::{AuthError, StoreError};

mod http;
mod kv;

pub use http::{build_runtime, VaultClient};
pub use kv::KvVersion;

/// Secret store trait.
///
/// Token renewal is best-effort and reports a [`RenewalOutcome`]; fetching is
/// fatal on failure and reports a `Result`.
pub trait SecretStore {
    /// Renew the token the store was opened with.
    fn renew_token(&self) -> RenewalOutcome;

    /// Fetch the flat key-value record stored at `path`.
    ///
    /// `path` is the configured secret path; rewriting it for the KV engine
    /// is the store's job.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` or `StoreError::Timeout` if the store
    /// cannot be reached, `StoreError::Rejected` if it refuses the request, and
    /// `StoreError::Format` if the response is not the expected envelope.
    fn fetch_secret(&self, path: &str, kv: KvVersion) -> Result<SecretRecord, StoreError>;
}

/// Lease details returned by a successful token renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLease {
    pub renewable: bool,
    pub lease_seconds: u64,
}

/// Result of a best-effort token renewal.
#[derive(Debug)]
pub enum RenewalOutcome {
    /// The store renewed the token.
    Renewed(TokenLease),
    /// The store answered with an error payload.
    Rejected(AuthError),
    /// The store could not be reached or answered with something unreadable.
    Unreachable(StoreError),
}

impl RenewalOutcome {
    /// Whether the token was renewed.
    pub fn is_renewed(&self) -> bool {
        matches!(self, Self::Renewed(_))
    }

    /// Interpret a `renew-self` response.
    ///
    /// An `errors` array wins over everything else; otherwise the response must
    /// carry `auth.renewable` and `auth.lease_duration`.
    pub fn from_response(status: u16, body: &str) -> Self {
        let json: Value = match serde_json::from_str(body) {
            Ok(json) => json,
            Err(e) if (200..300).contains(&status) => {
                return Self::Unreachable(StoreError::Format {
                    path: crate::core::constants::RENEW_SELF_ENDPOINT.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Self::Rejected(AuthError {
                    errors: vec![format!("HTTP {}", status)],
                });
            }
        };

        let errors = error_messages(&json);
        if !errors.is_empty() {
            return Self::Rejected(AuthError { errors });
        }
        if !(200..300).contains(&status) {
            return Self::Rejected(AuthError {
                errors: vec![format!("HTTP {}", status)],
            });
        }

        let auth = &json["auth"];
        match (auth["renewable"].as_bool(), auth["lease_duration"].as_u64()) {
            (Some(renewable), Some(lease_seconds)) => Self::Renewed(TokenLease {
                renewable,
                lease_seconds,
            }),
            _ => Self::Unreachable(StoreError::Format {
                path: crate::core::constants::RENEW_SELF_ENDPOINT.to_string(),
                reason: "missing auth.renewable or auth.lease_duration".to_string(),
            }),
        }
    }
}

/// Messages from a store `errors` array, if present.
pub(crate) fn error_messages(json: &Value) -> Vec<String> {
    json.get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|e| match e.as_str() {
                    Some(s) => s.to_string(),
                    None => e.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
