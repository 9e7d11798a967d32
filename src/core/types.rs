//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A secret key name (e.g., DATABASE_URL, api_key).
///
/// Must be a valid placeholder identifier.
pub type SecretKey = String;

/// A location in the secret store as configured (e.g., `secret/app/db`).
///
/// Never includes the `v1/` API prefix or the KV v2 `data` segment.
pub type SecretPath = String;

/// A secret store API path after KV-engine rewriting.
pub type ApiPath = String;
