//! vault-render - Render secrets from a Vault KV store into config templates.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── render        # Run the pipeline against a template
//! │   ├── keys          # List aggregated key names
//! │   ├── resolve       # Show API paths for configured secret paths
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # Flags, environment and .vault-render.toml
//!     ├── store/        # Secret store access
//!     │   ├── mod       # SecretStore trait, renewal outcome
//!     │   ├── kv        # KV v1/v2 path rewrite and unwrapping
//!     │   └── http      # reqwest client
//!     ├── secrets       # Records and last-write-wins aggregation
//!     ├── assignments   # Scoped on-disk assignment log
//!     ├── template      # %KEY% substitution
//!     └── pipeline      # Renew, fetch, stage, substitute, clean up
//! ```
//!
//! # Features
//!
//! - KV engine v1 and v2 mounts
//! - Ordered secret paths with last-write-wins merging
//! - Literal, single-pass placeholder substitution with atomic writes
//! - Multi-line values (PEM certificates and keys) passed through verbatim
//! - Plaintext staging file removed on every exit path, including interrupts

pub mod cli;
pub mod core;
pub mod error;
