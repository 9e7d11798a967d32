//! vault-render - Render secrets from a Vault KV store into config templates.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vault_render::cli::output;
use vault_render::cli::{execute, Cli};
use vault_render::error::{ConfigError, Error, StoreError, TemplateError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("VAULT_RENDER_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("vault_render=debug")
        } else {
            EnvFilter::new("vault_render=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli.command, cli.config) {
        // Format error with suggestion if available
        let suggestion = match &e {
            Error::Config(ConfigError::MissingField { field: "address" }) => {
                Some("set VAULT_ADDR or pass --addr")
            }
            Error::Config(ConfigError::MissingField { field: "token" }) => {
                Some("set VAULT_TOKEN or pass --token")
            }
            Error::Config(ConfigError::MissingField { field: "template" }) => {
                Some("set VAULT_RENDER_TEMPLATE or pass --template")
            }
            Error::Config(ConfigError::NoSecretPaths) => {
                Some("set VAULT_RENDER_SECRETS or pass --secrets secret/app,secret/db")
            }
            Error::Config(ConfigError::InvalidSecretPath(_)) => {
                Some("KV v2 paths look like <mount>/<path>; pass --kv-version 1 for v1 mounts")
            }
            Error::Store(StoreError::Rejected { status: 404, .. }) => {
                Some("check the path exists and the KV version matches the mount")
            }
            Error::Store(StoreError::Rejected { status: 403, .. }) => {
                Some("check the token's policy grants read on this path")
            }
            Error::Template(TemplateError::ReadOnly(_)) => Some("make the template writable"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
