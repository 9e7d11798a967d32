//! Command-line interface.

pub mod completions;
pub mod keys;
pub mod output;
pub mod render;
pub mod resolve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::config::{Config, Overrides};

/// vault-render - Render secrets from a Vault KV store into config templates.
#[derive(Parser)]
#[command(
    name = "vault-render",
    about = "Render secrets from a Vault KV store into config templates",
    version
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: .vault-render.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Fetch secrets and substitute them into a template in place
    Render {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[command(flatten)]
        sources: SourceArgs,

        /// Template file to render in place
        #[arg(short, long, env = "VAULT_RENDER_TEMPLATE")]
        template: Option<PathBuf>,

        /// Directory for the transient assignment log (default: system temp dir)
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,
    },

    /// List the key names the configured paths provide
    Keys {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[command(flatten)]
        sources: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the API path each secret path is read from
    Resolve {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Secret store connection flags.
#[derive(Args, Default)]
pub struct ConnectionArgs {
    /// Secret store address
    #[arg(long = "addr", env = "VAULT_ADDR")]
    pub address: Option<String>,

    /// Secret store token
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Namespace sent with every request
    #[arg(long, env = "VAULT_NAMESPACE")]
    pub namespace: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "VAULT_RENDER_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Which secrets to read.
#[derive(Args, Default)]
pub struct SourceArgs {
    /// Comma-separated secret paths; later paths win on key collisions
    #[arg(short, long, env = "VAULT_RENDER_SECRETS", value_name = "PATHS")]
    pub secrets: Option<String>,

    /// KV secrets engine version (1 or 2)
    #[arg(long, env = "VAULT_RENDER_KV_VERSION", value_name = "VERSION")]
    pub kv_version: Option<String>,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl Overrides {
    fn with_connection(mut self, args: ConnectionArgs) -> Self {
        self.address = args.address;
        self.token = args.token;
        self.namespace = args.namespace;
        self.timeout_secs = args.timeout;
        self
    }

    fn with_sources(mut self, args: SourceArgs) -> Self {
        self.secrets = args.secrets;
        self.kv_version = args.kv_version;
        self
    }
}

/// Execute a command.
pub fn execute(command: Command, config_path: Option<PathBuf>) -> crate::error::Result<()> {
    use Command::*;

    let load = |overrides: Overrides| Config::load(config_path.as_deref(), overrides);

    match command {
        Render {
            connection,
            sources,
            template,
            work_dir,
        } => {
            let overrides = Overrides {
                template,
                work_dir,
                ..Overrides::default()
            }
            .with_connection(connection)
            .with_sources(sources);
            render::execute(&load(overrides)?)
        }
        Keys {
            connection,
            sources,
            json,
        } => {
            let overrides = Overrides::default()
                .with_connection(connection)
                .with_sources(sources);
            keys::execute(&load(overrides)?, json)
        }
        Resolve { sources } => resolve::execute(&load(Overrides::default().with_sources(sources))?),
        Completions { shell } => completions::execute(shell),
    }
}
