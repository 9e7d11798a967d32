//! Keys command.
//!
//! Lists the key names the configured paths provide, with the path that
//! supplies each winning value. Values are never printed.

use serde::Serialize;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::secrets::aggregate;
use crate::core::store::{build_runtime, VaultClient};
use crate::error::Result;

#[derive(Serialize)]
struct KeyEntry<'a> {
    key: &'a str,
    path: &'a str,
}

/// Fetch all configured paths and list the merged key names.
pub fn execute(config: &Config, json: bool) -> Result<()> {
    let connection = config.connection()?;
    let sources = config.sources()?;

    let runtime = build_runtime()?;
    let client = VaultClient::new(&connection, runtime.handle().clone())?;
    let secrets = aggregate(&client, &sources.paths, sources.kv_version)?;

    if json {
        let entries: Vec<KeyEntry> = secrets
            .iter()
            .map(|(key, _, path)| KeyEntry { key, path })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries)
                .map_err(std::io::Error::other)?
        );
        return Ok(());
    }

    if secrets.is_empty() {
        output::dimmed("no secrets found");
        return Ok(());
    }

    for (key, _, path) in secrets.iter() {
        output::list_item(&format!("{}  {}", output::key(key), output::path(path)));
    }
    if secrets.overridden() > 0 {
        output::dimmed(&format!(
            "{} key(s) overridden by later paths",
            secrets.overridden()
        ));
    }

    Ok(())
}
