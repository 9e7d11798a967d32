//! Resolve command.
//!
//! Prints the API path each configured secret path is read from. Makes no
//! network calls.

use crate::cli::output;
use crate::core::config::Config;
use crate::error::Result;

/// Print `<secret path> -> v1/<api path>` for every configured path.
pub fn execute(config: &Config) -> Result<()> {
    let sources = config.sources()?;

    output::kv("kv version:", sources.kv_version);
    for path in &sources.paths {
        let api_path = sources.kv_version.resolve_path(path);
        output::list_item(&format!("{} -> v1/{}", path, output::path(&api_path)));
    }

    Ok(())
}
