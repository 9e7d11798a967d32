//! Render command.
//!
//! Fetches secrets and substitutes them into the template in place.

use tracing::debug;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::pipeline::{self, RenderRequest};
use crate::core::store::{build_runtime, RenewalOutcome, VaultClient};
use crate::error::Result;

/// Run the render pipeline with the resolved configuration.
pub fn execute(config: &Config) -> Result<()> {
    // Resolve everything up front so configuration errors never reach the network.
    let connection = config.connection()?;
    let sources = config.sources()?;
    let template = config.template()?;
    debug!(?connection, template = %template.display(), "render configured");

    let runtime = build_runtime()?;
    let client = VaultClient::new(&connection, runtime.handle().clone())?;

    let request = RenderRequest {
        template: &template,
        paths: &sources.paths,
        kv_version: sources.kv_version,
        work_dir: config.work_dir(),
    };
    let summary = pipeline::run(&client, &request, Some(runtime.handle()))?;

    match &summary.renewal {
        RenewalOutcome::Renewed(_) => {}
        RenewalOutcome::Rejected(e) => output::warn(&e.to_string()),
        RenewalOutcome::Unreachable(e) => output::warn(&format!("token renewal failed: {}", e)),
    }

    if summary.report.is_empty() {
        output::success(&format!(
            "{} unchanged",
            output::path(&template.display().to_string())
        ));
        output::dimmed("no placeholders matched");
    } else {
        output::success(&format!(
            "rendered {}",
            output::path(&template.display().to_string())
        ));
    }
    output::kv("paths:", summary.paths);
    output::kv("keys:", summary.keys.len());
    output::kv("substituted:", summary.report.substituted().len());
    output::kv("replacements:", summary.report.replacements());

    let unresolved = summary.report.unresolved();
    if !unresolved.is_empty() {
        output::warn(&format!(
            "{} placeholder(s) left as is: {}",
            unresolved.len(),
            unresolved
                .iter()
                .map(|k| output::key(k))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    Ok(())
}
