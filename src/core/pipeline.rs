//! The render pipeline.
//!
//! Renew token (best effort) → fetch and merge every path → stage the merged
//! secrets in the assignment log → substitute into the template → remove the
//! log. The log is removed on every exit path.

use std::path::Path;

use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::core::assignments::AssignmentLog;
use crate::core::secrets::aggregate_with;
use crate::core::store::{KvVersion, RenewalOutcome, SecretStore};
use crate::core::template::{self, SubstitutionReport};
use crate::core::types::SecretPath;
use crate::error::Result;

/// One render run.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub template: &'a Path,
    pub paths: &'a [SecretPath],
    pub kv_version: KvVersion,
    /// Where to put the assignment log; the system temp dir if `None`.
    pub work_dir: Option<&'a Path>,
}

/// What a successful run did. Holds key names only, never values.
#[derive(Debug)]
pub struct RenderSummary {
    pub renewal: RenewalOutcome,
    pub paths: usize,
    pub keys: Vec<String>,
    pub report: SubstitutionReport,
}

/// Run the pipeline against `store`.
///
/// When `interrupts` is given, a SIGINT/SIGTERM during the run removes the
/// assignment log before the process exits.
///
/// # Errors
///
/// Fails on the first fetch, key validation, log or template error. The
/// template is either fully rendered or untouched.
pub fn run<S>(
    store: &S,
    request: &RenderRequest<'_>,
    interrupts: Option<&Handle>,
) -> Result<RenderSummary>
where
    S: SecretStore + ?Sized,
{
    template::check(request.template)?;

    let renewal = store.renew_token();
    report_renewal(&renewal);

    let mut log = match request.work_dir {
        Some(dir) => AssignmentLog::create_in(dir)?,
        None => AssignmentLog::create()?,
    };
    if let Some(handle) = interrupts {
        log.watch_interrupts(handle);
    }

    aggregate_with(store, request.paths, request.kv_version, |path, record| {
        log.append(path, record)
    })?;

    let secrets = log.load()?;
    let report = {
        // An interrupt mid-write would leave the staged template behind.
        let _deferred = log.defer_interrupts();
        template::substitute(request.template, &secrets)?
    };
    log.remove()?;

    info!(
        paths = request.paths.len(),
        keys = secrets.len(),
        replacements = report.replacements(),
        "render complete"
    );

    Ok(RenderSummary {
        renewal,
        paths: request.paths.len(),
        keys: secrets.keys().map(str::to_string).collect(),
        report,
    })
}

fn report_renewal(outcome: &RenewalOutcome) {
    match outcome {
        RenewalOutcome::Renewed(lease) => info!(
            renewable = lease.renewable,
            lease_seconds = lease.lease_seconds,
            "token renewed"
        ),
        RenewalOutcome::Rejected(e) => warn!(error = %e, "token renewal failed, continuing"),
        RenewalOutcome::Unreachable(e) => warn!(error = %e, "token renewal failed, continuing"),
    }
}
