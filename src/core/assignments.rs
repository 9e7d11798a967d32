//! Transient on-disk assignment log.
//!
//! Holds the fetched secrets as `KEY=<json-quoted-value>` lines between the
//! fetch and substitution steps. Each fetched path appends one block headed
//! by a `# <path>` comment. JSON quoting keeps multi-line values (PEM
//! certificates, private keys) on a single line.
//!
//! The file is created with owner-only permissions and removed when the
//! [`AssignmentLog`] is dropped, or on SIGINT/SIGTERM if interrupt cleanup
//! is armed. An interrupt that arrives while [`AssignmentLog::defer_interrupts`]
//! is held is handled once the guard is released.

use std::fs;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::core::constants::{ASSIGNMENT_LOG_PREFIX, INTERRUPTED_EXIT_CODE};
use crate::core::secrets::{AggregatedSecrets, SecretRecord, SecretValue};
use crate::core::validation::validate_key;
use crate::error::Result;

/// Scoped assignment log file.
pub struct AssignmentLog {
    file: Option<NamedTempFile>,
    path: PathBuf,
    watcher: Option<AbortHandle>,
    critical: Arc<Mutex<()>>,
}

impl AssignmentLog {
    /// Create an empty log in the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn create() -> Result<Self> {
        Self::create_in(&std::env::temp_dir())
    }

    /// Create an empty log in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn create_in(dir: &Path) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(ASSIGNMENT_LOG_PREFIX)
            .suffix(".env")
            .tempfile_in(dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600))?;
        }

        let path = file.path().to_path_buf();
        debug!(path = %path.display(), "assignment log created");

        Ok(Self {
            file: Some(file),
            path,
            watcher: None,
            critical: Arc::new(Mutex::new(())),
        })
    }

    /// Location of the log on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the assignments of one fetched record.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the write fails.
    pub fn append(&mut self, source: &str, record: &SecretRecord) -> Result<()> {
        let file = self.file.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "assignment log already removed")
        })?;

        let mut block = String::new();
        block.push_str(&format!("# {}\n", source.replace('\n', " ")));
        for (key, value) in record.iter() {
            let quoted = serde_json::to_string(value.expose())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            block.push_str(key);
            block.push('=');
            block.push_str(&quoted);
            block.push('\n');
        }

        let block = zeroize::Zeroizing::new(block);
        file.write_all(block.as_bytes())?;
        file.flush()?;

        debug!(path = source, keys = record.len(), "assignments appended");
        Ok(())
    }

    /// Read the log back into a mapping. Later lines win.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or a line is malformed,
    /// and `ValidationError::InvalidKey` if a key name is not an identifier.
    pub fn load(&self) -> Result<AggregatedSecrets> {
        let contents = zeroize::Zeroizing::new(fs::read_to_string(&self.path)?);
        parse(&contents)
    }

    /// Remove the log from disk as soon as SIGINT or SIGTERM arrives, then
    /// exit with status 130.
    pub fn watch_interrupts(&mut self, runtime: &Handle) {
        self.watch(runtime, wait_for_interrupt(), || {
            std::process::exit(INTERRUPTED_EXIT_CODE)
        });
    }

    /// Hold off interrupt handling until the guard is dropped.
    ///
    /// Must not be called from inside the runtime.
    pub fn defer_interrupts(&self) -> MutexGuard<'_, ()> {
        self.critical.blocking_lock()
    }

    fn watch<T, E>(&mut self, runtime: &Handle, trigger: T, on_interrupt: E)
    where
        T: Future<Output = ()> + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let path = self.path.clone();
        let critical = Arc::clone(&self.critical);
        let task = runtime.spawn(async move {
            trigger.await;
            let _held = critical.lock().await;
            warn!("interrupted, removing assignment log");
            let _ = fs::remove_file(&path);
            on_interrupt();
        });
        self.watcher = Some(task.abort_handle());
    }

    /// Delete the log now, reporting any failure.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be removed.
    pub fn remove(mut self) -> Result<()> {
        self.disarm();
        if let Some(file) = self.file.take() {
            file.close()?;
            debug!(path = %self.path.display(), "assignment log removed");
        }
        Ok(())
    }

    fn disarm(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

impl Drop for AssignmentLog {
    fn drop(&mut self) {
        self.disarm();
        if let Some(file) = self.file.take() {
            if let Err(e) = file.close() {
                warn!(path = %self.path.display(), error = %e, "failed to remove assignment log");
            }
        }
    }
}

fn parse(contents: &str) -> Result<AggregatedSecrets> {
    let mut secrets = AggregatedSecrets::new();
    let mut source = String::new();

    for (n, line) in contents.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix("# ") {
            source = comment.to_string();
            continue;
        }

        let malformed = || {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed assignment at line {}", n + 1),
            )
        };

        let (key, quoted) = line.split_once('=').ok_or_else(malformed)?;
        validate_key(key, &source)?;
        let value: String = serde_json::from_str(quoted).map_err(|_| malformed())?;
        secrets.insert(key, SecretValue::new(value), &source);
    }

    Ok(secrets)
}

#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_interrupt() {
    let _ = tokio::signal::ctrl_c().await;
}
