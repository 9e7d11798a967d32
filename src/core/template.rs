//! Placeholder substitution in template files.
//!
//! A placeholder is `%IDENTIFIER%`. Known identifiers are replaced by their
//! value as literal text; unknown ones are left exactly as written. The
//! template is scanned once, left to right, so text coming from a value is
//! never scanned again.
//!
//! Files are rewritten through a sibling temporary file that is renamed over
//! the original, so a failed write leaves the template untouched. When the
//! staged file cannot take over the template's owner, the template is
//! rewritten in place instead so ownership never changes.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::constants::{PLACEHOLDER_DELIMITER, STAGED_TEMPLATE_PREFIX};
use crate::core::secrets::AggregatedSecrets;
use crate::core::validation::is_valid_key;
use crate::error::{Result, TemplateError};

/// What a substitution pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionReport {
    substituted: BTreeMap<String, usize>,
    unresolved: BTreeSet<String>,
}

impl SubstitutionReport {
    /// Keys that were substituted, with how many occurrences each.
    pub fn substituted(&self) -> &BTreeMap<String, usize> {
        &self.substituted
    }

    /// Placeholder names that had no matching secret.
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    /// Total number of placeholders replaced.
    pub fn replacements(&self) -> usize {
        self.substituted.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.substituted.is_empty()
    }
}

/// Substitute placeholders in `text`.
pub fn render(text: &str, secrets: &AggregatedSecrets) -> (String, SubstitutionReport) {
    let bytes = text.as_bytes();
    let mut report = SubstitutionReport::default();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(PLACEHOLDER_DELIMITER) {
        let open = cursor + offset;
        let name_start = open + 1;
        let name_len = bytes[name_start..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count();
        let close = name_start + name_len;

        if name_len == 0 || bytes.get(close) != Some(&b'%') {
            cursor = name_start;
            continue;
        }

        let name = &text[name_start..close];
        match secrets.get(name) {
            Some(value) => {
                out.push_str(&text[copied..open]);
                out.push_str(value);
                *report.substituted.entry(name.to_string()).or_insert(0) += 1;
                copied = close + 1;
                cursor = close + 1;
            }
            None => {
                if is_valid_key(name) {
                    report.unresolved.insert(name.to_string());
                }
                // The closing delimiter may open the next placeholder.
                cursor = close;
            }
        }
    }

    out.push_str(&text[copied..]);
    (out, report)
}

/// Check that the template exists and is a writable regular file.
///
/// # Errors
///
/// Returns `TemplateError::NotFound`, `TemplateError::ReadOnly`, or
/// `TemplateError::Read` for anything that is not a regular file.
pub fn check(path: &Path) -> Result<()> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(TemplateError::NotFound(path.to_path_buf()).into());
        }
        Err(source) => {
            return Err(TemplateError::Read {
                path: path.to_path_buf(),
                source,
            }
            .into());
        }
    };

    if !metadata.is_file() {
        return Err(TemplateError::Read {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        }
        .into());
    }

    if metadata.permissions().readonly() {
        return Err(TemplateError::ReadOnly(path.to_path_buf()).into());
    }

    // The mode bits say nothing about who may write; ask the kernel.
    match fs::OpenOptions::new().write(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            Err(TemplateError::ReadOnly(path.to_path_buf()).into())
        }
        Err(source) => Err(TemplateError::Read {
            path: path.to_path_buf(),
            source,
        }
        .into()),
    }
}

/// Substitute placeholders in the file at `path`, in place.
///
/// The file is left untouched when no placeholder matches.
///
/// # Errors
///
/// Returns a `TemplateError` if the file is missing, read-only, not UTF-8,
/// or cannot be rewritten. The original file is unchanged in every case.
pub fn substitute(path: &Path, secrets: &AggregatedSecrets) -> Result<SubstitutionReport> {
    check(path)?;

    // Follow symlinks so the rename replaces the real file, not the link.
    let target = fs::canonicalize(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = fs::read_to_string(&target).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let (rendered, report) = render(&text, secrets);
    let rendered = zeroize::Zeroizing::new(rendered);

    for name in report.unresolved() {
        warn!(placeholder = %name, "no secret for placeholder, left as is");
    }

    if report.is_empty() {
        debug!(template = %path.display(), "no placeholders matched");
        return Ok(report);
    }

    write_atomically(&target, &rendered).map_err(|source| TemplateError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    for (key, count) in report.substituted() {
        debug!(key = %key, occurrences = count, "substituted");
    }
    info!(
        template = %path.display(),
        keys = report.substituted().len(),
        replacements = report.replacements(),
        "template rendered"
    );
    Ok(report)
}

fn write_atomically(target: &Path, contents: &str) -> io::Result<()> {
    let original = fs::metadata(target)?;
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut staged = tempfile::Builder::new()
        .prefix(STAGED_TEMPLATE_PREFIX)
        .suffix(".tmp")
        .tempfile_in(&dir)?;

    if !adopt_owner(staged.as_file(), &original) {
        drop(staged);
        debug!(template = %target.display(), "cannot keep template owner, writing in place");
        return write_in_place(target, contents);
    }

    staged.write_all(contents.as_bytes())?;
    staged.as_file().sync_all()?;
    fs::set_permissions(staged.path(), original.permissions())?;

    staged.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Give `staged` the owner and group of `original`. False if that is not
/// possible for the current user.
#[cfg(unix)]
fn adopt_owner(staged: &fs::File, original: &fs::Metadata) -> bool {
    use std::os::unix::fs::{fchown, MetadataExt};

    match staged.metadata() {
        Ok(m) if m.uid() == original.uid() && m.gid() == original.gid() => true,
        Ok(_) => fchown(staged, Some(original.uid()), Some(original.gid())).is_ok(),
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn adopt_owner(_staged: &fs::File, _original: &fs::Metadata) -> bool {
    true
}

/// Truncate and rewrite `target`. Not atomic; keeps inode, owner and mode.
fn write_in_place(target: &Path, contents: &str) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(target)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}
