//! Secret records and their aggregation.
//!
//! Each configured path yields one [`SecretRecord`]. Records are merged in
//! path order into [`AggregatedSecrets`]; when two paths define the same key
//! the later path wins.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::store::{KvVersion, SecretStore};
use crate::core::types::{SecretKey, SecretPath};
use crate::core::validation::validate_key;
use crate::error::Result;

/// A secret value. Wiped on drop and redacted in `Debug` output.
#[derive(Clone)]
pub struct SecretValue(Zeroizing<String>);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// The plaintext value.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue([redacted])")
    }
}

impl PartialEq for SecretValue {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for SecretValue {}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The flat key-value record fetched from a single path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretRecord {
    entries: BTreeMap<SecretKey, SecretValue>,
}

impl SecretRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<SecretKey>, value: impl Into<SecretValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(SecretValue::expose)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every key against the placeholder grammar.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidKey` for the first offending key.
    pub fn validate(&self, path: &str) -> Result<()> {
        self.keys().try_for_each(|key| validate_key(key, path))
    }
}

impl<K: Into<SecretKey>, V: Into<SecretValue>> FromIterator<(K, V)> for SecretRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    value: SecretValue,
    source: SecretPath,
}

/// All fetched secrets merged into one mapping with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedSecrets {
    entries: BTreeMap<SecretKey, Entry>,
    overridden: usize,
}

impl AggregatedSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a record fetched from `path`. Keys already present are replaced.
    pub fn merge(&mut self, path: &str, record: &SecretRecord) {
        for (key, value) in record.iter() {
            self.insert(key, value.clone(), path);
        }
    }

    /// Insert one pair, replacing any earlier value for `key`.
    pub fn insert(&mut self, key: &str, value: SecretValue, source: &str) {
        let entry = Entry {
            value,
            source: source.to_string(),
        };
        if let Some(previous) = self.entries.insert(key.to_string(), entry) {
            self.overridden += 1;
            debug!(key, from = %previous.source, to = source, "secret key overridden");
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.expose())
    }

    /// The path that supplied the winning value for `key`.
    pub fn source(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.source.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate `(key, value, source path)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretValue, &str)> {
        self.entries
            .iter()
            .map(|(k, e)| (k.as_str(), &e.value, e.source.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many merges replaced an existing key.
    pub fn overridden(&self) -> usize {
        self.overridden
    }
}

/// Fetch every path in order and merge the records, last write wins.
///
/// # Errors
///
/// Fails on the first path that cannot be fetched or that holds an invalid
/// key name. Nothing fetched so far is returned.
pub fn aggregate<S>(store: &S, paths: &[SecretPath], kv: KvVersion) -> Result<AggregatedSecrets>
where
    S: SecretStore + ?Sized,
{
    aggregate_with(store, paths, kv, |_, _| Ok(()))
}

/// Like [`aggregate`], calling `on_record` with each validated record
/// before it is merged.
///
/// # Errors
///
/// Fails on the first fetch, validation or callback error.
pub fn aggregate_with<S, F>(
    store: &S,
    paths: &[SecretPath],
    kv: KvVersion,
    mut on_record: F,
) -> Result<AggregatedSecrets>
where
    S: SecretStore + ?Sized,
    F: FnMut(&str, &SecretRecord) -> Result<()>,
{
    let mut secrets = AggregatedSecrets::new();

    for path in paths {
        let record = store.fetch_secret(path, kv)?;
        record.validate(path)?;
        on_record(path, &record)?;
        secrets.merge(path, &record);
    }

    info!(
        paths = paths.len(),
        keys = secrets.len(),
        overridden = secrets.overridden(),
        "secrets aggregated"
    );
    Ok(secrets)
}
