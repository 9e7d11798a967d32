//! KV secrets engine variants.
//!
//! Version 1 mounts store a flat record under `data`. Version 2 mounts are
//! versioned: reads go through `<mount>/data/<path>` and the record sits one
//! level deeper, under `data.data`.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::core::secrets::{SecretRecord, SecretValue};
use crate::core::types::ApiPath;
use crate::error::{ConfigError, StoreError};

/// KV secrets engine version, fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KvVersion {
    V1,
    #[default]
    V2,
}

impl KvVersion {
    /// Rewrite a configured secret path into the API path for this engine.
    ///
    /// For v2 the `data` segment goes right after the mount, the first path
    /// component. Later components are never touched, even if one of them is
    /// also called `secret` or `data`.
    pub fn resolve_path(self, path: &str) -> ApiPath {
        match self {
            Self::V1 => path.to_string(),
            Self::V2 => match path.split_once('/') {
                Some((mount, rest)) => format!("{mount}/data/{rest}"),
                None => format!("{path}/data"),
            },
        }
    }

    /// Pull the flat record out of a decoded response body.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Format` if the envelope for this engine version
    /// is missing or is not an object.
    pub fn unwrap_payload(self, path: &str, body: Value) -> Result<SecretRecord, StoreError> {
        let format_error = |reason: &str| StoreError::Format {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let Value::Object(mut body) = body else {
            return Err(format_error("response is not a JSON object"));
        };

        let data = match body.remove("data") {
            Some(Value::Object(data)) => data,
            Some(Value::Null) | None => return Err(format_error("response has no 'data' field")),
            Some(_) => return Err(format_error("'data' is not an object")),
        };

        let record = match self {
            Self::V1 => data,
            Self::V2 => {
                let mut data = data;
                match data.remove("data") {
                    Some(Value::Object(inner)) => inner,
                    // A deleted or destroyed version answers with data.data = null.
                    Some(Value::Null) => {
                        return Err(format_error(
                            "'data.data' is null (secret version deleted or destroyed)",
                        ))
                    }
                    Some(_) => return Err(format_error("'data.data' is not an object")),
                    None => {
                        return Err(format_error(
                            "response has no 'data.data' field (is this a KV v1 mount?)",
                        ))
                    }
                }
            }
        };

        Ok(into_record(record))
    }
}

fn into_record(map: Map<String, Value>) -> SecretRecord {
    map.into_iter()
        .map(|(key, value)| (key, SecretValue::new(normalize(value))))
        .collect()
}

/// Strings are kept verbatim; anything else becomes its compact JSON text.
fn normalize(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl FromStr for KvVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "1" => Ok(Self::V1),
            "2" => Ok(Self::V2),
            _ => Err(ConfigError::UnsupportedKvVersion(s.trim().to_string())),
        }
    }
}

impl fmt::Display for KvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "1"),
            Self::V2 => write!(f, "2"),
        }
    }
}
