//! HTTP client for the secret store API.
//!
//! Talks to `{address}/v1/...` with the token in `X-Vault-Token`. The client
//! is async underneath; calls are driven to completion on a runtime handle so
//! the rest of the pipeline stays synchronous.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::{error_messages, KvVersion, RenewalOutcome, SecretStore};
use crate::core::config::Connection;
use crate::core::constants::{NAMESPACE_HEADER, RENEW_SELF_ENDPOINT, TOKEN_HEADER};
use crate::core::secrets::SecretRecord;
use crate::error::StoreError;

/// Build the runtime that drives store requests and signal handling.
///
/// Multi-threaded with a single worker so spawned tasks make progress while
/// the main thread is busy outside the runtime.
pub fn build_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("vault-render-io")
        .enable_all()
        .build()
}

/// Secret store client over HTTP.
pub struct VaultClient {
    base: String,
    token: Zeroizing<String>,
    namespace: Option<String>,
    timeout: Duration,
    http: reqwest::Client,
    runtime: Handle,
}

impl VaultClient {
    /// Create a client for `connection`, driving requests on `runtime`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Client` if the HTTP client cannot be built.
    pub fn new(connection: &Connection, runtime: Handle) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(connection.timeout)
            .user_agent(concat!("vault-render/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Client(e.to_string()))?;

        Ok(Self {
            base: connection.address.trim_end_matches('/').to_string(),
            token: connection.token.clone(),
            namespace: connection.namespace.clone(),
            timeout: connection.timeout,
            http,
            runtime,
        })
    }

    fn url(&self, api_path: &str) -> String {
        format!("{}/{}", self.base, api_path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(TOKEN_HEADER, self.token.as_str());
        match &self.namespace {
            Some(ns) => request.header(NAMESPACE_HEADER, ns),
            None => request,
        }
    }

    fn transport_error(&self, path: &str, source: reqwest::Error) -> StoreError {
        if source.is_timeout() {
            StoreError::Timeout {
                path: path.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else {
            StoreError::Transport {
                path: path.to_string(),
                source,
            }
        }
    }

    /// Send a request and read the whole body. `path` is only used for errors.
    fn send(&self, request: RequestBuilder, path: &str) -> Result<(StatusCode, String), StoreError> {
        let request = self.authorize(request);
        self.runtime.block_on(async {
            let response = request
                .send()
                .await
                .map_err(|e| self.transport_error(path, e))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| self.transport_error(path, e))?;
            trace!(path, status = status.as_u16(), body_len = body.len(), "store responded");
            Ok::<_, StoreError>((status, body))
        })
    }
}

impl SecretStore for VaultClient {
    fn renew_token(&self) -> RenewalOutcome {
        debug!("renewing token");
        let request = self.http.post(self.url(RENEW_SELF_ENDPOINT));
        match self.send(request, RENEW_SELF_ENDPOINT) {
            Ok((status, body)) => RenewalOutcome::from_response(status.as_u16(), &body),
            Err(e) => RenewalOutcome::Unreachable(e),
        }
    }

    fn fetch_secret(&self, path: &str, kv: KvVersion) -> Result<SecretRecord, StoreError> {
        let api_path = kv.resolve_path(path);
        debug!(path, api_path = %api_path, kv = %kv, "fetching secret");

        let request = self.http.get(self.url(&format!("v1/{api_path}")));
        let (status, body) = self.send(request, path)?;

        if !status.is_success() {
            let mut errors = serde_json::from_str::<Value>(&body)
                .map(|json| error_messages(&json))
                .unwrap_or_default();
            if errors.is_empty() {
                errors.push(
                    status
                        .canonical_reason()
                        .unwrap_or("no error details")
                        .to_string(),
                );
            }
            return Err(StoreError::Rejected {
                path: path.to_string(),
                status: status.as_u16(),
                errors,
            });
        }

        let json: Value = serde_json::from_str(&body).map_err(|e| StoreError::Format {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let record = kv.unwrap_payload(path, json)?;

        debug!(path, keys = record.len(), "fetched secret");
        Ok(record)
    }
}
