//! # Consul KV HTTP Client
//!
//! Implements [`KvStore`] against the Consul agent HTTP API.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | PUT    | `/v1/kv/{key}` | Write raw bytes; body `true` on success |
//! | GET    | `/v1/kv/{key}?raw` | Read raw bytes; 404 when absent |
//!
//! `?dc=` is added when a datacenter is configured and the ACL token travels
//! in `X-Consul-Token`.
//!
//! ## Sync Port over Async HTTP
//!
//! The [`KvStore`] methods are synchronous and use `Handle::block_on` on the
//! ambient tokio runtime. They must be called from a thread that has a
//! runtime context but is not itself driving async tasks (the main thread
//! after `Runtime::enter`, or `spawn_blocking`). Async callers can use
//! [`ConsulKvClient::put_async`] / [`ConsulKvClient::get_async`] directly.
//!
//! No retries and no client-side timeout: failures surface to the caller.

use beacon_core::{ConnectError, KvStore, PublisherConfig, StoreError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::runtime::Handle;
use url::Url;

use crate::config::{ConsulConfig, HttpBasicAuth};
use crate::error::ConsulError;

const TOKEN_HEADER: HeaderName = HeaderName::from_static("x-consul-token");

/// HTTP client for one Consul agent.
#[derive(Debug, Clone)]
pub struct ConsulKvClient {
    http: reqwest::Client,
    base_url: Url,
    datacenter: String,
    http_auth: Option<HttpBasicAuth>,
    name: String,
}

impl ConsulKvClient {
    /// Build a client from explicit settings.
    pub fn new(config: ConsulConfig) -> Result<Self, ConsulError> {
        let base_url = config.base_url()?;

        let mut headers = HeaderMap::new();
        if !config.token.is_empty() {
            let mut value = HeaderValue::from_str(config.token.as_str()).map_err(|_| {
                ConsulError::InvalidHeader {
                    header: "X-Consul-Token",
                }
            })?;
            value.set_sensitive(true);
            headers.insert(TOKEN_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()
            .map_err(ConsulError::ClientBuild)?;

        let name = format!(
            "Consul at {}",
            base_url.host_str().map_or_else(
                || base_url.to_string(),
                |host| match base_url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                },
            )
        );

        tracing::debug!(
            base_url = %base_url,
            datacenter = %config.datacenter,
            token = !config.token.is_empty(),
            "Consul KV client built"
        );

        Ok(Self {
            http,
            base_url,
            datacenter: config.datacenter,
            http_auth: config.http_auth,
            name,
        })
    }

    /// Build a client from the environment defaults overridden by the
    /// non-empty connection fields of `publisher`.
    pub fn connect(publisher: &PublisherConfig) -> Result<Self, ConnectError> {
        let config = ConsulConfig::from_env().with_overrides(publisher);
        let address = config.address.clone();
        Self::new(config).map_err(|e| {
            tracing::warn!(address = %address, error = %e, "Consul client construction failed");
            ConnectError {
                address,
                reason: e.to_string(),
            }
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn kv_url(&self, key: &str) -> Result<Url, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "key is empty".into(),
            });
        }
        if let Some(segment) = key.split('/').find(|s| *s == "." || *s == "..") {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: format!("key segment `{segment}` is not addressable"),
            });
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidKey {
                key: key.to_string(),
                reason: "base URL cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(["v1", "kv"])
            .extend(key.split('/'));
        if !self.datacenter.is_empty() {
            url.query_pairs_mut().append_pair("dc", &self.datacenter);
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.http_auth {
            Some(auth) => request.basic_auth(
                &auth.username,
                auth.password.as_ref().map(|p| p.as_str()),
            ),
            None => request,
        }
    }

    /// Write `value` at `key`.
    ///
    /// Calls `PUT {base_url}v1/kv/{key}`.
    pub async fn put_async(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let url = self.kv_url(key)?;
        tracing::debug!(%url, bytes = value.len(), "Consul KV put");

        let resp = self
            .authorize(self.http.put(url))
            .body(value.to_vec())
            .send()
            .await
            .map_err(unavailable)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        put_outcome(key, resp.text().await)
    }

    /// Read the raw value at `key`.
    ///
    /// Calls `GET {base_url}v1/kv/{key}?raw`.
    pub async fn get_async(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut url = self.kv_url(key)?;
        url.query_pairs_mut().append_key_only("raw");
        tracing::debug!(%url, "Consul KV get");

        let resp = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(unavailable)?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await.map_err(unavailable)?;
        Ok(Some(bytes.to_vec()))
    }
}

/// Consul answers a 2xx write with `true` when it took the value.
fn put_outcome(key: &str, body: Result<String, reqwest::Error>) -> Result<(), StoreError> {
    if body.map_err(unavailable)?.trim() != "true" {
        return Err(StoreError::Rejected {
            key: key.to_string(),
        });
    }
    Ok(())
}

fn unavailable(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable {
        reason: e.to_string(),
    }
}

fn runtime() -> Result<Handle, StoreError> {
    Handle::try_current().map_err(|e| StoreError::Runtime {
        reason: e.to_string(),
    })
}

impl KvStore for ConsulKvClient {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        runtime()?.block_on(self.put_async(key, value))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        runtime()?.block_on(self.get_async(key))
    }

    fn store_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(address: &str, datacenter: &str) -> ConsulKvClient {
        ConsulKvClient::new(ConsulConfig {
            address: address.into(),
            datacenter: datacenter.into(),
            ..ConsulConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn kv_url_keeps_separators_and_encodes_segments() {
        let c = client("127.0.0.1:8500", "");
        assert_eq!(
            c.kv_url("ami/us-east-1/ami 1").unwrap().as_str(),
            "http://127.0.0.1:8500/v1/kv/ami/us-east-1/ami%201"
        );
    }

    #[test]
    fn kv_url_adds_datacenter() {
        let c = client("127.0.0.1:8500", "eu-1");
        assert_eq!(
            c.kv_url("us-east-1/ami-1").unwrap().as_str(),
            "http://127.0.0.1:8500/v1/kv/us-east-1/ami-1?dc=eu-1"
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            client("127.0.0.1:8500", "").kv_url(""),
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn dot_segments_are_rejected_not_normalized() {
        let c = client("127.0.0.1:8500", "");
        for key in ["ami/../ami-1", "ami/./ami-1", "..", "us-east-1/."] {
            let err = c.kv_url(key).unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidKey { key: ref k, .. } if k == key),
                "{key}: {err}"
            );
        }
        assert_eq!(
            c.kv_url("ami/.hidden/ami-1").unwrap().as_str(),
            "http://127.0.0.1:8500/v1/kv/ami/.hidden/ami-1"
        );
    }

    #[test]
    fn base_url_comes_from_the_address() {
        assert_eq!(
            client("consul.internal:8501", "").base_url().as_str(),
            "http://consul.internal:8501/"
        );
    }

    #[test]
    fn put_outcome_follows_the_response_body() {
        assert!(put_outcome("k", Ok("true\n".into())).is_ok());
        assert!(matches!(
            put_outcome("k", Ok("false".into())),
            Err(StoreError::Rejected { ref key }) if key == "k"
        ));
    }

    #[tokio::test]
    async fn unreadable_put_body_is_unavailable() {
        let read_error = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(
            put_outcome("k", Err(read_error)),
            Err(StoreError::Unavailable { .. })
        ));
    }

    #[test]
    fn store_name_shows_host_and_port() {
        assert_eq!(
            client("consul.internal:8501", "").store_name(),
            "Consul at consul.internal:8501"
        );
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let err = ConsulKvClient::new(ConsulConfig {
            token: zeroize::Zeroizing::new("bad\ntoken".into()),
            ..ConsulConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConsulError::InvalidHeader { .. }));
    }

    #[test]
    fn connect_reports_the_address() {
        let err = ConsulKvClient::connect(&PublisherConfig {
            address: "consul:notaport".into(),
            ..PublisherConfig::default()
        })
        .unwrap_err();
        assert_eq!(err.address, "consul:notaport");
    }

    #[test]
    fn sync_calls_without_runtime_fail_cleanly() {
        let err = client("127.0.0.1:1", "").put("k", b"v").unwrap_err();
        assert!(matches!(err, StoreError::Runtime { .. }));
    }
}
