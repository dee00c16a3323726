//! Consul client configuration.
//!
//! Starts from Consul's own defaults (`127.0.0.1:8500` over `http`), layered
//! with the standard `CONSUL_HTTP_*` environment variables, then with the
//! non-empty fields of the resolved publisher configuration. An empty field
//! never clears a default.

use beacon_core::PublisherConfig;
use url::Url;
use zeroize::Zeroizing;

use crate::error::ConsulError;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8500";
pub const DEFAULT_SCHEME: &str = "http";

/// Basic auth credentials from `CONSUL_HTTP_AUTH`.
#[derive(Clone)]
pub struct HttpBasicAuth {
    pub username: String,
    pub password: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for HttpBasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBasicAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Configuration for connecting to a Consul agent.
///
/// Custom `Debug` implementation redacts the `token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct ConsulConfig {
    /// `host:port`, optionally prefixed with `http://` or `https://`.
    pub address: String,
    /// `http` or `https`. Ignored when `address` carries a scheme prefix.
    pub scheme: String,
    /// Empty means the agent's own datacenter.
    pub datacenter: String,
    /// ACL token sent as `X-Consul-Token`. Empty means anonymous.
    pub token: Zeroizing<String>,
    pub http_auth: Option<HttpBasicAuth>,
    /// Accept invalid TLS certificates (`CONSUL_HTTP_SSL_VERIFY=false`).
    pub insecure_skip_verify: bool,
}

impl std::fmt::Debug for ConsulConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsulConfig")
            .field("address", &self.address)
            .field("scheme", &self.scheme)
            .field("datacenter", &self.datacenter)
            .field("token", &"[REDACTED]")
            .field("http_auth", &self.http_auth)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            scheme: DEFAULT_SCHEME.to_string(),
            datacenter: String::new(),
            token: Zeroizing::new(String::new()),
            http_auth: None,
            insecure_skip_verify: false,
        }
    }
}

impl ConsulConfig {
    /// Defaults overridden by the process environment.
    ///
    /// Variables:
    /// - `CONSUL_HTTP_ADDR` (default: `127.0.0.1:8500`)
    /// - `CONSUL_HTTP_TOKEN`
    /// - `CONSUL_HTTP_SSL` (`true` selects `https`)
    /// - `CONSUL_HTTP_SSL_VERIFY` (`false` disables certificate checks)
    /// - `CONSUL_HTTP_AUTH` (`user` or `user:password`)
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let set = |var: &str| lookup(var).filter(|v| !v.is_empty());

        if let Some(addr) = set("CONSUL_HTTP_ADDR") {
            config.address = addr;
        }
        if let Some(token) = set("CONSUL_HTTP_TOKEN") {
            config.token = Zeroizing::new(token);
        }
        if let Some(ssl) = set("CONSUL_HTTP_SSL") {
            if parse_bool(&ssl) == Some(true) {
                config.scheme = "https".to_string();
            }
        }
        if let Some(verify) = set("CONSUL_HTTP_SSL_VERIFY") {
            config.insecure_skip_verify = parse_bool(&verify) == Some(false);
        }
        if let Some(auth) = set("CONSUL_HTTP_AUTH") {
            config.http_auth = Some(match auth.split_once(':') {
                Some((user, pass)) => HttpBasicAuth {
                    username: user.to_string(),
                    password: Some(Zeroizing::new(pass.to_string())),
                },
                None => HttpBasicAuth {
                    username: auth,
                    password: None,
                },
            });
        }
        config
    }

    /// Apply the non-empty connection fields of `publisher`.
    #[must_use]
    pub fn with_overrides(mut self, publisher: &PublisherConfig) -> Self {
        if !publisher.address.is_empty() {
            self.address = publisher.address.clone();
        }
        if !publisher.scheme.is_empty() {
            self.scheme = publisher.scheme.clone();
        }
        if !publisher.datacenter.is_empty() {
            self.datacenter = publisher.datacenter.clone();
        }
        if !publisher.token.is_empty() {
            self.token = Zeroizing::new(publisher.token.clone());
        }
        self
    }

    /// `{scheme}://{address}/`, validated.
    pub fn base_url(&self) -> Result<Url, ConsulError> {
        let (scheme, host) = match self.address.split_once("://") {
            Some((scheme, host)) => (scheme, host),
            None => (self.scheme.as_str(), self.address.as_str()),
        };
        if scheme != "http" && scheme != "https" {
            return Err(ConsulError::UnsupportedScheme {
                scheme: scheme.to_string(),
            });
        }
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(ConsulError::InvalidAddress {
                address: self.address.clone(),
                reason: "empty host".into(),
            });
        }

        let url = Url::parse(&format!("{scheme}://{host}/")).map_err(|e| {
            ConsulError::InvalidAddress {
                address: self.address.clone(),
                reason: e.to_string(),
            }
        })?;
        if url.path() != "/" || url.query().is_some() {
            return Err(ConsulError::InvalidAddress {
                address: self.address.clone(),
                reason: "address must be host[:port] without a path".into(),
            });
        }
        Ok(url)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}
