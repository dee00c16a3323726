//! # beacon-consul -- Consul KV store adapter
//!
//! Typed HTTP access to the Consul key/value API, exposed through the
//! `beacon-core` [`KvStore`](beacon_core::KvStore) port.
//!
//! ## Connection Settings
//!
//! Settings start from Consul's own defaults and the `CONSUL_HTTP_*`
//! environment ([`ConsulConfig::from_env`]). Resolved publisher settings
//! override them only when non-empty ([`ConsulConfig::with_overrides`]).
//!
//! ```no_run
//! use beacon_consul::ConsulKvClient;
//! use beacon_core::{PostProcessor, UserVariables};
//!
//! let raw = serde_json::json!({"address": "consul.internal:8500"});
//! let _pp = PostProcessor::configure(&[raw], &UserVariables::new(), ConsulKvClient::connect)?;
//! # Ok::<(), beacon_core::ConfigureError>(())
//! ```

pub mod config;
pub mod error;
pub mod kv;

pub use config::{ConsulConfig, HttpBasicAuth};
pub use error::ConsulError;
pub use kv::ConsulKvClient;
