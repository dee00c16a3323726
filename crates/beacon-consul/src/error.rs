//! Consul client construction errors.
//!
//! Request-time failures are reported as [`beacon_core::StoreError`]; this
//! type only covers building the client.

#[derive(Debug, thiserror::Error)]
pub enum ConsulError {
    #[error("invalid Consul address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("unsupported Consul scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    /// Token or credentials contain bytes that cannot go in a header.
    #[error("invalid value for header {header}")]
    InvalidHeader { header: &'static str },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
