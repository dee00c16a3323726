//! # beacon-core -- Post-Build Artifact Metadata Publishing
//!
//! Runs after an image build pipeline has produced its artifacts and records
//! identifying metadata about them in an external key-value store, where
//! deployment tooling can discover them later.
//!
//! ## Pipeline
//!
//! ```text
//! artifact ─► classify ─► parse identifier ─► resolve metadata + type ─► put per unit
//! ```
//!
//! - [`config`] decodes and validates operator configuration, expanding
//!   templated connection fields against user variables. All problems are
//!   reported together.
//! - [`classify`] gates artifacts on the identity of the builder that made them.
//! - [`identifier`] splits `region:value,region:value` identifiers into units.
//! - [`metadata`] merges artifact-embedded state with configured metadata and
//!   picks the published type tag.
//! - [`store`] is the port to the key-value store. The HTTP implementation
//!   lives in `beacon-consul`; [`store::MemoryKvStore`] backs tests.
//! - [`post_processor`] composes the above and publishes one record per unit.
//!
//! ## Crate Policy
//!
//! - No network code. The store is reached only through [`KvStore`].
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod artifact;
pub mod classify;
pub mod config;
pub mod identifier;
pub mod metadata;
pub mod post_processor;
pub mod record;
pub mod store;
pub mod template;
pub mod ui;

pub use artifact::{Artifact, ArtifactManifest, ARTIFACT_STATE_METADATA, ARTIFACT_STATE_TYPE};
pub use classify::{ArtifactKind, Classifier, UnsupportedArtifactType};
pub use config::{resolve, ConfigError, ConfigIssue, PublisherConfig, UserVariables, ValidationErrors};
pub use identifier::{parse_identifier, MalformedIdentifier, RegionUnit};
pub use metadata::{resolve_metadata, resolve_type, EmbeddedState, Metadata, StateDecodeError};
pub use post_processor::{ConfigureError, PostProcessError, PostProcessed, PostProcessor};
pub use record::PublishedRecord;
pub use store::{ConnectError, KvStore, MemoryKvStore, StoreError};
pub use ui::{RecordingUi, Ui};
