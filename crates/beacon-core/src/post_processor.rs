//! # Post-Process Orchestrator
//!
//! One [`PostProcessor`] is configured per pipeline step and then invoked
//! once per artifact. Each call runs to completion before returning:
//!
//! 1. classify the producer (unsupported → abort, nothing written);
//! 2. parse the identifier (malformed → abort, nothing written);
//! 3. decode embedded state, resolve metadata and type;
//! 4. derive record keys (unaddressable or colliding → abort, nothing written);
//! 5. `put` one record per unit, in identifier order.
//!
//! A failed `put` stops the call. Records written earlier in the same call
//! stay written; record keys are deterministic, so re-running the step
//! overwrites them.
//!
//! The artifact is handed back unchanged with `keep_original = false`.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::artifact::Artifact;
use crate::classify::{Classifier, UnsupportedArtifactType};
use crate::config::{resolve, ConfigError, PublisherConfig, UserVariables};
use crate::identifier::{parse_identifier, MalformedIdentifier, RegionUnit};
use crate::metadata::{resolve_metadata, resolve_type, EmbeddedState, Metadata, StateDecodeError};
use crate::record::{record_key, unaddressable_segment, PublishedRecord};
use crate::store::{ConnectError, KvStore, StoreError};
use crate::ui::Ui;

/// Errors from [`PostProcessor::configure`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigureError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Errors from a single post-process call. None of them are retried here.
#[derive(Debug, thiserror::Error)]
pub enum PostProcessError {
    #[error(transparent)]
    UnsupportedArtifactType(#[from] UnsupportedArtifactType),

    #[error(transparent)]
    MalformedIdentifier(#[from] MalformedIdentifier),

    /// The builder broke the embedded state contract.
    #[error("artifact state contract violated: {0}")]
    StateContract(#[from] StateDecodeError),

    #[error("failed to encode metadata for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A write failed. Earlier units of the same call may be visible.
    #[error("failed to publish {key}: {source}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },
}

/// Successful outcome of [`PostProcessor::post_process`].
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessed<A> {
    pub artifact: A,
    /// Always `false`: the host may discard its pre-processing copy.
    pub keep_original: bool,
}

/// Publishes artifact metadata to a [`KvStore`].
#[derive(Debug)]
pub struct PostProcessor<S> {
    config: PublisherConfig,
    classifier: Classifier,
    store: S,
}

impl<S: KvStore> PostProcessor<S> {
    /// Wrap an already resolved configuration and connected store.
    pub fn new(config: PublisherConfig, store: S) -> Self {
        Self {
            config,
            classifier: Classifier::builtin(),
            store,
        }
    }

    /// Resolve raw configuration, then build the store client from it.
    ///
    /// The client is built once here and reused by every later call.
    pub fn configure<F, E>(
        raws: &[Value],
        user_vars: &UserVariables,
        connect: F,
    ) -> Result<Self, ConfigureError>
    where
        F: FnOnce(&PublisherConfig) -> Result<S, E>,
        E: Into<ConnectError>,
    {
        let config = resolve(raws, user_vars)?;
        let store = connect(&config).map_err(Into::into)?;
        tracing::info!(store = store.store_name(), "post-processor configured");
        Ok(Self::new(config, store))
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolved metadata for `artifact`.
    pub fn metadata<A: Artifact + ?Sized>(&self, artifact: &A) -> Result<Metadata, StateDecodeError> {
        let state = EmbeddedState::decode(artifact)?;
        Ok(resolve_metadata(state.metadata.as_ref(), &self.config))
    }

    /// Resolved type tag for `artifact`.
    pub fn artifact_type<A: Artifact + ?Sized>(&self, artifact: &A) -> Result<String, StateDecodeError> {
        let state = EmbeddedState::decode(artifact)?;
        Ok(resolve_type(state.artifact_type.as_deref(), &self.config))
    }

    /// Records a post-process call would write for `artifact`, in write order.
    ///
    /// Runs every check [`post_process`](Self::post_process) runs before its
    /// first write, without touching the store.
    pub fn records_for<A: Artifact + ?Sized>(
        &self,
        artifact: &A,
    ) -> Result<Vec<PublishedRecord>, PostProcessError> {
        Ok(self
            .plan(artifact)?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    fn plan<A: Artifact + ?Sized>(
        &self,
        artifact: &A,
    ) -> Result<Vec<(RegionUnit, PublishedRecord)>, PostProcessError> {
        let kind = self.classifier.classify(artifact.producer_id())?;
        let units = parse_identifier(artifact.id())?;

        let state = EmbeddedState::decode(artifact).map_err(|e| {
            tracing::error!(
                producer_id = artifact.producer_id(),
                key = e.key,
                "artifact state contract violated: {e}"
            );
            e
        })?;
        let metadata = resolve_metadata(state.metadata.as_ref(), &self.config);
        let artifact_type = resolve_type(state.artifact_type.as_deref(), &self.config);

        tracing::debug!(
            %kind,
            units = units.len(),
            artifact_type = %artifact_type,
            metadata_keys = metadata.len(),
            "resolved artifact records"
        );

        let plan = units
            .into_iter()
            .map(|unit| {
                match PublishedRecord::new(&artifact_type, &unit, &metadata) {
                    Ok(record) => Ok((unit, record)),
                    Err(source) => Err(PostProcessError::Encode {
                        key: record_key(&artifact_type, &unit),
                        source,
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        check_keys(artifact.id(), &plan)?;
        Ok(plan)
    }

    /// Publish `artifact`'s records and hand the artifact back.
    pub fn post_process<A: Artifact>(
        &self,
        ui: &dyn Ui,
        artifact: A,
    ) -> Result<PostProcessed<A>, PostProcessError> {
        let plan = self.plan(&artifact)?;

        ui.say(&format!(
            "Publishing metadata for {} to {}...",
            artifact.id(),
            self.store.store_name()
        ));

        for (unit, record) in &plan {
            ui.message(&format!("Region {}: {}", unit.region, unit.value));
            self.store
                .put(&record.key, &record.value)
                .map_err(|source| {
                    tracing::warn!(key = %record.key, error = %source, "publish failed");
                    ui.error(&format!("Failed to publish {}: {source}", record.key));
                    PostProcessError::Store {
                        key: record.key.clone(),
                        source,
                    }
                })?;
            tracing::info!(key = %record.key, bytes = record.value.len(), "published artifact record");
            ui.message(&format!("Published {}", record.key));
        }

        Ok(PostProcessed {
            artifact,
            keep_original: false,
        })
    }
}

/// Every key must be addressable and belong to exactly one distinct unit.
/// Repeating the same unit is allowed; it rewrites the same record.
fn check_keys(
    identifier: &str,
    plan: &[(RegionUnit, PublishedRecord)],
) -> Result<(), MalformedIdentifier> {
    let mut owners: BTreeMap<&str, &RegionUnit> = BTreeMap::new();
    for (unit, record) in plan {
        if let Some(segment) = unaddressable_segment(&record.key) {
            tracing::warn!(key = %record.key, segment, "unaddressable record key");
            return Err(MalformedIdentifier {
                identifier: identifier.to_string(),
            });
        }
        match owners.insert(&record.key, unit) {
            Some(previous) if previous != unit => {
                tracing::warn!(key = %record.key, "record key shared by distinct units");
                return Err(MalformedIdentifier {
                    identifier: identifier.to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}
