//! End-to-end tests for the post-process orchestrator against in-process stores.
//!
//! Covers the observable contract of a configured post-processor: which
//! keys are written, in what order, with what bytes, and what is left behind
//! when a write fails halfway through a multi-region artifact.

use std::sync::atomic::{AtomicUsize, Ordering};

use beacon_core::{
    ArtifactManifest, ConnectError, KvStore, MemoryKvStore, PostProcessError, PostProcessor,
    RecordingUi, StoreError, UserVariables, ARTIFACT_STATE_METADATA, ARTIFACT_STATE_TYPE,
};
use serde_json::{json, Value};

fn configure(raw: Value) -> PostProcessor<MemoryKvStore> {
    PostProcessor::configure(&[raw], &UserVariables::new(), |_| {
        Ok::<_, ConnectError>(MemoryKvStore::new())
    })
    .expect("configure")
}

/// Store that accepts a fixed number of writes and then fails.
struct FailingStore {
    inner: MemoryKvStore,
    remaining: AtomicUsize,
}

impl FailingStore {
    fn accepting(writes: usize) -> Self {
        Self {
            inner: MemoryKvStore::new(),
            remaining: AtomicUsize::new(writes),
        }
    }
}

impl KvStore for FailingStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let left = self.remaining.load(Ordering::SeqCst);
        if left == 0 {
            return Err(StoreError::Status {
                status: 500,
                body: "rpc error: No cluster leader".into(),
            });
        }
        self.remaining.store(left - 1, Ordering::SeqCst);
        self.inner.put(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn store_name(&self) -> &str {
        "failing store"
    }
}

// ── Happy path ───────────────────────────────────────────────────────

#[test]
fn single_region_artifact_publishes_configured_metadata() {
    let pp = configure(json!({
        "address": "127.0.0.1:8500",
        "metadata": {"build": "42"}
    }));
    let ui = RecordingUi::new();
    let artifact = ArtifactManifest::new("mitchellh.amazonebs", "us-east-1:ami-0001");

    let out = pp.post_process(&ui, artifact.clone()).unwrap();

    assert_eq!(out.artifact, artifact);
    assert!(!out.keep_original);
    let entries = pp.store().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries.get("us-east-1/ami-0001").map(Vec::as_slice),
        Some(br#"{"build":"42"}"#.as_slice())
    );
    assert!(ui
        .lines()
        .contains(&"message: Region us-east-1: ami-0001".to_string()));
}

#[test]
fn multi_region_artifact_is_published_in_identifier_order() {
    let pp = configure(json!({"address": "127.0.0.1:8500", "artifact_type": "ami"}));
    pp.post_process(
        &RecordingUi::new(),
        ArtifactManifest::new(
            "mitchellh.amazon.instance",
            "us-west-2:ami-222,us-east-1:ami-111,eu-west-1:ami-333",
        ),
    )
    .unwrap();

    assert_eq!(
        pp.store().put_log(),
        vec![
            "ami/us-west-2/ami-222",
            "ami/us-east-1/ami-111",
            "ami/eu-west-1/ami-333",
        ]
    );
}

#[test]
fn embedded_and_configured_metadata_are_merged() {
    let pp = configure(json!({
        "address": "127.0.0.1:8500",
        "metadata": {"owner": "team-b", "tier": "gold"}
    }));
    let artifact = ArtifactManifest::new("mitchellh.amazonebs", "us-east-1:ami-0001")
        .with_state(ARTIFACT_STATE_METADATA, json!({"env": "prod", "owner": "team-a"}));

    pp.post_process(&RecordingUi::new(), artifact).unwrap();

    let raw = pp.store().get("us-east-1/ami-0001").unwrap().unwrap();
    let published: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(
        published,
        json!({"env": "prod", "owner": "team-b", "tier": "gold"})
    );
}

#[test]
fn type_override_controls_the_key_prefix() {
    let artifact = ArtifactManifest::new("mitchellh.amazonebs", "us-east-1:ami-0001")
        .with_state(ARTIFACT_STATE_TYPE, json!("ami"));

    let embedded = configure(json!({"address": "a", "artifact_type": "golden-image"}));
    assert_eq!(
        embedded.records_for(&artifact).unwrap()[0].key,
        "ami/us-east-1/ami-0001"
    );

    let overridden = configure(json!({
        "address": "a",
        "artifact_type": "golden-image",
        "artifact_type_override": true
    }));
    assert_eq!(
        overridden.records_for(&artifact).unwrap()[0].key,
        "golden-image/us-east-1/ami-0001"
    );
}

// ── Idempotence ──────────────────────────────────────────────────────

#[test]
fn republishing_overwrites_the_same_keys() {
    let pp = configure(json!({"address": "127.0.0.1:8500", "metadata": {"build": "42"}}));
    let artifact = ArtifactManifest::new("mitchellh.amazonebs", "us-east-1:ami-1,us-west-2:ami-2");

    pp.post_process(&RecordingUi::new(), artifact.clone()).unwrap();
    let first = pp.store().entries();
    pp.post_process(&RecordingUi::new(), artifact).unwrap();

    assert_eq!(pp.store().entries(), first);
    assert_eq!(pp.store().len(), 2);
    assert_eq!(pp.store().put_log().len(), 4);
}

// ── Failure model ────────────────────────────────────────────────────

#[test]
fn store_failure_aborts_remaining_units_without_rollback() {
    let pp = PostProcessor::configure(
        &[json!({"address": "127.0.0.1:8500"})],
        &UserVariables::new(),
        |_| Ok::<_, ConnectError>(FailingStore::accepting(1)),
    )
    .unwrap();
    let ui = RecordingUi::new();

    let err = pp
        .post_process(
            &ui,
            ArtifactManifest::new(
                "mitchellh.amazonebs",
                "us-east-1:ami-1,us-west-2:ami-2,eu-west-1:ami-3",
            ),
        )
        .unwrap_err();

    match err {
        PostProcessError::Store { key, source } => {
            assert_eq!(key, "us-west-2/ami-2");
            assert!(matches!(source, StoreError::Status { status: 500, .. }));
        }
        other => panic!("expected store error, got {other:?}"),
    }
    let written = pp.store().inner.put_log();
    assert_eq!(written, vec!["us-east-1/ami-1"]);
    assert!(ui.lines().iter().any(|l| l.starts_with("error: Failed to publish us-west-2/ami-2")));
}

#[test]
fn unsupported_artifact_performs_zero_writes() {
    let pp = configure(json!({"address": "127.0.0.1:8500"}));
    let ui = RecordingUi::new();

    let err = pp
        .post_process(&ui, ArtifactManifest::new("mitchellh.virtualbox", "box-123"))
        .unwrap_err();

    assert_eq!(err.to_string(), "unsupported artifact type: mitchellh.virtualbox");
    assert!(pp.store().is_empty());
    assert!(ui.lines().is_empty());
}

#[test]
fn malformed_identifier_carries_the_raw_identifier() {
    let pp = configure(json!({"address": "127.0.0.1:8500"}));

    let err = pp
        .post_process(
            &RecordingUi::new(),
            ArtifactManifest::new("mitchellh.amazonebs", "us-east-1-ami-111"),
        )
        .unwrap_err();

    assert_eq!(err.to_string(), "poorly formatted artifact ID: us-east-1-ami-111");
    assert!(pp.store().is_empty());
}
