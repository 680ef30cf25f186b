//! The `PlatformCluster` reconciler.
//!
//! Runs the one-shot defaults cleanup against every observed object and
//! seeds the status phase on objects that never reported one. The heavier
//! per-namespace work lives in the workspace config propagator.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::chrono::Utc;
use kube::api::{ListParams, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::runtime::events::{Event, EventType, Recorder};
use kube::runtime::watcher::Config;
use kube::runtime::Controller;
use kube::{Api, Client, Resource, ResourceExt};
use platform_crd::v2;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, error, field, info, instrument, Span};

use crate::diagnostics::Diagnostics;
use crate::{cleanup, infra, telemetry, Error, Result};

/// Context for our reconciler
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Diagnostics that contains the traces metrics and kube event recorder
    pub diagnostics: Arc<RwLock<Diagnostics>>,
    /// Kubernetes event emitter
    pub recorder: Recorder,
}

/// Holds the state of the whole application
#[derive(Clone, Default)]
pub struct State {
    /// Atomic lock for kubernetes diagnostics
    pub diagnostics: Arc<RwLock<Diagnostics>>,
}

impl State {
    /// Getter for diagnostics with read lock
    pub async fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.read().await.clone()
    }

    /// Converts the application state to controller context
    pub async fn to_ctrl_context(&self, client: Client) -> Arc<Context> {
        Arc::new(Context {
            recorder: self.diagnostics.read().await.recorder(client.clone()),
            client,
            diagnostics: self.diagnostics.clone(),
        })
    }
}

/// Initialize the controller (given the CRD is installed).
#[instrument(skip(state, client))]
pub async fn run(state: State, client: Client) {
    info!("initializing platformcluster controller");

    let clusters = Api::<v2::PlatformCluster>::all(client.clone());
    if let Err(e) = clusters.list(&ListParams::default().limit(1)).await {
        error!(
            error = %e,
            "failed to list platformcluster resources, CRD may not be installed"
        );
        std::process::exit(1);
    }

    info!("platformcluster CRD verified, starting controller");

    Controller::new(clusters, Config::default().any_semantic())
        .shutdown_on_signal()
        .run(reconcile, error_policy, state.to_ctrl_context(client).await)
        .filter_map(|x| async move { std::result::Result::ok(x) })
        .for_each(|_| futures::future::ready(()))
        .await;

    info!("controller shutdown complete");
}

#[instrument(skip(doc, ctx), fields(
    cluster_name = %doc.name_any(),
    cluster_namespace = doc.namespace().as_deref(),
    trace_id = field::Empty,
))]
#[allow(clippy::needless_pass_by_value)]
async fn reconcile(doc: Arc<v2::PlatformCluster>, ctx: Arc<Context>) -> Result<Action> {
    let name = doc.name_any();
    let namespace = doc
        .namespace()
        .ok_or_else(|| "Unable to get source namespace".to_string())?;
    let oref = doc.object_ref(&());

    let trace_id = telemetry::get_trace_id();
    if trace_id != opentelemetry::trace::TraceId::INVALID {
        Span::current().record("trace_id", field::display(&trace_id));
    }

    info!("starting reconciliation");

    let api: Api<v2::PlatformCluster> = Api::namespaced(ctx.client.clone(), &namespace);

    if let Some(patch) = defaults_patch(&doc, infra::kind())? {
        api.patch(&name, &PatchParams::default(), &Patch::Merge(patch))
            .await?;
        publish_event(
            &ctx.recorder,
            EventType::Normal,
            "DefaultsCleaned",
            "Reconcile",
            Some(format!("Cleared stale compiled-in defaults on {name}")),
            &oref,
        )
        .await;
        debug!("stale defaults cleared");
    }

    if doc.status.as_ref().is_none_or(|s| s.phase.is_empty()) {
        let status_patch = Patch::Merge(json!({"status": {"phase": v2::PHASE_ACTIVE}}));
        api.patch_status(&name, &PatchParams::default(), &status_patch)
            .await?;
        debug!(phase = v2::PHASE_ACTIVE, "seeded status phase");
    }

    {
        let mut diag = ctx.diagnostics.write().await;
        diag.last_event = Utc::now();
    }

    info!(
        requeue_after_secs = 300,
        "reconciliation completed successfully"
    );

    Ok(Action::requeue(Duration::from_secs(300)))
}

/// Merge patch clearing stale compiled-in defaults, or `None` when the
/// object needs no change.
///
/// Cleared fields serialize as absent, so the patch is computed against the
/// original serialization and removals become explicit `null`s; a plain
/// re-serialization would leave the stale values untouched on the server
/// (RFC 7386 ignores absent keys).
///
/// # Errors
/// Fails when the cleanup marker annotation is corrupt or the patched
/// object cannot be serialized.
fn defaults_patch(
    cluster: &v2::PlatformCluster,
    infra: crate::infra::Infrastructure,
) -> Result<Option<serde_json::Value>> {
    let mut cleaned = cluster.clone();
    if !cleanup::cleanup_defaults(&mut cleaned, infra)? {
        return Ok(None);
    }
    let before = json!({
        "metadata": {"annotations": cluster.metadata.annotations},
        "spec": serde_json::to_value(&cluster.spec)?,
    });
    let after = json!({
        "metadata": {"annotations": cleaned.metadata.annotations},
        "spec": serde_json::to_value(&cleaned.spec)?,
    });
    Ok(Some(merge_patch(&before, &after)))
}

/// RFC 7386 merge patch turning `before` into `after`. Keys present in
/// `before` but absent from `after` become explicit `null`s so the API
/// server drops them; arrays and scalars replace wholesale.
fn merge_patch(before: &serde_json::Value, after: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            let mut patch = serde_json::Map::new();
            for (key, after_value) in a {
                match b.get(key) {
                    Some(before_value) if before_value == after_value => {}
                    Some(before_value) => {
                        patch.insert(key.clone(), merge_patch(before_value, after_value));
                    }
                    None => {
                        patch.insert(key.clone(), after_value.clone());
                    }
                }
            }
            for key in b.keys() {
                if !a.contains_key(key) {
                    patch.insert(key.clone(), Value::Null);
                }
            }
            Value::Object(patch)
        }
        _ => after.clone(),
    }
}

#[instrument(skip(object, err, ctx), fields(
    cluster_name = %object.name_any(),
    cluster_namespace = object.namespace().as_deref(),
    error_type = ?err,
))]
#[allow(clippy::needless_pass_by_value)]
fn error_policy(object: Arc<v2::PlatformCluster>, err: &Error, ctx: Arc<Context>) -> Action {
    let err_msg = err.to_string();

    error!(
        error = %err_msg,
        requeue_after_secs = 60,
        "reconciliation failed, scheduling retry"
    );

    let ctx_clone = ctx.clone();
    let oref = object.object_ref(&());

    tokio::spawn(async move {
        publish_event(
            &ctx_clone.recorder,
            EventType::Warning,
            "ReconciliationFailed",
            "Reconcile",
            Some(format!("Error: {err_msg}")),
            &oref,
        )
        .await;
    });

    Action::requeue(Duration::from_secs(60))
}

/// Helper function to publish a Kubernetes event
async fn publish_event(
    recorder: &Recorder,
    event_type: EventType,
    reason: impl Into<String>,
    action: impl Into<String>,
    note: Option<String>,
    oref: &ObjectReference,
) {
    let _ = recorder
        .publish(
            &Event {
                type_: event_type,
                reason: reason.into(),
                note,
                action: action.into(),
                secondary: None,
            },
            oref,
        )
        .await;
}
