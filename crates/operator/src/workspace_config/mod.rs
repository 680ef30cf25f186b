//! Workspace configuration propagator.
//!
//! Copies operator-namespace ConfigMaps, Secrets and PVCs labeled as
//! workspaces-config into every workspace namespace, reverts drift on the
//! copies, deletes orphaned copies subject to retention, and tracks all of
//! it in a per-namespace sync ledger.

pub mod ledger;
pub mod object;
pub mod template;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, PersistentVolumeClaim, Secret};
use kube::api::{DynamicObject, ListParams, PostParams};
use kube::runtime::controller::Action;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher::Config;
use kube::runtime::Controller;
use kube::{Api, Client, Resource, ResourceExt};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::constants::{
    COMPONENT_LABEL, ORG, PART_OF_LABEL, SYNC_LEDGER_NAME, SYNC_RETAIN_ANNOTATION,
    SYNC_RETAIN_ON_DELETE_ANNOTATION, WORKSPACES_CONFIG_COMPONENT, is_truthy,
};
use crate::namespace_cache::NamespaceCache;
use crate::workspace_config::ledger::{ledger_key, parse_ledger_key, SyncLedger};
use crate::workspace_config::object::{
    api_resource_for, default_retain_on_delete, SyncFilters, SyncObject,
};
use crate::{infra, Error, Result};

/// Context shared by every propagator reconcile.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Namespace classification cache
    pub cache: NamespaceCache,
    /// Label/annotation removal lists
    pub filters: SyncFilters,
    /// Namespace the operator (and the sources) live in
    pub operator_namespace: String,
}

fn source_selector() -> String {
    format!("{PART_OF_LABEL}={ORG},{COMPONENT_LABEL}={WORKSPACES_CONFIG_COMPONENT}")
}

/// Run the propagator controller until shutdown.
///
/// Reconciles namespaces; labeled ConfigMap/Secret/PVC events (and, on
/// OpenShift, Template events) fan out to the relevant namespaces through
/// [`map_config_object`].
#[instrument(skip_all)]
pub async fn run(ctx: Arc<Context>) {
    info!("initializing workspace config propagator");

    let namespaces = Api::<Namespace>::all(ctx.client.clone());
    let watched = Config::default().labels(&source_selector());

    let config_maps = Api::<ConfigMap>::all(ctx.client.clone());
    let secrets = Api::<Secret>::all(ctx.client.clone());
    let claims = Api::<PersistentVolumeClaim>::all(ctx.client.clone());

    let mut controller = Controller::new(namespaces, Config::default())
        .watches(config_maps, watched.clone(), {
            let ctx = ctx.clone();
            move |cm: ConfigMap| map_config_object(&ctx, cm.meta().name.as_deref(), cm.meta().namespace.as_deref())
        })
        .watches(secrets, watched.clone(), {
            let ctx = ctx.clone();
            move |s: Secret| map_config_object(&ctx, s.meta().name.as_deref(), s.meta().namespace.as_deref())
        })
        .watches(claims, watched.clone(), {
            let ctx = ctx.clone();
            move |pvc: PersistentVolumeClaim| {
                map_config_object(&ctx, pvc.meta().name.as_deref(), pvc.meta().namespace.as_deref())
            }
        });

    if infra::is_openshift() {
        let resource = template::template_resource();
        let templates: Api<DynamicObject> = Api::all_with(ctx.client.clone(), &resource);
        controller = controller.watches_with(templates, resource, watched, {
            let ctx = ctx.clone();
            move |t: DynamicObject| {
                map_config_object(&ctx, t.metadata.name.as_deref(), t.metadata.namespace.as_deref())
            }
        });
    }

    controller
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .filter_map(|x| async move { x.ok() })
        .for_each(|_| futures::future::ready(()))
        .await;

    info!("workspace config propagator shutdown complete");
}

/// Map a labeled object event to the namespaces needing a reconcile:
/// source events fan out to every known workspace namespace, destination
/// events map to their own namespace. The ledger itself never triggers.
fn map_config_object(
    ctx: &Context,
    name: Option<&str>,
    namespace: Option<&str>,
) -> Vec<ObjectRef<Namespace>> {
    if name == Some(SYNC_LEDGER_NAME) {
        return Vec::new();
    }
    let Some(namespace) = namespace else {
        return Vec::new();
    };
    if namespace == ctx.operator_namespace {
        ctx.cache
            .get_workspace_namespaces()
            .iter()
            .map(|ns| ObjectRef::new(ns))
            .collect()
    } else {
        vec![ObjectRef::new(namespace)]
    }
}

#[instrument(skip(namespace, ctx), fields(namespace = %namespace.name_any()))]
async fn reconcile(namespace: Arc<Namespace>, ctx: Arc<Context>) -> Result<Action> {
    let name = namespace.name_any();

    let Some(info) = ctx.cache.examine_namespace(&name).await? else {
        return Ok(Action::await_change());
    };
    if !info.workspace_namespace {
        return Ok(Action::await_change());
    }

    let source_namespace = if info.owner.namespace.is_empty() {
        ctx.operator_namespace.clone()
    } else {
        info.owner.namespace.clone()
    };

    sync_namespace(&ctx, &source_namespace, &name, &info.username).await?;

    debug!("workspace namespace synchronized");
    Ok(Action::requeue(Duration::from_secs(300)))
}

#[allow(clippy::needless_pass_by_value)]
fn error_policy(namespace: Arc<Namespace>, err: &Error, _ctx: Arc<Context>) -> Action {
    error!(
        namespace = %namespace.name_any(),
        error = %err,
        requeue_after_secs = 60,
        "workspace config sync failed, scheduling retry"
    );
    Action::requeue(Duration::from_secs(60))
}

/// Synchronize one destination namespace against the source namespace.
///
/// # Errors
/// Propagates API errors; the caller requeues with back-off. The ledger is
/// committed last, so partial progress only causes redundant re-syncs.
pub async fn sync_namespace(
    ctx: &Context,
    source_namespace: &str,
    destination_namespace: &str,
    username: &str,
) -> Result<()> {
    let mut ledger = SyncLedger::load(&ctx.client, destination_namespace).await?;

    let mut sources = Vec::new();
    if infra::is_openshift() {
        sources.extend(
            template::expand_templates(&ctx.client, source_namespace, username, destination_namespace)
                .await?,
        );
    }
    sources.extend(list_sources::<ConfigMap>(&ctx.client, source_namespace).await?);
    sources.extend(list_sources::<Secret>(&ctx.client, source_namespace).await?);
    sources.extend(list_sources::<PersistentVolumeClaim>(&ctx.client, source_namespace).await?);

    let mut seen = HashSet::new();
    for source in &sources {
        seen.insert(source.key_in(source_namespace));
        sync_object(ctx, &mut ledger, source, source_namespace, destination_namespace).await?;
    }

    sweep_obsolete(ctx, &mut ledger, source_namespace, destination_namespace, &seen).await?;

    ledger.commit(&ctx.client, destination_namespace).await
}

/// List one native source kind by the workspaces-config selector.
async fn list_sources<K>(client: &Client, namespace: &str) -> Result<Vec<SyncObject>>
where
    K: Resource<DynamicType = (), Scope = k8s_openapi::NamespaceResourceScope>,
    K: Serialize + Clone + std::fmt::Debug + serde::de::DeserializeOwned,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let listed = api
        .list(&ListParams::default().labels(&source_selector()))
        .await?;
    listed
        .items
        .iter()
        .filter(|item| item.meta().name.as_deref() != Some(SYNC_LEDGER_NAME))
        .map(SyncObject::from_typed)
        .collect()
}

async fn sync_object(
    ctx: &Context,
    ledger: &mut SyncLedger,
    source: &SyncObject,
    source_namespace: &str,
    destination_namespace: &str,
) -> Result<()> {
    let name = source.name();
    let source_key = source.key_in(source_namespace);
    let destination_key = source.key_in(destination_namespace);
    let desired = source.build_destination(destination_namespace, &ctx.filters);
    let api: Api<DynamicObject> =
        Api::namespaced_with(ctx.client.clone(), destination_namespace, &source.resource);

    match api.get_opt(&name).await? {
        None => {
            let created = create_destination(&api, &desired, &name).await?;
            ledger.set(&source_key, &source.version);
            ledger.set(
                &destination_key,
                created.metadata.resource_version.as_deref().unwrap_or(""),
            );
        }
        Some(existing) => {
            let existing_version = existing.metadata.resource_version.clone().unwrap_or_default();
            let source_changed = ledger.get(&source_key) != Some(source.version.as_str());
            let destination_changed =
                ledger.get(&destination_key) != Some(existing_version.as_str());
            if !source_changed && !destination_changed {
                return Ok(());
            }

            // An existing copy without the tracking label is foreign; it is
            // only replaced through the explicit delete path.
            let tracked = existing
                .metadata
                .labels
                .as_ref()
                .and_then(|l| l.get(PART_OF_LABEL))
                .is_some_and(|v| v == ORG);
            if !tracked {
                let created = replace_untracked(&api, &existing, &desired, &name).await?;
                ledger.set(&source_key, &source.version);
                ledger.set(
                    &destination_key,
                    created.metadata.resource_version.as_deref().unwrap_or(""),
                );
                return Ok(());
            }

            if source.has_read_only_spec() {
                info!(
                    object = %name,
                    namespace = %destination_namespace,
                    "claim spec is immutable, delete the claim to pick up source changes"
                );
                ledger.set(&source_key, &source.version);
                ledger.set(&destination_key, &existing_version);
                return Ok(());
            }

            if SyncObject::differs_from(&desired, &existing) {
                let mut updated = desired.clone();
                merge_destination_metadata(&mut updated, &existing);
                updated.metadata.resource_version = Some(existing_version);
                let replaced = api.replace(&name, &PostParams::default(), &updated).await?;
                debug!(object = %name, namespace = %destination_namespace, "reverted drift");
                ledger.set(&source_key, &source.version);
                ledger.set(
                    &destination_key,
                    replaced.metadata.resource_version.as_deref().unwrap_or(""),
                );
            } else {
                ledger.set(&source_key, &source.version);
                ledger.set(&destination_key, &existing_version);
            }
        }
    }
    Ok(())
}

/// Create the destination; an AlreadyExists collision means the existing
/// object was invisible (unlabeled), so it is retained or replaced.
async fn create_destination(
    api: &Api<DynamicObject>,
    desired: &DynamicObject,
    name: &str,
) -> Result<DynamicObject> {
    match api.create(&PostParams::default(), desired).await {
        Ok(created) => Ok(created),
        Err(kube::Error::Api(response)) if response.reason == "AlreadyExists" => {
            let Some(existing) = api.get_opt(name).await? else {
                // Deleted between the collision and the re-read.
                return Ok(api.create(&PostParams::default(), desired).await?);
            };
            replace_untracked(api, &existing, desired, name).await
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete-and-recreate an unmanaged destination object, unless it asked to
/// be retained.
async fn replace_untracked(
    api: &Api<DynamicObject>,
    existing: &DynamicObject,
    desired: &DynamicObject,
    name: &str,
) -> Result<DynamicObject> {
    let retain = existing
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(SYNC_RETAIN_ANNOTATION))
        .is_some_and(|v| is_truthy(v));
    if retain {
        return Err(Error::Conflict(format!(
            "object {name} exists, is not managed and is marked to be retained"
        )));
    }
    warn!(object = %name, "replacing unmanaged object with the synchronized copy");
    api.delete(name, &Default::default()).await?;
    Ok(api.create(&PostParams::default(), desired).await?)
}

/// Third-party label/annotation additions on the destination survive a
/// revert; source-provided keys are already aligned in `desired`.
fn merge_destination_metadata(desired: &mut DynamicObject, existing: &DynamicObject) {
    if let Some(existing_labels) = &existing.metadata.labels {
        let labels = desired.metadata.labels.get_or_insert_default();
        for (key, value) in existing_labels {
            labels.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    if let Some(existing_annotations) = &existing.metadata.annotations {
        let annotations = desired.metadata.annotations.get_or_insert_default();
        for (key, value) in existing_annotations {
            annotations.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

/// Delete (or retain) destination copies whose source disappeared.
async fn sweep_obsolete(
    ctx: &Context,
    ledger: &mut SyncLedger,
    source_namespace: &str,
    destination_namespace: &str,
    seen: &HashSet<String>,
) -> Result<()> {
    for key in ledger.keys_in_namespace(source_namespace) {
        if seen.contains(&key) {
            continue;
        }
        let Some(parsed) = parse_ledger_key(&key) else {
            ledger.remove(&key);
            continue;
        };
        let destination_key = ledger_key(&parsed.gvk, &parsed.name, destination_namespace);
        let resource = api_resource_for(&parsed.gvk);
        let api: Api<DynamicObject> =
            Api::namespaced_with(ctx.client.clone(), destination_namespace, &resource);

        if let Some(existing) = api.get_opt(&parsed.name).await? {
            let retain = existing
                .metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get(SYNC_RETAIN_ON_DELETE_ANNOTATION))
                .map_or_else(|| default_retain_on_delete(&parsed.gvk.kind), |v| is_truthy(v));
            if retain {
                info!(
                    object = %parsed.name,
                    namespace = %destination_namespace,
                    "source removed, retaining the copy"
                );
            } else {
                match api.delete(&parsed.name, &Default::default()).await {
                    Ok(_) => {
                        info!(
                            object = %parsed.name,
                            namespace = %destination_namespace,
                            "deleted orphaned copy"
                        );
                    }
                    Err(kube::Error::Api(response)) if response.code == 404 => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }

        ledger.remove(&key);
        ledger.remove(&destination_key);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_context(client: Client) -> Context {
        Context {
            cache: NamespaceCache::new(client.clone()),
            client,
            filters: SyncFilters::default(),
            operator_namespace: "platform-operator".to_string(),
        }
    }

    #[tokio::test]
    async fn destination_events_map_to_their_own_namespace() {
        use http::{Request, Response};
        use kube::client::Body;

        let (mock_service, _handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "platform-operator");
        let ctx = test_context(client);

        let refs = map_config_object(&ctx, Some("settings"), Some("user1-platform"));
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "user1-platform");
    }

    #[tokio::test]
    async fn ledger_events_never_trigger() {
        use http::{Request, Response};
        use kube::client::Body;

        let (mock_service, _handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "platform-operator");
        let ctx = test_context(client);

        assert!(map_config_object(&ctx, Some(SYNC_LEDGER_NAME), Some("user1-platform")).is_empty());
    }

    #[tokio::test]
    async fn source_events_fan_out_to_known_workspaces_only() {
        use http::{Request, Response};
        use kube::client::Body;

        let (mock_service, _handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "platform-operator");
        let ctx = test_context(client);

        // Empty cache: nothing to fan out to yet.
        assert!(map_config_object(&ctx, Some("settings"), Some("platform-operator")).is_empty());
    }

    #[tokio::test]
    async fn sweep_deletes_orphaned_configmap_copies() {
        use http::{Request, Response};
        use kube::client::Body;

        let (mock_service, mut handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "platform-operator");
        let ctx = test_context(client);

        let responder = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(
                request.uri().path(),
                "/api/v1/namespaces/u-platform/configmaps/settings"
            );
            let existing = serde_json::json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {"name": "settings", "namespace": "u-platform"},
                "data": {"a": "b"}
            });
            send.send_response(
                Response::builder()
                    .body(Body::from(serde_json::to_vec(&existing).unwrap()))
                    .unwrap(),
            );

            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(request.method(), http::Method::DELETE);
            assert_eq!(
                request.uri().path(),
                "/api/v1/namespaces/u-platform/configmaps/settings"
            );
            send.send_response(
                Response::builder()
                    .body(Body::from(serde_json::to_vec(&existing).unwrap()))
                    .unwrap(),
            );
        });

        let mut ledger = SyncLedger::default();
        ledger.set("v1_ConfigMap.settings.platform-operator", "7");
        ledger.set("v1_ConfigMap.settings.u-platform", "19");

        sweep_obsolete(&ctx, &mut ledger, "platform-operator", "u-platform", &HashSet::new())
            .await
            .unwrap();

        assert!(ledger.get("v1_ConfigMap.settings.platform-operator").is_none());
        assert!(ledger.get("v1_ConfigMap.settings.u-platform").is_none());
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn sweep_retains_orphaned_claims_by_default() {
        use http::{Request, Response};
        use kube::client::Body;

        let (mock_service, mut handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "platform-operator");
        let ctx = test_context(client);

        let responder = tokio::spawn(async move {
            // Only the GET; no delete follows for a retained claim.
            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(
                request.uri().path(),
                "/api/v1/namespaces/u-platform/persistentvolumeclaims/scratch"
            );
            let existing = serde_json::json!({
                "apiVersion": "v1",
                "kind": "PersistentVolumeClaim",
                "metadata": {"name": "scratch", "namespace": "u-platform"},
                "spec": {}
            });
            send.send_response(
                Response::builder()
                    .body(Body::from(serde_json::to_vec(&existing).unwrap()))
                    .unwrap(),
            );
        });

        let mut ledger = SyncLedger::default();
        ledger.set("v1_PersistentVolumeClaim.scratch.platform-operator", "3");
        ledger.set("v1_PersistentVolumeClaim.scratch.u-platform", "11");

        sweep_obsolete(&ctx, &mut ledger, "platform-operator", "u-platform", &HashSet::new())
            .await
            .unwrap();

        // Ledger entries go away even though the claim itself stays.
        assert!(ledger
            .get("v1_PersistentVolumeClaim.scratch.platform-operator")
            .is_none());
        assert!(ledger.get("v1_PersistentVolumeClaim.scratch.u-platform").is_none());
        responder.await.unwrap();
    }
}
