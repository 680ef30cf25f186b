//! Namespace classification cache.
//!
//! A mutex-guarded view of every namespace's role: whether it hosts
//! workspaces, which user owns it, and which `PlatformCluster` it belongs
//! to. Entries are added only after a successful API fetch; missing or
//! terminating namespaces are purged rather than cached negatively.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use k8s_openapi::api::core::v1::Namespace;
use kube::api::{ApiResource, DynamicObject, ObjectMeta};
use kube::core::gvk::GroupVersionKind;
use kube::{Api, Client};

use crate::constants::{
    COMPONENT_LABEL, LEGACY_WORKSPACE_OWNER_UID_ANNOTATION, ORG, OWNER_NAME_LABEL,
    OWNER_NAMESPACE_LABEL, PART_OF_LABEL, USERNAME_ANNOTATION, WORKSPACES_NAMESPACE_COMPONENT,
};
use crate::{Result, infra};

/// Pointer to the owning `PlatformCluster`; both fields may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlatformClusterRef {
    /// Owning resource name
    pub name: String,
    /// Owning resource namespace
    pub namespace: String,
}

/// Classification of a single namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceInfo {
    /// The namespace hosts per-user workspaces
    pub workspace_namespace: bool,
    /// Owning username, from the username annotation
    pub username: String,
    /// Owning `PlatformCluster` pointer
    pub owner: PlatformClusterRef,
}

/// Concurrency-safe namespace classification cache.
#[derive(Clone)]
pub struct NamespaceCache {
    client: Client,
    entries: Arc<Mutex<HashMap<String, NamespaceInfo>>>,
}

impl NamespaceCache {
    /// Create an empty cache bound to a client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        NamespaceCache {
            client,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Cached entry, or fetch-and-cache on miss.
    ///
    /// Returns `None` without error when the namespace does not exist or is
    /// terminating.
    ///
    /// # Errors
    /// Propagates API errors other than NotFound.
    pub async fn get_namespace_info(&self, namespace: &str) -> Result<Option<NamespaceInfo>> {
        let cached = self
            .lock()
            .get(namespace)
            .cloned();
        if cached.is_some() {
            return Ok(cached);
        }
        self.examine_namespace(namespace).await
    }

    /// Force-refresh variant of [`Self::get_namespace_info`]; used by
    /// controllers on namespace events.
    ///
    /// # Errors
    /// Propagates API errors other than NotFound.
    pub async fn examine_namespace(&self, namespace: &str) -> Result<Option<NamespaceInfo>> {
        let Some(meta) = self.fetch_meta(namespace).await? else {
            self.lock().remove(namespace);
            return Ok(None);
        };

        if meta.deletion_timestamp.is_some() {
            self.lock().remove(namespace);
            return Ok(None);
        }

        let info = classify(&meta);
        self.lock().insert(namespace.to_string(), info.clone());
        Ok(Some(info))
    }

    /// Names of every namespace currently classified.
    #[must_use]
    pub fn get_all_known_namespaces(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Names of every namespace currently classified as a workspace host.
    #[must_use]
    pub fn get_workspace_namespaces(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(_, info)| info.workspace_namespace)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, NamespaceInfo>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the namespace (or OpenShift project) metadata; `None` when the
    /// object does not exist.
    async fn fetch_meta(&self, namespace: &str) -> Result<Option<ObjectMeta>> {
        if infra::is_openshift() {
            let resource = ApiResource::from_gvk(&GroupVersionKind::gvk(
                "project.openshift.io",
                "v1",
                "Project",
            ));
            let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);
            Ok(api.get_opt(namespace).await?.map(|p| p.metadata))
        } else {
            let api: Api<Namespace> = Api::all(self.client.clone());
            Ok(api.get_opt(namespace).await?.map(|n| n.metadata))
        }
    }
}

/// Derive a classification from namespace labels and annotations.
#[must_use]
pub fn classify(meta: &ObjectMeta) -> NamespaceInfo {
    let empty = BTreeMap::new();
    let labels = meta.labels.as_ref().unwrap_or(&empty);
    let annotations = meta.annotations.as_ref().unwrap_or(&empty);

    let legacy = annotations
        .get(LEGACY_WORKSPACE_OWNER_UID_ANNOTATION)
        .is_some_and(|uid| !uid.is_empty());
    let labeled = labels.get(PART_OF_LABEL).map(String::as_str) == Some(ORG)
        && labels.get(COMPONENT_LABEL).map(String::as_str) == Some(WORKSPACES_NAMESPACE_COMPONENT);

    NamespaceInfo {
        workspace_namespace: legacy || labeled,
        username: annotations
            .get(USERNAME_ANNOTATION)
            .cloned()
            .unwrap_or_default(),
        owner: PlatformClusterRef {
            name: labels.get(OWNER_NAME_LABEL).cloned().unwrap_or_default(),
            namespace: labels
                .get(OWNER_NAMESPACE_LABEL)
                .cloned()
                .unwrap_or_default(),
        },
    }
}
