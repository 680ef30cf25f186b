//! Source objects and destination building for the propagator.
//!
//! Every source, whether listed as a typed core object or expanded from an
//! OpenShift Template, is carried as a [`DynamicObject`] plus its
//! [`ApiResource`], so the create/replace/delete verbs share one code path.
//! Comparison and destination building work on the flattened body, which
//! excludes `metadata` by construction; `status` is stripped explicitly.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret};
use kube::api::{ApiResource, DynamicObject, ObjectMeta, TypeMeta};
use kube::core::gvk::GroupVersionKind;
use kube::Resource;
use regex::Regex;
use serde::Serialize;

use crate::constants::{
    COMPONENT_LABEL, DEVFILE_MOUNT_LABEL, DEVFILE_WATCH_CONFIGMAP_LABEL,
    DEVFILE_WATCH_SECRET_LABEL, FLAVOR, MANAGED_BY_LABEL, ORG, PART_OF_LABEL,
    WORKSPACES_CONFIG_COMPONENT,
};
use crate::workspace_config::ledger::ledger_key;
use crate::Result;

/// Label and annotation keys dropped before propagation.
#[derive(Clone, Debug, Default)]
pub struct SyncFilters {
    /// Regexes matching label keys to drop
    pub labels_to_remove: Vec<Regex>,
    /// Regexes matching annotation keys to drop
    pub annotations_to_remove: Vec<Regex>,
}

/// One source object together with its version token.
#[derive(Clone, Debug)]
pub struct SyncObject {
    /// The source body
    pub object: DynamicObject,
    /// Resource coordinates used for API verbs
    pub resource: ApiResource,
    /// Source version: resourceVersion for listed objects, a content hash
    /// for template-expanded ones
    pub version: String,
}

impl SyncObject {
    /// Wrap a typed core object; the version is its resourceVersion.
    ///
    /// # Errors
    /// Fails when the object cannot be re-marshalled.
    pub fn from_typed<K>(source: &K) -> Result<Self>
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let resource = ApiResource::erase::<K>(&());
        let version = source.meta().resource_version.clone().unwrap_or_default();
        let mut object: DynamicObject =
            serde_json::from_value(serde_json::to_value(source)?)?;
        object.types = Some(TypeMeta {
            api_version: resource.api_version.clone(),
            kind: resource.kind.clone(),
        });
        Ok(SyncObject {
            object,
            resource,
            version,
        })
    }

    /// Wrap an already-dynamic object with an explicit version token.
    #[must_use]
    pub fn from_dynamic(object: DynamicObject, resource: ApiResource, version: String) -> Self {
        SyncObject {
            object,
            resource,
            version,
        }
    }

    /// Group/version/kind of the source.
    #[must_use]
    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(&self.resource.group, &self.resource.version, &self.resource.kind)
    }

    /// Source object name.
    #[must_use]
    pub fn name(&self) -> String {
        self.object.metadata.name.clone().unwrap_or_default()
    }

    /// Ledger key of this object as it appears in `namespace`.
    #[must_use]
    pub fn key_in(&self, namespace: &str) -> String {
        ledger_key(&self.gvk(), &self.name(), namespace)
    }

    /// PVC specs are immutable after creation; drift is only logged.
    #[must_use]
    pub fn has_read_only_spec(&self) -> bool {
        self.resource.kind == "PersistentVolumeClaim"
    }

    /// Build the destination copy for a workspace namespace.
    ///
    /// The metadata is reset to name, filtered labels and annotations; the
    /// mandatory tracking labels always win, the devfile watch/mount labels
    /// only fill gaps the source left. Status never propagates.
    #[must_use]
    pub fn build_destination(&self, namespace: &str, filters: &SyncFilters) -> DynamicObject {
        let mut labels = self.object.metadata.labels.clone().unwrap_or_default();
        labels.retain(|key, _| !matches_any(key, &filters.labels_to_remove));

        match self.resource.kind.as_str() {
            "Secret" => {
                labels
                    .entry(DEVFILE_WATCH_SECRET_LABEL.to_string())
                    .or_insert_with(|| "true".to_string());
                labels
                    .entry(DEVFILE_MOUNT_LABEL.to_string())
                    .or_insert_with(|| "true".to_string());
            }
            "ConfigMap" => {
                labels
                    .entry(DEVFILE_WATCH_CONFIGMAP_LABEL.to_string())
                    .or_insert_with(|| "true".to_string());
                labels
                    .entry(DEVFILE_MOUNT_LABEL.to_string())
                    .or_insert_with(|| "true".to_string());
            }
            _ => {}
        }

        labels.insert(PART_OF_LABEL.to_string(), ORG.to_string());
        labels.insert(
            COMPONENT_LABEL.to_string(),
            WORKSPACES_CONFIG_COMPONENT.to_string(),
        );
        labels.insert(MANAGED_BY_LABEL.to_string(), FLAVOR.to_string());

        let mut annotations = self.object.metadata.annotations.clone().unwrap_or_default();
        annotations.retain(|key, _| !matches_any(key, &filters.annotations_to_remove));

        let mut destination = self.object.clone();
        destination.metadata = ObjectMeta {
            name: self.object.metadata.name.clone(),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            annotations: if annotations.is_empty() {
                None
            } else {
                Some(annotations)
            },
            ..ObjectMeta::default()
        };
        if let Some(body) = destination.data.as_object_mut() {
            body.remove("status");
        }
        destination
    }

    /// Whether the live destination diverges from the desired copy.
    ///
    /// Labels and annotations compare as a subset: every key the desired
    /// copy carries must hold the desired value; keys only the destination
    /// carries are third-party additions and never count as drift. The body
    /// compares structurally, ignoring metadata and status.
    #[must_use]
    pub fn differs_from(desired: &DynamicObject, existing: &DynamicObject) -> bool {
        if subset_differs(&desired.metadata.labels, &existing.metadata.labels)
            || subset_differs(&desired.metadata.annotations, &existing.metadata.annotations)
        {
            return true;
        }
        body_of(desired) != body_of(existing)
    }
}

/// Default retention of an orphaned destination copy: PVCs hold user data
/// and are kept, everything else is deleted.
#[must_use]
pub fn default_retain_on_delete(kind: &str) -> bool {
    kind == "PersistentVolumeClaim"
}

/// The `ApiResource` for a parsed ledger GVK; core kinds map to their
/// static coordinates, everything else is derived.
#[must_use]
pub fn api_resource_for(gvk: &GroupVersionKind) -> ApiResource {
    if gvk.group.is_empty() && gvk.version == "v1" {
        match gvk.kind.as_str() {
            "ConfigMap" => return ApiResource::erase::<ConfigMap>(&()),
            "Secret" => return ApiResource::erase::<Secret>(&()),
            "PersistentVolumeClaim" => return ApiResource::erase::<PersistentVolumeClaim>(&()),
            _ => {}
        }
    }
    ApiResource::from_gvk(gvk)
}

fn matches_any(key: &str, regexes: &[Regex]) -> bool {
    regexes.iter().any(|re| re.is_match(key))
}

fn subset_differs(
    desired: &Option<BTreeMap<String, String>>,
    existing: &Option<BTreeMap<String, String>>,
) -> bool {
    desired.iter().flatten().any(|(key, value)| {
        existing.as_ref().and_then(|map| map.get(key)) != Some(value)
    })
}

fn body_of(object: &DynamicObject) -> serde_json::Value {
    let mut body = object.data.clone();
    if let Some(map) = body.as_object_mut() {
        map.remove("status");
    }
    body
}
