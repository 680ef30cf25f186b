//! OpenShift Template expansion for the propagator.
//!
//! Templates labeled as workspaces-config in the source namespace embed raw
//! objects. Each embedded object goes through literal parameter
//! substitution over its serialized bytes, gets a SHA-256 content hash as
//! its version token, and then joins the regular per-source pipeline.

use kube::api::{ApiResource, DynamicObject, ListParams};
use kube::core::gvk::GroupVersionKind;
use kube::{Api, Client};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::constants::{COMPONENT_LABEL, ORG, PART_OF_LABEL, WORKSPACES_CONFIG_COMPONENT};
use crate::workspace_config::object::{api_resource_for, SyncObject};
use crate::Result;

/// Placeholder replaced with the destination namespace owner's username.
const PROJECT_ADMIN_USER_PARAM: &str = "${PROJECT_ADMIN_USER}";
/// Placeholder replaced with the destination namespace name.
const PROJECT_NAME_PARAM: &str = "${PROJECT_NAME}";

/// API coordinates of `template.openshift.io/v1 Template`.
#[must_use]
pub fn template_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk("template.openshift.io", "v1", "Template"))
}

/// Expand every workspaces-config Template of the source namespace into
/// sync sources for one destination namespace.
///
/// # Errors
/// Propagates API and decode errors.
pub async fn expand_templates(
    client: &Client,
    source_namespace: &str,
    username: &str,
    destination_namespace: &str,
) -> Result<Vec<SyncObject>> {
    let api: Api<DynamicObject> =
        Api::namespaced_with(client.clone(), source_namespace, &template_resource());
    let selector =
        format!("{PART_OF_LABEL}={ORG},{COMPONENT_LABEL}={WORKSPACES_CONFIG_COMPONENT}");
    let templates = api.list(&ListParams::default().labels(&selector)).await?;

    let mut sources = Vec::new();
    for template in &templates {
        let embedded = template
            .data
            .get("objects")
            .and_then(serde_json::Value::as_array)
            .cloned()
            .unwrap_or_default();
        for raw in &embedded {
            match expand_object(raw, username, destination_namespace) {
                Ok(source) => sources.push(source),
                Err(err) => {
                    // One broken embedded object must not block the rest.
                    warn!(
                        template = template.metadata.name.as_deref(),
                        error = %err,
                        "skipping undecodable template object"
                    );
                }
            }
        }
    }
    Ok(sources)
}

fn expand_object(
    raw: &serde_json::Value,
    username: &str,
    destination_namespace: &str,
) -> Result<SyncObject> {
    let substituted = substitute(&serde_json::to_string(raw)?, username, destination_namespace);
    let version = version_token(substituted.as_bytes());

    let object: DynamicObject = serde_json::from_str(&substituted)?;
    let gvk = object
        .types
        .as_ref()
        .map(|t| {
            let (group, version) = t
                .api_version
                .split_once('/')
                .unwrap_or(("", t.api_version.as_str()));
            GroupVersionKind::gvk(group, version, &t.kind)
        })
        .unwrap_or_else(|| GroupVersionKind::gvk("", "v1", "ConfigMap"));

    Ok(SyncObject::from_dynamic(object, api_resource_for(&gvk), version))
}

/// Literal parameter substitution over serialized object bytes.
fn substitute(raw: &str, username: &str, destination_namespace: &str) -> String {
    raw.replace(PROJECT_ADMIN_USER_PARAM, username)
        .replace(PROJECT_NAME_PARAM, destination_namespace)
}

/// SHA-256 hex of the post-substitution bytes.
fn version_token(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parameters_are_substituted_literally() {
        let raw = r#"{"data":{"owner":"${PROJECT_ADMIN_USER}","home":"${PROJECT_NAME}/cfg"}}"#;
        assert_eq!(
            substitute(raw, "user1", "user1-platform"),
            r#"{"data":{"owner":"user1","home":"user1-platform/cfg"}}"#
        );
    }

    #[test]
    fn unknown_parameters_are_left_alone() {
        let raw = "value: ${SOMETHING_ELSE}";
        assert_eq!(substitute(raw, "u", "n"), raw);
    }

    #[test]
    fn version_token_tracks_content_and_substitution() {
        let a = version_token(b"data");
        assert_eq!(a, version_token(b"data"));
        assert_ne!(a, version_token(b"other"));

        let raw = r#"{"a":"${PROJECT_ADMIN_USER}"}"#;
        let for_user1 = version_token(substitute(raw, "user1", "n").as_bytes());
        let for_user2 = version_token(substitute(raw, "user2", "n").as_bytes());
        assert_ne!(for_user1, for_user2);
    }

    #[test]
    fn embedded_configmap_expands_to_a_typed_resource() {
        let raw = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "settings-${PROJECT_ADMIN_USER}"},
            "data": {"ns": "${PROJECT_NAME}"}
        });

        let source = expand_object(&raw, "user1", "user1-platform").unwrap();
        assert_eq!(source.resource.plural, "configmaps");
        assert_eq!(source.name(), "settings-user1");
        assert_eq!(source.object.data["data"]["ns"], "user1-platform");
        assert_eq!(source.version.len(), 64);
    }

    #[test]
    fn template_watch_targets_the_openshift_template_api() {
        let resource = template_resource();
        assert_eq!(resource.group, "template.openshift.io");
        assert_eq!(resource.version, "v1");
        assert_eq!(resource.plural, "templates");
        assert_eq!(resource.kind, "Template");
    }

    #[test]
    fn unknown_kinds_stay_dynamic() {
        let raw = json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "Role",
            "metadata": {"name": "workspace-edit"},
            "rules": []
        });

        let source = expand_object(&raw, "u", "n").unwrap();
        assert_eq!(source.resource.group, "rbac.authorization.k8s.io");
        assert_eq!(source.resource.kind, "Role");
        assert!(!source.has_read_only_spec());
    }
}
