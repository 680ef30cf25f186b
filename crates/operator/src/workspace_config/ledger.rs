//! The per-namespace sync ledger.
//!
//! A ConfigMap named `sync-workspaces-config` in every workspace namespace
//! records, per synchronized object, the last source version and the last
//! written destination resourceVersion. The ledger is loaded at the start of
//! a reconcile and committed as its final step, so a crash in between only
//! causes redundant re-syncs.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{ObjectMeta, PostParams};
use kube::core::gvk::GroupVersionKind;
use kube::{Api, Client};

use crate::constants::{
    COMPONENT_LABEL, FLAVOR, MANAGED_BY_LABEL, ORG, PART_OF_LABEL, SYNC_LEDGER_NAME,
    WORKSPACES_CONFIG_COMPONENT,
};
use crate::Result;

/// A parsed ledger key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerKey {
    /// Group/version/kind of the tracked object
    pub gvk: GroupVersionKind,
    /// Object name
    pub name: String,
    /// Object namespace
    pub namespace: String,
}

/// Deterministic ledger key of an object.
///
/// Shape: `<group-dashes>_<version>_<kind>.<name>.<namespace>`; the group
/// segment is omitted for core/v1 kinds. Object names may contain dots;
/// namespaces cannot, so parsing anchors on the first and last separator.
#[must_use]
pub fn ledger_key(gvk: &GroupVersionKind, name: &str, namespace: &str) -> String {
    if gvk.group.is_empty() {
        format!("{}_{}.{name}.{namespace}", gvk.version, gvk.kind)
    } else {
        format!(
            "{}_{}_{}.{name}.{namespace}",
            gvk.group.replace('.', "-"),
            gvk.version,
            gvk.kind
        )
    }
}

/// Parse a ledger key; `None` for malformed keys.
#[must_use]
pub fn parse_ledger_key(key: &str) -> Option<LedgerKey> {
    let (rest, namespace) = key.rsplit_once('.')?;
    let (gvk_part, name) = rest.split_once('.')?;
    if name.is_empty() || namespace.is_empty() {
        return None;
    }
    let segments: Vec<&str> = gvk_part.split('_').collect();
    let gvk = match segments.as_slice() {
        [version, kind] => GroupVersionKind::gvk("", version, kind),
        [group, version, kind] => {
            let group = group.replace('-', ".");
            GroupVersionKind::gvk(&group, version, kind)
        }
        _ => return None,
    };
    Some(LedgerKey {
        gvk,
        name: name.to_string(),
        namespace: namespace.to_string(),
    })
}

/// In-memory view of the ledger ConfigMap of one destination namespace.
#[derive(Clone, Debug, Default)]
pub struct SyncLedger {
    entries: BTreeMap<String, String>,
    resource_version: Option<String>,
}

impl SyncLedger {
    /// Load the ledger from the namespace; absent means empty.
    ///
    /// # Errors
    /// Propagates API errors other than NotFound.
    pub async fn load(client: &Client, namespace: &str) -> Result<Self> {
        let api: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
        let Some(config_map) = api.get_opt(SYNC_LEDGER_NAME).await? else {
            return Ok(SyncLedger::default());
        };
        Ok(SyncLedger {
            entries: config_map.data.unwrap_or_default(),
            resource_version: config_map.metadata.resource_version,
        })
    }

    /// Recorded version for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Record a version for a key.
    pub fn set(&mut self, key: &str, version: &str) {
        self.entries.insert(key.to_string(), version.to_string());
    }

    /// Drop a key.
    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// All keys whose namespace segment equals `namespace`.
    #[must_use]
    pub fn keys_in_namespace(&self, namespace: &str) -> Vec<String> {
        self.entries
            .keys()
            .filter(|key| {
                parse_ledger_key(key).is_some_and(|parsed| parsed.namespace == namespace)
            })
            .cloned()
            .collect()
    }

    /// Write the ledger back; creates the ConfigMap on first commit.
    ///
    /// # Errors
    /// Propagates API errors.
    pub async fn commit(&self, client: &Client, namespace: &str) -> Result<()> {
        let api: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some(SYNC_LEDGER_NAME.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(BTreeMap::from([
                    (PART_OF_LABEL.to_string(), ORG.to_string()),
                    (
                        COMPONENT_LABEL.to_string(),
                        WORKSPACES_CONFIG_COMPONENT.to_string(),
                    ),
                    (MANAGED_BY_LABEL.to_string(), FLAVOR.to_string()),
                ])),
                resource_version: self.resource_version.clone(),
                ..ObjectMeta::default()
            },
            data: Some(self.entries.clone()),
            ..ConfigMap::default()
        };

        if self.resource_version.is_some() {
            api.replace(SYNC_LEDGER_NAME, &PostParams::default(), &config_map)
                .await?;
        } else {
            api.create(&PostParams::default(), &config_map).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn core_kinds_have_no_group_segment() {
        let gvk = GroupVersionKind::gvk("", "v1", "Secret");
        assert_eq!(
            ledger_key(&gvk, "my-secret", "user1-platform"),
            "v1_Secret.my-secret.user1-platform"
        );
    }

    #[test]
    fn grouped_kinds_use_dashed_group() {
        let gvk = GroupVersionKind::gvk("template.openshift.io", "v1", "Template");
        assert_eq!(
            ledger_key(&gvk, "tpl", "ns"),
            "template-openshift-io_v1_Template.tpl.ns"
        );
    }

    #[test]
    fn parse_round_trips_including_dotted_names() {
        for (gvk, name, ns) in [
            (GroupVersionKind::gvk("", "v1", "ConfigMap"), "settings.d", "u-platform"),
            (
                GroupVersionKind::gvk("rbac.authorization.k8s.io", "v1", "Role"),
                "edit",
                "u-platform",
            ),
        ] {
            let key = ledger_key(&gvk, name, ns);
            let parsed = parse_ledger_key(&key).unwrap();
            assert_eq!(parsed.gvk, gvk);
            assert_eq!(parsed.name, name);
            assert_eq!(parsed.namespace, ns);
        }
    }

    #[test]
    fn malformed_keys_parse_to_none() {
        assert!(parse_ledger_key("").is_none());
        assert!(parse_ledger_key("v1_Secret").is_none());
        assert!(parse_ledger_key("no-separators-at-all").is_none());
        assert!(parse_ledger_key("v1.name.ns").is_none());
    }

    #[test]
    fn keys_are_filtered_by_namespace_segment() {
        let mut ledger = SyncLedger::default();
        ledger.set("v1_Secret.a.source-ns", "1");
        ledger.set("v1_Secret.a.dest-ns", "2");
        ledger.set("v1_ConfigMap.b.source-ns", "3");

        let mut keys = ledger.keys_in_namespace("source-ns");
        keys.sort();
        assert_eq!(
            keys,
            vec!["v1_ConfigMap.b.source-ns", "v1_Secret.a.source-ns"]
        );
    }

    #[tokio::test]
    async fn absent_ledger_loads_empty() {
        use http::{Request, Response};
        use kube::client::Body;

        let (mock_service, mut handle) =
            tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "default");

        let responder = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(
                request.uri().path(),
                "/api/v1/namespaces/u-platform/configmaps/sync-workspaces-config"
            );
            let status = serde_json::json!({
                "kind": "Status",
                "apiVersion": "v1",
                "status": "Failure",
                "reason": "NotFound",
                "code": 404
            });
            send.send_response(
                Response::builder()
                    .status(404)
                    .body(Body::from(serde_json::to_vec(&status).unwrap()))
                    .unwrap(),
            );
        });

        let ledger = SyncLedger::load(&client, "u-platform").await.unwrap();
        assert!(ledger.keys_in_namespace("u-platform").is_empty());
        responder.await.unwrap();
    }
}
