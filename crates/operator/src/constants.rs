//! Label and annotation keys used at the API boundary.

/// Organization domain; value of the `app.kubernetes.io/part-of` label.
pub const ORG: &str = "platform.dev";

/// Operator flavor; value of the `app.kubernetes.io/managed-by` label.
pub const FLAVOR: &str = "platform";

/// Standard part-of label key.
pub const PART_OF_LABEL: &str = "app.kubernetes.io/part-of";

/// Standard component label key.
pub const COMPONENT_LABEL: &str = "app.kubernetes.io/component";

/// Standard managed-by label key.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Component value marking propagation sources and copies.
pub const WORKSPACES_CONFIG_COMPONENT: &str = "workspaces-config";

/// Component value marking per-user workspace namespaces.
pub const WORKSPACES_NAMESPACE_COMPONENT: &str = "workspaces-namespace";

/// Component value stamped onto SCM OAuth secrets.
pub const OAUTH_SCM_COMPONENT: &str = "oauth-scm-configuration";

/// Side-channel annotation holding the serialized v1 spec.
pub const V1_SPEC_ANNOTATION: &str = "platform.dev/v1-spec";

/// Side-channel annotation holding the serialized v2 spec.
pub const V2_SPEC_ANNOTATION: &str = "platform.dev/v2-spec";

/// Marker annotation recording already-run defaults-cleanup tasks.
pub const DEFAULTS_CLEANUP_ANNOTATION: &str = "platform.dev/platformcluster-defaults-cleanup";

/// Retention opt-in consulted when a propagated copy loses its source.
pub const SYNC_RETAIN_ON_DELETE_ANNOTATION: &str = "platform.dev/sync-retain-on-delete";

/// Retention opt-in consulted before replacing an unmanaged destination.
pub const SYNC_RETAIN_ANNOTATION: &str = "platform.dev/sync-retain";

/// SCM provider name stamped onto OAuth secrets.
pub const OAUTH_SCM_SERVER_ANNOTATION: &str = "platform.dev/oauth-scm-server";

/// SCM server endpoint backfilled onto OAuth secrets.
pub const SCM_SERVER_ENDPOINT_ANNOTATION: &str = "platform.dev/scm-server-endpoint";

/// GitHub subdomain-isolation flag backfilled onto OAuth secrets.
pub const SCM_GITHUB_DISABLE_SUBDOMAIN_ISOLATION_ANNOTATION: &str =
    "platform.dev/scm-github-disable-subdomain-isolation";

/// Annotation holding the workspace namespace owner's username.
pub const USERNAME_ANNOTATION: &str = "platform.dev/username";

/// Label pointing at the owning `PlatformCluster` name.
pub const OWNER_NAME_LABEL: &str = "platform.dev/platformcluster-name";

/// Label pointing at the owning `PlatformCluster` namespace.
pub const OWNER_NAMESPACE_LABEL: &str = "platform.dev/platformcluster-namespace";

/// Legacy annotation marking workspace namespaces by owner UID.
pub const LEGACY_WORKSPACE_OWNER_UID_ANNOTATION: &str =
    "platform.dev/workspace-namespace-owner-uid";

/// DevWorkspace label requesting secret watching.
pub const DEVFILE_WATCH_SECRET_LABEL: &str = "controller.devfile.io/watch-secret";

/// DevWorkspace label requesting configmap watching.
pub const DEVFILE_WATCH_CONFIGMAP_LABEL: &str = "controller.devfile.io/watch-configmap";

/// DevWorkspace label requesting a mount into workspace pods.
pub const DEVFILE_MOUNT_LABEL: &str = "controller.devfile.io/mount-to-devworkspace";

/// Name of the per-namespace sync ledger ConfigMap.
pub const SYNC_LEDGER_NAME: &str = "sync-workspaces-config";

/// Legacy ingress class annotation key.
pub const INGRESS_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";

/// Fixed ConfigMap name used for the Git self-signed certificate round trip.
pub const GIT_SELF_SIGNED_CERT_CONFIG_MAP: &str = "platform-git-self-signed-cert";

/// Interpret an annotation value as a boolean opt-in.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

#[cfg(test)]
mod tests {
    use super::is_truthy;

    #[test]
    fn truthy_values() {
        assert!(is_truthy("true"));
        assert!(is_truthy("True"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("yes"));
    }
}
