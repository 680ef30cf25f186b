//! v1 CRD resources — the legacy flat version of `PlatformCluster`.
//!
//! This schema is served but no longer stored; the conversion webhook
//! translates it to [`crate::v2`] at the API boundary. Fields with no v2
//! counterpart survive round trips via the spec side-channel annotation.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{EnvVar, Toleration};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Component, DefaultPlugins};
use crate::{is_default, is_false};

/// Spec object for the `PlatformCluster` v1 CRD.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
#[kube(
    kind = "PlatformCluster",
    group = "platform.dev",
    version = "v1",
    status = "PlatformClusterStatus",
    shortname = "pfc",
    namespaced
)]
#[kube(derive = "PartialEq")]
#[kube(derive = "Default")]
pub struct PlatformClusterSpec {
    /// Platform server settings
    #[serde(skip_serializing_if = "is_default")]
    pub server: ServerSpec,
    /// Settings only relevant on vanilla Kubernetes
    #[serde(skip_serializing_if = "is_default")]
    pub k8s: K8sSpec,
    /// Authentication settings
    #[serde(skip_serializing_if = "is_default")]
    pub auth: AuthSpec,
    /// Workspace storage settings
    #[serde(skip_serializing_if = "is_default")]
    pub storage: StorageSpec,
    /// Metrics exposure
    #[serde(skip_serializing_if = "is_default")]
    pub metrics: MetricsSpec,
    /// Kubernetes image puller integration
    #[serde(skip_serializing_if = "is_default")]
    pub image_puller: ImagePullerSpec,
    /// DevWorkspace engine settings
    #[serde(skip_serializing_if = "is_default")]
    pub dev_workspace: DevWorkspaceSpec,
}

/// Flat platform server settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSpec {
    /// Public hostname of the platform server
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    /// Name of the TLS secret securing the platform endpoint
    #[serde(rename = "hostTLSSecret", skip_serializing_if = "String::is_empty")]
    pub host_tls_secret: String,
    /// Server container image, without tag
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_image: String,
    /// Server container image tag
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_image_tag: String,
    /// Server image pull policy
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_image_pull_policy: String,
    /// Remote debugger toggle as a string: `"true"`, `"false"` or empty
    #[serde(skip_serializing_if = "String::is_empty")]
    pub debug: String,
    /// Comma-separated ClusterRoles bound to the server service account
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cluster_roles: String,
    /// Extra environment variables for the server container
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub server_env: Vec<EnvVar>,
    /// Server memory request, canonical quantity string
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_memory_request: String,
    /// Server memory limit
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_memory_limit: String,
    /// Server CPU request
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_cpu_request: String,
    /// Server CPU limit
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_cpu_limit: String,
    /// Ingress customization (Kubernetes)
    #[serde(skip_serializing_if = "is_default")]
    pub server_ingress: IngressCustomSettings,
    /// Route customization (OpenShift)
    #[serde(skip_serializing_if = "is_default")]
    pub server_route: RouteCustomSettings,
    /// Pipe-separated hosts reached without the proxy
    #[serde(skip_serializing_if = "String::is_empty")]
    pub non_proxy_hosts: String,
    /// Proxy server URL
    #[serde(rename = "proxyURL", skip_serializing_if = "String::is_empty")]
    pub proxy_url: String,
    /// Proxy server port
    #[serde(skip_serializing_if = "String::is_empty")]
    pub proxy_port: String,
    /// Secret holding proxy credentials
    #[serde(skip_serializing_if = "String::is_empty")]
    pub proxy_secret: String,
    /// Namespace name template for new users
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workspace_namespace_default: String,
    /// Create the user namespace automatically on first login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_auto_provision_user_namespace: Option<bool>,
    /// Trust a self-signed Git server certificate
    #[serde(skip_serializing_if = "is_false")]
    pub git_self_signed_cert: bool,
    /// URL of an external plug-in registry
    #[serde(rename = "pluginRegistryUrl", skip_serializing_if = "String::is_empty")]
    pub plugin_registry_url: String,
    /// Plug-in registry container image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub plugin_registry_image: String,
    /// Plug-in registry image pull policy
    #[serde(skip_serializing_if = "String::is_empty")]
    pub plugin_registry_pull_policy: String,
    /// Plug-in registry memory request
    #[serde(skip_serializing_if = "String::is_empty")]
    pub plugin_registry_memory_request: String,
    /// Plug-in registry memory limit
    #[serde(skip_serializing_if = "String::is_empty")]
    pub plugin_registry_memory_limit: String,
    /// Plug-in registry CPU request
    #[serde(skip_serializing_if = "String::is_empty")]
    pub plugin_registry_cpu_request: String,
    /// Plug-in registry CPU limit
    #[serde(skip_serializing_if = "String::is_empty")]
    pub plugin_registry_cpu_limit: String,
    /// Devfile registry container image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub devfile_registry_image: String,
    /// Devfile registry image pull policy
    #[serde(skip_serializing_if = "String::is_empty")]
    pub devfile_registry_pull_policy: String,
    /// Devfile registry memory request
    #[serde(skip_serializing_if = "String::is_empty")]
    pub devfile_registry_memory_request: String,
    /// Devfile registry memory limit
    #[serde(skip_serializing_if = "String::is_empty")]
    pub devfile_registry_memory_limit: String,
    /// Devfile registry CPU request
    #[serde(skip_serializing_if = "String::is_empty")]
    pub devfile_registry_cpu_request: String,
    /// Devfile registry CPU limit
    #[serde(skip_serializing_if = "String::is_empty")]
    pub devfile_registry_cpu_limit: String,
    /// Dashboard container image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dashboard_image: String,
    /// Dashboard image pull policy
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dashboard_image_pull_policy: String,
    /// Dashboard memory request
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dashboard_memory_request: String,
    /// Dashboard memory limit
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dashboard_memory_limit: String,
    /// Dashboard CPU request
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dashboard_cpu_request: String,
    /// Dashboard CPU limit
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dashboard_cpu_limit: String,
    /// Gateway container image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub single_host_gateway_image: String,
    /// Gateway config-watcher sidecar image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub single_host_gateway_config_sidecar_image: String,
    /// Endpoint exposure strategy: `single-host`, `multi-host` or empty
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_exposure_strategy: String,
    /// Default editor applied to new workspaces
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workspace_default_editor: String,
    /// Default devfile components applied to new workspaces
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workspace_default_components: Vec<Component>,
    /// Default plug-ins applied per editor
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workspaces_default_plugins: Vec<DefaultPlugins>,
    /// Node selector applied to workspace pods
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub workspace_pod_node_selector: BTreeMap<String, String>,
    /// Tolerations applied to workspace pods
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workspace_pod_tolerations: Vec<Toleration>,
    /// Comma-separated ClusterRoles granted to workspace owners
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workspace_cluster_role: String,
}

/// Ingress customization (Kubernetes).
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct IngressCustomSettings {
    /// Comma-joined `k=v` labels applied to the ingress
    #[serde(skip_serializing_if = "String::is_empty")]
    pub labels: String,
    /// Annotations applied to the ingress
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Route customization (OpenShift).
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteCustomSettings {
    /// Route host domain
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,
    /// Comma-joined `k=v` labels applied to the route
    #[serde(skip_serializing_if = "String::is_empty")]
    pub labels: String,
    /// Annotations applied to the route
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Settings only relevant on vanilla Kubernetes.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct K8sSpec {
    /// Base DNS domain for ingresses
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ingress_domain: String,
    /// Ingress class name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ingress_class: String,
    /// Name of the TLS secret securing ingresses
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tls_secret_name: String,
    /// Ingress exposure strategy: `multi-host`, `single-host`, `default-host`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ingress_strategy: String,
}

/// Authentication settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSpec {
    /// Token kind passed to upstream workloads: `id_token` or `access_token`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub identity_token: String,
    /// Gateway container environment
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gateway_env: Vec<EnvVar>,
    /// Gateway config-watcher sidecar environment
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gateway_config_bump_env: Vec<EnvVar>,
    /// Authentication sidecar image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gateway_authentication_sidecar_image: String,
    /// Authentication sidecar environment
    #[serde(rename = "gatewayOAuthProxyEnv", skip_serializing_if = "Vec::is_empty")]
    pub gateway_o_auth_proxy_env: Vec<EnvVar>,
    /// Authorization sidecar image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gateway_authorization_sidecar_image: String,
    /// Authorization sidecar environment
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gateway_kube_rbac_proxy_env: Vec<EnvVar>,
}

/// Workspace storage settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSpec {
    /// PVC provisioning strategy
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pvc_strategy: String,
    /// Claim size for the per-user strategy
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pvc_claim_size: String,
    /// Storage class for the per-user strategy
    #[serde(
        rename = "workspacePVCStorageClassName",
        skip_serializing_if = "String::is_empty"
    )]
    pub workspace_pvc_storage_class_name: String,
    /// Claim size for the per-workspace strategy
    #[serde(skip_serializing_if = "String::is_empty")]
    pub per_workspace_strategy_pvc_claim_size: String,
    /// Storage class for the per-workspace strategy
    #[serde(
        rename = "perWorkspaceStrategyPVCStorageClassName",
        skip_serializing_if = "String::is_empty"
    )]
    pub per_workspace_strategy_pvc_storage_class_name: String,
}

/// Metrics exposure.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsSpec {
    /// Expose server metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

/// Kubernetes image puller integration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePullerSpec {
    /// Deploy the community image puller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

/// DevWorkspace engine settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DevWorkspaceSpec {
    /// DevWorkspace engine toggle
    #[serde(skip_serializing_if = "is_false")]
    pub enable: bool,
    /// Cap on simultaneously running workspaces per user, decimal string
    #[serde(skip_serializing_if = "String::is_empty")]
    pub running_limit: String,
    /// Inactivity period before a workspace is idled, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_of_inactivity_before_idling: Option<i32>,
    /// Total run period before a workspace is idled, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_of_run_before_idling: Option<i32>,
}

/// Status object for the `PlatformCluster` v1 CRD.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformClusterStatus {
    /// Availability string: `Available`, `Unavailable` or a transitional value
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cluster_running: String,
    /// Resolved public URL of the platform server
    #[serde(rename = "platformURL", skip_serializing_if = "String::is_empty")]
    pub platform_url: String,
    /// Deployed operand version; empty until first rollout completes
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Base DNS domain resolved for workspace endpoints
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workspace_base_domain: String,
    /// Human-readable status message
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Machine-readable status reason
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// ConfigMap holding the trusted Git server certificate
    #[serde(
        rename = "gitServerTLSCertificateConfigMapName",
        skip_serializing_if = "String::is_empty"
    )]
    pub git_server_tls_certificate_config_map_name: String,
}
