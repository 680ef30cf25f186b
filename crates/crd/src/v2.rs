//! v2 CRD resources — the nested, typed storage version of `PlatformCluster`.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{EnvVar, Toleration};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Component, DefaultPlugins};
use crate::{is_default, is_false};

/// Spec object for the `PlatformCluster` v2 CRD.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
#[kube(
    kind = "PlatformCluster",
    group = "platform.dev",
    version = "v2",
    status = "PlatformClusterStatus",
    shortname = "pfc",
    namespaced
)]
#[kube(derive = "PartialEq")]
#[kube(derive = "Default")]
pub struct PlatformClusterSpec {
    /// Networking, ingress and authentication gateway configuration
    #[serde(skip_serializing_if = "is_default")]
    pub networking: Networking,
    /// Control-plane component configuration
    #[serde(skip_serializing_if = "is_default")]
    pub components: Components,
    /// Development environment (workspace) defaults
    #[serde(skip_serializing_if = "is_default")]
    pub dev_environments: DevEnvironments,
    /// Air-gap container registry settings
    #[serde(skip_serializing_if = "is_default")]
    pub container_registry: ContainerRegistry,
    /// Git SCM provider integrations
    #[serde(skip_serializing_if = "is_default")]
    pub git_services: GitServices,
}

/// Networking configuration for the platform ingress/route and gateway.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Networking {
    /// Public hostname of the platform server
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    /// Base DNS domain for platform endpoints
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,
    /// Name of the TLS secret securing the platform endpoint
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tls_secret_name: String,
    /// Annotations applied to the ingress (or route)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// Labels applied to the ingress (or route)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Authentication gateway settings
    #[serde(skip_serializing_if = "is_default")]
    pub auth: Auth,
}

/// Authentication settings for the single-host gateway.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Auth {
    /// Token kind passed to upstream workloads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_token: Option<IdentityToken>,
    /// Gateway deployment customization
    #[serde(skip_serializing_if = "is_default")]
    pub gateway: Gateway,
    /// OAuth proxy sidecar settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub o_auth_proxy: Option<OAuthProxy>,
}

/// Identity token kind.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum IdentityToken {
    /// OIDC ID token
    #[serde(rename = "id_token")]
    IdToken,
    /// OAuth access token
    #[serde(rename = "access_token")]
    AccessToken,
}

/// Gateway deployment customization.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Gateway {
    /// Container-level overrides for the gateway pod
    #[serde(skip_serializing_if = "is_default")]
    pub deployment: Deployment,
    /// Labels stamped onto the generated gateway config
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(default = "default_gateway_config_labels")]
    pub config_labels: BTreeMap<String, String>,
}

fn default_gateway_config_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), "platform".to_string()),
        ("component".to_string(), "platform-gateway-config".to_string()),
    ])
}

/// OAuth proxy sidecar settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct OAuthProxy {
    /// Expiration period of the authentication cookie, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(default = "default_cookie_expire_seconds")]
    pub cookie_expire_seconds: Option<i32>,
}

fn default_cookie_expire_seconds() -> Option<i32> {
    Some(86400)
}

/// Deployment overrides for a managed component.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Deployment {
    /// Container-level overrides, matched by name
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
}

/// Container override within a component deployment.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    /// Container name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Container image reference
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    /// Image pull policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<PullPolicy>,
    /// Extra environment variables
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    /// Compute resource overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// Image pull policy enum.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum PullPolicy {
    /// Always pull the image
    Always,
    /// Pull only when not present on the node
    IfNotPresent,
    /// Never pull the image
    Never,
}

impl PullPolicy {
    /// The wire string of the policy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PullPolicy::Always => "Always",
            PullPolicy::IfNotPresent => "IfNotPresent",
            PullPolicy::Never => "Never",
        }
    }

    /// Parse a wire string; unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Always" => Some(PullPolicy::Always),
            "IfNotPresent" => Some(PullPolicy::IfNotPresent),
            "Never" => Some(PullPolicy::Never),
            _ => None,
        }
    }
}

/// CPU and memory requests/limits for a container.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceRequirements {
    /// Requested resources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceList>,
    /// Resource limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceList>,
}

/// A cpu/memory quantity pair.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceList {
    /// Memory quantity, canonical Kubernetes form (e.g. `512Mi`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Quantity>,
    /// CPU quantity, canonical Kubernetes form (e.g. `500m`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Quantity>,
}

/// Control-plane component configuration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Components {
    /// Platform server component
    #[serde(skip_serializing_if = "is_default")]
    pub server: ServerComponent,
    /// Dashboard component
    #[serde(skip_serializing_if = "is_default")]
    pub dashboard: Dashboard,
    /// Plug-in registry component
    #[serde(skip_serializing_if = "is_default")]
    pub plugin_registry: PluginRegistry,
    /// Devfile registry component
    #[serde(skip_serializing_if = "is_default")]
    pub devfile_registry: DevfileRegistry,
    /// Kubernetes image puller integration
    #[serde(skip_serializing_if = "is_default")]
    pub image_puller: ImagePuller,
    /// Metrics exposure
    #[serde(skip_serializing_if = "is_default")]
    pub metrics: Metrics,
}

/// Platform server component settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerComponent {
    /// Deployment overrides for the server pod
    #[serde(skip_serializing_if = "is_default")]
    pub deployment: Deployment,
    /// Server log level
    #[serde(skip_serializing_if = "String::is_empty")]
    #[schemars(default = "default_log_level")]
    pub log_level: String,
    /// Run the server under a remote debugger
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(default = "default_debug")]
    pub debug: Option<bool>,
    /// Extra ClusterRoles bound to the server service account
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cluster_roles: Vec<String>,
    /// Outbound proxy settings
    #[serde(skip_serializing_if = "is_default")]
    pub proxy: Proxy,
    /// Free-form server properties
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_properties: BTreeMap<String, String>,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_debug() -> Option<bool> {
    Some(false)
}

/// Outbound proxy settings for the platform server.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Proxy {
    /// Proxy server URL
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Proxy server port
    #[serde(skip_serializing_if = "String::is_empty")]
    pub port: String,
    /// Hosts reached without the proxy
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub non_proxy_hosts: Vec<String>,
    /// Secret holding proxy credentials
    #[serde(skip_serializing_if = "String::is_empty")]
    pub credentials_secret_name: String,
}

/// Dashboard component settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Dashboard {
    /// Deployment overrides for the dashboard pod
    #[serde(skip_serializing_if = "is_default")]
    pub deployment: Deployment,
    /// Dashboard log level
    #[serde(skip_serializing_if = "String::is_empty")]
    pub log_level: String,
    /// Banner shown at the top of the dashboard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_message: Option<HeaderMessage>,
}

/// Dashboard banner message.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderMessage {
    /// Whether the banner is shown
    #[serde(skip_serializing_if = "is_false")]
    pub show: bool,
    /// Banner text
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
}

/// Plug-in registry component settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginRegistry {
    /// Deployment overrides for the plug-in registry pod
    #[serde(skip_serializing_if = "is_default")]
    pub deployment: Deployment,
    /// Skip deploying the in-cluster registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_internal_registry: Option<bool>,
    /// External registries consulted instead of (or besides) the internal one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_plugin_registries: Vec<ExternalRegistry>,
}

/// Devfile registry component settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DevfileRegistry {
    /// Deployment overrides for the devfile registry pod
    #[serde(skip_serializing_if = "is_default")]
    pub deployment: Deployment,
    /// Skip deploying the in-cluster registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_internal_registry: Option<bool>,
    /// External registries consulted instead of (or besides) the internal one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_devfile_registries: Vec<ExternalRegistry>,
}

/// Reference to an external registry.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalRegistry {
    /// Registry URL
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

/// Kubernetes image puller integration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePuller {
    /// Deploy the community image puller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

/// Metrics exposure.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Metrics {
    /// Expose server metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(default = "default_metrics_enable")]
    pub enable: Option<bool>,
}

fn default_metrics_enable() -> Option<bool> {
    Some(true)
}

/// Development environment (workspace) defaults.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DevEnvironments {
    /// Per-user namespace provisioning
    #[serde(skip_serializing_if = "is_default")]
    pub default_namespace: DefaultNamespace,
    /// Workspace storage strategy
    #[serde(skip_serializing_if = "is_default")]
    pub storage: WorkspaceStorage,
    /// Self-signed certificate trust for Git servers
    #[serde(skip_serializing_if = "is_default")]
    pub trusted_certs: TrustedCerts,
    /// Default editor applied to new workspaces
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_editor: String,
    /// Default devfile components applied to new workspaces
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub default_components: Vec<Component>,
    /// Default plug-ins applied per editor
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub default_plugins: Vec<DefaultPlugins>,
    /// Node selector applied to workspace pods
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    /// Tolerations applied to workspace pods
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<Toleration>,
    /// Inactivity period before a workspace is idled, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(default = "default_seconds_of_inactivity")]
    pub seconds_of_inactivity_before_idling: Option<i32>,
    /// Total run period before a workspace is idled, in seconds (-1 = never)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(default = "default_seconds_of_run")]
    pub seconds_of_run_before_idling: Option<i32>,
    /// Workspace start timeout, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(default = "default_start_timeout")]
    pub start_timeout_seconds: Option<i32>,
    /// Cap on workspaces per user (-1 = unlimited)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(default = "default_max_workspaces")]
    pub max_number_of_workspaces_per_user: Option<i64>,
    /// Cap on simultaneously running workspaces per user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_number_of_running_workspaces_per_user: Option<i64>,
    /// Per-user RBAC applied inside workspace namespaces
    #[serde(skip_serializing_if = "is_default")]
    pub user: UserConfig,
    /// Disable the in-workspace container build capability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_container_build_capabilities: Option<bool>,
    /// Disable the in-workspace container run capability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_container_run_capabilities: Option<bool>,
    /// Container build capability configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_build_configuration: Option<ContainerBuildConfiguration>,
    /// Container run capability configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_run_configuration: Option<ContainerRunConfiguration>,
    /// Pod events that never recover and should fail the startup
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[schemars(default = "default_ignored_events")]
    pub ignored_unrecoverable_events: Vec<String>,
    /// Deployment strategy for workspace pods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_strategy: Option<DeploymentStrategy>,
}

fn default_seconds_of_inactivity() -> Option<i32> {
    Some(1800)
}

fn default_seconds_of_run() -> Option<i32> {
    Some(-1)
}

fn default_start_timeout() -> Option<i32> {
    Some(300)
}

fn default_max_workspaces() -> Option<i64> {
    Some(-1)
}

fn default_ignored_events() -> Vec<String> {
    vec!["FailedScheduling".to_string()]
}

/// Per-user namespace provisioning.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultNamespace {
    /// Namespace name template; `<username>` is substituted
    #[serde(skip_serializing_if = "String::is_empty")]
    #[schemars(default = "default_namespace_template")]
    pub template: String,
    /// Create the namespace automatically on first login
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(default = "default_auto_provision")]
    pub auto_provision: Option<bool>,
}

fn default_namespace_template() -> String {
    "<username>-platform".to_string()
}

fn default_auto_provision() -> Option<bool> {
    Some(true)
}

/// Workspace storage strategy.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceStorage {
    /// PVC provisioning strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pvc_strategy: Option<PvcStrategy>,
    /// PVC settings for the per-user strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_user_strategy_pvc_config: Option<PvcConfig>,
    /// PVC settings for the per-workspace strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_workspace_strategy_pvc_config: Option<PvcConfig>,
}

/// PVC provisioning strategy enum.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PvcStrategy {
    /// One PVC shared by every workspace
    Common,
    /// One PVC per user
    PerUser,
    /// One PVC per workspace
    PerWorkspace,
    /// No persistent storage
    Ephemeral,
}

impl PvcStrategy {
    /// The wire string of the strategy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PvcStrategy::Common => "common",
            PvcStrategy::PerUser => "per-user",
            PvcStrategy::PerWorkspace => "per-workspace",
            PvcStrategy::Ephemeral => "ephemeral",
        }
    }

    /// Parse a wire string; unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "common" => Some(PvcStrategy::Common),
            "per-user" => Some(PvcStrategy::PerUser),
            "per-workspace" => Some(PvcStrategy::PerWorkspace),
            "ephemeral" => Some(PvcStrategy::Ephemeral),
            _ => None,
        }
    }
}

/// PVC claim settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PvcConfig {
    /// Claim size, canonical Kubernetes quantity
    #[serde(skip_serializing_if = "String::is_empty")]
    pub claim_size: String,
    /// Storage class name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub storage_class: String,
}

/// Self-signed certificate trust for Git servers.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TrustedCerts {
    /// ConfigMap holding the trusted Git server certificate
    #[serde(skip_serializing_if = "String::is_empty")]
    pub git_trusted_certs_config_map_name: String,
}

/// Per-user RBAC applied inside workspace namespaces.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UserConfig {
    /// ClusterRoles granted to the workspace owner
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cluster_roles: Vec<String>,
}

/// Container build capability configuration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerBuildConfiguration {
    /// SCC granted to build pods on OpenShift
    #[serde(skip_serializing_if = "String::is_empty")]
    pub open_shift_security_context_constraint: String,
}

/// Container run capability configuration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerRunConfiguration {}

/// Workspace deployment strategy enum.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum DeploymentStrategy {
    /// Tear down before creating the new pod
    Recreate,
    /// Standard rolling update
    RollingUpdate,
}

/// Air-gap container registry settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerRegistry {
    /// Registry hostname
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    /// Registry organization
    #[serde(skip_serializing_if = "String::is_empty")]
    pub organization: String,
}

/// Git SCM provider integrations.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GitServices {
    /// GitHub integrations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub github: Vec<GitHubService>,
    /// GitLab integrations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gitlab: Vec<GitLabService>,
    /// Bitbucket integrations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bitbucket: Vec<BitbucketService>,
    /// Azure DevOps integrations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub azure_devops: Vec<AzureDevOpsService>,
}

/// GitHub SCM integration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GitHubService {
    /// Secret holding the OAuth application credentials
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret_name: String,
    /// GitHub server endpoint, for GitHub Enterprise
    #[serde(skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    /// Disable subdomain isolation on GitHub Enterprise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_subdomain_isolation: Option<bool>,
}

/// GitLab SCM integration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GitLabService {
    /// Secret holding the OAuth application credentials
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret_name: String,
    /// GitLab server endpoint
    #[serde(skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
}

/// Bitbucket SCM integration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct BitbucketService {
    /// Secret holding the OAuth 1 or OAuth 2 credentials
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret_name: String,
    /// Bitbucket server endpoint
    #[serde(skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
}

/// Azure DevOps SCM integration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureDevOpsService {
    /// Secret holding the OAuth application credentials
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret_name: String,
}

/// Status object for the `PlatformCluster` v2 CRD.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformClusterStatus {
    /// Lifecycle phase of the installation: [`PHASE_ACTIVE`],
    /// [`PHASE_INACTIVE`], [`PHASE_PENDING_DELETION`] or
    /// [`PHASE_ROLLING_UPDATE`]; transitional values pass through verbatim
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phase: String,
    /// Resolved public URL of the platform server
    #[serde(rename = "platformURL", skip_serializing_if = "String::is_empty")]
    pub platform_url: String,
    /// Base DNS domain resolved for workspace endpoints
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workspace_base_domain: String,
    /// Deployed operand version; empty until first rollout completes
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
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

/// Phase: fully rolled out and serving.
pub const PHASE_ACTIVE: &str = "Active";
/// Phase: not serving.
pub const PHASE_INACTIVE: &str = "Inactive";
/// Phase: deletion in progress.
pub const PHASE_PENDING_DELETION: &str = "PendingDeletion";
/// Phase: upgrade in progress.
pub const PHASE_ROLLING_UPDATE: &str = "RollingUpdate";
