//! v2alpha1 CRD resources — a historical intermediate version of
//! `PlatformCluster`, kept only so existing objects stay convertible.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::is_default;

/// Spec object for the `PlatformCluster` v2alpha1 CRD.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
#[kube(
    kind = "PlatformCluster",
    group = "platform.dev",
    version = "v2alpha1",
    status = "PlatformClusterStatus",
    namespaced
)]
#[kube(derive = "PartialEq")]
#[kube(derive = "Default")]
pub struct PlatformClusterSpec {
    /// Whether the platform control plane is enabled at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Workspace endpoint exposure settings
    #[serde(skip_serializing_if = "is_default")]
    pub workspace_domain_endpoints: WorkspaceDomainEndpoints,
    /// Single-host gateway settings
    #[serde(skip_serializing_if = "is_default")]
    pub gateway: GatewaySpec,
    /// Settings only relevant on vanilla Kubernetes
    #[serde(skip_serializing_if = "is_default")]
    pub k8s: K8sSpec,
}

/// Workspace endpoint exposure settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceDomainEndpoints {
    /// Base DNS domain for workspace endpoints
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base_domain: String,
    /// Name of the TLS secret securing workspace endpoints
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tls_secret_name: String,
}

/// Single-host gateway settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewaySpec {
    /// Whether endpoints are exposed through the single-host gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Gateway host
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    /// Gateway container image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    /// Gateway config-watcher sidecar image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub configbump_image: String,
}

/// Settings only relevant on vanilla Kubernetes.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct K8sSpec {
    /// Annotations applied to workspace ingresses
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ingress_annotations: BTreeMap<String, String>,
}

/// Status object for the `PlatformCluster` v2alpha1 CRD.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformClusterStatus {
    /// Resolved gateway host
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gateway_host: String,
    /// Human-readable status message
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}
