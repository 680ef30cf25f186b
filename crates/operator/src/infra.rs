//! One-shot infrastructure probe.
//!
//! Classifies the cluster once at startup; every other component reads the
//! result through the accessor functions. Conversion and admission take the
//! [`Infrastructure`] value as an explicit argument instead, so they stay
//! pure and testable without touching this module's state.

use std::env;
use std::sync::{PoisonError, RwLock};

use kube::{Client, discovery::Discovery};
use tracing::info;

use crate::Result;

/// API group whose presence marks an OpenShift cluster.
const ROUTE_GROUP: &str = "route.openshift.io";
/// API group carrying the `oauthclients` resource.
const OAUTH_GROUP: &str = "oauth.openshift.io";
/// API group carrying the `leases` resource.
const COORDINATION_GROUP: &str = "coordination.k8s.io";
/// API group installed by the community image puller operator.
const IMAGE_PULLER_GROUP: &str = "imagepuller.platform.dev";

/// Cluster flavor, detected once per process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Infrastructure {
    /// Vanilla Kubernetes
    Kubernetes,
    /// OpenShift 4.x
    OpenShiftV4,
    /// OpenShift 5.x
    OpenShiftV5,
    /// Probe has not run or produced no classification
    Unknown,
}

impl Infrastructure {
    /// Whether the flavor is any OpenShift version.
    #[must_use]
    pub fn is_openshift(self) -> bool {
        matches!(self, Infrastructure::OpenShiftV4 | Infrastructure::OpenShiftV5)
    }
}

/// Probe result: cluster flavor plus capability booleans.
#[derive(Clone, Copy, Debug)]
pub struct ClusterCapabilities {
    /// Detected cluster flavor
    pub infrastructure: Infrastructure,
    /// The `oauthclients` resource is served
    pub openshift_oauth: bool,
    /// The `leases` resource is served
    pub leader_election: bool,
    /// The image puller CRD group is installed
    pub image_puller: bool,
}

impl ClusterCapabilities {
    /// A plain-Kubernetes profile with leader election available.
    #[must_use]
    pub fn kubernetes() -> Self {
        ClusterCapabilities {
            infrastructure: Infrastructure::Kubernetes,
            openshift_oauth: false,
            leader_election: true,
            image_puller: false,
        }
    }
}

impl Default for ClusterCapabilities {
    fn default() -> Self {
        ClusterCapabilities {
            infrastructure: Infrastructure::Unknown,
            openshift_oauth: false,
            leader_election: false,
            image_puller: false,
        }
    }
}

static CAPABILITIES: RwLock<Option<ClusterCapabilities>> = RwLock::new(None);

fn store(caps: ClusterCapabilities) {
    let mut guard = CAPABILITIES
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = Some(caps);
}

/// The stored probe result, or the unknown profile before [`detect`] ran.
#[must_use]
pub fn get() -> ClusterCapabilities {
    CAPABILITIES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .unwrap_or_default()
}

/// Whether the cluster is OpenShift.
#[must_use]
pub fn is_openshift() -> bool {
    get().infrastructure.is_openshift()
}

/// Whether the OpenShift OAuth API is available.
#[must_use]
pub fn is_openshift_oauth_enabled() -> bool {
    get().openshift_oauth
}

/// Whether the leader-election (leases) API is available.
#[must_use]
pub fn is_leader_election_enabled() -> bool {
    get().leader_election
}

/// Whether the image puller CRDs are installed.
#[must_use]
pub fn is_image_puller_enabled() -> bool {
    get().image_puller
}

/// The detected cluster flavor.
#[must_use]
pub fn kind() -> Infrastructure {
    get().infrastructure
}

/// Install a capability profile directly, bypassing discovery.
pub fn set_for_tests(caps: ClusterCapabilities) {
    store(caps);
}

/// Probe the cluster once and store the result.
///
/// With `MOCK_API` set in the environment the probe is skipped and a plain
/// Kubernetes profile is installed instead.
///
/// # Errors
/// Returns the discovery error when the API cannot be enumerated; callers
/// treat this as fatal at startup.
pub async fn detect(client: &Client) -> Result<()> {
    if env::var_os(crate::config::MOCK_API_ENV).is_some() {
        info!("MOCK_API set, skipping infrastructure discovery");
        store(ClusterCapabilities::kubernetes());
        return Ok(());
    }

    let discovery = Discovery::new(client.clone()).run().await?;

    let mut caps = ClusterCapabilities {
        infrastructure: Infrastructure::Kubernetes,
        ..ClusterCapabilities::default()
    };

    for group in discovery.groups() {
        match group.name() {
            ROUTE_GROUP => {
                // Route API v1 means OpenShift 4; anything newer is treated
                // as the next major.
                caps.infrastructure = if group.preferred_version_or_latest() == "v1" {
                    Infrastructure::OpenShiftV4
                } else {
                    Infrastructure::OpenShiftV5
                };
            }
            OAUTH_GROUP => {
                caps.openshift_oauth = group
                    .recommended_resources()
                    .iter()
                    .any(|(ar, _)| ar.plural == "oauthclients");
            }
            COORDINATION_GROUP => {
                caps.leader_election = group
                    .recommended_resources()
                    .iter()
                    .any(|(ar, _)| ar.plural == "leases");
            }
            IMAGE_PULLER_GROUP => caps.image_puller = true,
            _ => {}
        }
    }

    info!(
        infrastructure = ?caps.infrastructure,
        openshift_oauth = caps.openshift_oauth,
        leader_election = caps.leader_election,
        image_puller = caps.image_puller,
        "infrastructure probe complete"
    );

    store(caps);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openshift_classification() {
        assert!(Infrastructure::OpenShiftV4.is_openshift());
        assert!(Infrastructure::OpenShiftV5.is_openshift());
        assert!(!Infrastructure::Kubernetes.is_openshift());
        assert!(!Infrastructure::Unknown.is_openshift());
    }

    #[test]
    fn override_for_tests() {
        set_for_tests(ClusterCapabilities::kubernetes());
        assert!(!is_openshift());
        assert!(is_leader_election_enabled());
    }
}
