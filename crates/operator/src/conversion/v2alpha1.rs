//! Conversion between the v1 and the historical v2alpha1 `PlatformCluster`
//! schemas.
//!
//! v2alpha1 only ever modeled the gateway-exposure subset of v1, so the v1
//! spec rides along in full through the side-channel annotation and is
//! restored verbatim on the way back, with the gateway subset re-applied on
//! top.

use platform_crd::{v1, v2alpha1};

use crate::constants::V1_SPEC_ANNOTATION;
use crate::conversion::read_side_channel;
use crate::infra::Infrastructure;
use crate::Result;

const SINGLE_HOST: &str = "single-host";
const MULTI_HOST: &str = "multi-host";
const DEFAULT_HOST: &str = "default-host";

/// Convert a v1 object to v2alpha1.
///
/// # Errors
/// Fails only on a marshal failure of the side-channel payload.
pub fn v1_to_v2alpha1(
    source: &v1::PlatformCluster,
    infra: Infrastructure,
) -> Result<v2alpha1::PlatformCluster> {
    let src = &source.spec;
    let mut destination = v2alpha1::PlatformCluster {
        metadata: source.metadata.clone(),
        spec: v2alpha1::PlatformClusterSpec {
            enabled: Some(src.dev_workspace.enable),
            gateway: v2alpha1::GatewaySpec {
                enabled: Some(is_single_host(src, infra)),
                host: src.server.host.clone(),
                image: src.server.single_host_gateway_image.clone(),
                configbump_image: src.server.single_host_gateway_config_sidecar_image.clone(),
            },
            ..v2alpha1::PlatformClusterSpec::default()
        },
        status: None,
    };

    if infra.is_openshift() {
        destination.spec.workspace_domain_endpoints.base_domain =
            src.server.server_route.domain.clone();
        destination.spec.workspace_domain_endpoints.tls_secret_name =
            src.server.host_tls_secret.clone();
    } else {
        destination.spec.workspace_domain_endpoints.base_domain = src.k8s.ingress_domain.clone();
        destination.spec.workspace_domain_endpoints.tls_secret_name =
            src.k8s.tls_secret_name.clone();
        destination.spec.k8s.ingress_annotations = src.server.server_ingress.annotations.clone();
    }

    destination.status = source.status.as_ref().map(|status| v2alpha1::PlatformClusterStatus {
        gateway_host: src.server.host.clone(),
        message: status.message.clone(),
    });

    let payload = serde_yaml::to_string(&source.spec)?;
    destination
        .metadata
        .annotations
        .get_or_insert_default()
        .insert(V1_SPEC_ANNOTATION.to_string(), payload);
    Ok(destination)
}

/// Convert a v2alpha1 object back to v1.
///
/// # Errors
/// Fails only on a malformed side-channel payload.
pub fn v2alpha1_to_v1(
    source: &v2alpha1::PlatformCluster,
    infra: Infrastructure,
) -> Result<v1::PlatformCluster> {
    let mut destination = v1::PlatformCluster {
        metadata: source.metadata.clone(),
        spec: read_side_channel(&source.metadata, V1_SPEC_ANNOTATION)?.unwrap_or_default(),
        status: None,
    };
    if let Some(annotations) = destination.metadata.annotations.as_mut() {
        annotations.remove(V1_SPEC_ANNOTATION);
        if annotations.is_empty() {
            destination.metadata.annotations = None;
        }
    }

    let src = &source.spec;
    let dst = &mut destination.spec;

    if let Some(enabled) = src.enabled {
        dst.dev_workspace.enable = enabled;
    }
    dst.server.host = src.gateway.host.clone();
    dst.server.single_host_gateway_image = src.gateway.image.clone();
    dst.server.single_host_gateway_config_sidecar_image = src.gateway.configbump_image.clone();

    if infra.is_openshift() {
        dst.server.server_route.domain = src.workspace_domain_endpoints.base_domain.clone();
        dst.server.host_tls_secret = src.workspace_domain_endpoints.tls_secret_name.clone();
    } else {
        dst.k8s.ingress_domain = src.workspace_domain_endpoints.base_domain.clone();
        dst.k8s.tls_secret_name = src.workspace_domain_endpoints.tls_secret_name.clone();
        dst.server.server_ingress.annotations = src.k8s.ingress_annotations.clone();
    }

    reconstruct_exposure_strategy(dst, src.gateway.enabled.unwrap_or(false), infra);

    destination.status = source.status.as_ref().map(|status| v1::PlatformClusterStatus {
        message: status.message.clone(),
        ..v1::PlatformClusterStatus::default()
    });
    Ok(destination)
}

/// Whether the effective exposure strategy of a v1 spec is single-host.
///
/// `default-host` only exists on Kubernetes and exposes through the gateway,
/// so it counts as single-host there.
fn is_single_host(spec: &v1::PlatformClusterSpec, infra: Infrastructure) -> bool {
    match effective_exposure_strategy(spec, infra).as_str() {
        SINGLE_HOST => true,
        DEFAULT_HOST => !infra.is_openshift(),
        _ => false,
    }
}

fn effective_exposure_strategy(spec: &v1::PlatformClusterSpec, infra: Infrastructure) -> String {
    if !spec.server.server_exposure_strategy.is_empty() {
        return spec.server.server_exposure_strategy.clone();
    }
    if !infra.is_openshift() && !spec.k8s.ingress_strategy.is_empty() {
        return spec.k8s.ingress_strategy.clone();
    }
    default_exposure_strategy(spec)
}

fn default_exposure_strategy(spec: &v1::PlatformClusterSpec) -> String {
    if spec.dev_workspace.enable {
        SINGLE_HOST.to_string()
    } else {
        MULTI_HOST.to_string()
    }
}

/// Fold the boolean gateway switch back into the v1 strategy fields without
/// disturbing a spelling that already means the same thing.
fn reconstruct_exposure_strategy(
    dst: &mut v1::PlatformClusterSpec,
    gateway_enabled: bool,
    infra: Infrastructure,
) {
    let converted = if gateway_enabled { SINGLE_HOST } else { MULTI_HOST };

    if dst.server.server_exposure_strategy.is_empty() {
        if !infra.is_openshift() && !dst.k8s.ingress_strategy.is_empty() {
            let effective = if dst.k8s.ingress_strategy == DEFAULT_HOST {
                SINGLE_HOST
            } else {
                dst.k8s.ingress_strategy.as_str()
            };
            if converted != effective {
                dst.k8s.ingress_strategy = converted.to_string();
            }
        } else if converted != default_exposure_strategy(dst) {
            dst.server.server_exposure_strategy = converted.to_string();
        }
    } else if !(dst.server.server_exposure_strategy == DEFAULT_HOST && converted == SINGLE_HOST) {
        dst.server.server_exposure_strategy = converted.to_string();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use kube::api::ObjectMeta;

    use super::*;

    fn v1_cluster() -> v1::PlatformCluster {
        v1::PlatformCluster {
            metadata: ObjectMeta {
                name: Some("platform".to_string()),
                namespace: Some("platform-operator".to_string()),
                ..ObjectMeta::default()
            },
            spec: v1::PlatformClusterSpec::default(),
            status: None,
        }
    }

    #[test]
    fn empty_v1_round_trips_on_both_infrastructures() {
        for infra in [Infrastructure::Kubernetes, Infrastructure::OpenShiftV4] {
            let original = v1_cluster();
            let converted = v1_to_v2alpha1(&original, infra).unwrap();
            assert_eq!(converted.spec.enabled, Some(false));
            assert_eq!(converted.spec.gateway.enabled, Some(false));
            assert!(converted
                .metadata
                .annotations
                .as_ref()
                .unwrap()
                .contains_key(V1_SPEC_ANNOTATION));

            let restored = v2alpha1_to_v1(&converted, infra).unwrap();
            assert_eq!(restored.spec, original.spec);
            assert!(restored.metadata.annotations.is_none());
        }
    }

    #[test]
    fn devworkspace_enable_implies_single_host_default() {
        let mut original = v1_cluster();
        original.spec.dev_workspace.enable = true;

        let converted = v1_to_v2alpha1(&original, Infrastructure::OpenShiftV4).unwrap();
        assert_eq!(converted.spec.enabled, Some(true));
        assert_eq!(converted.spec.gateway.enabled, Some(true));

        let restored = v2alpha1_to_v1(&converted, Infrastructure::OpenShiftV4).unwrap();
        assert_eq!(restored.spec, original.spec);
    }

    #[test]
    fn endpoint_fields_follow_the_infrastructure() {
        let mut original = v1_cluster();
        original.spec.server.server_route.domain = "apps.cluster.example".to_string();
        original.spec.server.host_tls_secret = "route-tls".to_string();
        original.spec.k8s.ingress_domain = "ing.cluster.example".to_string();
        original.spec.k8s.tls_secret_name = "ingress-tls".to_string();
        original.spec.server.server_ingress.annotations =
            BTreeMap::from([("a".to_string(), "b".to_string())]);

        let on_openshift = v1_to_v2alpha1(&original, Infrastructure::OpenShiftV4).unwrap();
        assert_eq!(
            on_openshift.spec.workspace_domain_endpoints.base_domain,
            "apps.cluster.example"
        );
        assert_eq!(
            on_openshift.spec.workspace_domain_endpoints.tls_secret_name,
            "route-tls"
        );
        assert!(on_openshift.spec.k8s.ingress_annotations.is_empty());

        let on_k8s = v1_to_v2alpha1(&original, Infrastructure::Kubernetes).unwrap();
        assert_eq!(
            on_k8s.spec.workspace_domain_endpoints.base_domain,
            "ing.cluster.example"
        );
        assert_eq!(
            on_k8s.spec.workspace_domain_endpoints.tls_secret_name,
            "ingress-tls"
        );
        assert_eq!(
            on_k8s.spec.k8s.ingress_annotations.get("a").unwrap(),
            "b"
        );

        for infra in [Infrastructure::OpenShiftV4, Infrastructure::Kubernetes] {
            let converted = v1_to_v2alpha1(&original, infra).unwrap();
            let restored = v2alpha1_to_v1(&converted, infra).unwrap();
            assert_eq!(restored.spec, original.spec);
        }
    }

    #[test]
    fn default_host_ingress_strategy_survives_round_trip() {
        let mut original = v1_cluster();
        original.spec.k8s.ingress_strategy = DEFAULT_HOST.to_string();

        let converted = v1_to_v2alpha1(&original, Infrastructure::Kubernetes).unwrap();
        assert_eq!(converted.spec.gateway.enabled, Some(true));

        let restored = v2alpha1_to_v1(&converted, Infrastructure::Kubernetes).unwrap();
        assert_eq!(restored.spec.k8s.ingress_strategy, DEFAULT_HOST);
        assert_eq!(restored.spec, original.spec);
    }

    #[test]
    fn default_host_exposure_strategy_is_not_rewritten_to_single_host() {
        let mut original = v1_cluster();
        original.spec.server.server_exposure_strategy = DEFAULT_HOST.to_string();

        let converted = v1_to_v2alpha1(&original, Infrastructure::Kubernetes).unwrap();
        assert_eq!(converted.spec.gateway.enabled, Some(true));

        let restored = v2alpha1_to_v1(&converted, Infrastructure::Kubernetes).unwrap();
        assert_eq!(restored.spec.server.server_exposure_strategy, DEFAULT_HOST);
    }

    #[test]
    fn disabling_the_gateway_overwrites_an_explicit_strategy() {
        let mut original = v1_cluster();
        original.spec.server.server_exposure_strategy = SINGLE_HOST.to_string();

        let mut converted = v1_to_v2alpha1(&original, Infrastructure::OpenShiftV4).unwrap();
        converted.spec.gateway.enabled = Some(false);

        let restored = v2alpha1_to_v1(&converted, Infrastructure::OpenShiftV4).unwrap();
        assert_eq!(restored.spec.server.server_exposure_strategy, MULTI_HOST);
    }

    #[test]
    fn enabling_the_gateway_updates_a_multi_host_ingress_strategy() {
        let mut original = v1_cluster();
        original.spec.k8s.ingress_strategy = MULTI_HOST.to_string();

        let mut converted = v1_to_v2alpha1(&original, Infrastructure::Kubernetes).unwrap();
        converted.spec.gateway.enabled = Some(true);

        let restored = v2alpha1_to_v1(&converted, Infrastructure::Kubernetes).unwrap();
        assert_eq!(restored.spec.k8s.ingress_strategy, SINGLE_HOST);
        assert!(restored.spec.server.server_exposure_strategy.is_empty());
    }

    #[test]
    fn missing_side_channel_yields_default_base_spec() {
        let source = v2alpha1::PlatformCluster {
            metadata: ObjectMeta {
                name: Some("platform".to_string()),
                namespace: Some("platform-operator".to_string()),
                ..ObjectMeta::default()
            },
            spec: v2alpha1::PlatformClusterSpec {
                enabled: Some(true),
                gateway: v2alpha1::GatewaySpec {
                    enabled: Some(true),
                    host: "gateway.example".to_string(),
                    ..v2alpha1::GatewaySpec::default()
                },
                ..v2alpha1::PlatformClusterSpec::default()
            },
            status: None,
        };

        let restored = v2alpha1_to_v1(&source, Infrastructure::OpenShiftV4).unwrap();
        assert!(restored.spec.dev_workspace.enable);
        assert_eq!(restored.spec.server.host, "gateway.example");
        // enable=true makes single-host the inferred default; nothing written.
        assert!(restored.spec.server.server_exposure_strategy.is_empty());
    }
}
