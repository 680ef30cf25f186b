//! Conversion between the v1 (flat) and v2 (nested) `PlatformCluster`
//! schemas.
//!
//! Both directions are total: fields the destination schema cannot express
//! survive through the side-channel annotation written by the opposite
//! direction. Every mapping is deterministic in `(input, infrastructure)`.

use k8s_openapi::api::core::v1::EnvVar;
use platform_crd::{v1, v2};

use crate::constants::{
    GIT_SELF_SIGNED_CERT_CONFIG_MAP, INGRESS_CLASS_ANNOTATION, V1_SPEC_ANNOTATION,
    V2_SPEC_ANNOTATION,
};
use crate::conversion::{
    format_kv_string, join_image, join_list, parse_kv_string, parse_quantity, quantity_string,
    read_side_channel, split_image, split_list, write_side_channel,
};
use crate::infra::Infrastructure;
use crate::Result;

/// Name given to the server container when v1 data materializes one.
const SERVER_CONTAINER: &str = "platform-server";
/// Name given to the dashboard container when v1 data materializes one.
const DASHBOARD_CONTAINER: &str = "dashboard";
/// Name given to the plug-in registry container.
const PLUGIN_REGISTRY_CONTAINER: &str = "plugin-registry";
/// Name given to the devfile registry container.
const DEVFILE_REGISTRY_CONTAINER: &str = "devfile-registry";

/// The four positional gateway container slots of the v1 schema.
const GATEWAY_CONTAINER: &str = "gateway";
const CONFIGBUMP_CONTAINER: &str = "configbump";
const OAUTH_PROXY_CONTAINER: &str = "oauth-proxy";
const KUBE_RBAC_PROXY_CONTAINER: &str = "kube-rbac-proxy";

/// Convert a v1 object to v2.
///
/// # Errors
/// Fails only on a malformed side-channel payload or a marshal failure.
pub fn v1_to_v2(source: &v1::PlatformCluster, infra: Infrastructure) -> Result<v2::PlatformCluster> {
    let mut destination = v2::PlatformCluster {
        metadata: source.metadata.clone(),
        spec: read_side_channel(&source.metadata, V2_SPEC_ANNOTATION)?.unwrap_or_default(),
        status: None,
    };

    map_networking_to_v2(&source.spec, &mut destination.spec.networking, infra);
    map_components_to_v2(&source.spec, &mut destination.spec.components);
    map_dev_environments_to_v2(source, &mut destination.spec.dev_environments);
    destination.status = status_to_v2(source.status.as_ref());

    write_side_channel(
        &mut destination.metadata,
        V1_SPEC_ANNOTATION,
        V2_SPEC_ANNOTATION,
        &source.spec,
    )?;
    Ok(destination)
}

/// Convert a v2 object to v1.
///
/// # Errors
/// Fails only on a malformed side-channel payload or a marshal failure.
pub fn v2_to_v1(source: &v2::PlatformCluster, infra: Infrastructure) -> Result<v1::PlatformCluster> {
    let mut destination = v1::PlatformCluster {
        metadata: source.metadata.clone(),
        spec: read_side_channel(&source.metadata, V1_SPEC_ANNOTATION)?.unwrap_or_default(),
        status: None,
    };

    map_networking_to_v1(&source.spec.networking, &mut destination.spec, infra);
    map_components_to_v1(&source.spec.components, &mut destination.spec);
    destination.status = status_to_v1(source.status.as_ref());
    map_dev_environments_to_v1(&source.spec.dev_environments, &mut destination);

    write_side_channel(
        &mut destination.metadata,
        V2_SPEC_ANNOTATION,
        V1_SPEC_ANNOTATION,
        &source.spec,
    )?;
    Ok(destination)
}

fn map_networking_to_v2(
    src: &v1::PlatformClusterSpec,
    net: &mut v2::Networking,
    infra: Infrastructure,
) {
    net.hostname = src.server.host.clone();

    if infra.is_openshift() {
        net.tls_secret_name = src.server.host_tls_secret.clone();
        net.domain = src.server.server_route.domain.clone();
        net.annotations = src.server.server_route.annotations.clone();
        net.labels = parse_kv_string(&src.server.server_route.labels);
    } else {
        // CheHost-level TLS secret wins when both are set.
        net.tls_secret_name = if src.server.host_tls_secret.is_empty() {
            src.k8s.tls_secret_name.clone()
        } else {
            src.server.host_tls_secret.clone()
        };
        net.domain = src.k8s.ingress_domain.clone();
        let mut annotations = src.server.server_ingress.annotations.clone();
        if !src.k8s.ingress_class.is_empty() {
            annotations.insert(
                INGRESS_CLASS_ANNOTATION.to_string(),
                src.k8s.ingress_class.clone(),
            );
        }
        net.annotations = annotations;
        net.labels = parse_kv_string(&src.server.server_ingress.labels);
    }

    if !src.auth.identity_token.is_empty() {
        net.auth.identity_token = match src.auth.identity_token.as_str() {
            "id_token" => Some(v2::IdentityToken::IdToken),
            "access_token" => Some(v2::IdentityToken::AccessToken),
            _ => None,
        };
    }

    let containers = &mut net.auth.gateway.deployment.containers;
    upsert_gateway_container(
        containers,
        GATEWAY_CONTAINER,
        &src.server.single_host_gateway_image,
        &src.auth.gateway_env,
    );
    upsert_gateway_container(
        containers,
        CONFIGBUMP_CONTAINER,
        &src.server.single_host_gateway_config_sidecar_image,
        &src.auth.gateway_config_bump_env,
    );
    upsert_gateway_container(
        containers,
        OAUTH_PROXY_CONTAINER,
        &src.auth.gateway_authentication_sidecar_image,
        &src.auth.gateway_o_auth_proxy_env,
    );
    upsert_gateway_container(
        containers,
        KUBE_RBAC_PROXY_CONTAINER,
        &src.auth.gateway_authorization_sidecar_image,
        &src.auth.gateway_kube_rbac_proxy_env,
    );
}

fn map_networking_to_v1(
    net: &v2::Networking,
    dst: &mut v1::PlatformClusterSpec,
    infra: Infrastructure,
) {
    dst.server.host = net.hostname.clone();

    if infra.is_openshift() {
        dst.server.host_tls_secret = net.tls_secret_name.clone();
        dst.server.server_route.domain = net.domain.clone();
        dst.server.server_route.annotations = net.annotations.clone();
        dst.server.server_route.labels = format_kv_string(&net.labels);
    } else {
        dst.k8s.tls_secret_name = net.tls_secret_name.clone();
        dst.k8s.ingress_domain = net.domain.clone();
        let mut annotations = net.annotations.clone();
        match annotations.remove(INGRESS_CLASS_ANNOTATION) {
            Some(class) => dst.k8s.ingress_class = class,
            None => dst.k8s.ingress_class.clear(),
        }
        dst.server.server_ingress.annotations = annotations;
        dst.server.server_ingress.labels = format_kv_string(&net.labels);
    }

    if let Some(token) = net.auth.identity_token {
        dst.auth.identity_token = match token {
            v2::IdentityToken::IdToken => "id_token".to_string(),
            v2::IdentityToken::AccessToken => "access_token".to_string(),
        };
    }

    for container in &net.auth.gateway.deployment.containers {
        match container.name.as_str() {
            GATEWAY_CONTAINER => {
                dst.server.single_host_gateway_image = container.image.clone();
                dst.auth.gateway_env = container.env.clone();
            }
            CONFIGBUMP_CONTAINER => {
                dst.server.single_host_gateway_config_sidecar_image = container.image.clone();
                dst.auth.gateway_config_bump_env = container.env.clone();
            }
            OAUTH_PROXY_CONTAINER => {
                dst.auth.gateway_authentication_sidecar_image = container.image.clone();
                dst.auth.gateway_o_auth_proxy_env = container.env.clone();
            }
            KUBE_RBAC_PROXY_CONTAINER => {
                dst.auth.gateway_authorization_sidecar_image = container.image.clone();
                dst.auth.gateway_kube_rbac_proxy_env = container.env.clone();
            }
            // Unknown slots only survive through the side-channel.
            _ => {}
        }
    }
}

fn map_components_to_v2(src: &v1::PlatformClusterSpec, comp: &mut v2::Components) {
    let server = container_from_v1(
        SERVER_CONTAINER,
        &join_image(&src.server.server_image, &src.server.server_image_tag),
        &src.server.server_image_pull_policy,
        &src.server.server_memory_request,
        &src.server.server_memory_limit,
        &src.server.server_cpu_request,
        &src.server.server_cpu_limit,
        &src.server.server_env,
    );
    apply_container(&mut comp.server.deployment, server);

    comp.server.debug = match src.server.debug.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    };
    comp.server.cluster_roles = split_list(&src.server.cluster_roles, ',');
    comp.server.proxy.url = src.server.proxy_url.clone();
    comp.server.proxy.port = src.server.proxy_port.clone();
    comp.server.proxy.credentials_secret_name = src.server.proxy_secret.clone();
    comp.server.proxy.non_proxy_hosts = split_list(&src.server.non_proxy_hosts, '|');

    apply_container(
        &mut comp.dashboard.deployment,
        container_from_v1(
            DASHBOARD_CONTAINER,
            &src.server.dashboard_image,
            &src.server.dashboard_image_pull_policy,
            &src.server.dashboard_memory_request,
            &src.server.dashboard_memory_limit,
            &src.server.dashboard_cpu_request,
            &src.server.dashboard_cpu_limit,
            &[],
        ),
    );
    apply_container(
        &mut comp.plugin_registry.deployment,
        container_from_v1(
            PLUGIN_REGISTRY_CONTAINER,
            &src.server.plugin_registry_image,
            &src.server.plugin_registry_pull_policy,
            &src.server.plugin_registry_memory_request,
            &src.server.plugin_registry_memory_limit,
            &src.server.plugin_registry_cpu_request,
            &src.server.plugin_registry_cpu_limit,
            &[],
        ),
    );
    apply_container(
        &mut comp.devfile_registry.deployment,
        container_from_v1(
            DEVFILE_REGISTRY_CONTAINER,
            &src.server.devfile_registry_image,
            &src.server.devfile_registry_pull_policy,
            &src.server.devfile_registry_memory_request,
            &src.server.devfile_registry_memory_limit,
            &src.server.devfile_registry_cpu_request,
            &src.server.devfile_registry_cpu_limit,
            &[],
        ),
    );

    if !src.server.plugin_registry_url.is_empty() {
        match comp.plugin_registry.external_plugin_registries.first_mut() {
            Some(first) => first.url = src.server.plugin_registry_url.clone(),
            None => comp.plugin_registry.external_plugin_registries.push(v2::ExternalRegistry {
                url: src.server.plugin_registry_url.clone(),
            }),
        }
    }

    comp.metrics.enable = src.metrics.enable;
    comp.image_puller.enable = src.image_puller.enable;
}

fn map_components_to_v1(comp: &v2::Components, dst: &mut v1::PlatformClusterSpec) {
    if let Some(c) = comp.server.deployment.containers.first() {
        let (image, tag) = split_image(&c.image);
        dst.server.server_image = image;
        dst.server.server_image_tag = tag;
        if let Some(policy) = c.image_pull_policy {
            dst.server.server_image_pull_policy = policy.as_str().to_string();
        }
        dst.server.server_env = c.env.clone();
        let (mem_req, mem_lim, cpu_req, cpu_lim) = resource_strings(c.resources.as_ref());
        dst.server.server_memory_request = mem_req;
        dst.server.server_memory_limit = mem_lim;
        dst.server.server_cpu_request = cpu_req;
        dst.server.server_cpu_limit = cpu_lim;
    }

    dst.server.debug = match comp.server.debug {
        Some(true) => "true".to_string(),
        Some(false) => "false".to_string(),
        None => String::new(),
    };
    dst.server.cluster_roles = join_list(&comp.server.cluster_roles, ',');
    dst.server.proxy_url = comp.server.proxy.url.clone();
    dst.server.proxy_port = comp.server.proxy.port.clone();
    dst.server.proxy_secret = comp.server.proxy.credentials_secret_name.clone();
    dst.server.non_proxy_hosts = join_list(&comp.server.proxy.non_proxy_hosts, '|');

    if let Some(c) = comp.dashboard.deployment.containers.first() {
        dst.server.dashboard_image = c.image.clone();
        if let Some(policy) = c.image_pull_policy {
            dst.server.dashboard_image_pull_policy = policy.as_str().to_string();
        }
        let (mem_req, mem_lim, cpu_req, cpu_lim) = resource_strings(c.resources.as_ref());
        dst.server.dashboard_memory_request = mem_req;
        dst.server.dashboard_memory_limit = mem_lim;
        dst.server.dashboard_cpu_request = cpu_req;
        dst.server.dashboard_cpu_limit = cpu_lim;
    }
    if let Some(c) = comp.plugin_registry.deployment.containers.first() {
        dst.server.plugin_registry_image = c.image.clone();
        if let Some(policy) = c.image_pull_policy {
            dst.server.plugin_registry_pull_policy = policy.as_str().to_string();
        }
        let (mem_req, mem_lim, cpu_req, cpu_lim) = resource_strings(c.resources.as_ref());
        dst.server.plugin_registry_memory_request = mem_req;
        dst.server.plugin_registry_memory_limit = mem_lim;
        dst.server.plugin_registry_cpu_request = cpu_req;
        dst.server.plugin_registry_cpu_limit = cpu_lim;
    }
    if let Some(c) = comp.devfile_registry.deployment.containers.first() {
        dst.server.devfile_registry_image = c.image.clone();
        if let Some(policy) = c.image_pull_policy {
            dst.server.devfile_registry_pull_policy = policy.as_str().to_string();
        }
        let (mem_req, mem_lim, cpu_req, cpu_lim) = resource_strings(c.resources.as_ref());
        dst.server.devfile_registry_memory_request = mem_req;
        dst.server.devfile_registry_memory_limit = mem_lim;
        dst.server.devfile_registry_cpu_request = cpu_req;
        dst.server.devfile_registry_cpu_limit = cpu_lim;
    }

    // Only the first external registry is representable in v1.
    if let Some(first) = comp.plugin_registry.external_plugin_registries.first() {
        dst.server.plugin_registry_url = first.url.clone();
    }

    dst.metrics.enable = comp.metrics.enable;
    dst.image_puller.enable = comp.image_puller.enable;
}

fn map_dev_environments_to_v2(source: &v1::PlatformCluster, dev: &mut v2::DevEnvironments) {
    let spec = &source.spec;

    dev.default_namespace.template = spec.server.workspace_namespace_default.clone();
    dev.default_namespace.auto_provision = spec.server.allow_auto_provision_user_namespace;

    if !spec.storage.pvc_strategy.is_empty() {
        dev.storage.pvc_strategy = v2::PvcStrategy::parse(&spec.storage.pvc_strategy);
    }
    dev.storage.per_user_strategy_pvc_config = pvc_config(
        &spec.storage.pvc_claim_size,
        &spec.storage.workspace_pvc_storage_class_name,
    );
    dev.storage.per_workspace_strategy_pvc_config = pvc_config(
        &spec.storage.per_workspace_strategy_pvc_claim_size,
        &spec.storage.per_workspace_strategy_pvc_storage_class_name,
    );

    dev.trusted_certs.git_trusted_certs_config_map_name = if spec.server.git_self_signed_cert {
        let from_status = source
            .status
            .as_ref()
            .map(|s| s.git_server_tls_certificate_config_map_name.clone())
            .unwrap_or_default();
        if from_status.is_empty() {
            GIT_SELF_SIGNED_CERT_CONFIG_MAP.to_string()
        } else {
            from_status
        }
    } else {
        String::new()
    };

    dev.default_editor = spec.server.workspace_default_editor.clone();
    dev.default_components = spec.server.workspace_default_components.clone();
    dev.default_plugins = spec.server.workspaces_default_plugins.clone();
    dev.node_selector = spec.server.workspace_pod_node_selector.clone();
    dev.tolerations = spec.server.workspace_pod_tolerations.clone();

    dev.seconds_of_inactivity_before_idling =
        spec.dev_workspace.seconds_of_inactivity_before_idling;
    dev.seconds_of_run_before_idling = spec.dev_workspace.seconds_of_run_before_idling;
    if !spec.dev_workspace.running_limit.is_empty() {
        dev.max_number_of_running_workspaces_per_user =
            spec.dev_workspace.running_limit.parse().ok();
    }

    dev.user.cluster_roles = split_list(&spec.server.workspace_cluster_role, ',');
}

fn map_dev_environments_to_v1(dev: &v2::DevEnvironments, destination: &mut v1::PlatformCluster) {
    let dst = &mut destination.spec;

    dst.server.workspace_namespace_default = dev.default_namespace.template.clone();
    dst.server.allow_auto_provision_user_namespace = dev.default_namespace.auto_provision;

    if let Some(strategy) = dev.storage.pvc_strategy {
        dst.storage.pvc_strategy = strategy.as_str().to_string();
    }
    match dev.storage.per_user_strategy_pvc_config.as_ref() {
        Some(cfg) => {
            dst.storage.pvc_claim_size = cfg.claim_size.clone();
            dst.storage.workspace_pvc_storage_class_name = cfg.storage_class.clone();
        }
        None => {
            dst.storage.pvc_claim_size.clear();
            dst.storage.workspace_pvc_storage_class_name.clear();
        }
    }
    match dev.storage.per_workspace_strategy_pvc_config.as_ref() {
        Some(cfg) => {
            dst.storage.per_workspace_strategy_pvc_claim_size = cfg.claim_size.clone();
            dst.storage.per_workspace_strategy_pvc_storage_class_name = cfg.storage_class.clone();
        }
        None => {
            dst.storage.per_workspace_strategy_pvc_claim_size.clear();
            dst.storage
                .per_workspace_strategy_pvc_storage_class_name
                .clear();
        }
    }

    let cert_name = &dev.trusted_certs.git_trusted_certs_config_map_name;
    dst.server.git_self_signed_cert = !cert_name.is_empty();
    if !cert_name.is_empty() {
        destination
            .status
            .get_or_insert_with(v1::PlatformClusterStatus::default)
            .git_server_tls_certificate_config_map_name = cert_name.clone();
    }

    dst.server.workspace_default_editor = dev.default_editor.clone();
    dst.server.workspace_default_components = dev.default_components.clone();
    dst.server.workspaces_default_plugins = dev.default_plugins.clone();
    dst.server.workspace_pod_node_selector = dev.node_selector.clone();
    dst.server.workspace_pod_tolerations = dev.tolerations.clone();

    dst.dev_workspace.seconds_of_inactivity_before_idling =
        dev.seconds_of_inactivity_before_idling;
    dst.dev_workspace.seconds_of_run_before_idling = dev.seconds_of_run_before_idling;
    if let Some(limit) = dev.max_number_of_running_workspaces_per_user {
        dst.dev_workspace.running_limit = limit.to_string();
    }

    dst.server.workspace_cluster_role = join_list(&dev.user.cluster_roles, ',');
}

fn status_to_v2(status: Option<&v1::PlatformClusterStatus>) -> Option<v2::PlatformClusterStatus> {
    let src = status?;
    Some(v2::PlatformClusterStatus {
        phase: match src.cluster_running.as_str() {
            "Available" => v2::PHASE_ACTIVE.to_string(),
            "Unavailable" => v2::PHASE_INACTIVE.to_string(),
            other => other.to_string(),
        },
        platform_url: src.platform_url.clone(),
        workspace_base_domain: src.workspace_base_domain.clone(),
        version: src.version.clone(),
        message: src.message.clone(),
        reason: src.reason.clone(),
        git_server_tls_certificate_config_map_name: src
            .git_server_tls_certificate_config_map_name
            .clone(),
    })
}

fn status_to_v1(status: Option<&v2::PlatformClusterStatus>) -> Option<v1::PlatformClusterStatus> {
    let src = status?;
    Some(v1::PlatformClusterStatus {
        cluster_running: match src.phase.as_str() {
            v2::PHASE_ACTIVE => "Available".to_string(),
            v2::PHASE_INACTIVE => "Unavailable".to_string(),
            other => other.to_string(),
        },
        platform_url: src.platform_url.clone(),
        version: src.version.clone(),
        workspace_base_domain: src.workspace_base_domain.clone(),
        message: src.message.clone(),
        reason: src.reason.clone(),
        git_server_tls_certificate_config_map_name: src
            .git_server_tls_certificate_config_map_name
            .clone(),
    })
}

/// Upsert a named gateway container, preserving the seeded container order.
fn upsert_gateway_container(
    containers: &mut Vec<v2::Container>,
    name: &str,
    image: &str,
    env: &[EnvVar],
) {
    if let Some(existing) = containers.iter_mut().find(|c| c.name == name) {
        existing.image = image.to_string();
        existing.env = env.to_vec();
    } else if !image.is_empty() || !env.is_empty() {
        containers.push(v2::Container {
            name: name.to_string(),
            image: image.to_string(),
            env: env.to_vec(),
            ..v2::Container::default()
        });
    }
}

/// Build a container override from flat v1 fields; `None` when every field
/// is unset.
#[allow(clippy::too_many_arguments)]
fn container_from_v1(
    name: &str,
    image: &str,
    pull_policy: &str,
    mem_req: &str,
    mem_lim: &str,
    cpu_req: &str,
    cpu_lim: &str,
    env: &[EnvVar],
) -> Option<v2::Container> {
    let resources = resources_from_strings(mem_req, mem_lim, cpu_req, cpu_lim);
    let policy = v2::PullPolicy::parse(pull_policy);
    if image.is_empty() && policy.is_none() && resources.is_none() && env.is_empty() {
        return None;
    }
    Some(v2::Container {
        name: name.to_string(),
        image: image.to_string(),
        image_pull_policy: policy,
        env: env.to_vec(),
        resources,
    })
}

/// Write a v1-derived container into slot 0 of a deployment, keeping the
/// seeded name when one is already there.
fn apply_container(deployment: &mut v2::Deployment, container: Option<v2::Container>) {
    let Some(container) = container else {
        return;
    };
    match deployment.containers.first_mut() {
        Some(existing) => {
            existing.image = container.image;
            existing.image_pull_policy = container.image_pull_policy;
            existing.env = container.env;
            existing.resources = container.resources;
        }
        None => deployment.containers.push(container),
    }
}

fn resources_from_strings(
    mem_req: &str,
    mem_lim: &str,
    cpu_req: &str,
    cpu_lim: &str,
) -> Option<v2::ResourceRequirements> {
    let requests = resource_list(mem_req, cpu_req);
    let limits = resource_list(mem_lim, cpu_lim);
    if requests.is_none() && limits.is_none() {
        return None;
    }
    Some(v2::ResourceRequirements { requests, limits })
}

fn resource_list(mem: &str, cpu: &str) -> Option<v2::ResourceList> {
    let memory = parse_quantity(mem);
    let cpu = parse_quantity(cpu);
    if memory.is_none() && cpu.is_none() {
        return None;
    }
    Some(v2::ResourceList { memory, cpu })
}

/// Quantity strings (mem request, mem limit, cpu request, cpu limit) in
/// canonical form; zero and unset are elided.
fn resource_strings(
    resources: Option<&v2::ResourceRequirements>,
) -> (String, String, String, String) {
    let Some(resources) = resources else {
        return (String::new(), String::new(), String::new(), String::new());
    };
    let requests = resources.requests.as_ref();
    let limits = resources.limits.as_ref();
    (
        quantity_string(requests.and_then(|r| r.memory.as_ref())),
        quantity_string(limits.and_then(|r| r.memory.as_ref())),
        quantity_string(requests.and_then(|r| r.cpu.as_ref())),
        quantity_string(limits.and_then(|r| r.cpu.as_ref())),
    )
}

fn pvc_config(claim_size: &str, storage_class: &str) -> Option<v2::PvcConfig> {
    if claim_size.is_empty() && storage_class.is_empty() {
        return None;
    }
    Some(v2::PvcConfig {
        claim_size: claim_size.to_string(),
        storage_class: storage_class.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
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

    fn v2_cluster() -> v2::PlatformCluster {
        v2::PlatformCluster {
            metadata: ObjectMeta {
                name: Some("platform".to_string()),
                namespace: Some("platform-operator".to_string()),
                ..ObjectMeta::default()
            },
            spec: v2::PlatformClusterSpec::default(),
            status: None,
        }
    }

    fn annotations(meta: &ObjectMeta) -> &BTreeMap<String, String> {
        meta.annotations.as_ref().unwrap()
    }

    #[test]
    fn empty_v1_round_trips_on_both_infrastructures() {
        for infra in [Infrastructure::Kubernetes, Infrastructure::OpenShiftV4] {
            let original = v1_cluster();
            let converted = v1_to_v2(&original, infra).unwrap();
            let restored = v2_to_v1(&converted, infra).unwrap();

            assert_eq!(restored.spec, original.spec);
            assert_eq!(restored.status, original.status);
            // The destination never carries its own spec as an annotation.
            assert!(!annotations(&converted.metadata).contains_key(V2_SPEC_ANNOTATION));
            assert!(annotations(&converted.metadata).contains_key(V1_SPEC_ANNOTATION));
            assert!(!annotations(&restored.metadata).contains_key(V1_SPEC_ANNOTATION));
            assert!(annotations(&restored.metadata).contains_key(V2_SPEC_ANNOTATION));
        }
    }

    #[test]
    fn empty_v2_round_trips_on_both_infrastructures() {
        for infra in [Infrastructure::Kubernetes, Infrastructure::OpenShiftV4] {
            let original = v2_cluster();
            let converted = v2_to_v1(&original, infra).unwrap();
            let restored = v1_to_v2(&converted, infra).unwrap();
            assert_eq!(restored.spec, original.spec);
            assert_eq!(restored.status, original.status);
        }
    }

    #[test]
    fn ingress_mapping_on_kubernetes() {
        let mut original = v2_cluster();
        original.spec.networking.annotations = BTreeMap::from([
            ("a".to_string(), "b".to_string()),
            ("c".to_string(), "d".to_string()),
            (INGRESS_CLASS_ANNOTATION.to_string(), "nginx".to_string()),
        ]);
        original.spec.networking.labels = BTreeMap::from([
            ("a".to_string(), "b".to_string()),
            ("c".to_string(), "d".to_string()),
        ]);
        original.spec.networking.domain = "Domain".to_string();
        original.spec.networking.hostname = "Hostname".to_string();
        original.spec.networking.tls_secret_name = "tlsSecret".to_string();

        let converted = v2_to_v1(&original, Infrastructure::Kubernetes).unwrap();

        assert_eq!(
            converted.spec.server.server_ingress.annotations,
            BTreeMap::from([
                ("a".to_string(), "b".to_string()),
                ("c".to_string(), "d".to_string()),
            ])
        );
        assert_eq!(converted.spec.k8s.ingress_class, "nginx");
        assert_eq!(converted.spec.k8s.ingress_domain, "Domain");
        assert_eq!(converted.spec.server.host, "Hostname");
        assert_eq!(converted.spec.server.server_ingress.labels, "a=b,c=d");
        assert_eq!(converted.spec.k8s.tls_secret_name, "tlsSecret");

        let restored = v1_to_v2(&converted, Infrastructure::Kubernetes).unwrap();
        assert_eq!(restored.spec, original.spec);
    }

    #[test]
    fn host_tls_secret_wins_over_k8s_tls_secret() {
        let mut original = v1_cluster();
        original.spec.server.host_tls_secret = "from-server".to_string();
        original.spec.k8s.tls_secret_name = "from-k8s".to_string();

        let converted = v1_to_v2(&original, Infrastructure::Kubernetes).unwrap();
        assert_eq!(converted.spec.networking.tls_secret_name, "from-server");
    }

    #[test]
    fn server_container_round_trip() {
        let mut original = v1_cluster();
        original.spec.server.server_image = "registry:5000/platform/server".to_string();
        original.spec.server.server_image_tag = "7.99.0".to_string();
        original.spec.server.server_image_pull_policy = "Always".to_string();
        original.spec.server.server_memory_request = "200Mi".to_string();
        original.spec.server.server_cpu_limit = "2".to_string();
        original.spec.server.server_env = vec![EnvVar {
            name: "PLATFORM_LOG_LEVEL".to_string(),
            value: Some("DEBUG".to_string()),
            value_from: None,
        }];

        let converted = v1_to_v2(&original, Infrastructure::Kubernetes).unwrap();
        let container = &converted.spec.components.server.deployment.containers[0];
        assert_eq!(container.image, "registry:5000/platform/server:7.99.0");
        assert_eq!(container.image_pull_policy, Some(v2::PullPolicy::Always));
        assert_eq!(
            container.resources.as_ref().unwrap().requests.as_ref().unwrap().memory,
            Some(Quantity("200Mi".to_string()))
        );
        assert_eq!(
            container.resources.as_ref().unwrap().limits.as_ref().unwrap().cpu,
            Some(Quantity("2".to_string()))
        );

        let restored = v2_to_v1(&converted, Infrastructure::Kubernetes).unwrap();
        assert_eq!(restored.spec, original.spec);
    }

    #[test]
    fn zero_quantities_are_treated_as_unset() {
        let mut original = v2_cluster();
        original.spec.components.server.deployment.containers.push(v2::Container {
            name: "platform-server".to_string(),
            resources: Some(v2::ResourceRequirements {
                requests: Some(v2::ResourceList {
                    memory: Some(Quantity("0".to_string())),
                    cpu: None,
                }),
                limits: None,
            }),
            ..v2::Container::default()
        });

        let converted = v2_to_v1(&original, Infrastructure::Kubernetes).unwrap();
        assert!(converted.spec.server.server_memory_request.is_empty());
    }

    #[test]
    fn gateway_containers_map_to_positional_v1_fields() {
        let mut original = v1_cluster();
        original.spec.server.single_host_gateway_image = "gw:1".to_string();
        original.spec.server.single_host_gateway_config_sidecar_image = "cb:1".to_string();
        original.spec.auth.gateway_authentication_sidecar_image = "authn:1".to_string();
        original.spec.auth.gateway_authorization_sidecar_image = "authz:1".to_string();
        original.spec.auth.gateway_env = vec![EnvVar {
            name: "GW".to_string(),
            value: Some("1".to_string()),
            value_from: None,
        }];

        let converted = v1_to_v2(&original, Infrastructure::OpenShiftV4).unwrap();
        let containers = &converted.spec.networking.auth.gateway.deployment.containers;
        let names: Vec<&str> = containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["gateway", "configbump", "oauth-proxy", "kube-rbac-proxy"]
        );
        assert_eq!(containers[0].image, "gw:1");
        assert_eq!(containers[0].env[0].name, "GW");

        let restored = v2_to_v1(&converted, Infrastructure::OpenShiftV4).unwrap();
        assert_eq!(restored.spec, original.spec);
    }

    #[test]
    fn trusted_certs_round_trip_uses_fixed_literal() {
        let mut original = v1_cluster();
        original.spec.server.git_self_signed_cert = true;

        let converted = v1_to_v2(&original, Infrastructure::Kubernetes).unwrap();
        assert_eq!(
            converted
                .spec
                .dev_environments
                .trusted_certs
                .git_trusted_certs_config_map_name,
            GIT_SELF_SIGNED_CERT_CONFIG_MAP
        );

        let restored = v2_to_v1(&converted, Infrastructure::Kubernetes).unwrap();
        assert!(restored.spec.server.git_self_signed_cert);
        assert_eq!(
            restored
                .status
                .unwrap()
                .git_server_tls_certificate_config_map_name,
            GIT_SELF_SIGNED_CERT_CONFIG_MAP
        );
    }

    #[test]
    fn running_limit_maps_to_typed_cap() {
        let mut original = v1_cluster();
        original.spec.dev_workspace.running_limit = "5".to_string();

        let converted = v1_to_v2(&original, Infrastructure::Kubernetes).unwrap();
        assert_eq!(
            converted
                .spec
                .dev_environments
                .max_number_of_running_workspaces_per_user,
            Some(5)
        );

        let restored = v2_to_v1(&converted, Infrastructure::Kubernetes).unwrap();
        assert_eq!(restored.spec.dev_workspace.running_limit, "5");
    }

    #[test]
    fn status_phase_translation() {
        let mut original = v1_cluster();
        original.status = Some(v1::PlatformClusterStatus {
            cluster_running: "Available".to_string(),
            version: "7.99.0".to_string(),
            ..v1::PlatformClusterStatus::default()
        });

        let converted = v1_to_v2(&original, Infrastructure::Kubernetes).unwrap();
        let status = converted.status.as_ref().unwrap();
        assert_eq!(status.phase, v2::PHASE_ACTIVE);
        assert_eq!(status.version, "7.99.0");

        let restored = v2_to_v1(&converted, Infrastructure::Kubernetes).unwrap();
        assert_eq!(restored.status.unwrap().cluster_running, "Available");

        // Transitional values pass through verbatim.
        original.status.as_mut().unwrap().cluster_running = "Starting".to_string();
        let converted = v1_to_v2(&original, Infrastructure::Kubernetes).unwrap();
        assert_eq!(converted.status.unwrap().phase, "Starting");
    }

    #[test]
    fn unknown_enumish_values_survive_via_side_channel() {
        let mut original = v1_cluster();
        original.spec.auth.identity_token = "exotic_token".to_string();
        original.spec.storage.pvc_strategy = "exotic-strategy".to_string();

        let converted = v1_to_v2(&original, Infrastructure::Kubernetes).unwrap();
        assert!(converted.spec.networking.auth.identity_token.is_none());
        assert!(converted.spec.dev_environments.storage.pvc_strategy.is_none());

        let restored = v2_to_v1(&converted, Infrastructure::Kubernetes).unwrap();
        assert_eq!(restored.spec, original.spec);
    }

    #[test]
    fn corrupted_side_channel_is_a_structured_error() {
        let mut source = v1_cluster();
        source.metadata.annotations = Some(BTreeMap::from([(
            V2_SPEC_ANNOTATION.to_string(),
            ":\nnot yaml at all: [".to_string(),
        )]));

        let err = v1_to_v2(&source, Infrastructure::Kubernetes).unwrap_err();
        assert!(matches!(err, crate::Error::CorruptedAnnotation { .. }));
        assert!(err.to_string().contains(V2_SPEC_ANNOTATION));
    }

    #[test]
    fn conversion_is_deterministic() {
        let mut original = v1_cluster();
        original.spec.server.host = "host".to_string();
        original.spec.server.cluster_roles = "a,b".to_string();

        let first = v1_to_v2(&original, Infrastructure::Kubernetes).unwrap();
        let second = v1_to_v2(&original, Infrastructure::Kubernetes).unwrap();
        assert_eq!(first, second);
    }
}
