//! One-shot cleaner of stale compiled-in defaults on `PlatformCluster`
//! objects.
//!
//! Earlier releases wrote compiled-in defaults straight into the spec, so
//! upgraders who never customized a field would keep its stale value
//! forever. Each cleanup task runs at most once per object; completed task
//! identifiers are recorded in a JSON map under the
//! `platform.dev/platformcluster-defaults-cleanup` annotation.

pub mod defaults;

use std::collections::BTreeMap;

use platform_crd::v2;
use tracing::debug;

use crate::constants::DEFAULTS_CLEANUP_ANNOTATION;
use crate::infra::Infrastructure;
use crate::Result;

use defaults::{
    default_components, historical_default_components, DEFAULT_DISABLE_CONTAINER_BUILD_CAPABILITIES,
    DEFAULT_EDITOR, DEFAULT_NAMESPACE_TEMPLATE, HISTORICAL_DEFAULT_EDITORS,
    HISTORICAL_DEFAULT_NAMESPACE_TEMPLATES,
};

/// A single cleanup step, identified by the spec field it owns.
pub struct CleanupTask {
    /// Field identifier recorded in the marker annotation
    pub field: &'static str,
    /// Cleanup body; returns whether the spec was modified
    pub run: fn(&mut v2::PlatformClusterSpec, Infrastructure) -> bool,
}

/// Ordered task list. Tasks are independent; the order fixes the audit
/// trail in the marker annotation.
pub const CLEANUP_TASKS: &[CleanupTask] = &[
    CleanupTask {
        field: "spec.devEnvironments.defaultEditor",
        run: clean_default_editor,
    },
    CleanupTask {
        field: "spec.devEnvironments.defaultComponents",
        run: clean_default_components,
    },
    CleanupTask {
        field: "spec.devEnvironments.defaultNamespace.template",
        run: clean_default_namespace_template,
    },
    CleanupTask {
        field: "spec.devEnvironments.disableContainerBuildCapabilities",
        run: clean_disable_container_build_capabilities,
    },
    CleanupTask {
        field: "spec.components.containerResources",
        run: clean_zero_container_resources,
    },
];

/// Run every pending cleanup task against the object.
///
/// On a fresh install (no deployed version in status yet) the task bodies
/// are skipped but markers are still written, so the spec is taken as user
/// intent and never revisited.
///
/// Returns whether the object (spec or marker annotation) was modified.
///
/// # Errors
/// Fails when an existing marker annotation does not parse as JSON.
pub fn cleanup_defaults(
    cluster: &mut v2::PlatformCluster,
    infra: Infrastructure,
) -> Result<bool> {
    let mut markers: BTreeMap<String, String> = match cluster
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(DEFAULTS_CLEANUP_ANNOTATION))
    {
        Some(raw) => serde_json::from_str(raw)?,
        None => BTreeMap::new(),
    };

    let fresh_install = cluster
        .status
        .as_ref()
        .is_none_or(|status| status.version.is_empty());

    let mut spec_changed = false;
    let mut markers_changed = false;
    for task in CLEANUP_TASKS {
        if markers.contains_key(task.field) {
            continue;
        }
        if fresh_install {
            debug!(field = task.field, "fresh install, skipping defaults cleanup body");
        } else if (task.run)(&mut cluster.spec, infra) {
            debug!(field = task.field, "cleared stale compiled-in default");
            spec_changed = true;
        }
        markers.insert(task.field.to_string(), "true".to_string());
        markers_changed = true;
    }

    if markers_changed {
        let payload = serde_json::to_string(&markers)?;
        cluster
            .metadata
            .annotations
            .get_or_insert_default()
            .insert(DEFAULTS_CLEANUP_ANNOTATION.to_string(), payload);
    }
    Ok(spec_changed || markers_changed)
}

fn clean_default_editor(spec: &mut v2::PlatformClusterSpec, _infra: Infrastructure) -> bool {
    let editor = &spec.dev_environments.default_editor;
    if editor.is_empty() {
        return false;
    }
    if editor == DEFAULT_EDITOR || HISTORICAL_DEFAULT_EDITORS.contains(&editor.as_str()) {
        spec.dev_environments.default_editor.clear();
        return true;
    }
    false
}

fn clean_default_components(spec: &mut v2::PlatformClusterSpec, _infra: Infrastructure) -> bool {
    let components = &spec.dev_environments.default_components;
    if components.is_empty() {
        return false;
    }
    if *components == default_components()
        || historical_default_components().contains(components)
    {
        spec.dev_environments.default_components.clear();
        return true;
    }
    false
}

fn clean_default_namespace_template(
    spec: &mut v2::PlatformClusterSpec,
    _infra: Infrastructure,
) -> bool {
    let template = &spec.dev_environments.default_namespace.template;
    if template.is_empty() {
        return false;
    }
    if template == DEFAULT_NAMESPACE_TEMPLATE
        || HISTORICAL_DEFAULT_NAMESPACE_TEMPLATES.contains(&template.as_str())
    {
        spec.dev_environments.default_namespace.template.clear();
        return true;
    }
    false
}

fn clean_disable_container_build_capabilities(
    spec: &mut v2::PlatformClusterSpec,
    infra: Infrastructure,
) -> bool {
    let current = &mut spec.dev_environments.disable_container_build_capabilities;
    if infra.is_openshift() {
        if *current == Some(DEFAULT_DISABLE_CONTAINER_BUILD_CAPABILITIES) {
            *current = None;
            return true;
        }
        false
    } else {
        // The capability needs an SCC and never works off OpenShift.
        if *current == Some(true) {
            return false;
        }
        *current = Some(true);
        true
    }
}

/// Clear zero-valued cpu/memory requests and limits across every component
/// deployment. At this layer zero is indistinguishable from unset.
fn clean_zero_container_resources(
    spec: &mut v2::PlatformClusterSpec,
    _infra: Infrastructure,
) -> bool {
    let mut changed = false;
    let deployments = [
        &mut spec.components.server.deployment,
        &mut spec.components.dashboard.deployment,
        &mut spec.components.plugin_registry.deployment,
        &mut spec.components.devfile_registry.deployment,
        &mut spec.networking.auth.gateway.deployment,
    ];
    for deployment in deployments {
        for container in &mut deployment.containers {
            changed |= clean_container_resources(container);
        }
    }
    changed
}

fn clean_container_resources(container: &mut v2::Container) -> bool {
    let Some(resources) = container.resources.as_mut() else {
        return false;
    };
    let mut changed = false;
    for list in [&mut resources.requests, &mut resources.limits] {
        if let Some(inner) = list.as_mut() {
            if inner.memory.as_ref().is_some_and(|q| is_zero_quantity(&q.0)) {
                inner.memory = None;
                changed = true;
            }
            if inner.cpu.as_ref().is_some_and(|q| is_zero_quantity(&q.0)) {
                inner.cpu = None;
                changed = true;
            }
            if inner.memory.is_none() && inner.cpu.is_none() {
                *list = None;
            }
        }
    }
    if resources.requests.is_none() && resources.limits.is_none() {
        container.resources = None;
    }
    changed
}

/// Whether a quantity string denotes zero (`0`, `0Mi`, `0m`, ...).
fn is_zero_quantity(raw: &str) -> bool {
    let numeric: &str = raw.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    !numeric.is_empty() && numeric.parse::<f64>() == Ok(0.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use kube::api::ObjectMeta;

    use super::*;

    fn installed_cluster() -> v2::PlatformCluster {
        v2::PlatformCluster {
            metadata: ObjectMeta {
                name: Some("platform".to_string()),
                namespace: Some("platform-operator".to_string()),
                ..ObjectMeta::default()
            },
            spec: v2::PlatformClusterSpec::default(),
            status: Some(v2::PlatformClusterStatus {
                version: "7.99.0".to_string(),
                ..v2::PlatformClusterStatus::default()
            }),
        }
    }

    fn markers(cluster: &v2::PlatformCluster) -> BTreeMap<String, String> {
        let raw = cluster
            .metadata
            .annotations
            .as_ref()
            .unwrap()
            .get(DEFAULTS_CLEANUP_ANNOTATION)
            .unwrap();
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn fresh_install_writes_markers_without_touching_the_spec() {
        let mut cluster = installed_cluster();
        cluster.status = None;
        cluster.spec.dev_environments.default_editor = DEFAULT_EDITOR.to_string();

        let changed = cleanup_defaults(&mut cluster, Infrastructure::OpenShiftV4).unwrap();
        assert!(changed);
        assert_eq!(cluster.spec.dev_environments.default_editor, DEFAULT_EDITOR);
        assert_eq!(markers(&cluster).len(), CLEANUP_TASKS.len());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut cluster = installed_cluster();
        cluster.spec.dev_environments.default_editor = DEFAULT_EDITOR.to_string();

        assert!(cleanup_defaults(&mut cluster, Infrastructure::OpenShiftV4).unwrap());
        assert!(cluster.spec.dev_environments.default_editor.is_empty());

        // Restore the stale value: markers must prevent a second cleanup.
        cluster.spec.dev_environments.default_editor = DEFAULT_EDITOR.to_string();
        assert!(!cleanup_defaults(&mut cluster, Infrastructure::OpenShiftV4).unwrap());
        assert_eq!(cluster.spec.dev_environments.default_editor, DEFAULT_EDITOR);
    }

    #[test]
    fn historical_default_editor_is_cleared() {
        let mut cluster = installed_cluster();
        cluster.spec.dev_environments.default_editor =
            HISTORICAL_DEFAULT_EDITORS[0].to_string();

        assert!(cleanup_defaults(&mut cluster, Infrastructure::OpenShiftV4).unwrap());
        assert!(cluster.spec.dev_environments.default_editor.is_empty());
    }

    #[test]
    fn customized_editor_is_kept() {
        let mut cluster = installed_cluster();
        cluster.spec.dev_environments.default_editor = "acme/custom-editor/1.0".to_string();

        cleanup_defaults(&mut cluster, Infrastructure::OpenShiftV4).unwrap();
        assert_eq!(
            cluster.spec.dev_environments.default_editor,
            "acme/custom-editor/1.0"
        );
    }

    #[test]
    fn default_components_are_cleared() {
        let mut cluster = installed_cluster();
        cluster.spec.dev_environments.default_components = default_components();

        assert!(cleanup_defaults(&mut cluster, Infrastructure::OpenShiftV4).unwrap());
        assert!(cluster.spec.dev_environments.default_components.is_empty());
    }

    #[test]
    fn build_capability_flag_follows_the_infrastructure() {
        let mut on_openshift = installed_cluster();
        on_openshift
            .spec
            .dev_environments
            .disable_container_build_capabilities =
            Some(DEFAULT_DISABLE_CONTAINER_BUILD_CAPABILITIES);
        cleanup_defaults(&mut on_openshift, Infrastructure::OpenShiftV4).unwrap();
        assert_eq!(
            on_openshift
                .spec
                .dev_environments
                .disable_container_build_capabilities,
            None
        );

        let mut on_k8s = installed_cluster();
        on_k8s
            .spec
            .dev_environments
            .disable_container_build_capabilities = Some(false);
        cleanup_defaults(&mut on_k8s, Infrastructure::Kubernetes).unwrap();
        assert_eq!(
            on_k8s
                .spec
                .dev_environments
                .disable_container_build_capabilities,
            Some(true)
        );
    }

    #[test]
    fn explicit_disable_survives_on_openshift() {
        let mut cluster = installed_cluster();
        cluster
            .spec
            .dev_environments
            .disable_container_build_capabilities = Some(true);

        cleanup_defaults(&mut cluster, Infrastructure::OpenShiftV4).unwrap();
        assert_eq!(
            cluster
                .spec
                .dev_environments
                .disable_container_build_capabilities,
            Some(true)
        );
    }

    #[test]
    fn zero_resources_are_cleared_everywhere() {
        let mut cluster = installed_cluster();
        let zeroed = v2::Container {
            name: "c".to_string(),
            resources: Some(v2::ResourceRequirements {
                requests: Some(v2::ResourceList {
                    memory: Some(Quantity("0Gi".to_string())),
                    cpu: Some(Quantity("500m".to_string())),
                }),
                limits: Some(v2::ResourceList {
                    memory: Some(Quantity("0".to_string())),
                    cpu: Some(Quantity("0m".to_string())),
                }),
            }),
            ..v2::Container::default()
        };
        cluster.spec.components.server.deployment.containers.push(zeroed.clone());
        cluster
            .spec
            .networking
            .auth
            .gateway
            .deployment
            .containers
            .push(zeroed);

        assert!(cleanup_defaults(&mut cluster, Infrastructure::OpenShiftV4).unwrap());

        for deployment in [
            &cluster.spec.components.server.deployment,
            &cluster.spec.networking.auth.gateway.deployment,
        ] {
            let resources = deployment.containers[0].resources.as_ref().unwrap();
            let requests = resources.requests.as_ref().unwrap();
            assert!(requests.memory.is_none());
            assert_eq!(requests.cpu.as_ref().unwrap().0, "500m");
            assert!(resources.limits.is_none());
        }
    }

    #[test]
    fn zero_quantity_detection() {
        assert!(is_zero_quantity("0"));
        assert!(is_zero_quantity("0Mi"));
        assert!(is_zero_quantity("0m"));
        assert!(!is_zero_quantity("500m"));
        assert!(!is_zero_quantity("1Gi"));
        assert!(!is_zero_quantity(""));
    }

    #[test]
    fn corrupted_marker_annotation_is_an_error() {
        let mut cluster = installed_cluster();
        cluster.metadata.annotations = Some(BTreeMap::from([(
            DEFAULTS_CLEANUP_ANNOTATION.to_string(),
            "not-json".to_string(),
        )]));

        assert!(cleanup_defaults(&mut cluster, Infrastructure::OpenShiftV4).is_err());
    }
}
