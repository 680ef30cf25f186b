//! Pure defaulting logic behind the mutating webhook.

use platform_crd::v2;

use crate::infra::Infrastructure;

/// Apply admission-time defaults; returns whether the spec changed.
///
/// Container build and run capabilities need OpenShift SCCs, so they are
/// force-disabled anywhere else. When a capability stays enabled its
/// configuration struct is materialized so consumers can rely on its
/// presence.
pub fn apply_defaults(spec: &mut v2::PlatformClusterSpec, infra: Infrastructure) -> bool {
    let dev = &mut spec.dev_environments;
    let mut changed = false;

    if !infra.is_openshift() {
        if dev.disable_container_build_capabilities != Some(true) {
            dev.disable_container_build_capabilities = Some(true);
            changed = true;
        }
        if dev.disable_container_run_capabilities != Some(true) {
            dev.disable_container_run_capabilities = Some(true);
            changed = true;
        }
    }

    if dev.disable_container_build_capabilities != Some(true)
        && dev.container_build_configuration.is_none()
    {
        dev.container_build_configuration = Some(v2::ContainerBuildConfiguration::default());
        changed = true;
    }
    if dev.disable_container_run_capabilities != Some(true)
        && dev.container_run_configuration.is_none()
    {
        dev.container_run_configuration = Some(v2::ContainerRunConfiguration::default());
        changed = true;
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kubernetes_disables_both_capabilities() {
        let mut spec = v2::PlatformClusterSpec::default();
        assert!(apply_defaults(&mut spec, Infrastructure::Kubernetes));
        assert_eq!(
            spec.dev_environments.disable_container_build_capabilities,
            Some(true)
        );
        assert_eq!(
            spec.dev_environments.disable_container_run_capabilities,
            Some(true)
        );
        assert!(spec.dev_environments.container_build_configuration.is_none());
        assert!(spec.dev_environments.container_run_configuration.is_none());
    }

    #[test]
    fn openshift_materializes_configuration_structs() {
        let mut spec = v2::PlatformClusterSpec::default();
        assert!(apply_defaults(&mut spec, Infrastructure::OpenShiftV4));
        assert!(spec.dev_environments.disable_container_build_capabilities.is_none());
        assert!(spec.dev_environments.container_build_configuration.is_some());
        assert!(spec.dev_environments.container_run_configuration.is_some());
    }

    #[test]
    fn disabled_capability_gets_no_configuration() {
        let mut spec = v2::PlatformClusterSpec::default();
        spec.dev_environments.disable_container_build_capabilities = Some(true);
        apply_defaults(&mut spec, Infrastructure::OpenShiftV4);
        assert!(spec.dev_environments.container_build_configuration.is_none());
        assert!(spec.dev_environments.container_run_configuration.is_some());
    }

    #[test]
    fn existing_configuration_is_untouched() {
        let mut spec = v2::PlatformClusterSpec::default();
        spec.dev_environments.container_build_configuration =
            Some(v2::ContainerBuildConfiguration {
                open_shift_security_context_constraint: "container-build".to_string(),
            });
        spec.dev_environments.container_run_configuration =
            Some(v2::ContainerRunConfiguration::default());

        assert!(!apply_defaults(&mut spec, Infrastructure::OpenShiftV4));
        assert_eq!(
            spec.dev_environments
                .container_build_configuration
                .as_ref()
                .map(|c| c.open_shift_security_context_constraint.as_str()),
            Some("container-build")
        );
    }

    #[test]
    fn defaulting_is_idempotent() {
        let mut spec = v2::PlatformClusterSpec::default();
        apply_defaults(&mut spec, Infrastructure::Kubernetes);
        let first = spec.clone();
        assert!(!apply_defaults(&mut spec, Infrastructure::Kubernetes));
        assert_eq!(spec, first);
    }
}
