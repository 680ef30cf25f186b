//! Compiled-in workspace defaults and their historical spellings.
//!
//! The cleaner compares spec fields against these values; a match means the
//! user never customized the field and the stale copy can be dropped so the
//! current default applies again.

use platform_crd::common::{Component, ComponentContainer};

/// Current default editor identifier.
pub const DEFAULT_EDITOR: &str = "platform-incubator/platform-code/latest";

/// Editor identifiers that were the default in earlier releases.
pub const HISTORICAL_DEFAULT_EDITORS: &[&str] = &[
    "platform-incubator/platform-code/insiders",
    "platform-incubator/theia-ide/latest",
    "platform-incubator/theia-ide/next",
];

/// Current default namespace template.
pub const DEFAULT_NAMESPACE_TEMPLATE: &str = "<username>-platform";

/// Namespace templates that were the default in earlier releases.
pub const HISTORICAL_DEFAULT_NAMESPACE_TEMPLATES: &[&str] = &["<username>-workspaces"];

/// Compiled-in default of `disableContainerBuildCapabilities` on OpenShift.
pub const DEFAULT_DISABLE_CONTAINER_BUILD_CAPABILITIES: bool = false;

/// Current default workspace components.
#[must_use]
pub fn default_components() -> Vec<Component> {
    vec![udi_component("quay.io/platform/universal-developer-image:latest")]
}

/// Component lists that were the default in earlier releases.
#[must_use]
pub fn historical_default_components() -> Vec<Vec<Component>> {
    vec![
        vec![udi_component("quay.io/platform/universal-developer-image:next")],
        vec![udi_component("registry.platform.dev/udi:latest")],
    ]
}

fn udi_component(image: &str) -> Component {
    Component {
        name: "universal-developer-image".to_string(),
        container: Some(ComponentContainer {
            image: image.to_string(),
        }),
        plugin: None,
    }
}
