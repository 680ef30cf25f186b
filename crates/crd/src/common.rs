//! Leaf types shared verbatim between schema versions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A devfile component applied to every new workspace.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Component {
    /// Component name, unique within the list
    #[serde(skip_serializing_if = "String::is_empty")]
    #[schemars(length(min = 1, max = 63))]
    pub name: String,
    /// Container definition applied when the component is container-backed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ComponentContainer>,
    /// Plug-in reference applied when the component is plug-in-backed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<ComponentPlugin>,
}

/// Container part of a default devfile component.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentContainer {
    /// Container image reference
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
}

/// Plug-in part of a default devfile component.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentPlugin {
    /// Plug-in identifier in the registry
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
}

/// Default plug-ins applied to workspaces created with a given editor.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultPlugins {
    /// Editor identifier the plug-ins apply to
    #[serde(skip_serializing_if = "String::is_empty")]
    pub editor: String,
    /// Plug-in identifiers or URLs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
}
