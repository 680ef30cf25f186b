//! Validating webhook logic: singleton enforcement and SCM secret checks.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use kube::api::{ListParams, Patch, PatchParams};
use kube::core::admission::{AdmissionRequest, Operation};
use kube::{Api, Client};
use platform_crd::v2;
use tracing::debug;

use crate::constants::{
    COMPONENT_LABEL, OAUTH_SCM_COMPONENT, OAUTH_SCM_SERVER_ANNOTATION, ORG, PART_OF_LABEL,
    SCM_GITHUB_DISABLE_SUBDOMAIN_ISOLATION_ANNOTATION, SCM_SERVER_ENDPOINT_ANNOTATION,
};
use crate::{Error, Result};

/// Required data keys for an SCM OAuth secret.
#[derive(Clone, Copy, Debug)]
pub enum KeyRequirement {
    /// OAuth 2 application credentials: `id` and `secret`
    Standard,
    /// Bitbucket accepts OAuth 1 (`private.key`, `consumer.key`) or OAuth 2
    Bitbucket,
}

struct ScmEntry<'a> {
    provider: &'static str,
    secret_name: &'a str,
    endpoint: &'a str,
    disable_subdomain_isolation: Option<bool>,
    keys: KeyRequirement,
}

/// Validate an incoming admission request.
///
/// # Errors
/// Returns [`Error::Message`] with a user-facing reason when the request
/// must be denied; API failures propagate as [`Error::KubeError`].
pub async fn validate(
    client: &Client,
    request: &AdmissionRequest<v2::PlatformCluster>,
) -> Result<()> {
    if !matches!(request.operation, Operation::Create | Operation::Update) {
        return Ok(());
    }
    if request.operation == Operation::Create {
        ensure_singleton(client).await?;
    }
    let Some(cluster) = &request.object else {
        return Ok(());
    };
    validate_git_services(client, cluster).await
}

/// Reject creation when any `PlatformCluster` already exists, cluster-wide.
///
/// # Errors
/// Denial or API failure.
pub async fn ensure_singleton(client: &Client) -> Result<()> {
    let api: Api<v2::PlatformCluster> = Api::all(client.clone());
    let existing = api.list(&ListParams::default().limit(1)).await?;
    if existing.items.is_empty() {
        Ok(())
    } else {
        Err(Error::Message(
            "only one PlatformCluster is allowed".to_string(),
        ))
    }
}

/// Validate every configured SCM integration of the cluster.
///
/// # Errors
/// Denial or API failure.
pub async fn validate_git_services(
    client: &Client,
    cluster: &v2::PlatformCluster,
) -> Result<()> {
    let namespace = cluster.metadata.namespace.clone().unwrap_or_default();
    let git = &cluster.spec.git_services;

    let mut entries = Vec::new();
    for service in &git.github {
        entries.push(ScmEntry {
            provider: "github",
            secret_name: &service.secret_name,
            endpoint: &service.endpoint,
            disable_subdomain_isolation: service.disable_subdomain_isolation,
            keys: KeyRequirement::Standard,
        });
    }
    for service in &git.gitlab {
        entries.push(ScmEntry {
            provider: "gitlab",
            secret_name: &service.secret_name,
            endpoint: &service.endpoint,
            disable_subdomain_isolation: None,
            keys: KeyRequirement::Standard,
        });
    }
    for service in &git.bitbucket {
        entries.push(ScmEntry {
            provider: "bitbucket",
            secret_name: &service.secret_name,
            endpoint: &service.endpoint,
            disable_subdomain_isolation: None,
            keys: KeyRequirement::Bitbucket,
        });
    }
    for service in &git.azure_devops {
        entries.push(ScmEntry {
            provider: "azure-devops",
            secret_name: &service.secret_name,
            endpoint: "",
            disable_subdomain_isolation: None,
            keys: KeyRequirement::Standard,
        });
    }

    for entry in entries.iter().filter(|e| !e.secret_name.is_empty()) {
        validate_scm_secret(client, &namespace, entry).await?;
    }
    Ok(())
}

async fn validate_scm_secret(
    client: &Client,
    namespace: &str,
    entry: &ScmEntry<'_>,
) -> Result<()> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let Some(secret) = api.get_opt(entry.secret_name).await? else {
        return Err(Error::Message(format!(
            "secret '{}' not found",
            entry.secret_name
        )));
    };

    if let Some(patch) = scm_secret_patch(&secret, entry) {
        debug!(
            secret = entry.secret_name,
            provider = entry.provider,
            "stamping SCM labels and annotations"
        );
        api.patch(
            entry.secret_name,
            &PatchParams::default(),
            &Patch::Strategic(patch),
        )
        .await?;
    }

    validate_secret_keys(entry.secret_name, &secret, entry.keys)
}

/// The strategic merge patch aligning a secret's SCM labels and
/// annotations, or `None` when nothing is missing.
fn scm_secret_patch(secret: &Secret, entry: &ScmEntry<'_>) -> Option<serde_json::Value> {
    let empty = BTreeMap::new();
    let labels = secret.metadata.labels.as_ref().unwrap_or(&empty);
    let annotations = secret.metadata.annotations.as_ref().unwrap_or(&empty);

    let mut want_labels = BTreeMap::new();
    if labels.get(PART_OF_LABEL).map(String::as_str) != Some(ORG) {
        want_labels.insert(PART_OF_LABEL, ORG.to_string());
    }
    if labels.get(COMPONENT_LABEL).map(String::as_str) != Some(OAUTH_SCM_COMPONENT) {
        want_labels.insert(COMPONENT_LABEL, OAUTH_SCM_COMPONENT.to_string());
    }

    let mut want_annotations = BTreeMap::new();
    if annotations.get(OAUTH_SCM_SERVER_ANNOTATION).map(String::as_str) != Some(entry.provider) {
        want_annotations.insert(OAUTH_SCM_SERVER_ANNOTATION, entry.provider.to_string());
    }
    // Endpoint and isolation flag are a one-time backfill: an annotation
    // already present wins over the CR value.
    if !entry.endpoint.is_empty() && !annotations.contains_key(SCM_SERVER_ENDPOINT_ANNOTATION) {
        want_annotations.insert(SCM_SERVER_ENDPOINT_ANNOTATION, entry.endpoint.to_string());
    }
    if let Some(disable) = entry.disable_subdomain_isolation {
        if !annotations.contains_key(SCM_GITHUB_DISABLE_SUBDOMAIN_ISOLATION_ANNOTATION) {
            want_annotations.insert(
                SCM_GITHUB_DISABLE_SUBDOMAIN_ISOLATION_ANNOTATION,
                disable.to_string(),
            );
        }
    }

    if want_labels.is_empty() && want_annotations.is_empty() {
        return None;
    }
    Some(serde_json::json!({
        "metadata": {
            "labels": want_labels,
            "annotations": want_annotations,
        }
    }))
}

/// Check the secret's data keys against the provider requirement.
///
/// # Errors
/// Returns the user-facing denial message on missing keys.
pub fn validate_secret_keys(
    name: &str,
    secret: &Secret,
    requirement: KeyRequirement,
) -> Result<()> {
    let has = |key: &str| secret.data.as_ref().is_some_and(|d| d.contains_key(key));
    let oauth2 = has("id") && has("secret");
    match requirement {
        KeyRequirement::Standard if oauth2 => Ok(()),
        KeyRequirement::Standard => Err(Error::Message(format!(
            "secret '{name}' must contain [id, secret] keys"
        ))),
        KeyRequirement::Bitbucket if oauth2 || (has("private.key") && has("consumer.key")) => {
            Ok(())
        }
        KeyRequirement::Bitbucket => Err(Error::Message(format!(
            "secret '{name}' must contain [private.key, consumer.key] or [id, secret] keys"
        ))),
    }
}
