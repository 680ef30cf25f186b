//! Admission webhook surface for the `PlatformCluster` v2 API.
//!
//! Two actix endpoints speak `AdmissionReview`: the mutating endpoint
//! applies defaults as a JSON patch, the validating endpoint enforces the
//! singleton rule and checks SCM secrets. Admission always answers HTTP
//! 200; problems are carried inside the review response.

pub mod defaulter;
pub mod validator;

use actix_web::web::{Data, Json};
use actix_web::{post, HttpResponse, Responder};
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::Client;
use platform_crd::v2;
use tracing::warn;

use crate::infra::{self, Infrastructure};

/// Mutating endpoint; applies spec defaults as a JSON patch.
#[post("/mutate-platform-dev-v2-platformcluster")]
pub async fn mutate(body: Json<AdmissionReview<v2::PlatformCluster>>) -> impl Responder {
    let request: AdmissionRequest<v2::PlatformCluster> = match body.into_inner().try_into() {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "malformed mutating admission review");
            return HttpResponse::Ok().json(AdmissionResponse::invalid(err.to_string()).into_review());
        }
    };
    HttpResponse::Ok().json(mutate_review(&request, infra::kind()).into_review())
}

/// Validating endpoint; denies with a user-facing reason.
#[post("/validate-platform-dev-v2-platformcluster")]
pub async fn validate(
    client: Data<Client>,
    body: Json<AdmissionReview<v2::PlatformCluster>>,
) -> impl Responder {
    let request: AdmissionRequest<v2::PlatformCluster> = match body.into_inner().try_into() {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "malformed validating admission review");
            return HttpResponse::Ok().json(AdmissionResponse::invalid(err.to_string()).into_review());
        }
    };
    let response = AdmissionResponse::from(&request);
    let response = match validator::validate(&client, &request).await {
        Ok(()) => response,
        Err(err) => response.deny(err.to_string()),
    };
    HttpResponse::Ok().json(response.into_review())
}

/// Compute the mutating response for a parsed request.
fn mutate_review(
    request: &AdmissionRequest<v2::PlatformCluster>,
    infra: Infrastructure,
) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);
    let Some(cluster) = &request.object else {
        return response;
    };

    let mut defaulted = cluster.clone();
    if !defaulter::apply_defaults(&mut defaulted.spec, infra) {
        return response;
    }

    let (before, after) = match (
        serde_json::to_value(cluster),
        serde_json::to_value(&defaulted),
    ) {
        (Ok(before), Ok(after)) => (before, after),
        (Err(err), _) | (_, Err(err)) => return AdmissionResponse::invalid(err.to_string()),
    };
    match response.with_patch(json_patch::diff(&before, &after)) {
        Ok(response) => response,
        Err(err) => AdmissionResponse::invalid(err.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn create_request(object: serde_json::Value) -> AdmissionRequest<v2::PlatformCluster> {
        let review: AdmissionReview<v2::PlatformCluster> = serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-4bde-a738-9f8f42ab0a15",
                "kind": {"group": "platform.dev", "version": "v2", "kind": "PlatformCluster"},
                "resource": {"group": "platform.dev", "version": "v2", "resource": "platformclusters"},
                "operation": "CREATE",
                "userInfo": {},
                "object": object
            }
        }))
        .unwrap();
        review.try_into().unwrap()
    }

    #[test]
    fn kubernetes_create_gets_a_patch() {
        let request = create_request(json!({
            "apiVersion": "platform.dev/v2",
            "kind": "PlatformCluster",
            "metadata": {"name": "platform", "namespace": "platform-operator"},
            "spec": {}
        }));

        let response = mutate_review(&request, Infrastructure::Kubernetes);
        assert!(response.allowed);
        let patch: serde_json::Value =
            serde_json::from_slice(response.patch.as_ref().unwrap()).unwrap();
        let paths: Vec<&str> = patch
            .as_array()
            .unwrap()
            .iter()
            .map(|op| op["path"].as_str().unwrap())
            .collect();
        assert!(paths.iter().any(|p| p.contains("disableContainerBuildCapabilities")
            || *p == "/spec/devEnvironments"));
    }

    #[test]
    fn already_defaulted_object_gets_no_patch() {
        let request = create_request(json!({
            "apiVersion": "platform.dev/v2",
            "kind": "PlatformCluster",
            "metadata": {"name": "platform", "namespace": "platform-operator"},
            "spec": {
                "devEnvironments": {
                    "disableContainerBuildCapabilities": true,
                    "disableContainerRunCapabilities": true
                }
            }
        }));

        let response = mutate_review(&request, Infrastructure::Kubernetes);
        assert!(response.allowed);
        assert!(response.patch.is_none());
    }

    #[test]
    fn openshift_create_materializes_capability_configs() {
        let request = create_request(json!({
            "apiVersion": "platform.dev/v2",
            "kind": "PlatformCluster",
            "metadata": {"name": "platform", "namespace": "platform-operator"},
            "spec": {}
        }));

        let response = mutate_review(&request, Infrastructure::OpenShiftV4);
        assert!(response.allowed);
        assert!(response.patch.is_some());
    }
}
