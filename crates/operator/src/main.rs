//! Operator entrypoint

use std::sync::Arc;

use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer, Responder, get, middleware, web::Data,
};
use kube::Client;
use platform_operator::config::OperatorConfig;
use platform_operator::controller::{self, State};
use platform_operator::namespace_cache::NamespaceCache;
use platform_operator::workspace_config::object::SyncFilters;
use platform_operator::{infra, lease, telemetry, webhook, workspace_config};
use tokio::sync::watch;
use tracing::{info, instrument};

#[get("/health")]
async fn health(_: HttpRequest) -> impl Responder {
    HttpResponse::Ok().json("healthy")
}

#[get("/")]
async fn index(c: Data<State>, _: HttpRequest) -> impl Responder {
    let d = c.diagnostics().await;
    HttpResponse::Ok().json(&d)
}

#[tokio::main]
#[instrument(level = "info", target = "operator::main", name = "main")]
async fn main() -> anyhow::Result<()> {
    telemetry::init()?;

    let config = OperatorConfig::from_env()?;
    let client = Client::try_default().await?;

    infra::detect(&client).await?;
    info!(infrastructure = ?infra::kind(), "infrastructure probe complete");

    // Single writer across replicas; followers block here until the lease
    // holder goes away.
    if infra::is_leader_election_enabled() {
        let (leader_tx, mut leader_rx) = watch::channel(false);
        tokio::spawn(lease::run_leader_election(client.clone(), leader_tx));
        while !*leader_rx.borrow_and_update() {
            leader_rx.changed().await?;
        }
        info!("lease acquired, starting controllers");
    } else {
        info!("leases unavailable, starting controllers without leader election");
    }

    let state = State::default();

    let operator_namespace = if config.watch_namespace.is_empty() {
        client.default_namespace().to_string()
    } else {
        config.watch_namespace.clone()
    };
    let propagator_ctx = Arc::new(workspace_config::Context {
        client: client.clone(),
        cache: NamespaceCache::new(client.clone()),
        filters: SyncFilters {
            labels_to_remove: config.labels_to_remove,
            annotations_to_remove: config.annotations_to_remove,
        },
        operator_namespace,
    });

    let cluster_controller = controller::run(state.clone(), client.clone());
    let propagator = workspace_config::run(propagator_ctx);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(Data::new(state.clone()))
            .app_data(Data::new(client.clone()))
            .wrap(middleware::Logger::default().exclude("/health"))
            .service(health)
            .service(index)
            .service(webhook::mutate)
            .service(webhook::validate)
    })
    .bind("0.0.0.0:8080")?
    .shutdown_timeout(5);

    tokio::join!(cluster_controller, propagator, server.run()).2?;
    Ok(())
}
