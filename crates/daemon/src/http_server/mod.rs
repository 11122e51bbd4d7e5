use axum::routing::any;
use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

mod artifacts;
mod config;
pub mod error;
mod handlers;
mod health;

pub use config::Config;
pub use error::StoreError;

use crate::ServiceState;

pub const STORE_PREFIX: &str = "/artifacts";
const STATUS_PREFIX: &str = "/_status";

/// Build the full application router: the artifact store, the status
/// endpoints and the not-found fallback.
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route(STORE_PREFIX, any(artifacts::root_handler))
        .route(&format!("{}/", STORE_PREFIX), any(artifacts::root_handler))
        .route(&format!("{}/*path", STORE_PREFIX), any(artifacts::handler))
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .with_state(state)
}

/// Run the store HTTP server until `shutdown_rx` fires.
pub async fn run(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router(state).layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "store server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
