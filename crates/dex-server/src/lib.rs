pub mod config;
pub mod dispatch;
pub mod error;
pub mod firehose;
pub mod logs;
pub mod orchestrator;
pub mod request_meta;
pub mod shield;
pub mod siren;
pub mod state;
pub mod transport;

use axum::routing::get;
use axum::{Json, Router, middleware};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct PingResponse {
    status: &'static str,
    version: &'static str,
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the HTTP surface. Backends and settings are fixed for the
/// lifetime of the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .merge(firehose::routes())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_meta::request_id))
        .with_state(state)
}
