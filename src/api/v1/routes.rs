/*
 * Responsibility
 * - v1 URL layout
 * - routes(): edge-authenticated API (the caller applies the edge middleware)
 * - service_routes(): endpoints that authorize in-handler through the service gate
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    session::{me, whoami},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/me", get(me))
}

pub fn service_routes() -> Router<AppState> {
    Router::new().route("/whoami", get(whoami))
}
