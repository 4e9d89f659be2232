use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Administrative routes for managed upstream DNS files.
pub fn create_api_routes(state: AppState) -> Router {
    Router::new()
        .route("/control/upstream_dns/status", get(handlers::get_status))
        .route("/control/upstream_dns/add_url", post(handlers::add_url))
        .route("/control/upstream_dns/remove_url", post(handlers::remove_url))
        .route("/control/upstream_dns/set_url", post(handlers::set_url))
        .route("/control/upstream_dns/refresh", post(handlers::refresh))
        .with_state(state)
}
