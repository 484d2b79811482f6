use crate::presentation::app_state::AppState;
use crate::presentation::handlers;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::health_check))
        .route("/api/summary", get(handlers::api_summary))
        .route("/api/sites", get(handlers::api_sites))
        .route("/api/history", get(handlers::api_history))
        .route("/refresh", post(handlers::refresh))
        .route("/sites/select", post(handlers::select_site))
        .route("/sites/:site/tanks/:tank/history", get(handlers::tank_history))
        .route("/history/close", post(handlers::close_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
