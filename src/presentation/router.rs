// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    close_session, create_session, get_session, health_check, list_features, refresh,
    relayout, set_features, set_lookback, trigger_inference,
};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/features", get(list_features))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(close_session))
        .route("/sessions/:id/relayout", post(relayout))
        .route("/sessions/:id/lookback", put(set_lookback))
        .route("/sessions/:id/features", put(set_features))
        .route("/sessions/:id/refresh", post(refresh))
        .route("/sessions/:id/inference", post(trigger_inference))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
