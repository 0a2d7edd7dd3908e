use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    bot_token::require_bot_token,
    request_id::{make_span_with_request_id, request_id_middleware},
};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes(state.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Routes under /api/v1, all requiring the bot token
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/messages", post(handlers::post_message))
        .route_layer(middleware::from_fn_with_state(state, require_bot_token))
}
