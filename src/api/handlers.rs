use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::InboundMessage,
    services::handle_message,
};

use super::AppState;

/// Health check endpoint; borrows a pooled connection and pings the database
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.finder.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "healthy" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

/// Answers one chat message forwarded by the transport
pub async fn post_message(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(message): Json<InboundMessage>,
) -> AppResult<Response> {
    if message.text.trim().is_empty() {
        return Err(AppError::InvalidInput("message text is empty".to_string()));
    }

    tracing::debug!(
        request_id = %request_id,
        user = %message.user.display_name,
        "Processing inbound message"
    );

    let reply = handle_message(state.finder.as_ref(), &state.formatter, &message).await;

    Ok(match reply {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
