use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{api::AppState, error::AppError};

/// HTTP header carrying the chat-platform credential
pub const BOT_TOKEN_HEADER: &str = "x-bot-token";

/// Rejects requests whose `x-bot-token` header does not match `BOT_TOKEN`.
pub async fn require_bot_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = request
        .headers()
        .get(BOT_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|token| tokens_match(token, &state.bot_token));

    if !authorized {
        tracing::warn!(uri = %request.uri(), "Rejected request with missing or invalid bot token");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Compares without short-circuiting on the first differing byte
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
