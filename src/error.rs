use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors raised by the connection pool
#[derive(thiserror::Error, Debug)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to initialize connection pool: {0}")]
    Initialization(#[source] sqlx::Error),

    #[error("Connection pool is not initialized")]
    NotInitialized,

    #[error("Connection pool is already initialized")]
    AlreadyInitialized,

    #[error("Connection pool exhausted: no idle connection within {waited_ms}ms")]
    Exhausted { waited_ms: u64 },

    #[error("Connection pool is closed")]
    Closed,

    #[error("Failed to open a new connection: {0}")]
    Connect(#[source] sqlx::Error),
}

/// Errors raised while looking up a drama
#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Lookup failed: {0}")]
    Failed(#[source] sqlx::Error),

    #[error("Lookup timed out after {0}ms")]
    Timeout(u64),
}

impl LookupError {
    /// Transient failures the user can simply retry
    pub fn is_busy(&self) -> bool {
        matches!(self, LookupError::Pool(PoolError::Exhausted { .. }))
    }
}

/// Errors returned to HTTP callers
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_lookup_is_busy() {
        let err = LookupError::from(PoolError::Exhausted { waited_ms: 10 });
        assert!(err.is_busy());
    }

    #[test]
    fn test_query_failure_is_not_busy() {
        let err = LookupError::Failed(sqlx::Error::RowNotFound);
        assert!(!err.is_busy());
        assert!(!LookupError::Timeout(100).is_busy());
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let response = AppError::InvalidInput("text must not be empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
