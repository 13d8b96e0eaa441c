use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application error type shared by all services.
///
/// Authentication and authorization failures deliberately collapse into the
/// single `Unauthorized` variant at the response boundary: callers cannot
/// tell from the response shape which layer denied them. The distinct
/// reasons live in `guard::Denial` and are logged there.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Authentication & Authorization =====
    #[error("Unauthorized")]
    Unauthorized,

    #[error("No identity attached to this request")]
    MissingIdentity,

    // ===== Validation =====
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    // ===== Storage =====
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    // ===== Serialization =====
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Credentials =====
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    // ===== Transport =====
    #[error("Transport error: {0}")]
    Transport(String),

    // ===== Internal =====
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::MissingIdentity | AppError::Jwt(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_)
            | AppError::Redis(_)
            | AppError::Json(_)
            | AppError::Bcrypt(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the response body
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized | AppError::MissingIdentity | AppError::Jwt(_) => "UNAUTHORIZED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Transport(_) => "BAD_GATEWAY",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Message safe to expose to clients. Internal details stay in logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthorized | AppError::MissingIdentity | AppError::Jwt(_) => {
                "Unauthorized".to_string()
            }
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(what) => format!("{} not found", what),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Transport(_) => "Upstream service unavailable".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = json!({
            "error": self.user_message(),
            "code": self.error_code(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_variants_share_one_response_shape() {
        for err in [AppError::Unauthorized, AppError::MissingIdentity] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.error_code(), "UNAUTHORIZED");
            assert_eq!(err.user_message(), "Unauthorized");
        }
    }

    #[test]
    fn internal_details_do_not_leak() {
        let err = AppError::Internal(anyhow::anyhow!("connection pool exhausted"));
        assert_eq!(err.user_message(), "Internal server error");
    }
}
