use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

impl From<serde_json::Error> for ReviewError {
    fn from(err: serde_json::Error) -> Self {
        Self::ValidationError(format!("Invalid request body: {}", err))
    }
}

impl From<sqlx::Error> for ReviewError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<reqwest::Error> for ReviewError {
    fn from(err: reqwest::Error) -> Self {
        Self::GatewayError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The review write itself failed.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Auth backend error: {0}")]
    AuthBackendError(String),

    #[error("Gateway error: {0}")]
    GatewayError(String),

    #[error("Audit log error: {0}")]
    AuditError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ReviewError>;

impl ReviewError {
    pub fn missing_required_fields() -> Self {
        Self::ValidationError("Missing required fields".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::Unauthorized => StatusCode::UNAUTHORIZED,
            ReviewError::Forbidden(_) => StatusCode::FORBIDDEN,
            ReviewError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ReviewError::NotFound(_) => StatusCode::NOT_FOUND,
            ReviewError::AuthBackendError(_) => StatusCode::SERVICE_UNAVAILABLE,
            ReviewError::GatewayError(_) => StatusCode::BAD_GATEWAY,
            ReviewError::DatabaseError(_)
            | ReviewError::PersistenceError(_)
            | ReviewError::AuditError(_)
            | ReviewError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `{"error": ...}` envelope.
    ///
    /// Validation messages go out verbatim so callers see e.g.
    /// "Missing required fields"; store internals are not echoed.
    pub fn envelope_message(&self) -> String {
        match self {
            ReviewError::ValidationError(msg) => msg.clone(),
            ReviewError::PersistenceError(_) => "Failed to persist review".to_string(),
            ReviewError::DatabaseError(_) => "Database error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "error": self.envelope_message() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ReviewError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ReviewError::missing_required_fields().status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ReviewError::DatabaseError("locked".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_message() {
        assert_eq!(
            ReviewError::missing_required_fields().envelope_message(),
            "Missing required fields"
        );
        assert_eq!(ReviewError::Unauthorized.envelope_message(), "Unauthorized");
        assert_eq!(
            ReviewError::PersistenceError("UNIQUE constraint failed".into()).envelope_message(),
            "Failed to persist review"
        );
        // reads never claim a failed write
        assert_eq!(
            ReviewError::DatabaseError("no such table: proposals".into()).envelope_message(),
            "Database error"
        );
        assert_eq!(
            ReviewError::PersistenceError("disk I/O error".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
