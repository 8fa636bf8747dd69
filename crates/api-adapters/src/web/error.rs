use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde_json::json;

/// Transport wrapper so handlers can `?` on domain results.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
            DomainError::UserNotFound(_) | DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::DuplicateReview
            | DomainError::EmailMismatch
            | DomainError::Conflict(_)
            | DomainError::InvalidScore(_)
            | DomainError::InvalidUsername(_)
            | DomainError::ReservedUsername
            | DomainError::InvalidConfirmationCode
            | DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self.0 {
            DomainError::Internal(message) => {
                tracing::error!(%message, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
