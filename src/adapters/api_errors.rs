use crate::domain::error::PayError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Newtype so the domain error can carry an axum response mapping without
/// the domain knowing about HTTP.
pub struct ApiError(pub PayError);

impl From<PayError> for ApiError {
    fn from(err: PayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            // Non-2xx tells the provider to redeliver on its own schedule.
            PayError::VerificationFailed(msg) => {
                (StatusCode::BAD_REQUEST, "webhook_error", msg.clone())
            }
            PayError::UnhandledEventType(event_type) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unhandled_event_type",
                format!("no handler registered for event type: {event_type}"),
            ),
            PayError::PreconditionFailed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "precondition_failed",
                msg.clone(),
            ),
            PayError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "remote resource not found".to_string(),
            ),
            PayError::AlreadyResolved(msg) => {
                (StatusCode::CONFLICT, "already_resolved", msg.clone())
            }
            PayError::NotApproved { .. } | PayError::ThreeDsRejected => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "payment_rejected",
                self.0.to_string(),
            ),
            PayError::Remote { .. }
            | PayError::Inaccessible(_)
            | PayError::OperationFailed(_) => {
                tracing::error!(error = %self.0, "remote call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "remote provider error".to_string(),
                )
            }
            PayError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
