use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::error::ReservationError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error(transparent)]
    Reservation(#[from] ReservationError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Reservation(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            AppError::Reservation(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Reservation(e) if e.is_conflict() => StatusCode::CONFLICT,
            AppError::Reservation(ReservationError::Forbidden(_)) => StatusCode::FORBIDDEN,
            AppError::Reservation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Reservation(e) => e.code(),
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::AuthError(msg) => {
                warn!(error = ?self, message = %msg, "Request rejected");
            }
            AppError::Reservation(ReservationError::Store(e)) => {
                error!(error = ?e, "Database error");
            }
            AppError::Reservation(e) => {
                warn!(code = e.code(), message = %e, "Reservation request rejected");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level message to the client
        let public_message = match &self {
            AppError::ValidationError(msg) | AppError::AuthError(msg) => msg.clone(),
            AppError::Reservation(ReservationError::Store(_)) => {
                "A database error occurred".to_string()
            }
            AppError::Reservation(e) => e.to_string(),
        };

        error_response(code, public_message, None, status)
    }
}
