use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Account locked. Try again in {0} minute(s).")]
    AccountLocked(i64),

    #[error("Please complete CAPTCHA verification correctly.")]
    CaptchaRequired,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("The {0} module is not enabled for this clinic.")]
    ModuleDisabled(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("No clinic context found. Please select a clinic.")]
    NoClinicContext,

    #[error("{0}")]
    NotFound(String),

    #[error("No staff found for this clinic. Please add at least one staff member to this clinic before impersonating.")]
    NoStaffFound,

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::AccountLocked(_)
            | AppError::CaptchaRequired
            | AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_)
            | AppError::ModuleDisabled(_)
            | AppError::InvalidTarget(_) => StatusCode::FORBIDDEN,
            AppError::NoClinicContext
            | AppError::InsufficientStock(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::NoStaffFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, message);
        } else {
            tracing::warn!("Error: {}: {}", status, message);
        }

        let body = Json(json!({
            "success": false,
            "status": status.as_u16(),
            "message": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
