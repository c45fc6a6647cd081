//! API error handling
//!
//! Every failure leaves the server as `{"status":"Error","error":"..."}` with
//! a status code matching its class. Internal details are logged, never sent.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mt_core::MtError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::auth::jwt::JwtError;

pub const STATUS_OK: &str = "OK";
pub const STATUS_ERROR: &str = "Error";

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// `"OK"` or `"Error"`
    pub status: String,
    /// Present only on errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: STATUS_OK.to_string(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            error: Some(message.into()),
        }
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Malformed or invalid input
    Validation(String),
    /// Missing, malformed, expired or forged credentials on a protected route
    Unauthorized,
    /// Login with an unknown email or a wrong password
    InvalidCredentials,
    Conflict(String),
    /// The resource is absent or belongs to another user
    NotFound,
    /// The request ran past the configured timeout
    Timeout,
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::Validation(msg) | AppError::Conflict(msg) => msg,
            AppError::Unauthorized => "unauthorized".to_string(),
            AppError::InvalidCredentials => "invalid credentials".to_string(),
            AppError::NotFound => "transaction not found".to_string(),
            AppError::Timeout => "request timed out".to_string(),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "internal error".to_string()
            }
        };

        (status, Json(StatusResponse::error(message))).into_response()
    }
}

impl From<MtError> for AppError {
    fn from(err: MtError) -> Self {
        match err {
            MtError::DuplicateEmail => AppError::Conflict("user already exists".to_string()),
            // Only reachable with a valid token whose account is gone.
            MtError::UserNotFound => AppError::Unauthorized,
            MtError::TransactionNotFound => AppError::NotFound,
            MtError::ValidationError(msg) => AppError::Validation(msg),
            MtError::DatabaseError(msg) => AppError::Internal(format!("database: {msg}")),
            MtError::HashingError(msg) => AppError::Internal(format!("hashing: {msg}")),
        }
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        AppError::Internal(format!("token issuance: {err}"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected request body");
        AppError::Validation("failed to decode request".to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected path parameter");
        AppError::Validation("invalid transaction id".to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect::<Vec<_>>()
            .join("; ");

        if message.is_empty() {
            AppError::Validation("invalid request".to_string())
        } else {
            AppError::Validation(message)
        }
    }
}
