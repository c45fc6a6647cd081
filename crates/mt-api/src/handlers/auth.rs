//! Registration and login handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::auth::credentials::CredentialCheck;
use crate::auth::generate_access_token;
use crate::error::{AppError, STATUS_OK};
use crate::state::AppState;

/// Registration request
///
/// Missing fields decode as empty strings and fail validation.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    /// At least 8 characters
    #[serde(default)]
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub status: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub status: String,
    /// Bearer token for the protected endpoints
    pub token: String,
    pub user_id: i64,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid input", body = StatusResponse),
        (status = 409, description = "Email already registered", body = StatusResponse),
        (status = 500, description = "Internal server error", body = StatusResponse),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    request.validate()?;

    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);

    match state
        .credentials
        .save_user(&request.email, &request.password)
        .await
    {
        Ok(user_id) => {
            tracing::info!(user_id, "user registered");
            audit_log(&AuditEvent::RegistrationSuccess {
                user_id,
                email: request.email,
                ip_address,
                user_agent,
            });

            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    status: STATUS_OK.to_string(),
                    user_id,
                }),
            ))
        }
        Err(e) => {
            audit_log(&AuditEvent::RegistrationFailure {
                email: request.email,
                reason: e.to_string(),
                ip_address,
                user_agent,
            });
            Err(e.into())
        }
    }
}

/// Exchange email and password for an access token
///
/// Unknown email and wrong password get the same answer.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Malformed request", body = StatusResponse),
        (status = 401, description = "Invalid credentials", body = StatusResponse),
        (status = 500, description = "Internal server error", body = StatusResponse),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);
    let reject = |reason: &str, ip_address, user_agent| {
        audit_log(&AuditEvent::LoginFailure {
            email: request.email.clone(),
            reason: reason.to_string(),
            ip_address,
            user_agent,
        });
        AppError::InvalidCredentials
    };

    let user = match state
        .credentials
        .verify_credentials(&request.email, &request.password)
        .await?
    {
        CredentialCheck::Valid(user) => user,
        CredentialCheck::UnknownEmail => {
            return Err(reject("unknown email", ip_address, user_agent))
        }
        CredentialCheck::WrongPassword => {
            return Err(reject("wrong password", ip_address, user_agent))
        }
    };

    let token = generate_access_token(&state.jwt, user.id)?;

    tracing::info!(user_id = user.id, "user logged in");
    audit_log(&AuditEvent::LoginSuccess {
        user_id: user.id,
        email: user.email,
        ip_address,
        user_agent,
    });

    Ok(Json(LoginResponse {
        status: STATUS_OK.to_string(),
        token,
        user_id: user.id,
    }))
}
