//! Identity middleware for protected routes
//!
//! Reads the `Authorization: Bearer <token>` header, verifies the token and
//! attaches the caller's user ID to the request extensions as
//! [`AuthenticatedUser`]. Handlers receive it through the extractor of the
//! same name.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use mt_core::UserId;
use thiserror::Error;

use super::jwt::{validate_access_token, JwtConfig, JwtError};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::error::StatusResponse;
use crate::state::AppState;

/// Identity of the caller, set by [`auth_middleware`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(AuthError::MissingIdentity)
    }
}

/// Authentication middleware errors
///
/// The variant is for logs; every one of them answers with the same 401 body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("No authenticated user on request")]
    MissingIdentity,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(StatusResponse::error("unauthorized")),
        )
            .into_response()
    }
}

/// Resolve the caller's identity from request headers
///
/// The header must be exactly two space-separated parts, the first being
/// literally `Bearer`.
pub fn authenticate(headers: &HeaderMap, config: &JwtConfig) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = match auth_header.split(' ').collect::<Vec<_>>()[..] {
        ["Bearer", token] => token,
        _ => return Err(AuthError::InvalidAuthHeader),
    };

    let claims = validate_access_token(config, token)?;
    Ok(AuthenticatedUser {
        user_id: claims.user_id()?,
    })
}

/// Reject unauthenticated requests before they reach the handler
///
/// ```ignore
/// let protected = Router::new()
///     .route("/transactions", post(create_transaction_handler))
///     .route_layer(middleware::from_fn_with_state(state, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    match authenticate(request.headers(), &state.jwt) {
        Ok(user) => {
            tracing::debug!(user_id = user.user_id, "request authenticated");
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
                ip_address: extract_ip_address(request.headers()),
                user_agent: extract_user_agent(request.headers()),
            });
            Err(e)
        }
    }
}
