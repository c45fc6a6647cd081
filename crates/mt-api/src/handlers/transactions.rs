//! Transaction handlers
//!
//! The owner is always the authenticated caller and the date is always the
//! server clock; the request body carries neither.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use mt_core::{MtError, NewTransaction, TransactionId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::audit::{audit_log, extract_ip_address, AuditEvent};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, StatusResponse, STATUS_OK};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub transaction: TransactionInput,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TransactionInput {
    /// Signed amount in the smallest currency unit
    pub amount: i64,
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTransactionResponse {
    pub status: String,
    pub transaction_id: i64,
}

/// Record a transaction for the caller
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Transaction stored", body = CreateTransactionResponse),
        (status = 400, description = "Invalid input", body = StatusResponse),
        (status = 401, description = "Not authenticated", body = StatusResponse),
        (status = 500, description = "Internal server error", body = StatusResponse),
    )
)]
pub async fn create_transaction_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let input = request.transaction;
    input.validate()?;

    let tx = NewTransaction::new(user.user_id, input.amount, input.category, input.description);
    let transaction_id = state.credentials.save_transaction(tx).await?;

    tracing::info!(user_id = user.user_id, transaction_id, "transaction saved");

    Ok((
        StatusCode::CREATED,
        Json(CreateTransactionResponse {
            status: STATUS_OK.to_string(),
            transaction_id,
        }),
    ))
}

/// Delete one of the caller's transactions
///
/// Missing and foreign transactions get the same 404.
#[utoipa::path(
    delete,
    path = "/transactions/{id}",
    tag = "transactions",
    params(("id" = i64, Path, description = "Transaction ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Transaction deleted", body = StatusResponse),
        (status = 400, description = "Invalid transaction id", body = StatusResponse),
        (status = 401, description = "Not authenticated", body = StatusResponse),
        (status = 404, description = "Transaction not found", body = StatusResponse),
        (status = 500, description = "Internal server error", body = StatusResponse),
    )
)]
pub async fn delete_transaction_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    path: Result<Path<TransactionId>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(transaction_id) = path?;

    match state
        .credentials
        .remove_transaction(transaction_id, user.user_id)
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = user.user_id, transaction_id, "transaction deleted");
            Ok(Json(StatusResponse::ok()))
        }
        Err(MtError::TransactionNotFound) => {
            audit_log(&AuditEvent::DeleteDenied {
                user_id: user.user_id,
                transaction_id,
                ip_address: extract_ip_address(&headers),
            });
            Err(AppError::NotFound)
        }
        Err(e) => Err(e.into()),
    }
}
