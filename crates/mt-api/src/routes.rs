//! API route definitions and the OpenAPI document

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, post},
    Json, Router,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::auth::middleware::auth_middleware;
use crate::error::StatusResponse;
use crate::handlers::{auth, health, transactions};
use crate::state::AppState;

/// Register, login and the transaction endpoints
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler));

    let protected_routes = Router::new()
        .route(
            "/transactions",
            post(transactions::create_transaction_handler),
        )
        .route(
            "/transactions/:id",
            delete(transactions::delete_transaction_handler),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Money Tracker API", description = "Personal finance tracking backend"),
    paths(
        health::health_check,
        auth::register_handler,
        auth::login_handler,
        transactions::create_transaction_handler,
        transactions::delete_transaction_handler,
    ),
    components(schemas(
        StatusResponse,
        health::HealthResponse,
        auth::RegisterRequest,
        auth::RegisterResponse,
        auth::LoginRequest,
        auth::LoginResponse,
        transactions::CreateTransactionRequest,
        transactions::TransactionInput,
        transactions::CreateTransactionResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service status"),
        (name = "auth", description = "Registration and login"),
        (name = "transactions", description = "Per-user transaction records"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
