//! Money tracker API
//!
//! axum server for registration, login and per-user transaction records.
//! [`create_router`] assembles the routes and the tower middleware stack;
//! the `mt-api` binary wires it to configuration and the SQLite store.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod state;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Router,
};
use tower::{
    timeout::{error::Elapsed, TimeoutLayer},
    ServiceBuilder,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::error::AppError;
use crate::state::AppState;

/// Build the application router with its middleware stack
pub fn create_router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(routes::openapi_json))
        .merge(routes::api_routes(state.clone()))
        .with_state(state);

    with_middleware(router, timeout)
}

/// Wrap `router` in the tower middleware stack
///
/// Outermost first: request ID assignment, tracing span, request ID
/// propagation to the response, panic recovery, request timeout.
pub fn with_middleware(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        AppError::Timeout.into_response()
    } else {
        AppError::Internal(format!("middleware: {err}")).into_response()
    }
}

fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Internal("request handler panicked".to_string()).into_response()
}
