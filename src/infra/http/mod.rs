pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
use api::error::{ApiErrorBody, codes};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use std::any::Any;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;

use crate::application::error::ErrorReport;

use middleware::{log_responses, set_request_context};

/// Full application router: `/v1` todo routes and `/health`, behind [`with_boundary`].
pub fn build_router(state: ApiState) -> Router {
    let health_state = state.clone();

    let routes = Router::new()
        .nest("/v1", build_api_router(state))
        .route("/health", get(health).with_state(health_state));
    with_boundary(routes)
}

/// JSON 404 fallback, panic recovery, response logging and request ids around `routes`.
///
/// A panicking handler answers 500 with the API error body; the panic payload is logged, never
/// returned.
pub fn with_boundary(routes: Router) -> Router {
    routes
        .fallback(endpoint_not_found)
        .layer(CatchPanicLayer::custom(internal_error_from_panic))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

fn internal_error_from_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    };

    let body = ApiErrorBody {
        status: false,
        error_message: "internal server error".to_string(),
        code: codes::INTERNAL,
    };
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    ErrorReport::from_message(
        "infra::http::panic",
        StatusCode::INTERNAL_SERVER_ERROR,
        detail,
    )
    .attach(&mut response);
    response
}

async fn health(State(state): State<ApiState>) -> Response {
    if let Err(err) = state.db.health_check().await {
        return unavailable("infra::http::health::db", &err);
    }
    if let Err(err) = state.cache.ping().await {
        return unavailable("infra::http::health::cache", &err);
    }
    StatusCode::NO_CONTENT.into_response()
}

fn unavailable(source: &'static str, err: &dyn std::error::Error) -> Response {
    let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
    ErrorReport::from_error(source, StatusCode::SERVICE_UNAVAILABLE, err).attach(&mut response);
    response
}

async fn endpoint_not_found() -> Response {
    let mut response = (
        StatusCode::NOT_FOUND,
        Json(json!({ "error_message": "Endpoint not found" })),
    )
        .into_response();
    ErrorReport::from_message(
        "infra::http::fallback",
        StatusCode::NOT_FOUND,
        "no route matched",
    )
    .attach(&mut response);
    response
}
