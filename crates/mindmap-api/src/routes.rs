use std::any::Any;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mindmap_core::Envelope;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;

use crate::{cors, handlers, AppState};

/// Builds the router, optionally mounted under `base_path` (e.g. `/functions/v1/mindmap`).
pub fn create_router(state: AppState, base_path: Option<&str>) -> Router {
    let api = Router::new()
        .route(
            "/health",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        .route(
            "/ping",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        .route(
            "/",
            post(handlers::generate).fallback(handlers::method_not_allowed),
        )
        .route(
            "/generate",
            post(handlers::generate).fallback(handlers::method_not_allowed),
        )
        .route(
            "/refine",
            post(handlers::refine).fallback(handlers::method_not_allowed),
        )
        .with_state(state);

    let router = match base_path.map(|p| p.trim_end_matches('/')) {
        Some(prefix) if !prefix.is_empty() => Router::new().nest(prefix, api),
        _ => api,
    };

    let router = router
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(cors::preflight))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http());

    cors::with_cors_headers(router)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::<()>::failure("Internal server error")),
    )
        .into_response()
}
