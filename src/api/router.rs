//! API router.
//!
//! Layer stack (outermost → innermost): CORS → request tracing → handler.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the API router over a pre-constructed `ApiContext`.
///
/// CORS allows any origin, method and header, with credentials, so browser
/// and mobile clients can call the service directly.
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/ask", post(endpoints::ask::ask))
        .route("/diagnose", get(endpoints::diagnose::diagnose))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}
