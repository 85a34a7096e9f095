//! HTTP API router.
//!
//! Returns a composable `Router` with every route under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Rate limiter → 2. Auth validator (report routes) → 3. Audit logger

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;
use crate::genome::MAX_UPLOAD_BYTES;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

pub(crate) fn build_router(ctx: ApiContext) -> Router {
    // Token-gated routes. Layers are applied from bottom (innermost) to
    // top (outermost):
    //   Extension → Rate limit → Auth → Audit → Handler
    let protected = Router::new()
        .route(
            "/reports/:id",
            get(endpoints::reports::fetch).delete(endpoints::reports::delete),
        )
        .route("/library", get(endpoints::reports::library))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    // Open routes (rate-limited only). Uploads are raw export bytes.
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/reports", post(endpoints::reports::purchase))
        .route("/reports/preview", post(endpoints::reports::preview))
        .route("/reports/resend", post(endpoints::reports::resend))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    Router::new()
        .nest("/api", protected)
        .nest("/api", public)
        .layer(cors(&ctx.core.config().public_url))
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
}

/// Browser access is limited to the public site origin.
fn cors(public_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    match HeaderValue::from_str(public_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(public_url, "Public URL is not a valid origin, CORS disabled");
            layer
        }
    }
}
