//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies it as a report
//! access token, and injects `ReportAccess` into request extensions for
//! downstream handlers.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ReportAccess};

/// Require a valid report access token.
///
/// On success: injects `ReportAccess` and marks the response `no-store`.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    // HMAC check only, cheap enough to run on the async worker
    let claims = ctx.core.verify_access(&token).map_err(|e| {
        tracing::debug!(error = %e, "Access token rejected");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(ReportAccess {
        report_id: claims.sub,
        email: claims.email,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}
