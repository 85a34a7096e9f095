//! Report endpoints: free preview, purchase redemption, and token-gated
//! read, erase, and library listing.
//!
//! Every core call runs on the blocking pool (SQLite, PBKDF2, outbound
//! HTTP to the payment and mail providers).

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ReportAccess};
use crate::core_state::{PreviewOutcome, PurchaseReceipt};
use crate::db::ReportListing;
use crate::report::Report;

#[derive(Deserialize)]
pub struct PurchaseQuery {
    #[serde(default)]
    pub checkout_id: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResendRequest {
    pub checkout_id: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct ResendResponse {
    pub status: &'static str,
}

/// `POST /api/reports/preview`: body is the raw (optionally gzipped) export.
pub async fn preview(
    State(ctx): State<ApiContext>,
    body: Bytes,
) -> Result<Json<PreviewOutcome>, ApiError> {
    let core = ctx.core.clone();
    let outcome = tokio::task::spawn_blocking(move || core.preview(&body)).await??;
    Ok(Json(outcome))
}

/// `POST /api/reports?checkout_id=&email=`: redeem a paid checkout.
pub async fn purchase(
    State(ctx): State<ApiContext>,
    Query(query): Query<PurchaseQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<PurchaseReceipt>), ApiError> {
    let core = ctx.core.clone();
    let receipt = tokio::task::spawn_blocking(move || {
        core.purchase(&body, &query.checkout_id, &query.email)
    })
    .await??;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `POST /api/reports/resend`: email a fresh access link.
pub async fn resend(
    State(ctx): State<ApiContext>,
    Json(request): Json<ResendRequest>,
) -> Result<(StatusCode, Json<ResendResponse>), ApiError> {
    let core = ctx.core.clone();
    tokio::task::spawn_blocking(move || core.resend_link(&request.checkout_id, &request.email))
        .await??;
    Ok((StatusCode::ACCEPTED, Json(ResendResponse { status: "sent" })))
}

/// `GET /api/reports/:id`
pub async fn fetch(
    State(ctx): State<ApiContext>,
    Extension(access): Extension<ReportAccess>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<Report>, ApiError> {
    ensure_grant(&access, report_id)?;
    let core = ctx.core.clone();
    let report = tokio::task::spawn_blocking(move || core.fetch(report_id)).await??;
    Ok(Json(report))
}

/// `DELETE /api/reports/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(access): Extension<ReportAccess>,
    Path(report_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ensure_grant(&access, report_id)?;
    let core = ctx.core.clone();
    tokio::task::spawn_blocking(move || core.delete(report_id)).await??;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/library`: every report owned by the token's address.
pub async fn library(
    State(ctx): State<ApiContext>,
    Extension(access): Extension<ReportAccess>,
) -> Result<Json<Vec<ReportListing>>, ApiError> {
    let core = ctx.core.clone();
    let listings = tokio::task::spawn_blocking(move || core.library(&access.email)).await??;
    Ok(Json(listings))
}

/// A token opens exactly the report it was issued for.
fn ensure_grant(access: &ReportAccess, report_id: Uuid) -> Result<(), ApiError> {
    if access.report_id != report_id {
        tracing::warn!(
            granted = %access.report_id,
            requested = %report_id,
            "Access token used for another report"
        );
        return Err(ApiError::Forbidden(
            "Token does not grant access to this report".into(),
        ));
    }
    Ok(())
}
