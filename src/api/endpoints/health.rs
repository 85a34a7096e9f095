use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub mail_enabled: bool,
    pub payments_enabled: bool,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let config = ctx.core.config();
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        mail_enabled: config.mail_enabled(),
        payments_enabled: config.payments_enabled(),
    })
}
