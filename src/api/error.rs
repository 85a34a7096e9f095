//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core_state::CoreError;
use crate::crypto::TokenError;
use crate::genome::GenomeError;
use crate::services::ServiceError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Token expired")]
    TokenExpired,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Payment required: {0}")]
    PaymentRequired(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream unavailable: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Link expired, request a new one".to_string(),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail.clone()),
            ApiError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Rate limit exceeded. Retry after {retry_after}s"),
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::PayloadTooLarge(detail) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "UPLOAD_TOO_LARGE",
                detail.clone(),
            ),
            ApiError::PaymentRequired(detail) => (
                StatusCode::PAYMENT_REQUIRED,
                "PURCHASE_REQUIRED",
                detail.clone(),
            ),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail.clone()),
            ApiError::Upstream(detail) => {
                tracing::error!(detail, "Upstream service failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_UNAVAILABLE",
                    "A payment or mail provider is unavailable, try again".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        let mut response = (status, Json(body)).into_response();
        // Add retry-after header for rate limited responses
        if let ApiError::RateLimited { retry_after } = &self {
            if let Ok(val) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", val);
            }
        }
        response
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Genome(e @ GenomeError::TooLarge { .. }) => {
                ApiError::PayloadTooLarge(e.to_string())
            }
            CoreError::Genome(e) => ApiError::BadRequest(e.to_string()),
            CoreError::Token(TokenError::Expired) => ApiError::TokenExpired,
            CoreError::Token(_) => ApiError::Unauthorized,
            CoreError::Service(e) => match e {
                ServiceError::PurchaseNotFound(_)
                | ServiceError::PurchaseIncomplete { .. }
                | ServiceError::ProductMismatch => ApiError::PaymentRequired(e.to_string()),
                ServiceError::Rejected(detail) => ApiError::BadRequest(detail),
                ServiceError::Http(_) | ServiceError::Upstream { .. } => {
                    ApiError::Upstream(e.to_string())
                }
            },
            CoreError::InvalidEmail | CoreError::MissingCheckout => {
                ApiError::BadRequest(err.to_string())
            }
            CoreError::EmailMismatch => ApiError::Forbidden(err.to_string()),
            CoreError::AlreadyRedeemed(_) => ApiError::Conflict(err.to_string()),
            CoreError::NotFound => ApiError::NotFound("Report not found".into()),
            CoreError::Crypto(e) => ApiError::Internal(e.to_string()),
            CoreError::Report(e) => ApiError::Internal(e.to_string()),
            CoreError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn error_code(response: Response) -> String {
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["error"]["code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn rate_limited_returns_429_with_retry_after() {
        let response = ApiError::RateLimited { retry_after: 60 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "60");
        assert_eq!(error_code(response).await, "RATE_LIMITED");
    }

    #[tokio::test]
    async fn internal_returns_500() {
        let response = ApiError::Internal("something broke".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        // Internal errors hide details from client
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn upstream_hides_provider_detail() {
        let response = ApiError::Upstream("resend 500: secret".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("secret"));
    }

    #[test]
    fn core_errors_map_to_statuses() {
        let cases: Vec<(CoreError, StatusCode)> = vec![
            (CoreError::InvalidEmail, StatusCode::BAD_REQUEST),
            (CoreError::EmailMismatch, StatusCode::FORBIDDEN),
            (
                CoreError::AlreadyRedeemed("chk_1".into()),
                StatusCode::CONFLICT,
            ),
            (CoreError::NotFound, StatusCode::NOT_FOUND),
            (
                CoreError::Token(TokenError::Expired),
                StatusCode::UNAUTHORIZED,
            ),
            (
                CoreError::Token(TokenError::BadSignature),
                StatusCode::UNAUTHORIZED,
            ),
            (
                CoreError::Service(ServiceError::PurchaseNotFound("chk_1".into())),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                CoreError::Service(ServiceError::Http("refused".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                CoreError::Genome(GenomeError::TooLarge {
                    size_mb: 80.0,
                    max_mb: 64,
                }),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (CoreError::Genome(GenomeError::EmptyInput), StatusCode::BAD_REQUEST),
        ];

        for (err, status) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.into_response().status(), status);
        }
    }
}
