//! Error-to-HTTP response conversion.
//!
//! Wraps [`iv_core::Error`] so route handlers can return
//! `Result<T, AppError>` and use `?` on core results.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: iv_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: iv_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn code(&self) -> &'static str {
        match &self.inner {
            iv_core::Error::NotFound { .. } => "not_found",
            iv_core::Error::Unauthorized(_) => "unauthorized",
            iv_core::Error::Validation(_) => "validation_error",
            iv_core::Error::Database { .. } => "database_error",
            iv_core::Error::Io { .. } => "io_error",
            iv_core::Error::Provider { .. } => "provider_error",
            iv_core::Error::Internal(_) => "internal_error",
        }
    }
}

impl From<iv_core::Error> for AppError {
    fn from(e: iv_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = self.code();

        // 5xx detail stays in the logs, except for provider errors, which
        // the admin needs to see to fix an upload.
        let message = if status == StatusCode::BAD_GATEWAY {
            tracing::warn!(error = %self.inner, "Provider error in admin action");
            self.inner.to_string()
        } else if status.is_server_error() {
            tracing::error!(status = %status, error = %self.inner, "Server error in API handler");
            "internal server error".to_string()
        } else {
            self.inner.to_string()
        };

        let body = json!({
            "error": message,
            "code": code,
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
