//! Public read endpoint for a record's stored image URLs.
//!
//! Unauthenticated and read-only. Error bodies are the bare
//! `{"error": "..."}` shape the gallery widget expects, not [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use iv_core::document::IMAGE_URLS;
use iv_core::RecordId;
use serde_json::{json, Value};

use crate::context::AppContext;

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// GET /{root}/api/image-urls/{id}
pub async fn get_image_urls(State(ctx): State<AppContext>, Path(id): Path<String>) -> Response {
    let id = id.trim();
    if id.is_empty() {
        return error(StatusCode::BAD_REQUEST, "missing id");
    }

    // Ids that cannot exist are indistinguishable from unknown ones.
    let Ok(record_id) = id.parse::<RecordId>() else {
        return error(StatusCode::NOT_FOUND, "not found");
    };

    let found = iv_db::pool::get_conn(&ctx.db)
        .and_then(|conn| iv_db::queries::images::get_image(&conn, record_id));

    match found {
        Ok(Some(doc)) => {
            let urls = match doc.params.get(IMAGE_URLS) {
                Some(Value::Array(items)) => Value::Array(items.clone()),
                _ => Value::Array(Vec::new()),
            };
            Json(json!({ "imageUrls": urls })).into_response()
        }
        Ok(None) => error(StatusCode::NOT_FOUND, "not found"),
        Err(e) => {
            tracing::error!(record_id = %record_id, error = %e, "Failed to read image urls");
            error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    }
}

/// GET /{root}/api/image-urls/ (no id segment)
pub async fn missing_id() -> Response {
    error(StatusCode::BAD_REQUEST, "missing id")
}
