use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::context::AppContext;

/// GET /health
pub async fn health_check(State(ctx): State<AppContext>) -> Json<Value> {
    let database = match iv_db::pool::get_conn(&ctx.db) {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            "unavailable"
        }
    };
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}
