//! Append URLs onto a record's `imageUrls`.

use iv_core::RecordId;
use iv_db::models::ImageDocument;
use iv_db::pool::{get_conn, DbPool};
use iv_db::queries;

/// Atomically append `urls` to the record's `imageUrls`.
///
/// Returns `None` without touching the store when there is no record id or
/// nothing to append. Store failures, including a missing record, are
/// logged and reported as `None`.
pub fn seed_urls(
    pool: &DbPool,
    record_id: Option<RecordId>,
    urls: &[String],
) -> Option<ImageDocument> {
    let id = record_id?;
    if urls.is_empty() {
        return None;
    }

    tracing::info!(record_id = %id, count = urls.len(), "Seeding image urls");

    let result = get_conn(pool).and_then(|conn| queries::images::push_urls(&conn, id, urls));
    match result {
        Ok(doc) => {
            tracing::debug!(record_id = %id, total = doc.image_urls().len(), "Seed complete");
            Some(doc)
        }
        Err(e) => {
            tracing::error!(record_id = %id, error = %e, "Failed to seed image urls");
            None
        }
    }
}
