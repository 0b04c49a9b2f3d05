//! Image document CRUD and array mutations.
//!
//! Array mutations (`push_*`, `remove_*`) read, modify and write the document
//! inside one `BEGIN IMMEDIATE` transaction so concurrent writers serialize
//! on the SQLite write lock instead of overwriting each other's appends.

use chrono::Utc;
use iv_core::document::{IMAGE_KEYS, IMAGE_URLS};
use iv_core::{Error, RecordId, Result};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde_json::{Map, Value};

use crate::models::ImageDocument;

const COLS: &str = "id, doc, created_at, updated_at";

/// Fields never stored inside the document body.
const RESERVED: &[&str] = &["id", "_id"];

fn encode(params: &Map<String, Value>) -> Result<String> {
    serde_json::to_string(params).map_err(|e| Error::Internal(format!("encode document: {e}")))
}

/// Create a new record from `params`.
///
/// `imageKeys` and `imageUrls` default to empty arrays when absent.
pub fn create_image(conn: &Connection, params: Map<String, Value>) -> Result<ImageDocument> {
    let id = RecordId::new();
    let now = Utc::now().to_rfc3339();

    let mut params = params;
    for key in RESERVED {
        params.remove(*key);
    }
    params
        .entry(IMAGE_KEYS)
        .or_insert_with(|| Value::Array(Vec::new()));
    params
        .entry(IMAGE_URLS)
        .or_insert_with(|| Value::Array(Vec::new()));

    conn.execute(
        "INSERT INTO images (id, doc, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        rusqlite::params![id.to_string(), encode(&params)?, now],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ImageDocument {
        id,
        params,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Get a record by ID.
pub fn get_image(conn: &Connection, id: RecordId) -> Result<Option<ImageDocument>> {
    let q = format!("SELECT {COLS} FROM images WHERE id = ?1");
    conn.query_row(&q, [id.to_string()], ImageDocument::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// List records, newest first.
pub fn list_images(conn: &Connection, offset: u32, limit: u32) -> Result<Vec<ImageDocument>> {
    let q = format!(
        "SELECT {COLS} FROM images ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([limit, offset], ImageDocument::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Count all records.
pub fn count_images(conn: &Connection) -> Result<u64> {
    conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get::<_, i64>(0))
        .map(|n| n.max(0) as u64)
        .map_err(|e| Error::database(e.to_string()))
}

/// Merge `patch` into the top level of the document.
///
/// A `null` value removes the field. Reserved fields are ignored.
pub fn update_params(
    conn: &Connection,
    id: RecordId,
    patch: Map<String, Value>,
) -> Result<ImageDocument> {
    mutate(conn, id, |params| {
        for (key, value) in patch {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            if value.is_null() {
                params.remove(&key);
            } else {
                params.insert(key, value);
            }
        }
        Ok(())
    })
}

/// Append `urls` to `imageUrls`. Existing entries are never overwritten.
pub fn push_urls(conn: &Connection, id: RecordId, urls: &[String]) -> Result<ImageDocument> {
    mutate(conn, id, |params| push_strings(params, IMAGE_URLS, urls))
}

/// Append `keys` to `imageKeys`.
pub fn push_keys(conn: &Connection, id: RecordId, keys: &[String]) -> Result<ImageDocument> {
    mutate(conn, id, |params| push_strings(params, IMAGE_KEYS, keys))
}

/// Remove the URL at `index` from `imageUrls`.
///
/// An out-of-range index leaves the document unchanged.
pub fn remove_url_at(conn: &Connection, id: RecordId, index: usize) -> Result<ImageDocument> {
    mutate(conn, id, |params| {
        if let Some(Value::Array(urls)) = params.get_mut(IMAGE_URLS) {
            if index < urls.len() {
                urls.remove(index);
            }
        }
        Ok(())
    })
}

/// Remove the first occurrence of `key` from `imageKeys`.
///
/// Returns the updated document and the index the key was removed from,
/// or `None` when the key was not present.
pub fn remove_key(
    conn: &Connection,
    id: RecordId,
    key: &str,
) -> Result<(ImageDocument, Option<usize>)> {
    let mut removed = None;
    let doc = mutate(conn, id, |params| {
        if let Some(Value::Array(keys)) = params.get_mut(IMAGE_KEYS) {
            if let Some(idx) = keys.iter().position(|k| k.as_str() == Some(key)) {
                keys.remove(idx);
                removed = Some(idx);
            }
        }
        Ok(())
    })?;
    Ok((doc, removed))
}

/// Delete a record by ID.
pub fn delete_image(conn: &Connection, id: RecordId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM images WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn push_strings(params: &mut Map<String, Value>, field: &str, values: &[String]) -> Result<()> {
    let entry = params
        .entry(field)
        .or_insert_with(|| Value::Array(Vec::new()));
    if entry.is_null() {
        *entry = Value::Array(Vec::new());
    }
    match entry {
        Value::Array(items) => {
            items.extend(values.iter().cloned().map(Value::String));
            Ok(())
        }
        _ => Err(Error::Validation(format!("{field} is not an array"))),
    }
}

/// Read-modify-write one document under the SQLite write lock.
fn mutate<F>(conn: &Connection, id: RecordId, f: F) -> Result<ImageDocument>
where
    F: FnOnce(&mut Map<String, Value>) -> Result<()>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| Error::database(e.to_string()))?;

    let q = format!("SELECT {COLS} FROM images WHERE id = ?1");
    let mut doc = tx
        .query_row(&q, [id.to_string()], ImageDocument::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))?
        .ok_or_else(|| Error::not_found("image", id))?;

    f(&mut doc.params)?;
    doc.updated_at = Utc::now().to_rfc3339();

    tx.execute(
        "UPDATE images SET doc = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![encode(&doc.params)?, doc.updated_at, id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(doc)
}
