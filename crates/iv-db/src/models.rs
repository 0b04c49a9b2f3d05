//! Rust structs mapping to database tables.

use iv_core::document::{self, IMAGE_KEYS, IMAGE_URLS};
use iv_core::RecordId;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

/// Parse the `doc` column into a JSON object.
///
/// A document that is valid JSON but not an object is treated as empty;
/// unparseable text is a conversion error.
fn parse_doc(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Map<String, Value>> {
    let raw: String = row.get(idx)?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(match value {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

// ---------------------------------------------------------------------------
// ImageDocument
// ---------------------------------------------------------------------------

/// One stored Image record.
///
/// `params` is the raw document exactly as persisted; it may hold fields
/// other than `imageKeys` / `imageUrls`, and those two may not be arrays if
/// an older writer stored them differently.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDocument {
    pub id: RecordId,
    pub params: Map<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl ImageDocument {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            params: parse_doc(row, 1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }

    /// Stored URLs; empty when the field is absent or not an array.
    pub fn image_urls(&self) -> Vec<String> {
        document::string_array(self.params.get(IMAGE_URLS))
    }

    /// Stored provider keys; empty when the field is absent or not an array.
    pub fn image_keys(&self) -> Vec<String> {
        document::string_array(self.params.get(IMAGE_KEYS))
    }
}
