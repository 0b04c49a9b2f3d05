//! Helpers for schemaless JSON documents.
//!
//! Image records are stored as free-form JSON objects. Older writers and
//! hand-edited documents do not always hold arrays where arrays are expected,
//! so readers go through these helpers instead of indexing `Value`s directly.

use serde_json::Value;

/// Field holding the provider object keys of a record.
pub const IMAGE_KEYS: &str = "imageKeys";

/// Field holding the public URLs of a record, index-aligned with [`IMAGE_KEYS`].
pub const IMAGE_URLS: &str = "imageUrls";

/// Legacy single-image field, folded into [`IMAGE_URLS`] by the store migrations.
pub const LEGACY_IMAGE_URL: &str = "imageUrl";

/// JSON truthiness: `null`, `false`, `0`, `""` and absent values are falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Read an array of strings, treating anything that is not an array as empty.
///
/// Non-string array elements are skipped.
pub fn string_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}
