//! Multipart payloads of the new/edit actions.
//!
//! Field conventions:
//! - `upload` / `upload.N`: files to attach.
//! - `removeKeys` / `removeKeys.N`: provider keys to detach (edit only).
//! - `imageKeys*` / `imageUrls*`: managed by the upload feature; ignored.
//! - anything else: stored verbatim as a string param.

use axum::extract::Multipart;
use iv_core::document::{IMAGE_KEYS, IMAGE_URLS};
use iv_core::{Error, Result};
use iv_upload::StagedFile;
use serde_json::{Map, Value};
use tempfile::TempDir;

const FILE_FIELD: &str = "upload";
const REMOVE_FIELD: &str = "removeKeys";

/// Parsed action form. Staged files live as long as this value.
pub struct ActionForm {
    pub params: Map<String, Value>,
    pub files: Vec<StagedFile>,
    pub remove_keys: Vec<String>,
    _staging: TempDir,
}

/// True for `name` and `name.<anything>`.
fn is_field(field: &str, name: &str) -> bool {
    field == name
        || field
            .strip_prefix(name)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn bad_form(e: impl std::fmt::Display) -> Error {
    Error::Validation(format!("invalid multipart body: {e}"))
}

impl ActionForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let staging = tempfile::Builder::new().prefix("imgvault-upload-").tempdir()?;
        let mut params = Map::new();
        let mut files = Vec::new();
        let mut remove_keys = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
            let name = field.name().unwrap_or_default().to_string();

            if is_field(&name, FILE_FIELD) {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_form)?;

                // Browsers submit an empty part when no file was picked.
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }

                let path = staging.path().join(format!("{}", files.len()));
                tokio::fs::write(&path, &bytes).await?;
                files.push(StagedFile {
                    path,
                    filename,
                    mime_type,
                    size: bytes.len() as u64,
                });
            } else if is_field(&name, REMOVE_FIELD) {
                let key = field.text().await.map_err(bad_form)?;
                if !key.is_empty() {
                    remove_keys.push(key);
                }
            } else if is_field(&name, IMAGE_KEYS) || is_field(&name, IMAGE_URLS) || name.is_empty() {
                continue;
            } else {
                let value = field.text().await.map_err(bad_form)?;
                params.insert(name, Value::String(value));
            }
        }

        Ok(Self {
            params,
            files,
            remove_keys,
            _staging: staging,
        })
    }
}
