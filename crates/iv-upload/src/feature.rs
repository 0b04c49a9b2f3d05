//! Upload feature: file validation, key generation and `imageKeys` bookkeeping.
//!
//! The provider owns `imageUrls`; this feature owns `imageKeys`. A key is
//! recorded only after its URL was recorded, and removed only when the URL
//! removal did not fail, so the two arrays stay the same length.

use std::path::Path;
use std::sync::Arc;

use iv_core::config::UploadConfig;
use iv_core::{Error, RecordId, Result};
use iv_db::models::ImageDocument;
use iv_db::pool::{get_conn, DbPool};
use iv_db::queries;

use crate::provider::{ActionContext, ProviderResult, RecordSync, StagedFile, UploadProvider};

#[derive(Clone)]
pub struct UploadFeature {
    provider: Arc<dyn UploadProvider>,
    pool: DbPool,
    config: UploadConfig,
}

impl UploadFeature {
    pub fn new(provider: Arc<dyn UploadProvider>, pool: DbPool, config: UploadConfig) -> Self {
        Self {
            provider,
            pool,
            config,
        }
    }

    pub fn provider(&self) -> &dyn UploadProvider {
        self.provider.as_ref()
    }

    /// Reject files whose MIME type is not in the allow list.
    pub fn validate(&self, file: &StagedFile) -> Result<()> {
        let allowed = self
            .config
            .allowed_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&file.mime_type));
        if allowed {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "{}: unsupported mime type {} (allowed: {})",
                file.filename,
                file.mime_type,
                self.config.allowed_mime_types.join(", ")
            )))
        }
    }

    /// Object key for an uploaded file: `<folder>/<unix_millis>-<stem>`.
    ///
    /// The extension is dropped; the provider appends its own.
    pub fn build_key(&self, filename: &str, unix_millis: i64) -> String {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("upload");
        let folder = self.config.folder.trim_matches('/');
        if folder.is_empty() {
            format!("{unix_millis}-{stem}")
        } else {
            format!("{folder}/{unix_millis}-{stem}")
        }
    }

    /// Upload `files` onto the record, one at a time, in order.
    ///
    /// Every file is validated before the first upload. The first provider
    /// failure aborts the remaining files; files already uploaded stay
    /// recorded.
    pub async fn attach(&self, record_id: RecordId, files: &[StagedFile]) -> Result<ImageDocument> {
        for file in files {
            self.validate(file)?;
        }

        let mut record = self.load(record_id)?;
        for file in files {
            let key = self.build_key(&file.filename, chrono::Utc::now().timestamp_millis());
            let context = ActionContext::for_record(record.clone());
            let result = self.provider.upload(file, &key, &context).await?;

            if result.sync != RecordSync::Synced {
                tracing::warn!(
                    phase = "record",
                    record_id = %record_id,
                    key = %key,
                    sync = result.sync.as_str(),
                    "Image url not recorded; key not recorded either"
                );
                continue;
            }

            let conn = get_conn(&self.pool)?;
            record = queries::images::push_keys(&conn, record_id, std::slice::from_ref(&key))?;
            tracing::info!(record_id = %record_id, key = %key, "Image attached");
        }

        Ok(record)
    }

    /// Delete `key` from the provider and drop it from the record.
    pub async fn detach(&self, record: &ImageDocument, key: &str) -> Result<ProviderResult> {
        let context = ActionContext::for_record(record.clone());
        let result = self
            .provider
            .delete(key, &self.config.bucket, &context)
            .await?;

        if result.sync == RecordSync::Failed {
            tracing::warn!(
                phase = "record",
                record_id = %record.id,
                key,
                "Image url not removed; keeping key"
            );
            return Ok(result);
        }

        let conn = get_conn(&self.pool)?;
        let (_, removed) = queries::images::remove_key(&conn, record.id, key)?;
        tracing::info!(record_id = %record.id, key, removed = removed.is_some(), "Image detached");
        Ok(result)
    }

    /// Delete every provider object of a record that is about to be removed.
    ///
    /// The record itself is not updated.
    pub async fn purge(&self, record: &ImageDocument) -> Result<usize> {
        let keys = record.image_keys();
        let context = ActionContext::default();
        for key in &keys {
            self.provider
                .delete(key, &self.config.bucket, &context)
                .await?;
        }
        tracing::info!(record_id = %record.id, count = keys.len(), "Provider objects purged");
        Ok(keys.len())
    }

    fn load(&self, id: RecordId) -> Result<ImageDocument> {
        let conn = get_conn(&self.pool)?;
        queries::images::get_image(&conn, id)?.ok_or_else(|| Error::not_found("image", id))
    }
}
