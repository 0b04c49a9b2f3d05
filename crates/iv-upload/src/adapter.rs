//! Cloudinary-backed [`UploadProvider`] that keeps `imageUrls` in sync.
//!
//! Each operation is two commits: the remote call first, then the record
//! write. A failed remote call aborts before the store is touched. A failed
//! record write after a confirmed remote call is logged with `phase =
//! "record"` and reported through [`RecordSync::Failed`] rather than raised.

use async_trait::async_trait;
use iv_core::document::IMAGE_KEYS;
use iv_core::Result;
use iv_db::pool::{get_conn, DbPool};
use iv_db::queries;
use serde_json::Value;

use crate::cloudinary::CloudinaryClient;
use crate::provider::{ActionContext, ProviderResult, RecordSync, StagedFile, UploadProvider};
use crate::seed::seed_urls;

pub struct CloudinaryProvider {
    client: CloudinaryClient,
    pool: DbPool,
}

impl CloudinaryProvider {
    pub fn new(client: CloudinaryClient, pool: DbPool) -> Self {
        Self { client, pool }
    }

    /// Remove the URL paired with `key` on the context record.
    fn unlink_url(&self, key: &str, context: &ActionContext) -> RecordSync {
        let Some(record) = context.record.as_ref() else {
            return RecordSync::Skipped;
        };

        // Raw positions: imageUrls is index-aligned with the stored array,
        // including any non-string entries.
        let index = match record.params.get(IMAGE_KEYS) {
            Some(Value::Array(keys)) => keys.iter().position(|k| k.as_str() == Some(key)),
            _ => None,
        };
        let Some(index) = index else {
            tracing::debug!(record_id = %record.id, key, "Key not on record; leaving urls");
            return RecordSync::Skipped;
        };

        let result =
            get_conn(&self.pool).and_then(|conn| queries::images::remove_url_at(&conn, record.id, index));
        match result {
            Ok(_) => RecordSync::Synced,
            Err(e) => {
                tracing::warn!(
                    phase = "record",
                    record_id = %record.id,
                    key,
                    index,
                    error = %e,
                    "Failed to remove image url after provider delete"
                );
                RecordSync::Failed
            }
        }
    }
}

#[async_trait]
impl UploadProvider for CloudinaryProvider {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn upload(
        &self,
        file: &StagedFile,
        key: &str,
        context: &ActionContext,
    ) -> Result<ProviderResult> {
        let uploaded = self.client.upload(file, key).await.map_err(|e| {
            tracing::error!(phase = "provider", key, error = %e, "Cloudinary upload failed");
            e
        })?;
        tracing::info!(
            phase = "provider",
            public_id = %uploaded.public_id,
            secure_url = %uploaded.secure_url,
            "Cloudinary upload complete"
        );

        let record_id = context.record.as_ref().map(|r| r.id);
        let seeded = seed_urls(&self.pool, record_id, std::slice::from_ref(&uploaded.secure_url));
        let sync = match (record_id, seeded) {
            (None, _) => RecordSync::Skipped,
            (Some(_), Some(_)) => RecordSync::Synced,
            (Some(_), None) => RecordSync::Failed,
        };
        if sync == RecordSync::Failed {
            tracing::warn!(phase = "record", key, "Uploaded image url not recorded");
        }

        Ok(ProviderResult {
            public_id: uploaded.public_id,
            secure_url: Some(uploaded.secure_url),
            url: uploaded.url,
            raw: uploaded.raw,
            sync,
        })
    }

    async fn delete(
        &self,
        key: &str,
        bucket: &str,
        context: &ActionContext,
    ) -> Result<ProviderResult> {
        let raw = self.client.destroy(key).await.map_err(|e| {
            tracing::error!(phase = "provider", key, error = %e, "Cloudinary delete failed");
            e
        })?;
        tracing::info!(phase = "provider", key, bucket, result = %raw["result"], "Cloudinary delete complete");

        let sync = self.unlink_url(key, context);

        Ok(ProviderResult {
            public_id: key.to_string(),
            secure_url: None,
            url: None,
            raw,
            sync,
        })
    }

    fn path(&self, key: &str) -> String {
        self.client.url(key)
    }
}
