//! The upload provider capability and the types shared by its operations.

use std::path::PathBuf;

use async_trait::async_trait;
use iv_core::Result;
use iv_db::models::ImageDocument;
use serde::Serialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A file received by an admin action and staged on local disk.
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// Location of the staged bytes.
    pub path: PathBuf,
    /// Name supplied by the client.
    pub filename: String,
    /// MIME type supplied by the client.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
}

/// The admin action a provider call runs inside of.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    /// The record being acted on, when the action has one.
    pub record: Option<ImageDocument>,
}

impl ActionContext {
    pub fn for_record(record: ImageDocument) -> Self {
        Self {
            record: Some(record),
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Outcome of the record write that follows a confirmed provider call.
///
/// The provider call and the record write are two separate commits; this
/// reports what happened on the second one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSync {
    /// The record was updated.
    Synced,
    /// No record write was needed (no record in context, or key not found).
    Skipped,
    /// The record write failed after the provider call succeeded.
    Failed,
}

impl RecordSync {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Result of an upload or delete call.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderResult {
    pub public_id: String,
    pub secure_url: Option<String>,
    pub url: Option<String>,
    /// Body returned by the provider, unmodified.
    pub raw: Value,
    pub sync: RecordSync,
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A remote object store for image files.
#[async_trait]
pub trait UploadProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"cloudinary"`).
    fn name(&self) -> &'static str;

    /// Store `file` under `key`.
    ///
    /// Provider failures are returned unchanged and leave the record store
    /// untouched.
    async fn upload(
        &self,
        file: &StagedFile,
        key: &str,
        context: &ActionContext,
    ) -> Result<ProviderResult>;

    /// Remove the object stored under `key`. `bucket` is a hint some
    /// providers ignore.
    async fn delete(&self, key: &str, bucket: &str, context: &ActionContext)
        -> Result<ProviderResult>;

    /// Public delivery URL for `key`. Makes no network call.
    fn path(&self, key: &str) -> String;
}
