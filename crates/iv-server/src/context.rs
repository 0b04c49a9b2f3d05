//! Shared application state for route handlers.

use std::sync::Arc;

use iv_core::config::Config;
use iv_db::pool::DbPool;
use iv_upload::{UploadFeature, UploadProvider};

use crate::hooks::ActionHooks;

/// State passed to every handler via Axum `State`.
#[derive(Clone)]
pub struct AppContext {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub uploads: UploadFeature,
    pub hooks: Arc<ActionHooks>,
}

impl AppContext {
    /// Wire the Image resource: upload feature over `provider`, and the
    /// standard after pipelines.
    pub fn new(db: DbPool, config: Config, provider: Arc<dyn UploadProvider>) -> Self {
        let uploads = UploadFeature::new(provider, db.clone(), config.upload.clone());
        Self {
            db,
            config: Arc::new(config),
            uploads,
            hooks: Arc::new(ActionHooks::image_resource()),
        }
    }
}
