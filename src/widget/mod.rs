//! Gallery widget: fetches a record's stored image URLs and renders them.
//!
//! [`ImageUrlsClient`] walks a fixed list of endpoints and takes the first
//! 2xx JSON answer. [`Gallery`] holds the widget state (urls, loading) and
//! [`render_gallery`] turns it into an HTML fragment.

mod client;
mod render;

pub use client::{extract_urls, ImageUrlsClient};
pub use render::render_gallery;

/// Errors raised while setting up the widget client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Widget state for one record.
pub struct Gallery {
    client: ImageUrlsClient,
    record_id: Option<String>,
    urls: Vec<String>,
    loading: bool,
}

impl Gallery {
    pub fn new(client: ImageUrlsClient, record_id: Option<String>) -> Self {
        Self {
            client,
            record_id: record_id.filter(|id| !id.is_empty()),
            urls: Vec::new(),
            loading: false,
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Re-fetch the URLs. A gallery without a record id does nothing.
    pub async fn refresh(&mut self) {
        let Some(id) = self.record_id.clone() else {
            return;
        };
        self.loading = true;
        self.urls = self.client.fetch(&id).await;
        self.loading = false;
    }

    pub fn render(&self) -> String {
        render_gallery(&self.urls, self.loading)
    }
}
