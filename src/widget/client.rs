use std::time::Duration;

use iv_core::document::{is_truthy, IMAGE_URLS};
use serde_json::Value;

use super::Error;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the image-URL endpoints of an imgvault server.
#[derive(Clone)]
pub struct ImageUrlsClient {
    http: reqwest::Client,
    base_url: String,
    root: String,
    cookie: Option<String>,
}

impl ImageUrlsClient {
    /// `base_url` is the server origin (`http://localhost:3000`), `root_path`
    /// the admin mount point (`/admin`).
    pub fn new(base_url: &str, root_path: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        let root = root_path.trim().trim_matches('/');
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            root: if root.is_empty() {
                String::new()
            } else {
                format!("/{root}")
            },
            cookie: None,
        })
    }

    /// Send a `Cookie` header with every probe, for the session-protected
    /// resource endpoints.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Endpoints tried in order.
    pub fn probe_urls(&self, id: &str) -> Vec<String> {
        let base = format!("{}{}/api", self.base_url, self.root);
        vec![
            format!("{base}/image-urls/{id}"),
            format!("{base}/resources/Image/records/{id}"),
            format!("{base}/resources/image/records/{id}"),
        ]
    }

    /// Fetch the record's URLs; empty when every endpoint fails.
    pub async fn fetch(&self, id: &str) -> Vec<String> {
        for endpoint in self.probe_urls(id) {
            match self.try_endpoint(&endpoint).await {
                Some(urls) => return urls,
                None => continue,
            }
        }
        tracing::debug!(record_id = id, "No endpoint returned image urls");
        Vec::new()
    }

    async fn try_endpoint(&self, endpoint: &str) -> Option<Vec<String>> {
        let mut request = self
            .http
            .get(endpoint)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(cookie) = &self.cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "Image url fetch failed");
                return None;
            }
        };

        let status = resp.status();
        tracing::debug!(endpoint, status = %status, "Image url fetch");
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status = %status, body = %body, "Non-success response");
            return None;
        }

        match resp.json::<Value>().await {
            Ok(body) => Some(extract_urls(&body)),
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "Response is not JSON");
                None
            }
        }
    }
}

/// Pull the URL list out of either response shape.
///
/// Accepts `{"imageUrls": ...}` and `{"record": {"params": {"imageUrls": ...}}}`.
/// A scalar is wrapped into a one-element list; a falsy value yields nothing.
pub fn extract_urls(body: &Value) -> Vec<String> {
    let top = body.get(IMAGE_URLS);
    let record = body
        .get("record")
        .filter(|r| is_truthy(Some(*r)))
        .unwrap_or(body);
    let nested = record.get("params").and_then(|p| p.get(IMAGE_URLS));

    let found = if is_truthy(top) {
        top
    } else if is_truthy(nested) {
        nested
    } else {
        None
    };

    match found {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(other) => vec![other.to_string()],
        None => Vec::new(),
    }
}
