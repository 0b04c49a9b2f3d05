//! Cloudinary upload API client.
//!
//! Covers the two calls the adapter needs (signed upload and destroy) plus
//! delivery URL construction. Requests are signed with SHA-256 over the
//! sorted parameter string followed by the API secret.

use std::time::Duration;

use iv_core::config::CloudinaryConfig;
use iv_core::{Error, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::provider::StagedFile;

const PROVIDER: &str = "cloudinary";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct CloudinaryClient {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

/// Fields of an upload response the adapter reads. `raw` holds the full body.
#[derive(Debug, Clone)]
pub struct UploadResponse {
    pub public_id: String,
    pub secure_url: String,
    pub url: Option<String>,
    pub raw: Value,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{action}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Sign `params` as `k1=v1&k2=v2...` (sorted by key) + secret.
    pub fn sign(&self, params: &[(&str, String)]) -> String {
        sign_params(params, &self.config.api_secret)
    }

    /// Signed parameter set common to every call.
    fn signed(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("timestamp", chrono::Utc::now().timestamp().to_string()));
        let signature = self.sign(&params);
        params.push(("api_key", self.config.api_key.clone()));
        params.push(("signature", signature));
        params.push(("signature_algorithm", "sha256".into()));
        params
    }

    // -----------------------------------------------------------------------
    // Upload / destroy
    // -----------------------------------------------------------------------

    /// Upload a staged image with `public_id` as its key.
    pub async fn upload(&self, file: &StagedFile, public_id: &str) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(&file.path).await?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file.filename.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| Error::Validation(format!("invalid mime type {}: {e}", file.mime_type)))?;

        let mut form = reqwest::multipart::Form::new().part("file", part);
        for (name, value) in self.signed(vec![("public_id", public_id.to_string())]) {
            form = form.text(name, value);
        }

        let resp = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("upload request failed: {e}")))?;
        let raw = read_body(resp).await?;

        let secure_url = raw
            .get("secure_url")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::provider(PROVIDER, "upload response has no secure_url"))?
            .to_string();
        let public_id = raw
            .get("public_id")
            .and_then(Value::as_str)
            .unwrap_or(public_id)
            .to_string();
        let url = raw.get("url").and_then(Value::as_str).map(String::from);

        Ok(UploadResponse {
            public_id,
            secure_url,
            url,
            raw,
        })
    }

    /// Delete the image stored under `public_id`.
    ///
    /// `{"result": "not found"}` counts as success.
    pub async fn destroy(&self, public_id: &str) -> Result<Value> {
        let params = self.signed(vec![("public_id", public_id.to_string())]);

        let resp = self
            .http
            .post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("destroy request failed: {e}")))?;
        let raw = read_body(resp).await?;

        match raw.get("result").and_then(Value::as_str) {
            Some("ok") | Some("not found") => Ok(raw),
            Some(other) => Err(Error::provider(
                PROVIDER,
                format!("destroy of {public_id} returned {other}"),
            )),
            None => Err(Error::provider(PROVIDER, "destroy response has no result")),
        }
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Delivery URL for an image key.
    pub fn url(&self, public_id: &str) -> String {
        let scheme = if self.config.secure { "https" } else { "http" };
        format!(
            "{scheme}://{}/{}/image/upload/{}",
            self.config.delivery_host.trim_end_matches('/'),
            self.config.cloud_name,
            public_id.trim_start_matches('/')
        )
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sign_params(params: &[(&str, String)], secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Decode a JSON response, turning Cloudinary error bodies and non-2xx
/// statuses into [`Error::Provider`].
async fn read_body(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| Error::provider(PROVIDER, format!("failed to read response: {e}")))?;
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

    if let Some(message) = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        return Err(Error::provider(PROVIDER, message));
    }
    if !status.is_success() {
        return Err(Error::provider(PROVIDER, format!("HTTP {status}: {text}")));
    }
    if body.is_null() {
        return Err(Error::provider(PROVIDER, "response is not JSON"));
    }
    Ok(body)
}
