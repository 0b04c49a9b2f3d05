//! Shared test harness for integration tests.
//!
//! [`TestHarness`] starts a wiremock server standing in for the Cloudinary
//! API, builds an [`AppContext`] on an in-memory database and serves the full
//! router on a random port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use iv_core::config::Config;
use iv_db::models::ImageDocument;
use iv_db::pool::{init_memory_pool, DbPool};
use iv_server::context::AppContext;
use iv_server::router::build_router;
use iv_upload::{CloudinaryClient, CloudinaryProvider, UploadProvider};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "admin";
pub const CLOUD: &str = "demo";

/// A running server plus the mocked provider behind it.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub addr: SocketAddr,
    pub cloudinary: MockServer,
}

impl TestHarness {
    /// Start a server with default configuration.
    pub async fn start() -> Self {
        Self::start_with(Config::default()).await
    }

    /// Start a server with `config`; Cloudinary settings are pointed at the
    /// mock server.
    pub async fn start_with(mut config: Config) -> Self {
        let cloudinary = MockServer::start().await;
        config.cloudinary.cloud_name = CLOUD.into();
        config.cloudinary.api_key = "key".into();
        config.cloudinary.api_secret = "secret".into();
        config.cloudinary.api_base_url = cloudinary.uri();
        config.auth.email = EMAIL.into();
        config.auth.password = PASSWORD.into();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let client =
            CloudinaryClient::new(config.cloudinary.clone()).expect("failed to build client");
        let provider: Arc<dyn UploadProvider> =
            Arc::new(CloudinaryProvider::new(client, db.clone()));
        let ctx = AppContext::new(db.clone(), config, provider);
        let app = build_router(ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            ctx,
            db,
            addr,
            cloudinary,
        }
    }

    /// Absolute URL for `path` on the running server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Origin of the running server, for the widget client.
    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> iv_db::pool::PooledConnection {
        iv_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Insert a record directly into the store.
    pub fn create_image(&self, params: Value) -> ImageDocument {
        let params = params.as_object().cloned().expect("params must be an object");
        iv_db::queries::images::create_image(&self.conn(), params).expect("failed to create image")
    }

    /// Fetch a record straight from the store.
    pub fn image(&self, doc: &ImageDocument) -> Option<ImageDocument> {
        iv_db::queries::images::get_image(&self.conn(), doc.id).expect("failed to load image")
    }

    /// Log in as the configured admin and return the `name=value` cookie pair.
    pub async fn login(&self) -> String {
        let resp = reqwest::Client::new()
            .post(self.url("/admin/login"))
            .json(&json!({ "email": EMAIL, "password": PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        set_cookie_pair(&resp).expect("login did not set a cookie")
    }

    /// Answer uploads whose key contains `stem` with `secure_url`.
    pub async fn mock_upload(&self, stem: &str, secure_url: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/v1_1/{CLOUD}/image/upload")))
            .and(body_string_contains(format!("-{stem}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secure_url": secure_url,
                "url": secure_url.replacen("https://", "http://", 1),
            })))
            .mount(&self.cloudinary)
            .await;
    }

    /// Answer every destroy call with `{"result": "ok"}`, expecting `times` calls.
    pub async fn mock_destroy(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path(format!("/v1_1/{CLOUD}/image/destroy")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
            .expect(times)
            .mount(&self.cloudinary)
            .await;
    }
}

/// `name=value` from the first `Set-Cookie` header of `resp`.
pub fn set_cookie_pair(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
}

/// Multipart form holding one PNG under the `upload` field.
pub fn png_part(filename: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(b"fake png".to_vec())
        .file_name(filename.to_string())
        .mime_str("image/png")
        .unwrap()
}
