//! Axum router construction.
//!
//! Everything except `/health` is mounted under the configured admin root
//! (default `/admin`).

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Upper bound on multipart bodies for new/edit actions.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Normalized mount point: leading `/`, no trailing `/`, `""` for the root.
pub fn mount_path(root_path: &str) -> String {
    let trimmed = root_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Always accessible.
    let public_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/api/session", get(routes::auth::session_status))
        .route("/api/image-urls", get(routes::image_urls::missing_id))
        .route("/api/image-urls/", get(routes::image_urls::missing_id))
        .route(
            "/api/image-urls/{id}",
            get(routes::image_urls::get_image_urls),
        );

    // Image resource actions, session required.
    let resource_routes = Router::new()
        .route(
            "/api/resources/Image/actions/list",
            get(routes::resources::list),
        )
        .route(
            "/api/resources/Image/actions/new",
            post(routes::resources::create),
        )
        .route(
            "/api/resources/Image/records/{id}",
            get(routes::resources::show),
        )
        .route(
            "/api/resources/image/records/{id}",
            get(routes::resources::show),
        )
        .route(
            "/api/resources/Image/records/{id}/show",
            get(routes::resources::show),
        )
        .route(
            "/api/resources/Image/records/{id}/edit",
            post(routes::resources::edit),
        )
        .route(
            "/api/resources/Image/records/{id}/delete",
            post(routes::resources::delete),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .route_layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    let admin = public_routes.merge(resource_routes);
    let mount = mount_path(&ctx.config.server.root_path);

    let app = Router::new().route("/health", get(routes::health::health_check));
    let app = if mount.is_empty() {
        app.merge(admin)
    } else {
        app.nest(&mount, admin)
    };

    app.layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use iv_core::config::Config;
    use iv_db::pool::{get_conn, init_memory_pool};
    use iv_upload::{CloudinaryClient, CloudinaryProvider};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app_with_root(root: &str) -> (Router, iv_db::pool::DbPool) {
        let mut config = Config::default();
        config.server.root_path = root.into();
        let db = init_memory_pool().unwrap();
        let client = CloudinaryClient::new(config.cloudinary.clone()).unwrap();
        let provider = Arc::new(CloudinaryProvider::new(client, db.clone()));
        let ctx = AppContext::new(db.clone(), config, provider);
        (build_router(ctx), db)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_is_unprefixed() {
        let (app, _) = app_with_root("/admin");
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn public_endpoint_under_custom_root() {
        let (app, db) = app_with_root("/panel/");
        let conn = get_conn(&db).unwrap();
        let doc = iv_db::queries::images::create_image(
            &conn,
            json!({"imageUrls": ["https://x/1"]}).as_object().cloned().unwrap(),
        )
        .unwrap();

        let (status, body) = get_json(app, &format!("/panel/api/image-urls/{}", doc.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"imageUrls": ["https://x/1"]}));
    }

    #[tokio::test]
    async fn resources_require_session() {
        let (app, _) = app_with_root("/admin");
        let (status, body) = get_json(app, "/admin/api/resources/Image/actions/list").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthorized");
        assert!(body["request_id"].is_string());
    }

    #[test]
    fn mount_path_normalization() {
        assert_eq!(mount_path("/admin"), "/admin");
        assert_eq!(mount_path("/admin/"), "/admin");
        assert_eq!(mount_path("admin"), "/admin");
        assert_eq!(mount_path("/"), "");
        assert_eq!(mount_path(""), "");
        assert_eq!(mount_path("/a/b/"), "/a/b");
    }
}
