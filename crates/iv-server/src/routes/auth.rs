//! Authentication route handlers: login, logout, session status.

use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::session_from_jar;
use crate::router::mount_path;
use crate::session::{self, Session};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub email: String,
    /// Unix seconds.
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Path the session cookie is scoped to.
fn cookie_path(ctx: &AppContext) -> String {
    let mount = mount_path(&ctx.config.server.root_path);
    if mount.is_empty() {
        "/".into()
    } else {
        mount
    }
}

/// POST /{root}/login
pub async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let auth = &ctx.config.auth;

    if payload.email != auth.email || payload.password != auth.password {
        tracing::info!(email = %payload.email, "Rejected admin login");
        return Err(iv_core::Error::Unauthorized("Invalid credentials".into()).into());
    }

    let session = Session::new(&auth.email, auth.session_timeout_hours);
    let cookie = Cookie::build((auth.cookie_name.clone(), session.encode(&auth.cookie_secret)))
        .path(cookie_path(&ctx))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(ctx.config.server.mode.is_production())
        .max_age(time::Duration::seconds(session::ttl_secs(
            auth.session_timeout_hours,
        )))
        .build();

    tracing::info!(email = %session.email, "Admin logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            email: session.email,
            expires_at: session.expires_at,
        }),
    ))
}

/// POST /{root}/logout
pub async fn logout(State(ctx): State<AppContext>, jar: CookieJar) -> CookieJar {
    let removal = Cookie::build((ctx.config.auth.cookie_name.clone(), ""))
        .path(cookie_path(&ctx))
        .build();
    jar.remove(removal)
}

/// GET /{root}/api/session
pub async fn session_status(State(ctx): State<AppContext>, jar: CookieJar) -> Json<SessionResponse> {
    match session_from_jar(&ctx, &jar) {
        Some(session) => Json(SessionResponse {
            authenticated: true,
            email: Some(session.email),
            expires_at: Some(session.expires_at),
        }),
        None => Json(SessionResponse {
            authenticated: false,
            email: None,
            expires_at: None,
        }),
    }
}
