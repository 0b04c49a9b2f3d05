//! Admin session authentication.
//!
//! Protected routes require a valid signed session cookie (see
//! [`crate::session`]). The resolved [`Session`] is inserted into request
//! extensions for downstream handlers.

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;
use crate::session::Session;

/// Resolve the session from the configured cookie, if any.
pub fn session_from_jar(ctx: &AppContext, jar: &CookieJar) -> Option<Session> {
    let auth = &ctx.config.auth;
    let cookie = jar.get(&auth.cookie_name)?;
    Session::decode(cookie.value(), &auth.cookie_secret)
}

pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match session_from_jar(&ctx, &jar) {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "Rejected request without valid session");
            let mut err = AppError::new(iv_core::Error::Unauthorized(
                "Authentication required".into(),
            ));
            if let Some(RequestId(id)) = request.extensions().get::<RequestId>() {
                err = err.with_request_id(id.clone());
            }
            err.into_response()
        }
    }
}
