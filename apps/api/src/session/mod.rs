//! Passkey sessions.
//!
//! A successful login sets a signed `session` cookie. API clients may instead send the
//! passkey as a bearer token on every request.

pub mod handlers;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";
const SESSION_MARKER: &str = "authenticated";

/// Cookie signing key. Without a configured secret, sessions do not survive a restart.
pub fn cookie_key(config: &Config) -> Key {
    match &config.session_secret {
        Some(secret) => Key::derive_from(secret.as_bytes()),
        None => {
            warn!("SESSION_SECRET not set; using a random key, sessions end on restart");
            Key::generate()
        }
    }
}

pub fn session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, SESSION_MARKER))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

pub fn passkey_matches(config: &Config, candidate: &str) -> bool {
    !candidate.is_empty() && candidate == config.app_passkey
}

fn has_session(jar: &SignedCookieJar) -> bool {
    jar.get(SESSION_COOKIE)
        .is_some_and(|cookie| cookie.value() == SESSION_MARKER)
}

fn bearer_passkey(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Lets the request through when it carries a valid session cookie or bearer passkey.
///
/// Unauthenticated API calls get a 401 JSON error; page requests are sent to `/login`.
pub async fn require_session(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    request: Request,
    next: Next,
) -> Response {
    let authorized = has_session(&jar)
        || bearer_passkey(request.headers()).is_some_and(|key| passkey_matches(&state.config, key));
    if authorized {
        return next.run(request).await;
    }

    debug!("Unauthenticated request to {}", request.uri().path());
    if request.uri().path().starts_with("/api/") {
        AppError::Unauthorized.into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}
