use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use super::{passkey_matches, removal_cookie, session_cookie};
use crate::state::AppState;

const LOGIN_PAGE: &str = include_str!("../../assets/login.html");
const ERROR_SLOT: &str = "<!-- error -->";

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub passkey: String,
}

fn login_page(error: Option<&str>) -> Html<String> {
    let message = error
        .map(|e| format!("<p class=\"error\">{e}</p>"))
        .unwrap_or_default();
    Html(LOGIN_PAGE.replace(ERROR_SLOT, &message))
}

/// GET /login
pub async fn handle_login_page() -> Html<String> {
    login_page(None)
}

/// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if passkey_matches(&state.config, &form.passkey) {
        info!("Login succeeded");
        (jar.add(session_cookie()), Redirect::to("/")).into_response()
    } else {
        warn!("Rejected login attempt");
        (StatusCode::UNAUTHORIZED, login_page(Some("Invalid passkey"))).into_response()
    }
}

/// GET /logout
pub async fn handle_logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    (jar.remove(removal_cookie()), Redirect::to("/login"))
}
