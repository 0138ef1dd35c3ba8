use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use tournament_server_app::domain::user::Role;

use crate::{AppState, auth::TOKEN_COOKIE, jwt::SESSION_TTL_DAYS};

const FAILURE_PATH: &str = "/auth/failure";

#[derive(serde::Deserialize)]
pub struct StartSignInQuery {
    state: Option<String>,
    role: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SignInState {
    role: Option<String>,
}

/// Redirects to the provider. The requested role travels through the OAuth
/// `state` parameter, either passed through as JSON or built from `role`.
pub async fn start_sign_in(
    State(state): State<AppState>,
    Query(query): Query<StartSignInQuery>,
) -> Redirect {
    let oauth_state = match (query.state, query.role) {
        (Some(raw), _) => Some(raw),
        (None, Some(role)) => serde_json::to_string(&SignInState { role: Some(role) }).ok(),
        (None, None) => None,
    };
    Redirect::to(
        &state
            .app
            .sign_in_use_case
            .authorization_url(oauth_state.as_deref()),
    )
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> impl IntoResponse {
    let Some(code) = query.code else {
        log::warn!(
            "OAuth callback without code: {}",
            query.error.as_deref().unwrap_or("no error given")
        );
        return (jar, Redirect::to(FAILURE_PATH));
    };

    let role_hint = role_from_state(query.state.as_deref());
    match state.app.sign_in_use_case.sign_in(&code, role_hint).await {
        Ok(signed_in) => {
            let cookie = Cookie::build((TOKEN_COOKIE, signed_in.token.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(state.config.production)
                .max_age(time::Duration::days(SESSION_TTL_DAYS));
            let target = format!(
                "{}/auth?token={}",
                state.config.frontend_url, signed_in.token
            );
            (jar.add(cookie), Redirect::to(&target))
        }
        Err(e) => {
            log::warn!("Google sign-in failed: {}", e);
            (jar, Redirect::to(FAILURE_PATH))
        }
    }
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    (
        jar,
        Json(serde_json::json!({
            "success": true,
            "message": "Logged out successfully",
        })),
    )
}

pub async fn failure() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "success": false,
            "message": "Google authentication failed",
        })),
    )
}

/// Unknown or malformed roles fall back to the default role.
fn role_from_state(state: Option<&str>) -> Option<Role> {
    let state: SignInState = serde_json::from_str(state?).ok()?;
    state.role.as_deref().and_then(Role::parse)
}
