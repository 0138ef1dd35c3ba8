use axum::{
    RequestPartsExt,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    extract::CookieJar,
    headers::{Authorization, authorization::Bearer},
};
use tournament_server_app::ports::session::SessionClaims;

use crate::{AppState, ServiceError};

pub const TOKEN_COOKIE: &str = "token";

/// Claims of an authenticated HTTP request. The token comes from the
/// `token` cookie or an `Authorization: Bearer` header.
pub struct Auth(pub SessionClaims);

/// Like [`Auth`], but also accepts a `?token=` query parameter since
/// browsers cannot set headers on a WebSocket handshake.
pub struct WsAuth(pub SessionClaims);

#[derive(serde::Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<AppState> for Auth {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_token(parts, false).await;
        authenticate(state, token).map(Auth)
    }
}

impl FromRequestParts<AppState> for WsAuth {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_token(parts, true).await;
        authenticate(state, token).map(WsAuth)
    }
}

async fn presented_token(parts: &mut Parts, allow_query: bool) -> Option<String> {
    if allow_query
        && let Ok(Query(TokenQuery { token: Some(token) })) =
            Query::<TokenQuery>::try_from_uri(&parts.uri)
        && !token.is_empty()
    {
        return Some(token);
    }

    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_string());
    }

    parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .ok()
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string())
}

fn authenticate(state: &AppState, token: Option<String>) -> Result<SessionClaims, ServiceError> {
    let token = token.ok_or_else(|| {
        ServiceError::Unauthorized("Unauthorized: No token provided".to_string())
    })?;
    state
        .app
        .authenticate_use_case
        .authenticate(&token)
        .map_err(|_| ServiceError::Forbidden("Forbidden: Invalid token".to_string()))
}
