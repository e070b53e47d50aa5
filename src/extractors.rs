//! Session-cookie extractors
//!
//! Sessions live server-side (see the `sessions` table); the cookie carries
//! only an opaque token. `RequireUser` is the login-required gate: it rejects
//! with 401 instead of redirecting, which is the JSON analogue.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

use crate::error::ServerError;
use crate::models::User;
use crate::state::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Extract the session token from a request's Cookie header, if present
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// The authenticated user; rejects with 401 when the request carries no
/// valid session.
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| ServerError::Unauthorized("Login required".to_string()))?;

        let user = state
            .db()
            .resolve_session_user(&token)?
            .ok_or_else(|| ServerError::Unauthorized("Session expired or invalid".to_string()))?;

        Ok(Self(user))
    }
}

/// The authenticated user if the request carries a valid session, else None.
/// Never rejects.
pub struct OptionalUser(pub Option<User>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = match session_token(&parts.headers) {
            Some(token) => state.db().resolve_session_user(&token)?,
            None => None,
        };
        Ok(Self(user))
    }
}
