//! Account routes - registration, login, logout, profile

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth;
use crate::error::{ServerError, ServerResult};
use crate::extractors::{session_token, OptionalUser, RequireUser, SESSION_COOKIE};
use crate::models::{LoginRequest, Profile, RegisterRequest, User};
use crate::state::AppState;
use crate::validation::{self, MAX_USERNAME_LEN};

/// POST /register - Create a new account
///
/// Already-authenticated callers are handed back their own account without
/// creating anything, mirroring the redirect-home behavior of a logged-in
/// user visiting the registration form.
pub async fn register(
    State(state): State<AppState>,
    OptionalUser(current): OptionalUser,
    Json(req): Json<RegisterRequest>,
) -> ServerResult<(StatusCode, Json<User>)> {
    if let Some(user) = current {
        return Ok((StatusCode::OK, Json(user)));
    }

    validation::required_text("username", &req.username, MAX_USERNAME_LEN)?;
    validation::valid_email(&req.email)?;
    validation::required("password", &req.password)?;

    let password_hash = auth::hash_password(&req.password)?;
    let user = state
        .db()
        .create_user(&req.username, &req.email, &password_hash)?;

    tracing::info!(user_id = user.id, username = %user.username, "account created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /login - Verify credentials and start a session
///
/// Already-authenticated callers keep their existing session: the current
/// user is returned and no new session or cookie is issued.
pub async fn login(
    State(state): State<AppState>,
    OptionalUser(current): OptionalUser,
    Json(req): Json<LoginRequest>,
) -> ServerResult<Response> {
    if let Some(user) = current {
        return Ok(Json(user).into_response());
    }

    let user = match state.db().find_user_by_email(&req.email)? {
        Some(user) if auth::verify_password(&req.password, &user.password_hash) => user,
        // Same response for unknown email and wrong password
        _ => {
            return Err(ServerError::Unauthorized(
                "Invalid email or password".to_string(),
            ))
        }
    };

    let session = state.db().create_session(user.id)?;
    tracing::info!(user_id = user.id, "login");

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session.token
    );
    Ok(([(header::SET_COOKIE, cookie)], Json(user)).into_response())
}

/// POST /logout - End the current session, if any
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ServerResult<Response> {
    if let Some(token) = session_token(&headers) {
        state.db().delete_session(&token)?;
    }

    let cleared = format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE);
    Ok((
        [(header::SET_COOKIE, cleared)],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response())
}

/// GET /profile - Current user and their listings (auth required)
pub async fn profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> ServerResult<Json<Profile>> {
    let ads = state.db().list_ads_by_user(user.id)?;
    Ok(Json(Profile { user, ads }))
}
