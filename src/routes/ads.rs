//! Ad routes - browse, detail, create, and the favorite/question actions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{ServerError, ServerResult};
use crate::extractors::RequireUser;
use crate::models::{Ad, ActionConfirmation, AskQuestionRequest, Category, CreateAdRequest};
use crate::state::AppState;
use crate::validation::{self, MAX_TITLE_LEN};

/// GET / and GET /ads - List all ads
pub async fn list_ads(State(state): State<AppState>) -> ServerResult<Json<Vec<Ad>>> {
    let ads = state.db().list_ads()?;
    Ok(Json(ads))
}

/// GET /ad/new - Categories available for a new ad (auth required)
pub async fn new_ad_form(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
) -> ServerResult<Json<Vec<Category>>> {
    let categories = state.db().list_categories()?;
    Ok(Json(categories))
}

/// POST /ad/new - Create an ad owned by the current user (auth required)
pub async fn create_ad(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<CreateAdRequest>,
) -> ServerResult<(StatusCode, Json<Ad>)> {
    validation::required_text("title", &req.title, MAX_TITLE_LEN)?;
    validation::required("description", &req.description)?;
    // No price constraint: negative and zero prices pass through unchanged.

    let ad = state.db().create_ad(
        &req.title,
        &req.description,
        req.price,
        user.id,
        req.category_id,
    )?;

    tracing::info!(ad_id = ad.id, user_id = user.id, "ad created");
    Ok((StatusCode::CREATED, Json(ad)))
}

/// GET /ad/{id} - Ad detail
pub async fn get_ad(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServerResult<Json<Ad>> {
    let ad = state
        .db()
        .get_ad(id)?
        .ok_or_else(|| ServerError::NotFound(format!("Ad {} not found", id)))?;
    Ok(Json(ad))
}

/// POST /ad/{id}/favorite - Favorite an ad (auth required)
///
/// Stub endpoint: looks up the ad (404 when absent) and confirms, but writes
/// nothing. There is no favorites table.
pub async fn favorite_ad(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
) -> ServerResult<Json<ActionConfirmation>> {
    let ad = state
        .db()
        .get_ad(id)?
        .ok_or_else(|| ServerError::NotFound(format!("Ad {} not found", id)))?;

    tracing::debug!(ad_id = ad.id, user_id = user.id, "favorite requested (not persisted)");
    Ok(Json(ActionConfirmation {
        message: "Ad added to favorites!".to_string(),
        ad_id: ad.id,
    }))
}

/// POST /ad/{id}/question - Ask the seller a question (auth required)
///
/// Stub endpoint: accepts the question text but writes nothing.
pub async fn ask_question(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
    body: Option<Json<AskQuestionRequest>>,
) -> ServerResult<Json<ActionConfirmation>> {
    let ad = state
        .db()
        .get_ad(id)?
        .ok_or_else(|| ServerError::NotFound(format!("Ad {} not found", id)))?;

    let question = body.and_then(|Json(req)| req.question);
    tracing::debug!(
        ad_id = ad.id,
        user_id = user.id,
        question = question.as_deref().unwrap_or(""),
        "question submitted (not persisted)"
    );

    Ok(Json(ActionConfirmation {
        message: "Question submitted!".to_string(),
        ad_id: ad.id,
    }))
}
