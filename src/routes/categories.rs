//! Category routes - list, create, per-category browsing

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{ServerError, ServerResult};
use crate::extractors::RequireUser;
use crate::models::{Ad, Category, CreateCategoryRequest};
use crate::state::AppState;
use crate::validation::{self, MAX_CATEGORY_NAME_LEN};

/// GET /categories - List all categories
pub async fn list_categories(State(state): State<AppState>) -> ServerResult<Json<Vec<Category>>> {
    let categories = state.db().list_categories()?;
    Ok(Json(categories))
}

/// POST /categories - Create a category (auth required)
pub async fn create_category(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<CreateCategoryRequest>,
) -> ServerResult<(StatusCode, Json<Category>)> {
    validation::required_text("name", &req.name, MAX_CATEGORY_NAME_LEN)?;

    let category = state.db().create_category(&req.name)?;
    tracing::info!(category_id = category.id, user_id = user.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /categories/{id}/ads - Ads within a category
pub async fn list_category_ads(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServerResult<Json<Vec<Ad>>> {
    state
        .db()
        .get_category(id)?
        .ok_or_else(|| ServerError::NotFound(format!("Category {} not found", id)))?;

    let ads = state.db().list_ads_by_category(id)?;
    Ok(Json(ads))
}
