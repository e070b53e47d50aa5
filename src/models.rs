//! Request and response models for the adboard server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder avatar assigned to every new account
pub const DEFAULT_IMAGE: &str = "default.jpg";

// ============================================================================
// Users
// ============================================================================

/// A registered account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub image_file: String,
    /// PHC-format argon2 hash; never serialized in responses
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Current user with their listings, for the profile view
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: User,
    pub ads: Vec<Ad>,
}

// ============================================================================
// Categories
// ============================================================================

/// A listing category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

// ============================================================================
// Ads
// ============================================================================

/// A single marketplace listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ad {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub date_posted: DateTime<Utc>,
    pub user_id: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskQuestionRequest {
    pub question: Option<String>,
}

/// Confirmation payload for actions that don't return an entity
#[derive(Debug, Clone, Serialize)]
pub struct ActionConfirmation {
    pub message: String,
    pub ad_id: i64,
}

// ============================================================================
// Sessions
// ============================================================================

/// A server-side login session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: DatabaseHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub path: String,
    pub size_bytes: Option<u64>,
}
