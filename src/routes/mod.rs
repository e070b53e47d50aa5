//! Route handlers for the adboard server
//!
//! Organized by resource type:
//! - auth: registration, login/logout, profile
//! - ads: listing browse/detail/create plus the favorite/question actions
//! - categories: category list/create and per-category browsing
//! - health: health check endpoint

pub mod ads;
pub mod auth;
pub mod categories;
pub mod health;

pub use ads::*;
pub use auth::*;
pub use categories::*;
pub use health::*;
