//! adboard: a classifieds board HTTP server
//!
//! Accounts, categories, and ad listings over a SQLite store, with
//! session-cookie authentication. Users register and log in, post ads with a
//! title/price/category, and browse listings; everything is insert-only (no
//! entity is ever updated or deleted after creation).

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;
pub mod validation;

pub use db::Database;
pub use error::{ServerError, ServerResult};
pub use server::{create_router, run_server, ServerArgs};
pub use state::AppState;
