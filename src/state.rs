//! Application state shared across handlers

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::db::Database;

/// Shared application state, constructed once at startup and passed into the
/// router. There are no ambient globals; everything handlers need hangs off
/// this handle.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: Database,
    started_at: Instant,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db,
                started_at: Instant::now(),
            }),
        }
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}
