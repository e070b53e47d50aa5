//! SQLite persistence layer for adboard
//!
//! Uses rusqlite with automatic schema migrations on startup. Foreign keys
//! are enforced by SQLite itself (`PRAGMA foreign_keys = ON`), so every ad
//! must reference an existing user and category at creation time. Users,
//! categories, and ads are insert-only: no update or delete path exists.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::models::{Ad, Category, Session, User, DEFAULT_IMAGE};

/// Thread-safe database wrapper
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Database {
    /// Open or create the database at the given path
    pub fn open(path: impl Into<PathBuf>) -> ServerResult<Self> {
        let path = path.into();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        };

        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> ServerResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: PathBuf::from(":memory:"),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get the database file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Get database file size in bytes
    pub fn size_bytes(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }

    /// Run schema migrations
    fn run_migrations(&self) -> ServerResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(INDEXES)?;

        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Create an account. The password must already be hashed by the caller;
    /// this layer only stores opaque hash strings.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> ServerResult<User> {
        let conn = self.conn.lock().unwrap();

        // Check for duplicates up front for a precise message; the UNIQUE
        // constraints below remain the backstop.
        let username_taken: Option<i64> = conn
            .query_row("SELECT id FROM users WHERE username = ?", [username], |r| {
                r.get(0)
            })
            .optional()?;
        if username_taken.is_some() {
            return Err(ServerError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let email_taken: Option<i64> = conn
            .query_row("SELECT id FROM users WHERE email = ?", [email], |r| {
                r.get(0)
            })
            .optional()?;
        if email_taken.is_some() {
            return Err(ServerError::Conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        conn.execute(
            "INSERT INTO users (username, email, image_file, password_hash) VALUES (?, ?, ?, ?)",
            params![username, email, DEFAULT_IMAGE, password_hash],
        )
        .map_err(|e| conflict_on_constraint(e, "Username or email is already in use"))?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            image_file: DEFAULT_IMAGE.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    /// Exact-match lookup by email (SQLite default collation, case-sensitive)
    pub fn find_user_by_email(&self, email: &str) -> ServerResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                "SELECT id, username, email, image_file, password_hash FROM users WHERE email = ?",
                [email],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user(&self, id: i64) -> ServerResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                "SELECT id, username, email, image_file, password_hash FROM users WHERE id = ?",
                [id],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub fn create_category(&self, name: &str) -> ServerResult<Category> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO categories (name) VALUES (?)", [name])?;

        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn get_category(&self, id: i64) -> ServerResult<Option<Category>> {
        let conn = self.conn.lock().unwrap();
        let category = conn
            .query_row(
                "SELECT id, name FROM categories WHERE id = ?",
                [id],
                map_category,
            )
            .optional()?;
        Ok(category)
    }

    pub fn list_categories(&self) -> ServerResult<Vec<Category>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id ASC")?;

        let categories = stmt
            .query_map([], map_category)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    // ========================================================================
    // Ads
    // ========================================================================

    /// Create a listing owned by `author_id` in `category_id`. `date_posted`
    /// is set to the current UTC time.
    pub fn create_ad(
        &self,
        title: &str,
        description: &str,
        price: f64,
        author_id: i64,
        category_id: i64,
    ) -> ServerResult<Ad> {
        let conn = self.conn.lock().unwrap();

        // Precise messages for dangling references; the FK constraints
        // remain the backstop.
        let author_exists: Option<i64> = conn
            .query_row("SELECT id FROM users WHERE id = ?", [author_id], |r| {
                r.get(0)
            })
            .optional()?;
        if author_exists.is_none() {
            return Err(ServerError::Conflict(format!(
                "Author {} does not exist",
                author_id
            )));
        }

        let category_exists: Option<i64> = conn
            .query_row("SELECT id FROM categories WHERE id = ?", [category_id], |r| {
                r.get(0)
            })
            .optional()?;
        if category_exists.is_none() {
            return Err(ServerError::Conflict(format!(
                "Category {} does not exist",
                category_id
            )));
        }

        let now = Utc::now();

        conn.execute(
            "INSERT INTO ads (title, description, price, date_posted, user_id, category_id) \
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                title,
                description,
                price,
                format_datetime(now),
                author_id,
                category_id
            ],
        )
        .map_err(|e| conflict_on_constraint(e, "Ad references a missing user or category"))?;

        Ok(Ad {
            id: conn.last_insert_rowid(),
            title: title.to_string(),
            description: description.to_string(),
            price,
            date_posted: now,
            user_id: author_id,
            category_id,
        })
    }

    pub fn get_ad(&self, id: i64) -> ServerResult<Option<Ad>> {
        let conn = self.conn.lock().unwrap();
        let ad = conn
            .query_row(
                "SELECT id, title, description, price, date_posted, user_id, category_id \
                 FROM ads WHERE id = ?",
                [id],
                map_ad,
            )
            .optional()?;
        Ok(ad)
    }

    /// All ads in insertion order. Loads every row at once; there is no
    /// pagination, matching the insert-only data model.
    pub fn list_ads(&self) -> ServerResult<Vec<Ad>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, price, date_posted, user_id, category_id \
             FROM ads ORDER BY id ASC",
        )?;

        let ads = stmt.query_map([], map_ad)?.collect::<Result<Vec<_>, _>>()?;

        Ok(ads)
    }

    pub fn list_ads_by_user(&self, user_id: i64) -> ServerResult<Vec<Ad>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, price, date_posted, user_id, category_id \
             FROM ads WHERE user_id = ? ORDER BY id ASC",
        )?;

        let ads = stmt
            .query_map([user_id], map_ad)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ads)
    }

    pub fn list_ads_by_category(&self, category_id: i64) -> ServerResult<Vec<Ad>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, price, date_posted, user_id, category_id \
             FROM ads WHERE category_id = ? ORDER BY id ASC",
        )?;

        let ads = stmt
            .query_map([category_id], map_ad)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ads)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Issue a fresh session token for a logged-in user
    pub fn create_session(&self, user_id: i64) -> ServerResult<Session> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)",
            params![token, user_id, format_datetime(now)],
        )
        .map_err(|e| conflict_on_constraint(e, "Session references a missing user"))?;

        Ok(Session {
            token,
            user_id,
            created_at: now,
        })
    }

    /// Resolve a session token to its user, or None for unknown tokens
    pub fn resolve_session_user(&self, token: &str) -> ServerResult<Option<User>> {
        // Scoped so the lock is released before get_user re-acquires it
        let user_id: Option<i64> = {
            let conn = self.conn.lock().unwrap();
            conn.query_row(
                "SELECT user_id FROM sessions WHERE token = ?",
                [token],
                |r| r.get(0),
            )
            .optional()?
        };

        match user_id {
            Some(id) => self.get_user(id),
            None => Ok(None),
        }
    }

    /// Delete a session; returns false if the token was unknown
    pub fn delete_session(&self, token: &str) -> ServerResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute("DELETE FROM sessions WHERE token = ?", [token])?;
        Ok(rows_affected > 0)
    }
}

// ============================================================================
// Schema
// ============================================================================

const SCHEMA: &str = r#"
-- Accounts
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    image_file TEXT NOT NULL DEFAULT 'default.jpg',
    password_hash TEXT NOT NULL
);

-- Listing categories
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

-- Listings. FKs use SQLite's default RESTRICT behavior: a user or category
-- with ads cannot be deleted (no delete path is exposed anyway).
CREATE TABLE IF NOT EXISTS ads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    price REAL NOT NULL,
    date_posted TEXT NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id),
    category_id INTEGER NOT NULL REFERENCES categories(id)
);

-- Login sessions
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);
"#;

const INDEXES: &str = r#"
-- Indexes for relationship queries
CREATE INDEX IF NOT EXISTS idx_ads_user ON ads(user_id);
CREATE INDEX IF NOT EXISTS idx_ads_category ON ads(category_id);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
"#;

// ============================================================================
// Helpers
// ============================================================================

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        image_file: row.get(3)?,
        password_hash: row.get(4)?,
    })
}

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn map_ad(row: &Row<'_>) -> rusqlite::Result<Ad> {
    Ok(Ad {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        date_posted: parse_datetime(row.get::<_, String>(4)?),
        user_id: row.get(5)?,
        category_id: row.get(6)?,
    })
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn conflict_on_constraint(err: rusqlite::Error, message: &str) -> ServerError {
    if is_constraint_violation(&err) {
        ServerError::Conflict(message.to_string())
    } else {
        ServerError::Database(err)
    }
}
