//! Server setup - Axum router configuration and run loop

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::db::Database;
use crate::routes;
use crate::state::AppState;

/// Server command-line arguments
#[derive(Parser, Debug, Clone)]
pub struct ServerArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    pub port: u16,

    /// Bind address
    #[arg(short, long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Database file path (default: ~/.adboard/adboard.db)
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

impl Default for ServerArgs {
    fn default() -> Self {
        Self {
            port: 5000,
            bind: "127.0.0.1".to_string(),
            db_path: None,
            timeout: 30,
        }
    }
}

/// Run the server with the given arguments
pub async fn run_server(args: ServerArgs) -> anyhow::Result<()> {
    let db_path = args.db_path.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".adboard")
            .join("adboard.db")
    });

    info!("Opening database at {}", db_path.display());
    let db = Database::open(&db_path)?;

    let state = AppState::new(db);
    let app = create_router(state, args.timeout);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;

    info!("Starting adboard on http://{}", addr);
    info!("Database: {}", db_path.display());

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the Axum router with all routes
pub fn create_router(state: AppState, timeout_secs: u64) -> Router {
    // CORS layer for local development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(timeout_secs)))
        .layer(cors);

    Router::new()
        // Health
        .route("/health", get(routes::health_check))
        // Browse
        .route("/", get(routes::list_ads))
        .route("/ads", get(routes::list_ads))
        // Accounts
        .route("/register", post(routes::register))
        .route("/login", post(routes::login))
        .route("/logout", post(routes::logout))
        .route("/profile", get(routes::profile))
        // Ads
        .route("/ad/new", get(routes::new_ad_form).post(routes::create_ad))
        .route("/ad/{id}", get(routes::get_ad))
        .route("/ad/{id}/favorite", post(routes::favorite_ad))
        .route("/ad/{id}/question", post(routes::ask_question))
        // Categories
        .route(
            "/categories",
            get(routes::list_categories).post(routes::create_category),
        )
        .route("/categories/{id}/ads", get(routes::list_category_ads))
        .with_state(state)
        .layer(middleware)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let db = Database::open_in_memory().unwrap();
        create_router(AppState::new(db), 30)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Register an account and log in, returning the session cookie
    async fn register_and_login(app: &Router, username: &str, email: &str) -> String {
        let (status, _) = send(
            app,
            "POST",
            "/register",
            None,
            Some(json!({ "username": username, "email": email, "password": "hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "email": email, "password": "hunter2" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login sets a session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"]["connected"], true);
    }

    #[tokio::test]
    async fn register_login_post_and_browse() {
        let app = test_app();
        let cookie = register_and_login(&app, "alice", "alice@x.com").await;

        // Create a category to post into
        let (status, category) = send(
            &app,
            "POST",
            "/categories",
            Some(&cookie),
            Some(json!({ "name": "Electronics" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let category_id = category["id"].as_i64().unwrap();

        // The ad form lists categories
        let (status, categories) = send(&app, "GET", "/ad/new", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(categories.as_array().unwrap().len(), 1);

        // Post an ad
        let (status, ad) = send(
            &app,
            "POST",
            "/ad/new",
            Some(&cookie),
            Some(json!({
                "title": "Phone",
                "description": "Used",
                "price": 99.99,
                "category_id": category_id
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(ad["price"], 99.99);
        let ad_id = ad["id"].as_i64().unwrap();

        // Detail view
        let (status, fetched) = send(&app, "GET", &format!("/ad/{}", ad_id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "Phone");
        assert_eq!(fetched["category_id"], category_id);

        // Home lists it, anonymously
        let (status, ads) = send(&app, "GET", "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ads.as_array().unwrap().len(), 1);

        // Category browsing
        let (status, ads) = send(
            &app,
            "GET",
            &format!("/categories/{}/ads", category_id),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ads.as_array().unwrap().len(), 1);

        // Profile shows the user's own ads; password hash never leaks
        let (status, profile) = send(&app, "GET", "/profile", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["user"]["username"], "alice");
        assert_eq!(profile["ads"].as_array().unwrap().len(), 1);
        assert!(profile["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = test_app();

        let payload = json!({ "username": "alice", "email": "alice@x.com", "password": "pw" });
        let (status, _) = send(&app, "POST", "/register", None, Some(payload.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "POST", "/register", None, Some(payload)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("alice"));
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let app = test_app();
        send(
            &app,
            "POST",
            "/register",
            None,
            Some(json!({ "username": "alice", "email": "alice@x.com", "password": "hunter2" })),
        )
        .await;

        let (status, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": "alice@x.com", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": "nobody@x.com", "password": "hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_required_endpoints_reject_anonymous() {
        let app = test_app();

        let (status, _) = send(&app, "GET", "/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/ad/new", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "POST",
            "/ad/new",
            None,
            Some(json!({
                "title": "Phone", "description": "Used", "price": 1.0, "category_id": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "POST", "/ad/1/favorite", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_ad_is_404() {
        let app = test_app();
        let cookie = register_and_login(&app, "alice", "alice@x.com").await;

        let (status, _) = send(&app, "GET", "/ad/999", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", "/ad/999/favorite", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            "/ad/999/question",
            Some(&cookie),
            Some(json!({ "question": "Still available?" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stub_actions_confirm_without_writing() {
        let app = test_app();
        let cookie = register_and_login(&app, "alice", "alice@x.com").await;

        let (_, category) = send(
            &app,
            "POST",
            "/categories",
            Some(&cookie),
            Some(json!({ "name": "Electronics" })),
        )
        .await;
        let (_, ad) = send(
            &app,
            "POST",
            "/ad/new",
            Some(&cookie),
            Some(json!({
                "title": "Phone",
                "description": "Used",
                "price": 99.99,
                "category_id": category["id"]
            })),
        )
        .await;
        let ad_id = ad["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/ad/{}/favorite", ad_id),
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Ad added to favorites!");

        let (status, body) = send(
            &app,
            "POST",
            &format!("/ad/{}/question", ad_id),
            Some(&cookie),
            Some(json!({ "question": "Still available?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Question submitted!");

        // Nothing was persisted by either action
        let (_, ads) = send(&app, "GET", "/", None, None).await;
        assert_eq!(ads.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn logout_invalidates_session() {
        let app = test_app();
        let cookie = register_and_login(&app, "alice", "alice@x.com").await;

        let (status, _) = send(&app, "GET", "/profile", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "POST", "/logout", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", "/profile", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authenticated_callers_short_circuit_register_and_login() {
        let app = test_app();
        let cookie = register_and_login(&app, "alice", "alice@x.com").await;

        // Registering while logged in returns the current account unchanged
        let (status, body) = send(
            &app,
            "POST",
            "/register",
            Some(&cookie),
            Some(json!({ "username": "bob", "email": "bob@x.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        // ...and the submitted account was never created
        let (status, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": "bob@x.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Logging in while logged in keeps the existing session: no new cookie
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::COOKIE, cookie.as_str())
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "email": "alice@x.com", "password": "hunter2" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn logout_without_session_is_ok() {
        let app = test_app();
        let (status, body) = send(&app, "POST", "/logout", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Logged out");
    }

    #[tokio::test]
    async fn validation_rejects_bad_fields() {
        let app = test_app();

        // Username over 20 characters
        let (status, _) = send(
            &app,
            "POST",
            "/register",
            None,
            Some(json!({
                "username": "a".repeat(21),
                "email": "a@x.com",
                "password": "pw"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Malformed email
        let (status, _) = send(
            &app,
            "POST",
            "/register",
            None,
            Some(json!({ "username": "alice", "email": "not-an-email", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Empty ad title
        let cookie = register_and_login(&app, "bob", "bob@x.com").await;
        let (status, _) = send(
            &app,
            "POST",
            "/ad/new",
            Some(&cookie),
            Some(json!({ "title": "", "description": "Used", "price": 1.0, "category_id": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_category_is_404() {
        let app = test_app();
        let (status, _) = send(&app, "GET", "/categories/999/ads", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
