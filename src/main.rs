//! FraudLens API Server
//!
//! Backend for the AI-driven multi-modal fraud detection platform.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       FRAUDLENS API                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  Auth     │  │  Analyzer (trait)       │ │
//! │  │  (Axum)   │  │  (JWT)    │  │  → Risk Engine (pure)   │ │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │        └──────────────┼──────────────────────┘              │
//! │                       ▼                                     │
//! │                ┌─────────────┐                             │
//! │                │ PostgreSQL  │                             │
//! │                └─────────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod analyzer;
mod config;
mod db;
mod models;
mod handlers;
mod middleware;
mod error;
mod risk;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use analyzer::{MockAnalyzer, SignalAnalyzer};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let json_logs = config.log_json;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "fraudlens_api=debug,tower_http=debug".into()))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("{} v{} starting...", config.project_name, config.project_version);
    tracing::info!("Database: {}", config.redacted_database_url());

    if config.uses_default_secret() && config.is_production() {
        tracing::warn!("JWT_SECRET is not set; using the development secret in production");
    }

    // Initialize database pool
    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Applying database schema...");
    db::run_migrations(&pool)
        .await
        .context("Failed to apply database schema")?;

    // Build application state
    let state = AppState {
        pool,
        analyzer: Arc::new(MockAnalyzer::new(config.analyzer_latency)),
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Application shut down");
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub analyzer: Arc<dyn SignalAnalyzer>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/token", post(handlers::auth::token));

    // User routes (JWT auth)
    let user_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))

        // Analysis
        .route("/analyze/text", post(handlers::analysis::analyze_text))
        .route("/analyze/url", post(handlers::analysis::analyze_url))
        .route("/analyze/file", post(handlers::analysis::analyze_file))
        .route("/analyze/image", post(handlers::analysis::analyze_image))
        .route("/analyze/history", get(handlers::analysis::history))
        .route("/analyze/:id", get(handlers::analysis::get))

        // Alerts (BANK_ADMIN / SOC_ANALYST)
        .route("/alerts", get(handlers::alerts::list))

        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user_auth
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// CORS policy: configured origins, or any origin when none are set
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Application shutting down...");
}


/// Full request paths against a real PostgreSQL. Run with
/// `DATABASE_URL=postgres://... cargo test -- --ignored`.
#[cfg(test)]
mod db_tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tokio::sync::OnceCell;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::analyzer::SignalReport;
    use crate::models::{Alert, ALERT_PENDING};
    use crate::risk::SignalBundle;

    static SCHEMA: OnceCell<()> = OnceCell::const_new();

    /// Text containing "urgent" scores 0.95, anything else 0.1
    struct FixedAnalyzer;

    #[axum::async_trait]
    impl SignalAnalyzer for FixedAnalyzer {
        async fn analyze_text(&self, content: &str) -> AppResult<SignalReport> {
            let fraud = if content.to_lowercase().contains("urgent") { 0.95 } else { 0.1 };
            Ok(SignalReport::new(SignalBundle::new().with("fraud_probability", fraud)))
        }

        async fn analyze_url(&self, _url: &str) -> AppResult<SignalReport> {
            Ok(SignalReport::new(SignalBundle::new().with("phishing_probability", 0.5)))
        }

        async fn analyze_document(&self, _filename: &str, _content: &[u8]) -> AppResult<SignalReport> {
            Ok(SignalReport::new(SignalBundle::new().with("malware_probability", 0.2)))
        }

        async fn analyze_image(&self, _filename: &str, _content: &[u8]) -> AppResult<SignalReport> {
            Ok(SignalReport::new(SignalBundle::new().with("metadata_suspicion", 0.3)))
        }
    }

    async fn db_app() -> (Router, sqlx::PgPool) {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let config = config::Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some(database_url.clone()),
            "JWT_SECRET" => Some("db-test-secret".to_string()),
            _ => None,
        });

        let pool = db::create_pool(&config.database_url).await.unwrap();
        SCHEMA
            .get_or_init(|| async { db::run_migrations(&pool).await.unwrap() })
            .await;

        let state = AppState {
            pool: pool.clone(),
            config,
            analyzer: Arc::new(FixedAnalyzer),
        };
        (create_router(state), pool)
    }

    fn unique_email() -> String {
        format!("analyst-{}@example.com", Uuid::new_v4().simple())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn register(app: &Router, email: &str, role: &str, is_active: bool) -> (StatusCode, serde_json::Value) {
        let body = serde_json::json!({
            "email": email,
            "name": "Test Analyst",
            "password": "testpass",
            "role": role,
            "is_active": is_active,
        });
        send(
            app,
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        ).await
    }

    async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, serde_json::Value) {
        let form = format!("username={}&password={}", email.replace('@', "%40"), password);
        send(
            app,
            Request::builder()
                .method("POST")
                .uri("/auth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        ).await
    }

    /// Register an active user and return a bearer token
    async fn signed_in(app: &Router, role: &str) -> String {
        let email = unique_email();
        assert_eq!(register(app, &email, role, true).await.0, StatusCode::OK);
        let (status, json) = login(app, &email, "testpass").await;
        assert_eq!(status, StatusCode::OK);
        json["access_token"].as_str().unwrap().to_string()
    }

    fn get(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
    async fn test_register_login_and_duplicate_email() {
        let (app, _pool) = db_app().await;
        let email = unique_email();

        let (status, json) = register(&app, &email, "USER", true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["email"], email.as_str());
        assert_eq!(json["role"], "USER");
        assert!(json.get("password_hash").is_none());

        let (status, json) = register(&app, &email, "USER", true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Email already registered");

        let (status, json) = login(&app, &email, "testpass").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["token_type"], "bearer");
        let token = json["access_token"].as_str().unwrap().to_string();

        let (status, json) = login(&app, &email, "wrongpass").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Incorrect username or password");

        let (status, json) = send(&app, get("/auth/me", &token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["email"], email.as_str());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
    async fn test_inactive_user_is_forbidden() {
        let (app, _pool) = db_app().await;
        let email = unique_email();

        assert_eq!(register(&app, &email, "USER", false).await.0, StatusCode::OK);
        let (status, json) = login(&app, &email, "testpass").await;
        assert_eq!(status, StatusCode::OK);
        let token = json["access_token"].as_str().unwrap().to_string();

        let (status, json) = send(&app, get("/auth/me", &token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "Inactive user account");
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
    async fn test_blocked_analysis_raises_pending_alert() {
        let (app, pool) = db_app().await;
        let token = signed_in(&app, "USER").await;

        let (status, json) = send(
            &app,
            post_json("/analyze/text", &token, serde_json::json!({ "content": "URGENT: confirm your PIN" })),
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["decision"], "BLOCK");
        assert_eq!(json["risk_level"], "HIGH");
        assert_eq!(json["risk_score"], 0.95);
        assert_eq!(json["risk_components"]["text_score"], 0.95);
        let blocked_id: Uuid = json["id"].as_str().unwrap().parse().unwrap();

        let alert = sqlx::query_as::<_, Alert>("SELECT * FROM alerts WHERE analysis_id = $1")
            .bind(blocked_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(alert.status, ALERT_PENDING);
        assert_eq!(alert.alert_type, "HIGH_RISK_TEXT");

        let (status, json) = send(
            &app,
            post_json("/analyze/text", &token, serde_json::json!({ "content": "Lunch at noon?" })),
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["decision"], "ALLOW");
        let allowed_id: Uuid = json["id"].as_str().unwrap().parse().unwrap();

        let alerts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts WHERE analysis_id = $1")
            .bind(allowed_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(alerts, 0);

        let (status, json) = send(
            &app,
            post_json("/analyze/url", &token, serde_json::json!({ "url": "http://evil.com/login" })),
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["input_type"], "URL");
        assert_eq!(json["decision"], "FLAG");
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
    async fn test_history_is_scoped_to_owner() {
        let (app, _pool) = db_app().await;
        let owner = signed_in(&app, "USER").await;
        let stranger = signed_in(&app, "USER").await;

        let (_, json) = send(
            &app,
            post_json("/analyze/text", &owner, serde_json::json!({ "content": "urgent wire transfer" })),
        ).await;
        let id = json["id"].as_str().unwrap().to_string();

        let (status, json) = send(&app, get("/analyze/history?decision=block", &owner)).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = json.as_array().unwrap().iter().filter_map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec![id.as_str()]);

        let (status, json) = send(&app, get("/analyze/history?decision=allow", &owner)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.as_array().unwrap().is_empty());

        let (status, json) = send(&app, get("/analyze/history", &stranger)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.as_array().unwrap().is_empty());

        let (status, _) = send(&app, get(&format!("/analyze/{}", id), &stranger)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) = send(&app, get(&format!("/analyze/{}", id), &owner)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["risk_components"]["text_score"], 0.95);

        let (status, json) = send(&app, get("/analyze/history?input_type=video", &owner)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Unrecognized input kind: video");

        let (status, json) = send(&app, get("/analyze/history?decision=deny", &owner)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Unrecognized decision: deny");
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
    async fn test_alerts_require_reviewer_role() {
        let (app, _pool) = db_app().await;

        let user = signed_in(&app, "USER").await;
        let (status, _) = send(&app, get("/alerts", &user)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let analyst = signed_in(&app, "SOC_ANALYST").await;
        let (status, json) = send(&app, get("/alerts?status=pending", &analyst)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.is_array());
    }
}
