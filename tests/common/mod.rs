//! Common test utilities

#![allow(dead_code)]

use std::sync::OnceLock;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use budget_tracker::{api, db, repository::UserRepository};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tokio::sync::{Mutex, MutexGuard};
use tower::util::ServiceExt;
use tower_http::cors::CorsLayer;

pub const API_KEY: &str = "test_key_123";
pub const OTHER_API_KEY: &str = "other_key_456";

/// Tests in one binary share a database; they take turns
fn db_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Setup test database - apply schema, truncate tables and seed two users
pub async fn setup_test_db() -> TestDb {
    let guard = db_lock().lock().await;

    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::run_migrations(&pool).await.expect("Failed to apply schema");

    // Fault hooks installed by failure-path tests
    pool.execute(
        "DROP TRIGGER IF EXISTS borrowings_hold_updates ON borrowings; \
         DROP FUNCTION IF EXISTS hold_update(); \
         ALTER TABLE expenses DROP CONSTRAINT IF EXISTS expenses_reject_fail;",
    )
    .await
    .expect("Failed to remove fault hooks");

    sqlx::query(
        "TRUNCATE TABLE expenses, borrowings, lendings, budgets, api_keys, users CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to clean up DB");

    let users = UserRepository::new(pool.clone());
    for (email, key) in [("tester@example.com", API_KEY), ("other@example.com", OTHER_API_KEY)] {
        let user = users
            .find_or_create_by_email(email)
            .await
            .expect("Failed to seed user");
        users
            .insert_api_key(user.id, "Test Key", key)
            .await
            .expect("Failed to seed API key");
    }

    TestDb {
        pool,
        _guard: guard,
    }
}

pub fn app(pool: &PgPool) -> Router {
    api::build_router(pool.clone(), CorsLayer::new())
}

/// Send a request with the given API key and decode the JSON body
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    api_key: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", api_key);

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Create a budget and return its id
pub async fn create_budget(app: &Router, year: i32, month: u32, income: f64) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/budgets",
        API_KEY,
        Some(serde_json::json!({ "year": year, "monthNumber": month, "income": income })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "budget creation failed: {}", json);
    json["budget"]["id"].as_str().unwrap().to_string()
}
