//! Shared helpers for the integration tests

use std::sync::{Mutex, MutexGuard};

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use library_server::{
    api::create_router,
    config::{AppConfig, DatabaseConfig},
    repository::{self, Repository},
    AppState,
};

/// Router backed by a pool that never connects. Only usable for requests that
/// are answered before reaching the database.
pub fn offline_app() -> Router {
    let options = DatabaseConfig::default()
        .connect_options()
        .expect("default options are valid");
    let pool = PgPoolOptions::new().connect_lazy_with(options);

    create_router(AppState::new(AppConfig::default(), Repository::new(pool)))
}

static DB_LOCK: Mutex<()> = Mutex::new(());

/// Router and repository on the database named by `DATABASE_URL`, migrated
/// and emptied. The guard serializes tests that share the books table.
pub async fn database_app() -> (Router, Repository, MutexGuard<'static, ()>) {
    let guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let mut config = AppConfig::default();
    config.database.url = Some(
        std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch database"),
    );

    let pool = repository::connect(&config.database)
        .await
        .expect("Failed to connect to database");
    let repository = Repository::new(pool);
    repository.migrate().await.expect("Failed to migrate");
    repository.clear().await.expect("Failed to clear books");

    let app = create_router(AppState::new(config, repository.clone()));
    (app, repository, guard)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn send_raw(app: &Router, method: Method, uri: &str, body: &'static str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
