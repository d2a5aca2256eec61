#![allow(dead_code)]

use std::sync::Arc;

use catalog_api::config::AppConfig;
use catalog_api::db::{self, DbConfig};
use catalog_api::AppState;
use sea_orm::DatabaseConnection;

/// Builds an isolated in-memory database with the schema applied.
///
/// A single pooled connection keeps every query in the test on the same
/// in-memory SQLite instance.
pub async fn test_db() -> Arc<DatabaseConnection> {
    let cfg = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };

    let pool = db::establish_connection_with_config(&cfg)
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");

    Arc::new(pool)
}

/// Application state wired onto a fresh in-memory database.
pub async fn test_state() -> AppState {
    let db = test_db().await;
    let cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        8080,
        "test".to_string(),
    );
    AppState::new(db, cfg)
}
