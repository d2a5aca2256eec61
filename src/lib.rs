//! Catalog API Library
//!
//! Product catalog and inventory management: CRUD, search, filtering,
//! pagination, and stock-quantity operations backed by a relational store.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod queries;
pub mod services;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub products: services::products::ProductService,
    pub stock: services::stock::StockService,
}

impl AppState {
    /// Wires the services onto a shared connection pool. The pool is passed
    /// in explicitly so tests can substitute their own database.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        Self {
            products: services::products::ProductService::new(db.clone()),
            stock: services::stock::StockService::new(db.clone()),
            db,
            config,
        }
    }
}

/// Assembles the application router.
///
/// Middleware layers (tracing, request ids, CORS, timeouts, compression) are
/// applied by the binary; tests drive the bare router directly.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::health::health_router())
        .nest("/products", handlers::products::products_router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .with_state(state)
}
