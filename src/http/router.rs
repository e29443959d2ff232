//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Authors
        .route("/authors", get(handlers::list_authors))
        .route("/authors", post(handlers::create_author))
        .route("/authors/{author_id}", get(handlers::get_author))
        // Books
        .route("/books", get(handlers::list_books))
        .route("/books", post(handlers::create_book))
        .route("/books/{book_id}", get(handlers::get_book))
        .route("/books/{book_id}", put(handlers::update_book))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
