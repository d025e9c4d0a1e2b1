//! API router configuration
//!
//! Defines all API routes and middleware.

use super::handlers;
use super::state::AppState;
use axum::{
    http::{header, Method},
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Root routes
        .route(
            "/",
            get(handlers::root_get)
                .post(handlers::register_record)
                .delete(handlers::root_delete)
                .options(handlers::options_ok)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/next",
            get(handlers::next_available)
                .options(handlers::options_ok)
                .fallback(handlers::method_not_allowed),
        )
        // Versioned routes
        .route(
            "/api/v1/cidrs",
            get(handlers::list_records)
                .post(handlers::register_record)
                .options(handlers::options_ok)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/v1/cidrs/next",
            get(handlers::next_available).delete(handlers::delete_record_named_next),
        )
        .route("/api/v1/cidrs/:key", delete(handlers::delete_record))
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
