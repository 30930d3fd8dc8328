//! Axum router configuration with middleware.
//!
//! Middleware: CORS, tracing.

use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Sales chat
        .route("/sales", post(handlers::sales::sales))
        // Catalog
        .route("/products", get(handlers::products::list_products))
        .route("/products/{id}", get(handlers::products::get_product))
        // Cart & checkout
        .route("/user/{id}/cart", get(handlers::cart::get_cart))
        .route(
            "/user/{id}/cart/add/{product_id}",
            post(handlers::cart::add_to_cart),
        )
        .route("/user/{id}/checkout", post(handlers::cart::checkout))
        // Orders
        .route("/user/{id}/orders", get(handlers::orders::list_orders))
        // Sessions
        .route(
            "/sessions/{id}/messages",
            get(handlers::sessions::get_messages),
        )
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint (no envelope).
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
