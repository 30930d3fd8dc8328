//! Product catalog HTTP handlers.
//!
//! Endpoints:
//! - GET /products      - Search the catalog (category, occasion, price range)
//! - GET /products/{id} - Get a single product

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use clara_core::repository::ProductRepository;
use clara_types::catalog::{Product, ProductQuery};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /products
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(AppError::Validation(format!(
                "min_price ({min}) must not exceed max_price ({max})"
            )));
        }
    }

    let products = state.store.search_products(&query).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(products, request_id, elapsed).with_link("self", "/products"),
    ))
}

/// GET /products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(product, request_id, elapsed)
            .with_link("self", &format!("/products/{id}"))
            .with_link("catalog", "/products"),
    ))
}
