//! Cart and checkout HTTP handlers.
//!
//! Endpoints:
//! - GET  /user/{id}/cart                    - Cart lines with totals
//! - POST /user/{id}/cart/add/{product_id}   - Add a product (?quantity=, default 1)
//! - POST /user/{id}/checkout                - Place and settle an order

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use clara_types::commerce::{CartItem, CartView, CheckoutReceipt, CheckoutRequest};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for adding to the cart.
#[derive(Debug, Deserialize)]
pub struct AddToCartQuery {
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// GET /user/{id}/cart
pub async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<CartView>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let cart = state.checkout.cart(user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(cart, request_id, elapsed)
            .with_link("self", &format!("/user/{user_id}/cart"))
            .with_link("checkout", &format!("/user/{user_id}/checkout")),
    ))
}

/// POST /user/{id}/cart/add/{product_id}
pub async fn add_to_cart(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(i64, i64)>,
    Query(query): Query<AddToCartQuery>,
) -> Result<Json<ApiResponse<CartItem>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let item = state
        .checkout
        .add_to_cart(user_id, product_id, query.quantity)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(item, request_id, elapsed)
            .with_link("cart", &format!("/user/{user_id}/cart")),
    ))
}

/// POST /user/{id}/checkout
pub async fn checkout(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<ApiResponse<CheckoutReceipt>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if request.shipping_address.trim().is_empty() {
        return Err(AppError::Validation(
            "shipping_address must not be empty".to_string(),
        ));
    }

    let receipt = state.checkout.checkout(user_id, &request).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(receipt, request_id, elapsed)
            .with_link("orders", &format!("/user/{user_id}/orders")),
    ))
}
