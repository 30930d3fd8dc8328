//! Order history HTTP handler.
//!
//! Endpoint:
//! - GET /user/{id}/orders - A user's orders, newest first

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use clara_core::repository::{OrderRepository, UserRepository};
use clara_types::commerce::Order;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /user/{id}/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Order>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if state.store.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {user_id} not found")));
    }
    let orders = state.store.get_orders(user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(orders, request_id, elapsed)
            .with_link("self", &format!("/user/{user_id}/orders")),
    ))
}
