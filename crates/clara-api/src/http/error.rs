//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use clara_core::agent::orchestrator::OrchestratorError;
use clara_types::error::{CheckoutError, RepositoryError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Store errors outside of checkout.
    Repository(RepositoryError),
    /// Cart and checkout errors.
    Checkout(CheckoutError),
    /// Sales turn errors.
    Orchestrator(OrchestratorError),
    /// A resource addressed by path does not exist.
    NotFound(String),
    /// Validation error.
    Validation(String),
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        AppError::Checkout(e)
    }
}

impl From<OrchestratorError> for AppError {
    fn from(e: OrchestratorError) -> Self {
        AppError::Orchestrator(e)
    }
}

impl AppError {
    /// HTTP status, machine-readable code and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Repository(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found".to_string())
            }
            AppError::Repository(RepositoryError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Repository(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", e.to_string())
            }
            AppError::Checkout(CheckoutError::UserNotFound(_)) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", self.checkout_message())
            }
            AppError::Checkout(CheckoutError::ProductNotFound(_)) => {
                (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND", self.checkout_message())
            }
            AppError::Checkout(CheckoutError::EmptyCart) => {
                (StatusCode::BAD_REQUEST, "EMPTY_CART", self.checkout_message())
            }
            AppError::Checkout(CheckoutError::InvalidQuantity(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.checkout_message())
            }
            AppError::Checkout(CheckoutError::InsufficientPoints { .. }) => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_POINTS", self.checkout_message())
            }
            AppError::Checkout(CheckoutError::PaymentDeclined(_)) => {
                (StatusCode::PAYMENT_REQUIRED, "PAYMENT_DECLINED", self.checkout_message())
            }
            AppError::Checkout(CheckoutError::Storage(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", e.to_string())
            }
            AppError::Orchestrator(OrchestratorError::EmptyMessage) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Message must not be empty".to_string())
            }
            AppError::Orchestrator(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SESSION_ERROR", e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        }
    }

    fn checkout_message(&self) -> String {
        match self {
            AppError::Checkout(e) => e.to_string(),
            _ => String::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "Request failed");
        }

        (status, Json(ApiResponse::error(code, &message, String::new(), 0))).into_response()
    }
}
