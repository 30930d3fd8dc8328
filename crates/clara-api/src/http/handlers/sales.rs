//! Sales chat HTTP handler.
//!
//! Endpoint:
//! - POST /sales - Run one customer turn through the orchestrator

use axum::extract::State;
use axum::Json;
use tracing::Instrument;

use clara_types::sales::{SalesRequest, SalesResponse};

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /sales
///
/// Returns the bare [`SalesResponse`] rather than the envelope.
pub async fn sales(
    State(state): State<AppState>,
    Json(request): Json<SalesRequest>,
) -> Result<Json<SalesResponse>, AppError> {
    let span = tracing::info_span!(
        "sales_turn",
        channel = %request.channel,
        user_id = ?request.user_id,
    );
    let response = state
        .orchestrator
        .process_message(request)
        .instrument(span)
        .await?;
    Ok(Json(response))
}
