use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::application::fixtures::FillOutcome;

use super::fill_to_api;
use crate::infra::http::api::error::{ApiError, ApiJson};
use crate::infra::http::api::models::{FillRequest, StatusResponse};
use crate::infra::http::api::state::ApiState;

/// A wrong password is a normal answer, not an error status.
pub async fn fill_catalog(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<FillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .fill
        .fill(&payload.password)
        .await
        .map_err(fill_to_api)?;

    let body = match outcome {
        FillOutcome::Seeded => StatusResponse::ok("Success"),
        FillOutcome::Rejected => StatusResponse::rejected("Incorrect password"),
    };
    Ok(Json(body))
}
