//! Export handlers

use axum::Json;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::application::export::ExportPoll;
use crate::infra::xlsx::XLSX_MIME;

use super::export_to_api;
use crate::infra::http::api::error::{ApiError, ApiQuery};
use crate::infra::http::api::models::{ExportQuery, ExportStatusResponse, StatusResponse};
use crate::infra::http::api::state::ApiState;

pub async fn create_export(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let job_id = state.exports.submit().await.map_err(export_to_api)?;
    Ok(Json(StatusResponse::ok(job_id)))
}

pub async fn get_export(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> Result<Response, ApiError> {
    let poll = state
        .exports
        .poll(&query.task_id)
        .await
        .map_err(export_to_api)?;

    let response = match poll {
        ExportPoll::Unrequested => Json(ExportStatusResponse::unrequested()).into_response(),
        ExportPoll::Pending(status) => Json(ExportStatusResponse::pending(status)).into_response(),
        ExportPoll::Ready { file_name, content } => (
            [
                (CONTENT_TYPE, XLSX_MIME.to_string()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename={file_name}"),
                ),
            ],
            content,
        )
            .into_response(),
    };
    Ok(response)
}
