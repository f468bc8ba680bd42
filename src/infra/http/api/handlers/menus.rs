//! Menu handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::catalog::parse_id;
use crate::domain::types::EntityKind;

use super::catalog_to_api;
use crate::infra::http::api::error::{ApiError, ApiJson};
use crate::infra::http::api::models::EntityRequest;
use crate::infra::http::api::state::ApiState;

pub async fn list_menus(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let menus = state.menus.list().await.map_err(catalog_to_api)?;
    Ok(Json(menus))
}

pub async fn get_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(EntityKind::Menu, &menu_id).map_err(catalog_to_api)?;
    let menu = state.menus.read(id).await.map_err(catalog_to_api)?;
    Ok(Json(menu))
}

pub async fn create_menu(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<EntityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let menu = state
        .menus
        .create(payload.into())
        .await
        .map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(menu)))
}

pub async fn update_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
    ApiJson(payload): ApiJson<EntityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(EntityKind::Menu, &menu_id).map_err(catalog_to_api)?;
    let menu = state
        .menus
        .update(id, payload.into())
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(menu))
}

pub async fn delete_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(EntityKind::Menu, &menu_id).map_err(catalog_to_api)?;
    let confirmation = state.menus.delete(id).await.map_err(catalog_to_api)?;
    Ok(Json(confirmation))
}
