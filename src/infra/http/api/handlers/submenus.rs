//! Submenu handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::catalog::{CatalogError, parse_id};
use crate::domain::types::EntityKind;

use super::catalog_to_api;
use crate::infra::http::api::error::{ApiError, ApiJson};
use crate::infra::http::api::models::EntityRequest;
use crate::infra::http::api::state::ApiState;

fn submenu_path(menu_id: &str, submenu_id: &str) -> Result<(i64, i64), CatalogError> {
    Ok((
        parse_id(EntityKind::Menu, menu_id)?,
        parse_id(EntityKind::Submenu, submenu_id)?,
    ))
}

pub async fn list_submenus(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let menu_id = parse_id(EntityKind::Menu, &menu_id).map_err(catalog_to_api)?;
    let submenus = state
        .submenus
        .list(menu_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(submenus))
}

pub async fn get_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (menu_id, id) = submenu_path(&menu_id, &submenu_id).map_err(catalog_to_api)?;
    let submenu = state
        .submenus
        .read(menu_id, id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(submenu))
}

pub async fn create_submenu(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
    ApiJson(payload): ApiJson<EntityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let menu_id = parse_id(EntityKind::Menu, &menu_id).map_err(catalog_to_api)?;
    let submenu = state
        .submenus
        .create(menu_id, payload.into())
        .await
        .map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(submenu)))
}

pub async fn update_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
    ApiJson(payload): ApiJson<EntityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (menu_id, id) = submenu_path(&menu_id, &submenu_id).map_err(catalog_to_api)?;
    let submenu = state
        .submenus
        .update(menu_id, id, payload.into())
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(submenu))
}

pub async fn delete_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (menu_id, id) = submenu_path(&menu_id, &submenu_id).map_err(catalog_to_api)?;
    let confirmation = state
        .submenus
        .delete(menu_id, id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(confirmation))
}
