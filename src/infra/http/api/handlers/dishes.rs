//! Dish handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::catalog::{CatalogError, DishInput, parse_id};
use crate::domain::types::EntityKind;

use super::{catalog_to_api, domain_to_api};
use crate::infra::http::api::error::{ApiError, ApiJson};
use crate::infra::http::api::models::DishRequest;
use crate::infra::http::api::state::ApiState;

fn parent_path(menu_id: &str, submenu_id: &str) -> Result<(i64, i64), CatalogError> {
    Ok((
        parse_id(EntityKind::Menu, menu_id)?,
        parse_id(EntityKind::Submenu, submenu_id)?,
    ))
}

fn dish_path(
    menu_id: &str,
    submenu_id: &str,
    dish_id: &str,
) -> Result<(i64, i64, i64), CatalogError> {
    let (menu_id, submenu_id) = parent_path(menu_id, submenu_id)?;
    Ok((menu_id, submenu_id, parse_id(EntityKind::Dish, dish_id)?))
}

pub async fn list_dishes(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (menu_id, submenu_id) = parent_path(&menu_id, &submenu_id).map_err(catalog_to_api)?;
    let dishes = state
        .dishes
        .list(menu_id, submenu_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(dishes))
}

pub async fn get_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (menu_id, submenu_id, id) =
        dish_path(&menu_id, &submenu_id, &dish_id).map_err(catalog_to_api)?;
    let dish = state
        .dishes
        .read(menu_id, submenu_id, id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(dish))
}

pub async fn create_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
    ApiJson(payload): ApiJson<DishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (menu_id, submenu_id) = parent_path(&menu_id, &submenu_id).map_err(catalog_to_api)?;
    let input = DishInput::try_from(payload).map_err(domain_to_api)?;
    let dish = state
        .dishes
        .create(menu_id, submenu_id, input)
        .await
        .map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(dish)))
}

pub async fn update_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(String, String, String)>,
    ApiJson(payload): ApiJson<DishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (menu_id, submenu_id, id) =
        dish_path(&menu_id, &submenu_id, &dish_id).map_err(catalog_to_api)?;
    let input = DishInput::try_from(payload).map_err(domain_to_api)?;
    let dish = state
        .dishes
        .update(menu_id, submenu_id, id, input)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(dish))
}

pub async fn delete_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (menu_id, submenu_id, id) =
        dish_path(&menu_id, &submenu_id, &dish_id).map_err(catalog_to_api)?;
    let confirmation = state
        .dishes
        .delete(menu_id, submenu_id, id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(confirmation))
}
