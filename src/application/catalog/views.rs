//! Client-facing snapshots. The same shape is cached and returned over HTTP.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{DishRecord, MenuRecord, SubmenuRecord};
use crate::domain::price::Price;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub submenus_count: i64,
    pub dishes_count: i64,
}

impl From<MenuRecord> for MenuView {
    fn from(record: MenuRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title,
            description: record.description,
            submenus_count: record.submenus_count,
            dishes_count: record.dishes_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmenuView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub dishes_count: i64,
}

impl From<SubmenuRecord> for SubmenuView {
    fn from(record: SubmenuRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title,
            description: record.description,
            dishes_count: record.dishes_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Price>,
}

impl From<DishRecord> for DishView {
    fn from(record: DishRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title,
            description: record.description,
            price: record.price,
        }
    }
}
