use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::fixtures::FixtureMenu;
use crate::domain::entities::{CatalogRow, DishRecord, JobRecord, MenuRecord, SubmenuRecord};
use crate::domain::price::Price;
use crate::domain::types::JobType;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateMenuParams {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateMenuParams {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateSubmenuParams {
    pub menu_id: i64,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateSubmenuParams {
    pub menu_id: i64,
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateDishParams {
    pub menu_id: i64,
    pub submenu_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Price>,
}

/// `price: None` keeps the stored price.
#[derive(Debug, Clone)]
pub struct UpdateDishParams {
    pub menu_id: i64,
    pub submenu_id: i64,
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Price>,
}

#[async_trait]
pub trait MenusRepo: Send + Sync {
    async fn list_menus(&self) -> Result<Vec<MenuRecord>, RepoError>;

    async fn find_menu(&self, id: i64) -> Result<Option<MenuRecord>, RepoError>;

    async fn find_menu_by_title(&self, title: &str) -> Result<Option<MenuRecord>, RepoError>;
}

#[async_trait]
pub trait MenusWriteRepo: Send + Sync {
    async fn create_menu(&self, params: CreateMenuParams) -> Result<MenuRecord, RepoError>;

    /// Fails with [`RepoError::NotFound`] when the menu does not exist.
    async fn update_menu(&self, params: UpdateMenuParams) -> Result<MenuRecord, RepoError>;

    /// Removes the menu together with its submenus and dishes.
    async fn delete_menu(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SubmenusRepo: Send + Sync {
    async fn list_submenus(&self, menu_id: i64) -> Result<Vec<SubmenuRecord>, RepoError>;

    async fn find_submenu(
        &self,
        menu_id: i64,
        id: i64,
    ) -> Result<Option<SubmenuRecord>, RepoError>;

    async fn find_submenu_by_title(&self, title: &str)
    -> Result<Option<SubmenuRecord>, RepoError>;
}

#[async_trait]
pub trait SubmenusWriteRepo: Send + Sync {
    /// Inserts the submenu and increments the parent menu's `submenus_count`
    /// in one transaction. [`RepoError::NotFound`] when the menu is missing.
    async fn create_submenu(&self, params: CreateSubmenuParams)
    -> Result<SubmenuRecord, RepoError>;

    async fn update_submenu(&self, params: UpdateSubmenuParams)
    -> Result<SubmenuRecord, RepoError>;

    /// Removes the submenu and its dishes, decrementing the menu's
    /// `submenus_count` by one and `dishes_count` by the submenu's dish count.
    async fn delete_submenu(&self, menu_id: i64, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait DishesRepo: Send + Sync {
    async fn list_dishes(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<Vec<DishRecord>, RepoError>;

    async fn find_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        id: i64,
    ) -> Result<Option<DishRecord>, RepoError>;

    async fn find_dish_by_title(&self, title: &str) -> Result<Option<DishRecord>, RepoError>;
}

#[async_trait]
pub trait DishesWriteRepo: Send + Sync {
    /// Inserts the dish and increments both the submenu's and the menu's
    /// `dishes_count` in one transaction.
    async fn create_dish(&self, params: CreateDishParams) -> Result<DishRecord, RepoError>;

    async fn update_dish(&self, params: UpdateDishParams) -> Result<DishRecord, RepoError>;

    /// Removes the dish and decrements both ancestor counters by one.
    async fn delete_dish(&self, menu_id: i64, submenu_id: i64, id: i64)
    -> Result<(), RepoError>;
}

#[async_trait]
pub trait CatalogExportRepo: Send + Sync {
    /// Every dish joined with its submenu and menu, ordered by menu, submenu and dish id.
    async fn list_catalog_rows(&self) -> Result<Vec<CatalogRow>, RepoError>;
}

#[async_trait]
pub trait FixturesRepo: Send + Sync {
    /// Drops every catalog row and inserts the given fixture tree.
    async fn reset_catalog(&self, menus: &[FixtureMenu]) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewJobRecord {
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub run_at: OffsetDateTime,
    pub max_attempts: i32,
    pub priority: i32,
}

#[async_trait]
pub trait JobsRepo: Send + Sync {
    async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError>;

    async fn find_job(&self, id: &str) -> Result<Option<JobRecord>, RepoError>;
}
