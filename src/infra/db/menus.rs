use async_trait::async_trait;

use crate::{
    application::repos::{
        CreateMenuParams, MenusRepo, MenusWriteRepo, RepoError, UpdateMenuParams,
    },
    domain::entities::MenuRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const MENU_COLUMNS: &str = "id, title, description, submenus_count, dishes_count";

#[derive(sqlx::FromRow)]
struct MenuRow {
    id: i64,
    title: String,
    description: Option<String>,
    submenus_count: i64,
    dishes_count: i64,
}

impl From<MenuRow> for MenuRecord {
    fn from(row: MenuRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            submenus_count: row.submenus_count,
            dishes_count: row.dishes_count,
        }
    }
}

#[async_trait]
impl MenusRepo for PostgresRepositories {
    async fn list_menus(&self) -> Result<Vec<MenuRecord>, RepoError> {
        let rows = sqlx::query_as::<_, MenuRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus ORDER BY id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MenuRecord::from).collect())
    }

    async fn find_menu(&self, id: i64) -> Result<Option<MenuRecord>, RepoError> {
        let row = sqlx::query_as::<_, MenuRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MenuRecord::from))
    }

    async fn find_menu_by_title(&self, title: &str) -> Result<Option<MenuRecord>, RepoError> {
        let row = sqlx::query_as::<_, MenuRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus WHERE title = $1"
        ))
        .bind(title)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MenuRecord::from))
    }
}

#[async_trait]
impl MenusWriteRepo for PostgresRepositories {
    async fn create_menu(&self, params: CreateMenuParams) -> Result<MenuRecord, RepoError> {
        let row = sqlx::query_as::<_, MenuRow>(&format!(
            "INSERT INTO menus (title, description) VALUES ($1, $2) RETURNING {MENU_COLUMNS}"
        ))
        .bind(&params.title)
        .bind(&params.description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(MenuRecord::from(row))
    }

    async fn update_menu(&self, params: UpdateMenuParams) -> Result<MenuRecord, RepoError> {
        let row = sqlx::query_as::<_, MenuRow>(&format!(
            r#"
            UPDATE menus
               SET title = $2,
                   description = $3
             WHERE id = $1
         RETURNING {MENU_COLUMNS}
            "#
        ))
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.description)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(MenuRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_menu(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        super::expect_affected(result)
    }
}
