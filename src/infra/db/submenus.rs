use async_trait::async_trait;

use crate::{
    application::repos::{
        CreateSubmenuParams, RepoError, SubmenusRepo, SubmenusWriteRepo, UpdateSubmenuParams,
    },
    domain::entities::SubmenuRecord,
};

use super::{PostgresRepositories, expect_affected, lock_menu, map_sqlx_error};

const SUBMENU_COLUMNS: &str = "id, menu_id, title, description, dishes_count";

#[derive(sqlx::FromRow)]
struct SubmenuRow {
    id: i64,
    menu_id: i64,
    title: String,
    description: Option<String>,
    dishes_count: i64,
}

impl From<SubmenuRow> for SubmenuRecord {
    fn from(row: SubmenuRow) -> Self {
        Self {
            id: row.id,
            menu_id: row.menu_id,
            title: row.title,
            description: row.description,
            dishes_count: row.dishes_count,
        }
    }
}

#[async_trait]
impl SubmenusRepo for PostgresRepositories {
    async fn list_submenus(&self, menu_id: i64) -> Result<Vec<SubmenuRecord>, RepoError> {
        let rows = sqlx::query_as::<_, SubmenuRow>(&format!(
            "SELECT {SUBMENU_COLUMNS} FROM submenus WHERE menu_id = $1 ORDER BY id"
        ))
        .bind(menu_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SubmenuRecord::from).collect())
    }

    async fn find_submenu(
        &self,
        menu_id: i64,
        id: i64,
    ) -> Result<Option<SubmenuRecord>, RepoError> {
        let row = sqlx::query_as::<_, SubmenuRow>(&format!(
            "SELECT {SUBMENU_COLUMNS} FROM submenus WHERE menu_id = $1 AND id = $2"
        ))
        .bind(menu_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SubmenuRecord::from))
    }

    async fn find_submenu_by_title(
        &self,
        title: &str,
    ) -> Result<Option<SubmenuRecord>, RepoError> {
        let row = sqlx::query_as::<_, SubmenuRow>(&format!(
            "SELECT {SUBMENU_COLUMNS} FROM submenus WHERE title = $1"
        ))
        .bind(title)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SubmenuRecord::from))
    }
}

#[async_trait]
impl SubmenusWriteRepo for PostgresRepositories {
    async fn create_submenu(
        &self,
        params: CreateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let bumped = sqlx::query("UPDATE menus SET submenus_count = submenus_count + 1 WHERE id = $1")
            .bind(params.menu_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(bumped)?;

        let row = sqlx::query_as::<_, SubmenuRow>(&format!(
            r#"
            INSERT INTO submenus (menu_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING {SUBMENU_COLUMNS}
            "#
        ))
        .bind(params.menu_id)
        .bind(&params.title)
        .bind(&params.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(SubmenuRecord::from(row))
    }

    async fn update_submenu(
        &self,
        params: UpdateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError> {
        let row = sqlx::query_as::<_, SubmenuRow>(&format!(
            r#"
            UPDATE submenus
               SET title = $3,
                   description = $4
             WHERE menu_id = $1 AND id = $2
         RETURNING {SUBMENU_COLUMNS}
            "#
        ))
        .bind(params.menu_id)
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.description)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(SubmenuRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_submenu(&self, menu_id: i64, id: i64) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        lock_menu(&mut tx, menu_id).await?;

        let removed_dishes = sqlx::query_scalar::<_, i64>(
            "DELETE FROM submenus WHERE menu_id = $1 AND id = $2 RETURNING dishes_count",
        )
        .bind(menu_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        sqlx::query(
            r#"
            UPDATE menus
               SET submenus_count = submenus_count - 1,
                   dishes_count = dishes_count - $2
             WHERE id = $1
            "#,
        )
        .bind(menu_id)
        .bind(removed_dishes)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
