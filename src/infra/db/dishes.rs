use std::convert::TryFrom;

use async_trait::async_trait;

use crate::{
    application::repos::{
        CreateDishParams, DishesRepo, DishesWriteRepo, RepoError, UpdateDishParams,
    },
    domain::{entities::DishRecord, price::Price},
};

use super::{PostgresRepositories, expect_affected, lock_menu, map_sqlx_error};

const DISH_COLUMNS: &str = "id, menu_id, submenu_id, title, description, price::text AS price";

#[derive(sqlx::FromRow)]
struct DishRow {
    id: i64,
    menu_id: i64,
    submenu_id: i64,
    title: String,
    description: Option<String>,
    price: Option<String>,
}

impl TryFrom<DishRow> for DishRecord {
    type Error = RepoError;

    fn try_from(row: DishRow) -> Result<Self, Self::Error> {
        let price = row
            .price
            .as_deref()
            .map(Price::parse)
            .transpose()
            .map_err(|err| {
                RepoError::from_persistence(format!("dish {} has an unreadable price: {err}", row.id))
            })?;

        Ok(Self {
            id: row.id,
            menu_id: row.menu_id,
            submenu_id: row.submenu_id,
            title: row.title,
            description: row.description,
            price,
        })
    }
}

fn price_param(price: Option<Price>) -> Option<String> {
    price.map(|price| price.to_string())
}

#[async_trait]
impl DishesRepo for PostgresRepositories {
    async fn list_dishes(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<Vec<DishRecord>, RepoError> {
        let rows = sqlx::query_as::<_, DishRow>(&format!(
            "SELECT {DISH_COLUMNS} FROM dishes WHERE menu_id = $1 AND submenu_id = $2 ORDER BY id"
        ))
        .bind(menu_id)
        .bind(submenu_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(DishRecord::try_from).collect()
    }

    async fn find_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        id: i64,
    ) -> Result<Option<DishRecord>, RepoError> {
        let row = sqlx::query_as::<_, DishRow>(&format!(
            "SELECT {DISH_COLUMNS} FROM dishes WHERE menu_id = $1 AND submenu_id = $2 AND id = $3"
        ))
        .bind(menu_id)
        .bind(submenu_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(DishRecord::try_from).transpose()
    }

    async fn find_dish_by_title(&self, title: &str) -> Result<Option<DishRecord>, RepoError> {
        let row = sqlx::query_as::<_, DishRow>(&format!(
            "SELECT {DISH_COLUMNS} FROM dishes WHERE title = $1"
        ))
        .bind(title)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(DishRecord::try_from).transpose()
    }
}

#[async_trait]
impl DishesWriteRepo for PostgresRepositories {
    async fn create_dish(&self, params: CreateDishParams) -> Result<DishRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let menu = sqlx::query("UPDATE menus SET dishes_count = dishes_count + 1 WHERE id = $1")
            .bind(params.menu_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(menu)?;

        let submenu = sqlx::query(
            "UPDATE submenus SET dishes_count = dishes_count + 1 WHERE id = $1 AND menu_id = $2",
        )
        .bind(params.submenu_id)
        .bind(params.menu_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        expect_affected(submenu)?;

        let row = sqlx::query_as::<_, DishRow>(&format!(
            r#"
            INSERT INTO dishes (menu_id, submenu_id, title, description, price)
            VALUES ($1, $2, $3, $4, $5::numeric)
            RETURNING {DISH_COLUMNS}
            "#
        ))
        .bind(params.menu_id)
        .bind(params.submenu_id)
        .bind(&params.title)
        .bind(&params.description)
        .bind(price_param(params.price))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        DishRecord::try_from(row)
    }

    async fn update_dish(&self, params: UpdateDishParams) -> Result<DishRecord, RepoError> {
        let row = sqlx::query_as::<_, DishRow>(&format!(
            r#"
            UPDATE dishes
               SET title = $4,
                   description = $5,
                   price = COALESCE($6::numeric, price)
             WHERE menu_id = $1 AND submenu_id = $2 AND id = $3
         RETURNING {DISH_COLUMNS}
            "#
        ))
        .bind(params.menu_id)
        .bind(params.submenu_id)
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.description)
        .bind(price_param(params.price))
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(DishRecord::try_from)
            .transpose()?
            .ok_or(RepoError::NotFound)
    }

    async fn delete_dish(&self, menu_id: i64, submenu_id: i64, id: i64) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        lock_menu(&mut tx, menu_id).await?;

        let removed = sqlx::query(
            "DELETE FROM dishes WHERE menu_id = $1 AND submenu_id = $2 AND id = $3",
        )
        .bind(menu_id)
        .bind(submenu_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        expect_affected(removed)?;

        sqlx::query("UPDATE submenus SET dishes_count = dishes_count - 1 WHERE id = $1")
            .bind(submenu_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query("UPDATE menus SET dishes_count = dishes_count - 1 WHERE id = $1")
            .bind(menu_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
