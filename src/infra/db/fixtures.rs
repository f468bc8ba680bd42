use async_trait::async_trait;

use crate::application::{
    fixtures::FixtureMenu,
    repos::{FixturesRepo, RepoError},
};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl FixturesRepo for PostgresRepositories {
    async fn reset_catalog(&self, menus: &[FixtureMenu]) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("TRUNCATE dishes, submenus, menus RESTART IDENTITY CASCADE")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        for menu in menus {
            let menu_id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO menus (title, description, submenus_count, dishes_count)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(menu.title)
            .bind(menu.description)
            .bind(menu.submenus.len() as i64)
            .bind(menu.dishes_count())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            for submenu in &menu.submenus {
                let submenu_id = sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO submenus (menu_id, title, description, dishes_count)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(menu_id)
                .bind(submenu.title)
                .bind(submenu.description)
                .bind(submenu.dishes.len() as i64)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

                for dish in &submenu.dishes {
                    sqlx::query(
                        r#"
                        INSERT INTO dishes (menu_id, submenu_id, title, description, price)
                        VALUES ($1, $2, $3, $4, $5::numeric)
                        "#,
                    )
                    .bind(menu_id)
                    .bind(submenu_id)
                    .bind(dish.title)
                    .bind(dish.description)
                    .bind(dish.price.map(|price| price.to_string()))
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
                }
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
