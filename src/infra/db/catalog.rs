use async_trait::async_trait;

use crate::{
    application::repos::{CatalogExportRepo, RepoError},
    domain::{entities::CatalogRow, price::Price},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CatalogJoinRow {
    menu_title: String,
    menu_description: Option<String>,
    menu_dishes_count: i64,
    submenu_title: String,
    submenu_description: Option<String>,
    submenu_dishes_count: i64,
    dish_title: String,
    dish_description: Option<String>,
    dish_price: Option<String>,
}

impl TryFrom<CatalogJoinRow> for CatalogRow {
    type Error = RepoError;

    fn try_from(row: CatalogJoinRow) -> Result<Self, Self::Error> {
        let dish_price = row
            .dish_price
            .as_deref()
            .map(Price::parse)
            .transpose()
            .map_err(RepoError::from_persistence)?;

        Ok(Self {
            menu_title: row.menu_title,
            menu_description: row.menu_description,
            menu_dishes_count: row.menu_dishes_count,
            submenu_title: row.submenu_title,
            submenu_description: row.submenu_description,
            submenu_dishes_count: row.submenu_dishes_count,
            dish_title: row.dish_title,
            dish_description: row.dish_description,
            dish_price,
        })
    }
}

#[async_trait]
impl CatalogExportRepo for PostgresRepositories {
    async fn list_catalog_rows(&self) -> Result<Vec<CatalogRow>, RepoError> {
        let rows = sqlx::query_as::<_, CatalogJoinRow>(
            r#"
            SELECT m.title         AS menu_title,
                   m.description   AS menu_description,
                   m.dishes_count  AS menu_dishes_count,
                   s.title         AS submenu_title,
                   s.description   AS submenu_description,
                   s.dishes_count  AS submenu_dishes_count,
                   d.title         AS dish_title,
                   d.description   AS dish_description,
                   d.price::text   AS dish_price
              FROM dishes d
              JOIN submenus s ON s.id = d.submenu_id
              JOIN menus m ON m.id = d.menu_id
             ORDER BY m.id, s.id, d.id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(CatalogRow::try_from).collect()
    }
}
