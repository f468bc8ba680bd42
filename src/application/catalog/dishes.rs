use std::sync::Arc;

use tracing::info;

use crate::application::repos::{
    CreateDishParams, DishesRepo, DishesWriteRepo, SubmenusRepo, UpdateDishParams,
};
use crate::cache::{ResourcePath, SnapshotCache};
use crate::domain::types::EntityKind;

use super::snapshots;
use super::{CatalogError, DeleteConfirmation, DishInput, DishView, EntityInput};

const KIND: EntityKind = EntityKind::Dish;

#[derive(Clone)]
pub struct DishService {
    submenus: Arc<dyn SubmenusRepo>,
    reader: Arc<dyn DishesRepo>,
    writer: Arc<dyn DishesWriteRepo>,
    cache: Arc<SnapshotCache>,
}

impl DishService {
    pub fn new(
        submenus: Arc<dyn SubmenusRepo>,
        reader: Arc<dyn DishesRepo>,
        writer: Arc<dyn DishesWriteRepo>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            submenus,
            reader,
            writer,
            cache,
        }
    }

    pub async fn list(&self, menu_id: i64, submenu_id: i64) -> Result<Vec<DishView>, CatalogError> {
        let records = self.reader.list_dishes(menu_id, submenu_id).await?;
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let path = ResourcePath::dish(menu_id, submenu_id, record.id);
            let view = DishView::from(record);
            snapshots::store(&self.cache, &path, &view).await;
            views.push(view);
        }
        Ok(views)
    }

    pub async fn read(
        &self,
        menu_id: i64,
        submenu_id: i64,
        id: i64,
    ) -> Result<DishView, CatalogError> {
        let path = ResourcePath::dish(menu_id, submenu_id, id);
        let view = match snapshots::load::<DishView>(&self.cache, &path).await {
            Some(view) => view,
            None => self
                .reader
                .find_dish(menu_id, submenu_id, id)
                .await?
                .map(DishView::from)
                .ok_or(CatalogError::NotFound(KIND))?,
        };
        snapshots::store(&self.cache, &path, &view).await;
        Ok(view)
    }

    /// Creates the dish under `submenu_id`, bumping both ancestor counters, and
    /// drops the menu's cached subtree.
    pub async fn create(
        &self,
        menu_id: i64,
        submenu_id: i64,
        input: DishInput,
    ) -> Result<DishView, CatalogError> {
        let DishInput {
            title,
            description,
            price,
        } = input;
        let EntityInput { title, description } = EntityInput { title, description }.validated()?;

        if self.reader.find_dish_by_title(&title).await?.is_some() {
            return Err(CatalogError::Conflict(KIND));
        }
        if self
            .submenus
            .find_submenu(menu_id, submenu_id)
            .await?
            .is_none()
        {
            return Err(CatalogError::NotFound(EntityKind::Submenu));
        }

        let record = self
            .writer
            .create_dish(CreateDishParams {
                menu_id,
                submenu_id,
                title,
                description,
                price,
            })
            .await
            .map_err(|err| CatalogError::from_write(KIND, EntityKind::Submenu, err))?;

        self.cache
            .invalidate_subtree(&ResourcePath::menu(menu_id))
            .await;
        info!(
            target = "carte::application::catalog",
            menu_id,
            submenu_id,
            dish_id = record.id,
            "dish created"
        );
        Ok(DishView::from(record))
    }

    /// Replaces title and description; the price only when one is given.
    pub async fn update(
        &self,
        menu_id: i64,
        submenu_id: i64,
        id: i64,
        input: DishInput,
    ) -> Result<DishView, CatalogError> {
        let DishInput {
            title,
            description,
            price,
        } = input;
        let EntityInput { title, description } = EntityInput { title, description }.validated()?;

        if self
            .reader
            .find_dish(menu_id, submenu_id, id)
            .await?
            .is_none()
        {
            return Err(CatalogError::NotFound(KIND));
        }
        if let Some(existing) = self.reader.find_dish_by_title(&title).await?
            && existing.id != id
        {
            return Err(CatalogError::Conflict(KIND));
        }

        let record = self
            .writer
            .update_dish(UpdateDishParams {
                menu_id,
                submenu_id,
                id,
                title,
                description,
                price,
            })
            .await
            .map_err(|err| CatalogError::from_write(KIND, KIND, err))?;

        let view = DishView::from(record);
        snapshots::replace(
            &self.cache,
            &ResourcePath::dish(menu_id, submenu_id, id),
            &view,
        )
        .await;
        Ok(view)
    }

    pub async fn delete(
        &self,
        menu_id: i64,
        submenu_id: i64,
        id: i64,
    ) -> Result<DeleteConfirmation, CatalogError> {
        if self
            .reader
            .find_dish(menu_id, submenu_id, id)
            .await?
            .is_none()
        {
            return Err(CatalogError::NotFound(KIND));
        }
        self.writer
            .delete_dish(menu_id, submenu_id, id)
            .await
            .map_err(|err| CatalogError::from_write(KIND, KIND, err))?;

        self.cache
            .invalidate_subtree(&ResourcePath::menu(menu_id))
            .await;
        info!(
            target = "carte::application::catalog",
            menu_id,
            submenu_id,
            dish_id = id,
            "dish deleted"
        );
        Ok(DeleteConfirmation::for_kind(KIND))
    }
}
