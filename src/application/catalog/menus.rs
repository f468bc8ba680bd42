use std::sync::Arc;

use tracing::info;

use crate::application::repos::{CreateMenuParams, MenusRepo, MenusWriteRepo, UpdateMenuParams};
use crate::cache::{ResourcePath, SnapshotCache};
use crate::domain::types::EntityKind;

use super::snapshots;
use super::{CatalogError, DeleteConfirmation, EntityInput, MenuView};

const KIND: EntityKind = EntityKind::Menu;

#[derive(Clone)]
pub struct MenuService {
    reader: Arc<dyn MenusRepo>,
    writer: Arc<dyn MenusWriteRepo>,
    cache: Arc<SnapshotCache>,
}

impl MenuService {
    pub fn new(
        reader: Arc<dyn MenusRepo>,
        writer: Arc<dyn MenusWriteRepo>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
        }
    }

    /// Every menu, caching each one individually.
    pub async fn list(&self) -> Result<Vec<MenuView>, CatalogError> {
        let records = self.reader.list_menus().await?;
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let path = ResourcePath::menu(record.id);
            let view = MenuView::from(record);
            snapshots::store(&self.cache, &path, &view).await;
            views.push(view);
        }
        Ok(views)
    }

    pub async fn read(&self, id: i64) -> Result<MenuView, CatalogError> {
        let path = ResourcePath::menu(id);
        let view = match snapshots::load::<MenuView>(&self.cache, &path).await {
            Some(view) => view,
            None => self
                .reader
                .find_menu(id)
                .await?
                .map(MenuView::from)
                .ok_or(CatalogError::NotFound(KIND))?,
        };
        snapshots::store(&self.cache, &path, &view).await;
        Ok(view)
    }

    pub async fn create(&self, input: EntityInput) -> Result<MenuView, CatalogError> {
        let input = input.validated()?;
        if self.reader.find_menu_by_title(&input.title).await?.is_some() {
            return Err(CatalogError::Conflict(KIND));
        }

        let record = self
            .writer
            .create_menu(CreateMenuParams {
                title: input.title,
                description: input.description,
            })
            .await
            .map_err(|err| CatalogError::from_write(KIND, KIND, err))?;

        info!(target = "carte::application::catalog", menu_id = record.id, "menu created");
        Ok(MenuView::from(record))
    }

    pub async fn update(&self, id: i64, input: EntityInput) -> Result<MenuView, CatalogError> {
        let input = input.validated()?;
        if self.reader.find_menu(id).await?.is_none() {
            return Err(CatalogError::NotFound(KIND));
        }
        if let Some(existing) = self.reader.find_menu_by_title(&input.title).await?
            && existing.id != id
        {
            return Err(CatalogError::Conflict(KIND));
        }

        let record = self
            .writer
            .update_menu(UpdateMenuParams {
                id,
                title: input.title,
                description: input.description,
            })
            .await
            .map_err(|err| CatalogError::from_write(KIND, KIND, err))?;

        let view = MenuView::from(record);
        snapshots::replace(&self.cache, &ResourcePath::menu(id), &view).await;
        Ok(view)
    }

    /// Deletes the menu with everything below it and drops its cached subtree.
    pub async fn delete(&self, id: i64) -> Result<DeleteConfirmation, CatalogError> {
        if self.reader.find_menu(id).await?.is_none() {
            return Err(CatalogError::NotFound(KIND));
        }
        self.writer
            .delete_menu(id)
            .await
            .map_err(|err| CatalogError::from_write(KIND, KIND, err))?;

        self.cache.invalidate_subtree(&ResourcePath::menu(id)).await;
        info!(target = "carte::application::catalog", menu_id = id, "menu deleted");
        Ok(DeleteConfirmation::for_kind(KIND))
    }
}
