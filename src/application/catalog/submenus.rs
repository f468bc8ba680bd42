use std::sync::Arc;

use tracing::info;

use crate::application::repos::{
    CreateSubmenuParams, MenusRepo, SubmenusRepo, SubmenusWriteRepo, UpdateSubmenuParams,
};
use crate::cache::{ResourcePath, SnapshotCache};
use crate::domain::types::EntityKind;

use super::snapshots;
use super::{CatalogError, DeleteConfirmation, EntityInput, SubmenuView};

const KIND: EntityKind = EntityKind::Submenu;

#[derive(Clone)]
pub struct SubmenuService {
    menus: Arc<dyn MenusRepo>,
    reader: Arc<dyn SubmenusRepo>,
    writer: Arc<dyn SubmenusWriteRepo>,
    cache: Arc<SnapshotCache>,
}

impl SubmenuService {
    pub fn new(
        menus: Arc<dyn MenusRepo>,
        reader: Arc<dyn SubmenusRepo>,
        writer: Arc<dyn SubmenusWriteRepo>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            menus,
            reader,
            writer,
            cache,
        }
    }

    /// Submenus of `menu_id`; empty when the menu does not exist.
    pub async fn list(&self, menu_id: i64) -> Result<Vec<SubmenuView>, CatalogError> {
        let records = self.reader.list_submenus(menu_id).await?;
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let path = ResourcePath::submenu(menu_id, record.id);
            let view = SubmenuView::from(record);
            snapshots::store(&self.cache, &path, &view).await;
            views.push(view);
        }
        Ok(views)
    }

    pub async fn read(&self, menu_id: i64, id: i64) -> Result<SubmenuView, CatalogError> {
        let path = ResourcePath::submenu(menu_id, id);
        let view = match snapshots::load::<SubmenuView>(&self.cache, &path).await {
            Some(view) => view,
            None => self
                .reader
                .find_submenu(menu_id, id)
                .await?
                .map(SubmenuView::from)
                .ok_or(CatalogError::NotFound(KIND))?,
        };
        snapshots::store(&self.cache, &path, &view).await;
        Ok(view)
    }

    /// Creates the submenu and drops the parent menu's cached subtree, whose
    /// `submenus_count` just changed.
    pub async fn create(
        &self,
        menu_id: i64,
        input: EntityInput,
    ) -> Result<SubmenuView, CatalogError> {
        let input = input.validated()?;
        if self
            .reader
            .find_submenu_by_title(&input.title)
            .await?
            .is_some()
        {
            return Err(CatalogError::Conflict(KIND));
        }
        if self.menus.find_menu(menu_id).await?.is_none() {
            return Err(CatalogError::NotFound(EntityKind::Menu));
        }

        let record = self
            .writer
            .create_submenu(CreateSubmenuParams {
                menu_id,
                title: input.title,
                description: input.description,
            })
            .await
            .map_err(|err| CatalogError::from_write(KIND, EntityKind::Menu, err))?;

        self.cache
            .invalidate_subtree(&ResourcePath::menu(menu_id))
            .await;
        info!(
            target = "carte::application::catalog",
            menu_id,
            submenu_id = record.id,
            "submenu created"
        );
        Ok(SubmenuView::from(record))
    }

    pub async fn update(
        &self,
        menu_id: i64,
        id: i64,
        input: EntityInput,
    ) -> Result<SubmenuView, CatalogError> {
        let input = input.validated()?;
        if self.reader.find_submenu(menu_id, id).await?.is_none() {
            return Err(CatalogError::NotFound(KIND));
        }
        if let Some(existing) = self.reader.find_submenu_by_title(&input.title).await?
            && existing.id != id
        {
            return Err(CatalogError::Conflict(KIND));
        }

        let record = self
            .writer
            .update_submenu(UpdateSubmenuParams {
                menu_id,
                id,
                title: input.title,
                description: input.description,
            })
            .await
            .map_err(|err| CatalogError::from_write(KIND, KIND, err))?;

        let view = SubmenuView::from(record);
        snapshots::replace(&self.cache, &ResourcePath::submenu(menu_id, id), &view).await;
        Ok(view)
    }

    /// Deletes the submenu and its dishes, then drops the whole cached subtree
    /// of the parent menu.
    pub async fn delete(&self, menu_id: i64, id: i64) -> Result<DeleteConfirmation, CatalogError> {
        if self.reader.find_submenu(menu_id, id).await?.is_none() {
            return Err(CatalogError::NotFound(KIND));
        }
        self.writer
            .delete_submenu(menu_id, id)
            .await
            .map_err(|err| CatalogError::from_write(KIND, KIND, err))?;

        self.cache
            .invalidate_subtree(&ResourcePath::menu(menu_id))
            .await;
        info!(
            target = "carte::application::catalog",
            menu_id,
            submenu_id = id,
            "submenu deleted"
        );
        Ok(DeleteConfirmation::for_kind(KIND))
    }
}
