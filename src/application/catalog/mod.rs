//! Menu, submenu and dish services.
//!
//! Reads go through the snapshot cache and fall back to the repositories on a
//! miss. Writes always hit the repositories first; the cache is only touched
//! after the mutation has committed. Title uniqueness is checked against the
//! database, never against cached snapshots.

mod dishes;
mod menus;
mod snapshots;
mod submenus;
mod views;

use serde::Serialize;
use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::domain::price::Price;
use crate::domain::types::EntityKind;

pub use dishes::DishService;
pub use menus::MenuService;
pub use submenus::SubmenuService;
pub use views::{DishView, MenuView, SubmenuView};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} already exists")]
    Conflict(EntityKind),
    #[error("{0} not found")]
    NotFound(EntityKind),
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl CatalogError {
    /// Maps a write failure for `kind`. `missing` names the entity reported
    /// when the repository cannot find the row it was asked to touch.
    fn from_write(kind: EntityKind, missing: EntityKind, err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { .. } => CatalogError::Conflict(kind),
            RepoError::NotFound => CatalogError::NotFound(missing),
            other => CatalogError::Repo(other),
        }
    }
}

/// Title and description accepted by create and update of any level.
#[derive(Debug, Clone)]
pub struct EntityInput {
    pub title: String,
    pub description: Option<String>,
}

impl EntityInput {
    fn validated(self) -> Result<Self, CatalogError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title", "must not be empty").into());
        }
        Ok(Self {
            title: title.to_string(),
            description: self.description,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DishInput {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Price>,
}

/// Body returned by every successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteConfirmation {
    pub status: bool,
    pub message: String,
}

impl DeleteConfirmation {
    fn for_kind(kind: EntityKind) -> Self {
        Self {
            status: true,
            message: format!("The {kind} has been deleted"),
        }
    }
}

/// Parses a path segment as an entity id. Anything that is not a positive
/// integer cannot name an existing row and reads as `NotFound`.
pub fn parse_id(kind: EntityKind, raw: &str) -> Result<i64, CatalogError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(CatalogError::NotFound(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_non_positive_and_garbage() {
        assert_eq!(parse_id(EntityKind::Menu, "42").ok(), Some(42));
        for raw in ["0", "-3", "abc", "", "1.5"] {
            assert!(matches!(
                parse_id(EntityKind::Dish, raw),
                Err(CatalogError::NotFound(EntityKind::Dish))
            ));
        }
    }

    #[test]
    fn error_messages_name_the_entity_kind() {
        assert_eq!(
            CatalogError::Conflict(EntityKind::Submenu).to_string(),
            "submenu already exists"
        );
        assert_eq!(
            CatalogError::NotFound(EntityKind::Dish).to_string(),
            "dish not found"
        );
        assert_eq!(
            DeleteConfirmation::for_kind(EntityKind::Menu).message,
            "The menu has been deleted"
        );
    }

    #[test]
    fn blank_titles_are_rejected() {
        let input = EntityInput {
            title: "   ".into(),
            description: None,
        };
        assert!(matches!(input.validated(), Err(CatalogError::Invalid(_))));

        let input = EntityInput {
            title: "  Lunch ".into(),
            description: Some("d".into()),
        };
        assert_eq!(input.validated().unwrap().title, "Lunch");
    }
}
