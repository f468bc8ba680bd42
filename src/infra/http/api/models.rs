use serde::{Deserialize, Serialize};

use crate::application::catalog::{DishInput, EntityInput};
use crate::domain::error::DomainError;
use crate::domain::price::Price;
use crate::domain::types::ExportStatus;

/// Create and update body for menus and submenus.
#[derive(Debug, Deserialize, Serialize)]
pub struct EntityRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<EntityRequest> for EntityInput {
    fn from(request: EntityRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DishRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Decimal string such as `"12.50"`.
    #[serde(default)]
    pub price: Option<String>,
}

impl TryFrom<DishRequest> for DishInput {
    type Error = DomainError;

    fn try_from(request: DishRequest) -> Result<Self, Self::Error> {
        let price = request.price.as_deref().map(Price::parse).transpose()?;
        Ok(Self {
            title: request.title,
            description: request.description,
            price,
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FillRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub task_id: String,
}

/// `{status, message}` acknowledgement used by fill and export submission.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
        }
    }
}

/// Poll answer for an export that has no file to hand out yet.
#[derive(Debug, Serialize)]
pub struct ExportStatusResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl ExportStatusResponse {
    pub fn unrequested() -> Self {
        Self {
            status: "Unrequested",
            message: "Please request the file first",
        }
    }

    pub fn pending(status: ExportStatus) -> Self {
        Self {
            status: status.as_str(),
            message: "Please wait",
        }
    }
}
