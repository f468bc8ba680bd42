//! API handlers grouped by resource.
//!
//! Error conversions shared by every resource live here.

mod dishes;
mod exports;
mod fill;
mod menus;
mod submenus;

pub use dishes::*;
pub use exports::*;
pub use fill::*;
pub use menus::*;
pub use submenus::*;

use axum::http::StatusCode;

use crate::application::catalog::CatalogError;
use crate::application::export::ExportError;
use crate::application::fixtures::FillError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

use super::error::ApiError;

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Timeout => {
            ApiError::with_source(StatusCode::SERVICE_UNAVAILABLE, "database timeout", &err)
        }
        other => ApiError::with_source(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error",
            &other,
        ),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    ApiError::unprocessable(err.to_string())
}

pub(crate) fn catalog_to_api(err: CatalogError) -> ApiError {
    match err {
        CatalogError::Conflict(_) => ApiError::new(StatusCode::BAD_REQUEST, err.to_string()),
        CatalogError::NotFound(_) => ApiError::not_found(err.to_string()),
        CatalogError::Invalid(domain) => domain_to_api(domain),
        CatalogError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn export_to_api(err: ExportError) -> ApiError {
    match err {
        ExportError::QueueUnavailable(_) => {
            ApiError::with_source(StatusCode::SERVICE_UNAVAILABLE, err.to_string(), &err)
        }
        ExportError::ArtifactMissing => ApiError::not_found(err.to_string()),
        ExportError::Repo(repo) => repo_to_api(repo),
        other => ApiError::with_source(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error",
            &other,
        ),
    }
}

pub(crate) fn fill_to_api(err: FillError) -> ApiError {
    match err {
        FillError::Repo(repo) => repo_to_api(repo),
    }
}
