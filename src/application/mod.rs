//! Catalog, export and seeding services on top of the repository traits.

pub mod catalog;
pub mod error;
pub mod export;
pub mod fixtures;
pub mod jobs;
pub mod repos;
