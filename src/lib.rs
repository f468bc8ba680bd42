//! Carte: a menu → submenu → dish catalog served over HTTP, with cached
//! reads, denormalized counters and background spreadsheet exports.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
