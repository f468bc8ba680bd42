//! Password-gated demo catalog seeding.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::repos::{FixturesRepo, RepoError};
use crate::cache::{KeyPrefix, Namespace, SnapshotCache};
use crate::domain::price::Price;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureDish {
    pub title: &'static str,
    pub description: Option<&'static str>,
    pub price: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSubmenu {
    pub title: &'static str,
    pub description: Option<&'static str>,
    pub dishes: Vec<FixtureDish>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureMenu {
    pub title: &'static str,
    pub description: Option<&'static str>,
    pub submenus: Vec<FixtureSubmenu>,
}

impl FixtureMenu {
    pub fn dishes_count(&self) -> i64 {
        self.submenus.iter().map(|s| s.dishes.len() as i64).sum()
    }
}

fn dish(title: &'static str, description: &'static str, cents: u32) -> FixtureDish {
    FixtureDish {
        title,
        description: Some(description),
        price: Some(Price::from(cents)),
    }
}

/// The fixed catalog written by `POST /fill`.
pub fn catalog_fixture() -> Vec<FixtureMenu> {
    vec![
        FixtureMenu {
            title: "Main menu",
            description: Some("Served all day"),
            submenus: vec![
                FixtureSubmenu {
                    title: "Cold starters",
                    description: Some("Salads and platters"),
                    dishes: vec![
                        dish("Caesar salad", "Romaine, croutons, parmesan", 42_50),
                        dish("Cheese platter", "Five regional cheeses", 61_00),
                        dish("Beef carpaccio", "With capers and arugula", 58_90),
                    ],
                },
                FixtureSubmenu {
                    title: "Soups",
                    description: Some("Made fresh every morning"),
                    dishes: vec![
                        dish("Borscht", "Beetroot soup with sour cream", 31_00),
                        dish("Tom yum", "Spicy shrimp soup", 49_50),
                    ],
                },
                FixtureSubmenu {
                    title: "Grill",
                    description: None,
                    dishes: vec![
                        dish("Ribeye steak", "300 g, medium rare", 129_00),
                        dish("Chicken skewers", "With garlic sauce", 54_00),
                    ],
                },
            ],
        },
        FixtureMenu {
            title: "Bar menu",
            description: Some("Drinks and desserts"),
            submenus: vec![
                FixtureSubmenu {
                    title: "Hot drinks",
                    description: Some("Coffee and tea"),
                    dishes: vec![
                        dish("Espresso", "Double shot", 9_00),
                        dish("Green tea", "Sencha, 500 ml pot", 12_50),
                    ],
                },
                FixtureSubmenu {
                    title: "Desserts",
                    description: None,
                    dishes: vec![FixtureDish {
                        title: "Seasonal sorbet",
                        description: None,
                        price: None,
                    }],
                },
            ],
        },
    ]
}

#[derive(Debug, Error)]
pub enum FillError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Seeded,
    Rejected,
}

/// Replaces the whole catalog with [`catalog_fixture`] when the caller knows
/// the configured password.
#[derive(Clone)]
pub struct FillService {
    repo: Arc<dyn FixturesRepo>,
    cache: Arc<SnapshotCache>,
    password: Option<String>,
}

impl FillService {
    pub fn new(
        repo: Arc<dyn FixturesRepo>,
        cache: Arc<SnapshotCache>,
        password: Option<String>,
    ) -> Self {
        Self {
            repo,
            cache,
            password,
        }
    }

    pub async fn fill(&self, password: &str) -> Result<FillOutcome, FillError> {
        if !self.password_matches(password) {
            warn!(
                target = "carte::application::fill",
                "catalog fill rejected: incorrect password"
            );
            return Ok(FillOutcome::Rejected);
        }

        let fixture = catalog_fixture();
        self.repo.reset_catalog(&fixture).await?;
        self.cache
            .delete_prefix(&KeyPrefix::namespace(Namespace::Catalog))
            .await;

        info!(
            target = "carte::application::fill",
            menus = fixture.len(),
            "catalog replaced with fixture data"
        );
        Ok(FillOutcome::Seeded)
    }

    fn password_matches(&self, candidate: &str) -> bool {
        match self.password.as_deref() {
            Some(expected) if !expected.is_empty() => {
                expected.as_bytes().ct_eq(candidate.as_bytes()).into()
            }
            _ => false,
        }
    }
}
