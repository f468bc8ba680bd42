//! Splits flattened catalog rows into one ordered list per level.
//!
//! Submenus and dishes remember the index of their parent entry, so the
//! layout never has to infer nesting from counters.

use std::collections::{HashMap, HashSet};

use crate::domain::entities::CatalogRow;
use crate::domain::price::Price;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MenuEntry {
    pub title: String,
    pub description: Option<String>,
    pub dishes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmenuEntry {
    /// Index into [`Partition::menus`].
    pub menu: usize,
    pub title: String,
    pub description: Option<String>,
    pub dishes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DishEntry {
    /// Index into [`Partition::submenus`].
    pub submenu: usize,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Price>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub menus: Vec<MenuEntry>,
    pub submenus: Vec<SubmenuEntry>,
    pub dishes: Vec<DishEntry>,
}

/// Deduplicates each level on its full tuple, parent included, keeping
/// first-seen order.
pub fn partition(rows: &[CatalogRow]) -> Partition {
    let mut out = Partition::default();
    let mut menus: HashMap<MenuEntry, usize> = HashMap::new();
    let mut submenus: HashMap<SubmenuEntry, usize> = HashMap::new();
    let mut dishes = HashSet::new();

    for row in rows {
        let menu = MenuEntry {
            title: row.menu_title.clone(),
            description: row.menu_description.clone(),
            dishes_count: row.menu_dishes_count,
        };
        let menu = *menus.entry(menu).or_insert_with_key(|entry| {
            out.menus.push(entry.clone());
            out.menus.len() - 1
        });

        let submenu = SubmenuEntry {
            menu,
            title: row.submenu_title.clone(),
            description: row.submenu_description.clone(),
            dishes_count: row.submenu_dishes_count,
        };
        let submenu = *submenus.entry(submenu).or_insert_with_key(|entry| {
            out.submenus.push(entry.clone());
            out.submenus.len() - 1
        });

        let dish = DishEntry {
            submenu,
            title: row.dish_title.clone(),
            description: row.dish_description.clone(),
            price: row.dish_price,
        };
        if dishes.insert(dish.clone()) {
            out.dishes.push(dish);
        }
    }

    out
}
