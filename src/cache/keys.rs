//! Cache key definitions.
//!
//! Entity snapshots are keyed by the resource path they are served from, under
//! the `catalog:` namespace. Export bookkeeping lives under `export-jobs:` so a
//! catalog-wide prefix delete can never drop a pending export.

use std::fmt;

/// Route prefix shared by every catalog resource.
pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Catalog,
    ExportJobs,
}

impl Namespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Catalog => "catalog:",
            Namespace::ExportJobs => "export-jobs:",
        }
    }
}

/// Hierarchical URL of a catalog resource, e.g. `/api/v1/menus/1/submenus/2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn menu(menu_id: i64) -> Self {
        Self(format!("{API_PREFIX}/menus/{menu_id}"))
    }

    pub fn submenu(menu_id: i64, submenu_id: i64) -> Self {
        Self(format!("{API_PREFIX}/menus/{menu_id}/submenus/{submenu_id}"))
    }

    pub fn dish(menu_id: i64, submenu_id: i64, dish_id: i64) -> Self {
        Self(format!(
            "{API_PREFIX}/menus/{menu_id}/submenus/{submenu_id}/dishes/{dish_id}"
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully-qualified key as stored in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn snapshot(path: &ResourcePath) -> Self {
        Self(format!("{}{}", Namespace::Catalog.prefix(), path.as_str()))
    }

    pub fn export_job(job_id: &str) -> Self {
        Self(format!("{}{job_id}", Namespace::ExportJobs.prefix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Literal key prefix used for bulk invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    pub fn namespace(namespace: Namespace) -> Self {
        Self(namespace.prefix().to_string())
    }

    /// Every snapshot nested strictly below `path`.
    pub fn subtree(path: &ResourcePath) -> Self {
        Self(format!("{}{}/", Namespace::Catalog.prefix(), path.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(&self.0)
    }

    /// Redis `MATCH` pattern selecting every key with this prefix.
    pub fn glob_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.0.len() + 1);
        for ch in self.0.chars() {
            if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('*');
        pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_paths_follow_routes() {
        assert_eq!(ResourcePath::menu(1).as_str(), "/api/v1/menus/1");
        assert_eq!(
            ResourcePath::submenu(1, 2).as_str(),
            "/api/v1/menus/1/submenus/2"
        );
        assert_eq!(
            ResourcePath::dish(1, 2, 3).as_str(),
            "/api/v1/menus/1/submenus/2/dishes/3"
        );
    }

    #[test]
    fn subtree_prefix_does_not_leak_into_sibling_ids() {
        let prefix = KeyPrefix::subtree(&ResourcePath::menu(1));
        assert!(prefix.matches(CacheKey::snapshot(&ResourcePath::submenu(1, 4)).as_str()));
        assert!(prefix.matches(CacheKey::snapshot(&ResourcePath::dish(1, 4, 9)).as_str()));
        assert!(!prefix.matches(CacheKey::snapshot(&ResourcePath::menu(1)).as_str()));
        assert!(!prefix.matches(CacheKey::snapshot(&ResourcePath::menu(12)).as_str()));
        assert!(!prefix.matches(CacheKey::snapshot(&ResourcePath::submenu(12, 1)).as_str()));
    }

    #[test]
    fn namespaces_are_disjoint() {
        let catalog = KeyPrefix::namespace(Namespace::Catalog);
        assert!(!catalog.matches(CacheKey::export_job("01HZX").as_str()));
        assert!(catalog.matches(CacheKey::snapshot(&ResourcePath::menu(3)).as_str()));
    }

    #[test]
    fn glob_pattern_escapes_wildcards() {
        let prefix = KeyPrefix::subtree(&ResourcePath::menu(5));
        assert_eq!(prefix.glob_pattern(), "catalog:/api/v1/menus/5/*");
        assert_eq!(
            KeyPrefix(String::from("a*b?[c]")).glob_pattern(),
            "a\\*b\\?\\[c\\]*"
        );
    }
}
