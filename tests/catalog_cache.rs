//! Cache protocol and counter maintenance, driven through the services
//! against Postgres.

mod support;

use std::sync::Arc;

use sqlx::PgPool;

use carte::application::catalog::{CatalogError, DishInput, EntityInput};
use carte::application::fixtures::FillOutcome;
use carte::cache::{CacheConfig, SnapshotCache};
use carte::domain::price::Price;
use carte::domain::types::EntityKind;

use support::{FILL_PASSWORD, TestApp};

fn entity(title: &str) -> EntityInput {
    EntityInput {
        title: title.to_string(),
        description: Some(format!("{title} description")),
    }
}

fn dish(title: &str, price: &str) -> DishInput {
    DishInput {
        title: title.to_string(),
        description: None,
        price: Some(Price::parse(price).expect("valid price")),
    }
}

fn id(raw: &str) -> i64 {
    raw.parse().expect("numeric id")
}

#[sqlx::test(migrations = "./migrations")]
async fn second_read_is_served_from_cache(pool: PgPool) {
    let app = TestApp::new(pool);
    let menu = app.state.menus.create(entity("Lunch")).await.unwrap();
    let menu_id = id(&menu.id);

    let first = app.state.menus.read(menu_id).await.unwrap();
    app.retitle_behind_cache("menus", menu_id, "Changed").await;
    let second = app.state.menus.read(menu_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.title, "Lunch");
}

#[sqlx::test(migrations = "./migrations")]
async fn listing_warms_the_cache_for_each_item(pool: PgPool) {
    let app = TestApp::new(pool);
    let a = app.state.menus.create(entity("A")).await.unwrap();
    let b = app.state.menus.create(entity("B")).await.unwrap();

    let listed = app.state.menus.list().await.unwrap();
    assert_eq!(listed.len(), 2);

    app.retitle_behind_cache("menus", id(&a.id), "A2").await;
    app.retitle_behind_cache("menus", id(&b.id), "B2").await;
    assert_eq!(app.state.menus.read(id(&a.id)).await.unwrap().title, "A");
    assert_eq!(app.state.menus.read(id(&b.id)).await.unwrap().title, "B");
}

#[sqlx::test(migrations = "./migrations")]
async fn update_is_visible_on_the_next_read(pool: PgPool) {
    let app = TestApp::new(pool);
    let menu = app.state.menus.create(entity("Lunch")).await.unwrap();
    let menu_id = id(&menu.id);
    app.state.menus.read(menu_id).await.unwrap();

    app.state
        .menus
        .update(
            menu_id,
            EntityInput {
                title: "Brunch".into(),
                description: None,
            },
        )
        .await
        .unwrap();

    let read = app.state.menus.read(menu_id).await.unwrap();
    assert_eq!(read.title, "Brunch");
    assert_eq!(read.description, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn child_writes_refresh_cached_ancestor_counters(pool: PgPool) {
    let app = TestApp::new(pool);
    let menu = app.state.menus.create(entity("Dinner")).await.unwrap();
    let menu_id = id(&menu.id);
    assert_eq!(app.state.menus.read(menu_id).await.unwrap().dishes_count, 0);

    let submenu = app
        .state
        .submenus
        .create(menu_id, entity("Mains"))
        .await
        .unwrap();
    let submenu_id = id(&submenu.id);
    for (title, price) in [("Steak", "25.00"), ("Risotto", "14.5"), ("Salmon", "19.90")] {
        app.state
            .dishes
            .create(menu_id, submenu_id, dish(title, price))
            .await
            .unwrap();
    }

    let menu = app.state.menus.read(menu_id).await.unwrap();
    assert_eq!(menu.submenus_count, 1);
    assert_eq!(menu.dishes_count, 3);
    let submenu = app.state.submenus.read(menu_id, submenu_id).await.unwrap();
    assert_eq!(submenu.dishes_count, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_submenu_removes_its_dishes_from_the_menu_counters(pool: PgPool) {
    let app = TestApp::new(pool);
    let menu_id = id(&app.state.menus.create(entity("Dinner")).await.unwrap().id);
    let keep = id(&app
        .state
        .submenus
        .create(menu_id, entity("Starters"))
        .await
        .unwrap()
        .id);
    let drop = id(&app
        .state
        .submenus
        .create(menu_id, entity("Mains"))
        .await
        .unwrap()
        .id);
    app.state
        .dishes
        .create(menu_id, keep, dish("Olives", "3.00"))
        .await
        .unwrap();
    for title in ["Steak", "Risotto"] {
        app.state
            .dishes
            .create(menu_id, drop, dish(title, "10.00"))
            .await
            .unwrap();
    }
    assert_eq!(app.state.menus.read(menu_id).await.unwrap().dishes_count, 3);

    let confirmation = app.state.submenus.delete(menu_id, drop).await.unwrap();
    assert_eq!(confirmation.message, "The submenu has been deleted");

    let menu = app.state.menus.read(menu_id).await.unwrap();
    assert_eq!(menu.submenus_count, 1);
    assert_eq!(menu.dishes_count, 1);
    assert!(matches!(
        app.state.submenus.read(menu_id, drop).await,
        Err(CatalogError::NotFound(EntityKind::Submenu))
    ));
    assert_eq!(app.count_rows("dishes").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_dish_decrements_both_ancestors(pool: PgPool) {
    let app = TestApp::new(pool);
    let menu_id = id(&app.state.menus.create(entity("Dinner")).await.unwrap().id);
    let submenu_id = id(&app
        .state
        .submenus
        .create(menu_id, entity("Mains"))
        .await
        .unwrap()
        .id);
    let dish_id = id(&app
        .state
        .dishes
        .create(menu_id, submenu_id, dish("Steak", "25.00"))
        .await
        .unwrap()
        .id);
    app.state
        .dishes
        .read(menu_id, submenu_id, dish_id)
        .await
        .unwrap();

    app.state
        .dishes
        .delete(menu_id, submenu_id, dish_id)
        .await
        .unwrap();

    assert_eq!(app.state.menus.read(menu_id).await.unwrap().dishes_count, 0);
    assert_eq!(
        app.state
            .submenus
            .read(menu_id, submenu_id)
            .await
            .unwrap()
            .dishes_count,
        0
    );
    assert!(matches!(
        app.state.dishes.read(menu_id, submenu_id, dish_id).await,
        Err(CatalogError::NotFound(EntityKind::Dish))
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn writes_under_one_menu_leave_other_menus_cached(pool: PgPool) {
    let app = TestApp::new(pool);
    let busy = id(&app.state.menus.create(entity("Busy")).await.unwrap().id);
    let quiet = id(&app.state.menus.create(entity("Quiet")).await.unwrap().id);
    app.state.menus.read(quiet).await.unwrap();

    let submenu = app
        .state
        .submenus
        .create(busy, entity("Specials"))
        .await
        .unwrap();
    app.state
        .submenus
        .delete(busy, id(&submenu.id))
        .await
        .unwrap();
    app.retitle_behind_cache("menus", quiet, "Renamed").await;

    assert_eq!(app.state.menus.read(quiet).await.unwrap().title, "Quiet");
    assert_eq!(app.state.menus.read(busy).await.unwrap().submenus_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn titles_are_unique_across_parents(pool: PgPool) {
    let app = TestApp::new(pool);
    let first = id(&app.state.menus.create(entity("First")).await.unwrap().id);
    let second = id(&app.state.menus.create(entity("Second")).await.unwrap().id);
    app.state
        .submenus
        .create(first, entity("Drinks"))
        .await
        .unwrap();

    assert!(matches!(
        app.state.submenus.create(second, entity("Drinks")).await,
        Err(CatalogError::Conflict(EntityKind::Submenu))
    ));
    assert!(matches!(
        app.state.menus.create(entity("First")).await,
        Err(CatalogError::Conflict(EntityKind::Menu))
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn renaming_onto_another_title_conflicts_but_keeping_it_does_not(pool: PgPool) {
    let app = TestApp::new(pool);
    let a = id(&app.state.menus.create(entity("A")).await.unwrap().id);
    app.state.menus.create(entity("B")).await.unwrap();

    assert!(matches!(
        app.state.menus.update(a, entity("B")).await,
        Err(CatalogError::Conflict(EntityKind::Menu))
    ));
    let same = app.state.menus.update(a, entity("A")).await.unwrap();
    assert_eq!(same.description.as_deref(), Some("A description"));
}

#[sqlx::test(migrations = "./migrations")]
async fn missing_parents_and_ids_are_not_found(pool: PgPool) {
    let app = TestApp::new(pool);

    assert!(matches!(
        app.state.menus.read(404).await,
        Err(CatalogError::NotFound(EntityKind::Menu))
    ));
    assert!(matches!(
        app.state.submenus.create(404, entity("Orphan")).await,
        Err(CatalogError::NotFound(EntityKind::Menu))
    ));
    assert!(matches!(
        app.state.dishes.create(404, 405, dish("Orphan", "1.00")).await,
        Err(CatalogError::NotFound(EntityKind::Submenu))
    ));
    assert!(matches!(
        app.state.menus.delete(404).await,
        Err(CatalogError::NotFound(EntityKind::Menu))
    ));
    assert!(app.state.submenus.list(404).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn dish_update_keeps_price_unless_given(pool: PgPool) {
    let app = TestApp::new(pool);
    let menu_id = id(&app.state.menus.create(entity("Dinner")).await.unwrap().id);
    let submenu_id = id(&app
        .state
        .submenus
        .create(menu_id, entity("Mains"))
        .await
        .unwrap()
        .id);
    let dish_id = id(&app
        .state
        .dishes
        .create(menu_id, submenu_id, dish("Steak", "25"))
        .await
        .unwrap()
        .id);

    let renamed = app
        .state
        .dishes
        .update(
            menu_id,
            submenu_id,
            dish_id,
            DishInput {
                title: "Ribeye".into(),
                description: Some("Dry aged".into()),
                price: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.price.map(|p| p.to_string()).as_deref(), Some("25.00"));

    let repriced = app
        .state
        .dishes
        .update(menu_id, submenu_id, dish_id, dish("Ribeye", "27.50"))
        .await
        .unwrap();
    assert_eq!(repriced.price.map(|p| p.to_string()).as_deref(), Some("27.50"));

    let read = app
        .state
        .dishes
        .read(menu_id, submenu_id, dish_id)
        .await
        .unwrap();
    assert_eq!(read, repriced);
}

#[sqlx::test(migrations = "./migrations")]
async fn stopped_cache_falls_back_to_the_repositories(pool: PgPool) {
    let cache = Arc::new(SnapshotCache::in_memory(&CacheConfig::default()));
    let app = TestApp::with_cache(pool, cache.clone());
    let menu_id = id(&app.state.menus.create(entity("Lunch")).await.unwrap().id);
    app.state.menus.read(menu_id).await.unwrap();
    cache.stop();

    app.retitle_behind_cache("menus", menu_id, "Dinner").await;
    assert_eq!(app.state.menus.read(menu_id).await.unwrap().title, "Dinner");
    app.retitle_behind_cache("menus", menu_id, "Supper").await;
    assert_eq!(app.state.menus.read(menu_id).await.unwrap().title, "Supper");
}

#[sqlx::test(migrations = "./migrations")]
async fn fill_replaces_the_catalog_and_clears_cached_snapshots(pool: PgPool) {
    let app = TestApp::new(pool);
    let temp = id(&app.state.menus.create(entity("Temporary")).await.unwrap().id);
    app.state.menus.read(temp).await.unwrap();

    assert_eq!(
        app.state.fill.fill("guess").await.unwrap(),
        FillOutcome::Rejected
    );
    assert_eq!(app.state.menus.read(temp).await.unwrap().title, "Temporary");

    assert_eq!(
        app.state.fill.fill(FILL_PASSWORD).await.unwrap(),
        FillOutcome::Seeded
    );

    let menus = app.state.menus.list().await.unwrap();
    let titles: Vec<_> = menus.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, ["Main menu", "Bar menu"]);
    assert_eq!(menus[0].submenus_count, 3);
    assert_eq!(menus[0].dishes_count, 7);

    let reseeded = app.state.menus.read(temp).await.unwrap();
    assert_eq!(reseeded.title, "Main menu");
}
