//! HTTP surface exercised through the router against Postgres.

mod support;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

use carte::infra::http::build_router;
use carte::infra::xlsx::XLSX_MIME;

use support::{FILL_PASSWORD, TestApp};

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("router response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec();
    Reply {
        status,
        headers,
        body,
    }
}

fn router(app: &TestApp) -> Router {
    build_router(app.state.clone(), None)
}

fn id_of(reply: &Reply) -> String {
    reply.json()["id"].as_str().expect("string id").to_string()
}

#[sqlx::test(migrations = "./migrations")]
async fn create_nest_and_delete_keeps_counters_consistent(pool: PgPool) {
    let app = TestApp::new(pool);
    let router = router(&app);

    let menu = send(
        &router,
        "POST",
        "/api/v1/menus",
        Some(json!({"title": "A", "description": "d"})),
    )
    .await;
    assert_eq!(menu.status, StatusCode::CREATED);
    let body = menu.json();
    assert_eq!(body["title"], "A");
    assert_eq!(body["description"], "d");
    assert_eq!(body["submenus_count"], 0);
    assert_eq!(body["dishes_count"], 0);
    let menu_id = id_of(&menu);

    let submenu = send(
        &router,
        "POST",
        &format!("/api/v1/menus/{menu_id}/submenus"),
        Some(json!({"title": "B"})),
    )
    .await;
    assert_eq!(submenu.status, StatusCode::CREATED);
    assert_eq!(submenu.json()["dishes_count"], 0);
    let submenu_id = id_of(&submenu);

    let dish = send(
        &router,
        "POST",
        &format!("/api/v1/menus/{menu_id}/submenus/{submenu_id}/dishes"),
        Some(json!({"title": "C", "price": "9.99"})),
    )
    .await;
    assert_eq!(dish.status, StatusCode::CREATED);
    assert_eq!(dish.json()["price"], "9.99");

    let menu = send(&router, "GET", &format!("/api/v1/menus/{menu_id}"), None).await;
    assert_eq!(menu.status, StatusCode::OK);
    assert_eq!(menu.json()["dishes_count"], 1);
    assert_eq!(menu.json()["submenus_count"], 1);

    let deleted = send(
        &router,
        "DELETE",
        &format!("/api/v1/menus/{menu_id}/submenus/{submenu_id}"),
        None,
    )
    .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(
        deleted.json(),
        json!({"status": true, "message": "The submenu has been deleted"})
    );

    let menu = send(&router, "GET", &format!("/api/v1/menus/{menu_id}"), None).await;
    assert_eq!(menu.json()["dishes_count"], 0);
    assert_eq!(menu.json()["submenus_count"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn errors_use_fixed_detail_messages(pool: PgPool) {
    let app = TestApp::new(pool);
    let router = router(&app);

    let missing = send(&router, "GET", "/api/v1/menus/999", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json(), json!({"detail": "menu not found"}));

    let garbage = send(&router, "GET", "/api/v1/menus/not-a-number", None).await;
    assert_eq!(garbage.status, StatusCode::NOT_FOUND);
    assert_eq!(garbage.json(), json!({"detail": "menu not found"}));

    send(&router, "POST", "/api/v1/menus", Some(json!({"title": "Dup"}))).await;
    let duplicate = send(&router, "POST", "/api/v1/menus", Some(json!({"title": "Dup"}))).await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.json(), json!({"detail": "menu already exists"}));

    let missing_submenu = send(&router, "GET", "/api/v1/menus/1/submenus/77", None).await;
    assert_eq!(missing_submenu.status, StatusCode::NOT_FOUND);
    assert_eq!(missing_submenu.json(), json!({"detail": "submenu not found"}));

    let missing_dish = send(
        &router,
        "DELETE",
        "/api/v1/menus/1/submenus/77/dishes/5",
        None,
    )
    .await;
    assert_eq!(missing_dish.status, StatusCode::NOT_FOUND);
    assert_eq!(missing_dish.json(), json!({"detail": "dish not found"}));
}

#[sqlx::test(migrations = "./migrations")]
async fn invalid_bodies_are_unprocessable(pool: PgPool) {
    let app = TestApp::new(pool);
    let router = router(&app);

    let blank = send(&router, "POST", "/api/v1/menus", Some(json!({"title": "  "}))).await;
    assert_eq!(blank.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(blank.json()["detail"].is_string());

    let untitled = send(
        &router,
        "POST",
        "/api/v1/menus",
        Some(json!({"description": "no title"})),
    )
    .await;
    assert_eq!(untitled.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(untitled.json()["detail"].is_string());

    let menu = send(&router, "POST", "/api/v1/menus", Some(json!({"title": "M"}))).await;
    let menu_id = id_of(&menu);
    let submenu = send(
        &router,
        "POST",
        &format!("/api/v1/menus/{menu_id}/submenus"),
        Some(json!({"title": "S"})),
    )
    .await;
    let submenu_id = id_of(&submenu);

    let bad_price = send(
        &router,
        "POST",
        &format!("/api/v1/menus/{menu_id}/submenus/{submenu_id}/dishes"),
        Some(json!({"title": "D", "price": "ten"})),
    )
    .await;
    assert_eq!(bad_price.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.count_rows("dishes").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn patch_replaces_fields_and_read_reflects_it(pool: PgPool) {
    let app = TestApp::new(pool);
    let router = router(&app);

    let menu = send(
        &router,
        "POST",
        "/api/v1/menus",
        Some(json!({"title": "Old", "description": "old"})),
    )
    .await;
    let menu_id = id_of(&menu);
    send(&router, "GET", &format!("/api/v1/menus/{menu_id}"), None).await;

    let patched = send(
        &router,
        "PATCH",
        &format!("/api/v1/menus/{menu_id}"),
        Some(json!({"title": "New", "description": "new"})),
    )
    .await;
    assert_eq!(patched.status, StatusCode::OK);

    let read = send(&router, "GET", &format!("/api/v1/menus/{menu_id}"), None).await;
    assert_eq!(read.json()["title"], "New");
    assert_eq!(read.json()["description"], "new");

    let listed = send(&router, "GET", "/api/v1/menus", None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.json().as_array().map(Vec::len), Some(1));
}

#[sqlx::test(migrations = "./migrations")]
async fn fill_reports_password_outcome_in_the_body(pool: PgPool) {
    let app = TestApp::new(pool);
    let router = router(&app);

    let rejected = send(
        &router,
        "POST",
        "/api/v1/fill",
        Some(json!({"password": "nope"})),
    )
    .await;
    assert_eq!(rejected.status, StatusCode::OK);
    assert_eq!(
        rejected.json(),
        json!({"status": false, "message": "Incorrect password"})
    );

    let seeded = send(
        &router,
        "POST",
        "/api/v1/fill",
        Some(json!({"password": FILL_PASSWORD})),
    )
    .await;
    assert_eq!(seeded.json(), json!({"status": true, "message": "Success"}));

    let menus = send(&router, "GET", "/api/v1/menus", None).await;
    assert_eq!(menus.json().as_array().map(Vec::len), Some(2));
}

#[sqlx::test(migrations = "./migrations")]
async fn export_is_requested_polled_and_downloaded(pool: PgPool) {
    let app = TestApp::new(pool);
    let router = router(&app);
    send(
        &router,
        "POST",
        "/api/v1/fill",
        Some(json!({"password": FILL_PASSWORD})),
    )
    .await;

    let unknown = send(&router, "GET", "/api/v1/xl/get?task_id=unknown", None).await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(
        unknown.json(),
        json!({"status": "Unrequested", "message": "Please request the file first"})
    );

    let submitted = send(&router, "POST", "/api/v1/xl/create", None).await;
    assert_eq!(submitted.status, StatusCode::OK);
    assert_eq!(submitted.json()["status"], true);
    let job_id = submitted.json()["message"]
        .as_str()
        .expect("job id")
        .to_string();

    let pending = send(
        &router,
        "GET",
        &format!("/api/v1/xl/get?task_id={job_id}"),
        None,
    )
    .await;
    assert_eq!(
        pending.json(),
        json!({"status": "Queued", "message": "Please wait"})
    );

    app.jobs.run_pending(&app.storage).await;

    let download = send(
        &router,
        "GET",
        &format!("/api/v1/xl/get?task_id={job_id}"),
        None,
    )
    .await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.headers[header::CONTENT_TYPE], XLSX_MIME);
    let disposition = download.headers[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("ascii header");
    assert!(disposition.starts_with("attachment; filename=catalog-"));
    assert!(disposition.ends_with(".xlsx"));
    assert_eq!(&download.body[..2], b"PK");
}

#[sqlx::test(migrations = "./migrations")]
async fn export_poll_without_task_id_is_a_json_error(pool: PgPool) {
    let app = TestApp::new(pool);
    let router = router(&app);

    let reply = send(&router, "GET", "/api/v1/xl/get", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.headers[header::CONTENT_TYPE]
        .to_str()
        .expect("ascii")
        .starts_with("application/json"));
    let detail = reply.json()["detail"].as_str().expect("detail").to_string();
    assert!(detail.contains("task_id"), "{detail}");
}

#[sqlx::test(migrations = "./migrations")]
async fn unreachable_queue_is_service_unavailable(pool: PgPool) {
    let app = TestApp::new(pool);
    let router = router(&app);
    app.jobs.go_offline();

    let reply = send(&router, "POST", "/api/v1/xl/create", None).await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reply.json(), json!({"detail": "export queue unavailable"}));
}

#[sqlx::test(migrations = "./migrations")]
async fn every_response_carries_a_request_id(pool: PgPool) {
    let app = TestApp::new(pool);
    let router = router(&app);

    let reply = send(&router, "GET", "/api/v1/menus", None).await;
    let request_id = reply.headers["x-request-id"].to_str().expect("ascii");
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}
