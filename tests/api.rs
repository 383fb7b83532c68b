//! HTTP API Integration Tests
//!
//! Drives the full router with `oneshot` against an in-memory catalog.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use kidshelf::api::{self, auth::PRINCIPAL_HEADER};
use kidshelf::{Catalog, StoreOptions};

fn app() -> Router {
    let catalog = Catalog::open_in_memory(StoreOptions::default()).unwrap();
    api::router(catalog)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>, admin: bool) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if admin {
        builder = builder.header(PRINCIPAL_HEADER, "admin@example.com");
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_category(app: &Router, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/admin/categories",
        Some(json!({ "name": name })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

fn names_and_indices(body: &Value) -> Vec<(String, i64)> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| {
            (
                c["name"].as_str().unwrap().to_string(),
                c["orderIndex"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_category_reorder_and_delete_end_to_end() {
    let app = app();
    let a = create_category(&app, "A").await;
    let b = create_category(&app, "B").await;
    let c = create_category(&app, "C").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/admin/categories/reorder",
        Some(json!({ "orderedIds": [c, a, b] })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["scope"], "categories");

    let (status, body) = send(&app, Method::GET, "/api/categories", None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        names_and_indices(&body),
        vec![("C".to_string(), 0), ("A".to_string(), 1), ("B".to_string(), 2)]
    );

    let (status, _) = send(&app, Method::DELETE, &format!("/api/admin/categories/{}", a), None, true).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, "/api/categories", None, false).await;
    assert_eq!(names_and_indices(&body), vec![("C".to_string(), 0), ("B".to_string(), 1)]);
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_admin_routes_require_principal() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/admin/contents", None, false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
    assert!(body["message"].is_string());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/categories",
        Some(json!({ "name": "Sneaky" })),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(&app, Method::GET, "/api/categories", None, false).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_public_contents_hide_inactive_and_cap_categories() {
    let app = app();
    let mut category_ids = Vec::new();
    for name in ["One", "Two", "Three", "Four", "Five"] {
        category_ids.push(create_category(&app, name).await);
    }

    let (status, live) = send(
        &app,
        Method::POST,
        "/api/admin/contents",
        Some(json!({
            "title": "Bedtime Story",
            "type": "story",
            "ageMin": 3,
            "ageMax": 6,
            "categoryIds": category_ids,
        })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", live);
    assert_eq!(live["orderIndex"], 0);
    assert_eq!(live["categories"].as_array().unwrap().len(), 5);

    let (_, draft) = send(
        &app,
        Method::POST,
        "/api/admin/contents",
        Some(json!({
            "title": "Draft Story",
            "type": "story",
            "ageMin": 3,
            "ageMax": 6,
            "isActive": false,
        })),
        true,
    )
    .await;
    assert_eq!(draft["orderIndex"], 1);

    let (status, body) = send(&app, Method::GET, "/api/contents?activeOnly=false", None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    let public_categories: Vec<i64> = body["data"][0]["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(public_categories, category_ids[..3].to_vec());

    let (status, _) = send(&app, Method::GET, &format!("/api/contents/{}", draft["id"]), None, false).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, &format!("/api/admin/contents/{}", draft["id"]), None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isActive"], false);
}

#[tokio::test]
async fn test_public_age_filter() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/api/admin/contents",
        Some(json!({ "title": "Preschool", "type": "video", "ageMin": 3, "ageMax": 6 })),
        true,
    )
    .await;

    let (_, body) = send(&app, Method::GET, "/api/contents?age=4", None, false).await;
    assert_eq!(body["total"], 1);

    let (_, body) = send(&app, Method::GET, "/api/contents?age=8", None, false).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_content_reorder_requires_type() {
    let app = app();
    let (_, created) = send(
        &app,
        Method::POST,
        "/api/admin/contents",
        Some(json!({ "title": "Puzzle", "type": "game", "ageMin": 5, "ageMax": 9 })),
        true,
    )
    .await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/admin/contents/reorder",
        Some(json!({ "orderedIds": [created["id"]] })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/admin/contents/reorder",
        Some(json!({ "type": "game", "orderedIds": [created["id"]] })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["scope"], "content:game");
    assert_eq!(body["data"][0]["orderIndex"], 0);
}

#[tokio::test]
async fn test_category_reorder_rejects_type() {
    let app = app();
    let a = create_category(&app, "A").await;
    let b = create_category(&app, "B").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/admin/categories/reorder",
        Some(json!({ "type": "story", "orderedIds": [b, a] })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    let (_, body) = send(&app, Method::GET, "/api/categories", None, false).await;
    assert_eq!(
        names_and_indices(&body),
        vec![("A".to_string(), 0), ("B".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app();
    let a = create_category(&app, "A").await;

    // Reorder with a foreign id
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/admin/categories/reorder",
        Some(json!({ "orderedIds": [a, 999] })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    // Age groups are naturally ordered
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/admin/age-groups/reorder",
        Some(json!({ "orderedIds": [] })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Duplicate name
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/categories",
        Some(json!({ "name": "A" })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], true);

    // Unknown id
    let (status, _) = send(&app, Method::DELETE, "/api/admin/categories/4242", None, true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Inverted age range
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/contents",
        Some(json!({ "title": "Bad", "type": "story", "ageMin": 9, "ageMax": 3 })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown query parameter and malformed values
    let (status, body) = send(&app, Method::GET, "/api/contents?sort=title", None, false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    let (status, _) = send(&app, Method::GET, "/api/contents?limit=ten", None, false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown body field
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/categories",
        Some(json!({ "name": "B", "color": "red" })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_settings_crud() {
    let app = app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/admin/settings",
        Some(json!({ "key": "site.title", "value": "Kid Shelf" })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/api/admin/settings/{}", id),
        Some(json!({ "value": "KidShelf" })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["value"], "KidShelf");
    assert_eq!(updated["key"], "site.title");

    let (_, list) = send(&app, Method::GET, "/api/admin/settings", None, true).await;
    assert_eq!(list["total"], 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/admin/settings/{}", id), None, true).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/admin/settings/{}", id), None, true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
