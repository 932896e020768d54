//! Integration Tests for API Endpoints
//!
//! Drives the full router over an in-memory store and cache.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use catalog_cache::{
    cache::{CacheSettings, CatalogCache, MemoryBackend},
    catalog::CacheTtl,
    create_router,
    store::InMemoryProductStore,
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn app_with_cache(cache: CatalogCache) -> Router {
    let state = AppState::from_parts(
        Arc::new(InMemoryProductStore::new()),
        cache,
        CacheTtl::default(),
    );
    create_router(state)
}

fn create_test_app() -> Router {
    app_with_cache(CatalogCache::new(
        Arc::new(MemoryBackend::new(100)),
        CacheSettings::default(),
    ))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
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
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create(app: &Router, name: &str, price: f64, stock: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/products",
        Some(json!({ "name": name, "price": price, "stock": stock })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body
}

// == Create Tests ==

#[tokio::test]
async fn test_create_returns_product_shape() {
    let app = create_test_app();

    let product = create(&app, "  Desk Lamp ", 12.5, 4).await;

    assert_eq!(product["name"], "Desk Lamp");
    assert_eq!(product["price"], "12.50");
    assert_eq!(product["stock"], 4);
    assert!(product["id"].as_str().is_some());
    assert!(product["createdAt"].as_str().is_some());
    assert!(product["updatedAt"].as_str().is_some());
}

#[tokio::test]
async fn test_create_duplicate_name_conflicts() {
    let app = create_test_app();
    create(&app, "Desk Lamp", 12.5, 4).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/products",
        Some(json!({ "name": "Desk Lamp ", "price": 1, "stock": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = create_test_app();

    for body in [
        json!({ "name": "x", "price": 1, "stock": 1 }),
        json!({ "name": "Lamp", "price": -1, "stock": 1 }),
        json!({ "name": "Lamp", "price": 1, "stock": -1 }),
        json!({ "name": "Lamp", "price": 1, "stock": 1.5 }),
        json!({ "name": "Lamp", "price": "1", "stock": 1 }),
        json!({ "name": "Lamp", "price": 1 }),
        json!({ "name": "Lamp", "price": 1, "stock": 1, "featured": true }),
    ] {
        let (status, _) = send(&app, "POST", "/api/products", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", body);
    }
}

// == Read Tests ==

#[tokio::test]
async fn test_get_by_id() {
    let app = create_test_app();
    let product = create(&app, "Desk Lamp", 12.5, 4).await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    let (status, first) = send(&app, "GET", &uri, None).await;
    let (_, second) = send(&app, "GET", &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, product);
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_get_unknown_id() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/api/products/does-not-exist", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("does-not-exist"));
}

#[tokio::test]
async fn test_list_pagination_and_clamping() {
    let app = create_test_app();
    for i in 0..12 {
        create(&app, &format!("Item {:02}", i), 1.0 + i as f64, i).await;
    }

    let (status, page) = send(&app, "GET", "/api/products?size=500&page=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 1);
    assert_eq!(page["size"], 50);
    assert_eq!(page["total"], 12);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["items"].as_array().unwrap().len(), 12);

    let (_, page) = send(&app, "GET", "/api/products?size=5&page=3&sort=stock,asc", None).await;
    let stocks: Vec<_> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["stock"].as_i64().unwrap())
        .collect();
    assert_eq!(stocks, [10, 11]);
    assert_eq!(page["totalPages"], 3);

    let (_, page) = send(&app, "GET", "/api/products?size=5&page=9", None).await;
    assert!(page["items"].as_array().unwrap().is_empty());
    assert_eq!(page["total"], 12);
}

#[tokio::test]
async fn test_list_price_filter() {
    let app = create_test_app();
    create(&app, "Five", 5.0, 1).await;
    create(&app, "Ten", 10.0, 1).await;
    create(&app, "Twenty", 20.0, 1).await;

    let (_, page) = send(
        &app,
        "GET",
        "/api/products?minPrice=5&maxPrice=10&sort=price,asc",
        None,
    )
    .await;
    let names: Vec<_> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Five", "Ten"]);

    let (status, page) = send(&app, "GET", "/api/products?minPrice=10&maxPrice=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn test_list_unknown_sort_falls_back() {
    let app = create_test_app();
    create(&app, "First", 1.0, 1).await;
    create(&app, "Second", 1.0, 1).await;

    let (status, bogus) = send(&app, "GET", "/api/products?sort=bogus,asc", None).await;
    let (_, default) = send(&app, "GET", "/api/products", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(bogus, default);
}

#[tokio::test]
async fn test_list_repeated_params_use_first_value() {
    let app = create_test_app();
    create(&app, "Cheap", 1.0, 3).await;
    create(&app, "Pricey", 9.0, 1).await;

    let (status, page) = send(
        &app,
        "GET",
        "/api/products?sort=price,asc&sort=x&page=1&page=2",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 1);
    assert_eq!(page["items"][0]["name"], "Cheap");

    let (status, bogus) = send(&app, "GET", "/api/products?sort=bogus&sort=x", None).await;
    let (_, default) = send(&app, "GET", "/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bogus, default);
}

// == Write + Invalidation Tests ==

#[tokio::test]
async fn test_list_reflects_writes() {
    let app = create_test_app();
    create(&app, "Alpha", 1.0, 1).await;

    let (_, before) = send(&app, "GET", "/api/products", None).await;
    assert_eq!(before["total"], 1);

    let beta = create(&app, "Beta", 2.0, 2).await;
    let (_, after_create) = send(&app, "GET", "/api/products", None).await;
    assert_eq!(after_create["total"], 2);

    let uri = format!("/api/products/{}", beta["id"].as_str().unwrap());
    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, after_delete) = send(&app, "GET", "/api/products", None).await;
    assert_eq!(after_delete["total"], 1);
}

#[tokio::test]
async fn test_patch_updates_cached_item() {
    let app = create_test_app();
    let product = create(&app, "Alpha", 1.0, 1).await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    // Warm the item entry
    send(&app, "GET", &uri, None).await;

    let (status, updated) = send(&app, "PATCH", &uri, Some(json!({ "price": 3.5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], "3.50");
    assert_eq!(updated["name"], "Alpha");

    let (_, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_patch_errors() {
    let app = create_test_app();
    create(&app, "Alpha", 1.0, 1).await;
    let beta = create(&app, "Beta", 1.0, 1).await;
    let uri = format!("/api/products/{}", beta["id"].as_str().unwrap());

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({ "name": "Alpha" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({ "name": "Beta" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({ "stock": -2 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({ "id": "other" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/products/missing",
        Some(json!({ "stock": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_unknown_id() {
    let app = create_test_app();
    let (status, _) = send(&app, "DELETE", "/api/products/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == Cache Absent ==

#[tokio::test]
async fn test_serves_without_cache() {
    let app = app_with_cache(CatalogCache::disabled());

    let product = create(&app, "Alpha", 1.0, 1).await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    let (status, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, product);

    let (_, page) = send(&app, "GET", "/api/products", None).await;
    assert_eq!(page["total"], 1);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["cache"], "disabled");
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cache"], "up");
    assert!(body["timestamp"].as_str().is_some());
}
