//! Catalog pages and health checks against a mocked Remote Commerce API.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use wallmart_integration_tests::{TestContext, product};

async fn mock_catalog(ctx: &TestContext) {
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": 2,
            "metadata": { "currentPage": 1, "numberOfPages": 2, "limit": 40, "nextPage": 2 },
            "data": [product("p1", "Smart Watch", 1500), product("p2", "Headphones", 900)]
        })))
        .mount(&ctx.api)
        .await;

    Mock::given(method("GET"))
        .and(path("/brands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": 1,
            "data": [{ "_id": "brand-1", "name": "Acme", "slug": "acme", "image": "https://cdn.example.com/acme.png" }]
        })))
        .mount(&ctx.api)
        .await;
}

#[tokio::test]
async fn test_home_lists_products_and_brands() {
    let ctx = TestContext::new().await;
    mock_catalog(&ctx).await;

    let response = ctx.get("/", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Smart Watch"));
    assert!(response.body.contains("Headphones"));
    assert!(response.body.contains("/brands/brand-1"));
    assert!(response.body.contains("EGP 1500.00"));
    assert!(response.body.contains("/products?page=2"));
    // Anonymous visitors get no add-to-cart controls
    assert!(!response.body.contains("/cart/add"));
}

#[tokio::test]
async fn test_product_listing_filters_by_brand() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("brand", "brand-1"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": { "currentPage": 2, "numberOfPages": 2, "prevPage": 1 },
            "data": [product("p3", "Speaker", 700)]
        })))
        .expect(1)
        .mount(&ctx.api)
        .await;

    let response = ctx.get("/products?brand=brand-1&page=2", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Speaker"));
    assert!(response.body.contains("/products?brand=brand-1&amp;page=1"));
}

#[tokio::test]
async fn test_product_detail_and_missing_product() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/products/p1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": product("p1", "Smart Watch", 1500) })),
        )
        .mount(&ctx.api)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "statusMsg": "fail",
            "message": "No product for this id missing"
        })))
        .mount(&ctx.api)
        .await;

    let response = ctx.get("/products/p1", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Smart Watch description"));
    assert!(response.body.contains("Sign in to buy"));

    let response = ctx.get("/products/missing", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_is_cached() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/brands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "_id": "brand-1", "name": "Acme", "slug": "acme" }]
        })))
        .expect(1)
        .mount(&ctx.api)
        .await;

    for _ in 0..3 {
        let response = ctx.get("/brands", None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("Acme"));
    }
}

#[tokio::test]
async fn test_brand_page_shows_brand_products() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/brands/brand-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "_id": "brand-1", "name": "Acme", "slug": "acme" }
        })))
        .mount(&ctx.api)
        .await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("brand", "brand-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": { "currentPage": 1, "numberOfPages": 1 },
            "data": [product("p1", "Smart Watch", 1500)]
        })))
        .mount(&ctx.api)
        .await;

    let response = ctx.get("/brands/brand-1", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<h1>Acme</h1>"));
    assert!(response.body.contains("Smart Watch"));
}

#[tokio::test]
async fn test_health_checks() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
    assert!(response.header("x-request-id").is_some());
    assert!(response.header("content-security-policy").is_some());

    // Nothing mounted yet: the API answers 404
    let response = ctx.get("/health/ready", None).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

    Mock::given(method("GET"))
        .and(path("/brands"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&ctx.api)
        .await;
    let response = ctx.get("/health/ready", None).await;
    assert_eq!(response.status, StatusCode::OK);
}
