//! Login, registration, logout and order history.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use wallmart_integration_tests::{TEST_USER_ID, TestContext};

#[tokio::test]
async fn test_login_redirects_to_callback() {
    let ctx = TestContext::new().await;
    ctx.mock_auth().await;

    let response = ctx
        .post_form(
            "/auth/login",
            "email=ahmed%40example.com&password=Secure%40123&callback_url=%2Fallorders",
            None,
            false,
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/allorders"));
    let cookie = response.session_cookie().unwrap();

    // A signed-in visitor is bounced off the login page
    let response = ctx.get("/auth/login", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/"));
}

#[tokio::test]
async fn test_login_rejects_offsite_callback() {
    let ctx = TestContext::new().await;
    ctx.mock_auth().await;

    let response = ctx
        .post_form(
            "/auth/login",
            "email=ahmed%40example.com&password=Secure%40123&callback_url=%2F%2Fevil.example.com",
            None,
            false,
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/"));
}

#[tokio::test]
async fn test_login_validation_and_bad_credentials() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_form("/auth/login", "email=nope&password=", None, false)
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Invalid email address."));
    assert!(response.body.contains("Password is required"));
    assert!(response.session_cookie().is_none());

    Mock::given(method("POST"))
        .and(path("/auth/signin"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "statusMsg": "fail",
            "message": "Incorrect email or password"
        })))
        .mount(&ctx.api)
        .await;

    let response = ctx
        .post_form(
            "/auth/login",
            "email=ahmed%40example.com&password=Wrong%40123",
            None,
            false,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.contains("Incorrect email or password"));
    // The email is kept, the password is not
    assert!(response.body.contains("value=\"ahmed@example.com\""));
}

#[tokio::test]
async fn test_register_validation_keeps_values() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&ctx.api)
        .await;

    let response = ctx
        .post_form(
            "/auth/register",
            "name=Ahmed&email=ahmed%40example.com&password=Secure%40123&rePassword=Secure%40124&phone=01312345678",
            None,
            false,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Passwords don&#x27;t match") || response.body.contains("Passwords don&#39;t match"));
    assert!(response.body.contains("Invalid Egyptian phone number"));
    assert!(response.body.contains("value=\"Ahmed\""));
    assert!(!response.body.contains("Secure@123"));
}

#[tokio::test]
async fn test_register_then_login_page() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_partial_json(json!({
            "name": "Ahmed",
            "email": "ahmed@example.com",
            "rePassword": "Secure@123",
            "phone": "01012345678"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "success",
            "user": { "name": "Ahmed", "email": "ahmed@example.com", "role": "user" },
            "token": "fresh-token"
        })))
        .expect(1)
        .mount(&ctx.api)
        .await;

    let response = ctx
        .post_form(
            "/auth/register",
            "name=Ahmed&email=ahmed%40example.com&password=Secure%40123&rePassword=Secure%40123&phone=01012345678",
            None,
            false,
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location"),
        Some("/auth/login?success=registered")
    );

    let response = ctx.get("/auth/login?success=registered", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Account created. Please sign in."));
}

#[tokio::test]
async fn test_register_rejected_by_api() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "statusMsg": "fail",
            "message": "Account Already Exists"
        })))
        .mount(&ctx.api)
        .await;

    let response = ctx
        .post_form(
            "/auth/register",
            "name=Ahmed&email=ahmed%40example.com&password=Secure%40123&rePassword=Secure%40123&phone=01012345678",
            None,
            false,
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.body.contains("Account Already Exists"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let ctx = TestContext::new().await;
    let cookie = ctx.sign_in().await;

    let response = ctx.post_form("/auth/logout", "", Some(&cookie), false).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/auth/login"));

    let response = ctx.get("/allorders", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location"),
        Some("/auth/login?callback_url=%2Fallorders")
    );
}

#[tokio::test]
async fn test_orders_newest_first() {
    let ctx = TestContext::new().await;
    let cookie = ctx.sign_in().await;

    Mock::given(method("GET"))
        .and(path(format!("/orders/user/{TEST_USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "_id": "64a1",
                "id": 101,
                "totalOrderPrice": 250,
                "isDelivered": false,
                "isPaid": false,
                "cartItems": [{}, {}],
                "createdAt": "2024-01-05T10:00:00.000Z"
            },
            {
                "_id": "64a2",
                "id": 102,
                "totalOrderPrice": 99,
                "isDelivered": true,
                "isPaid": true,
                "cartItems": [{}],
                "createdAt": "2024-03-01T08:30:00.000Z"
            }
        ])))
        .mount(&ctx.api)
        .await;

    let response = ctx.get("/allorders", Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::OK);
    let newest = response.body.find("Order #102 (1 item)").unwrap();
    let oldest = response.body.find("Order #101 (2 items)").unwrap();
    assert!(newest < oldest);
    assert!(response.body.contains("Completed"));
    assert!(response.body.contains("Processing"));
    assert!(response.body.contains("EGP 99.00"));
}
