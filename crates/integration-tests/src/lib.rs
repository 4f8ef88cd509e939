//! Integration tests for the WallMart storefront.
//!
//! The storefront router runs in-process against a `wiremock` stand-in for
//! the Remote Commerce API, so no network or running server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p wallmart-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wallmart_storefront::build_router;
use wallmart_storefront::config::{CommerceConfig, StorefrontConfig};
use wallmart_storefront::state::AppState;

/// Token the mocked API issues on sign-in.
pub const TEST_TOKEN: &str = "test-token";

/// User ID the mocked API resolves [`TEST_TOKEN`] to.
pub const TEST_USER_ID: &str = "6407cf6f515bdcf347c09f17";

/// A response from the in-process router.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Header value as a string, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `HX-Trigger` header parsed as JSON.
    #[must_use]
    pub fn hx_trigger(&self) -> Value {
        serde_json::from_str(self.header("hx-trigger").expect("missing HX-Trigger"))
            .expect("HX-Trigger is not JSON")
    }

    /// The `name=value` part of the session cookie set by this response.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("wm_session="))
            .and_then(|v| v.split(';').next())
            .map(ToString::to_string)
    }
}

/// Router plus mocked Remote Commerce API.
pub struct TestContext {
    pub api: MockServer,
    pub app: Router,
}

impl TestContext {
    /// Start a mock API and build the router against it.
    pub async fn new() -> Self {
        let api = MockServer::start().await;
        let config = StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from(
                "kQ7vN2pX9mR4tW8yB3cF6hJ1lZ5sD0gA7eU2iO9nM4qV8wK3rT6yH1jL5xC0bP7f".to_string(),
            ),
            commerce: CommerceConfig {
                base_url: api.uri(),
                timeout_secs: 5,
            },
            rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let state = AppState::new(config).expect("Failed to create application state");
        let app = build_router(state).expect("Failed to build router");
        Self { api, app }
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Send a form POST. `htmx` marks it as an HTMX request.
    pub async fn post_form(
        &self,
        uri: &str,
        form: &str,
        cookie: Option<&str>,
        htmx: bool,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if htmx {
            builder = builder
                .header("hx-request", "true")
                .header("hx-current-url", "http://localhost:3000/cart");
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Mock the sign-in and token verification endpoints.
    pub async fn mock_auth(&self) {
        Mock::given(method("POST"))
            .and(path("/auth/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "success",
                "user": { "name": "Ahmed", "email": "ahmed@example.com", "role": "user" },
                "token": TEST_TOKEN
            })))
            .mount(&self.api)
            .await;

        Mock::given(method("GET"))
            .and(path("/auth/verifyToken"))
            .and(header_matcher("token", TEST_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "verified",
                "decoded": { "id": TEST_USER_ID, "name": "Ahmed", "role": "user" }
            })))
            .mount(&self.api)
            .await;
    }

    /// Sign in through the login form and return the session cookie.
    pub async fn sign_in(&self) -> String {
        self.mock_auth().await;
        let response = self
            .post_form(
                "/auth/login",
                "email=ahmed%40example.com&password=Secure%40123",
                None,
                false,
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
        response.session_cookie().expect("login set no session cookie")
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A populated cart line as the API returns it.
#[must_use]
pub fn cart_line(product_id: &str, title: &str, count: u32, price: u32) -> Value {
    json!({
        "_id": format!("line-{product_id}"),
        "count": count,
        "price": price,
        "product": {
            "_id": product_id,
            "title": title,
            "imageCover": format!("https://cdn.example.com/{product_id}.jpg"),
            "brand": { "_id": "brand-1", "name": "Acme", "slug": "acme" },
            "category": { "_id": "cat-1", "name": "Electronics", "slug": "electronics" }
        }
    })
}

/// A cart envelope as the API returns it.
#[must_use]
pub fn cart_body(lines: &[Value], total: u32) -> Value {
    json!({
        "status": "success",
        "numOfCartItems": lines.len(),
        "cartId": "cart-1",
        "data": {
            "_id": "cart-1",
            "cartOwner": TEST_USER_ID,
            "products": lines,
            "totalCartPrice": total
        }
    })
}

/// A catalog product as the API returns it.
#[must_use]
pub fn product(id: &str, title: &str, price: u32) -> Value {
    json!({
        "_id": id,
        "title": title,
        "description": format!("{title} description"),
        "price": price,
        "imageCover": format!("https://cdn.example.com/{id}.jpg"),
        "images": [],
        "brand": { "_id": "brand-1", "name": "Acme", "slug": "acme" },
        "category": { "_id": "cat-1", "name": "Electronics", "slug": "electronics" },
        "ratingsAverage": 4.5,
        "quantity": 10
    })
}
