//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//!
//! # Catalog
//! GET  /products               - Product listing (?page=, ?brand=)
//! GET  /products/{id}          - Product detail
//! GET  /brands                 - Brand listing
//! GET  /brands/{id}            - Brand detail with its products
//!
//! # Cart (HTMX fragments, requires auth)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge)
//! POST /cart/update            - Update count (returns cart body)
//! POST /cart/remove            - Remove line (returns cart body)
//! POST /cart/clear             - Clear cart (returns cart body)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Orders (requires auth)
//! GET  /allorders              - Order history
//!
//! # Auth
//! GET  /auth/login             - Login page (?callback_url=)
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! ```
//!
//! Health checks are mounted by [`crate::app`].

pub mod auth;
pub mod brands;
pub mod cart;
pub mod home;
pub mod layout;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{MethodRouter, get, post},
};

use crate::middleware::rate_limit::{RateLimiterLayer, auth_rate_limiter, cart_rate_limiter};
use crate::state::AppState;

/// Apply a rate limiter when one is configured.
fn limited(
    route: MethodRouter<AppState>,
    limiter: Option<&RateLimiterLayer>,
) -> MethodRouter<AppState> {
    match limiter {
        Some(layer) => route.layer(layer.clone()),
        None => route,
    }
}

/// Create the auth routes router.
pub fn auth_routes(limiter: Option<&RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(limited(post(auth::login), limiter)),
        )
        .route(
            "/register",
            get(auth::register_page).merge(limited(post(auth::register), limiter)),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the brand routes router.
pub fn brand_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(brands::index))
        .route("/{id}", get(brands::show))
}

/// Create the cart routes router.
pub fn cart_routes(limiter: Option<&RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", limited(post(cart::add), limiter))
        .route("/update", limited(post(cart::update), limiter))
        .route("/remove", limited(post(cart::remove), limiter))
        .route("/clear", limited(post(cart::clear), limiter))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
///
/// With `rate_limit` set, auth and cart posts are limited per client IP.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    let auth_limiter = rate_limit.then(auth_rate_limiter);
    let cart_limiter = rate_limit.then(cart_rate_limiter);

    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/products", product_routes())
        .nest("/brands", brand_routes())
        // Cart routes
        .nest("/cart", cart_routes(cart_limiter.as_ref()))
        // Order history
        .route("/allorders", get(orders::index))
        // Auth routes
        .nest("/auth", auth_routes(auth_limiter.as_ref()))
}
