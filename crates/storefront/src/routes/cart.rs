//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation goes through the signed-in user's [`CartStore`]; fragments
//! are rendered from the store's state after the round trip, so the page
//! always shows the last server-confirmed cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wallmart_core::{CartId, CartLineItem, CartSnapshot, Price, ProductId};

use crate::cart::{AuthorizedCart, CartError, CartState, CartStore, Notice, Outcome};
use crate::commerce::CommerceError;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, login_url};
use crate::routes::layout::{HX_TRIGGER, NavView, cart_trigger};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub title: String,
    pub image: Option<String>,
    pub brand: Option<String>,
    pub count: u32,
    /// Counts submitted by the minus and plus controls.
    pub count_down: i64,
    pub count_up: i64,
    pub price: String,
    pub line_price: String,
    /// Another request for this line is still in flight.
    pub busy: bool,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub cart_id: Option<String>,
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
    pub clearing: bool,
}

impl CartView {
    fn from_state(snapshot: &CartSnapshot, state: &CartState) -> Self {
        Self {
            cart_id: snapshot.cart_id.as_ref().map(ToString::to_string),
            items: snapshot
                .products
                .iter()
                .map(|line| CartItemView::from_line(line, state))
                .collect(),
            total: snapshot.total().display(),
            item_count: snapshot.num_of_cart_items,
            clearing: state.is_clearing(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CartItemView {
    fn from_line(line: &CartLineItem, state: &CartState) -> Self {
        Self {
            product_id: line.product.id.to_string(),
            title: line
                .product
                .title
                .clone()
                .unwrap_or_else(|| line.product.id.to_string()),
            image: line.product.image_url.clone(),
            brand: line.product.brand.clone(),
            count: line.count,
            count_down: i64::from(line.count) - 1,
            count_up: i64::from(line.count) + 1,
            price: Price::store(line.price).display(),
            line_price: Price::store(line.line_total()).display(),
            busy: state.is_line_busy(&line.product.id),
        }
    }
}

/// Render the store's current state. `None` when no cart was ever loaded.
fn current_view(store: &CartStore) -> Option<CartView> {
    let state = store.state();
    state
        .snapshot
        .as_deref()
        .map(|snapshot| CartView::from_state(snapshot, &state))
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update cart form data.
///
/// `count` stays a string so that any submission reaches the cart's
/// validation and comes back as a fragment with a notice.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub count: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Clear cart form data.
#[derive(Debug, Deserialize)]
pub struct ClearCartForm {
    pub cart_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: NavView,
    pub cart: Option<CartView>,
    pub error: Option<String>,
}

/// Cart body fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_body.html")]
pub struct CartBodyTemplate {
    pub cart: Option<CartView>,
    pub error: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
///
/// An add-to-cart response only carries product IDs, so a snapshot without
/// product details is refetched before rendering.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response, AppError> {
    let store = state.carts().get(&user.id).await;
    let api = AuthorizedCart::new(state.commerce(), &user.token);

    let stale = store.snapshot().is_some_and(|s| !s.is_populated());
    let result = if stale {
        store.refresh(&api).await
    } else {
        store.get_cart(&api).await
    };

    let error = match result {
        Ok(_) => None,
        Err(CartError::Commerce(CommerceError::Unauthorized(_))) => {
            // Token expired upstream: sign out and come back after login
            state.carts().invalidate(&user.id).await;
            clear_current_user(&session).await?;
            return Ok(Redirect::to(&login_url("/cart")).into_response());
        }
        Err(err) => Some(err.notice("Failed to load your cart").message),
    };

    Ok(CartShowTemplate {
        nav: NavView::new(Some(&user), "cart"),
        cart: current_view(&store),
        error,
    }
    .into_response())
}

/// Add one unit of a product (HTMX).
///
/// Returns the updated count badge plus a `notify` trigger.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let store = state.carts().get(&user.id).await;
    let api = AuthorizedCart::new(state.commerce(), &user.token);
    let product_id = ProductId::new(form.product_id);

    let result = store.add_item(&api, &product_id).await;
    if result.is_ok() {
        add_breadcrumb("cart", "Added product", Some(&[("product_id", product_id.as_str())]));
    }

    let notice = notice_for(&result, "Failed to add product to cart");
    (
        AppendHeaders([(HX_TRIGGER, cart_trigger(false, notice.as_ref()))]),
        CartCountTemplate {
            count: store.state().count(),
        },
    )
        .into_response()
}

/// Update a line's count (HTMX).
#[instrument(skip(state, user))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let store = state.carts().get(&user.id).await;
    let api = AuthorizedCart::new(state.commerce(), &user.token);

    let product_id = ProductId::new(form.product_id);

    let result = match form.count.trim().parse::<i64>() {
        Ok(count) => store.update_item(&api, &product_id, count).await,
        Err(_) => Err(CartError::InvalidQuantity(form.count)),
    };
    cart_body_response(&store, &result, "Failed to update quantity")
}

/// Remove a line (HTMX).
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let store = state.carts().get(&user.id).await;
    let api = AuthorizedCart::new(state.commerce(), &user.token);
    let product_id = ProductId::new(form.product_id);

    let result = store.remove_item(&api, &product_id).await;
    if result.is_ok() {
        add_breadcrumb("cart", "Removed line", Some(&[("product_id", product_id.as_str())]));
    }
    cart_body_response(&store, &result, "Failed to remove item")
}

/// Empty the cart (HTMX).
#[instrument(skip(state, user))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ClearCartForm>,
) -> Response {
    let store = state.carts().get(&user.id).await;
    let api = AuthorizedCart::new(state.commerce(), &user.token);

    let result = store.clear_cart(&api, &CartId::new(form.cart_id)).await;
    cart_body_response(&store, &result, "Failed to clear cart")
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, user))]
pub async fn count(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> Response {
    let Some(user) = user else {
        return CartCountTemplate { count: 0 }.into_response();
    };

    let store = state.carts().get(&user.id).await;
    let api = AuthorizedCart::new(state.commerce(), &user.token);
    let count = match store.get_cart(&api).await {
        Ok(snapshot) => snapshot.num_of_cart_items,
        Err(_) => store.state().count(),
    };

    CartCountTemplate { count }.into_response()
}

// =============================================================================
// Helpers
// =============================================================================

fn notice_for(result: &Result<Outcome, CartError>, failure: &str) -> Option<Notice> {
    match result {
        Ok(outcome) => outcome.notice.clone(),
        Err(err) => Some(err.notice(failure)),
    }
}

/// Cart body fragment after a mutation.
///
/// Always 200 so HTMX swaps the fragment; failures only add an error
/// notice and the body still shows the unchanged snapshot.
fn cart_body_response(
    store: &CartStore,
    result: &Result<Outcome, CartError>,
    failure: &str,
) -> Response {
    let notice = notice_for(result, failure);
    let cart = current_view(store);
    let error = cart
        .is_none()
        .then(|| "We couldn't load your cart. Please refresh the page.".to_string());

    (
        AppendHeaders([(HX_TRIGGER, cart_trigger(result.is_ok(), notice.as_ref()))]),
        CartBodyTemplate { cart, error },
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use wallmart_core::{CartProduct, LineItemId};

    use super::*;

    fn line(id: &str, title: Option<&str>, count: u32, price: i64) -> CartLineItem {
        CartLineItem {
            id: LineItemId::new(format!("line-{id}")),
            product: CartProduct {
                title: title.map(ToString::to_string),
                ..CartProduct::bare(ProductId::new(id))
            },
            count,
            price: Decimal::new(price, 0),
        }
    }

    #[test]
    fn test_cart_view_from_snapshot() {
        let snapshot = CartSnapshot {
            cart_id: Some(CartId::new("c1")),
            num_of_cart_items: 2,
            products: vec![line("a", Some("Watch"), 2, 100), line("b", None, 1, 50)],
            total_cart_price: Decimal::new(250, 0),
        };
        let state = CartState::default();

        let view = CartView::from_state(&snapshot, &state);
        assert_eq!(view.cart_id.as_deref(), Some("c1"));
        assert_eq!(view.item_count, 2);
        assert_eq!(view.total, "EGP 250.00");
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].line_price, "EGP 200.00");
        // Bare lines fall back to the product id
        assert_eq!(view.items[1].title, "b");
        assert!(view.items.iter().all(|item| !item.busy));
        assert!(!view.clearing);
    }

    #[test]
    fn test_empty_store_has_no_view() {
        let store = CartStore::new();
        assert!(current_view(&store).is_none());
    }
}
