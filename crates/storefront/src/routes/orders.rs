//! Order history route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use wallmart_core::Order;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::layout::NavView;
use crate::state::AppState;

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub title: String,
    pub status: String,
    pub completed: bool,
    pub date: String,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            title: order.title.clone(),
            status: order.status.to_string(),
            completed: order.status.is_completed(),
            date: order.date.format("%b %d, %Y").to_string(),
            total: order.total_price().display(),
        }
    }
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub nav: NavView,
    pub orders: Vec<OrderView>,
}

/// Display the signed-in user's orders, newest first.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let mut orders = state.commerce().get_user_orders(&user.id).await?;
    orders.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(OrdersTemplate {
        nav: NavView::new(Some(&user), "orders"),
        orders: orders.iter().map(OrderView::from).collect(),
    })
}
