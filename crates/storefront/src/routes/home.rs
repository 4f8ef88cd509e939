//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::commerce::ProductQuery;
use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::brands::BrandView;
use crate::routes::layout::NavView;
use crate::routes::products::{self, PaginationView, ProductCardView};
use crate::state::AppState;

/// Brands shown in the home page strip.
const FEATURED_BRANDS: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavView,
    pub brands: Vec<BrandView>,
    pub products: Vec<ProductCardView>,
    pub pagination: PaginationView,
    pub can_add: bool,
}

/// Display the home page: the brand strip and the first page of products.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse, AppError> {
    let commerce = state.commerce();
    let first_page = ProductQuery::page(1);
    let (page, brands) = tokio::join!(
        commerce.get_products(&first_page),
        commerce.get_brands(),
    );

    let page = page?;
    // The strip is decoration; the grid still renders without it
    let brands = brands
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to load brands for home page"))
        .unwrap_or_default();
    let (products, pagination) = products::grid(&page, "/products", None);

    Ok(HomeTemplate {
        can_add: user.is_some(),
        nav: NavView::new(user.as_ref(), "home"),
        brands: brands
            .iter()
            .take(FEATURED_BRANDS)
            .map(BrandView::from)
            .collect(),
        products,
        pagination,
    })
}
