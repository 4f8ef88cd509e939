//! Brand route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use wallmart_core::BrandId;

use crate::commerce::{Brand, ProductQuery};
use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::layout::NavView;
use crate::routes::products::{self, ListingQuery, PaginationView, ProductCardView};
use crate::state::AppState;

/// Brand display data.
#[derive(Clone)]
pub struct BrandView {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

impl From<&Brand> for BrandView {
    fn from(brand: &Brand) -> Self {
        Self {
            id: brand.id.to_string(),
            name: brand.name.clone(),
            image: brand.image.clone(),
        }
    }
}

/// Brand listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "brands/index.html")]
pub struct BrandsIndexTemplate {
    pub nav: NavView,
    pub brands: Vec<BrandView>,
}

/// Brand detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "brands/show.html")]
pub struct BrandShowTemplate {
    pub nav: NavView,
    pub brand: BrandView,
    pub products: Vec<ProductCardView>,
    pub pagination: PaginationView,
    pub can_add: bool,
}

/// Display brand listing page.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse, AppError> {
    let brands = state.commerce().get_brands().await?;

    Ok(BrandsIndexTemplate {
        nav: NavView::new(user.as_ref(), "brands"),
        brands: brands.iter().map(BrandView::from).collect(),
    })
}

/// Display a brand with its products.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = BrandId::new(id);
    let commerce = state.commerce();
    let products_query = ProductQuery::brand(id.clone(), query.page());
    let (brand, page) = tokio::try_join!(
        commerce.get_brand(&id),
        commerce.get_products(&products_query),
    )?;

    let base_path = format!("/brands/{}", urlencoding::encode(id.as_str()));
    let (products, pagination) = products::grid(&page, &base_path, None);

    Ok(BrandShowTemplate {
        can_add: user.is_some(),
        nav: NavView::new(user.as_ref(), "brands"),
        brand: BrandView::from(&brand),
        products,
        pagination,
    })
}
