//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use wallmart_core::{BrandId, Price, ProductId};

use crate::commerce::{PageInfo, Product, ProductPage, ProductQuery};
use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::layout::NavView;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Product card display data for grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub title: String,
    pub image: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: String,
    /// List price, shown struck through when a discount applies.
    pub compare_at_price: Option<String>,
    pub rating: Option<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            image: product.image_cover.clone(),
            brand: product.brand.as_ref().map(|b| b.name.clone()),
            category: product.category.as_ref().map(|c| c.name.clone()),
            price: Price::store(product.effective_price()).display(),
            compare_at_price: product
                .price_after_discount
                .filter(|discounted| *discounted < product.price)
                .map(|_| Price::store(product.price).display()),
            rating: product.ratings_average.map(|r| format!("{r:.1}")),
        }
    }
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductDetailView {
    pub card: ProductCardView,
    pub description: String,
    pub images: Vec<String>,
    pub in_stock: bool,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        let mut images = vec![product.image_cover.clone()];
        images.extend(
            product
                .images
                .iter()
                .filter(|url| **url != product.image_cover)
                .cloned(),
        );

        Self {
            card: ProductCardView::from(product),
            description: product.description.clone(),
            images,
            in_stock: product.quantity.is_none_or(|q| q > 0),
        }
    }
}

/// Pagination links for a product grid.
#[derive(Clone)]
pub struct PaginationView {
    pub current: u32,
    pub total: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl PaginationView {
    /// Build links under `base_path`, keeping the brand filter.
    #[must_use]
    pub fn new(base_path: &str, info: &PageInfo, brand: Option<&BrandId>) -> Self {
        let url = |page: u32| match brand {
            Some(brand) => format!(
                "{base_path}?brand={}&page={page}",
                urlencoding::encode(brand.as_str())
            ),
            None => format!("{base_path}?page={page}"),
        };

        let current = info.current_page.max(1);
        let total = info.number_of_pages.max(current);
        Self {
            current,
            total,
            prev_url: (current > 1).then(|| url(current - 1)),
            next_url: info
                .next_page
                .or_else(|| (current < total).then_some(current + 1))
                .map(url),
        }
    }

    #[must_use]
    pub const fn is_multi_page(&self) -> bool {
        self.total > 1
    }
}

/// Cards plus pagination for one page of products.
pub fn grid(
    page: &ProductPage,
    base_path: &str,
    brand: Option<&BrandId>,
) -> (Vec<ProductCardView>, PaginationView) {
    (
        page.products.iter().map(ProductCardView::from).collect(),
        PaginationView::new(base_path, &page.page_info, brand),
    )
}

// =============================================================================
// Query Types
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub page: Option<u32>,
    pub brand: Option<String>,
}

impl ListingQuery {
    pub(crate) fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub nav: NavView,
    pub products: Vec<ProductCardView>,
    pub pagination: PaginationView,
    pub can_add: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub nav: NavView,
    pub product: ProductDetailView,
    pub can_add: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display product listing page.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let brand = query
        .brand
        .as_deref()
        .filter(|b| !b.is_empty())
        .map(BrandId::new);
    let product_query = match &brand {
        Some(brand) => ProductQuery::brand(brand.clone(), query.page()),
        None => ProductQuery::page(query.page()),
    };

    let page = state.commerce().get_products(&product_query).await?;
    let (products, pagination) = grid(&page, "/products", brand.as_ref());

    Ok(ProductsIndexTemplate {
        can_add: user.is_some(),
        nav: NavView::new(user.as_ref(), "products"),
        products,
        pagination,
    })
}

/// Display product detail page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.commerce().get_product(&ProductId::new(id)).await?;

    Ok(ProductShowTemplate {
        can_add: user.is_some(),
        nav: NavView::new(user.as_ref(), "products"),
        product: ProductDetailView::from(&product),
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::commerce::Brand;

    fn product() -> Product {
        Product {
            id: ProductId::new("p1"),
            title: "Watch".to_string(),
            description: "A watch".to_string(),
            price: Decimal::new(1500, 0),
            price_after_discount: Some(Decimal::new(1200, 0)),
            image_cover: "https://img/cover.jpg".to_string(),
            images: vec![
                "https://img/cover.jpg".to_string(),
                "https://img/side.jpg".to_string(),
            ],
            brand: Some(Brand {
                id: BrandId::new("b1"),
                name: "Casio".to_string(),
                slug: "casio".to_string(),
                image: None,
            }),
            category: None,
            ratings_average: Some(4.34),
            quantity: Some(0),
        }
    }

    #[test]
    fn test_card_shows_discount() {
        let card = ProductCardView::from(&product());
        assert_eq!(card.price, "EGP 1200.00");
        assert_eq!(card.compare_at_price.as_deref(), Some("EGP 1500.00"));
        assert_eq!(card.brand.as_deref(), Some("Casio"));
        assert_eq!(card.rating.as_deref(), Some("4.3"));
    }

    #[test]
    fn test_detail_dedupes_cover_image() {
        let detail = ProductDetailView::from(&product());
        assert_eq!(detail.images.len(), 2);
        assert!(!detail.in_stock);
    }

    #[test]
    fn test_pagination_links_keep_brand() {
        let info = PageInfo {
            current_page: 2,
            number_of_pages: 3,
            next_page: Some(3),
        };
        let brand = BrandId::new("b 1");
        let view = PaginationView::new("/products", &info, Some(&brand));
        assert_eq!(view.prev_url.as_deref(), Some("/products?brand=b%201&page=1"));
        assert_eq!(view.next_url.as_deref(), Some("/products?brand=b%201&page=3"));

        let single = PaginationView::new("/products", &PageInfo::default(), None);
        assert!(!single.is_multi_page());
        assert!(single.prev_url.is_none());
        assert!(single.next_url.is_none());
    }
}
