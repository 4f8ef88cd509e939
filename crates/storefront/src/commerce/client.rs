//! Remote Commerce API client implementation.
//!
//! Uses `reqwest` for HTTP and `serde_json` for envelopes. Caches products
//! for 5 minutes and brands for 1 hour using `moka`.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::SecretString;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

use wallmart_core::{BrandId, CartId, CartSnapshot, Email, Order, ProductId, UserId};

use super::CommerceError;
use super::cache::{CacheKey, CacheValue};
use super::conversions::{
    CartResponse, ClearCartResponse, WireOrder, convert_cart, convert_cleared_cart,
};
use super::types::{
    AuthSession, AuthUser, Brand, Product, ProductPage, ProductQuery, SignUp, TokenIdentity,
};
use crate::config::CommerceConfig;

/// Header carrying the user's bearer token on user-scoped endpoints.
const TOKEN_HEADER: &str = "token";

/// Products change often enough that 5 minutes is the upper bound.
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Brands are revalidated hourly.
const BRANDS_TTL: Duration = Duration::from_secs(3600);

/// `{ "data": T }` envelope for single-item endpoints.
#[derive(Debug, Deserialize)]
struct ItemResponse<T> {
    data: T,
}

/// `{ "data": [T] }` envelope for list endpoints whose pagination we ignore.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: AuthUser,
    token: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    decoded: TokenIdentity,
}

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the Remote Commerce API.
///
/// Cheap to clone; all clones share the connection pool and the catalog
/// caches.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: Url,
    catalog: Cache<CacheKey, CacheValue>,
    brands: Cache<CacheKey, CacheValue>,
}

impl CommerceClient {
    /// Create a new client for the configured API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Http`] if the HTTP client cannot be built and
    /// [`CommerceError::InvalidUrl`] if the base URL does not parse.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("wallmart-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // A trailing slash makes `Url::join` append to the path instead of
        // replacing its last segment.
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))?;

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url,
                catalog: Cache::builder()
                    .max_capacity(1000)
                    .time_to_live(CATALOG_TTL)
                    .build(),
                brands: Cache::builder()
                    .max_capacity(200)
                    .time_to_live(BRANDS_TTL)
                    .build(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CommerceError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request and return the envelope-checked JSON body.
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Value, CommerceError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => value,
                Err(source) if status.is_success() => {
                    tracing::error!(
                        context,
                        error = %source,
                        body = %text.chars().take(500).collect::<String>(),
                        "Failed to parse commerce API response"
                    );
                    return Err(CommerceError::Decode {
                        context: context.to_string(),
                        source,
                    });
                }
                // Error pages from proxies are not JSON; the status decides.
                Err(_) => Value::Null,
            }
        };

        if let Err(err) = check_envelope(status, &body) {
            tracing::warn!(context, status = %status, error = %err, "Commerce API request failed");
            return Err(err);
        }

        Ok(body)
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get a page of products, optionally filtered by brand.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the page cannot be decoded.
    #[instrument(skip(self))]
    pub async fn get_products(&self, query: &ProductQuery) -> Result<ProductPage, CommerceError> {
        let key = CacheKey::Products(query.clone());
        if let Some(CacheValue::Products(page)) = self.inner.catalog.get(&key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let mut url = self.endpoint("products")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &query.page.max(1).to_string());
            if let Some(brand) = &query.brand {
                pairs.append_pair("brand", brand.as_str());
            }
        }

        let body = self.send(self.inner.client.get(url), "products").await?;
        let page: ProductPage = decode(body, "products")?;

        self.inner
            .catalog
            .insert(key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] for unknown products, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, CommerceError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.catalog.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("products/{id}"))?;
        let body = self.send(self.inner.client.get(url), "product").await?;
        let response: ItemResponse<Product> = decode(body, "product")?;

        self.inner
            .catalog
            .insert(key, CacheValue::Product(Box::new(response.data.clone())))
            .await;

        Ok(response.data)
    }

    /// Get all brands.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_brands(&self) -> Result<Vec<Brand>, CommerceError> {
        if let Some(CacheValue::Brands(brands)) = self.inner.brands.get(&CacheKey::Brands).await {
            debug!("Cache hit for brands");
            return Ok(brands);
        }

        let url = self.endpoint("brands")?;
        let body = self.send(self.inner.client.get(url), "brands").await?;
        let response: ListResponse<Brand> = decode(body, "brands")?;

        self.inner
            .brands
            .insert(CacheKey::Brands, CacheValue::Brands(response.data.clone()))
            .await;

        Ok(response.data)
    }

    /// Get a single brand.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] for unknown brands, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(brand_id = %id))]
    pub async fn get_brand(&self, id: &BrandId) -> Result<Brand, CommerceError> {
        let key = CacheKey::Brand(id.clone());
        if let Some(CacheValue::Brand(brand)) = self.inner.brands.get(&key).await {
            debug!("Cache hit for brand");
            return Ok(brand);
        }

        let url = self.endpoint(&format!("brands/{id}"))?;
        let body = self.send(self.inner.client.get(url), "brand").await?;
        let response: ItemResponse<Brand> = decode(body, "brand")?;

        self.inner
            .brands
            .insert(key, CacheValue::Brand(response.data.clone()))
            .await;

        Ok(response.data)
    }

    /// Drop every cached catalog entry.
    pub fn invalidate_all(&self) {
        self.inner.catalog.invalidate_all();
        self.inner.brands.invalidate_all();
    }

    /// Check that the API answers at all. Bypasses the caches.
    ///
    /// # Errors
    ///
    /// Returns an error if the API is unreachable or answers with a failure.
    pub async fn ping(&self) -> Result<(), CommerceError> {
        let mut url = self.endpoint("brands")?;
        url.query_pairs_mut().append_pair("limit", "1");
        self.send(self.inner.client.get(url), "ping").await?;
        Ok(())
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Unauthorized`] or [`CommerceError::Rejected`]
    /// for bad credentials, or another error if the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthSession, CommerceError> {
        let url = self.endpoint("auth/signin")?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&json!({ "email": email, "password": password }));

        let body = self.send(request, "auth/signin").await?;
        let response: AuthResponse = decode(body, "auth/signin")?;

        Ok(AuthSession {
            user: response.user,
            token: SecretString::from(response.token),
        })
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Rejected`] if the API refuses the account
    /// (e.g. the email is taken), or another error if the request fails.
    #[instrument(skip(self, sign_up), fields(email = %sign_up.email))]
    pub async fn sign_up(&self, sign_up: &SignUp) -> Result<AuthSession, CommerceError> {
        let url = self.endpoint("auth/signup")?;
        let request = self.inner.client.post(url).json(sign_up);

        let body = self.send(request, "auth/signup").await?;
        let response: AuthResponse = decode(body, "auth/signup")?;

        Ok(AuthSession {
            user: response.user,
            token: SecretString::from(response.token),
        })
    }

    /// Resolve the user behind a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Unauthorized`] if the token is invalid.
    #[instrument(skip(self, token))]
    pub async fn verify_token(&self, token: &str) -> Result<TokenIdentity, CommerceError> {
        let url = self.endpoint("auth/verifyToken")?;
        let request = self.inner.client.get(url).header(TOKEN_HEADER, token);

        let body = self.send(request, "auth/verifyToken").await?;
        let response: VerifyResponse = decode(body, "auth/verifyToken")?;

        Ok(response.decoded)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Fetch the user's cart.
    ///
    /// A user who never added anything has no server cart; the API answers
    /// 404 and this returns an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &str) -> Result<CartSnapshot, CommerceError> {
        let url = self.endpoint("cart")?;
        let request = self.inner.client.get(url).header(TOKEN_HEADER, token);

        match self.send(request, "cart").await {
            Ok(body) => Ok(convert_cart(decode::<CartResponse>(body, "cart")?)),
            Err(CommerceError::NotFound(message)) => {
                debug!(%message, "No cart for user yet");
                Ok(CartSnapshot::empty(None))
            }
            Err(err) => Err(err),
        }
    }

    /// Add one unit of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request or it fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<CartSnapshot, CommerceError> {
        let url = self.endpoint("cart")?;
        let request = self
            .inner
            .client
            .post(url)
            .header(TOKEN_HEADER, token)
            .json(&json!({ "productId": product_id }));

        let body = self.send(request, "cart/add").await?;
        Ok(convert_cart(decode(body, "cart/add")?))
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request or it fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn update_cart_item(
        &self,
        token: &str,
        product_id: &ProductId,
        count: u32,
    ) -> Result<CartSnapshot, CommerceError> {
        let url = self.endpoint(&format!("cart/{product_id}"))?;
        let request = self
            .inner
            .client
            .put(url)
            .header(TOKEN_HEADER, token)
            .json(&json!({ "count": count.to_string() }));

        let body = self.send(request, "cart/update").await?;
        Ok(convert_cart(decode(body, "cart/update")?))
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request or it fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_cart_item(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<CartSnapshot, CommerceError> {
        let url = self.endpoint(&format!("cart/{product_id}"))?;
        let request = self.inner.client.delete(url).header(TOKEN_HEADER, token);

        let body = self.send(request, "cart/remove").await?;
        Ok(convert_cart(decode(body, "cart/remove")?))
    }

    /// Empty the whole cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request or it fails.
    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    pub async fn clear_cart(
        &self,
        token: &str,
        cart_id: &CartId,
    ) -> Result<CartSnapshot, CommerceError> {
        let url = self.endpoint("cart")?;
        let request = self.inner.client.delete(url).header(TOKEN_HEADER, token);

        let body = self.send(request, "cart/clear").await?;
        let response: ClearCartResponse = decode(body, "cart/clear")?;
        Ok(convert_cleared_cart(response, cart_id))
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Get the order history of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user_orders(&self, user_id: &UserId) -> Result<Vec<Order>, CommerceError> {
        let url = self.endpoint(&format!("orders/user/{user_id}"))?;
        let body = self.send(self.inner.client.get(url), "orders").await?;
        let orders: Vec<WireOrder> = decode(body, "orders")?;

        Ok(orders.into_iter().map(Order::from).collect())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn decode<T: DeserializeOwned>(body: Value, context: &str) -> Result<T, CommerceError> {
    serde_json::from_value(body).map_err(|source| CommerceError::Decode {
        context: context.to_string(),
        source,
    })
}

/// Map an HTTP status and JSON body onto success or a typed failure.
///
/// A 2xx response still fails when it carries `status` other than
/// `"success"`, or `statusMsg` of `"fail"`/`"error"`.
fn check_envelope(status: StatusCode, body: &Value) -> Result<(), CommerceError> {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned);

    if !status.is_success() {
        return Err(match status {
            StatusCode::UNAUTHORIZED => {
                CommerceError::Unauthorized(message.unwrap_or_else(|| status.to_string()))
            }
            StatusCode::NOT_FOUND => {
                CommerceError::NotFound(message.unwrap_or_else(|| status.to_string()))
            }
            StatusCode::TOO_MANY_REQUESTS => CommerceError::RateLimited,
            _ => CommerceError::Rejected {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| status.to_string()),
            },
        });
    }

    let api_status = body.get("status").and_then(Value::as_str);
    let status_msg = body.get("statusMsg").and_then(Value::as_str);
    let rejected = api_status.is_some_and(|s| s != "success")
        || status_msg.is_some_and(|s| s == "fail" || s == "error");

    if rejected {
        let fallback = api_status.or(status_msg).unwrap_or("rejected");
        return Err(CommerceError::Rejected {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| fallback.to_string()),
        });
    }

    Ok(())
}
