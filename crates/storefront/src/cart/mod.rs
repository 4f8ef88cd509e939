//! Per-user cart store.
//!
//! Each signed-in user gets one [`CartStore`]: a `tokio::sync::watch` cell
//! holding the last cart snapshot the server returned plus the set of
//! controls with a request in flight.
//!
//! # Rules
//!
//! - The snapshot is only ever replaced wholesale by the result of a
//!   successful fetch or mutation. It is never patched locally.
//! - A failed operation leaves the snapshot untouched.
//! - A control (update/remove of one product, add of one product, clear)
//!   accepts one request at a time; a duplicate is rejected with
//!   [`CartError::Busy`] before any server call.
//! - Unrelated mutations are not serialized. Whichever response arrives
//!   last overwrites the snapshot.

mod api;
mod registry;

pub use api::{AuthorizedCart, CartApi};
pub use registry::CartStores;

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use wallmart_core::{CartId, CartSnapshot, ProductId};

use crate::commerce::CommerceError;

/// Errors from cart store operations.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// Quantity that is not a whole number from 1 to `u32::MAX`. Carries
    /// the submitted value.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// The same control already has a request in flight.
    #[error("a request from this control is already in flight")]
    Busy,

    #[error(transparent)]
    Commerce(#[from] CommerceError),
}

impl CartError {
    /// Notification for a failed operation.
    ///
    /// Remote failures collapse into `failure`, except an expired session
    /// which the customer has to act on.
    #[must_use]
    pub fn notice(&self, failure: &str) -> Notice {
        match self {
            Self::InvalidQuantity(_) => Notice::error("Please enter a valid quantity"),
            Self::Busy => Notice::error("Still working on your last change"),
            Self::Commerce(err @ CommerceError::Unauthorized(_)) => Notice::error(err.user_message()),
            Self::Commerce(_) => Notice::error(failure),
        }
    }
}

// =============================================================================
// Notices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient notification for the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The snapshot the server returned, now current.
    pub snapshot: Arc<CartSnapshot>,
    pub notice: Option<Notice>,
}

// =============================================================================
// State
// =============================================================================

/// Observable state of one user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Last server-confirmed cart. `None` until the first successful fetch.
    pub snapshot: Option<Arc<CartSnapshot>>,
    loading: u32,
    adding: HashSet<ProductId>,
    updating: HashSet<ProductId>,
    removing: HashSet<ProductId>,
    clearing: bool,
}

impl CartState {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading > 0
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    #[must_use]
    pub fn is_adding(&self, product_id: &ProductId) -> bool {
        self.adding.contains(product_id)
    }

    #[must_use]
    pub fn is_updating(&self, product_id: &ProductId) -> bool {
        self.updating.contains(product_id)
    }

    #[must_use]
    pub fn is_removing(&self, product_id: &ProductId) -> bool {
        self.removing.contains(product_id)
    }

    #[must_use]
    pub const fn is_clearing(&self) -> bool {
        self.clearing
    }

    /// Whether the controls of a cart line should be disabled.
    #[must_use]
    pub fn is_line_busy(&self, product_id: &ProductId) -> bool {
        self.clearing || self.is_updating(product_id) || self.is_removing(product_id)
    }

    /// Item count as reported by the server; 0 before the first fetch.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.snapshot
            .as_ref()
            .map_or(0, |snapshot| snapshot.num_of_cart_items)
    }

    /// Mark `control` in flight. Returns `false` if it already was.
    fn hold(&mut self, control: &Control) -> bool {
        match control {
            Control::Add(id) => self.adding.insert(id.clone()),
            Control::Update(id) => self.updating.insert(id.clone()),
            Control::Remove(id) => self.removing.insert(id.clone()),
            Control::Clear => !std::mem::replace(&mut self.clearing, true),
        }
    }

    fn release(&mut self, control: &Control) {
        match control {
            Control::Add(id) => {
                self.adding.remove(id);
            }
            Control::Update(id) => {
                self.updating.remove(id);
            }
            Control::Remove(id) => {
                self.removing.remove(id);
            }
            Control::Clear => self.clearing = false,
        }
    }
}

#[derive(Debug, Clone)]
enum Control {
    Add(ProductId),
    Update(ProductId),
    Remove(ProductId),
    Clear,
}

/// Releases a control when the operation ends, however it ends.
struct InFlight<'a> {
    state: &'a watch::Sender<CartState>,
    control: Control,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|state| state.release(&self.control));
    }
}

struct Loading<'a>(&'a watch::Sender<CartState>);

impl<'a> Loading<'a> {
    fn start(state: &'a watch::Sender<CartState>) -> Self {
        state.send_modify(|state| state.loading += 1);
        Self(state)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0
            .send_modify(|state| state.loading = state.loading.saturating_sub(1));
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// One user's cart.
#[derive(Debug)]
pub struct CartStore {
    state: watch::Sender<CartState>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create an unloaded store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(CartState::default()),
        }
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Current snapshot, if loaded.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<CartSnapshot>> {
        self.state.borrow().snapshot.clone()
    }

    fn begin(&self, control: Control) -> Result<InFlight<'_>, CartError> {
        if !self.state.send_if_modified(|state| state.hold(&control)) {
            debug!(?control, "Rejected duplicate cart submission");
            return Err(CartError::Busy);
        }
        Ok(InFlight {
            state: &self.state,
            control,
        })
    }

    fn replace(&self, snapshot: CartSnapshot) -> Arc<CartSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.state
            .send_modify(|state| state.snapshot = Some(Arc::clone(&snapshot)));
        snapshot
    }

    /// Return the cart, fetching it if it has not been loaded yet.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Commerce`] if the fetch fails; the store stays
    /// unloaded.
    #[instrument(skip_all)]
    pub async fn get_cart<A: CartApi>(&self, api: &A) -> Result<Arc<CartSnapshot>, CartError> {
        if let Some(snapshot) = self.snapshot() {
            return Ok(snapshot);
        }
        self.refresh(api).await
    }

    /// Fetch the cart from the server, replacing whatever is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Commerce`] if the fetch fails; the previous
    /// snapshot stays current.
    #[instrument(skip_all)]
    pub async fn refresh<A: CartApi>(&self, api: &A) -> Result<Arc<CartSnapshot>, CartError> {
        let _loading = Loading::start(&self.state);
        let snapshot = api
            .fetch_cart()
            .await
            .inspect_err(|err| warn!(error = %err, "Failed to fetch cart"))?;

        Ok(self.replace(snapshot))
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Busy`] if the same product is already being
    /// added, or [`CartError::Commerce`] if the server call fails.
    #[instrument(skip(self, api), fields(product_id = %product_id))]
    pub async fn add_item<A: CartApi>(
        &self,
        api: &A,
        product_id: &ProductId,
    ) -> Result<Outcome, CartError> {
        let _in_flight = self.begin(Control::Add(product_id.clone()))?;
        let snapshot = api
            .add_item(product_id)
            .await
            .inspect_err(|err| warn!(error = %err, "Failed to add cart item"))?;

        Ok(Outcome {
            snapshot: self.replace(snapshot),
            notice: Some(Notice::success("Product added to cart")),
        })
    }

    /// Set the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for `count < 1` (or past
    /// `u32::MAX`) without
    /// calling the server, [`CartError::Busy`] if the line is already
    /// updating, or [`CartError::Commerce`] if the server call fails.
    #[instrument(skip(self, api), fields(product_id = %product_id))]
    pub async fn update_item<A: CartApi>(
        &self,
        api: &A,
        product_id: &ProductId,
        count: i64,
    ) -> Result<Outcome, CartError> {
        let quantity = u32::try_from(count)
            .ok()
            .filter(|&quantity| quantity >= 1)
            .ok_or_else(|| CartError::InvalidQuantity(count.to_string()))?;

        let _in_flight = self.begin(Control::Update(product_id.clone()))?;
        let snapshot = api
            .update_item(product_id, quantity)
            .await
            .inspect_err(|err| warn!(error = %err, "Failed to update cart item"))?;

        Ok(Outcome {
            snapshot: self.replace(snapshot),
            notice: None,
        })
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Busy`] if the line is already being removed,
    /// or [`CartError::Commerce`] if the server call fails.
    #[instrument(skip(self, api), fields(product_id = %product_id))]
    pub async fn remove_item<A: CartApi>(
        &self,
        api: &A,
        product_id: &ProductId,
    ) -> Result<Outcome, CartError> {
        let _in_flight = self.begin(Control::Remove(product_id.clone()))?;
        let snapshot = api
            .remove_item(product_id)
            .await
            .inspect_err(|err| warn!(error = %err, "Failed to remove cart item"))?;

        Ok(Outcome {
            snapshot: self.replace(snapshot),
            notice: Some(Notice::success("Item removed")),
        })
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Busy`] if a clear is already in flight, or
    /// [`CartError::Commerce`] if the server call fails.
    #[instrument(skip(self, api), fields(cart_id = %cart_id))]
    pub async fn clear_cart<A: CartApi>(
        &self,
        api: &A,
        cart_id: &CartId,
    ) -> Result<Outcome, CartError> {
        let _in_flight = self.begin(Control::Clear)?;
        let snapshot = api
            .clear(cart_id)
            .await
            .inspect_err(|err| warn!(error = %err, "Failed to clear cart"))?;

        Ok(Outcome {
            snapshot: self.replace(snapshot),
            notice: Some(Notice::success("Cart cleared successfully")),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal::Decimal;
    use tokio::sync::Notify;
    use wallmart_core::{CartLineItem, CartProduct, LineItemId};

    use super::*;

    struct Reply {
        gate: Option<Arc<Notify>>,
        result: Result<CartSnapshot, CommerceError>,
    }

    impl Reply {
        fn ok(snapshot: CartSnapshot) -> Self {
            Self {
                gate: None,
                result: Ok(snapshot),
            }
        }

        fn rejected(message: &str) -> Self {
            Self {
                gate: None,
                result: Err(CommerceError::Rejected {
                    status: 400,
                    message: message.to_string(),
                }),
            }
        }

        fn gated(gate: &Arc<Notify>, snapshot: CartSnapshot) -> Self {
            Self {
                gate: Some(Arc::clone(gate)),
                result: Ok(snapshot),
            }
        }
    }

    /// Answers calls in order from a script of replies.
    struct ScriptedApi {
        replies: Mutex<VecDeque<Reply>>,
        calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn reply(&self) -> Result<CartSnapshot, CommerceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected cart call");
            if let Some(gate) = reply.gate {
                gate.notified().await;
            }
            reply.result
        }
    }

    impl CartApi for ScriptedApi {
        async fn fetch_cart(&self) -> Result<CartSnapshot, CommerceError> {
            self.reply().await
        }

        async fn add_item(&self, _: &ProductId) -> Result<CartSnapshot, CommerceError> {
            self.reply().await
        }

        async fn update_item(&self, _: &ProductId, _: u32) -> Result<CartSnapshot, CommerceError> {
            self.reply().await
        }

        async fn remove_item(&self, _: &ProductId) -> Result<CartSnapshot, CommerceError> {
            self.reply().await
        }

        async fn clear(&self, _: &CartId) -> Result<CartSnapshot, CommerceError> {
            self.reply().await
        }
    }

    fn pid(id: &str) -> ProductId {
        ProductId::new(id)
    }

    fn cart(lines: &[(&str, u32, i64)], total: i64) -> CartSnapshot {
        CartSnapshot {
            cart_id: Some(CartId::new("cart-1")),
            num_of_cart_items: u32::try_from(lines.len()).unwrap(),
            products: lines
                .iter()
                .map(|&(product, count, price)| CartLineItem {
                    id: LineItemId::new(format!("line-{product}")),
                    product: CartProduct::bare(pid(product)),
                    count,
                    price: Decimal::new(price, 0),
                })
                .collect(),
            total_cart_price: Decimal::new(total, 0),
        }
    }

    fn a2_b1() -> CartSnapshot {
        cart(&[("A", 2, 100), ("B", 1, 50)], 250)
    }

    #[tokio::test]
    async fn test_get_cart_fetches_once() {
        let api = ScriptedApi::new([Reply::ok(a2_b1())]);
        let store = CartStore::new();

        let first = store.get_cart(&api).await.unwrap();
        let second = store.get_cart(&api).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.calls(), 1);
        assert!(!store.state().is_loading());
    }

    #[tokio::test]
    async fn test_refresh_refetches_and_keeps_prior_on_failure() {
        let updated = cart(&[("A", 5, 100)], 500);
        let api = ScriptedApi::new([
            Reply::ok(a2_b1()),
            Reply::ok(updated.clone()),
            Reply::rejected("down"),
        ]);
        let store = CartStore::new();
        store.get_cart(&api).await.unwrap();

        assert_eq!(*store.refresh(&api).await.unwrap(), updated);
        assert!(store.refresh(&api).await.is_err());
        assert_eq!(*store.snapshot().unwrap(), updated);
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_store_unloaded() {
        let api = ScriptedApi::new([Reply::rejected("down")]);
        let store = CartStore::new();

        assert!(store.get_cart(&api).await.is_err());

        let state = store.state();
        assert!(!state.is_loaded());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_update_replaces_snapshot_with_server_state() {
        let updated = cart(&[("A", 3, 100), ("B", 1, 50)], 350);
        let api = ScriptedApi::new([Reply::ok(a2_b1()), Reply::ok(updated)]);
        let store = CartStore::new();
        store.get_cart(&api).await.unwrap();

        let outcome = store.update_item(&api, &pid("A"), 3).await.unwrap();

        let state = store.state();
        let snapshot = state.snapshot.clone().unwrap();
        assert_eq!(snapshot.line(&pid("A")).unwrap().count, 3);
        assert_eq!(snapshot.line(&pid("B")).unwrap().count, 1);
        assert_eq!(snapshot.total_cart_price, Decimal::new(350, 0));
        assert_eq!(outcome.snapshot, snapshot);
        assert!(outcome.notice.is_none());
        assert!(!state.is_updating(&pid("A")));
    }

    #[tokio::test]
    async fn test_update_below_one_is_rejected_without_server_call() {
        let api = ScriptedApi::new([Reply::ok(a2_b1())]);
        let store = CartStore::new();
        store.get_cart(&api).await.unwrap();
        let before = store.state();

        for count in [0, -1, i64::from(u32::MAX) + 1] {
            let err = store.update_item(&api, &pid("A"), count).await.unwrap_err();
            assert!(matches!(err, CartError::InvalidQuantity(c) if c == count.to_string()));
        }

        assert_eq!(api.calls(), 1);
        assert_eq!(store.state(), before);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_count_and_total() {
        let api = ScriptedApi::new([Reply::ok(a2_b1()), Reply::rejected("out of stock")]);
        let store = CartStore::new();
        store.get_cart(&api).await.unwrap();

        let err = store.update_item(&api, &pid("A"), 9).await.unwrap_err();
        assert!(matches!(err, CartError::Commerce(CommerceError::Rejected { .. })));

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.line(&pid("A")).unwrap().count, 2);
        assert_eq!(snapshot.total_cart_price, Decimal::new(250, 0));
        assert!(!store.state().is_updating(&pid("A")));
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_item() {
        let api = ScriptedApi::new([Reply::ok(a2_b1()), Reply::rejected("nope")]);
        let store = CartStore::new();
        store.get_cart(&api).await.unwrap();

        assert!(store.remove_item(&api, &pid("B")).await.is_err());

        assert!(store.snapshot().unwrap().line(&pid("B")).is_some());
        assert!(!store.state().is_removing(&pid("B")));
    }

    #[tokio::test]
    async fn test_remove_notifies() {
        let api = ScriptedApi::new([Reply::ok(a2_b1()), Reply::ok(cart(&[("A", 2, 100)], 200))]);
        let store = CartStore::new();
        store.get_cart(&api).await.unwrap();

        let outcome = store.remove_item(&api, &pid("B")).await.unwrap();

        assert!(outcome.snapshot.line(&pid("B")).is_none());
        assert_eq!(outcome.notice, Some(Notice::success("Item removed")));
    }

    #[tokio::test]
    async fn test_count_comes_from_server() {
        let mut reply = cart(&[("A", 2, 100), ("C", 1, 10)], 210);
        reply.num_of_cart_items = 7;
        let api = ScriptedApi::new([Reply::ok(reply)]);
        let store = CartStore::new();

        store.add_item(&api, &pid("C")).await.unwrap();

        assert_eq!(store.state().count(), 7);
    }

    #[tokio::test]
    async fn test_clear_empties_cart() {
        let api = ScriptedApi::new([
            Reply::ok(a2_b1()),
            Reply::ok(CartSnapshot::empty(Some(CartId::new("cart-1")))),
        ]);
        let store = CartStore::new();
        store.get_cart(&api).await.unwrap();

        let outcome = store.clear_cart(&api, &CartId::new("cart-1")).await.unwrap();

        assert!(outcome.snapshot.is_empty());
        assert_eq!(outcome.snapshot.total_cart_price, Decimal::ZERO);
        assert_eq!(outcome.notice, Some(Notice::success("Cart cleared successfully")));
        assert!(!store.state().is_clearing());
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_busy() {
        let gate = Arc::new(Notify::new());
        let updated = cart(&[("A", 3, 100), ("B", 1, 50)], 350);
        let api = Arc::new(ScriptedApi::new([
            Reply::ok(a2_b1()),
            Reply::gated(&gate, updated),
        ]));
        let store = Arc::new(CartStore::new());
        store.get_cart(api.as_ref()).await.unwrap();
        let mut rx = store.subscribe();

        let task = tokio::spawn({
            let (store, api) = (Arc::clone(&store), Arc::clone(&api));
            async move { store.update_item(api.as_ref(), &pid("A"), 3).await }
        });
        rx.wait_for(|state| state.is_updating(&pid("A")))
            .await
            .unwrap();

        let err = store.update_item(api.as_ref(), &pid("A"), 4).await.unwrap_err();
        assert!(matches!(err, CartError::Busy));
        assert_eq!(api.calls(), 2);

        let state = store.state();
        assert!(state.is_line_busy(&pid("A")));
        assert!(!state.is_line_busy(&pid("B")));

        gate.notify_one();
        task.await.unwrap().unwrap();

        let state = store.state();
        assert!(!state.is_updating(&pid("A")));
        assert_eq!(state.snapshot.unwrap().line(&pid("A")).unwrap().count, 3);
    }

    #[tokio::test]
    async fn test_last_response_wins() {
        let update_gate = Arc::new(Notify::new());
        let remove_gate = Arc::new(Notify::new());
        let after_update = cart(&[("A", 3, 100), ("B", 1, 50)], 350);
        let after_remove = cart(&[("A", 2, 100)], 200);
        let api = Arc::new(ScriptedApi::new([
            Reply::ok(a2_b1()),
            Reply::gated(&update_gate, after_update.clone()),
            Reply::gated(&remove_gate, after_remove.clone()),
        ]));
        let store = Arc::new(CartStore::new());
        store.get_cart(api.as_ref()).await.unwrap();
        let mut rx = store.subscribe();

        let update = tokio::spawn({
            let (store, api) = (Arc::clone(&store), Arc::clone(&api));
            async move { store.update_item(api.as_ref(), &pid("A"), 3).await }
        });
        rx.wait_for(|state| state.is_updating(&pid("A")))
            .await
            .unwrap();

        let remove = tokio::spawn({
            let (store, api) = (Arc::clone(&store), Arc::clone(&api));
            async move { store.remove_item(api.as_ref(), &pid("B")).await }
        });
        rx.wait_for(|state| state.is_removing(&pid("B")))
            .await
            .unwrap();

        remove_gate.notify_one();
        remove.await.unwrap().unwrap();
        assert_eq!(*store.snapshot().unwrap(), after_remove);

        update_gate.notify_one();
        update.await.unwrap().unwrap();
        assert_eq!(*store.snapshot().unwrap(), after_update);
    }

    #[test]
    fn test_failure_notice() {
        let rejected = CartError::Commerce(CommerceError::Rejected {
            status: 400,
            message: "internal detail".to_string(),
        });
        assert_eq!(
            rejected.notice("Failed to clear cart"),
            Notice::error("Failed to clear cart")
        );

        let expired = CartError::Commerce(CommerceError::Unauthorized("jwt expired".to_string()));
        assert_eq!(expired.notice("Failed to clear cart").level, NoticeLevel::Error);
        assert!(!expired.notice("x").message.contains("jwt"));
    }
}
