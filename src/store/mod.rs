//! The market session store: single source of truth for catalog, cart,
//! filters, panel visibility, and the last-known emotion vector.
//!
//! All mutations are synchronous and total. The only rejection path is the
//! stock guard on cart operations, and it is surfaced through the notice
//! channel and the returned [`CartOutcome`], never an error. Derived values
//! are plain methods recomputed on every call, so they can never go stale.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::emotion::{self, EmotionVector};

/// Most-recent discount samples retained for charting.
const HISTORY_CAP: usize = 20;

/// Active product filters; all fields independently optional, combined as
/// a logical AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub category: Option<String>,
    pub color: Option<String>,
    pub max_price: Option<f64>,
}

impl Filters {
    /// True if no filter is active.
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.color.is_none() && self.max_price.is_none()
    }
}

/// A partial filter update; `None` fields retain their prior value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterPatch {
    pub category: Option<String>,
    pub color: Option<String>,
    pub max_price: Option<f64>,
}

/// A product plus the quantity in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Line total for this entry.
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// Outcome of a cart mutation. Rejections are outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOutcome {
    /// Quantity added (new entry or increment applied).
    Added { quantity: u32 },
    /// Quantity set exactly.
    Updated { quantity: u32 },
    /// Entry removed (explicitly or via quantity <= 0).
    Removed,
    /// Stock guard tripped; nothing changed. `available` is how many more
    /// units could still be added.
    Rejected { available: u32 },
    /// Store is inert after session teardown; nothing changed.
    Ignored,
}

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
}

/// A user-visible notification raised by a store mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
}

/// Navigation targets a tool call can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Orders,
}

/// One retained (timestamp, discount) sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountSample {
    pub at: DateTime<Utc>,
    pub discount: u8,
}

/// Current cart totals, always derived from live state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSnapshot {
    pub subtotal: f64,
    pub discount_percent: u8,
    pub discount_amount: f64,
    pub total: f64,
}

/// The persisted slice of store state, written under the configured
/// storage key. Restoring never re-validates stock against the (possibly
/// stale) cached products.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub products: Vec<Product>,
    pub filters: Filters,
    pub cart: Vec<CartItem>,
    pub delivery_address: Option<String>,
}

/// The market session store.
#[derive(Debug, Clone)]
pub struct MarketStore {
    products: Vec<Product>,
    filters: Filters,
    cart: Vec<CartItem>,
    cart_open: bool,
    checkout_open: bool,
    filter_open: bool,
    emotion_data: EmotionVector,
    history: VecDeque<DiscountSample>,
    delivery_address: Option<String>,
    pending_route: Option<Route>,
    busy: HashSet<String>,
    notice: Option<Notice>,
    active: bool,
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketStore {
    /// Construct an empty store: no products, no filters, empty cart,
    /// empty emotion vector, all panels closed.
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
            filters: Filters::default(),
            cart: Vec::new(),
            cart_open: false,
            checkout_open: false,
            filter_open: false,
            emotion_data: EmotionVector::new(),
            history: VecDeque::new(),
            delivery_address: None,
            pending_route: None,
            busy: HashSet::new(),
            notice: None,
            active: true,
        }
    }

    // ------------------------------------------------------------------
    // Catalog and filters
    // ------------------------------------------------------------------

    /// Replace the product list wholesale. Used once after catalog fetch;
    /// no merge semantics.
    pub fn set_products(&mut self, products: Vec<Product>) {
        if !self.active {
            return;
        }
        self.products = products;
    }

    /// All products, unfiltered.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Shallow-merge the provided filter fields; absent fields keep their
    /// prior value.
    pub fn set_filters(&mut self, patch: FilterPatch) {
        if !self.active {
            return;
        }
        if let Some(category) = patch.category {
            self.filters.category = Some(category);
        }
        if let Some(color) = patch.color {
            self.filters.color = Some(color);
        }
        if let Some(max_price) = patch.max_price {
            self.filters.max_price = Some(max_price);
        }
    }

    /// Reset all three filters to absent.
    pub fn clear_filters(&mut self) {
        if !self.active {
            return;
        }
        self.filters = Filters::default();
    }

    /// Current filters.
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Products passing every active filter predicate: category exact
    /// match, price <= max, color as case-insensitive substring of any tag.
    pub fn filtered_products(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| {
                if let Some(category) = &self.filters.category {
                    if &product.category != category {
                        return false;
                    }
                }
                if let Some(max_price) = self.filters.max_price {
                    if product.price > max_price {
                        return false;
                    }
                }
                if let Some(color) = &self.filters.color {
                    let needle = color.to_lowercase();
                    if !product
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&needle))
                    {
                        return false;
                    }
                }
                true
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Cart
    // ------------------------------------------------------------------

    /// Add a product to the cart, incrementing the existing entry if
    /// present. Rejects the entire operation when the combined quantity
    /// would exceed stock, raising a notice naming how many units are
    /// still available.
    pub fn add_to_cart(&mut self, product: &Product, quantity: u32) -> CartOutcome {
        if !self.active {
            return CartOutcome::Ignored;
        }

        let current = self
            .cart
            .iter()
            .find(|item| item.product.id == product.id)
            .map(|item| item.quantity)
            .unwrap_or(0);

        if current.saturating_add(quantity) > product.stock {
            let available = product.stock.saturating_sub(current);
            self.raise_notice(
                format!(
                    "Only {} more of \"{}\" available",
                    available, product.title
                ),
                NoticeKind::Warning,
            );
            return CartOutcome::Rejected { available };
        }

        match self
            .cart
            .iter_mut()
            .find(|item| item.product.id == product.id)
        {
            Some(item) => item.quantity += quantity,
            None => self.cart.push(CartItem {
                product: product.clone(),
                quantity,
            }),
        }

        CartOutcome::Added { quantity }
    }

    /// Drop the matching cart entry; no-op if absent.
    pub fn remove_from_cart(&mut self, product_id: &str) {
        if !self.active {
            return;
        }
        self.cart.retain(|item| item.product.id != product_id);
    }

    /// Set a cart entry's quantity exactly. Zero or negative removes the
    /// entry; exceeding stock rejects with no state change.
    pub fn update_cart_quantity(&mut self, product_id: &str, quantity: i64) -> CartOutcome {
        if !self.active {
            return CartOutcome::Ignored;
        }

        if quantity <= 0 {
            self.cart.retain(|item| item.product.id != product_id);
            return CartOutcome::Removed;
        }
        // Anything past u32::MAX can never fit in stock; clamp so the
        // guard below rejects it instead of truncating.
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        match self
            .cart
            .iter_mut()
            .find(|item| item.product.id == product_id)
        {
            Some(item) => {
                if quantity > item.product.stock {
                    let available = item.product.stock;
                    self.raise_notice(
                        format!("Only {} of that item available", available),
                        NoticeKind::Warning,
                    );
                    return CartOutcome::Rejected { available };
                }
                item.quantity = quantity;
                CartOutcome::Updated { quantity }
            }
            None => CartOutcome::Removed,
        }
    }

    /// Decrement a product's local stock, floored at 0. Reflects a
    /// completed purchase without re-fetching the catalog.
    pub fn reduce_stock(&mut self, product_id: &str, quantity: u32) {
        if !self.active {
            return;
        }
        if let Some(product) = self.products.iter_mut().find(|p| p.id == product_id) {
            product.stock = product.stock.saturating_sub(quantity);
        }
        // Keep cart copies of the product consistent with the catalog view.
        if let Some(item) = self.cart.iter_mut().find(|i| i.product.id == product_id) {
            item.product.stock = item.product.stock.saturating_sub(quantity);
        }
    }

    /// Empty the cart. Used post-purchase.
    pub fn clear_cart(&mut self) {
        if !self.active {
            return;
        }
        self.cart.clear();
    }

    /// Current cart entries.
    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    // ------------------------------------------------------------------
    // Emotion state
    // ------------------------------------------------------------------

    /// Replace the current emotion vector wholesale (no merge) and append
    /// a derived discount sample to the bounded session history.
    pub fn set_emotion_data(&mut self, vector: EmotionVector) {
        if !self.active {
            return;
        }
        self.emotion_data = vector;
        self.history.push_back(DiscountSample {
            at: Utc::now(),
            discount: emotion::compute_discount(&self.emotion_data),
        });
        while self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
    }

    /// The last-known emotion vector.
    pub fn emotion_data(&self) -> &EmotionVector {
        &self.emotion_data
    }

    /// Bounded trailing history of discount samples, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &DiscountSample> {
        self.history.iter()
    }

    // ------------------------------------------------------------------
    // Derived values (recomputed on every call, never cached)
    // ------------------------------------------------------------------

    /// Sum of price x quantity over the cart.
    pub fn cart_total(&self) -> f64 {
        self.cart.iter().map(CartItem::line_total).sum()
    }

    /// Discount percentage derived from the current emotion vector.
    pub fn emotion_discount(&self) -> u8 {
        emotion::compute_discount(&self.emotion_data)
    }

    /// Cart total after the emotion discount.
    pub fn final_total(&self) -> f64 {
        self.cart_total() * (1.0 - f64::from(self.emotion_discount()) / 100.0)
    }

    /// Full totals breakdown for checkout and order records.
    pub fn cart_snapshot(&self) -> CartSnapshot {
        let subtotal = self.cart_total();
        let discount_percent = self.emotion_discount();
        let discount_amount = subtotal * f64::from(discount_percent) / 100.0;
        CartSnapshot {
            subtotal,
            discount_percent,
            discount_amount,
            total: subtotal - discount_amount,
        }
    }

    // ------------------------------------------------------------------
    // Panels, notices, navigation
    // ------------------------------------------------------------------

    /// Open or close the cart panel.
    pub fn set_cart_open(&mut self, open: bool) {
        if !self.active {
            return;
        }
        self.cart_open = open;
    }

    /// Open or close the checkout panel. Opening checkout force-closes the
    /// cart panel; no other cross-flag coupling.
    pub fn set_checkout_open(&mut self, open: bool) {
        if !self.active {
            return;
        }
        self.checkout_open = open;
        if open {
            self.cart_open = false;
        }
    }

    /// Open or close the filter panel.
    pub fn set_filter_open(&mut self, open: bool) {
        if !self.active {
            return;
        }
        self.filter_open = open;
    }

    pub fn cart_open(&self) -> bool {
        self.cart_open
    }

    pub fn checkout_open(&self) -> bool {
        self.checkout_open
    }

    pub fn filter_open(&self) -> bool {
        self.filter_open
    }

    /// Store the delivery address collected over voice.
    pub fn set_delivery_address(&mut self, address: impl Into<String>) {
        if !self.active {
            return;
        }
        self.delivery_address = Some(address.into());
    }

    pub fn delivery_address(&self) -> Option<&str> {
        self.delivery_address.as_deref()
    }

    /// Request navigation to a view; the UI glue consumes it.
    pub fn set_pending_route(&mut self, route: Route) {
        if !self.active {
            return;
        }
        self.pending_route = Some(route);
    }

    /// Take the pending navigation request, if any.
    pub fn take_pending_route(&mut self) -> Option<Route> {
        self.pending_route.take()
    }

    /// Mark an operation in flight under an arbitrary key, e.g.
    /// `add-<productId>`, for optimistic UI feedback.
    pub fn set_busy(&mut self, key: impl Into<String>, busy: bool) {
        if !self.active {
            return;
        }
        let key = key.into();
        if busy {
            self.busy.insert(key);
        } else {
            self.busy.remove(&key);
        }
    }

    pub fn is_busy(&self, key: &str) -> bool {
        self.busy.contains(key)
    }

    fn raise_notice(&mut self, text: String, kind: NoticeKind) {
        self.notice = Some(Notice { text, kind });
    }

    /// Take the most recent notice, clearing the channel.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Peek at the most recent notice without clearing it.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Make the store inert: subsequent mutations are no-ops, reads stay
    /// valid. Used at session teardown. Cart and catalog are retained.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Whether mutations are currently applied.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Reset to the documented initial state: empty cart, no filters,
    /// empty emotion vector. Products are retained.
    pub fn reset_session(&mut self) {
        if !self.active {
            return;
        }
        self.filters = Filters::default();
        self.cart.clear();
        self.cart_open = false;
        self.checkout_open = false;
        self.filter_open = false;
        self.emotion_data = EmotionVector::new();
        self.history.clear();
        self.delivery_address = None;
        self.pending_route = None;
        self.busy.clear();
        self.notice = None;
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// The persisted slice of state.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            products: self.products.clone(),
            filters: self.filters.clone(),
            cart: self.cart.clone(),
            delivery_address: self.delivery_address.clone(),
        }
    }

    /// Restore persisted state. Stock is not re-validated: the cached
    /// products may be stale and the guard only applies to new mutations.
    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        if !self.active {
            return;
        }
        self.products = snapshot.products;
        self.filters = snapshot.filters;
        self.cart = snapshot.cart;
        self.delivery_address = snapshot.delivery_address;
    }
}
