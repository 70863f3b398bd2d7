//! Payment gateway boundary and checkout completion.
//!
//! The core hands the gateway the cart plus the discount percentage and
//! gets back a redirect target; the gateway's internal session model is
//! not modeled here. Completion writes the order record fire-and-forget,
//! decrements stock locally (and remotely best-effort), and clears the
//! cart. A failing collaborator degrades the flow, it never aborts it.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::catalog::CatalogClient;
use crate::config::{PaymentConfig, RequestConfig};
use crate::emotion;
use crate::error::{PaymentError, PaymentResult};
use crate::storage::{Order, Storage};
use crate::store::{CartItem, MarketStore};

/// One gateway line item with the discount already applied to unit cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    /// Discounted unit price in cents.
    pub unit_amount: i64,
    pub quantity: u32,
}

/// The gateway's checkout session handle.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Result of a completed checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order_id: String,
    pub redirect_url: String,
    pub total: f64,
}

/// Build gateway line items from the cart.
///
/// Each product's emotion boost scales the global discount before it is
/// applied to that item's unit cents, so a single cart mixes discount
/// depths.
pub fn line_items(items: &[CartItem], global_discount: u8) -> Vec<LineItem> {
    items
        .iter()
        .map(|item| {
            let item_discount =
                emotion::compute_product_discount(global_discount, item.product.emotion_boost);
            let unit_amount =
                (item.product.price * 100.0 * (1.0 - f64::from(item_discount) / 100.0)).round()
                    as i64;
            LineItem {
                name: item.product.title.clone(),
                unit_amount,
                quantity: item.quantity,
            }
        })
        .collect()
}

/// Client for the payment gateway's checkout-session API.
#[derive(Clone)]
pub struct CheckoutClient {
    client: Client,
    base_url: String,
    api_key: String,
    success_url: String,
    cancel_url: String,
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    line_items: &'a [LineItem],
    mode: &'static str,
    success_url: &'a str,
    cancel_url: &'a str,
    metadata: SessionMetadata,
}

#[derive(Debug, Serialize)]
struct SessionMetadata {
    discount_percent: u8,
}

impl CheckoutClient {
    /// Create a new checkout client
    pub fn new(config: &PaymentConfig, request_config: RequestConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(PaymentError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
        })
    }

    /// Create a checkout session and return the redirect handle.
    pub async fn create_session(
        &self,
        items: &[LineItem],
        discount_percent: u8,
    ) -> PaymentResult<CheckoutSession> {
        if items.is_empty() {
            return Err(PaymentError::EmptyCart);
        }

        let url = format!("{}/v1/checkout/sessions", self.base_url);
        let request = SessionRequest {
            line_items: items,
            mode: "payment",
            success_url: &self.success_url,
            cancel_url: &self.cancel_url,
            metadata: SessionMetadata { discount_percent },
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(PaymentError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let session: CheckoutSession =
            response
                .json()
                .await
                .map_err(|e| PaymentError::InvalidResponse {
                    message: format!("Failed to parse session response: {}", e),
                })?;

        info!(session = %session.id, "Checkout session created");
        Ok(session)
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Complete a checkout: create the gateway session, record the order,
/// reconcile stock, and clear the cart.
///
/// Only the gateway call can fail the flow. The order write and the remote
/// stock write-back are fire-and-forget: failures are logged and checkout
/// proceeds on local state.
pub async fn complete_checkout(
    store: &mut MarketStore,
    payments: &CheckoutClient,
    catalog: &CatalogClient,
    storage: &dyn Storage,
    session_id: &str,
) -> PaymentResult<CheckoutOutcome> {
    if store.cart().is_empty() {
        return Err(PaymentError::EmptyCart);
    }

    let totals = store.cart_snapshot();
    let items = line_items(store.cart(), totals.discount_percent);

    let session = payments
        .create_session(&items, totals.discount_percent)
        .await?;

    let order = Order::new(
        session_id,
        store.cart().to_vec(),
        totals.subtotal,
        totals.discount_percent,
        store.emotion_data().clone(),
    );

    if let Err(e) = storage.insert_order(&order).await {
        warn!(error = %e, order = %order.id, "Order write failed; continuing");
    }

    let purchased: Vec<(String, u32)> = store
        .cart()
        .iter()
        .map(|item| (item.product.id.clone(), item.quantity))
        .collect();

    for (product_id, quantity) in &purchased {
        if let Err(e) = catalog.decrement_stock(product_id, *quantity).await {
            warn!(
                error = %e,
                product_id = %product_id,
                "Remote stock write-back failed; local state only"
            );
        }
        store.reduce_stock(product_id, *quantity);
    }

    store.clear_cart();
    store.set_checkout_open(false);

    info!(
        order = %order.id,
        total = totals.total,
        discount_percent = totals.discount_percent,
        "Checkout completed"
    );

    Ok(CheckoutOutcome {
        order_id: order.id,
        redirect_url: session.url,
        total: totals.total,
    })
}
