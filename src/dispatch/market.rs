use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{normalize_address, parse_parameters, Disposition};
use crate::catalog::Product;
use crate::error::{DispatchError, DispatchResult};
use crate::store::{CartOutcome, FilterPatch, MarketStore, Route};

/// Route a storefront tool call to the matching store mutation.
///
/// Returns exactly one disposition per call; unknown names and malformed
/// payloads surface as [`DispatchError`] for the session to answer with an
/// error response.
pub fn dispatch_market(
    store: &mut MarketStore,
    name: &str,
    parameters: Option<Value>,
) -> DispatchResult<Disposition> {
    info!(tool = %name, "Routing market tool call");

    match name {
        "filter_products" => handle_filter_products(store, parameters),
        "add_to_cart" => handle_add_to_cart(store, parameters),
        "trigger_checkout" => handle_trigger_checkout(store),
        "apply_discount" => handle_apply_discount(store, parameters),
        "collect_address" => handle_collect_address(store, parameters),
        "navigate_to_orders" => handle_navigate_to_orders(store),
        "end_call" => Ok(Disposition::end("Ending session. Goodbye!")),
        _ => Err(DispatchError::UnsupportedCommand {
            name: name.to_string(),
        }),
    }
}

fn handle_filter_products(
    store: &mut MarketStore,
    parameters: Option<Value>,
) -> DispatchResult<Disposition> {
    #[derive(Debug, Deserialize)]
    struct FilterParams {
        category: Option<String>,
        color: Option<String>,
        #[serde(alias = "maxPrice")]
        max_price: Option<f64>,
    }

    let params: FilterParams = parse_parameters("filter_products", parameters)?;

    let mut descriptors = Vec::new();
    if let Some(category) = &params.category {
        descriptors.push(format!("in {}", category));
    }
    if let Some(color) = &params.color {
        descriptors.push(format!("in {}", color));
    }
    if let Some(max_price) = params.max_price {
        descriptors.push(format!("under ${}", max_price));
    }

    store.set_filters(FilterPatch {
        category: params.category,
        color: params.color,
        max_price: params.max_price,
    });

    let count = store.filtered_products().len();
    let noun = if count == 1 { "item" } else { "items" };
    let suffix = if descriptors.is_empty() {
        String::new()
    } else {
        format!(" {}", descriptors.join(" "))
    };

    Ok(Disposition::reply(format!(
        "Found {} {}{}.",
        count, noun, suffix
    )))
}

fn handle_add_to_cart(
    store: &mut MarketStore,
    parameters: Option<Value>,
) -> DispatchResult<Disposition> {
    #[derive(Debug, Deserialize)]
    struct AddParams {
        #[serde(alias = "productId")]
        product_id: String,
        #[serde(default = "default_quantity")]
        quantity: u32,
    }

    fn default_quantity() -> u32 {
        1
    }

    let params: AddParams = parse_parameters("add_to_cart", parameters)?;

    let product = resolve_product(store.products(), &params.product_id)
        .cloned()
        .ok_or_else(|| DispatchError::ProductNotFound {
            query: params.product_id.clone(),
        })?;

    match store.add_to_cart(&product, params.quantity) {
        CartOutcome::Added { quantity } => Ok(Disposition::reply(format!(
            "Added {} {} to your cart.",
            quantity, product.title
        ))),
        CartOutcome::Rejected { available: 0 } => Ok(Disposition::reply(format!(
            "Sorry, \"{}\" is out of stock right now.",
            product.title
        ))),
        CartOutcome::Rejected { available } => Ok(Disposition::reply(format!(
            "Only {} of \"{}\" available, so I haven't added it.",
            available, product.title
        ))),
        // Inert store after teardown: acknowledge without claiming success.
        _ => Ok(Disposition::reply("The session has ended; cart unchanged.")),
    }
}

/// Resolve by exact id first, then case-insensitive substring match on the
/// title so spoken references ("the blue dress") still land.
fn resolve_product<'a>(products: &'a [Product], query: &str) -> Option<&'a Product> {
    if let Some(product) = products.iter().find(|p| p.id == query) {
        return Some(product);
    }
    let needle = query.to_lowercase();
    products
        .iter()
        .find(|p| p.title.to_lowercase().contains(&needle))
}

fn handle_trigger_checkout(store: &mut MarketStore) -> DispatchResult<Disposition> {
    store.set_checkout_open(true);
    Ok(Disposition::reply("Opening checkout now."))
}

fn handle_apply_discount(
    store: &mut MarketStore,
    parameters: Option<Value>,
) -> DispatchResult<Disposition> {
    #[derive(Debug, Deserialize)]
    struct DiscountParams {
        #[serde(alias = "reasoning")]
        #[allow(dead_code)]
        reason: Option<String>,
    }

    // Acknowledgement only: the discount is already derived from the
    // emotion vector, this command never mutates state.
    let _params: DiscountParams = parse_parameters("apply_discount", parameters)?;

    Ok(Disposition::reply(format!(
        "Your {}% empathy discount has been applied to the cart.",
        store.emotion_discount()
    )))
}

fn handle_collect_address(
    store: &mut MarketStore,
    parameters: Option<Value>,
) -> DispatchResult<Disposition> {
    #[derive(Debug, Deserialize)]
    struct AddressParams {
        address: String,
    }

    let params: AddressParams = parse_parameters("collect_address", parameters)?;
    let normalized = normalize_address(&params.address);
    store.set_delivery_address(normalized.clone());

    Ok(Disposition::reply(format!(
        "Delivery address set to {}.",
        normalized
    )))
}

fn handle_navigate_to_orders(store: &mut MarketStore) -> DispatchResult<Disposition> {
    store.set_pending_route(Route::Orders);
    Ok(Disposition::reply("Taking you to your orders."))
}
