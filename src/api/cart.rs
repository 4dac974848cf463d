use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::domain::aggregates::Cart;
use crate::pricing::{quote_cart, CartQuote};
use crate::{Result, StorefrontError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub size: Option<String>,
    #[validate(range(min = 1, max = 99))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(max = 99))]
    pub quantity: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct LineParams {
    pub size: Option<String>,
}

/// Prices `cart` against the current catalog and live discounts.
pub(super) async fn price_cart(s: &AppState, cart: &Cart) -> Result<CartQuote> {
    let now = Utc::now();
    let ids: Vec<Uuid> = cart.items().iter().map(|i| i.product_id).collect();
    let products = if ids.is_empty() { vec![] } else { s.store.get_products(&ids).await? };
    let discounts = s.store.list_live_discounts(now).await?;
    Ok(quote_cart(cart, &products, &discounts, &s.config.shipping, &s.config.currency, now)?)
}

async fn load(s: &AppState, session: &str) -> Result<Cart> {
    Ok(s.store.load_cart(session).await?.unwrap_or_else(|| Cart::new(session)))
}

pub async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<CartQuote>> {
    let cart = load(&s, &session).await?;
    Ok(Json(price_cart(&s, &cart).await?))
}

pub async fn add_to_cart(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<AddToCartRequest>) -> Result<Json<CartQuote>> {
    r.validate()?;
    let product = s.store.get_product(r.product_id).await?
        .filter(|p| p.is_active())
        .ok_or(StorefrontError::ProductNotFound(r.product_id))?;
    let size = product.size_label(r.size.as_deref())?;
    let mut cart = load(&s, &session).await?;
    cart.add_item(r.product_id, size, r.quantity)?;
    s.store.save_cart(&cart).await?;
    tracing::debug!(%session, product_id = %r.product_id, quantity = r.quantity, "added to cart");
    Ok(Json(price_cart(&s, &cart).await?))
}

pub async fn update_item(
    State(s): State<AppState>,
    Path((session, product_id)): Path<(String, Uuid)>,
    Query(line): Query<LineParams>,
    Json(r): Json<UpdateQuantityRequest>,
) -> Result<Json<CartQuote>> {
    r.validate()?;
    let mut cart = load(&s, &session).await?;
    cart.update_quantity(product_id, line.size.as_deref(), r.quantity)?;
    s.store.save_cart(&cart).await?;
    Ok(Json(price_cart(&s, &cart).await?))
}

pub async fn remove_item(
    State(s): State<AppState>,
    Path((session, product_id)): Path<(String, Uuid)>,
    Query(line): Query<LineParams>,
) -> Result<Json<CartQuote>> {
    let mut cart = load(&s, &session).await?;
    cart.remove_item(product_id, line.size.as_deref())?;
    s.store.save_cart(&cart).await?;
    Ok(Json(price_cart(&s, &cart).await?))
}

pub async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode> {
    s.store.delete_cart(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
