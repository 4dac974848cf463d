use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::{cart::price_cart, AppState};
use crate::domain::aggregates::{AddressError, Checkout, Order, OrderStatus, Product, ShippingAddress};
use crate::store::StatusUpdate;
use crate::{Result, StorefrontError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[validate(length(min = 1))]
    pub session_id: String,
    #[validate(length(min = 1))]
    pub customer_id: String,
    #[validate(email)]
    pub email: String,
    pub address_id: Option<Uuid>,
    #[validate]
    pub shipping_address: Option<ShippingAddressRequest>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(min = 1, max = 200))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(equal = 2))]
    pub country: String,
    pub phone: Option<String>,
}

impl From<ShippingAddressRequest> for ShippingAddress {
    fn from(r: ShippingAddressRequest) -> Self {
        Self {
            full_name: r.full_name, line1: r.line1, line2: r.line2, city: r.city, state: r.state,
            postal_code: r.postal_code, country: r.country.to_uppercase(), phone: r.phone,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub customer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub tracking_number: Option<String>,
}

async fn resolve_address(s: &AppState, r: &mut CheckoutRequest) -> Result<ShippingAddress> {
    if let Some(id) = r.address_id {
        let book = s.store.load_address_book(&r.customer_id).await?;
        let address = book.get(id).ok_or(AddressError::NotFound(id))?;
        return Ok(ShippingAddress::from(address));
    }
    r.shipping_address.take().map(ShippingAddress::from).ok_or(StorefrontError::MissingAddress)
}

pub async fn checkout(State(s): State<AppState>, Json(mut r): Json<CheckoutRequest>) -> Result<(StatusCode, Json<Order>)> {
    r.validate()?;
    let cart = s.store.load_cart(&r.session_id).await?
        .filter(|c| !c.is_empty())
        .ok_or(StorefrontError::EmptyCart)?;
    let shipping_address = resolve_address(&s, &mut r).await?;

    let quote = price_cart(&s, &cart).await?;
    if !quote.unavailable.is_empty() {
        return Err(StorefrontError::Unavailable(quote.unavailable));
    }

    let mut order = Order::place(
        Checkout {
            customer_id: r.customer_id,
            email: r.email,
            currency: quote.totals.currency.clone(),
            shipping: quote.totals.shipping,
            shipping_address,
        },
        quote.lines.iter().map(|l| l.to_line_item()).collect(),
    )?;
    let mut events = order.take_events();
    let mut products = s.store.place_order(&order, &r.session_id).await?;
    events.extend(products.iter_mut().flat_map(Product::take_events));
    tracing::info!(
        order_id = %order.id(), order_number = %order.order_number(), total = %order.totals().total,
        items = order.items().len(), "order placed"
    );

    s.events.publish_all(events).await;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(State(s): State<AppState>, Query(p): Query<OrderListParams>) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.store.list_orders(p.customer.as_deref()).await?))
}

pub async fn get_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Order>> {
    let order = s.store.get_order(id).await?.ok_or(StorefrontError::OrderNotFound(id))?;
    Ok(Json(order))
}

pub async fn update_status(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<StatusUpdateRequest>) -> Result<Json<Order>> {
    let update = StatusUpdate { status: r.status, note: r.note, tracking_number: r.tracking_number };
    let (mut order, mut restocked) = s.store.advance_order(id, update).await?;
    let mut events = order.take_events();
    events.extend(restocked.iter_mut().flat_map(Product::take_events));
    tracing::info!(order_id = %id, status = order.status().as_str(), restocked = restocked.len(), "order status changed");
    s.events.publish_all(events).await;
    Ok(Json(order))
}
