//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::address::Address;
use crate::domain::value_objects::{Money, MoneyError};
use crate::domain::events::{DomainEvent, OrderEvent};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: Uuid,
    order_number: String,
    customer_id: String,
    email: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    items: Vec<LineItem>,
    #[serde(flatten)]
    totals: OrderTotals,
    shipping_address: ShippingAddress,
    tracking_number: Option<String>,
    history: Vec<StatusChange>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// A purchased line, priced at placement time. `unit_price` is the resolved
/// final price; `discount_amount` is what was actually taken off per unit;
/// `total` is `unit_price * quantity` rounded to cents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub original_price: Decimal,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    pub discount_title: Option<String>,
    pub total: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

impl From<&Address> for ShippingAddress {
    fn from(a: &Address) -> Self {
        Self {
            full_name: a.full_name.clone(), line1: a.line1.clone(), line2: a.line2.clone(), city: a.city.clone(),
            state: a.state.clone(), postal_code: a.postal_code.clone(), country: a.country.clone(), phone: a.phone.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Confirmed, Processing, Shipped, Delivered, Cancelled }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Confirmed => "confirmed", Self::Processing => "processing",
            Self::Shipped => "shipped", Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    fn can_become(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Processing) | (Processing, Shipped) | (Shipped, Delivered)
                | (Pending | Confirmed | Processing, Cancelled)
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Paid, Voided }

/// Money figures of a cart or order, rounded to cents.
///
/// Cart quotes and placed orders both come from [`OrderTotals::compute`],
/// so an order always totals what its cart was quoted at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub currency: String,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// `subtotal` sums the rounded undiscounted line amounts and the
    /// discounted subtotal sums the rounded line totals. `shipping` gets the
    /// discounted subtotal.
    pub fn compute(items: &[LineItem], currency: &str, shipping: impl FnOnce(Decimal) -> Decimal) -> Result<Self, MoneyError> {
        let mut subtotal = Money::zero(currency);
        let mut discounted = Money::zero(currency);
        for item in items {
            subtotal = subtotal.add(&Money::new(item.original_price, currency).multiply(item.quantity)?.rounded())?;
            discounted = discounted.add(&LineItem::total_for(item.unit_price, item.quantity, currency)?)?;
        }
        let shipping = Money::new(shipping(discounted.amount()), currency).rounded();
        Ok(Self {
            currency: currency.to_string(),
            discount_total: subtotal.saturating_sub(&discounted)?.amount(),
            total: discounted.add(&shipping)?.amount(),
            subtotal: subtotal.amount(),
            shipping: shipping.amount(),
        })
    }
}

impl LineItem {
    /// `unit_price * quantity`, rounded to cents.
    pub fn total_for(unit_price: Decimal, quantity: u32, currency: &str) -> Result<Money, MoneyError> {
        Ok(Money::new(unit_price, currency).multiply(quantity)?.rounded())
    }
}

/// Inputs for [`Order::place`] beyond the line items.
#[derive(Clone, Debug)]
pub struct Checkout {
    pub customer_id: String,
    pub email: String,
    pub currency: String,
    pub shipping: Decimal,
    pub shipping_address: ShippingAddress,
}

impl Order {
    pub fn place(checkout: Checkout, items: Vec<LineItem>) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let shipping = checkout.shipping;
        let totals = OrderTotals::compute(&items, &checkout.currency, |_| shipping)?;

        let id = Uuid::now_v7();
        let now = Utc::now();
        let mut order = Self {
            id,
            order_number: format!("ORD-{:08}", rand::random::<u32>() % 100_000_000),
            customer_id: checkout.customer_id,
            email: checkout.email,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            items,
            totals,
            shipping_address: checkout.shipping_address,
            tracking_number: None,
            history: vec![StatusChange { status: OrderStatus::Pending, at: now, note: None }],
            created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: id, customer_id: order.customer_id.clone(), total: order.totals.total,
        }));
        Ok(order)
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_number(&self) -> &str { &self.order_number }
    pub fn customer_id(&self) -> &str { &self.customer_id }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn totals(&self) -> &OrderTotals { &self.totals }
    pub fn tracking_number(&self) -> Option<&str> { self.tracking_number.as_deref() }
    pub fn history(&self) -> &[StatusChange] { &self.history }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Moves the order along its lifecycle. A tracking number is only kept
    /// when the order ships.
    pub fn advance(&mut self, next: OrderStatus, note: Option<String>, tracking: Option<String>) -> Result<(), OrderError> {
        if !self.status.can_become(next) {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        let event = match next {
            OrderStatus::Confirmed => Some(OrderEvent::Confirmed { order_id: self.id }),
            OrderStatus::Shipped => {
                self.tracking_number = tracking;
                Some(OrderEvent::Shipped { order_id: self.id, tracking: self.tracking_number.clone() })
            }
            OrderStatus::Delivered => Some(OrderEvent::Delivered { order_id: self.id }),
            OrderStatus::Cancelled => {
                self.payment_status = PaymentStatus::Voided;
                Some(OrderEvent::Cancelled { order_id: self.id })
            }
            OrderStatus::Pending | OrderStatus::Processing => None,
        };
        let now = Utc::now();
        self.history.push(StatusChange { status: next, at: now, note });
        self.updated_at = now;
        if let Some(e) = event { self.raise_event(DomainEvent::Order(e)); }
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order has no items")]
    NoItems,
    #[error("cannot move order from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error(transparent)]
    Money(#[from] MoneyError),
}
