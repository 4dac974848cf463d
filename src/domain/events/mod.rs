//! Domain events
use crate::domain::value_objects::Sku;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Discount(DiscountEvent),
    Order(OrderEvent),
}

impl DomainEvent {
    /// NATS subject the event is published on, e.g. `storefront.order.placed`.
    pub fn subject(&self) -> String {
        let (aggregate, name) = match self {
            Self::Product(e) => ("product", e.name()),
            Self::Discount(e) => ("discount", e.name()),
            Self::Order(e) => ("order", e.name()),
        };
        format!("storefront.{aggregate}.{name}")
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: Uuid, sku: Sku },
    PriceChanged { product_id: Uuid, old_price: Decimal, new_price: Decimal },
    Archived { product_id: Uuid },
    InventoryRemoved { product_id: Uuid, quantity: u32 },
}

impl ProductEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::PriceChanged { .. } => "price_changed",
            Self::Archived { .. } => "archived",
            Self::InventoryRemoved { .. } => "inventory_removed",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountEvent {
    Created { discount_id: Uuid },
    Updated { discount_id: Uuid },
    Deleted { discount_id: Uuid },
}

impl DiscountEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::Deleted { .. } => "deleted",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, customer_id: String, total: Decimal },
    Confirmed { order_id: Uuid },
    Shipped { order_id: Uuid, tracking: Option<String> },
    Delivered { order_id: Uuid },
    Cancelled { order_id: Uuid },
}

impl OrderEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "placed",
            Self::Confirmed { .. } => "confirmed",
            Self::Shipped { .. } => "shipped",
            Self::Delivered { .. } => "delivered",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}
