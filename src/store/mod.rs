//! Persistence seam.
//!
//! Aggregates are stored as JSON documents next to the few columns that are
//! queried on. [`PgStore`] is the production backend; [`MemoryStore`] keeps
//! the same documents in process and backs the tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::aggregates::{AddressBook, Cart, Category, Discount, Order, OrderStatus, Product, Wishlist};
use crate::{Result, StorefrontError};

/// Filter and page for the public product listing. Only active products are listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u32,
    pub per_page: u32,
    pub category: Option<Uuid>,
    pub search: Option<String>,
}

impl ProductQuery {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;

    /// Clamps raw query parameters: page is 1-based, per_page is 1..=100.
    pub fn new(page: Option<u32>, per_page: Option<u32>, category: Option<Uuid>, search: Option<String>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(Self::DEFAULT_PER_PAGE).clamp(1, Self::MAX_PER_PAGE),
            category,
            search: search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        }
    }

    pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.per_page) }
}

impl Default for ProductQuery {
    fn default() -> Self { Self::new(None, None, None, None) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub tracking_number: Option<String>,
}

impl StatusUpdate {
    /// Moves `order` along. Returns true when its stock goes back on the shelf.
    fn apply(self, order: &mut Order) -> Result<bool> {
        let restock = self.status == OrderStatus::Cancelled;
        order.advance(self.status, self.note, self.tracking_number)?;
        Ok(restock)
    }
}

fn keyed(products: impl IntoIterator<Item = Product>) -> HashMap<Uuid, Product> {
    products.into_iter().map(|p| (p.id(), p)).collect()
}

fn take_inventory(order: &Order, products: &mut HashMap<Uuid, Product>) -> Result<()> {
    for item in order.items() {
        products
            .get_mut(&item.product_id)
            .ok_or(StorefrontError::ProductNotFound(item.product_id))?
            .remove_inventory(item.quantity)?;
    }
    Ok(())
}

fn return_inventory(order: &Order, products: &mut HashMap<Uuid, Product>) {
    for item in order.items() {
        match products.get_mut(&item.product_id) {
            Some(product) => product.add_inventory(item.quantity),
            None => tracing::warn!(order_id = %order.id(), product_id = %item.product_id, "cannot restock missing product"),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Active products matching `query`, newest first, plus the total match count.
    async fn list_products(&self, query: &ProductQuery) -> Result<(Vec<Product>, u64)>;
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;
    /// Products with the given ids, in any status. Unknown ids are skipped.
    async fn get_products(&self, ids: &[Uuid]) -> Result<Vec<Product>>;
    async fn save_product(&self, product: &Product) -> Result<()>;

    /// Categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>>;
    async fn save_category(&self, category: &Category) -> Result<()>;
    async fn delete_category(&self, id: Uuid) -> Result<bool>;

    /// Every discount, newest first.
    async fn list_discounts(&self) -> Result<Vec<Discount>>;
    /// Discounts that are active and whose window contains `now`.
    async fn list_live_discounts(&self, now: DateTime<Utc>) -> Result<Vec<Discount>>;
    async fn get_discount(&self, id: Uuid) -> Result<Option<Discount>>;
    async fn save_discount(&self, discount: &Discount) -> Result<()>;
    async fn delete_discount(&self, id: Uuid) -> Result<bool>;

    async fn load_cart(&self, session_id: &str) -> Result<Option<Cart>>;
    async fn save_cart(&self, cart: &Cart) -> Result<()>;
    async fn delete_cart(&self, session_id: &str) -> Result<()>;

    /// Takes the order's quantities out of the stored stock, records the
    /// order and drops the cart it came from, all or nothing. Returns the
    /// products it changed, still carrying their events.
    async fn place_order(&self, order: &Order, session_id: &str) -> Result<Vec<Product>>;
    /// Applies `update` to the stored order; a cancellation puts its
    /// quantities back in stock in the same write. Returns the order and any
    /// restocked products, still carrying their events.
    async fn advance_order(&self, id: Uuid, update: StatusUpdate) -> Result<(Order, Vec<Product>)>;
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;
    /// Orders newest first, optionally for one customer.
    async fn list_orders(&self, customer_id: Option<&str>) -> Result<Vec<Order>>;

    /// The customer's address book; empty when none was saved yet.
    async fn load_address_book(&self, customer_id: &str) -> Result<AddressBook>;
    async fn save_address_book(&self, book: &AddressBook) -> Result<()>;

    /// The customer's wishlist; empty when none was saved yet.
    async fn load_wishlist(&self, customer_id: &str) -> Result<Wishlist>;
    async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<()>;
}
