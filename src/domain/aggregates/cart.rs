//! Cart Aggregate
//!
//! Carts hold what was picked, never what it costs: prices are resolved on
//! every read by [`crate::pricing::quote_cart`]. [`CartSnapshot`] is the one
//! serialized form, used by the stores and handed to clients that keep a
//! local copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MAX_LINE_QUANTITY: u32 = 99;
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cart {
    session_id: String,
    items: Vec<CartItem>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: Uuid,
    pub size: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    /// Sizes compare case-insensitively, so "m" and "M" are the same line.
    fn matches(&self, product_id: Uuid, size: Option<&str>) -> bool {
        self.product_id == product_id
            && match (self.size.as_deref(), size) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            }
    }
}

/// Versioned wire form of a cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub version: u32,
    pub session_id: String,
    pub items: Vec<CartItem>,
    pub saved_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), items: vec![], updated_at: Utc::now() }
    }

    pub fn session_id(&self) -> &str { &self.session_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn unit_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds a line, merging into an existing line for the same product and size.
    pub fn add_item(&mut self, product_id: Uuid, size: Option<String>, quantity: u32) -> Result<(), CartError> {
        check_quantity(quantity)?;
        if let Some(existing) = self.items.iter_mut().find(|i| i.matches(product_id, size.as_deref())) {
            let merged = existing.quantity + quantity;
            check_quantity(merged)?;
            existing.quantity = merged;
        } else {
            self.items.push(CartItem { product_id, size, quantity });
        }
        self.touch();
        Ok(())
    }

    /// Sets the quantity of a line; zero removes it.
    pub fn update_quantity(&mut self, product_id: Uuid, size: Option<&str>, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 { return self.remove_item(product_id, size); }
        check_quantity(quantity)?;
        let item = self.items.iter_mut().find(|i| i.matches(product_id, size)).ok_or(CartError::ItemNotFound(product_id))?;
        item.quantity = quantity;
        self.touch();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid, size: Option<&str>) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| !i.matches(product_id, size));
        if self.items.len() == before { return Err(CartError::ItemNotFound(product_id)); }
        self.touch();
        Ok(())
    }

    pub fn to_snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            version: SNAPSHOT_VERSION,
            session_id: self.session_id.clone(),
            items: self.items.clone(),
            saved_at: self.updated_at,
        }
    }

    /// Rebuilds a cart, re-checking every line so a tampered snapshot cannot
    /// carry quantities the aggregate would refuse.
    pub fn from_snapshot(snapshot: CartSnapshot) -> Result<Self, CartError> {
        if snapshot.version != SNAPSHOT_VERSION { return Err(CartError::UnsupportedSnapshot(snapshot.version)); }
        let mut cart = Self { session_id: snapshot.session_id, items: vec![], updated_at: snapshot.saved_at };
        for item in snapshot.items {
            check_quantity(item.quantity)?;
            if cart.items.iter().any(|i| i.matches(item.product_id, item.size.as_deref())) {
                return Err(CartError::DuplicateLine(item.product_id));
            }
            cart.items.push(item);
        }
        Ok(cart)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> { serde_json::to_string(&self.to_snapshot()) }

    pub fn from_json(json: &str) -> Result<Self, CartError> {
        let snapshot: CartSnapshot = serde_json::from_str(json).map_err(|e| CartError::InvalidSnapshot(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

fn check_quantity(quantity: u32) -> Result<(), CartError> {
    if quantity == 0 || quantity > MAX_LINE_QUANTITY { return Err(CartError::InvalidQuantity(quantity)); }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("item {0} is not in the cart")]
    ItemNotFound(Uuid),
    #[error("quantity must be between 1 and 99, got {0}")]
    InvalidQuantity(u32),
    #[error("cart snapshot lists product {0} twice")]
    DuplicateLine(Uuid),
    #[error("unsupported cart snapshot version {0}")]
    UnsupportedSnapshot(u32),
    #[error("invalid cart snapshot: {0}")]
    InvalidSnapshot(String),
}
