//! Wishlist Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    customer_id: String,
    product_ids: Vec<Uuid>,
    updated_at: DateTime<Utc>,
}

impl Wishlist {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self { customer_id: customer_id.into(), product_ids: vec![], updated_at: Utc::now() }
    }

    pub fn customer_id(&self) -> &str { &self.customer_id }
    pub fn product_ids(&self) -> &[Uuid] { &self.product_ids }
    pub fn contains(&self, product_id: Uuid) -> bool { self.product_ids.contains(&product_id) }

    /// Returns false when the product was already listed.
    pub fn add(&mut self, product_id: Uuid) -> bool {
        if self.contains(product_id) { return false; }
        self.product_ids.push(product_id);
        self.updated_at = Utc::now();
        true
    }

    /// Returns false when the product was not listed.
    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.product_ids.len();
        self.product_ids.retain(|p| *p != product_id);
        let removed = self.product_ids.len() != before;
        if removed { self.updated_at = Utc::now(); }
        removed
    }
}
