//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::value_objects::{Sku, Quantity, MAX_AMOUNT};
use crate::domain::events::{DomainEvent, ProductEvent};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: Uuid,
    sku: Sku,
    name: String,
    description: String,
    price: Decimal,
    category_id: Option<Uuid>,
    sizes: Vec<String>,
    images: Vec<String>,
    inventory: Quantity,
    status: ProductStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus { #[default] Draft, Active, Archived }

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Draft => "draft", Self::Active => "active", Self::Archived => "archived" }
    }
}

impl Product {
    pub fn create(sku: Sku, name: impl Into<String>, price: Decimal) -> Result<Self, ProductError> {
        let name = name.into();
        if name.trim().is_empty() { return Err(ProductError::MissingName); }
        check_price(price)?;
        let id = Uuid::now_v7();
        let now = Utc::now();
        let mut product = Self {
            id, sku: sku.clone(), name, description: String::new(), price,
            category_id: None, sizes: vec![], images: vec![], inventory: Quantity::default(),
            status: ProductStatus::Draft, created_at: now, updated_at: now, events: vec![],
        };
        product.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: id, sku }));
        Ok(product)
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn sku(&self) -> &Sku { &self.sku }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> Decimal { self.price }
    pub fn category_id(&self) -> Option<Uuid> { self.category_id }
    pub fn sizes(&self) -> &[String] { &self.sizes }
    pub fn images(&self) -> &[String] { &self.images }
    pub fn inventory(&self) -> Quantity { self.inventory }
    pub fn status(&self) -> ProductStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn is_active(&self) -> bool { self.status == ProductStatus::Active }
    pub fn is_in_stock(&self) -> bool { !self.inventory.is_zero() }

    /// Matches `size` against the declared sizes, ignoring case, and returns
    /// the declared label. A product without declared sizes takes no size.
    pub fn size_label(&self, size: Option<&str>) -> Result<Option<String>, ProductError> {
        let label = match size.map(str::trim) {
            None if self.sizes.is_empty() => return Ok(None),
            Some(s) => self.sizes.iter().find(|known| known.eq_ignore_ascii_case(s)),
            None => None,
        };
        label.cloned().map(Some).ok_or_else(|| ProductError::UnsupportedSize {
            sku: self.sku.to_string(),
            size: size.map(str::to_string),
        })
    }

    pub fn update_details(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        category_id: Option<Uuid>,
        sizes: Vec<String>,
        images: Vec<String>,
    ) -> Result<(), ProductError> {
        let name = name.into();
        if name.trim().is_empty() { return Err(ProductError::MissingName); }
        self.name = name;
        self.description = description.into();
        self.category_id = category_id;
        self.sizes = sizes;
        self.images = images;
        self.touch();
        Ok(())
    }

    pub fn publish(&mut self) -> Result<(), ProductError> {
        if self.status == ProductStatus::Archived { return Err(ProductError::Archived); }
        self.status = ProductStatus::Active;
        self.touch();
        Ok(())
    }

    pub fn archive(&mut self) {
        if self.status == ProductStatus::Archived { return; }
        self.status = ProductStatus::Archived;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::Archived { product_id: self.id }));
    }

    pub fn update_price(&mut self, new_price: Decimal) -> Result<(), ProductError> {
        check_price(new_price)?;
        if new_price == self.price { return Ok(()); }
        let old_price = std::mem::replace(&mut self.price, new_price);
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::PriceChanged { product_id: self.id, old_price, new_price }));
        Ok(())
    }

    pub fn add_inventory(&mut self, qty: u32) {
        self.inventory = self.inventory.add(qty);
        self.touch();
    }

    pub fn set_inventory(&mut self, qty: u32) {
        self.inventory = Quantity::new(qty);
        self.touch();
    }

    pub fn remove_inventory(&mut self, qty: u32) -> Result<(), ProductError> {
        self.inventory = self.inventory.subtract(qty).ok_or(ProductError::InsufficientInventory {
            sku: self.sku.to_string(),
            available: self.inventory.value(),
            requested: qty,
        })?;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::InventoryRemoved { product_id: self.id, quantity: qty }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

fn check_price(price: Decimal) -> Result<(), ProductError> {
    if price.is_sign_negative() && !price.is_zero() { return Err(ProductError::NegativePrice); }
    if price > MAX_AMOUNT { return Err(ProductError::PriceTooLarge(price)); }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("product name is required")]
    MissingName,
    #[error("product price must not be negative")]
    NegativePrice,
    #[error("product price {0} exceeds the maximum of {max}", max = MAX_AMOUNT)]
    PriceTooLarge(Decimal),
    #[error("size {size:?} is not offered for {sku}")]
    UnsupportedSize { sku: String, size: Option<String> },
    #[error("product is archived")]
    Archived,
    #[error("insufficient inventory for {sku}: {available} available, {requested} requested")]
    InsufficientInventory { sku: String, available: u32, requested: u32 },
}
