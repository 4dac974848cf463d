//! Discount Aggregate
//!
//! A discount is an administrator-defined price reduction, scoped by product
//! and category sets, a validity window and an active flag. How a discount is
//! chosen among several and turned into a final price lives in
//! [`crate::pricing`]; this module owns the record and its invariants.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::Product;
use crate::domain::events::{DomainEvent, DiscountEvent};
use crate::domain::value_objects::MAX_AMOUNT;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind { Percentage, Fixed }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    id: Uuid,
    title: String,
    description: Option<String>,
    #[serde(rename = "type")]
    kind: DiscountKind,
    value: Decimal,
    max_discount_amount: Option<Decimal>,
    applicable_products: Vec<Uuid>,
    #[serde(default)]
    applicable_categories: Vec<Uuid>,
    active: bool,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    show_on_home_page: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Editable fields of a discount, shared by create and update.
#[derive(Clone, Debug)]
pub struct DiscountDraft {
    pub title: String,
    pub description: Option<String>,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub applicable_products: Vec<Uuid>,
    pub applicable_categories: Vec<Uuid>,
    pub active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub show_on_home_page: bool,
}

impl DiscountDraft {
    fn validate(&self) -> Result<(), DiscountError> {
        if self.title.trim().is_empty() { return Err(DiscountError::MissingTitle); }
        if self.start_date > self.end_date { return Err(DiscountError::InvalidWindow); }
        if self.kind == DiscountKind::Fixed && self.max_discount_amount.is_some() {
            return Err(DiscountError::CapOnFixed);
        }
        check_values(self.kind, self.value, self.max_discount_amount)
    }
}

fn check_values(kind: DiscountKind, value: Decimal, cap: Option<Decimal>) -> Result<(), DiscountError> {
    match kind {
        DiscountKind::Percentage if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED => {
            return Err(DiscountError::PercentageOutOfRange(value));
        }
        DiscountKind::Fixed if value < Decimal::ZERO => return Err(DiscountError::NegativeValue(value)),
        DiscountKind::Fixed if value > MAX_AMOUNT => return Err(DiscountError::TooLarge(value)),
        _ => {}
    }
    match cap {
        Some(cap) if cap < Decimal::ZERO => Err(DiscountError::NegativeCap(cap)),
        Some(cap) if cap > MAX_AMOUNT => Err(DiscountError::TooLarge(cap)),
        _ => Ok(()),
    }
}

impl Discount {
    pub fn create(draft: DiscountDraft) -> Result<Self, DiscountError> {
        draft.validate()?;
        let id = Uuid::now_v7();
        let now = Utc::now();
        let mut discount = Self {
            id, title: draft.title, description: draft.description, kind: draft.kind, value: draft.value,
            max_discount_amount: draft.max_discount_amount, applicable_products: draft.applicable_products,
            applicable_categories: draft.applicable_categories, active: draft.active,
            start_date: draft.start_date, end_date: draft.end_date, show_on_home_page: draft.show_on_home_page,
            created_at: now, updated_at: now, events: vec![],
        };
        discount.raise_event(DomainEvent::Discount(DiscountEvent::Created { discount_id: id }));
        Ok(discount)
    }

    pub fn update(&mut self, draft: DiscountDraft) -> Result<(), DiscountError> {
        draft.validate()?;
        self.title = draft.title;
        self.description = draft.description;
        self.kind = draft.kind;
        self.value = draft.value;
        self.max_discount_amount = draft.max_discount_amount;
        self.applicable_products = draft.applicable_products;
        self.applicable_categories = draft.applicable_categories;
        self.active = draft.active;
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.show_on_home_page = draft.show_on_home_page;
        self.updated_at = Utc::now();
        self.raise_event(DomainEvent::Discount(DiscountEvent::Updated { discount_id: self.id }));
        Ok(())
    }

    pub fn mark_deleted(&mut self) {
        self.raise_event(DomainEvent::Discount(DiscountEvent::Deleted { discount_id: self.id }));
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn title(&self) -> &str { &self.title }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn kind(&self) -> DiscountKind { self.kind }
    pub fn value(&self) -> Decimal { self.value }
    pub fn is_active(&self) -> bool { self.active }
    pub fn start_date(&self) -> DateTime<Utc> { self.start_date }
    pub fn end_date(&self) -> DateTime<Utc> { self.end_date }
    pub fn show_on_home_page(&self) -> bool { self.show_on_home_page }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Value and cap are within range for the discount type. Stored records
    /// are validated on write; this guards documents edited out of band.
    pub fn check_values(&self) -> Result<(), DiscountError> {
        check_values(self.kind, self.value, self.max_discount_amount)
    }

    /// Active and `now` lies within `[start_date, end_date]`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.start_date <= now && now <= self.end_date
    }

    /// Unscoped discounts cover every product.
    pub fn covers(&self, product_id: Uuid, category_id: Option<Uuid>) -> bool {
        if self.applicable_products.is_empty() && self.applicable_categories.is_empty() {
            return true;
        }
        self.applicable_products.contains(&product_id)
            || category_id.is_some_and(|c| self.applicable_categories.contains(&c))
    }

    pub fn is_applicable_to(&self, product: &Product, now: DateTime<Utc>) -> bool {
        self.is_live_at(now) && self.covers(product.id(), product.category_id())
    }

    /// Amount taken off `price`. Percentage amounts are clamped to the cap;
    /// fixed amounts are not clamped and may exceed the price. `None` when
    /// the product is priced beyond what `Decimal` can multiply.
    pub fn amount_for(&self, price: Decimal) -> Option<Decimal> {
        match self.kind {
            DiscountKind::Percentage => {
                let amount = price.checked_mul(self.value)?.checked_div(Decimal::ONE_HUNDRED)?;
                Some(match self.max_discount_amount {
                    Some(cap) if amount > cap => cap,
                    _ => amount,
                })
            }
            DiscountKind::Fixed => Some(self.value),
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountError {
    #[error("discount title is required")]
    MissingTitle,
    #[error("percentage discount must be within 0..=100, got {0}")]
    PercentageOutOfRange(Decimal),
    #[error("fixed discount must not be negative, got {0}")]
    NegativeValue(Decimal),
    #[error("maximum discount amount must not be negative, got {0}")]
    NegativeCap(Decimal),
    #[error("discount amount {0} exceeds the maximum of {max}", max = MAX_AMOUNT)]
    TooLarge(Decimal),
    #[error("maximum discount amount only applies to percentage discounts")]
    CapOnFixed,
    #[error("discount start date is after its end date")]
    InvalidWindow,
}
