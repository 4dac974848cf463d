//! Storefront backend
//!
//! REST backend for a small e-commerce storefront.
//!
//! ## Features
//! - Product catalog and categories
//! - Discounts with per-product/per-category scope and validity windows
//! - Cart and checkout, priced on every read
//! - Order tracking
//! - Customer address books and wishlists

pub mod api;
pub mod config;
pub mod domain;
pub mod events;
pub mod pricing;
pub mod store;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{AddressError, CartError, CategoryError, DiscountError, OrderError, ProductError};
use crate::domain::value_objects::SkuError;
use crate::pricing::PricingError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("product {0} not found")]
    ProductNotFound(Uuid),

    #[error("category {0} not found")]
    CategoryNotFound(Uuid),

    #[error("discount {0} not found")]
    DiscountNotFound(Uuid),

    #[error("order {0} not found")]
    OrderNotFound(Uuid),

    #[error("cart is empty")]
    EmptyCart,

    #[error("products no longer available: {0:?}")]
    Unavailable(Vec<Uuid>),

    #[error("checkout needs an address id or a shipping address")]
    MissingAddress,

    #[error("invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Sku(#[from] SkuError),

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Category(#[from] CategoryError),

    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("storage error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document error: {0}")]
    Document(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
