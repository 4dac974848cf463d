//! Discount pricing.
//!
//! [`resolve`] is the only place a discount turns into a price. Listing,
//! detail, cart and checkout all go through it, either directly or via
//! [`price_product`] and [`quote_cart`].
//!
//! When several discounts apply to the same product, the one taking the
//! largest amount off wins. Equal amounts go to the most recently created
//! discount, then to the smaller id, so the outcome never depends on the
//! order the store returned the discounts in.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Discount, DiscountKind, LineItem, OrderTotals, Product};
use crate::domain::value_objects::MoneyError;

/// Outcome of resolving a product's price against the live discounts.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResolution {
    pub final_price: Decimal,
    pub discount_info: Option<DiscountInfo>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountInfo {
    pub discounted_price: Decimal,
    pub original_price: Decimal,
    /// Computed amount before the zero floor, so a fixed discount larger
    /// than the price reports its full value.
    pub discount_amount: Decimal,
    pub discount: AppliedDiscount,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("product {0} has a negative price")]
    NegativePrice(Uuid),
    #[error("price of product {0} is out of range")]
    Overflow(Uuid),
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Resolves the final price of `product` at `now`.
///
/// `discounts` is typically the store's list of live discounts; the
/// applicability rule is checked again here, so passing every discount is
/// also correct. Discounts whose value is out of range for their type are
/// skipped.
pub fn resolve(product: &Product, discounts: &[Discount], now: DateTime<Utc>) -> Result<PriceResolution, PricingError> {
    let price = product.price();
    if price < Decimal::ZERO {
        return Err(PricingError::NegativePrice(product.id()));
    }

    let mut best: Option<(&Discount, Decimal)> = None;
    for d in discounts.iter().filter(|d| d.is_applicable_to(product, now)) {
        if let Err(e) = d.check_values() {
            tracing::warn!(discount_id = %d.id(), error = %e, "skipping malformed discount");
            continue;
        }
        let amount = d.amount_for(price).ok_or(PricingError::Overflow(product.id()))?;
        let wins = match best {
            None => true,
            Some((b, best_amount)) => amount
                .cmp(&best_amount)
                .then_with(|| d.created_at().cmp(&b.created_at()))
                .then_with(|| b.id().cmp(&d.id()))
                .is_gt(),
        };
        if wins { best = Some((d, amount)); }
    }

    let Some((discount, discount_amount)) = best else {
        return Ok(PriceResolution { final_price: price, discount_info: None });
    };

    let final_price = price.checked_sub(discount_amount).ok_or(PricingError::Overflow(product.id()))?.max(Decimal::ZERO);
    Ok(PriceResolution {
        final_price,
        discount_info: Some(DiscountInfo {
            discounted_price: final_price,
            original_price: price,
            discount_amount,
            discount: AppliedDiscount {
                id: discount.id(),
                kind: discount.kind(),
                value: discount.value(),
                title: discount.title().to_string(),
                description: discount.description().map(str::to_string),
            },
        }),
    })
}

/// A product annotated with its resolved price, as returned by the catalog.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    #[serde(flatten)]
    pub product: Product,
    pub final_price: Decimal,
    pub discount_info: Option<DiscountInfo>,
}

pub fn price_product(product: Product, discounts: &[Discount], now: DateTime<Utc>) -> Result<PricedProduct, PricingError> {
    let PriceResolution { final_price, discount_info } = resolve(&product, discounts, now)?;
    Ok(PricedProduct { product, final_price, discount_info })
}

pub fn price_products(products: Vec<Product>, discounts: &[Discount], now: DateTime<Utc>) -> Result<Vec<PricedProduct>, PricingError> {
    products.into_iter().map(|p| price_product(p, discounts, now)).collect()
}

/// Flat shipping fee, waived once the discounted subtotal reaches the threshold.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShippingPolicy {
    pub fee: Decimal,
    pub free_threshold: Option<Decimal>,
}

impl ShippingPolicy {
    pub fn shipping_for(&self, discounted_subtotal: Decimal) -> Decimal {
        match self.free_threshold {
            Some(threshold) if discounted_subtotal >= threshold => Decimal::ZERO,
            _ => self.fee,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedLine {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub image: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
    pub final_price: Decimal,
    pub discount_info: Option<DiscountInfo>,
    pub line_total: Decimal,
}

impl QuotedLine {
    pub fn to_line_item(&self) -> LineItem {
        // `price >= final_price >= 0`, so the difference cannot overflow.
        LineItem {
            product_id: self.product_id,
            name: self.name.clone(),
            sku: self.sku.clone(),
            size: self.size.clone(),
            quantity: self.quantity,
            original_price: self.price,
            unit_price: self.final_price,
            discount_amount: self.price - self.final_price,
            discount_title: self.discount_info.as_ref().map(|i| i.discount.title.clone()),
            total: self.line_total,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuote {
    pub session_id: String,
    pub lines: Vec<QuotedLine>,
    /// Lines whose product is gone or no longer on sale.
    pub unavailable: Vec<Uuid>,
    pub item_count: u32,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Prices every line of `cart`. `products` may contain more than the cart
/// needs; missing or inactive products land in `unavailable`.
pub fn quote_cart(
    cart: &Cart,
    products: &[Product],
    discounts: &[Discount],
    shipping: &ShippingPolicy,
    currency: &str,
    now: DateTime<Utc>,
) -> Result<CartQuote, PricingError> {
    let by_id: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id(), p)).collect();
    let mut lines = Vec::with_capacity(cart.item_count());
    let mut unavailable = vec![];

    for item in cart.items() {
        let Some(product) = by_id.get(&item.product_id).filter(|p| p.is_active()) else {
            unavailable.push(item.product_id);
            continue;
        };
        let resolution = resolve(product, discounts, now)?;
        let line_total = LineItem::total_for(resolution.final_price, item.quantity, currency)?.amount();
        lines.push(QuotedLine {
            product_id: product.id(),
            name: product.name().to_string(),
            sku: product.sku().to_string(),
            image: product.images().first().cloned(),
            size: item.size.clone(),
            quantity: item.quantity,
            price: product.price(),
            final_price: resolution.final_price,
            discount_info: resolution.discount_info,
            line_total,
        });
    }

    let items: Vec<LineItem> = lines.iter().map(QuotedLine::to_line_item).collect();
    let totals = OrderTotals::compute(&items, currency, |discounted| {
        if items.is_empty() { Decimal::ZERO } else { shipping.shipping_for(discounted) }
    })?;

    Ok(CartQuote {
        session_id: cart.session_id().to_string(),
        item_count: lines.iter().map(|l| l.quantity).sum(),
        totals,
        lines,
        unavailable,
    })
}
