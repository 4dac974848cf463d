use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::{AppState, PaginatedResponse};
use crate::domain::aggregates::Product;
use crate::domain::value_objects::Sku;
use crate::pricing::{price_product, price_products, PricedProduct};
use crate::store::ProductQuery;
use crate::{Result, StorefrontError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    /// Ignored on update; a product keeps the SKU it was created with.
    pub sku: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub images: Vec<String>,
    pub inventory: Option<u32>,
}

pub async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<PaginatedResponse<PricedProduct>>> {
    let query = ProductQuery::new(p.page, p.per_page, p.category, p.search);
    let (products, total) = s.store.list_products(&query).await?;
    let now = Utc::now();
    let discounts = s.store.list_live_discounts(now).await?;
    let data = price_products(products, &discounts, now)?;
    Ok(Json(PaginatedResponse { data, total, page: query.page, per_page: query.per_page }))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<PricedProduct>> {
    let product = s.store.get_product(id).await?.ok_or(StorefrontError::ProductNotFound(id))?;
    let now = Utc::now();
    let discounts = s.store.list_live_discounts(now).await?;
    Ok(Json(price_product(product, &discounts, now)?))
}

async fn ensure_category(s: &AppState, category_id: Option<Uuid>) -> Result<()> {
    if let Some(id) = category_id {
        s.store.get_category(id).await?.ok_or(StorefrontError::CategoryNotFound(id))?;
    }
    Ok(())
}

pub async fn create_product(State(s): State<AppState>, Json(r): Json<ProductRequest>) -> Result<(StatusCode, Json<Product>)> {
    r.validate()?;
    ensure_category(&s, r.category_id).await?;
    let mut product = Product::create(Sku::new(r.sku)?, r.name.clone(), r.price)?;
    product.update_details(r.name, r.description, r.category_id, r.sizes, r.images)?;
    product.set_inventory(r.inventory.unwrap_or(0));
    product.publish()?;
    let events = product.take_events();
    s.store.save_product(&product).await?;
    tracing::info!(product_id = %product.id(), sku = %product.sku(), "product created");
    s.events.publish_all(events).await;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<ProductRequest>) -> Result<Json<Product>> {
    r.validate()?;
    ensure_category(&s, r.category_id).await?;
    let mut product = s.store.get_product(id).await?.ok_or(StorefrontError::ProductNotFound(id))?;
    product.update_details(r.name, r.description, r.category_id, r.sizes, r.images)?;
    product.update_price(r.price)?;
    if let Some(qty) = r.inventory { product.set_inventory(qty); }
    let events = product.take_events();
    s.store.save_product(&product).await?;
    s.events.publish_all(events).await;
    Ok(Json(product))
}

pub async fn delete_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let mut product = s.store.get_product(id).await?.ok_or(StorefrontError::ProductNotFound(id))?;
    product.archive();
    let events = product.take_events();
    s.store.save_product(&product).await?;
    tracing::info!(product_id = %id, "product archived");
    s.events.publish_all(events).await;
    Ok(StatusCode::NO_CONTENT)
}
