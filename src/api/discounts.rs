use axum::{extract::{Path, State}, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::domain::aggregates::{Discount, DiscountDraft, DiscountKind};
use crate::{Result, StorefrontError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    #[serde(default)]
    pub applicable_products: Vec<Uuid>,
    #[serde(default)]
    pub applicable_categories: Vec<Uuid>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub show_on_home_page: bool,
}

fn default_active() -> bool { true }

impl From<DiscountRequest> for DiscountDraft {
    fn from(r: DiscountRequest) -> Self {
        Self {
            title: r.title,
            description: r.description,
            kind: r.kind,
            value: r.value,
            max_discount_amount: r.max_discount_amount,
            applicable_products: r.applicable_products,
            applicable_categories: r.applicable_categories,
            active: r.active,
            start_date: r.start_date,
            end_date: r.end_date,
            show_on_home_page: r.show_on_home_page,
        }
    }
}

pub async fn list_discounts(State(s): State<AppState>) -> Result<Json<Vec<Discount>>> {
    Ok(Json(s.store.list_discounts().await?))
}

pub async fn list_active_discounts(State(s): State<AppState>) -> Result<Json<Vec<Discount>>> {
    Ok(Json(s.store.list_live_discounts(Utc::now()).await?))
}

pub async fn list_home_discounts(State(s): State<AppState>) -> Result<Json<Vec<Discount>>> {
    let mut discounts = s.store.list_live_discounts(Utc::now()).await?;
    discounts.retain(|d| d.show_on_home_page());
    Ok(Json(discounts))
}

pub async fn get_discount(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Discount>> {
    let discount = s.store.get_discount(id).await?.ok_or(StorefrontError::DiscountNotFound(id))?;
    Ok(Json(discount))
}

pub async fn create_discount(State(s): State<AppState>, Json(r): Json<DiscountRequest>) -> Result<(StatusCode, Json<Discount>)> {
    r.validate()?;
    let mut discount = Discount::create(r.into())?;
    let events = discount.take_events();
    s.store.save_discount(&discount).await?;
    tracing::info!(discount_id = %discount.id(), kind = ?discount.kind(), value = %discount.value(), "discount created");
    s.events.publish_all(events).await;
    Ok((StatusCode::CREATED, Json(discount)))
}

pub async fn update_discount(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<DiscountRequest>) -> Result<Json<Discount>> {
    r.validate()?;
    let mut discount = s.store.get_discount(id).await?.ok_or(StorefrontError::DiscountNotFound(id))?;
    discount.update(r.into())?;
    let events = discount.take_events();
    s.store.save_discount(&discount).await?;
    tracing::info!(discount_id = %id, "discount updated");
    s.events.publish_all(events).await;
    Ok(Json(discount))
}

pub async fn delete_discount(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let mut discount = s.store.get_discount(id).await?.ok_or(StorefrontError::DiscountNotFound(id))?;
    s.store.delete_discount(id).await?;
    discount.mark_deleted();
    tracing::info!(discount_id = %id, "discount deleted");
    s.events.publish_all(discount.take_events()).await;
    Ok(StatusCode::NO_CONTENT)
}
