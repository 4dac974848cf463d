use axum::{extract::{Path, State}, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::pricing::{price_products, PricedProduct};
use crate::{Result, StorefrontError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistRequest {
    pub product_id: Uuid,
}

/// Archived or deleted products stay on the list but are not returned.
pub async fn get_wishlist(State(s): State<AppState>, Path(customer): Path<String>) -> Result<Json<Vec<PricedProduct>>> {
    let wishlist = s.store.load_wishlist(&customer).await?;
    if wishlist.product_ids().is_empty() {
        return Ok(Json(vec![]));
    }
    let mut products = s.store.get_products(wishlist.product_ids()).await?;
    products.retain(|p| p.is_active());
    products.sort_by_key(|p| wishlist.product_ids().iter().position(|id| *id == p.id()));
    let now = Utc::now();
    let discounts = s.store.list_live_discounts(now).await?;
    Ok(Json(price_products(products, &discounts, now)?))
}

pub async fn add_to_wishlist(
    State(s): State<AppState>,
    Path(customer): Path<String>,
    Json(r): Json<WishlistRequest>,
) -> Result<StatusCode> {
    s.store.get_product(r.product_id).await?.ok_or(StorefrontError::ProductNotFound(r.product_id))?;
    let mut wishlist = s.store.load_wishlist(&customer).await?;
    if !wishlist.add(r.product_id) {
        return Ok(StatusCode::OK);
    }
    s.store.save_wishlist(&wishlist).await?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_from_wishlist(State(s): State<AppState>, Path((customer, product_id)): Path<(String, Uuid)>) -> Result<StatusCode> {
    let mut wishlist = s.store.load_wishlist(&customer).await?;
    if wishlist.remove(product_id) {
        s.store.save_wishlist(&wishlist).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
