//! HTTP API.

mod addresses;
mod cart;
mod categories;
mod discounts;
mod orders;
mod products;
mod wishlist;

use std::sync::Arc;

use axum::{http::StatusCode, response::{IntoResponse, Response}, routing::{get, post, put}, Json, Router};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::domain::aggregates::{AddressError, CartError, OrderError, ProductError};
use crate::events::EventPublisher;
use crate::store::Store;
use crate::StorefrontError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub events: EventPublisher,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher, config: Config) -> Self {
        Self { store, events, config: Arc::new(config) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .route("/api/v1/products", get(products::list_products).post(products::create_product))
        .route("/api/v1/products/:id", get(products::get_product).put(products::update_product).delete(products::delete_product))
        .route("/api/v1/categories", get(categories::list_categories).post(categories::create_category))
        .route("/api/v1/categories/:id", get(categories::get_category).delete(categories::delete_category))
        .route("/api/v1/discounts", get(discounts::list_discounts).post(discounts::create_discount))
        .route("/api/v1/discounts/active", get(discounts::list_active_discounts))
        .route("/api/v1/discounts/home", get(discounts::list_home_discounts))
        .route("/api/v1/discounts/:id", get(discounts::get_discount).put(discounts::update_discount).delete(discounts::delete_discount))
        .route("/api/v1/cart/:session", get(cart::get_cart).post(cart::add_to_cart).delete(cart::clear_cart))
        .route("/api/v1/cart/:session/items/:product_id", put(cart::update_item).delete(cart::remove_item))
        .route("/api/v1/checkout", post(orders::checkout))
        .route("/api/v1/orders", get(orders::list_orders))
        .route("/api/v1/orders/:id", get(orders::get_order))
        .route("/api/v1/orders/:id/status", post(orders::update_status))
        .route("/api/v1/customers/:customer/addresses", get(addresses::list_addresses).post(addresses::add_address))
        .route("/api/v1/customers/:customer/addresses/:id", axum::routing::delete(addresses::remove_address))
        .route("/api/v1/customers/:customer/addresses/:id/default", put(addresses::set_default_address))
        .route("/api/v1/customers/:customer/wishlist", get(wishlist::get_wishlist).post(wishlist::add_to_wishlist))
        .route("/api/v1/customers/:customer/wishlist/:product_id", axum::routing::delete(wishlist::remove_from_wishlist))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl StorefrontError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ProductNotFound(_) | Self::CategoryNotFound(_) | Self::DiscountNotFound(_) | Self::OrderNotFound(_)
            | Self::Cart(CartError::ItemNotFound(_)) | Self::Address(AddressError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Unavailable(_)
            | Self::Product(ProductError::InsufficientInventory { .. } | ProductError::Archived)
            | Self::Order(OrderError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Document(_) | Self::Order(OrderError::Money(_)) | Self::Pricing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        assert_eq!(StorefrontError::ProductNotFound(Uuid::nil()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(StorefrontError::EmptyCart.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(StorefrontError::Cart(CartError::InvalidQuantity(0)).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            StorefrontError::Product(ProductError::InsufficientInventory { sku: "A".into(), available: 0, requested: 1 }).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(StorefrontError::Database(sqlx::Error::RowNotFound).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
