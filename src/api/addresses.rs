use axum::{extract::{Path, State}, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::domain::aggregates::{Address, NewAddress};
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddAddressRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(min = 1, max = 200))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(equal = 2))]
    pub country: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

pub async fn list_addresses(State(s): State<AppState>, Path(customer): Path<String>) -> Result<Json<Vec<Address>>> {
    let book = s.store.load_address_book(&customer).await?;
    Ok(Json(book.addresses().to_vec()))
}

pub async fn add_address(
    State(s): State<AppState>,
    Path(customer): Path<String>,
    Json(r): Json<AddAddressRequest>,
) -> Result<(StatusCode, Json<Vec<Address>>)> {
    r.validate()?;
    let mut book = s.store.load_address_book(&customer).await?;
    let new = NewAddress {
        full_name: r.full_name, line1: r.line1, line2: r.line2, city: r.city, state: r.state,
        postal_code: r.postal_code, country: r.country.to_uppercase(), phone: r.phone,
    };
    let id = book.add(new, r.is_default)?;
    s.store.save_address_book(&book).await?;
    tracing::debug!(%customer, address_id = %id, "address added");
    Ok((StatusCode::CREATED, Json(book.addresses().to_vec())))
}

pub async fn set_default_address(State(s): State<AppState>, Path((customer, id)): Path<(String, Uuid)>) -> Result<Json<Vec<Address>>> {
    let mut book = s.store.load_address_book(&customer).await?;
    book.set_default(id)?;
    s.store.save_address_book(&book).await?;
    Ok(Json(book.addresses().to_vec()))
}

pub async fn remove_address(State(s): State<AppState>, Path((customer, id)): Path<(String, Uuid)>) -> Result<StatusCode> {
    let mut book = s.store.load_address_book(&customer).await?;
    book.remove(id)?;
    s.store.save_address_book(&book).await?;
    Ok(StatusCode::NO_CONTENT)
}
