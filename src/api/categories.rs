use axum::{extract::{Path, State}, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::domain::aggregates::Category;
use crate::{Result, StorefrontError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

pub async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.store.list_categories().await?))
}

pub async fn get_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Category>> {
    let category = s.store.get_category(id).await?.ok_or(StorefrontError::CategoryNotFound(id))?;
    Ok(Json(category))
}

pub async fn create_category(State(s): State<AppState>, Json(r): Json<CreateCategoryRequest>) -> Result<(StatusCode, Json<Category>)> {
    r.validate()?;
    if let Some(parent) = r.parent_id {
        s.store.get_category(parent).await?.ok_or(StorefrontError::CategoryNotFound(parent))?;
    }
    let category = Category::create(r.name, r.description, r.parent_id)?;
    s.store.save_category(&category).await?;
    tracing::info!(category_id = %category.id(), slug = %category.slug(), "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn delete_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if !s.store.delete_category(id).await? {
        return Err(StorefrontError::CategoryNotFound(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
