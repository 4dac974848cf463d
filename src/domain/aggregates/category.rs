//! Category Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    parent_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl Category {
    pub fn create(name: impl Into<String>, description: Option<String>, parent_id: Option<Uuid>) -> Result<Self, CategoryError> {
        let name = name.into().trim().to_string();
        if name.is_empty() { return Err(CategoryError::MissingName); }
        Ok(Self {
            id: Uuid::now_v7(),
            slug: slugify(&name),
            name,
            description,
            parent_id,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn slug(&self) -> &str { &self.slug }
}

fn slugify(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    #[error("category name is required")]
    MissingName,
}
