//! Category Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn create(name: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), name: name.into(), slug: slug.into(), description: None, image_url: None, created_at: now, updated_at: now }
    }
}
