//! Store Aggregate: a physical outlet customers can order from

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Overrides the shop-wide WhatsApp number for orders placed at this store.
    pub whatsapp: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub fn create(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), name: name.into(), address: None, phone: None, whatsapp: None, active: true, created_at: now, updated_at: now }
    }
}
