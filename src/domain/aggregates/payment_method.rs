//! Payment Method Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub name: String,
    /// Shown to the customer and repeated in the WhatsApp message, e.g. a till number.
    pub instructions: Option<String>,
    pub active: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentMethod {
    pub fn create(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), name: name.into(), instructions: None, active: true, position: 0, created_at: now, updated_at: now }
    }
}
