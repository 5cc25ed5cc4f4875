//! Shop-wide settings

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub shop_name: String,
    pub currency: String,
    pub whatsapp_number: Option<String>,
    pub contact_email: Option<String>,
    pub delivery_fee: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shop_name: "Storefront".to_string(),
            currency: "USD".to_string(),
            whatsapp_number: None,
            contact_email: None,
            delivery_fee: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }
}
