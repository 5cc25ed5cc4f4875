use axum::{extract::{Path, State}, http::StatusCode, Json};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::admin::money;
use crate::api::AppState;
use crate::domain::aggregates::{PaymentMethod, Settings, Store};
use crate::domain::value_objects::PhoneNumber;
use crate::services::load_settings;
use crate::{Error, Result};

fn default_active() -> bool { true }

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentMethodRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub instructions: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 32))]
    pub whatsapp: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SettingsRequest {
    #[validate(length(min = 1, max = 120))]
    pub shop_name: String,
    #[validate(length(equal = 3))]
    pub currency: String,
    #[validate(length(max = 32))]
    pub whatsapp_number: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub delivery_fee: Decimal,
}

/// Blank clears the number; anything else has to be dialable.
fn whatsapp(raw: Option<String>) -> Result<Option<String>> {
    match raw.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        Some(number) => {
            PhoneNumber::parse(&number)?;
            Ok(Some(number))
        }
        None => Ok(None),
    }
}

pub async fn list_payment_methods(State(s): State<AppState>) -> Result<Json<Vec<PaymentMethod>>> {
    Ok(Json(s.repo.list_payment_methods(false).await?))
}

impl PaymentMethodRequest {
    fn apply(self, method: &mut PaymentMethod) {
        method.name = self.name;
        method.instructions = self.instructions;
        method.active = self.active;
        method.position = self.position;
        method.updated_at = Utc::now();
    }
}

pub async fn create_payment_method(State(s): State<AppState>, Json(r): Json<PaymentMethodRequest>) -> Result<(StatusCode, Json<PaymentMethod>)> {
    r.validate()?;
    let mut method = PaymentMethod::create(&r.name);
    r.apply(&mut method);
    s.repo.save_payment_method(&method).await?;
    Ok((StatusCode::CREATED, Json(method)))
}

pub async fn update_payment_method(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<PaymentMethodRequest>) -> Result<Json<PaymentMethod>> {
    r.validate()?;
    let mut method = s.repo.get_payment_method(id).await?.ok_or(Error::NotFound("Payment method"))?;
    r.apply(&mut method);
    s.repo.save_payment_method(&method).await?;
    Ok(Json(method))
}

pub async fn delete_payment_method(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if !s.repo.delete_payment_method(id).await? {
        return Err(Error::NotFound("Payment method"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_stores(State(s): State<AppState>) -> Result<Json<Vec<Store>>> {
    Ok(Json(s.repo.list_stores(false).await?))
}

impl StoreRequest {
    fn apply(self, store: &mut Store) -> Result<()> {
        store.whatsapp = whatsapp(self.whatsapp)?;
        store.name = self.name;
        store.address = self.address;
        store.phone = self.phone;
        store.active = self.active;
        store.updated_at = Utc::now();
        Ok(())
    }
}

pub async fn create_store(State(s): State<AppState>, Json(r): Json<StoreRequest>) -> Result<(StatusCode, Json<Store>)> {
    r.validate()?;
    let mut store = Store::create(&r.name);
    r.apply(&mut store)?;
    s.repo.save_store(&store).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

pub async fn update_store(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<StoreRequest>) -> Result<Json<Store>> {
    r.validate()?;
    let mut store = s.repo.get_store(id).await?.ok_or(Error::NotFound("Store"))?;
    r.apply(&mut store)?;
    s.repo.save_store(&store).await?;
    Ok(Json(store))
}

/// Per-store stock rows go with the store; past orders keep their `store_id`.
pub async fn delete_store(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if !s.repo.delete_store(id).await? {
        return Err(Error::NotFound("Store"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_settings(State(s): State<AppState>, Json(r): Json<SettingsRequest>) -> Result<Json<Settings>> {
    r.validate()?;
    money("delivery_fee", r.delivery_fee)?;
    let mut settings = load_settings(s.repo.as_ref()).await?;
    settings.shop_name = r.shop_name;
    settings.currency = r.currency.to_ascii_uppercase();
    settings.whatsapp_number = whatsapp(r.whatsapp_number)?;
    settings.contact_email = r.contact_email;
    settings.delivery_fee = r.delivery_fee;
    settings.updated_at = Utc::now();
    s.repo.save_settings(&settings).await?;
    tracing::info!(shop = %settings.shop_name, currency = %settings.currency, "settings updated");
    Ok(Json(settings))
}
