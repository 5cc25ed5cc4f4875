//! Public shop information: stores, payment methods, settings

use axum::{extract::State, routing::get, Json, Router};

use crate::api::AppState;
use crate::domain::aggregates::{PaymentMethod, Settings, Store};
use crate::services::load_settings;
use crate::Result;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stores", get(list_stores))
        .route("/payment-methods", get(list_payment_methods))
        .route("/settings", get(get_settings))
}

async fn list_stores(State(s): State<AppState>) -> Result<Json<Vec<Store>>> {
    Ok(Json(s.repo.list_stores(true).await?))
}

async fn list_payment_methods(State(s): State<AppState>) -> Result<Json<Vec<PaymentMethod>>> {
    Ok(Json(s.repo.list_payment_methods(true).await?))
}

async fn get_settings(State(s): State<AppState>) -> Result<Json<Settings>> {
    Ok(Json(load_settings(s.repo.as_ref()).await?))
}
