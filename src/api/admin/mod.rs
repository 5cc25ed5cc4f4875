//! Admin API. Everything except `/login` sits behind [`require_admin`].

mod catalog;
mod orders;
mod shop;

use std::sync::Arc;

use axum::{extract::State, middleware, routing::{get, post, put}, Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::AppState;
use crate::auth::{require_admin, AuthKeys};
use crate::domain::value_objects::Money;
use crate::{Error, Result};

pub fn routes(auth: Arc<AuthKeys>) -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route("/products/:id", put(catalog::update_product).delete(catalog::delete_product))
        .route("/products/:id/stock", put(catalog::set_stock))
        .route("/categories", post(catalog::create_category))
        .route("/categories/:id", put(catalog::update_category).delete(catalog::delete_category))
        .route("/orders", get(orders::list_orders))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/status", put(orders::change_status))
        .route("/payment-methods", get(shop::list_payment_methods).post(shop::create_payment_method))
        .route("/payment-methods/:id", put(shop::update_payment_method).delete(shop::delete_payment_method))
        .route("/stores", get(shop::list_stores).post(shop::create_store))
        .route("/stores/:id", put(shop::update_store).delete(shop::delete_store))
        .route("/settings", put(shop::update_settings))
        .route_layer(middleware::from_fn_with_state(auth, require_admin))
        .route("/login", post(login))
}

fn money(field: &str, amount: Decimal) -> Result<()> {
    Money::check(amount).map_err(|e| Error::Validation(format!("{field} {e}")))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 1024))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

async fn login(State(s): State<AppState>, Json(r): Json<LoginRequest>) -> Result<Json<LoginResponse>> {
    r.validate()?;
    let access_token = s.auth.login(&r.email, &r.password)?;
    tracing::info!(email = %r.email, "admin signed in");
    Ok(Json(LoginResponse { access_token, token_type: "Bearer", expires_in: s.auth.admin_token_ttl().num_seconds() }))
}
