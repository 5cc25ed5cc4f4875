//! Server-side carts keyed by an opaque session id

use axum::{extract::{Path, State}, http::StatusCode, routing::{get, post}, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::domain::aggregates::{Cart, CartItem, CartView, ProductError};
use crate::services::price_cart;
use crate::{Error, Result};

const MAX_SESSION_LEN: usize = 128;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart/:session", get(get_cart).delete(clear_cart))
        .route("/cart/:session/items", post(add_item).put(update_item))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: u32,
}

/// Quantity 0 removes the line.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(range(max = 10000))]
    pub quantity: u32,
}

fn check_session(session: &str) -> Result<()> {
    if session.trim().is_empty() || session.len() > MAX_SESSION_LEN {
        return Err(Error::Validation(format!("Session id must be 1 to {MAX_SESSION_LEN} characters")));
    }
    Ok(())
}

async fn load(s: &AppState, session: &str) -> Result<Cart> {
    check_session(session)?;
    Ok(s.repo.get_cart(session).await?.unwrap_or_else(|| Cart::new(session)))
}

async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<CartView>> {
    let cart = load(&s, &session).await?;
    Ok(Json(price_cart(s.repo.as_ref(), &cart).await?))
}

async fn add_item(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<AddItemRequest>) -> Result<Json<CartView>> {
    r.validate()?;
    let product = s.repo.get_product(r.product_id).await?.filter(|p| p.is_active()).ok_or(Error::NotFound("Product"))?;
    if let Some(variant_id) = r.variant_id {
        if product.variant(variant_id).is_none() {
            return Err(Error::product(&product.name, ProductError::UnknownVariant(variant_id)));
        }
    }

    let mut cart = load(&s, &session).await?;
    cart.add_item(CartItem { product_id: r.product_id, variant_id: r.variant_id, quantity: r.quantity })?;
    s.repo.save_cart(&cart).await?;
    Ok(Json(price_cart(s.repo.as_ref(), &cart).await?))
}

async fn update_item(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<UpdateItemRequest>) -> Result<Json<CartView>> {
    r.validate()?;
    let mut cart = load(&s, &session).await?;
    cart.update_quantity(r.product_id, r.variant_id, r.quantity)?;
    s.repo.save_cart(&cart).await?;
    Ok(Json(price_cart(s.repo.as_ref(), &cart).await?))
}

async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode> {
    check_session(&session)?;
    s.repo.delete_cart(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
