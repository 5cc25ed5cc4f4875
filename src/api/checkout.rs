//! Checkout: place the order, then hand the customer off to WhatsApp

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::auth::OptionalCustomer;
use crate::domain::aggregates::{CartItem, CustomerDetails, Order};
use crate::domain::checkout::{handoff_number, order_message, whatsapp_url};
use crate::domain::value_objects::PhoneNumber;
use crate::services::orders::{self, OrderDraft};
use crate::{Error, Result};

pub fn routes() -> Router<AppState> {
    Router::new().route("/checkout", post(checkout))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: u32,
}

/// Either `items` or the `session_id` of a server-side cart.
#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate]
    pub customer: CustomerRequest,
    #[serde(default)]
    #[validate]
    pub items: Vec<CheckoutItem>,
    #[validate(length(min = 1, max = 128))]
    pub session_id: Option<String>,
    pub store_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    pub message: String,
    /// None when neither the store nor the shop has a usable WhatsApp number.
    pub whatsapp_url: Option<String>,
}

async fn checkout(
    State(s): State<AppState>,
    OptionalCustomer(claims): OptionalCustomer,
    Json(r): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    r.validate()?;
    PhoneNumber::parse(&r.customer.phone)?;

    let (items, session) = if !r.items.is_empty() {
        let items = r.items.iter().map(|i| CartItem { product_id: i.product_id, variant_id: i.variant_id, quantity: i.quantity }).collect();
        (items, None)
    } else if let Some(session) = r.session_id {
        let cart = s.repo.get_cart(&session).await?.ok_or(Error::NotFound("Cart"))?;
        if cart.is_empty() {
            return Err(Error::Validation("Cart is empty".to_string()));
        }
        (cart.items().to_vec(), Some(session))
    } else {
        return Err(Error::Validation("Provide items or a cart session_id".to_string()));
    };

    let customer_id = claims.as_ref().map(|c| c.sub.clone());
    let customer = CustomerDetails {
        name: r.customer.name.trim().to_string(),
        phone: r.customer.phone.trim().to_string(),
        email: r.customer.email.or_else(|| claims.and_then(|c| c.email)),
        address: r.customer.address,
    };
    let draft = OrderDraft { customer, customer_id, store_id: r.store_id, payment_method_id: r.payment_method_id, notes: r.notes, items };
    let placed = orders::place_order(s.repo.as_ref(), &s.events, draft).await?;

    if let Some(session) = session {
        // The order is already committed; a stale cart is only an annoyance.
        if let Err(e) = s.repo.delete_cart(&session).await {
            tracing::warn!(session = %session, error = %e, "failed to clear cart after checkout");
        }
    }

    let message = order_message(&placed.settings, &placed.order, placed.store.as_ref(), placed.payment_method.as_ref());
    let whatsapp_url = handoff_number(&placed.settings, placed.store.as_ref()).map(|n| whatsapp_url(&n, &message));
    Ok((StatusCode::CREATED, Json(CheckoutResponse { order: placed.order, message, whatsapp_url })))
}
