//! Signed-in customer: profile and own orders

use axum::{extract::{Path, Query, State}, routing::get, Json, Router};
use uuid::Uuid;

use crate::api::{AppState, PageParams};
use crate::auth::{Customer, CustomerClaims};
use crate::domain::aggregates::Order;
use crate::repo::{OrderQuery, Page};
use crate::{Error, Result};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/me/orders", get(my_orders))
        .route("/me/orders/:id", get(my_order))
}

async fn me(Customer(claims): Customer) -> Json<CustomerClaims> {
    Json(claims)
}

async fn my_orders(State(s): State<AppState>, Customer(claims): Customer, Query(p): Query<PageParams>) -> Result<Json<Page<Order>>> {
    let query = OrderQuery { status: None, customer_id: Some(claims.sub), paging: (&p).into() };
    Ok(Json(s.repo.list_orders(&query).await?))
}

// Someone else's order is reported as missing rather than forbidden.
async fn my_order(State(s): State<AppState>, Customer(claims): Customer, Path(id): Path<Uuid>) -> Result<Json<Order>> {
    s.repo.get_order(id).await?
        .filter(|o| o.customer_id.as_deref() == Some(claims.sub.as_str()))
        .map(Json)
        .ok_or(Error::NotFound("Order"))
}
