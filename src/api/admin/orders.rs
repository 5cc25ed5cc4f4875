use axum::{extract::{Path, Query, State}, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::aggregates::{Order, OrderStatus};
use crate::repo::{OrderQuery, Page, Paging};
use crate::services::orders;
use crate::{Error, Result};

#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest { pub status: String }

fn parse_status(raw: &str) -> Result<OrderStatus> {
    OrderStatus::parse(raw).ok_or_else(|| Error::Validation(format!("Unknown order status: {raw}")))
}

pub async fn list_orders(State(s): State<AppState>, Query(p): Query<OrderListParams>) -> Result<Json<Page<Order>>> {
    let status = match p.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(parse_status(raw)?),
    };
    let query = OrderQuery { status, customer_id: None, paging: Paging::new(p.page, p.per_page) };
    Ok(Json(s.repo.list_orders(&query).await?))
}

pub async fn get_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Order>> {
    s.repo.get_order(id).await?.map(Json).ok_or(Error::NotFound("Order"))
}

pub async fn change_status(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<StatusRequest>) -> Result<Json<Order>> {
    let next = parse_status(&r.status)?;
    Ok(Json(orders::change_status(s.repo.as_ref(), &s.events, id, next).await?))
}
