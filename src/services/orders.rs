//! Order placement and lifecycle.

use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::aggregates::{
    CartItem, CustomerDetails, LineItem, Order, OrderStatus, PaymentMethod, Product, Settings, StockReservation, Store, MAX_LINE_QUANTITY,
};
use crate::domain::events::{DomainEvent, EventPublisher, ProductEvent};
use crate::domain::value_objects::Money;
use crate::repo::Repository;
use crate::services::load_settings;
use crate::{Error, Result};

/// How many order numbers are tried before a clash is reported to the caller.
const ORDER_NUMBER_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer: CustomerDetails,
    pub customer_id: Option<String>,
    pub store_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub notes: Option<String>,
    pub items: Vec<CartItem>,
}

/// A committed order with what the WhatsApp hand-off needs to describe it.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub settings: Settings,
    pub store: Option<Store>,
    pub payment_method: Option<PaymentMethod>,
}

/// Folds repeated product/variant lines into one, keeping first-seen order.
fn merge_lines(items: Vec<CartItem>) -> Result<Vec<CartItem>> {
    let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            return Err(Error::Validation("Item quantity must be at least 1".to_string()));
        }
        match merged.iter_mut().find(|m| m.product_id == item.product_id && m.variant_id == item.variant_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(item.quantity)
                    .filter(|q| *q <= MAX_LINE_QUANTITY)
                    .ok_or_else(|| Error::Validation(format!("Quantity per line cannot exceed {}", MAX_LINE_QUANTITY)))?;
            }
            None => merged.push(item),
        }
    }
    Ok(merged)
}

pub async fn place_order(repo: &dyn Repository, events: &EventPublisher, draft: OrderDraft) -> Result<PlacedOrder> {
    place_order_numbered(repo, events, draft, Order::next_number).await
}

async fn place_order_numbered(
    repo: &dyn Repository,
    events: &EventPublisher,
    draft: OrderDraft,
    mut next_number: impl FnMut() -> String + Send,
) -> Result<PlacedOrder> {
    if draft.items.is_empty() {
        return Err(Error::Validation("Order has no items".to_string()));
    }
    let items = merge_lines(draft.items)?;
    let settings = load_settings(repo).await?;

    let store = match draft.store_id {
        Some(id) => Some(repo.get_store(id).await?.filter(|s| s.active).ok_or(Error::NotFound("Store"))?),
        None => None,
    };
    let payment_method = match draft.payment_method_id {
        Some(id) => Some(repo.get_payment_method(id).await?.filter(|m| m.active).ok_or(Error::NotFound("Payment method"))?),
        None => None,
    };

    let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, Product> = repo.get_products(&ids).await?.into_iter().map(|p| (p.id, p)).collect();

    let mut order = Order::create(next_number(), draft.customer, &settings.currency);
    order.customer_id = draft.customer_id;
    order.store_id = store.as_ref().map(|s| s.id);
    order.payment_method_id = payment_method.as_ref().map(|m| m.id);
    order.notes = draft.notes;

    // Variants share their product's stock, so demand is summed per product.
    let mut demand: Vec<(&Product, u32)> = Vec::new();
    for item in &items {
        let product = products.get(&item.product_id).filter(|p| p.is_active()).ok_or(Error::NotFound("Product"))?;
        let line = LineItem::priced(product, item.variant_id, item.quantity).map_err(|e| Error::product(&product.name, e))?;
        order.add_item(line);
        match demand.iter_mut().find(|(p, _)| p.id == product.id) {
            Some((_, qty)) => *qty = qty.checked_add(item.quantity).ok_or_else(|| Error::Validation("Item quantity too large".to_string()))?,
            None => demand.push((product, item.quantity)),
        }
    }
    for (product, qty) in &demand {
        let reservation = product.plan_reservation(order.store_id, *qty).map_err(|e| Error::product(&product.name, e))?;
        order.reservations.push(reservation);
    }
    order.set_delivery_fee(settings.delivery_fee);
    Money::check(order.total).map_err(|e| Error::Validation(format!("Order total {e}")))?;
    order.finalize()?;

    let depleted = commit(repo, &mut order, &mut next_number).await?;
    tracing::info!(
        order_id = %order.id, order_number = %order.order_number, total = %order.total,
        lines = order.items.len(), store_id = ?order.store_id, "order placed"
    );

    let mut raised = order.take_events();
    raised.extend(depletion_events(&products, &depleted));
    events.publish(raised).await;

    Ok(PlacedOrder { order, settings, store, payment_method })
}

/// Stores the order, drawing a new number whenever the current one is already taken.
async fn commit(repo: &dyn Repository, order: &mut Order, next_number: &mut (impl FnMut() -> String + Send)) -> Result<Vec<StockReservation>> {
    let mut attempt = 1;
    loop {
        match repo.place_order(order).await {
            Err(Error::Conflict(reason)) if attempt < ORDER_NUMBER_ATTEMPTS => {
                tracing::warn!(order_number = %order.order_number, attempt, %reason, "order number taken, retrying");
                order.renumber(next_number());
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn depletion_events(products: &HashMap<Uuid, Product>, depleted: &[StockReservation]) -> Vec<DomainEvent> {
    depleted.iter()
        .filter_map(|r| products.get(&r.product_id).map(|p| (r, p)))
        .map(|(r, p)| DomainEvent::Product(ProductEvent::StockDepleted { product_id: p.id, name: p.name.clone(), source: r.source }))
        .collect()
}

/// Moves an order to `next`; cancelling puts its reserved stock back.
pub async fn change_status(repo: &dyn Repository, events: &EventPublisher, order_id: Uuid, next: OrderStatus) -> Result<Order> {
    let mut order = repo.get_order(order_id).await?.ok_or(Error::NotFound("Order"))?;
    let previous = order.status;
    let release = order.transition(next)?;
    repo.update_order(&order, previous, &release).await?;
    tracing::info!(order_id = %order.id, from = %previous, to = %next, restocked = release.len(), "order status changed");
    events.publish(order.take_events()).await;
    Ok(order)
}
