//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::{OrderStatus, StockSource};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    StockDepleted { product_id: Uuid, name: String, source: StockSource },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, order_number: String, total: Decimal, customer_id: Option<String> },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::StockDepleted { .. }) => "storefront.product.stock_depleted",
            Self::Order(OrderEvent::Placed { .. }) => "storefront.order.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "storefront.order.status_changed",
        }
    }
}

/// Fans domain events out to the log and, when connected, to NATS.
#[derive(Clone, Default)]
pub struct EventPublisher { nats: Option<async_nats::Client> }

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub async fn publish(&self, events: Vec<DomainEvent>) {
        for event in events {
            tracing::info!(subject = event.subject(), ?event, "domain event");
            let Some(client) = &self.nats else { continue };
            let payload = match serde_json::to_vec(&event) {
                Ok(p) => p,
                Err(e) => { tracing::warn!(error = %e, "failed to encode event"); continue; }
            };
            if let Err(e) = client.publish(event.subject().to_string(), payload.into()).await {
                tracing::warn!(subject = event.subject(), error = %e, "failed to publish event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload_shape() {
        let id = Uuid::nil();
        let event = DomainEvent::Order(OrderEvent::StatusChanged { order_id: id, from: OrderStatus::Pending, to: OrderStatus::Cancelled });
        assert_eq!(event.subject(), "storefront.order.status_changed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["to"], "cancelled");
    }
}
