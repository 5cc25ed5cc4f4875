//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::product::{Product, ProductError, StockReservation};
use crate::domain::events::{DomainEvent, OrderEvent};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer: CustomerDetails,
    /// Subject of the identity-provider account that placed the order; `None` for guests.
    pub customer_id: Option<String>,
    pub store_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing)]
    pub reservations: Vec<StockReservation>,
    pub currency: String,
    pub subtotal: Decimal,
    pub savings: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails { pub name: String, pub phone: String, pub email: Option<String>, pub address: Option<String> }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub regular_total: Decimal,
    pub total: Decimal,
    pub savings: Decimal,
}

impl LineItem {
    /// Prices `quantity` units of `product` (or one of its variants) with its multi-buy offers.
    pub fn priced(product: &Product, variant_id: Option<Uuid>, quantity: u32) -> Result<Self, ProductError> {
        let unit_price = product.unit_price(variant_id)?;
        let price = product.price_line(variant_id, quantity)?;
        Ok(Self {
            product_id: product.id,
            variant_id,
            name: product.name.clone(),
            variant_name: variant_id.and_then(|id| product.variant(id)).map(|v| v.name.clone()),
            quantity,
            unit_price,
            regular_total: price.regular,
            total: price.total,
            savings: price.savings,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Confirmed, Dispatched, Delivered, Cancelled }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Confirmed => "confirmed", Self::Dispatched => "dispatched",
            Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "dispatched" => Some(Self::Dispatched),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Dispatched) | (Confirmed, Cancelled) | (Dispatched, Delivered)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl Order {
    pub fn create(order_number: impl Into<String>, customer: CustomerDetails, currency: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), order_number: order_number.into(), customer, customer_id: None,
            store_id: None, payment_method_id: None, items: vec![], reservations: vec![],
            currency: currency.to_string(), subtotal: Decimal::ZERO, savings: Decimal::ZERO,
            delivery_fee: Decimal::ZERO, total: Decimal::ZERO, status: OrderStatus::Pending,
            notes: None, created_at: now, updated_at: now, events: vec![],
        }
    }

    /// Eight-digit order number shown to customers and quoted over WhatsApp.
    pub fn next_number() -> String { format!("ORD-{:08}", rand::random::<u32>() % 100_000_000) }

    /// Swaps in a fresh number after the store rejected the current one as taken.
    pub fn renumber(&mut self, order_number: impl Into<String>) {
        self.order_number = order_number.into();
        for event in &mut self.events {
            if let DomainEvent::Order(OrderEvent::Placed { order_number, .. }) = event {
                *order_number = self.order_number.clone();
            }
        }
    }

    pub fn add_item(&mut self, item: LineItem) { self.items.push(item); self.recalculate(); }

    pub fn set_delivery_fee(&mut self, fee: Decimal) { self.delivery_fee = fee; self.recalculate(); }

    /// Seals a freshly built order and records the placement event.
    pub fn finalize(&mut self) -> Result<(), OrderError> {
        if self.items.is_empty() { return Err(OrderError::NoItems); }
        self.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: self.id, order_number: self.order_number.clone(), total: self.total, customer_id: self.customer_id.clone(),
        }));
        Ok(())
    }

    /// Moves the order along its lifecycle. Returns the reservations to hand back to stock
    /// when the order is cancelled.
    pub fn transition(&mut self, next: OrderStatus) -> Result<Vec<StockReservation>, OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        let from = self.status;
        self.status = next;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id, from, to: next }));
        if next == OrderStatus::Cancelled {
            Ok(std::mem::take(&mut self.reservations))
        } else {
            Ok(vec![])
        }
    }

    fn recalculate(&mut self) {
        self.subtotal = self.items.iter().map(|i| i.total).sum();
        self.savings = self.items.iter().map(|i| i.savings).sum();
        self.total = self.subtotal + self.delivery_fee;
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderError { NoItems, InvalidTransition { from: OrderStatus, to: OrderStatus } }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoItems => write!(f, "Order has no items"),
            Self::InvalidTransition { from, to } => write!(f, "Cannot move order from {from} to {to}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::StockSource;
    use crate::domain::pricing::MultiBuyOffer;

    fn customer() -> CustomerDetails {
        CustomerDetails { name: "Amina".into(), phone: "+254700000000".into(), email: None, address: None }
    }

    #[test]
    fn test_order_totals() {
        let mut product = Product::create("Soap", "soap", Decimal::new(50, 0));
        product.offers.push(MultiBuyOffer::new(2, Decimal::new(90, 0)));
        let mut order = Order::create(Order::next_number(), customer(), "KES");
        order.add_item(LineItem::priced(&product, None, 3).unwrap());
        order.set_delivery_fee(Decimal::new(100, 0));
        assert_eq!(order.subtotal, Decimal::new(140, 0));
        assert_eq!(order.savings, Decimal::new(10, 0));
        assert_eq!(order.total, Decimal::new(240, 0));
        assert!(order.order_number.starts_with("ORD-") && order.order_number.len() == 12);
    }

    #[test]
    fn test_order_workflow() {
        let product = Product::create("Soap", "soap", Decimal::new(50, 0));
        let mut order = Order::create("ORD-00000001", customer(), "KES");
        assert_eq!(order.finalize(), Err(OrderError::NoItems));
        order.add_item(LineItem::priced(&product, None, 1).unwrap());
        order.finalize().unwrap();
        assert!(order.transition(OrderStatus::Confirmed).unwrap().is_empty());
        assert!(order.transition(OrderStatus::Dispatched).unwrap().is_empty());
        assert_eq!(
            order.transition(OrderStatus::Cancelled),
            Err(OrderError::InvalidTransition { from: OrderStatus::Dispatched, to: OrderStatus::Cancelled })
        );
        order.transition(OrderStatus::Delivered).unwrap();
        assert_eq!(order.take_events().len(), 4);
    }

    #[test]
    fn test_cancel_hands_back_reservations() {
        let product = Product::create("Soap", "soap", Decimal::new(50, 0));
        let mut order = Order::create("ORD-00000002", customer(), "KES");
        order.add_item(LineItem::priced(&product, None, 2).unwrap());
        order.reservations.push(StockReservation { product_id: product.id, source: StockSource::Global, quantity: 2 });
        let released = order.transition(OrderStatus::Cancelled).unwrap();
        assert_eq!(released.len(), 1);
        assert!(order.reservations.is_empty());
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_renumber_updates_placed_event() {
        let product = Product::create("Soap", "soap", Decimal::new(50, 0));
        let mut order = Order::create("ORD-00000003", customer(), "KES");
        order.add_item(LineItem::priced(&product, None, 1).unwrap());
        order.finalize().unwrap();
        order.renumber("ORD-00000004");
        assert_eq!(order.order_number, "ORD-00000004");
        match order.take_events().as_slice() {
            [DomainEvent::Order(OrderEvent::Placed { order_number, .. })] => assert_eq!(order_number, "ORD-00000004"),
            other => panic!("unexpected events: {other:?}"),
        }
    }
}
