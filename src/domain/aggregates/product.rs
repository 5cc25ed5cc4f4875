//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::pricing::{self, LinePrice, MultiBuyOffer};
use crate::domain::value_objects::Quantity;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub images: Vec<String>,
    pub variants: Vec<Variant>,
    pub offers: Vec<MultiBuyOffer>,
    pub stock: Quantity,
    pub store_stock: Vec<StoreStock>,
    pub featured: bool,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant { pub id: Uuid, pub name: String, pub price: Decimal, pub sku: Option<String> }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStock { pub store_id: Uuid, pub stock: Quantity }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus { Draft, #[default] Active, Archived }

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Draft => "draft", Self::Active => "active", Self::Archived => "archived" }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Where a reservation takes its units from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "store_id", rename_all = "snake_case")]
pub enum StockSource { Global, Store(Uuid) }

/// Units held against one product for one order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReservation { pub product_id: Uuid, pub source: StockSource, pub quantity: u32 }

impl Product {
    pub fn create(name: impl Into<String>, slug: impl Into<String>, price: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), name: name.into(), slug: slug.into(), description: None,
            price, compare_at_price: None, category_id: None, images: vec![], variants: vec![],
            offers: vec![], stock: Quantity::default(), store_stock: vec![], featured: false,
            status: ProductStatus::Active, created_at: now, updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool { self.status == ProductStatus::Active }

    pub fn variant(&self, variant_id: Uuid) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Unit price for the selected variant, or the product price when none is selected.
    pub fn unit_price(&self, variant_id: Option<Uuid>) -> Result<Decimal, ProductError> {
        match variant_id {
            None => Ok(self.price),
            Some(id) => self.variant(id).map(|v| v.price).ok_or(ProductError::UnknownVariant(id)),
        }
    }

    pub fn price_line(&self, variant_id: Option<Uuid>, quantity: u32) -> Result<LinePrice, ProductError> {
        let unit = self.unit_price(variant_id)?;
        Ok(pricing::line_total(unit, quantity, &self.offers))
    }

    /// A store entry, when present, is the only stock source for orders placed at that store.
    pub fn stock_source(&self, store_id: Option<Uuid>) -> StockSource {
        match store_id {
            Some(id) if self.store_stock.iter().any(|s| s.store_id == id) => StockSource::Store(id),
            _ => StockSource::Global,
        }
    }

    pub fn available(&self, source: StockSource) -> u32 {
        match source {
            StockSource::Global => self.stock.value(),
            StockSource::Store(id) => self.store_stock.iter().find(|s| s.store_id == id).map_or(0, |s| s.stock.value()),
        }
    }

    /// Checks availability and builds the reservation without changing stock.
    pub fn plan_reservation(&self, store_id: Option<Uuid>, quantity: u32) -> Result<StockReservation, ProductError> {
        let source = self.stock_source(store_id);
        let available = self.available(source);
        if quantity > available {
            return Err(ProductError::InsufficientStock { requested: quantity, available });
        }
        Ok(StockReservation { product_id: self.id, source, quantity })
    }

    pub fn reserve(&mut self, reservation: &StockReservation) -> Result<(), ProductError> {
        let slot = self.slot_mut(reservation.source).ok_or(ProductError::UnknownStore)?;
        let available = slot.value();
        *slot = slot.subtract(reservation.quantity)
            .ok_or(ProductError::InsufficientStock { requested: reservation.quantity, available })?;
        self.touch();
        Ok(())
    }

    pub fn release(&mut self, reservation: &StockReservation) {
        let source = match reservation.source {
            StockSource::Store(id) if !self.store_stock.iter().any(|s| s.store_id == id) => {
                self.store_stock.push(StoreStock { store_id: id, stock: Quantity::default() });
                reservation.source
            }
            other => other,
        };
        if let Some(slot) = self.slot_mut(source) {
            *slot = slot.add(reservation.quantity);
        }
        self.touch();
    }

    pub fn set_store_stock(&mut self, store_id: Uuid, stock: u32) {
        match self.store_stock.iter_mut().find(|s| s.store_id == store_id) {
            Some(entry) => entry.stock = Quantity::new(stock),
            None => self.store_stock.push(StoreStock { store_id, stock: Quantity::new(stock) }),
        }
        self.touch();
    }

    pub fn archive(&mut self) { self.status = ProductStatus::Archived; self.touch(); }

    fn slot_mut(&mut self, source: StockSource) -> Option<&mut Quantity> {
        match source {
            StockSource::Global => Some(&mut self.stock),
            StockSource::Store(id) => self.store_stock.iter_mut().find(|s| s.store_id == id).map(|s| &mut s.stock),
        }
    }

    pub(crate) fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductError { UnknownVariant(Uuid), UnknownStore, InsufficientStock { requested: u32, available: u32 } }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownVariant(id) => write!(f, "Unknown variant {id}"),
            Self::UnknownStore => write!(f, "No stock entry for store"),
            Self::InsufficientStock { requested, available } => write!(f, "Insufficient stock: requested {requested}, available {available}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn juice() -> Product {
        let mut p = Product::create("Mango Juice", "mango-juice", Decimal::new(120, 0));
        p.stock = Quantity::new(10);
        p.variants.push(Variant { id: Uuid::new_v4(), name: "1L".into(), price: Decimal::new(200, 0), sku: None });
        p.offers.push(MultiBuyOffer::new(3, Decimal::new(300, 0)));
        p
    }

    #[test]
    fn test_unit_price_from_variant() {
        let p = juice();
        let variant = p.variants[0].id;
        assert_eq!(p.unit_price(None).unwrap(), Decimal::new(120, 0));
        assert_eq!(p.unit_price(Some(variant)).unwrap(), Decimal::new(200, 0));
        let missing = Uuid::new_v4();
        assert_eq!(p.unit_price(Some(missing)), Err(ProductError::UnknownVariant(missing)));
    }

    #[test]
    fn test_offers_apply_to_variant_price() {
        let p = juice();
        // 4 x 1L = one 3-bundle + one single at the variant price
        let line = p.price_line(Some(p.variants[0].id), 4).unwrap();
        assert_eq!(line.total, Decimal::new(500, 0));
        assert_eq!(line.savings, Decimal::new(300, 0));
    }

    #[test]
    fn test_store_stock_takes_precedence() {
        let mut p = juice();
        let store = Uuid::new_v4();
        assert_eq!(p.stock_source(Some(store)), StockSource::Global);
        p.set_store_stock(store, 2);
        assert_eq!(p.stock_source(Some(store)), StockSource::Store(store));
        assert_eq!(
            p.plan_reservation(Some(store), 3),
            Err(ProductError::InsufficientStock { requested: 3, available: 2 })
        );
        let r = p.plan_reservation(Some(store), 2).unwrap();
        p.reserve(&r).unwrap();
        assert_eq!(p.available(StockSource::Store(store)), 0);
        assert_eq!(p.stock.value(), 10);
    }

    #[test]
    fn test_release_restores_source() {
        let mut p = juice();
        let r = p.plan_reservation(None, 4).unwrap();
        p.reserve(&r).unwrap();
        assert_eq!(p.stock.value(), 6);
        p.release(&r);
        assert_eq!(p.stock.value(), 10);

        let store = Uuid::new_v4();
        p.release(&StockReservation { product_id: p.id, source: StockSource::Store(store), quantity: 1 });
        assert_eq!(p.available(StockSource::Store(store)), 1);
    }
}
