//! Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use crate::domain::aggregates::order::LineItem;
use crate::domain::aggregates::product::Product;

/// Upper bound for a single cart or order line.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cart {
    pub session_id: String,
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: u32,
}

impl Cart {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), items: vec![], updated_at: Utc::now() }
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds a line, merging it into an existing one for the same product and variant.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == item.product_id && i.variant_id == item.variant_id) {
            existing.quantity = existing.quantity.checked_add(item.quantity)
                .filter(|q| *q <= MAX_LINE_QUANTITY)
                .ok_or(CartError::QuantityTooLarge { max: MAX_LINE_QUANTITY })?;
        } else {
            if item.quantity > MAX_LINE_QUANTITY {
                return Err(CartError::QuantityTooLarge { max: MAX_LINE_QUANTITY });
            }
            self.items.push(item);
        }
        self.touch();
        Ok(())
    }

    /// Sets the quantity of an existing line; zero removes it.
    pub fn update_quantity(&mut self, product_id: Uuid, variant_id: Option<Uuid>, quantity: u32) -> Result<(), CartError> {
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge { max: MAX_LINE_QUANTITY });
        }
        let matches = |i: &CartItem| i.product_id == product_id && i.variant_id == variant_id;
        let item = self.items.iter_mut().find(|i| matches(&**i)).ok_or(CartError::ItemNotFound)?;
        if quantity == 0 { self.items.retain(|i| !matches(i)); }
        else { item.quantity = quantity; }
        self.touch();
        Ok(())
    }

    /// Prices the cart against current catalogue data.
    pub fn view(&self, products: &HashMap<Uuid, Product>, currency: &str) -> CartView {
        let mut lines = Vec::new();
        let mut unavailable = Vec::new();
        for item in &self.items {
            let line = products.get(&item.product_id)
                .filter(|p| p.is_active())
                .and_then(|p| LineItem::priced(p, item.variant_id, item.quantity).ok());
            match line {
                Some(line) => lines.push(line),
                None => unavailable.push(item.clone()),
            }
        }
        let subtotal = lines.iter().map(|l| l.total).sum();
        let savings = lines.iter().map(|l| l.savings).sum();
        let item_count = lines.iter().map(|l| u64::from(l.quantity)).sum();
        CartView { session_id: self.session_id.clone(), currency: currency.to_string(), lines, unavailable, subtotal, savings, item_count }
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Clone, Debug, Serialize)]
pub struct CartView {
    pub session_id: String,
    pub currency: String,
    pub lines: Vec<LineItem>,
    /// Items whose product or variant is gone or no longer on sale.
    pub unavailable: Vec<CartItem>,
    pub subtotal: Decimal,
    pub savings: Decimal,
    pub item_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { ItemNotFound, QuantityTooLarge { max: u32 } }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound => write!(f, "Item not found in cart"),
            Self::QuantityTooLarge { max } => write!(f, "Quantity per line cannot exceed {}", max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::ProductStatus;
    use crate::domain::pricing::MultiBuyOffer;

    #[test]
    fn test_cart_operations() {
        let product = Uuid::new_v4();
        let mut cart = Cart::new("s1");
        cart.add_item(CartItem { product_id: product, variant_id: None, quantity: 2 }).unwrap();
        cart.add_item(CartItem { product_id: product, variant_id: None, quantity: 1 }).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3); // Merged
        cart.add_item(CartItem { product_id: product, variant_id: Some(Uuid::new_v4()), quantity: 1 }).unwrap();
        assert_eq!(cart.items().len(), 2);
        cart.update_quantity(product, None, 0).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.update_quantity(product, None, 4), Err(CartError::ItemNotFound));
        cart.update_quantity(product, cart.items()[0].variant_id, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_view_prices_offers_and_flags_unavailable() {
        let mut bread = Product::create("Bread", "bread", Decimal::new(60, 0));
        bread.offers.push(MultiBuyOffer::new(2, Decimal::new(100, 0)));
        let mut retired = Product::create("Old Bread", "old-bread", Decimal::new(10, 0));
        retired.status = ProductStatus::Archived;

        let mut cart = Cart::new("s2");
        cart.add_item(CartItem { product_id: bread.id, variant_id: None, quantity: 5 }).unwrap();
        cart.add_item(CartItem { product_id: retired.id, variant_id: None, quantity: 1 }).unwrap();
        cart.add_item(CartItem { product_id: Uuid::new_v4(), variant_id: None, quantity: 1 }).unwrap();

        let products = HashMap::from([(bread.id, bread), (retired.id, retired)]);
        let view = cart.view(&products, "KES");
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.unavailable.len(), 2);
        assert_eq!(view.subtotal, Decimal::new(260, 0));
        assert_eq!(view.savings, Decimal::new(40, 0));
        assert_eq!(view.item_count, 5);
    }

    #[test]
    fn test_merged_quantity_is_capped() {
        let product = Uuid::new_v4();
        let mut cart = Cart::new("s3");
        cart.add_item(CartItem { product_id: product, variant_id: None, quantity: MAX_LINE_QUANTITY }).unwrap();
        let err = cart.add_item(CartItem { product_id: product, variant_id: None, quantity: 1 });
        assert_eq!(err, Err(CartError::QuantityTooLarge { max: MAX_LINE_QUANTITY }));
        assert_eq!(cart.items()[0].quantity, MAX_LINE_QUANTITY);
        assert!(cart.add_item(CartItem { product_id: Uuid::new_v4(), variant_id: None, quantity: MAX_LINE_QUANTITY + 1 }).is_err());
        assert!(cart.update_quantity(product, None, MAX_LINE_QUANTITY + 1).is_err());
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_item_count_does_not_overflow() {
        let pin = Product::create("Pin", "pin", Decimal::new(1, 2));
        let clip = Product::create("Clip", "clip", Decimal::new(1, 2));
        let mut cart = Cart::new("s4");
        // Carts stored before the line cap may still hold oversized lines.
        cart.items.push(CartItem { product_id: pin.id, variant_id: None, quantity: u32::MAX });
        cart.items.push(CartItem { product_id: clip.id, variant_id: None, quantity: 1 });

        let products = HashMap::from([(pin.id, pin), (clip.id, clip)]);
        let view = cart.view(&products, "KES");
        assert_eq!(view.item_count, u64::from(u32::MAX) + 1);
    }
}
