//! Multi-buy offer pricing
//!
//! An offer reads "buy `quantity` for `price`". Line prices fill the largest bundles first and
//! bill whatever is left at the unit price. Offers that would cost the customer more than buying
//! singly are never applied, so a priced line never exceeds `quantity * unit_price`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiBuyOffer {
    pub quantity: u32,
    pub price: Decimal,
}

impl MultiBuyOffer {
    pub fn new(quantity: u32, price: Decimal) -> Self { Self { quantity, price } }

    /// Whether taking this bundle is cheaper than `quantity` single units.
    fn beats(&self, unit_price: Decimal) -> bool {
        self.quantity > 0 && self.price < unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePrice {
    /// What the customer pays for the line.
    pub total: Decimal,
    /// `quantity * unit_price`, before offers.
    pub regular: Decimal,
    pub savings: Decimal,
}

impl LinePrice {
    pub fn zero() -> Self { Self { total: Decimal::ZERO, regular: Decimal::ZERO, savings: Decimal::ZERO } }
}

/// Price `quantity` units at `unit_price` with the greedy multi-buy rule.
pub fn line_total(unit_price: Decimal, quantity: u32, offers: &[MultiBuyOffer]) -> LinePrice {
    let regular = unit_price * Decimal::from(quantity);
    if quantity == 0 {
        return LinePrice::zero();
    }

    let mut usable: Vec<&MultiBuyOffer> = offers.iter().filter(|o| o.beats(unit_price)).collect();
    usable.sort_by(|a, b| b.quantity.cmp(&a.quantity).then(a.price.cmp(&b.price)));

    let mut remaining = quantity;
    let mut total = Decimal::ZERO;
    for offer in usable {
        if remaining < offer.quantity {
            continue;
        }
        let bundles = remaining / offer.quantity;
        total += offer.price * Decimal::from(bundles);
        remaining -= bundles * offer.quantity;
    }
    total += unit_price * Decimal::from(remaining);

    LinePrice { total, regular, savings: regular - total }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferError {
    QuantityTooSmall(u32),
    NonPositivePrice(u32),
    DuplicateQuantity(u32),
}

impl std::error::Error for OfferError {}
impl fmt::Display for OfferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuantityTooSmall(q) => write!(f, "offer quantity must be at least 2, got {q}"),
            Self::NonPositivePrice(q) => write!(f, "offer for {q} units must have a positive price"),
            Self::DuplicateQuantity(q) => write!(f, "more than one offer for {q} units"),
        }
    }
}

/// Checks an offer list before it is stored on a product.
pub fn validate_offers(offers: &[MultiBuyOffer]) -> Result<(), OfferError> {
    let mut seen = HashSet::new();
    for offer in offers {
        if offer.quantity < 2 { return Err(OfferError::QuantityTooSmall(offer.quantity)); }
        if offer.price <= Decimal::ZERO { return Err(OfferError::NonPositivePrice(offer.quantity)); }
        if !seen.insert(offer.quantity) { return Err(OfferError::DuplicateQuantity(offer.quantity)); }
    }
    Ok(())
}
