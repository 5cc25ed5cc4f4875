//! Use cases that span several aggregates.

pub mod orders;

use std::collections::HashMap;

use crate::domain::aggregates::{Cart, CartView, Settings};
use crate::repo::Repository;
use crate::Result;

/// Stored settings, or the defaults before an admin has saved any.
pub async fn load_settings(repo: &dyn Repository) -> Result<Settings> {
    Ok(repo.get_settings().await?.unwrap_or_default())
}

/// Prices a cart against the current catalogue.
pub async fn price_cart(repo: &dyn Repository, cart: &Cart) -> Result<CartView> {
    let settings = load_settings(repo).await?;
    let ids: Vec<_> = cart.items().iter().map(|i| i.product_id).collect();
    let products: HashMap<_, _> = repo.get_products(&ids).await?.into_iter().map(|p| (p.id, p)).collect();
    Ok(cart.view(&products, &settings.currency))
}
