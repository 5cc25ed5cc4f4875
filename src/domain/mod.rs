//! Storefront domain: aggregates, value objects, offer pricing and the WhatsApp hand-off.
pub mod aggregates;
pub mod checkout;
pub mod events;
pub mod pricing;
pub mod value_objects;
