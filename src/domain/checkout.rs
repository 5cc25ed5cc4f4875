//! WhatsApp hand-off: the placed order is turned into a pre-filled chat message for the shop.

use rust_decimal::Decimal;
use std::fmt::Write;
use crate::domain::aggregates::{Order, PaymentMethod, Settings, Store};
use crate::domain::value_objects::{Money, PhoneNumber};

/// Number the customer is sent to: the store's own line if it has one, else the shop-wide one.
pub fn handoff_number(settings: &Settings, store: Option<&Store>) -> Option<PhoneNumber> {
    store.and_then(|s| s.whatsapp.as_deref())
        .or(settings.whatsapp_number.as_deref())
        .and_then(|raw| match PhoneNumber::parse(raw) {
            Ok(n) => Some(n),
            Err(e) => { tracing::warn!(number = raw, error = %e, "ignoring unusable WhatsApp number"); None }
        })
}

pub fn order_message(settings: &Settings, order: &Order, store: Option<&Store>, payment: Option<&PaymentMethod>) -> String {
    let money = |amount: Decimal| Money::new(amount, &order.currency).to_string();
    let mut msg = String::new();
    // writeln! into a String cannot fail
    let _ = writeln!(msg, "Hello {}, I'd like to place order {}.", settings.shop_name, order.order_number);
    let _ = writeln!(msg);
    for item in &order.items {
        let name = match &item.variant_name {
            Some(v) => format!("{} ({})", item.name, v),
            None => item.name.clone(),
        };
        let _ = write!(msg, "- {} x {} = {}", item.quantity, name, money(item.total));
        if item.savings > Decimal::ZERO {
            let _ = write!(msg, " (saved {})", money(item.savings));
        }
        let _ = writeln!(msg);
    }
    let _ = writeln!(msg);
    let _ = writeln!(msg, "Subtotal: {}", money(order.subtotal));
    if order.delivery_fee > Decimal::ZERO {
        let _ = writeln!(msg, "Delivery: {}", money(order.delivery_fee));
    }
    let _ = writeln!(msg, "Total: {}", money(order.total));
    let _ = writeln!(msg);
    let _ = writeln!(msg, "Name: {}", order.customer.name);
    let _ = writeln!(msg, "Phone: {}", order.customer.phone);
    if let Some(address) = &order.customer.address {
        let _ = writeln!(msg, "Address: {address}");
    }
    if let Some(store) = store {
        let _ = writeln!(msg, "Pickup/branch: {}", store.name);
    }
    if let Some(payment) = payment {
        let _ = write!(msg, "Payment: {}", payment.name);
        if let Some(instructions) = &payment.instructions {
            let _ = write!(msg, " ({instructions})");
        }
        let _ = writeln!(msg);
    }
    if let Some(notes) = &order.notes {
        let _ = writeln!(msg, "Notes: {notes}");
    }
    msg.trim_end().to_string()
}

pub fn whatsapp_url(number: &PhoneNumber, message: &str) -> String {
    format!("https://wa.me/{}?text={}", number.digits(), urlencoding::encode(message))
}
