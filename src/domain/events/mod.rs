//! Domain events
use crate::domain::value_objects::{DiscountKind, Sku};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Cart(CartEvent),
    Checkout(CheckoutEvent),
}

impl DomainEvent {
    /// Subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(_) => "storefront.product",
            Self::Cart(_) => "storefront.cart",
            Self::Checkout(_) => "storefront.checkout",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductEvent {
    Submitted { product_id: String, price: Decimal },
    DiscountApplied { product_id: String, kind: DiscountKind, value: Decimal, is_active: bool },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartEvent {
    ItemAdded { session: String, product_id: String, sku: Sku, quantity: u32 },
    QuantityChanged { session: String, product_id: String, sku: Sku, quantity: u32 },
    ItemRemoved { session: String, product_id: String, sku: Sku },
    Cleared { session: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutEvent {
    Drafted { checkout_id: String, session: String, subtotal: Decimal, currency: String, line_count: usize },
}
