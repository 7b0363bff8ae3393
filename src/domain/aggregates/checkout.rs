//! Checkout Aggregate
//!
//! Builds processor-ready line items from a cart. Every line is re-read
//! against the live catalog and priced through the facade; the cart
//! snapshot price is never trusted here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;
use crate::domain::aggregates::{CartItem, Product};
use crate::domain::events::{CheckoutEvent, DomainEvent};
use crate::domain::services::PricingPolicy;
use crate::domain::value_objects::{Money, Sku};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineItem {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    /// Discounted unit price in minor units.
    pub unit_amount: i64,
    pub currency: String,
    pub quantity: u32,
    pub sku: Sku,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDraft {
    id: String,
    session: String,
    items: Vec<CheckoutLineItem>,
    subtotal: Money,
    success_url: String,
    cancel_url: String,
    created_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl CheckoutDraft {
    pub fn create(session: impl Into<String>, currency: &str, app_url: &str) -> Self {
        let base = app_url.trim_end_matches('/');
        Self {
            id: Uuid::new_v4().to_string(),
            session: session.into(),
            items: vec![],
            subtotal: Money::zero(currency),
            success_url: format!("{base}/success"),
            cancel_url: format!("{base}/cancel"),
            created_at: Utc::now(),
            events: vec![],
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn items(&self) -> &[CheckoutLineItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn success_url(&self) -> &str { &self.success_url }
    pub fn cancel_url(&self) -> &str { &self.cancel_url }

    /// Prices one cart line against the current state of its product.
    pub fn add_line(
        &mut self,
        line: &CartItem,
        product: Option<&Product>,
        policy: &PricingPolicy,
        now: DateTime<Utc>,
    ) -> Result<(), CheckoutError> {
        let product = product.ok_or_else(|| CheckoutError::ProductUnavailable(line.product_id.clone()))?;
        let variant = product
            .variant_by_sku(line.variant_sku.as_str())
            .filter(|v| v.can_purchase())
            .ok_or_else(|| CheckoutError::VariantUnavailable(line.variant_sku.clone()))?;

        let quote = policy.quote(product, variant, now);
        let currency = self.subtotal.currency().to_string();
        let unit_amount = Money::new(quote.display_price, &currency).to_minor_units().ok_or(CheckoutError::InvalidAmount)?;
        // The subtotal is the sum of what each line charges.
        let unit = Money::new(Decimal::new(unit_amount, 2), &currency);

        let mut images: Vec<String> = variant.images.iter().map(|i| i.url.clone()).collect();
        if images.is_empty() {
            images.extend(product.base_image().map(str::to_string));
        }

        self.subtotal = self.subtotal.add(&unit.multiply(line.quantity)).map_err(|_| CheckoutError::InvalidAmount)?;
        debug!(sku = %variant.sku, %unit_amount, quantity = line.quantity, "checkout line priced");
        self.items.push(CheckoutLineItem {
            name: product.name().to_string(),
            description: product.description().to_string(),
            images,
            unit_amount,
            currency: self.subtotal.currency().to_lowercase(),
            quantity: line.quantity,
            sku: variant.sku.clone(),
        });
        Ok(())
    }

    pub fn finalize(&mut self) -> Result<(), CheckoutError> {
        if self.items.is_empty() { return Err(CheckoutError::EmptyCart); }
        self.raise_event(DomainEvent::Checkout(CheckoutEvent::Drafted {
            checkout_id: self.id.clone(),
            session: self.session.clone(),
            subtotal: self.subtotal.amount(),
            currency: self.subtotal.currency().to_string(),
            line_count: self.items.len(),
        }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError { EmptyCart, ProductUnavailable(String), VariantUnavailable(Sku), InvalidAmount }
impl std::error::Error for CheckoutError {}
impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCart => write!(f, "Cart is empty"),
            Self::ProductUnavailable(id) => write!(f, "Product {id} is no longer available"),
            Self::VariantUnavailable(sku) => write!(f, "Variant {sku} is not available for purchase"),
            Self::InvalidAmount => write!(f, "Invalid amount"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{ProductDetails, ProductImage, VariantCombination};
    use crate::domain::value_objects::{Discount, VariantOption};

    fn d(n: i64) -> Decimal { Decimal::new(n, 0) }

    fn product() -> Product {
        let mut tee = VariantCombination::new(Sku::new("TEE-M").unwrap(), d(20), vec![VariantOption::new("Size", "M")]).with_stock(5);
        tee.images.push(ProductImage { url: "https://cdn/tee-m.png".into(), alt: "TEE-M".into(), is_primary: true, order: 0 });
        let empty = VariantCombination::new(Sku::new("TEE-L").unwrap(), d(20), vec![VariantOption::new("Size", "L")]);
        let details = ProductDetails { id: Some("P1".into()), name: "Tee".into(), slug: "tee".into(), description: "Cotton".into(), ..Default::default() };
        let mut p = Product::create(details, vec![tee, empty], vec![]).unwrap();
        p.apply_discount(Some(Discount::percentage(d(25)).with_cap(d(100))));
        p
    }

    fn line(sku: &str, quantity: u32) -> CartItem {
        let p = product();
        let v = p.variant_by_sku(sku).unwrap();
        CartItem::snapshot(&p, v).with_quantity(quantity)
    }

    #[test]
    fn test_draft_prices_lines_through_facade() {
        let p = product();
        let mut draft = CheckoutDraft::create("s1", "USD", "http://shop.test/");
        draft.add_line(&line("TEE-M", 2), Some(&p), &PricingPolicy::default(), Utc::now()).unwrap();
        draft.finalize().unwrap();

        let item = &draft.items()[0];
        assert_eq!(item.unit_amount, 1500);
        assert_eq!(item.currency, "usd");
        assert_eq!(item.images, vec!["https://cdn/tee-m.png"]);
        assert_eq!(draft.subtotal().amount(), d(30));
        assert_eq!(draft.success_url(), "http://shop.test/success");
        assert_eq!(draft.cancel_url(), "http://shop.test/cancel");
        assert_eq!(draft.take_events().len(), 1);
    }

    #[test]
    fn test_subtotal_sums_charged_amounts() {
        let odd = VariantCombination::new(Sku::new("MUG").unwrap(), Decimal::new(4999, 2), vec![VariantOption::new("Size", "One")]).with_stock(10);
        let details = ProductDetails { id: Some("P2".into()), name: "Mug".into(), slug: "mug".into(), description: "Stoneware".into(), ..Default::default() };
        let mut p = Product::create(details, vec![odd], vec![]).unwrap();
        p.apply_discount(Some(Discount::percentage(d(20)).with_cap(d(100))));
        let line = CartItem::snapshot(&p, p.variant_by_sku("MUG").unwrap()).with_quantity(3);

        let mut draft = CheckoutDraft::create("s1", "USD", "http://shop.test");
        draft.add_line(&line, Some(&p), &PricingPolicy::default(), Utc::now()).unwrap();
        let item = &draft.items()[0];
        assert_eq!(item.unit_amount, 3999);
        assert_eq!(draft.subtotal().amount(), Decimal::new(11997, 2));
        assert_eq!(draft.subtotal().to_minor_units(), Some(item.unit_amount * i64::from(item.quantity)));
    }

    #[test]
    fn test_rejects_unpurchasable_lines() {
        let p = product();
        let mut draft = CheckoutDraft::create("s1", "USD", "http://shop.test");
        let err = draft.add_line(&line("TEE-L", 1), Some(&p), &PricingPolicy::default(), Utc::now()).unwrap_err();
        assert_eq!(err, CheckoutError::VariantUnavailable(Sku::new("TEE-L").unwrap()));
        let err = draft.add_line(&line("TEE-M", 1), None, &PricingPolicy::default(), Utc::now()).unwrap_err();
        assert_eq!(err, CheckoutError::ProductUnavailable("P1".into()));
        assert_eq!(draft.finalize().unwrap_err(), CheckoutError::EmptyCart);
    }
}
