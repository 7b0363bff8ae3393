//! Customer-facing price of a variant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::{Product, VariantCombination};
use crate::domain::services::discount_resolver::get_discounted_price;
use crate::domain::services::variant_matcher::VariantSelection;
use crate::domain::value_objects::Discount;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub display_price: Decimal,
    /// The variant's own price, shown struck through.
    pub was_price: Decimal,
    pub discount_percent: u32,
    /// Pass-through of the discount's stored `is_active` flag.
    pub is_discounted: bool,
    pub show_badge: bool,
}

/// Prices `variant` under the product-level `discount`.
pub fn quote_variant(discount: Option<&Discount>, variant: &VariantCombination) -> PriceQuote {
    let resolved = get_discounted_price(variant.price, discount);
    let is_discounted = discount.map_or(false, |d| d.is_active);
    PriceQuote {
        display_price: resolved.final_price,
        was_price: variant.price,
        discount_percent: resolved.discount_percent,
        is_discounted,
        show_badge: is_discounted && resolved.discount_percent > 0,
    }
}

/// Whether the discount window is re-checked on every quote or the stored
/// flag is trusted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PricingPolicy {
    pub live_discount_window: bool,
}

impl PricingPolicy {
    pub fn quote(&self, product: &Product, variant: &VariantCombination, now: DateTime<Utc>) -> PriceQuote {
        match product.discount() {
            Some(d) if self.live_discount_window => quote_variant(Some(&d.refreshed(now)), variant),
            discount => quote_variant(discount, variant),
        }
    }

    /// Quote for the effective variant, if the product has any.
    pub fn quote_effective(&self, product: &Product, now: DateTime<Utc>) -> Option<PriceQuote> {
        product.effective_variant().map(|v| self.quote(product, v, now))
    }

    /// Quote for the selected variant, falling back to the effective one
    /// when there is no selection or its SKU is gone.
    pub fn quote_selected(&self, product: &Product, selection: Option<&VariantSelection>, now: DateTime<Utc>) -> Option<PriceQuote> {
        selection
            .and_then(|s| s.variant(product.variants()))
            .or_else(|| product.effective_variant())
            .map(|v| self.quote(product, v, now))
    }
}
