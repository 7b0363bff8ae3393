//! Cart Aggregate
//!
//! An immutable list of line snapshots. Reducers consume the cart and hand
//! back the next value; persistence lives behind
//! [`CartStorage`](crate::adapters::CartStorage).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::{Product, ProductImage, VariantCombination};
use crate::domain::value_objects::{Money, Sku, VariantOption};

/// Variant snapshot taken at add-to-cart time. It does not follow later
/// price or stock changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "id")]
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub base_image: Option<String>,
    #[serde(default)]
    pub description: String,
    pub quantity: u32,
    pub variant_sku: Sku,
    pub variant_options: Vec<VariantOption>,
    /// Pre-discount variant price.
    pub variant_price: Decimal,
    #[serde(default)]
    pub variant_images: Vec<ProductImage>,
}

impl CartItem {
    pub fn snapshot(product: &Product, variant: &VariantCombination) -> Self {
        Self {
            product_id: product.id().to_string(),
            name: product.name().to_string(),
            base_image: product.base_image().map(str::to_string),
            description: product.description().to_string(),
            quantity: 1,
            variant_sku: variant.sku.clone(),
            variant_options: variant.options.clone(),
            variant_price: variant.price,
            variant_images: variant.images.clone(),
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self { self.quantity = quantity.max(1); self }

    pub fn line_total(&self) -> Decimal { self.variant_price * Decimal::from(self.quantity) }

    /// Lines are keyed by product and SKU.
    pub fn is_line(&self, product_id: &str, sku: &Sku) -> bool {
        self.product_id == product_id && &self.variant_sku == sku
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartAction {
    Add(CartItem),
    SetQuantity { product_id: String, sku: Sku, quantity: u32 },
    Remove { product_id: String, sku: Sku },
    Clear,
}

impl CartAction {
    /// The existing line this action targets, if it needs one.
    pub fn target(&self) -> Option<(&str, &Sku)> {
        match self {
            Self::SetQuantity { product_id, sku, .. } | Self::Remove { product_id, sku } => Some((product_id.as_str(), sku)),
            Self::Add(_) | Self::Clear => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn line_count(&self) -> usize { self.items.len() }
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    pub fn contains(&self, product_id: &str, sku: &Sku) -> bool { self.items.iter().any(|i| i.is_line(product_id, sku)) }

    /// Pre-discount total of all lines.
    pub fn subtotal(&self, currency: &str) -> Money {
        Money::new(self.items.iter().map(CartItem::line_total).sum(), currency)
    }

    /// Merges into an existing line for the same product and SKU.
    pub fn add_item(mut self, item: CartItem) -> Self {
        match self.items.iter_mut().find(|i| i.is_line(&item.product_id, &item.variant_sku)) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity.max(1)),
            None => {
                let quantity = item.quantity;
                self.items.push(item.with_quantity(quantity));
            }
        }
        self
    }

    /// Quantities below one are raised to one; unknown lines are ignored.
    pub fn set_quantity(mut self, product_id: &str, sku: &Sku, quantity: u32) -> Self {
        if let Some(line) = self.items.iter_mut().find(|i| i.is_line(product_id, sku)) {
            line.quantity = quantity.max(1);
        }
        self
    }

    pub fn remove_item(mut self, product_id: &str, sku: &Sku) -> Self {
        self.items.retain(|i| !i.is_line(product_id, sku));
        self
    }

    pub fn clear(self) -> Self { Self::new() }

    pub fn apply(self, action: CartAction) -> Self {
        match action {
            CartAction::Add(item) => self.add_item(item),
            CartAction::SetQuantity { product_id, sku, quantity } => self.set_quantity(&product_id, &sku, quantity),
            CartAction::Remove { product_id, sku } => self.remove_item(&product_id, &sku),
            CartAction::Clear => self.clear(),
        }
    }
}

/// Next cart state for `action`.
pub fn reduce(cart: Cart, action: CartAction) -> Cart { cart.apply(action) }
