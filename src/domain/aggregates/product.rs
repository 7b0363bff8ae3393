//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::services::variant_matcher;
use crate::domain::value_objects::{Discount, Sku, VariantOption};

const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

fn default_true() -> bool { true }
fn default_low_stock_threshold() -> u32 { DEFAULT_LOW_STOCK_THRESHOLD }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage { pub url: String, pub alt: String, pub is_primary: bool, pub order: u32 }

/// One purchasable SKU: a unique combination of option values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantCombination {
    pub options: Vec<VariantOption>,
    pub sku: Sku,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub track_quantity: bool,
    #[serde(default)]
    pub allow_backorder: bool,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preorder_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restock_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discontinued_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl VariantCombination {
    pub fn new(sku: Sku, price: Decimal, options: Vec<VariantOption>) -> Self {
        Self {
            options, sku, price, compare_at_price: None, stock: 0, is_active: true, is_default: false,
            track_quantity: false, allow_backorder: false, low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            available_from: None, preorder_date: None, restock_date: None, discontinued_date: None,
            images: vec![],
        }
    }

    pub fn with_stock(mut self, stock: u32) -> Self { self.stock = stock; self }

    /// Active with stock on hand. Backorder does not count here.
    pub fn is_available(&self) -> bool { self.is_active && self.stock > 0 }

    /// Active and either in stock or open for backorder.
    pub fn can_purchase(&self) -> bool { self.is_active && (self.stock > 0 || self.allow_backorder) }

    pub fn is_low_stock(&self) -> bool {
        self.track_quantity && self.stock > 0 && self.stock <= self.low_stock_threshold
    }

    /// Tracked and at or below half of the low-stock threshold.
    pub fn is_critical_stock(&self) -> bool {
        self.track_quantity && u64::from(self.stock) * 2 <= u64::from(self.low_stock_threshold)
    }

    /// Primary image, else the lowest `order`.
    pub fn display_image(&self) -> Option<&ProductImage> {
        self.images.iter().find(|i| i.is_primary).or_else(|| self.images.iter().min_by_key(|i| i.order))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType { #[default] Dropdown, Swatch, Button, Image }

/// Declares the legal axes and values of a product. Drives selection UI only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDefinition {
    pub name: String,
    pub values: Vec<String>,
    #[serde(default)]
    pub display_type: DisplayType,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus { #[default] Draft, Active, Archived }

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Draft => "draft", Self::Active => "active", Self::Archived => "archived" }
    }
}

/// Descriptive fields supplied when a product is created or revised.
#[derive(Clone, Debug, Default)]
pub struct ProductDetails {
    pub id: Option<String>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub status: ProductStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: String,
    name: String,
    slug: String,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    short_description: Option<String>,
    /// Denormalized default-variant price.
    price: Decimal,
    cost_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discount: Option<Discount>,
    variants: Vec<VariantCombination>,
    #[serde(default)]
    variant_definitions: Vec<VariantDefinition>,
    #[serde(default)]
    status: ProductStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Product {
    /// Builds a product from its variants. The first variant flagged default
    /// (or the first variant) becomes the only default and sets the
    /// denormalized price, cost price and base image.
    pub fn create(
        details: ProductDetails,
        mut variants: Vec<VariantCombination>,
        variant_definitions: Vec<VariantDefinition>,
    ) -> Result<Self, ProductError> {
        if details.name.trim().is_empty() { return Err(ProductError::MissingName); }
        if variants.is_empty() { return Err(ProductError::NoVariants); }
        check_unique_skus(&variants)?;
        check_distinct_options(&variants)?;

        let default_idx = variants.iter().position(|v| v.is_default).unwrap_or(0);
        for (i, v) in variants.iter_mut().enumerate() { v.is_default = i == default_idx; }
        let default = &variants[default_idx];

        let id = details.id.unwrap_or_else(|| Uuid::now_v7().to_string());
        let now = Utc::now();
        let mut product = Self {
            id: id.clone(), name: details.name, slug: details.slug, description: details.description,
            short_description: details.short_description, price: default.price,
            cost_price: default.compare_at_price.unwrap_or(Decimal::ZERO),
            base_image: default.images.first().map(|i| i.url.clone()), discount: None,
            variants, variant_definitions, status: details.status, created_at: now, updated_at: now,
            events: vec![],
        };
        let price = product.price;
        product.raise_event(DomainEvent::Product(ProductEvent::Submitted { product_id: id, price }));
        Ok(product)
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn slug(&self) -> &str { &self.slug }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> Decimal { self.price }
    pub fn cost_price(&self) -> Decimal { self.cost_price }
    pub fn base_image(&self) -> Option<&str> { self.base_image.as_deref() }
    pub fn discount(&self) -> Option<&Discount> { self.discount.as_ref() }
    pub fn variants(&self) -> &[VariantCombination] { &self.variants }
    pub fn variant_definitions(&self) -> &[VariantDefinition] { &self.variant_definitions }
    pub fn status(&self) -> ProductStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn is_active(&self) -> bool { self.status == ProductStatus::Active }

    pub fn apply_discount(&mut self, discount: Option<Discount>) {
        if let Some(d) = &discount {
            self.raise_event(DomainEvent::Product(ProductEvent::DiscountApplied {
                product_id: self.id.clone(), kind: d.kind, value: d.value, is_active: d.is_active,
            }));
        }
        self.discount = discount;
        self.touch();
    }

    /// Keeps the original creation time when a submission replaces a stored product.
    pub fn carry_over(&mut self, previous: &Product) {
        self.created_at = previous.created_at;
    }

    /// Explicit default, else the first variant.
    pub fn effective_variant(&self) -> Option<&VariantCombination> { variant_matcher::effective_variant(&self.variants) }

    pub fn variant_by_sku(&self, sku: &str) -> Option<&VariantCombination> {
        self.variants.iter().find(|v| v.sku == *sku)
    }

    pub fn find_variant(&self, selected: &[VariantOption]) -> Option<&VariantCombination> {
        variant_matcher::find_variant(&self.variants, selected)
    }

    pub fn available_options(&self, axis: &str) -> Vec<String> { variant_matcher::available_options(&self.variants, axis) }

    pub fn is_variant_available(&self, selected: &[VariantOption]) -> bool {
        variant_matcher::is_variant_available(&self.variants, selected)
    }

    pub fn total_stock(&self) -> u64 {
        self.variants.iter().filter(|v| v.is_active).map(|v| u64::from(v.stock)).sum()
    }

    /// (min, max) over active variant prices, or the product price twice.
    pub fn price_range(&self) -> (Decimal, Decimal) {
        let mut prices = self.variants.iter().filter(|v| v.is_active).map(|v| v.price);
        match prices.next() {
            Some(first) => prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))),
            None => (self.price, self.price),
        }
    }

    pub fn is_in_stock(&self) -> bool { self.variants.iter().any(VariantCombination::can_purchase) }
    pub fn has_variants(&self) -> bool { self.variants.len() > 1 }
    pub fn is_low_stock(&self) -> bool { self.variants.iter().any(VariantCombination::is_low_stock) }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

fn check_unique_skus(variants: &[VariantCombination]) -> Result<(), ProductError> {
    let mut seen = HashSet::new();
    for v in variants {
        if !seen.insert(v.sku.as_str()) { return Err(ProductError::DuplicateSku(v.sku.clone())); }
    }
    Ok(())
}

/// No two active variants may share the same option assignment.
fn check_distinct_options(variants: &[VariantCombination]) -> Result<(), ProductError> {
    let active: Vec<&VariantCombination> = variants.iter().filter(|v| v.is_active).collect();
    for (i, a) in active.iter().enumerate() {
        if let Some(b) = active[i + 1..].iter().find(|b| variant_matcher::matches(b, &a.options)) {
            return Err(ProductError::AmbiguousOptions(a.sku.clone(), b.sku.clone()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductError { MissingName, NoVariants, DuplicateSku(Sku), AmbiguousOptions(Sku, Sku) }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Missing name"),
            Self::NoVariants => write!(f, "At least one variant is required"),
            Self::DuplicateSku(sku) => write!(f, "Duplicate SKU {}", sku),
            Self::AmbiguousOptions(a, b) => write!(f, "Variants {} and {} share the same options", a, b),
        }
    }
}
