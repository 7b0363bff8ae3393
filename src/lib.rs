//! Storefront catalog service
//!
//! Variant-aware pricing for a storefront catalog.
//!
//! ## Features
//! - Product submission with discount normalization
//! - Variant matching and option availability
//! - Discount resolution and price quotes
//! - Session carts and checkout drafts
//! - Stock reporting

use thiserror::Error;

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;

pub use config::Config;
pub use domain::aggregates::{Cart, CartItem, CheckoutDraft, Product, VariantCombination};
pub use domain::services::{get_discounted_price, normalize_discount, quote_variant, PriceQuote, PricingPolicy};
pub use domain::value_objects::{Discount, DiscountKind, Money, Sku, VariantOption};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Variant not found")]
    VariantNotFound,

    #[error("Cart item not found")]
    CartItemNotFound,

    #[error("Variant {0} is not available")]
    VariantUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Checkout(#[from] domain::aggregates::CheckoutError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<sqlx::Error> for StorefrontError {
    fn from(e: sqlx::Error) -> Self { Self::StorageError(e.to_string()) }
}

impl From<serde_json::Error> for StorefrontError {
    fn from(e: serde_json::Error) -> Self { Self::StorageError(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
