//! Pricing and variant services
pub mod discount_normalizer;
pub mod discount_resolver;
pub mod inventory;
pub mod price_facade;
pub mod variant_matcher;

pub use discount_normalizer::{normalize_discount, normalize_discount_at};
pub use discount_resolver::{get_discounted_price, DiscountedPrice};
pub use inventory::{stock_report, StockReport};
pub use price_facade::{quote_variant, PriceQuote, PricingPolicy};
pub use variant_matcher::{available_options, effective_variant, find_variant, is_variant_available, VariantSelection};
