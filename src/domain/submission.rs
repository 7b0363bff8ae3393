//! Admin submission boundary.
//!
//! Form and JSON payloads arrive loosely typed. They are coerced here once,
//! and nothing past [`ProductSubmission::into_product`] sees raw input.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};
use crate::domain::aggregates::{Product, ProductDetails, ProductImage, ProductStatus, VariantCombination, VariantDefinition};
use crate::domain::services::normalize_discount_at;
use crate::domain::value_objects::{Discount, DiscountKind, Sku, VariantOption};
use crate::{Result, StorefrontError};

const MAX_DISCOUNT_DAYS: i64 = 30;
const IMAGE_ALT_LEN: usize = 20;

fn default_true() -> bool { true }
fn default_low_stock_threshold() -> u32 { 10 }

/// A single submitted field: checkbox, number or text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
}

impl FormValue {
    /// Empty or unreadable input counts as absent.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Flag(_) => None,
            Self::Number(n) => parse_decimal(&n.to_string()),
            Self::Text(s) => parse_decimal(s.trim()),
        }
    }

    /// Checkbox semantics: `true`, `"on"` and `"true"` are set.
    pub fn as_flag(&self) -> bool {
        match self {
            Self::Flag(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Self::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "on" | "true"),
        }
    }

    /// RFC 3339, `datetime-local` or plain date text, or epoch milliseconds.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Flag(_) => None,
            Self::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            Self::Text(s) => parse_datetime(s.trim()),
        }
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() { return None; }
    Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() { return None; }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) { return Some(dt.with_timezone(&Utc)); }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) { return Some(Utc.from_utc_datetime(&naive)); }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Discount fields as submitted. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDiscount {
    pub is_active: Option<FormValue>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<FormValue>,
    pub start_date: Option<FormValue>,
    pub end_date: Option<FormValue>,
    pub max_discount_amount: Option<FormValue>,
}

fn non_negative(value: &Decimal) -> std::result::Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() { return Err(ValidationError::new("negative")); }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VariantSubmission {
    #[validate(length(min = 1, message = "A variant must have at least one option"))]
    pub options: Vec<VariantOption>,
    #[validate(length(min = 1, max = 50, message = "SKU is required"))]
    pub sku: String,
    #[validate(custom = "non_negative")]
    pub price: Decimal,
    #[validate(custom = "non_negative")]
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
    pub available_from: Option<FormValue>,
    pub preorder_date: Option<FormValue>,
    pub restock_date: Option<FormValue>,
    pub discontinued_date: Option<FormValue>,
    /// Already uploaded to object storage, in display order.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl VariantSubmission {
    fn into_variant(self) -> Result<VariantCombination> {
        self.validate().map_err(|e| invalid(&self.sku, e))?;
        let sku = Sku::new(&self.sku).map_err(|e| StorefrontError::Validation(format!("variant {}: {}", self.sku, e)))?;
        let images = self
            .image_urls
            .into_iter()
            .enumerate()
            .map(|(idx, url)| ProductImage { url, alt: sku.prefix(IMAGE_ALT_LEN), is_primary: idx == 0, order: idx as u32 })
            .collect();
        let options = self.options.into_iter().map(|o| VariantOption::new(o.name.trim(), o.value.trim())).collect();
        Ok(VariantCombination {
            options,
            sku,
            price: money(self.price),
            compare_at_price: self.compare_at_price.map(money),
            stock: self.stock,
            is_active: self.is_active,
            is_default: self.is_default,
            track_quantity: self.track_quantity,
            allow_backorder: self.allow_backorder,
            low_stock_threshold: self.low_stock_threshold,
            available_from: self.available_from.as_ref().and_then(FormValue::as_datetime),
            preorder_date: self.preorder_date.as_ref().and_then(FormValue::as_datetime),
            restock_date: self.restock_date.as_ref().and_then(FormValue::as_datetime),
            discontinued_date: self.discontinued_date.as_ref().and_then(FormValue::as_datetime),
            images,
        })
    }
}

fn invalid(sku: &str, errors: ValidationErrors) -> StorefrontError {
    StorefrontError::Validation(format!("variant {}: {}", sku, errors))
}

/// Create/edit payload for a product.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductSubmission {
    /// Present when editing an existing product.
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 3, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 3, message = "Slug is required"))]
    pub slug: String,
    #[validate(length(min = 5, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub variant_definitions: Vec<VariantDefinition>,
    #[validate(length(min = 1, message = "At least one variant is required"))]
    pub variants: Vec<VariantSubmission>,
    #[serde(default)]
    pub discount: Option<RawDiscount>,
}

impl ProductSubmission {
    /// Validates and builds the product; the discount is normalized against
    /// the default variant's price.
    pub fn into_product(self, now: DateTime<Utc>) -> Result<Product> {
        self.validate().map_err(|e| StorefrontError::Validation(e.to_string()))?;

        let variants = self.variants.into_iter().map(VariantSubmission::into_variant).collect::<Result<Vec<_>>>()?;
        let details = ProductDetails {
            id: self.id,
            name: self.name.trim().to_string(),
            slug: self.slug.trim().to_string(),
            description: self.description,
            short_description: self.short_description,
            status: self.status,
        };
        let mut product = Product::create(details, variants, self.variant_definitions)
            .map_err(|e| StorefrontError::Validation(e.to_string()))?;

        let discount = normalize_discount_at(self.discount.as_ref(), product.price(), now).map(round_discount);
        if let Some(d) = &discount {
            validate_discount(d).map_err(|e| StorefrontError::Validation(e.to_string()))?;
        }
        info!(product_id = product.id(), price = %product.price(), discounted = discount.is_some(), "product submission accepted");
        product.apply_discount(discount);
        Ok(product)
    }
}

fn money(value: Decimal) -> Decimal { value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero) }

fn round_discount(mut d: Discount) -> Discount {
    d.value = money(d.value);
    d.max_discount_amount = d.max_discount_amount.map(money);
    d
}

fn issue(errors: &mut ValidationErrors, field: &'static str, code: &'static str, message: &'static str) {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    errors.add(field, err);
}

/// Rules an active discount must satisfy before it is stored.
pub fn validate_discount(d: &Discount) -> std::result::Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if non_negative(&d.value).is_err() {
        issue(&mut errors, "value", "range", "value must not be negative");
    }
    if d.max_discount_amount.is_some_and(|cap| non_negative(&cap).is_err()) {
        issue(&mut errors, "maxDiscountAmount", "range", "maxDiscountAmount must not be negative");
    }
    if d.is_active {
        match (d.start_date, d.end_date) {
            (Some(start), Some(end)) => {
                if start >= end {
                    issue(&mut errors, "endDate", "window", "endDate must be after startDate");
                } else if end - start > chrono::Duration::days(MAX_DISCOUNT_DAYS) {
                    issue(&mut errors, "endDate", "window", "Discount period cannot be longer than 30 days");
                }
            }
            (start, end) => {
                if start.is_none() { issue(&mut errors, "startDate", "required", "startDate is required when discount is active"); }
                if end.is_none() { issue(&mut errors, "endDate", "required", "endDate is required when discount is active"); }
            }
        }
        if d.kind == DiscountKind::Percentage {
            match d.max_discount_amount {
                None => issue(&mut errors, "maxDiscountAmount", "required", "maxDiscountAmount is required for percentage discounts"),
                Some(cap) if cap <= Decimal::ZERO => issue(&mut errors, "maxDiscountAmount", "range", "Max discount must be greater than 0"),
                Some(_) => {}
            }
            if d.value > Decimal::ONE_HUNDRED {
                issue(&mut errors, "value", "range", "Percentage discount cannot exceed 100%");
            }
        }
    }
    if errors.errors().is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap() }

    fn submission(discount: serde_json::Value) -> ProductSubmission {
        serde_json::from_value(json!({
            "name": "Linen Shirt",
            "slug": "linen-shirt",
            "description": "Breathable linen shirt",
            "status": "active",
            "variants": [
                { "options": [{"name": "Size", "value": "S"}], "sku": "ls-s", "price": "40", "stock": 3 },
                { "options": [{"name": "Size", "value": "M"}], "sku": "ls-m", "price": 55.5, "stock": 2,
                  "isDefault": true, "compareAtPrice": "70",
                  "imageUrls": ["https://cdn.example/m-front.jpg", "https://cdn.example/m-back.jpg"] }
            ],
            "discount": discount
        }))
        .unwrap()
    }

    #[test]
    fn test_form_value_coercion() {
        assert_eq!(FormValue::Text(" 12.50 ".into()).as_decimal(), Some(Decimal::new(1250, 2)));
        assert_eq!(FormValue::Text("".into()).as_decimal(), None);
        assert_eq!(FormValue::Text("abc".into()).as_decimal(), None);
        assert!(FormValue::Text("on".into()).as_flag());
        assert!(!FormValue::Text("".into()).as_flag());
        assert_eq!(
            FormValue::Text("2025-09-01T08:30".into()).as_datetime(),
            Some(Utc.with_ymd_and_hms(2025, 9, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(FormValue::Text("01/09/2025".into()).as_datetime(), None);
    }

    #[test]
    fn test_into_product_resolves_default_and_images() {
        let product = submission(serde_json::Value::Null).into_product(now()).unwrap();
        assert_eq!(product.price(), Decimal::new(555, 1));
        assert_eq!(product.cost_price(), Decimal::new(70, 0));
        assert_eq!(product.base_image(), Some("https://cdn.example/m-front.jpg"));
        let m = product.variant_by_sku("LS-M").unwrap();
        assert!(m.images[0].is_primary && !m.images[1].is_primary);
        assert_eq!(m.images[1].order, 1);
        assert_eq!(m.images[0].alt, "LS-M");
        assert!(product.discount().is_none());
    }

    #[test]
    fn test_discount_normalized_against_default_price() {
        let start = (now() - Duration::days(1)).to_rfc3339();
        let end = (now() + Duration::days(5)).to_rfc3339();
        let product = submission(json!({ "isActive": "on", "type": "fixed", "value": "80", "startDate": start, "endDate": end }))
            .into_product(now())
            .unwrap();
        let discount = product.discount().unwrap();
        assert_eq!(discount.value, Decimal::new(555, 1));
        assert!(discount.is_active);
    }

    #[test]
    fn test_active_percentage_requires_cap_and_window() {
        let err = submission(json!({ "type": "percentage", "value": "20" })).into_product(now()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("maxDiscountAmount"));
        assert!(message.contains("startDate"));
    }

    #[test]
    fn test_window_longer_than_thirty_days_rejected() {
        let d = Discount::fixed(Decimal::ONE).with_window(Some(now()), Some(now() + Duration::days(31)));
        assert!(validate_discount(&d).is_err());
        let d = Discount::fixed(Decimal::ONE).with_window(Some(now()), Some(now() + Duration::days(30)));
        assert!(validate_discount(&d).is_ok());
    }

    #[test]
    fn test_future_discount_skips_active_rules() {
        let start = (now() + Duration::days(3)).to_rfc3339();
        let product = submission(json!({ "type": "percentage", "value": "15", "startDate": start }))
            .into_product(now())
            .unwrap();
        assert!(!product.discount().unwrap().is_active);
    }

    #[test]
    fn test_rejects_invalid_fields() {
        let mut s = submission(serde_json::Value::Null);
        s.name = "ab".into();
        assert!(matches!(s.into_product(now()), Err(StorefrontError::Validation(_))));

        let mut s = submission(serde_json::Value::Null);
        s.variants[0].options.clear();
        assert!(matches!(s.into_product(now()), Err(StorefrontError::Validation(_))));

        let mut s = submission(serde_json::Value::Null);
        s.variants[1].sku = "LS-S".into();
        assert!(matches!(s.into_product(now()), Err(StorefrontError::Validation(_))));

        let mut s = submission(serde_json::Value::Null);
        s.variants[0].price = Decimal::new(-1, 0);
        assert!(matches!(s.into_product(now()), Err(StorefrontError::Validation(_))));
    }
}
