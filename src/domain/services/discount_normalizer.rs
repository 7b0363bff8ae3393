//! Turns loosely typed discount input into a [`Discount`].
//!
//! Out-of-range values are clamped rather than rejected; rejection is the
//! job of [`validate_discount`](crate::domain::submission::validate_discount).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use crate::domain::submission::{FormValue, RawDiscount};
use crate::domain::value_objects::{Discount, DiscountKind};

/// Normalizes against the current wall-clock time.
pub fn normalize_discount(raw: Option<&RawDiscount>, base_price: Decimal) -> Option<Discount> {
    normalize_discount_at(raw, base_price, Utc::now())
}

/// Returns `None` when there is no input, or when the type or value is
/// missing or unreadable. A start date after `now` stores the discount as
/// inactive whatever the input said.
pub fn normalize_discount_at(raw: Option<&RawDiscount>, base_price: Decimal, now: DateTime<Utc>) -> Option<Discount> {
    let raw = raw?;
    let kind: DiscountKind = raw.kind.as_deref()?.parse().ok()?;
    let value = raw.value.as_ref().and_then(FormValue::as_decimal)?;

    if raw.is_active.as_ref().is_some_and(|flag| !flag.as_flag()) {
        debug!("raw discount flagged inactive; activity follows the start date");
    }

    let mut discount = Discount {
        is_active: true,
        kind,
        value,
        start_date: raw.start_date.as_ref().and_then(FormValue::as_datetime),
        end_date: raw.end_date.as_ref().and_then(FormValue::as_datetime),
        max_discount_amount: None,
    };

    if discount.start_date.is_some_and(|start| start > now) {
        debug!(start = ?discount.start_date, "discount starts in the future; storing inactive");
        discount.is_active = false;
    }

    match kind {
        DiscountKind::Percentage => {
            discount.value = value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
            discount.max_discount_amount = raw.max_discount_amount.as_ref().and_then(FormValue::as_decimal);
        }
        DiscountKind::Fixed => {
            discount.value = value.min(base_price);
        }
    }
    Some(discount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap() }
    fn text(s: &str) -> Option<FormValue> { Some(FormValue::Text(s.to_string())) }
    fn raw(kind: &str, value: &str) -> RawDiscount {
        RawDiscount { kind: Some(kind.to_string()), value: text(value), ..Default::default() }
    }

    #[test]
    fn test_missing_input_yields_none() {
        assert!(normalize_discount_at(None, Decimal::new(100, 0), now()).is_none());
        let no_type = RawDiscount { value: text("10"), ..Default::default() };
        assert!(normalize_discount_at(Some(&no_type), Decimal::new(100, 0), now()).is_none());
        let no_value = RawDiscount { kind: Some("fixed".into()), ..Default::default() };
        assert!(normalize_discount_at(Some(&no_value), Decimal::new(100, 0), now()).is_none());
        assert!(normalize_discount_at(Some(&raw("bogo", "10")), Decimal::new(100, 0), now()).is_none());
        assert!(normalize_discount_at(Some(&raw("fixed", "ten")), Decimal::new(100, 0), now()).is_none());
    }

    #[test]
    fn test_percentage_clamped() {
        let high = normalize_discount_at(Some(&raw("percentage", "150")), Decimal::new(10, 0), now()).unwrap();
        assert_eq!(high.value, Decimal::ONE_HUNDRED);
        let low = normalize_discount_at(Some(&raw("percentage", "-5")), Decimal::new(10, 0), now()).unwrap();
        assert_eq!(low.value, Decimal::ZERO);
        assert!(low.is_active);
    }

    #[test]
    fn test_percentage_keeps_cap_unclamped() {
        let mut input = raw("percentage", "20");
        input.max_discount_amount = text("500");
        let d = normalize_discount_at(Some(&input), Decimal::new(100, 0), now()).unwrap();
        assert_eq!(d.max_discount_amount, Some(Decimal::new(500, 0)));
    }

    #[test]
    fn test_fixed_capped_at_base_price() {
        let d = normalize_discount_at(Some(&raw("fixed", "250")), Decimal::new(80, 0), now()).unwrap();
        assert_eq!(d.value, Decimal::new(80, 0));
        let mut capped = raw("fixed", "5");
        capped.max_discount_amount = text("1");
        let d = normalize_discount_at(Some(&capped), Decimal::new(80, 0), now()).unwrap();
        assert_eq!(d.value, Decimal::new(5, 0));
        assert_eq!(d.max_discount_amount, None);
    }

    #[test]
    fn test_future_start_forces_inactive() {
        let mut input = raw("percentage", "10");
        input.is_active = Some(FormValue::Text("on".into()));
        input.start_date = Some(FormValue::Text((now() + Duration::days(1)).to_rfc3339()));
        let d = normalize_discount_at(Some(&input), Decimal::new(100, 0), now()).unwrap();
        assert!(!d.is_active);

        input.start_date = text("2025-09-01");
        input.end_date = text("2025-09-20");
        let d = normalize_discount_at(Some(&input), Decimal::new(100, 0), now()).unwrap();
        assert!(d.is_active);
        assert_eq!(d.end_date, Some(Utc.with_ymd_and_hms(2025, 9, 20, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_accepts_json_numbers() {
        let input: RawDiscount = serde_json::from_value(serde_json::json!({
            "type": "fixed", "value": 12.5, "isActive": true
        }))
        .unwrap();
        let d = normalize_discount_at(Some(&input), Decimal::new(100, 0), now()).unwrap();
        assert_eq!(d.value, Decimal::new(125, 1));
    }
}
