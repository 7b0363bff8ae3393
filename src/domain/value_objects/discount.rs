//! Product-level discount, embedded in the product document.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

impl FromStr for DiscountKind {
    type Err = UnknownDiscountKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            _ => Err(UnknownDiscountKind(s.to_string())),
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Percentage => write!(f, "percentage"), Self::Fixed => write!(f, "fixed") }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownDiscountKind(pub String);
impl std::error::Error for UnknownDiscountKind {}
impl fmt::Display for UnknownDiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Unknown discount type: {}", self.0) }
}

/// A percentage or fixed discount with an optional window and cap.
///
/// `is_active` is a snapshot taken when the discount was normalized; use
/// [`Discount::refreshed`] to re-evaluate it against the current time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub is_active: bool,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Only meaningful for percentage discounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discount_amount: Option<Decimal>,
}

impl Discount {
    pub fn percentage(value: Decimal) -> Self { Self::active(DiscountKind::Percentage, value) }
    pub fn fixed(value: Decimal) -> Self { Self::active(DiscountKind::Fixed, value) }

    fn active(kind: DiscountKind, value: Decimal) -> Self {
        Self { is_active: true, kind, value, start_date: None, end_date: None, max_discount_amount: None }
    }

    pub fn with_cap(mut self, cap: Decimal) -> Self { self.max_discount_amount = Some(cap); self }

    pub fn with_window(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn inactive(mut self) -> Self { self.is_active = false; self }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool { self.start_date.map_or(true, |start| start <= now) }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool { self.end_date.map_or(false, |end| now > end) }

    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool { self.has_started(now) && !self.has_ended(now) }

    /// Copy with `is_active` recomputed from the window at `now`.
    pub fn refreshed(&self, now: DateTime<Utc>) -> Self {
        Self { is_active: self.is_within_window(now), ..self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 9, day, 0, 0, 0).unwrap() }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(" Percentage ".parse::<DiscountKind>().unwrap(), DiscountKind::Percentage);
        assert_eq!("fixed".parse::<DiscountKind>().unwrap(), DiscountKind::Fixed);
        assert!("free_shipping".parse::<DiscountKind>().is_err());
    }

    #[test]
    fn test_window_checks() {
        let d = Discount::percentage(Decimal::new(20, 0)).with_window(Some(at(1)), Some(at(30)));
        assert!(!d.is_within_window(at(1) - Duration::seconds(1)));
        assert!(d.is_within_window(at(1)));
        assert!(d.is_within_window(at(30)));
        assert!(!d.is_within_window(at(30) + Duration::seconds(1)));
    }

    #[test]
    fn test_refreshed_tracks_window_not_snapshot() {
        let expired = Discount::fixed(Decimal::new(5, 0)).with_window(None, Some(at(10)));
        assert!(expired.is_active);
        assert!(!expired.refreshed(at(11)).is_active);

        let pending = Discount::fixed(Decimal::new(5, 0)).with_window(Some(at(10)), None).inactive();
        assert!(pending.refreshed(at(10)).is_active);
    }

    #[test]
    fn test_document_shape() {
        let d = Discount::percentage(Decimal::new(20, 0)).with_cap(Decimal::new(15, 0));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "percentage");
        assert_eq!(json["isActive"], true);
        assert!(json.get("startDate").is_none());
        let back: Discount = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
