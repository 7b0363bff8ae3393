//! Resolves a stored discount against a price.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{Discount, DiscountKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountedPrice {
    pub final_price: Decimal,
    /// Effective savings in whole percent, never the stored value.
    pub discount_percent: u32,
}

/// Applies `discount` to `price`, trusting the stored `is_active` flag.
pub fn get_discounted_price(price: Decimal, discount: Option<&Discount>) -> DiscountedPrice {
    let Some(discount) = discount.filter(|d| d.is_active) else {
        return DiscountedPrice { final_price: price, discount_percent: 0 };
    };
    if price.is_zero() {
        return DiscountedPrice { final_price: Decimal::ZERO, discount_percent: 0 };
    }

    let final_price = match discount.kind {
        DiscountKind::Percentage => {
            let raw = price * discount.value / Decimal::ONE_HUNDRED;
            let amount = discount.max_discount_amount.map_or(raw, |cap| raw.min(cap));
            (price - amount).max(Decimal::ZERO)
        }
        DiscountKind::Fixed => (price - discount.value).max(Decimal::ZERO),
    };
    DiscountedPrice { final_price, discount_percent: percent_off(price, final_price) }
}

fn percent_off(price: Decimal, final_price: Decimal) -> u32 {
    ((price - final_price) / price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(n: i64) -> Decimal { Decimal::new(n, 0) }

    #[test]
    fn test_no_discount_or_inactive() {
        let none = get_discounted_price(d(80), None);
        assert_eq!(none, DiscountedPrice { final_price: d(80), discount_percent: 0 });
        for price in [0, 1, 80, 12_345] {
            let inactive = Discount::percentage(d(50)).inactive();
            let r = get_discounted_price(d(price), Some(&inactive));
            assert_eq!(r, DiscountedPrice { final_price: d(price), discount_percent: 0 });
        }
    }

    #[test]
    fn test_percentage_cap_reflected_in_percent() {
        let discount = Discount::percentage(d(50)).with_cap(d(10));
        let r = get_discounted_price(d(100), Some(&discount));
        assert_eq!(r.final_price, d(90));
        assert_eq!(r.discount_percent, 10);
    }

    #[test]
    fn test_percentage_uncapped() {
        let r = get_discounted_price(Decimal::new(4999, 2), Some(&Discount::percentage(d(20))));
        assert_eq!(r.final_price, Decimal::new(39992, 3));
        assert_eq!(r.discount_percent, 20);
    }

    #[test]
    fn test_fixed_never_negative() {
        let r = get_discounted_price(d(10), Some(&Discount::fixed(d(50))));
        assert_eq!(r.final_price, Decimal::ZERO);
        assert_eq!(r.discount_percent, 100);
    }

    #[test]
    fn test_fixed_percent_rounds_half_up() {
        // 1/8 = 12.5% rounds to 13
        let r = get_discounted_price(d(8), Some(&Discount::fixed(d(1))));
        assert_eq!(r.final_price, d(7));
        assert_eq!(r.discount_percent, 13);
    }

    #[test]
    fn test_zero_price_guard() {
        let r = get_discounted_price(Decimal::ZERO, Some(&Discount::fixed(d(5))));
        assert_eq!(r, DiscountedPrice { final_price: Decimal::ZERO, discount_percent: 0 });
        let r = get_discounted_price(Decimal::ZERO, Some(&Discount::percentage(d(30))));
        assert_eq!(r.discount_percent, 0);
    }
}
