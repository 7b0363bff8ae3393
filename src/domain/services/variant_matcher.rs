//! Variant matching over a product's variant list.

use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::domain::aggregates::VariantCombination;
use crate::domain::value_objects::{Sku, VariantOption};

/// Exact-arity, order-independent match of a variant's options.
pub fn matches(variant: &VariantCombination, selected: &[VariantOption]) -> bool {
    variant.options.len() == selected.len()
        && variant.options.iter().all(|vo| selected.iter().any(|o| o.name == vo.name && o.value == vo.value))
}

/// First matching variant. An active match wins over an inactive one that
/// carries the same options.
pub fn find_variant<'a>(variants: &'a [VariantCombination], selected: &[VariantOption]) -> Option<&'a VariantCombination> {
    let mut candidates = variants.iter().filter(|v| matches(v, selected));
    let first = candidates.next()?;
    if first.is_active { return Some(first); }
    candidates.find(|v| v.is_active).or(Some(first))
}

/// Distinct values of `axis` across active, in-stock variants, in first-seen order.
pub fn available_options(variants: &[VariantCombination], axis: &str) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for v in variants.iter().filter(|v| v.is_available()) {
        if let Some(option) = v.options.iter().find(|o| o.name == axis) {
            if !values.contains(&option.value) { values.push(option.value.clone()); }
        }
    }
    values
}

pub fn is_variant_available(variants: &[VariantCombination], selected: &[VariantOption]) -> bool {
    find_variant(variants, selected).map_or(false, VariantCombination::is_available)
}

/// The variant flagged default, else the first in declaration order.
pub fn effective_variant(variants: &[VariantCombination]) -> Option<&VariantCombination> {
    variants.iter().find(|v| v.is_default).or_else(|| variants.first())
}

/// Current option choice on a product page, bound to the matched SKU.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSelection {
    options: Vec<VariantOption>,
    sku: Sku,
}

impl VariantSelection {
    /// Starts on the effective variant.
    pub fn initial(variants: &[VariantCombination]) -> Option<Self> {
        effective_variant(variants).map(Self::for_variant)
    }

    pub fn for_variant(variant: &VariantCombination) -> Self {
        Self { options: variant.options.clone(), sku: variant.sku.clone() }
    }

    pub fn options(&self) -> &[VariantOption] { &self.options }
    pub fn sku(&self) -> &Sku { &self.sku }

    pub fn variant<'a>(&self, variants: &'a [VariantCombination]) -> Option<&'a VariantCombination> {
        variants.iter().find(|v| v.sku == self.sku)
    }

    /// Sets `axis` to `value` and re-matches the whole option set. Without a
    /// match the selection is left untouched and `false` is returned.
    pub fn choose(&mut self, variants: &[VariantCombination], axis: &str, value: &str) -> bool {
        let mut candidate = self.options.clone();
        match candidate.iter_mut().find(|o| o.name == axis) {
            Some(option) => option.value = value.to_string(),
            None => candidate.push(VariantOption::new(axis, value)),
        }
        match find_variant(variants, &candidate) {
            Some(variant) => {
                *self = Self::for_variant(variant);
                true
            }
            None => {
                debug!(axis, value, sku = %self.sku, "no variant for option change; keeping selection");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn opt(name: &str, value: &str) -> VariantOption { VariantOption::new(name, value) }

    fn variant(sku: &str, opts: &[(&str, &str)], stock: u32) -> VariantCombination {
        VariantCombination::new(
            Sku::new(sku).unwrap(),
            Decimal::new(10, 0),
            opts.iter().map(|(n, v)| opt(n, v)).collect(),
        )
        .with_stock(stock)
    }

    fn catalog() -> Vec<VariantCombination> {
        let mut blue = variant("M-BLUE", &[("Size", "M"), ("Color", "Blue")], 4);
        blue.is_active = false;
        vec![
            variant("M-RED", &[("Size", "M"), ("Color", "Red")], 5),
            blue,
            variant("L-GREEN", &[("Size", "L"), ("Color", "Green")], 0),
            variant("L-RED", &[("Size", "L"), ("Color", "Red")], 2),
            variant("S-BLACK", &[("Size", "S"), ("Color", "Black")], 1),
        ]
    }

    #[test]
    fn test_match_is_order_independent_and_exact() {
        let variants = catalog();
        let found = find_variant(&variants, &[opt("Color", "Red"), opt("Size", "M")]).unwrap();
        assert_eq!(found.sku.as_str(), "M-RED");
        assert!(find_variant(&variants, &[opt("Size", "M")]).is_none());
        assert!(find_variant(&variants, &[opt("Size", "M"), opt("Color", "Red"), opt("Material", "Cotton")]).is_none());
        assert!(find_variant(&variants, &[opt("Size", "XL"), opt("Color", "Red")]).is_none());
    }

    #[test]
    fn test_active_match_preferred() {
        let mut retired = variant("OLD-M-RED", &[("Size", "M"), ("Color", "Red")], 9);
        retired.is_active = false;
        let variants = vec![retired, variant("M-RED", &[("Size", "M"), ("Color", "Red")], 1)];
        assert_eq!(find_variant(&variants, &[opt("Size", "M"), opt("Color", "Red")]).unwrap().sku.as_str(), "M-RED");
    }

    #[test]
    fn test_available_options_filters_inactive_and_empty() {
        let variants = catalog();
        assert_eq!(available_options(&variants, "Color"), vec!["Red", "Black"]);
        assert_eq!(available_options(&variants, "Size"), vec!["M", "L", "S"]);
        assert!(available_options(&variants, "Material").is_empty());
    }

    #[test]
    fn test_is_variant_available() {
        let variants = catalog();
        assert!(is_variant_available(&variants, &[opt("Size", "L"), opt("Color", "Red")]));
        assert!(!is_variant_available(&variants, &[opt("Size", "L"), opt("Color", "Green")]));
        assert!(!is_variant_available(&variants, &[opt("Size", "M"), opt("Color", "Blue")]));
        assert!(!is_variant_available(&variants, &[opt("Size", "XS"), opt("Color", "Red")]));
    }

    #[test]
    fn test_backorder_is_not_availability() {
        let mut v = variant("PRE", &[("Size", "M")], 0);
        v.allow_backorder = true;
        let variants = vec![v];
        assert!(!is_variant_available(&variants, &[opt("Size", "M")]));
        assert!(variants[0].can_purchase());
    }

    #[test]
    fn test_effective_variant_fallback() {
        let mut variants = catalog();
        assert_eq!(effective_variant(&variants).unwrap().sku.as_str(), "M-RED");
        variants[3].is_default = true;
        assert_eq!(effective_variant(&variants).unwrap().sku.as_str(), "L-RED");
        assert!(effective_variant(&[]).is_none());
    }

    #[test]
    fn test_selection_keeps_state_on_invalid_combination() {
        let variants = catalog();
        let mut selection = VariantSelection::initial(&variants).unwrap();
        assert_eq!(selection.sku().as_str(), "M-RED");

        assert!(selection.choose(&variants, "Size", "L"));
        assert_eq!(selection.sku().as_str(), "L-RED");
        assert_eq!(selection.variant(&variants).unwrap().stock, 2);

        assert!(!selection.choose(&variants, "Color", "Black"));
        assert_eq!(selection.sku().as_str(), "L-RED");
        assert!(selection.options().contains(&opt("Color", "Red")));
    }
}
