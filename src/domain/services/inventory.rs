//! Stock report across the catalog.

use serde::Serialize;
use crate::domain::aggregates::Product;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReport {
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub critical: usize,
    pub products: StockReportProducts,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReportProducts {
    pub low_stock: Vec<String>,
    pub out_of_stock: Vec<String>,
    pub critical: Vec<String>,
}

/// Classifies active products. `threshold` overrides each variant's own
/// low-stock threshold for the low-stock bucket.
pub fn stock_report(products: &[Product], threshold: Option<u32>) -> StockReport {
    let mut ids = StockReportProducts::default();
    for p in products.iter().filter(|p| p.is_active()) {
        let low = p.variants().iter().any(|v| {
            v.is_active && v.track_quantity && v.stock > 0 && v.stock <= threshold.unwrap_or(v.low_stock_threshold)
        });
        if low { ids.low_stock.push(p.id().to_string()); }
        if p.variants().iter().all(|v| !v.is_available()) { ids.out_of_stock.push(p.id().to_string()); }
        if p.variants().iter().any(|v| v.is_active && v.is_critical_stock()) { ids.critical.push(p.id().to_string()); }
    }
    StockReport {
        low_stock: ids.low_stock.len(),
        out_of_stock: ids.out_of_stock.len(),
        critical: ids.critical.len(),
        products: ids,
    }
}
