//! Inventory snapshot models

use serde::{Deserialize, Serialize};

/// Current stock level of a SKU as reported by the service
///
/// The service is expected to keep `remaining = total_stock_available - allocated`
/// and `remaining >= 0`, but neither is guaranteed, so the counts are signed
/// and `usage_pct` may exceed 1.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub sku_id: String,
    #[serde(default)]
    pub description: String,
    pub total_stock_available: i64,
    pub allocated: i64,
    pub remaining: i64,
    /// Allocated / total as a fraction (nominally 0.0-1.0)
    pub usage_pct: f64,
}

impl InventoryItem {
    /// Whether the reported counts agree with each other
    pub fn is_consistent(&self) -> bool {
        self.remaining >= 0 && self.remaining == self.total_stock_available - self.allocated
    }
}

/// Post-allocation snapshot of a SKU inside an optimization result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryImpact {
    pub sku_id: String,
    pub total_stock: i64,
    pub allocated: i64,
    pub remaining: i64,
    pub usage_pct: f64,
}
