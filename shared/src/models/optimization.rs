//! Optimization result models

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::InventoryImpact;

/// Which schools the optimizer selected
///
/// The ids form a set; a repeated id on the wire is read once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SelectionReport {
    pub selected_school_ids: BTreeSet<String>,
    pub total_students_served: u64,
}

impl SelectionReport {
    pub fn is_selected(&self, school_id: &str) -> bool {
        self.selected_school_ids.contains(school_id)
    }
}

/// A school/SKU pair whose demand exceeds post-allocation availability
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shortage {
    pub sku_id: String,
    pub school_id: String,
    pub demand: i64,
    pub available_after_allocation: i64,
    pub deficit: i64,
}

/// Outcome of a completed optimization run
///
/// `shortages` is the authoritative explanation of why a school was excluded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationResult {
    pub selection: SelectionReport,
    #[serde(default)]
    pub inventory_impact: Vec<InventoryImpact>,
    #[serde(default)]
    pub shortages: Vec<Shortage>,
}

impl OptimizationResult {
    pub fn selected_count(&self) -> usize {
        self.selection.selected_school_ids.len()
    }

    pub fn has_shortages(&self) -> bool {
        !self.shortages.is_empty()
    }
}
