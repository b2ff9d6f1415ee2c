//! School profile models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A school and its aggregate uniform demand
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct School {
    pub school_id: String,
    pub total_students: u32,
    /// Required quantity per SKU
    #[serde(default)]
    pub sku_demand: BTreeMap<String, u32>,
}

impl School {
    /// Total number of items this school needs across all SKUs
    pub fn total_units(&self) -> u64 {
        self.sku_demand.values().map(|&q| u64::from(q)).sum()
    }
}

/// Sum of enrolled students across schools
pub fn total_students(schools: &[School]) -> u64 {
    schools.iter().map(|s| u64::from(s.total_students)).sum()
}
