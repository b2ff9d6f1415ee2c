//! Warehouse picking list models
//!
//! The picking list is always the student-level shape. Aggregate quantities
//! per SKU are derived from it with [`PickingSchool::sku_totals`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of uniform item to pull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Shirt,
    Pants,
    Shoes,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Shirt => "shirt",
            ItemKind::Pants => "pants",
            ItemKind::Shoes => "shoes",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PickingItem {
    pub sku_id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PickingStudent {
    pub student_id: String,
    pub items: Vec<PickingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PickingSchool {
    pub school_id: String,
    pub total_students: u32,
    pub students: Vec<PickingStudent>,
}

impl PickingSchool {
    /// Quantity per SKU for this school, summed over its students
    pub fn sku_totals(&self) -> BTreeMap<String, u32> {
        let mut totals = BTreeMap::new();
        for item in self.students.iter().flat_map(|s| &s.items) {
            *totals.entry(item.sku_id.clone()).or_insert(0) += 1;
        }
        totals
    }
}

/// Items to pull for a completed job, grouped School -> Student -> Items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PickingList {
    pub schools: Vec<PickingSchool>,
}

impl PickingList {
    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }

    /// Every item in the list, in school/student order
    pub fn items(&self) -> impl Iterator<Item = &PickingItem> {
        self.schools
            .iter()
            .flat_map(|school| &school.students)
            .flat_map(|student| &student.items)
    }
}
