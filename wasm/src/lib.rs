//! WebAssembly module for the Uniform Allocation client
//!
//! Exposes the view builders to the browser so the web screens derive
//! their numbers exactly like the native client:
//! - Dashboard coverage and school counts
//! - School cards and inventory gauges
//! - Picking sections and barcode verification
//!
//! JSON in, JSON out. Each export is a thin wrapper over a plain function
//! that can be exercised without a JavaScript host.

use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::views::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Whole-percent share of students served
#[wasm_bindgen(js_name = coveragePercent)]
pub fn coverage_percent_js(served: u64, total: u64) -> u64 {
    coverage_percent(served, total)
}

/// Gauge color class for a usage fraction: "nominal", "warning" or "critical"
#[wasm_bindgen(js_name = gaugeSeverity)]
pub fn gauge_severity_js(usage_pct: f64) -> String {
    gauge_severity(usage_pct).as_str().to_string()
}

/// Bar width in [0, 100] for a usage fraction
#[wasm_bindgen(js_name = gaugeFill)]
pub fn gauge_fill_js(usage_pct: f64) -> f64 {
    gauge_fill_percent(usage_pct)
}

#[wasm_bindgen(js_name = crossesSafetyCap)]
pub fn crosses_safety_cap_js(previous_percent: i64, next_percent: i64) -> bool {
    crosses_safety_cap(previous_percent, next_percent)
}

#[wasm_bindgen(js_name = dashboardSummary)]
pub fn dashboard_json(schools_json: &str, result_json: &str) -> Result<String, JsValue> {
    dashboard_summary(schools_json, result_json).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen(js_name = schoolCards)]
pub fn school_cards_json(
    schools_json: &str,
    result_json: &str,
    sort: &str,
) -> Result<String, JsValue> {
    build_school_cards(schools_json, result_json, sort).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen(js_name = skuGauges)]
pub fn sku_gauges_json(inventory_json: &str) -> Result<String, JsValue> {
    build_sku_gauges(inventory_json).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen(js_name = pickingSections)]
pub fn picking_sections_json(picking_json: &str) -> Result<String, JsValue> {
    build_picking_sections(picking_json).map_err(|e| JsValue::from_str(&e))
}

/// "approved" or "not_on_picking_list"
#[wasm_bindgen(js_name = verifyScan)]
pub fn verify_scan_json(picking_json: &str, code: &str) -> Result<String, JsValue> {
    check_scan(picking_json, code).map_err(|e| JsValue::from_str(&e))
}

fn parse<T: serde::de::DeserializeOwned>(label: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", label, e))
}

/// `null` or an empty string means no result yet
fn parse_result(json: &str) -> Result<Option<OptimizationResult>, String> {
    if json.trim().is_empty() {
        return Ok(None);
    }
    parse("result", json)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

pub fn dashboard_summary(schools_json: &str, result_json: &str) -> Result<String, String> {
    let schools: Vec<School> = parse("schools", schools_json)?;
    let result = parse_result(result_json)?;
    to_json(&dashboard(&schools, result.as_ref()))
}

pub fn build_school_cards(
    schools_json: &str,
    result_json: &str,
    sort: &str,
) -> Result<String, String> {
    let schools: Vec<School> = parse("schools", schools_json)?;
    let result = parse_result(result_json)?;
    let mode: SchoolSort = sort.parse()?;
    to_json(&school_cards(&schools, result.as_ref(), mode))
}

pub fn build_sku_gauges(inventory_json: &str) -> Result<String, String> {
    let inventory: Vec<InventoryItem> = parse("inventory", inventory_json)?;
    to_json(&sku_gauges(&inventory))
}

pub fn build_picking_sections(picking_json: &str) -> Result<String, String> {
    let list: Option<PickingList> = parse("picking list", picking_json)?;
    to_json(&picking_sections(list.as_ref()))
}

pub fn check_scan(picking_json: &str, code: &str) -> Result<String, String> {
    let list: PickingList = parse("picking list", picking_json)?;
    let verdict = verify_scan(&approved_skus(&list), code);
    to_json(&verdict).map(|s| s.trim_matches('"').to_string())
}
