//! Browser bindings for the pure parts of the designer

use crate::core::{RawRelationship, create_edge_id, normalize, parse_edge_id, to_wire};
use wasm_bindgen::prelude::*;

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Normalize relationships of either shape; returns the backend (snake_case) shape
#[wasm_bindgen(js_name = normalizeRelationships)]
pub fn normalize_relationships(
    relationships: JsValue,
    selected_tables: Vec<String>,
) -> Result<JsValue, JsValue> {
    let raw: Vec<RawRelationship> =
        serde_wasm_bindgen::from_value(relationships).map_err(to_js_error)?;
    let normalized = normalize(raw, &selected_tables);
    serde_wasm_bindgen::to_value(&to_wire(&normalized)).map_err(to_js_error)
}

#[wasm_bindgen(js_name = createEdgeId)]
pub fn create_edge_id_js(
    source_table: &str,
    source_column: &str,
    target_table: &str,
    target_column: &str,
) -> String {
    create_edge_id(source_table, source_column, target_table, target_column)
}

/// `[sourceTable, sourceColumn, targetTable, targetColumn]`, or `undefined` for a malformed id
#[wasm_bindgen(js_name = parseEdgeId)]
pub fn parse_edge_id_js(edge_id: &str) -> Option<Vec<String>> {
    parse_edge_id(edge_id).map(|e| {
        vec![
            e.source_table,
            e.source_column,
            e.target_table,
            e.target_column,
        ]
    })
}
