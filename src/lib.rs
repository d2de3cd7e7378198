//! Joinery - schema relationship designer core
//!
//! Normalizes relationship metadata, tracks which columns are exported,
//! models selected tables and relationships as a graph and turns user gestures
//! into relationship mutations through a pure reducer.

pub mod core;

#[cfg(feature = "hydrate")]
pub mod wasm;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn hydrate() {
    console_error_panic_hook::set_once();
}
