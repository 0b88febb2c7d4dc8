//! Fortune Card core crate.
//!
//! A single-page WASM experience: tap a button, get a pseudo-random short
//! prediction for 2026, watch it animate into a styled card, then share it or
//! download it as an image. The dataset lives in `src/predictions.json` and
//! is normalized once at startup; the shown card is mirrored into a `?p=<id>`
//! query parameter so it can be deep-linked.

use wasm_bindgen::prelude::*;

mod card;
pub mod predictions;

pub use card::start_app;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Bundled prediction dataset, embedded as authored. Kept public so the
/// dataset tests validate exactly what ships.
pub const PREDICTIONS_JSON: &str = include_str!("predictions.json");
