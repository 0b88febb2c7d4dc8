//! Prediction dataset normalization and selection.
//!
//! The bundled dataset is loosely structured JSON: authors may write a bare
//! array of strings, an array of `{ "text": ..., "id": ... }` objects, or
//! either of those wrapped in `{ "predictions": [...] }`. Everything in here
//! normalizes that into a uniform `Prediction` list and picks entries from
//! it. No browser APIs; this module is pure and tested natively.

use serde_json::Value;
use thiserror::Error;

/// Canonical prediction record produced by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    /// Stable identifier, unique within one normalized list. Taken from the
    /// authored `id` when present, else the element's 0-based position.
    pub id: i64,
    /// Display text. Opaque to this module; rendering wraps/animates it.
    pub text: String,
}

/// Failures raised while normalizing or drawing from the dataset.
///
/// The dataset is static, so none of these are retryable: the caller either
/// fixes the data or shows a terminal error state. A missed [`find_by_id`]
/// lookup is deliberately *not* in this taxonomy; it returns `None`.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Raw value is neither an array nor a `{ "predictions": [...] }` wrapper
    /// (or the wrapper holds a non-array).
    #[error("invalid predictions data format")]
    InvalidFormat,
    /// Element at `index` is neither a plain string nor an object carrying a
    /// string `text` field.
    #[error("invalid prediction entry at index {index}")]
    InvalidEntry { index: usize },
    /// Random draw attempted with zero records.
    #[error("no predictions available")]
    EmptyDataset,
    /// Bundled dataset text is not valid JSON at all.
    #[error("predictions data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single raw element before normalization: either a bare string or an
/// object with `text` and an optional authored id.
enum RawEntry {
    Text(String),
    Record { text: String, id: Option<i64> },
}

const WRAPPER_KEY: &str = "predictions";

/// Locate the entry array inside `raw`: unwrap a `{ "predictions": [...] }`
/// object (one level only, a nested wrapper is not re-unwrapped) or accept a
/// bare array.
fn unwrap_entries(raw: &Value) -> Result<&[Value], DatasetError> {
    let candidate = match raw {
        Value::Object(map) => map.get(WRAPPER_KEY).ok_or(DatasetError::InvalidFormat)?,
        _ => raw,
    };
    candidate
        .as_array()
        .map(Vec::as_slice)
        .ok_or(DatasetError::InvalidFormat)
}

/// Decode one element, tracking its position for error reporting.
fn decode_entry(value: &Value, index: usize) -> Result<RawEntry, DatasetError> {
    match value {
        Value::String(s) => Ok(RawEntry::Text(s.clone())),
        Value::Object(map) => {
            let text = map
                .get("text")
                .and_then(Value::as_str)
                .ok_or(DatasetError::InvalidEntry { index })?;
            // An authored `"id": null` counts as absent, falling back to the
            // positional id. A non-integer id is malformed, not ignored.
            let id = match map.get("id") {
                None | Some(Value::Null) => None,
                Some(v) => Some(v.as_i64().ok_or(DatasetError::InvalidEntry { index })?),
            };
            Ok(RawEntry::Record {
                text: text.to_owned(),
                id,
            })
        }
        _ => Err(DatasetError::InvalidEntry { index }),
    }
}

/// Normalize a raw dataset into the canonical prediction list.
///
/// Output order equals input traversal order (no sorting), an empty array
/// yields an empty list, and normalization is all-or-nothing: the first
/// malformed element fails the whole call, no partial list escapes.
pub fn normalize(raw: &Value) -> Result<Vec<Prediction>, DatasetError> {
    let entries = unwrap_entries(raw)?;
    entries
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let prediction = match decode_entry(value, i)? {
                RawEntry::Text(text) => Prediction { id: i as i64, text },
                RawEntry::Record { text, id } => Prediction {
                    id: id.unwrap_or(i as i64),
                    text,
                },
            };
            Ok(prediction)
        })
        .collect()
}

/// Parse JSON text and normalize it. Convenience for the bundled dataset,
/// which ships as an embedded JSON string.
pub fn normalize_str(json: &str) -> Result<Vec<Prediction>, DatasetError> {
    let raw: Value = serde_json::from_str(json)?;
    normalize(&raw)
}

/// Pick a random prediction avoiding an immediate repeat, using an injected
/// uniform draw over `[0, n)`.
///
/// A single-record list returns that record regardless of `previous_id`
/// (repeat avoidance is impossible there). Otherwise candidates are all
/// records whose id differs from `previous_id`; with no previous id the
/// whole list is eligible. Threading the returned id back in as the next
/// `previous_id` is the caller's job, which keeps this function pure.
pub fn pick_random_with<'a, F>(
    predictions: &'a [Prediction],
    previous_id: Option<i64>,
    draw: F,
) -> Result<&'a Prediction, DatasetError>
where
    F: FnOnce(usize) -> usize,
{
    match predictions {
        [] => Err(DatasetError::EmptyDataset),
        [only] => Ok(only),
        _ => {
            let candidates: Vec<&Prediction> = match previous_id {
                Some(prev) => predictions.iter().filter(|p| p.id != prev).collect(),
                None => predictions.iter().collect(),
            };
            if candidates.is_empty() {
                // Only reachable when authored ids are duplicated and all
                // collide with previous_id; fall back to the full list
                // rather than failing the draw.
                let idx = draw(predictions.len()) % predictions.len();
                return Ok(&predictions[idx]);
            }
            let idx = draw(candidates.len()) % candidates.len();
            Ok(candidates[idx])
        }
    }
}

/// [`pick_random_with`] wired to the OS / browser entropy source.
pub fn pick_random<'a>(
    predictions: &'a [Prediction],
    previous_id: Option<i64>,
) -> Result<&'a Prediction, DatasetError> {
    pick_random_with(predictions, previous_id, rand_index)
}

/// Look up a prediction by id (deep links). Linear scan, first match; `None`
/// is a normal outcome meaning "no deep-linked prediction", not an error.
pub fn find_by_id(predictions: &[Prediction], id: i64) -> Option<&Prediction> {
    predictions.iter().find(|p| p.id == id)
}

/// Uniform index in `[0, len)` from `getrandom`, unbiased via rejection
/// sampling on the raw `u32`.
fn rand_index(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len32 = len as u32;
    let zone = (u32::MAX / len32) * len32;
    let mut buf = [0u8; 4];
    loop {
        if getrandom::getrandom(&mut buf).is_err() {
            // Entropy source unavailable (shouldn't happen in a browser or on
            // any supported host); degrade to a time-derived index.
            return time_fallback_index(len);
        }
        let v = u32::from_le_bytes(buf);
        if v < zone {
            return (v % len32) as usize;
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn time_fallback_index(len: usize) -> usize {
    let now = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0);
    (now as u64 as usize)
        .wrapping_mul(1664525)
        .wrapping_add(1013904223)
        % len
}

#[cfg(not(target_arch = "wasm32"))]
fn time_fallback_index(len: usize) -> usize {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as usize)
        .unwrap_or(0);
    now.wrapping_mul(1664525).wrapping_add(1013904223) % len
}
