// Native tests for the prediction normalization and selection logic. These
// avoid wasm/browser APIs entirely so they run under plain `cargo test`.

use fortune_card::predictions::{
    DatasetError, Prediction, find_by_id, normalize, normalize_str, pick_random,
    pick_random_with,
};
use serde_json::json;

fn list(ids: &[i64]) -> Vec<Prediction> {
    ids.iter()
        .map(|&id| Prediction {
            id,
            text: format!("prediction {id}"),
        })
        .collect()
}

// --- normalize: shapes -------------------------------------------------------

#[test]
fn normalizes_string_array_with_positional_ids() {
    let normalized = normalize(&json!(["A", "B", "C"])).unwrap();
    assert_eq!(
        normalized,
        vec![
            Prediction { id: 0, text: "A".into() },
            Prediction { id: 1, text: "B".into() },
            Prediction { id: 2, text: "C".into() },
        ]
    );
}

#[test]
fn normalizes_object_array_preferring_explicit_ids() {
    let raw = json!({ "predictions": [{ "text": "X", "id": 9 }, { "text": "Y" }] });
    let normalized = normalize(&raw).unwrap();
    assert_eq!(
        normalized,
        vec![
            Prediction { id: 9, text: "X".into() },
            Prediction { id: 1, text: "Y".into() },
        ]
    );
}

#[test]
fn normalizes_mixed_string_and_object_entries() {
    let raw = json!(["A", { "text": "B", "id": 7 }, { "text": "C" }]);
    let normalized = normalize(&raw).unwrap();
    assert_eq!(normalized[0], Prediction { id: 0, text: "A".into() });
    assert_eq!(normalized[1], Prediction { id: 7, text: "B".into() });
    assert_eq!(normalized[2], Prediction { id: 2, text: "C".into() });
}

#[test]
fn output_order_matches_input_order() {
    let texts: Vec<String> = (0..20).map(|i| format!("t{i}")).collect();
    let normalized = normalize(&json!(texts)).unwrap();
    assert_eq!(normalized.len(), texts.len());
    for (i, p) in normalized.iter().enumerate() {
        assert_eq!(p.id, i as i64);
        assert_eq!(p.text, texts[i]);
    }
}

#[test]
fn null_explicit_id_falls_back_to_position() {
    let raw = json!([{ "text": "A", "id": null }, { "text": "B" }]);
    let normalized = normalize(&raw).unwrap();
    assert_eq!(normalized[0].id, 0);
    assert_eq!(normalized[1].id, 1);
}

#[test]
fn empty_array_yields_empty_list() {
    assert!(normalize(&json!([])).unwrap().is_empty());
    assert!(normalize(&json!({ "predictions": [] })).unwrap().is_empty());
}

// --- normalize: failures ------------------------------------------------------

#[test]
fn non_array_non_wrapper_input_is_invalid_format() {
    for raw in [json!(42), json!("oops"), json!(true), json!(null), json!({})] {
        assert!(matches!(normalize(&raw), Err(DatasetError::InvalidFormat)));
    }
}

#[test]
fn wrapper_holding_non_array_is_invalid_format() {
    let raw = json!({ "predictions": "not an array" });
    assert!(matches!(normalize(&raw), Err(DatasetError::InvalidFormat)));
}

#[test]
fn nested_wrapper_is_not_unwrapped_twice() {
    // One level of unwrapping only: the inner wrapper is just a non-array
    // value under `predictions`.
    let raw = json!({ "predictions": { "predictions": ["A"] } });
    assert!(matches!(normalize(&raw), Err(DatasetError::InvalidFormat)));
}

#[test]
fn malformed_entry_reports_its_position() {
    let raw = json!(["A", "B", 3]);
    assert!(matches!(
        normalize(&raw),
        Err(DatasetError::InvalidEntry { index: 2 })
    ));

    let raw = json!([null, "B"]);
    assert!(matches!(
        normalize(&raw),
        Err(DatasetError::InvalidEntry { index: 0 })
    ));

    let raw = json!([{ "text": "ok" }, { "id": 3 }]);
    assert!(matches!(
        normalize(&raw),
        Err(DatasetError::InvalidEntry { index: 1 })
    ));
}

#[test]
fn non_integer_explicit_id_is_malformed() {
    let raw = json!([{ "text": "A", "id": 1.5 }]);
    assert!(matches!(
        normalize(&raw),
        Err(DatasetError::InvalidEntry { index: 0 })
    ));
}

#[test]
fn normalize_is_all_or_nothing() {
    // A bad trailing entry fails the entire call; no partial list escapes.
    let raw = json!(["A", "B", false]);
    assert!(normalize(&raw).is_err());
}

#[test]
fn normalize_str_parses_then_normalizes() {
    let normalized = normalize_str(r#"{"predictions": ["A", "B"]}"#).unwrap();
    assert_eq!(normalized.len(), 2);

    assert!(matches!(
        normalize_str("{ not json"),
        Err(DatasetError::Json(_))
    ));
}

// --- pick_random --------------------------------------------------------------

#[test]
fn empty_list_fails_the_draw() {
    assert!(matches!(
        pick_random(&[], None),
        Err(DatasetError::EmptyDataset)
    ));
}

#[test]
fn single_record_returned_even_when_it_was_previous() {
    let preds = list(&[5]);
    let p = pick_random(&preds, Some(5)).unwrap();
    assert_eq!(p.id, 5);
}

#[test]
fn draw_never_repeats_previous_id() {
    let preds = list(&[0, 1, 2]);
    for _ in 0..200 {
        let p = pick_random(&preds, Some(1)).unwrap();
        assert_ne!(p.id, 1);
        assert!(p.id == 0 || p.id == 2);
    }
}

#[test]
fn draw_without_previous_considers_whole_list() {
    let preds = list(&[0, 1, 2, 3]);
    let p = pick_random_with(&preds, None, |n| {
        assert_eq!(n, 4, "no exclusion without a previous id");
        3
    })
    .unwrap();
    assert_eq!(p.id, 3);
}

#[test]
fn draw_excludes_exactly_the_previous_record() {
    let preds = list(&[10, 20, 30]);
    let p = pick_random_with(&preds, Some(20), |n| {
        assert_eq!(n, 2, "previous record must be excluded from candidates");
        1
    })
    .unwrap();
    assert_eq!(p.id, 30);
}

#[test]
fn draw_covers_every_candidate_index() {
    let preds = list(&[0, 1, 2, 3, 4]);
    for idx in 0..4 {
        let p = pick_random_with(&preds, Some(2), move |_| idx).unwrap();
        assert_ne!(p.id, 2);
    }
}

#[test]
fn previous_id_absent_from_list_excludes_nothing() {
    let preds = list(&[0, 1]);
    let p = pick_random_with(&preds, Some(99), |n| {
        assert_eq!(n, 2);
        0
    })
    .unwrap();
    assert_eq!(p.id, 0);
}

#[test]
fn duplicated_ids_fall_back_to_full_list() {
    // Authored data is trusted unique, but a degenerate all-duplicate list
    // must not fail the draw.
    let preds = vec![
        Prediction { id: 1, text: "a".into() },
        Prediction { id: 1, text: "b".into() },
    ];
    let p = pick_random(&preds, Some(1)).unwrap();
    assert_eq!(p.id, 1);
}

// --- find_by_id ----------------------------------------------------------------

#[test]
fn lookup_returns_matching_record() {
    let preds = list(&[3, 7, 11]);
    let p = find_by_id(&preds, 7).unwrap();
    assert_eq!(p.text, "prediction 7");
}

#[test]
fn lookup_miss_is_none_not_an_error() {
    let preds = list(&[0, 1, 2]);
    assert!(find_by_id(&preds, 42).is_none());
    assert!(find_by_id(&[], 0).is_none());
}

#[test]
fn lookup_with_duplicate_ids_returns_first_match() {
    let preds = vec![
        Prediction { id: 4, text: "first".into() },
        Prediction { id: 4, text: "second".into() },
    ];
    assert_eq!(find_by_id(&preds, 4).unwrap().text, "first");
}

// --- draw / lookup interplay ----------------------------------------------------

#[test]
fn threaded_previous_id_avoids_back_to_back_repeats() {
    // Simulate the UI's session loop: the result id becomes the next
    // previous id.
    let preds = list(&[0, 1, 2, 3]);
    let mut previous: Option<i64> = None;
    for _ in 0..100 {
        let p = pick_random(&preds, previous).unwrap();
        if let Some(prev) = previous {
            assert_ne!(p.id, prev);
        }
        previous = Some(p.id);
    }
}
