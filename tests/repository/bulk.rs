//! Bulk Upsert Tests
//!
//! Tests for partial-success semantics:
//! - Invalid records are reported, valid ones are saved
//! - Existing records update, new records insert, in one call
//! - Results come back in the caller's input order

use crate::support::{doc, repository};
use serde_json::json;
use tabula::{FindOptions, SaveOptions};

#[test]
fn one_invalid_record_does_not_abort_the_batch() {
    let (_, repo) = repository();
    let batch = vec![
        doc(json!({"label": "valid-1"})),
        doc(json!({"note": "missing its label"})),
        doc(json!({"label": "valid-2"})),
    ];

    let result = repo.save_bulk(&batch, &SaveOptions::new()).unwrap();
    assert_eq!(result.saved_objects.len(), 2);
    assert_eq!(result.validation_errors.len(), 1);
    assert_eq!(result.validation_errors[0].code, "missingLabel");

    assert_eq!(repo.count(&FindOptions::new()).unwrap(), 2);
}

#[test]
fn batch_mixes_updates_and_inserts() {
    let (_, repo) = repository();
    let existing = repo
        .save(&doc(json!({"label": "old", "year": 2023})), &SaveOptions::new())
        .unwrap();
    let id = existing.get_str("id").unwrap().to_string();

    let batch = vec![
        doc(json!({"id": id, "label": "renamed"})),
        doc(json!({"label": "brand-new"})),
    ];
    let result = repo.save_bulk(&batch, &SaveOptions::new()).unwrap();
    assert_eq!(result.saved_objects.len(), 2);
    assert!(result.validation_errors.is_empty());

    // The update merged; the insert created a second record.
    assert_eq!(result.saved_objects[0].get_str("label"), Some("renamed"));
    assert_eq!(result.saved_objects[0].get_u64("year"), Some(2023));
    assert_eq!(result.saved_objects[1].get_str("label"), Some("brand-new"));
    assert_eq!(repo.count(&FindOptions::new()).unwrap(), 2);
}

#[test]
fn results_preserve_input_order() {
    let (_, repo) = repository();
    let existing = repo
        .save(&doc(json!({"label": "pre-existing"})), &SaveOptions::new())
        .unwrap();
    let id = existing.get_str("id").unwrap().to_string();

    // insert, update, insert: updates happen before the bulk insert
    // internally, but the caller sees input order.
    let batch = vec![
        doc(json!({"label": "first-insert"})),
        doc(json!({"id": id, "label": "the-update"})),
        doc(json!({"label": "second-insert"})),
    ];
    let result = repo.save_bulk(&batch, &SaveOptions::new()).unwrap();
    let labels: Vec<&str> = result
        .saved_objects
        .iter()
        .map(|d| d.get_str("label").unwrap())
        .collect();
    assert_eq!(labels, vec!["first-insert", "the-update", "second-insert"]);
}

#[test]
fn duplicate_new_identifiers_resolve_first_occurrence_wins() {
    let (_, repo) = repository();
    let id = tabula::DocumentId::new().to_string();

    let batch = vec![
        doc(json!({"id": id, "label": "claims-the-id"})),
        doc(json!({"id": id, "label": "loses-the-race"})),
    ];
    let result = repo.save_bulk(&batch, &SaveOptions::new()).unwrap();
    assert_eq!(result.saved_objects.len(), 1);
    assert_eq!(
        result.saved_objects[0].get_str("label"),
        Some("claims-the-id")
    );
    assert_eq!(result.validation_errors.len(), 1);
    assert_eq!(result.validation_errors[0].code, "duplicateIdentifier");
}

#[test]
fn saved_objects_are_normalized() {
    let (_, repo) = repository();
    let result = repo
        .save_bulk(&[doc(json!({"label": "x"}))], &SaveOptions::new())
        .unwrap();
    let saved = &result.saved_objects[0];
    assert!(saved.get_str("id").is_some());
    assert!(!saved.contains("_id"));
}

#[test]
fn empty_batch_is_a_noop() {
    let (_, repo) = repository();
    let result = repo.save_bulk(&[], &SaveOptions::new()).unwrap();
    assert!(result.saved_objects.is_empty());
    assert!(result.validation_errors.is_empty());
}
