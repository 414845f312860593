//! Sorting and Expansion Tests
//!
//! Tests for result shaping through the repository:
//! - Multi-field sorts with per-field direction
//! - Lookup-backed sorts: ordered by the joined label, label never leaks
//! - Eager expansion of declared relations

use crate::support::{doc, repository};
use serde_json::json;
use tabula::{DocumentStore, FindOptions, FindPaginated, OrderBy, SaveOptions};

fn seed_categories(store: &impl DocumentStore) {
    for (code, label) in [("RD", "Roads"), ("AQ", "Aqueducts"), ("PK", "Parks")] {
        store
            .insert("categories", doc(json!({"code": code, "label": label})))
            .unwrap();
    }
}

#[test]
fn explicit_sort_orders_results() {
    let (_, repo) = repository();
    for (label, year) in [("mid", 2022), ("new", 2024), ("old", 2020)] {
        repo.save(&doc(json!({"label": label, "year": year})), &SaveOptions::new())
            .unwrap();
    }

    let by_year = repo
        .find_all(&FindOptions::new().with_order_by(vec![OrderBy::desc("year")]))
        .unwrap();
    let labels: Vec<&str> = by_year.iter().map(|d| d.get_str("label").unwrap()).collect();
    assert_eq!(labels, vec!["new", "mid", "old"]);
}

#[test]
fn lookup_sort_orders_by_joined_label() {
    let (store, repo) = repository();
    seed_categories(store.as_ref());

    for (label, code) in [("on-roads", "RD"), ("on-parks", "PK"), ("on-aqueducts", "AQ")] {
        repo.save(
            &doc(json!({"label": label, "category_code": code})),
            &SaveOptions::new(),
        )
        .unwrap();
    }

    // Sorting on "category" resolves each record's code against the
    // categories collection and orders by the human-readable label:
    // Aqueducts < Parks < Roads.
    let sorted = repo
        .find_all(&FindOptions::new().with_order_by(vec![OrderBy::asc("category")]))
        .unwrap();
    let labels: Vec<&str> = sorted.iter().map(|d| d.get_str("label").unwrap()).collect();
    assert_eq!(labels, vec!["on-aqueducts", "on-parks", "on-roads"]);

    // The joined label never leaks into the results.
    assert!(sorted.iter().all(|d| d.get("category").is_none()));
}

#[test]
fn lookup_sort_paginates_consistently() {
    let (store, repo) = repository();
    seed_categories(store.as_ref());

    for (label, code) in [("r", "RD"), ("p", "PK"), ("a", "AQ")] {
        repo.save(
            &doc(json!({"label": label, "category_code": code})),
            &SaveOptions::new(),
        )
        .unwrap();
    }

    let page = repo
        .find_paginated(
            &FindPaginated::new(
                FindOptions::new().with_order_by(vec![OrderBy::asc("category")]),
            )
            .with_offset(1)
            .with_limit(1),
        )
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].get_str("label"), Some("p"));
    assert_eq!(page.paging.total_count, 3);
}

#[test]
fn records_missing_the_lookup_reference_sort_last() {
    let (store, repo) = repository();
    seed_categories(store.as_ref());

    repo.save(
        &doc(json!({"label": "categorized", "category_code": "AQ"})),
        &SaveOptions::new(),
    )
    .unwrap();
    repo.save(&doc(json!({"label": "uncategorized"})), &SaveOptions::new())
        .unwrap();

    let sorted = repo
        .find_all(&FindOptions::new().with_order_by(vec![OrderBy::asc("category")]))
        .unwrap();
    assert_eq!(sorted[0].get_str("label"), Some("categorized"));
    assert_eq!(sorted[1].get_str("label"), Some("uncategorized"));
}

#[test]
fn expansion_embeds_the_related_record() {
    let (store, repo) = repository();
    seed_categories(store.as_ref());

    let saved = repo
        .save(
            &doc(json!({"label": "expandable", "category_code": "RD"})),
            &SaveOptions::new(),
        )
        .unwrap();

    let expanded = repo
        .find_by_id(saved.get_str("id").unwrap(), &["category".to_string()])
        .unwrap()
        .unwrap();
    assert_eq!(
        expanded.get_path("category.label"),
        Some(&json!("Roads"))
    );
    // The embedded record is normalized like everything else.
    assert!(expanded.get_path("category.id").is_some());
    assert!(expanded.get_path("category._id").is_none());
}

#[test]
fn unknown_expansion_names_are_ignored() {
    let (_, repo) = repository();
    let saved = repo
        .save(&doc(json!({"label": "plain"})), &SaveOptions::new())
        .unwrap();

    let read = repo
        .find_by_id(saved.get_str("id").unwrap(), &["no_such_relation".to_string()])
        .unwrap()
        .unwrap();
    assert_eq!(read.get_str("label"), Some("plain"));
}

#[test]
fn projection_restricts_returned_fields() {
    let (_, repo) = repository();
    repo.save(
        &doc(json!({"label": "projected", "status": "active", "year": 2024})),
        &SaveOptions::new(),
    )
    .unwrap();

    let found = repo
        .find_all(&FindOptions::new().with_fields(vec!["label".to_string()]))
        .unwrap();
    assert_eq!(found[0].get_str("label"), Some("projected"));
    assert!(found[0].get("status").is_none());
    assert!(found[0].get("year").is_none());
    // The identifier always survives projection.
    assert!(found[0].get_str("id").is_some());
}
