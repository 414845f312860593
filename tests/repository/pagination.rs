//! Pagination Tests
//!
//! Tests for paginated reads:
//! - Defaults applied when offset/limit are absent
//! - total_count independent of the page size
//! - Shape guards rejected before any store call

use crate::support::{doc, repository};
use serde_json::json;
use tabula::query::DEFAULT_LIMIT;
use tabula::{Criteria, Error, FindOptions, FindPaginated, SaveOptions};

#[test]
fn defaults_apply_when_no_offset_or_limit_given() {
    let (_, repo) = repository();
    for i in 0..3 {
        repo.save(&doc(json!({"label": format!("i{i}")})), &SaveOptions::new())
            .unwrap();
    }

    let page = repo
        .find_paginated(&FindPaginated::new(FindOptions::new()))
        .unwrap();
    assert_eq!(page.paging.limit, DEFAULT_LIMIT);
    assert_eq!(page.paging.offset, 0);
    assert_eq!(page.paging.total_count, 3);
    assert_eq!(page.paging.item_count, 3);
    assert_eq!(page.items.len(), 3);
}

#[test]
fn total_count_is_independent_of_item_count() {
    let (_, repo) = repository();
    for i in 0..3 {
        repo.save(&doc(json!({"label": format!("i{i}")})), &SaveOptions::new())
            .unwrap();
    }

    let page = repo
        .find_paginated(&FindPaginated::new(FindOptions::new()).with_limit(1))
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.paging.item_count, 1);
    assert_eq!(page.paging.total_count, 3);
}

#[test]
fn offset_walks_through_the_result_set() {
    let (_, repo) = repository();
    for i in 0..5 {
        repo.save(
            &doc(json!({"label": format!("i{i}"), "rank": i})),
            &SaveOptions::new(),
        )
        .unwrap();
    }

    let mut seen = Vec::new();
    for offset in 0..5 {
        let page = repo
            .find_paginated(
                &FindPaginated::new(
                    FindOptions::new()
                        .with_order_by(vec![tabula::OrderBy::asc("rank")]),
                )
                .with_offset(offset)
                .with_limit(1),
            )
            .unwrap();
        assert_eq!(page.items.len(), 1);
        seen.push(page.items[0].get_str("label").unwrap().to_string());
    }
    assert_eq!(seen, vec!["i0", "i1", "i2", "i3", "i4"]);
}

#[test]
fn offset_past_the_end_yields_an_empty_page_with_full_total() {
    let (_, repo) = repository();
    for i in 0..3 {
        repo.save(&doc(json!({"label": format!("i{i}")})), &SaveOptions::new())
            .unwrap();
    }

    let page = repo
        .find_paginated(&FindPaginated::new(FindOptions::new()).with_offset(10))
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.paging.item_count, 0);
    assert_eq!(page.paging.total_count, 3);
}

#[test]
fn zero_limit_is_rejected_before_the_store_is_touched() {
    let (_, repo) = repository();
    let err = repo
        .find_paginated(&FindPaginated::new(FindOptions::new()).with_limit(0))
        .unwrap_err();
    match err {
        Error::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].code, "invalidLimit");
        }
        other => panic!("expected a validation error, got {other}"),
    }
}

#[test]
fn criteria_apply_to_both_the_page_and_the_count() {
    let (_, repo) = repository();
    for (label, status) in [("a", "active"), ("b", "active"), ("c", "done")] {
        repo.save(
            &doc(json!({"label": label, "status": status})),
            &SaveOptions::new(),
        )
        .unwrap();
    }

    let page = repo
        .find_paginated(
            &FindPaginated::new(
                FindOptions::new()
                    .with_criteria(Criteria::new().with("status", json!("active"))),
            )
            .with_limit(1),
        )
        .unwrap();
    assert_eq!(page.paging.total_count, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].get_str("status"), Some("active"));
}

#[test]
fn unknown_criteria_keys_do_not_narrow_the_page() {
    let (_, repo) = repository();
    for i in 0..2 {
        repo.save(&doc(json!({"label": format!("i{i}")})), &SaveOptions::new())
            .unwrap();
    }

    let page = repo
        .find_paginated(&FindPaginated::new(
            FindOptions::new()
                .with_criteria(Criteria::new().with("no_such_field", json!("whatever"))),
        ))
        .unwrap();
    assert_eq!(page.paging.total_count, 2);
}
