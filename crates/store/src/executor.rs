//! Result shaping for `find`
//!
//! The store collects matching documents under the collection's read lock;
//! this module applies the rest of a `FindSpec` outside it: multi-field
//! sort with per-field direction, skip/limit, and the projection whitelist.
//!
//! # Sort policy
//!
//! - Each `OrderBy` pair is applied in turn; ties fall through to the next.
//! - Documents missing a sort field order AFTER documents that have it,
//!   regardless of direction. Pagination over a partially-populated field
//!   stays deterministic this way.
//! - The final tie-break is the native identifier, ascending, so equal-key
//!   documents keep a stable order across calls.

use smallvec::SmallVec;
use std::cmp::Ordering;
use tabula_core::{compare_values, Direction, Document, FindSpec, NATIVE_ID_FIELD};

/// Apply sort, skip/limit, and projection to filtered documents
pub fn shape(mut docs: Vec<Document>, spec: &FindSpec) -> Vec<Document> {
    if !spec.sort.is_empty() {
        sort_documents(&mut docs, spec);
    }

    let skip = spec.skip.unwrap_or(0) as usize;
    let docs: Vec<Document> = match spec.limit {
        Some(limit) => docs.into_iter().skip(skip).take(limit as usize).collect(),
        None => docs.into_iter().skip(skip).collect(),
    };

    match &spec.projection {
        Some(fields) => docs.into_iter().map(|d| project(d, fields)).collect(),
        None => docs,
    }
}

fn sort_documents(docs: &mut [Document], spec: &FindSpec) {
    // Precompute sort keys once per document; comparing by re-walking paths
    // is quadratic in comparisons otherwise.
    let mut keyed: Vec<(SmallVec<[Option<serde_json::Value>; 4]>, usize)> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let keys = spec
                .sort
                .iter()
                .map(|o| doc.get_path(&o.field).cloned())
                .collect();
            (keys, i)
        })
        .collect();

    keyed.sort_by(|(a_keys, a_idx), (b_keys, b_idx)| {
        for (pair_idx, order) in spec.sort.iter().enumerate() {
            let ord = compare_keys(&a_keys[pair_idx], &b_keys[pair_idx], order.direction);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        id_string(&docs[*a_idx]).cmp(&id_string(&docs[*b_idx]))
    });

    let order: Vec<usize> = keyed.into_iter().map(|(_, i)| i).collect();
    apply_permutation(docs, order);
}

fn compare_keys(
    a: &Option<serde_json::Value>,
    b: &Option<serde_json::Value>,
    direction: Direction,
) -> Ordering {
    match (a, b) {
        (Some(av), Some(bv)) => {
            let ord = compare_values(av, bv).unwrap_or(Ordering::Equal);
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        }
        // Missing fields order last regardless of direction
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn id_string(doc: &Document) -> String {
    doc.get_str(NATIVE_ID_FIELD).unwrap_or_default().to_string()
}

fn apply_permutation(docs: &mut [Document], order: Vec<usize>) {
    let mut reordered: Vec<Document> = order
        .into_iter()
        .map(|i| std::mem::take(&mut docs[i]))
        .collect();
    for (slot, doc) in docs.iter_mut().zip(reordered.drain(..)) {
        *slot = doc;
    }
}

/// Keep only whitelisted top-level fields; the native identifier survives
/// every projection
fn project(doc: Document, fields: &[String]) -> Document {
    let mut projected = Document::new();
    for (key, value) in &doc {
        let keep = key == NATIVE_ID_FIELD
            || fields
                .iter()
                .any(|f| f == key || f.split('.').next() == Some(key.as_str()));
        if keep {
            projected.set(key.clone(), value.clone());
        }
    }
    projected
}
