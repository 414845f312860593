//! Generic repository
//!
//! A `Repository<M>` is a stateless facade orchestrating
//! create/update/delete/find/paginate/count/bulk-upsert over one
//! collection. It consumes the entity model's match builder for filters,
//! normalizes identifiers at the boundary, stamps audit trails when the
//! model opts in, and invokes the history hook after mutations.
//!
//! # Consistency
//!
//! Each call is independent; the repository holds no state between calls
//! and does not serialize concurrent callers. `find_paginated` reads the
//! page and the total count in two separate store calls, so the total can
//! be stale relative to the page under concurrent writes — an accepted
//! trade-off of the driver contract.

use crate::audit::{Audit, AUDIT_FIELD};
use crate::history::{HistoryHook, HistoryOperation, HistoryOptions};
use crate::model::{EntityModel, SortLookup};
use crate::normalize::{to_native, to_public};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tabula_core::{
    compare_values, Direction, Document, DocumentStore, Error, Filter, FindSpec, OrderBy,
    Result, Update, ValidationError, NATIVE_ID_FIELD,
};
use tabula_query::{FindOptions, FindPaginated, Paging};
use tracing::warn;

/// Context for a save: who is acting, and what the history entry says
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Actor recorded in audit trails
    pub actor: Option<String>,
    /// Context passed to the history hook
    pub history: HistoryOptions,
}

impl SaveOptions {
    /// Options with no actor and empty history context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `actor` in audit trails
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// One page of results plus its paging metadata
#[derive(Debug)]
pub struct Page {
    /// The page of normalized entities
    pub items: Vec<Document>,
    /// Paging metadata; `total_count` may be stale relative to `items`
    pub paging: Paging,
}

/// One group of a `count_by` aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCount {
    /// The grouping field's value for this group (Null groups the records
    /// missing the field)
    pub id: Value,
    /// Number of matching records in the group
    pub count: u64,
}

/// Outcome of a bulk save: partial-success semantics
///
/// Callers must inspect both sides; a non-empty `validation_errors` does
/// NOT mean nothing was saved.
#[derive(Debug, Default)]
pub struct BulkSaveResult {
    /// Saved entities, in the caller's input order
    pub saved_objects: Vec<Document>,
    /// Per-record failures that did not abort the batch
    pub validation_errors: Vec<ValidationError>,
}

/// Stateless facade over one collection
pub struct Repository<M: EntityModel> {
    store: Arc<dyn DocumentStore>,
    model: M,
    history: Option<Arc<dyn HistoryHook>>,
}

impl<M: EntityModel> Repository<M> {
    /// Create a repository for `model` over `store`
    pub fn new(store: Arc<dyn DocumentStore>, model: M) -> Self {
        Self {
            store,
            model,
            history: None,
        }
    }

    /// Install a history hook
    pub fn with_history(mut self, hook: Arc<dyn HistoryHook>) -> Self {
        self.history = Some(hook);
        self
    }

    /// The entity model this repository serves
    pub fn model(&self) -> &M {
        &self.model
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Fetch one entity by its public identifier
    ///
    /// Absence — including an identifier that does not parse — is
    /// `Ok(None)`, never an error.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store fails.
    pub fn find_by_id(&self, id: &str, expand: &[String]) -> Result<Option<Document>> {
        let filter = self.model.identifier_filter(id);
        match self.store.find_one(self.model.collection(), &filter)? {
            Some(doc) => Ok(Some(self.expand_document(to_public(doc), expand)?)),
            None => Ok(None),
        }
    }

    /// Fetch every entity matching the options, unbounded
    ///
    /// Pagination is structurally absent here; this is the internal
    /// aggregation read, not a paginated endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub fn find_all(&self, options: &FindOptions) -> Result<Vec<Document>> {
        let filter = self.build_filter(options);
        let order = self.effective_order(options);

        let items = if self.order_requires_lookup(&order) {
            self.read_with_lookup_sort(&filter, &order, options, 0, None)?
        } else {
            let mut spec = FindSpec::filtered(filter).with_sort(order);
            if !options.fields.is_empty() {
                spec = spec.with_projection(options.fields.clone());
            }
            self.store.find(self.model.collection(), &spec)?
        };

        items
            .into_iter()
            .map(|doc| self.expand_document(to_public(doc), &options.expand))
            .collect()
    }

    /// Fetch one page of entities plus paging metadata
    ///
    /// The page and the total count are two separate store reads; the
    /// count can be stale relative to the page under concurrent writes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the request fails its shape
    /// guards, or a storage error.
    pub fn find_paginated(&self, request: &FindPaginated) -> Result<Page> {
        request.validate()?;
        let options = &request.options;
        let filter = self.build_filter(options);
        let order = self.effective_order(options);
        let offset = request.offset();
        let limit = request.limit();

        let items = if self.order_requires_lookup(&order) {
            self.read_with_lookup_sort(&filter, &order, options, offset, Some(limit))?
        } else {
            let mut spec = FindSpec::filtered(filter.clone())
                .with_sort(order)
                .with_skip(offset)
                .with_limit(limit);
            if !options.fields.is_empty() {
                spec = spec.with_projection(options.fields.clone());
            }
            self.store.find(self.model.collection(), &spec)?
        };

        let total_count = self.store.count(self.model.collection(), &filter)?;

        let mut public = Vec::with_capacity(items.len());
        for item in items {
            public.push(self.expand_document(to_public(item), &options.expand)?);
        }

        Ok(Page {
            paging: Paging {
                limit,
                offset,
                total_count,
                item_count: public.len() as u64,
            },
            items: public,
        })
    }

    /// Count entities matching the options
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub fn count(&self, options: &FindOptions) -> Result<u64> {
        let filter = self.build_filter(options);
        self.store.count(self.model.collection(), &filter)
    }

    /// Group matching entities by the options' grouping field
    ///
    /// No grouping field requested is an explicit no-op: the result is an
    /// empty list, not an error. Records missing the field group under
    /// Null. Groups come back largest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub fn count_by(&self, options: &FindOptions) -> Result<Vec<GroupCount>> {
        let Some(group_field) = options.group_by.as_deref() else {
            return Ok(Vec::new());
        };
        let filter = self.build_filter(options);
        let docs = self
            .store
            .find(self.model.collection(), &FindSpec::filtered(filter))?;

        let mut groups: BTreeMap<String, (Value, u64)> = BTreeMap::new();
        for doc in &docs {
            let value = doc.get_path(group_field).cloned().unwrap_or(Value::Null);
            groups.entry(value.to_string()).or_insert((value, 0)).1 += 1;
        }

        let mut out: Vec<GroupCount> = groups
            .into_values()
            .map(|(id, count)| GroupCount { id, count })
            .collect();
        out.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
        });
        Ok(out)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create or update one entity
    ///
    /// Identity comes from the model's `object_identifier`: when it names
    /// an existing record, the record is updated with merge semantics
    /// (arrays replaced wholesale, objects deep-merged); otherwise a new
    /// record is created. The persisted record is re-read before being
    /// returned, so server-side defaults and derived fields are reflected.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub fn save(&self, entity: &Document, options: &SaveOptions) -> Result<Document> {
        let native = to_native(entity.clone());
        let existing = match self.model.object_identifier(entity) {
            Some(identifier) => self
                .store
                .find_one(self.model.collection(), &self.model.identifier_filter(&identifier))?,
            None => None,
        };

        match existing {
            Some(previous) => self.update_existing(previous, native, options),
            None => self.create(native, options),
        }
    }

    /// Create or update a batch of entities, partial-success semantics
    ///
    /// Existing records (by identifier lookup) are updated individually;
    /// new records go through a single unordered bulk insert. A record
    /// that fails validation or insertion is reported in
    /// `validation_errors` and never aborts the batch. Saved entities come
    /// back in the caller's input order; when two inputs resolve to the
    /// same identifier, the first occurrence wins the insert and the
    /// second is reported as a failure.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store as a whole fails.
    pub fn save_bulk(&self, entities: &[Document], options: &SaveOptions) -> Result<BulkSaveResult> {
        let mut slots: Vec<Option<Document>> = vec![None; entities.len()];
        let mut validation_errors = Vec::new();
        let mut to_insert: Vec<(usize, Document)> = Vec::new();

        for (position, entity) in entities.iter().enumerate() {
            let failures = self.model.validate(entity);
            if !failures.is_empty() {
                validation_errors.extend(failures);
                continue;
            }

            let native = to_native(entity.clone());
            let existing = match self.model.object_identifier(entity) {
                Some(identifier) => self
                    .store
                    .find_one(self.model.collection(), &self.model.identifier_filter(&identifier))?,
                None => None,
            };

            match existing {
                Some(previous) => {
                    slots[position] = Some(self.update_existing(previous, native, options)?);
                }
                None => {
                    let mut native = native;
                    if self.model.audited() {
                        native.set(AUDIT_FIELD, Audit::creation_value(options.actor.as_deref()));
                    }
                    to_insert.push((position, native));
                }
            }
        }

        let positions: Vec<usize> = to_insert.iter().map(|(p, _)| *p).collect();
        let batch: Vec<Document> = to_insert.into_iter().map(|(_, d)| d).collect();
        let bulk = self.store.insert_many(self.model.collection(), batch)?;

        let failed: HashMap<usize, ValidationError> = bulk.failures.into_iter().collect();
        let mut inserted = bulk.inserted.into_iter();
        for (batch_position, original_position) in positions.iter().enumerate() {
            if let Some(failure) = failed.get(&batch_position) {
                warn!(
                    collection = self.model.collection(),
                    position = *original_position,
                    code = %failure.code,
                    "bulk save record rejected"
                );
                validation_errors.push(failure.clone());
                continue;
            }
            let Some(doc) = inserted.next() else {
                return Err(Error::Storage {
                    message: "bulk insert returned fewer documents than expected".to_string(),
                });
            };
            self.record_history(HistoryOperation::Create, None, Some(&doc), &options.history);
            slots[*original_position] = Some(to_public(doc));
        }

        Ok(BulkSaveResult {
            saved_objects: slots.into_iter().flatten().collect(),
            validation_errors,
        })
    }

    /// Delete every entity matching the options, returning the count
    ///
    /// The matched records are loaded first: the model's `on_delete`
    /// extension point sees them before anything is removed (an error
    /// there aborts the delete), and the history hook sees each of them
    /// after.
    ///
    /// # Errors
    ///
    /// Returns the `on_delete` error unchanged, or a storage error.
    pub fn delete(&self, options: &FindOptions, history: &HistoryOptions) -> Result<u64> {
        let filter = self.build_filter(options);
        let matches = self
            .store
            .find(self.model.collection(), &FindSpec::filtered(filter.clone()))?;

        self.model.on_delete(&matches)?;
        let deleted = self.store.delete_where(self.model.collection(), &filter)?;

        for previous in &matches {
            self.record_history(HistoryOperation::Delete, Some(previous), None, history);
        }
        Ok(deleted)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn build_filter(&self, options: &FindOptions) -> Filter {
        self.model.match_builder().build(&options.criteria)
    }

    fn effective_order(&self, options: &FindOptions) -> Vec<OrderBy> {
        if options.order_by.is_empty() {
            self.model.default_order()
        } else {
            options.order_by.clone()
        }
    }

    fn order_requires_lookup(&self, order: &[OrderBy]) -> bool {
        order
            .iter()
            .any(|o| self.lookup_for(&o.field).is_some())
    }

    fn lookup_for(&self, field: &str) -> Option<&SortLookup> {
        self.model.sort_lookups().iter().find(|l| l.field == field)
    }

    /// The join-sort path: fetch all matches, resolve each lookup-backed
    /// sort key against its lookup collection, sort in the repository,
    /// then page. The joined labels live only in the sort keys, never in
    /// the documents, so nothing leaks to callers.
    fn read_with_lookup_sort(
        &self,
        filter: &Filter,
        order: &[OrderBy],
        options: &FindOptions,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Document>> {
        let docs = self
            .store
            .find(self.model.collection(), &FindSpec::filtered(filter.clone()))?;

        let mut keyed: Vec<(Vec<Option<Value>>, Document)> = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut keys = Vec::with_capacity(order.len());
            for entry in order {
                let key = match self.lookup_for(&entry.field) {
                    Some(lookup) => self.lookup_label(lookup, &doc)?,
                    None => doc.get_path(&entry.field).cloned(),
                };
                keys.push(key);
            }
            keyed.push((keys, doc));
        }

        keyed.sort_by(|(a_keys, a_doc), (b_keys, b_doc)| {
            for (i, entry) in order.iter().enumerate() {
                let ord = compare_sort_keys(&a_keys[i], &b_keys[i], entry.direction);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            native_id_string(a_doc).cmp(&native_id_string(b_doc))
        });

        let page = keyed
            .into_iter()
            .map(|(_, doc)| doc)
            .skip(offset as usize);
        let page: Vec<Document> = match limit {
            Some(limit) => page.take(limit as usize).collect(),
            None => page.collect(),
        };

        if options.fields.is_empty() {
            Ok(page)
        } else {
            Ok(page
                .into_iter()
                .map(|d| project_fields(d, &options.fields))
                .collect())
        }
    }

    fn lookup_label(&self, lookup: &SortLookup, doc: &Document) -> Result<Option<Value>> {
        let Some(reference) = doc.get(&lookup.local_field).cloned() else {
            return Ok(None);
        };
        Ok(self
            .store
            .find_one(
                &lookup.collection,
                &Filter::eq(&lookup.foreign_field, reference),
            )?
            .and_then(|record| record.get(&lookup.label_field).cloned()))
    }

    fn expand_document(&self, mut public: Document, requested: &[String]) -> Result<Document> {
        for name in requested {
            // Unknown expansion names are silently ignored, mirroring the
            // match builder's permissiveness toward unknown criteria.
            let Some(expansion) = self.model.expansions().iter().find(|e| &e.name == name)
            else {
                continue;
            };
            let Some(reference) = public.get(&expansion.local_field).cloned() else {
                continue;
            };
            if let Some(related) = self.store.find_one(
                &expansion.collection,
                &Filter::eq(&expansion.foreign_field, reference),
            )? {
                public.set(
                    expansion.target_field.clone(),
                    to_public(related).into_value(),
                );
            }
        }
        Ok(public)
    }

    fn update_existing(
        &self,
        previous: Document,
        native: Document,
        options: &SaveOptions,
    ) -> Result<Document> {
        let Some(id) = previous.id() else {
            return Err(Error::Storage {
                message: "stored record is missing its native identifier".to_string(),
            });
        };

        let mut update = Update::new().set_document(native);
        if self.model.audited() {
            let mut stamp = Document::new();
            stamp.set(
                AUDIT_FIELD,
                Audit::modification_value(options.actor.as_deref()),
            );
            update = update.set_document(stamp);
        }

        let written = self
            .store
            .update_where(self.model.collection(), &Filter::IdIn(vec![id]), &update)?;
        if written.is_none() {
            // The record vanished between lookup and update.
            return Err(Error::Storage {
                message: format!("record {id} disappeared during save"),
            });
        }

        let current = self
            .store
            .find_one(self.model.collection(), &Filter::IdIn(vec![id]))?
            .ok_or_else(|| Error::Storage {
                message: format!("record {id} disappeared after save"),
            })?;

        self.record_history(
            HistoryOperation::Update,
            Some(&previous),
            Some(&current),
            &options.history,
        );
        Ok(to_public(current))
    }

    fn create(&self, mut native: Document, options: &SaveOptions) -> Result<Document> {
        if self.model.audited() {
            native.set(AUDIT_FIELD, Audit::creation_value(options.actor.as_deref()));
        }

        let inserted = self.store.insert(self.model.collection(), native)?;
        let Some(id) = inserted.id() else {
            return Err(Error::Storage {
                message: "insert returned a record without an identifier".to_string(),
            });
        };

        // Re-read so the returned entity reflects the persisted state.
        let current = self
            .store
            .find_one(self.model.collection(), &Filter::IdIn(vec![id]))?
            .ok_or_else(|| Error::Storage {
                message: format!("record {id} disappeared after insert"),
            })?;

        self.record_history(
            HistoryOperation::Create,
            None,
            Some(&current),
            &options.history,
        );
        Ok(to_public(current))
    }

    fn record_history(
        &self,
        operation: HistoryOperation,
        previous: Option<&Document>,
        current: Option<&Document>,
        options: &HistoryOptions,
    ) {
        if let Some(hook) = &self.history {
            if let Err(e) = hook.record(operation, previous, current, options) {
                // Hook failures never roll back the primary write.
                warn!(
                    collection = self.model.collection(),
                    ?operation,
                    error = %e,
                    "history hook failed"
                );
            }
        }
    }
}

fn compare_sort_keys(a: &Option<Value>, b: &Option<Value>, direction: Direction) -> Ordering {
    match (a, b) {
        (Some(av), Some(bv)) => {
            let ord = compare_values(av, bv).unwrap_or(Ordering::Equal);
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn native_id_string(doc: &Document) -> String {
    doc.get_str(NATIVE_ID_FIELD).unwrap_or_default().to_string()
}

fn project_fields(doc: Document, fields: &[String]) -> Document {
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
