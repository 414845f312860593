//! In-memory document store
//!
//! `MemoryStore` is the reference implementation of the `DocumentStore`
//! driver contract:
//!
//! - DashMap of collections: reads on different collections never contend
//! - one `RwLock` per collection: mutations of a collection serialize,
//!   which is exactly the document-atomicity `update_where` and
//!   `find_and_modify` promise
//! - a store-global `AtomicU64` write version stamped on every mutation

use crate::collection::{Collection, VersionedDocument};
use crate::executor;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tabula_core::{
    BulkInsertResult, Document, DocumentId, DocumentStore, Error, Filter, FindSpec, Result,
    Update, ValidationError,
};
use tracing::{debug, trace};

/// In-memory, thread-safe document store
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, Arc<Collection>>,
    version: AtomicU64,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current global write version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn collection(&self, name: &str) -> Arc<Collection> {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Collection::new()))
            .clone()
    }

    fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Insert under an already-held write lock; shared by `insert` and
    /// `insert_many`
    fn insert_locked(
        data: &mut rustc_hash::FxHashMap<DocumentId, VersionedDocument>,
        mut document: Document,
        version: u64,
    ) -> std::result::Result<Document, ValidationError> {
        let id = match document.id() {
            Some(id) => id,
            None => {
                let id = DocumentId::new();
                document.set_id(id);
                id
            }
        };
        if data.contains_key(&id) {
            return Err(ValidationError::new(
                id.to_string(),
                "duplicateIdentifier",
                format!("a document with identifier {id} already exists"),
            ));
        }
        data.insert(
            id,
            VersionedDocument {
                document: document.clone(),
                version,
                timestamp: Self::now_millis(),
            },
        );
        Ok(document)
    }
}

impl DocumentStore for MemoryStore {
    fn find(&self, collection: &str, spec: &FindSpec) -> Result<Vec<Document>> {
        let Some(coll) = self.collections.get(collection).map(|c| c.value().clone()) else {
            return Ok(Vec::new());
        };
        let matching: Vec<Document> = {
            let data = coll.data.read();
            data.values()
                .filter(|vd| spec.filter.matches(&vd.document))
                .map(|vd| vd.document.clone())
                .collect()
        };
        trace!(collection, matched = matching.len(), "find");
        Ok(executor::shape(matching, spec))
    }

    fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        let Some(coll) = self.collections.get(collection).map(|c| c.value().clone()) else {
            return Ok(None);
        };
        let data = coll.data.read();
        Ok(data
            .values()
            .find(|vd| filter.matches(&vd.document))
            .map(|vd| vd.document.clone()))
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let Some(coll) = self.collections.get(collection).map(|c| c.value().clone()) else {
            return Ok(0);
        };
        let data = coll.data.read();
        Ok(data.values().filter(|vd| filter.matches(&vd.document)).count() as u64)
    }

    fn insert(&self, collection: &str, document: Document) -> Result<Document> {
        let coll = self.collection(collection);
        let version = self.next_version();
        let mut data = coll.data.write();
        Self::insert_locked(&mut data, document, version)
            .map_err(|e| Error::InvalidOperation(e.message))
    }

    fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<BulkInsertResult> {
        let coll = self.collection(collection);
        let mut result = BulkInsertResult::default();
        let mut data = coll.data.write();
        for (position, document) in documents.into_iter().enumerate() {
            let version = self.next_version();
            match Self::insert_locked(&mut data, document, version) {
                Ok(doc) => result.inserted.push(doc),
                Err(failure) => {
                    debug!(collection, position, code = %failure.code, "bulk insert failure");
                    result.failures.push((position, failure));
                }
            }
        }
        Ok(result)
    }

    fn update_where(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>> {
        let coll = self.collection(collection);
        let version = self.next_version();
        let mut data = coll.data.write();

        let Some(id) = data
            .iter()
            .find(|(_, vd)| filter.matches(&vd.document))
            .map(|(id, _)| *id)
        else {
            return Ok(None);
        };

        let entry = data
            .get_mut(&id)
            .ok_or_else(|| Error::Storage {
                message: format!("document {id} vanished during update"),
            })?;
        update.apply(&mut entry.document);
        entry.version = version;
        entry.timestamp = Self::now_millis();
        Ok(Some(entry.document.clone()))
    }

    fn find_and_modify(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<Option<Document>> {
        let coll = self.collection(collection);
        let version = self.next_version();
        let mut data = coll.data.write();

        let existing = data
            .iter()
            .find(|(_, vd)| filter.matches(&vd.document))
            .map(|(id, _)| *id);

        match existing {
            Some(id) => {
                let entry = data.get_mut(&id).ok_or_else(|| Error::Storage {
                    message: format!("document {id} vanished during update"),
                })?;
                update.apply(&mut entry.document);
                entry.version = version;
                entry.timestamp = Self::now_millis();
                Ok(Some(entry.document.clone()))
            }
            None if upsert => {
                // Seed the fresh document from the filter's equality fields,
                // then apply the update: first allocation for a new key and
                // the steady-state path are one operation.
                let mut document = Document::new();
                for (field, value) in filter.equality_fields() {
                    document.set(field, value);
                }
                update.apply_for_insert(&mut document);
                let inserted = Self::insert_locked(&mut data, document, version)
                    .map_err(|e| Error::InvalidOperation(e.message))?;
                debug!(collection, "find_and_modify upserted");
                Ok(Some(inserted))
            }
            None => Ok(None),
        }
    }

    fn delete_where(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let Some(coll) = self.collections.get(collection).map(|c| c.value().clone()) else {
            return Ok(0);
        };
        let mut data = coll.data.write();
        let doomed: Vec<DocumentId> = data
            .iter()
            .filter(|(_, vd)| filter.matches(&vd.document))
            .map(|(id, _)| *id)
            .collect();
        for id in &doomed {
            data.remove(id);
        }
        debug!(collection, deleted = doomed.len(), "delete_where");
        Ok(doomed.len() as u64)
    }
}
