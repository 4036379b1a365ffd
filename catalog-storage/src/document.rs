//! Document store abstraction and in-memory implementation.
//!
//! One collection per [`EntityType`], documents keyed by their `_id`. The
//! store is the authoritative record; every cache entry is derived from it.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use catalog_core::{CatalogEntity, EntityType, StorageError};
use serde_json::Value;

use crate::filter::{Filter, UpdateOp};

/// Result type for document store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// The authoritative record store.
///
/// Methods are generic over the entity type, which selects the collection.
/// Return values model acknowledgement: `insert` reports whether the write
/// was acknowledged, `replace`/`delete`/`find_one_and_update` return `None`
/// when no document with that id exists.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Insert a new document. Returns `false` if the write was not acknowledged
    /// (for example because the id is already taken).
    async fn insert<D: CatalogEntity>(&self, doc: &D) -> StorageResult<bool>;

    /// Fetch a single document by id.
    async fn find_one<D: CatalogEntity>(&self, id: &str) -> StorageResult<Option<D>>;

    /// Fetch every document matching `filter`, ordered by id.
    async fn find<D: CatalogEntity>(&self, filter: &Filter) -> StorageResult<Vec<D>>;

    /// Count documents matching `filter`.
    async fn count<D: CatalogEntity>(&self, filter: &Filter) -> StorageResult<u64> {
        Ok(self.find::<D>(filter).await?.len() as u64)
    }

    /// Replace the document with the same id, returning the stored result.
    async fn replace<D: CatalogEntity>(&self, doc: &D) -> StorageResult<Option<D>>;

    /// Delete by id, returning the removed document.
    async fn delete<D: CatalogEntity>(&self, id: &str) -> StorageResult<Option<D>>;

    /// Apply `op` to every document matching `filter`. Returns the number of
    /// documents actually modified.
    async fn update_many<D: CatalogEntity>(
        &self,
        filter: &Filter,
        op: &UpdateOp,
    ) -> StorageResult<u64>;

    /// Apply `op` to the document with `id` and return it after the update.
    async fn find_one_and_update<D: CatalogEntity>(
        &self,
        id: &str,
        op: &UpdateOp,
    ) -> StorageResult<Option<D>>;
}

type Collection = BTreeMap<String, Value>;

/// In-memory document store.
///
/// Documents are held in their JSON form so filters and update operators
/// behave the same for every collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<EntityType, Collection>>>,
}

fn encode<D: CatalogEntity>(doc: &D) -> StorageResult<Value> {
    serde_json::to_value(doc).map_err(|e| StorageError::Codec {
        entity_type: D::entity_type(),
        reason: e.to_string(),
    })
}

fn decode<D: CatalogEntity>(value: Value) -> StorageResult<D> {
    serde_json::from_value(value).map_err(|e| StorageError::Codec {
        entity_type: D::entity_type(),
        reason: e.to_string(),
    })
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in the collection for `entity_type`.
    pub fn len(&self, entity_type: EntityType) -> StorageResult<usize> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(collections.get(&entity_type).map_or(0, BTreeMap::len))
    }

    /// Drop every document in every collection.
    pub fn clear(&self) -> StorageResult<()> {
        self.collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .clear();
        Ok(())
    }

    /// Store a raw document without going through entity encoding.
    ///
    /// Lets tests seed states the typed API refuses to produce, such as a
    /// dangling reference left behind by an interrupted cascade.
    pub fn insert_raw(&self, entity_type: EntityType, doc: Value) -> StorageResult<()> {
        let id = doc
            .get(catalog_core::fields::ID)
            .and_then(Value::as_str)
            .ok_or_else(|| StorageError::Codec {
                entity_type,
                reason: "document has no string _id".to_string(),
            })?
            .to_string();
        self.collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .entry(entity_type)
            .or_default()
            .insert(id, doc);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert<D: CatalogEntity>(&self, doc: &D) -> StorageResult<bool> {
        let value = encode(doc)?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let collection = collections.entry(D::entity_type()).or_default();
        if collection.contains_key(doc.entity_id()) {
            return Ok(false);
        }
        collection.insert(doc.entity_id().to_string(), value);
        Ok(true)
    }

    async fn find_one<D: CatalogEntity>(&self, id: &str) -> StorageResult<Option<D>> {
        let value = {
            let collections = self
                .collections
                .read()
                .map_err(|_| StorageError::LockPoisoned)?;
            collections
                .get(&D::entity_type())
                .and_then(|c| c.get(id))
                .cloned()
        };
        value.map(decode).transpose()
    }

    async fn find<D: CatalogEntity>(&self, filter: &Filter) -> StorageResult<Vec<D>> {
        let matching: Vec<Value> = {
            let collections = self
                .collections
                .read()
                .map_err(|_| StorageError::LockPoisoned)?;
            collections
                .get(&D::entity_type())
                .map(|c| c.values().filter(|doc| filter.matches(doc)).cloned().collect())
                .unwrap_or_default()
        };
        matching.into_iter().map(decode).collect()
    }

    async fn replace<D: CatalogEntity>(&self, doc: &D) -> StorageResult<Option<D>> {
        let value = encode(doc)?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let Some(slot) = collections
            .get_mut(&D::entity_type())
            .and_then(|c| c.get_mut(doc.entity_id()))
        else {
            return Ok(None);
        };
        *slot = value.clone();
        drop(collections);
        decode(value).map(Some)
    }

    async fn delete<D: CatalogEntity>(&self, id: &str) -> StorageResult<Option<D>> {
        let removed = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .get_mut(&D::entity_type())
            .and_then(|c| c.remove(id));
        removed.map(decode).transpose()
    }

    async fn update_many<D: CatalogEntity>(
        &self,
        filter: &Filter,
        op: &UpdateOp,
    ) -> StorageResult<u64> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let Some(collection) = collections.get_mut(&D::entity_type()) else {
            return Ok(0);
        };
        let mut modified = 0u64;
        for doc in collection.values_mut() {
            if filter.matches(doc) && op.apply(doc) {
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn find_one_and_update<D: CatalogEntity>(
        &self,
        id: &str,
        op: &UpdateOp,
    ) -> StorageResult<Option<D>> {
        let updated = {
            let mut collections = self
                .collections
                .write()
                .map_err(|_| StorageError::LockPoisoned)?;
            collections
                .get_mut(&D::entity_type())
                .and_then(|c| c.get_mut(id))
                .map(|doc| {
                    op.apply(doc);
                    doc.clone()
                })
        };
        updated.map(decode).transpose()
    }
}
