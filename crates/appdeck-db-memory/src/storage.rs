use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use appdeck_core::{EntityKind, generate_id};
use appdeck_storage::{
    Criteria, EntityRef, EntityStorage, SearchResult, StorageError, StoredEntity, Transaction,
};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::snapshot::Snapshot;
use crate::tables::{Tables, require_id, with_id};
use crate::transaction::MemoryTransaction;

/// State shared between the storage handle and its open transactions.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) tables: RwLock<Tables>,
    version_counter: AtomicU64,
}

impl Shared {
    /// Generates the next version ID.
    pub(crate) fn next_version(&self) -> String {
        self.version_counter
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
    }

    /// Builds a fresh row for `create`, generating an id when absent.
    pub(crate) fn new_row(&self, kind: EntityKind, data: &Value) -> Result<StoredEntity, StorageError> {
        let id = data
            .get("id")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(generate_id);
        let data = with_id(data, &id)?;
        Ok(StoredEntity::new(kind, id, self.next_version(), data))
    }

    /// Builds the replacement row for `update`.
    pub(crate) fn next_row(&self, kind: EntityKind, data: &Value) -> Result<StoredEntity, StorageError> {
        let id = require_id(data)?;
        let data = with_id(data, &id)?;
        Ok(StoredEntity::new(kind, id, self.next_version(), data))
    }
}

/// In-memory entity storage backend.
///
/// This storage implementation provides:
/// - One insertion-ordered table per entity kind behind a single `RwLock`
/// - Unique-field constraints and cascading deletes from the kind schema
/// - Transactions working on a private copy, validated and swapped in
///   atomically on commit
/// - JSON snapshots for persistence between process runs
#[derive(Debug, Clone)]
pub struct InMemoryStorage {
    pub(crate) shared: Arc<Shared>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    pub fn new() -> Self {
        Self::from_tables(Tables::default(), 1)
    }

    fn from_tables(tables: Tables, next_version: u64) -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: RwLock::new(tables),
                version_counter: AtomicU64::new(next_version),
            }),
        }
    }

    /// Restores a storage from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StorageError> {
        let mut tables = Tables::default();
        for entity in snapshot.entities {
            tables.insert(entity)?;
        }
        Ok(Self::from_tables(tables, snapshot.next_version.max(1)))
    }

    /// Captures every row, in insertion order per kind.
    pub async fn snapshot(&self) -> Snapshot {
        let tables = self.shared.tables.read().await;
        Snapshot {
            next_version: self.shared.version_counter.load(Ordering::SeqCst),
            entities: tables.rows().cloned().collect(),
        }
    }

    /// Number of rows of a kind.
    pub async fn count(&self, kind: EntityKind) -> usize {
        self.shared.tables.read().await.len(kind)
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStorage for InMemoryStorage {
    async fn create(&self, kind: EntityKind, data: &Value) -> Result<StoredEntity, StorageError> {
        let stored = self.shared.new_row(kind, data)?;
        self.shared.tables.write().await.insert(stored.clone())?;
        debug!(kind = %kind, id = %stored.id, "Created entity");
        Ok(stored)
    }

    async fn read(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<StoredEntity>, StorageError> {
        Ok(self.shared.tables.read().await.get(kind, id).cloned())
    }

    async fn update(
        &self,
        kind: EntityKind,
        data: &Value,
        if_match: Option<&str>,
    ) -> Result<StoredEntity, StorageError> {
        let next = self.shared.next_row(kind, data)?;
        let stored = self.shared.tables.write().await.replace(next, if_match)?;
        debug!(kind = %kind, id = %stored.id, "Updated entity");
        Ok(stored)
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<Vec<EntityRef>, StorageError> {
        let removed = self.shared.tables.write().await.remove_cascade(kind, id)?;
        debug!(kind = %kind, id = %id, removed = removed.len(), "Deleted entity");
        Ok(removed)
    }

    async fn search(
        &self,
        kind: EntityKind,
        criteria: &Criteria,
    ) -> Result<SearchResult, StorageError> {
        Ok(self.shared.tables.read().await.search(kind, criteria))
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>, StorageError> {
        let working = self.shared.tables.read().await.clone();
        Ok(Box::new(MemoryTransaction::new(
            self.shared.clone(),
            working,
        )))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
