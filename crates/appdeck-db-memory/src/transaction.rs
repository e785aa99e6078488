//! Transactions for the in-memory backend.
//!
//! A transaction works on a private copy of the tables taken at begin, so it
//! reads its own writes and nobody else sees them. Every write is recorded.
//! On commit the log is replayed against a copy of the live tables under the
//! write lock; only if every step validates is the copy swapped in. A step
//! fails when a concurrent commit changed something this transaction relied
//! on: a taken id or unique value, a moved version, a different cascade.

use std::collections::HashSet;
use std::sync::Arc;

use appdeck_core::EntityKind;
use appdeck_storage::{
    Criteria, EntityRef, SearchResult, StorageError, StoredEntity, Transaction,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::storage::Shared;
use crate::tables::Tables;

/// A recorded write, replayed on commit.
#[derive(Debug, Clone)]
enum StagedOp {
    Create(StoredEntity),
    Update {
        entity: StoredEntity,
        expected_version: String,
    },
    Delete {
        kind: EntityKind,
        id: String,
        removed: Vec<EntityRef>,
    },
}

impl StagedOp {
    fn replay(&self, tables: &mut Tables) -> Result<(), StorageError> {
        match self {
            StagedOp::Create(entity) => tables.insert(entity.clone()),
            StagedOp::Update {
                entity,
                expected_version,
            } => tables
                .replace(entity.clone(), Some(expected_version))
                .map(|_| ()),
            StagedOp::Delete { kind, id, removed } => {
                let actual = tables.remove_cascade(*kind, id)?;
                let expected: HashSet<&EntityRef> = removed.iter().collect();
                if actual.len() != removed.len() || !actual.iter().all(|r| expected.contains(r)) {
                    return Err(StorageError::transaction_error(format!(
                        "rows depending on {kind}/{id} changed concurrently"
                    )));
                }
                Ok(())
            }
        }
    }
}

pub(crate) struct MemoryTransaction {
    shared: Arc<Shared>,
    working: Tables,
    log: Vec<StagedOp>,
}

impl MemoryTransaction {
    pub(crate) fn new(shared: Arc<Shared>, working: Tables) -> Self {
        Self {
            shared,
            working,
            log: Vec::new(),
        }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let MemoryTransaction { shared, log, .. } = *self;
        if log.is_empty() {
            return Ok(());
        }

        let mut live = shared.tables.write().await;
        let mut next = live.clone();
        for op in &log {
            op.replay(&mut next)?;
        }
        *live = next;

        debug!(operations = log.len(), "Committed memory transaction");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        debug!(operations = self.log.len(), "Rolled back memory transaction");
        Ok(())
    }

    async fn create(
        &mut self,
        kind: EntityKind,
        data: &Value,
    ) -> Result<StoredEntity, StorageError> {
        let stored = self.shared.new_row(kind, data)?;
        self.working.insert(stored.clone())?;
        self.log.push(StagedOp::Create(stored.clone()));
        Ok(stored)
    }

    async fn update(
        &mut self,
        kind: EntityKind,
        data: &Value,
    ) -> Result<StoredEntity, StorageError> {
        let next = self.shared.next_row(kind, data)?;
        let expected_version = self
            .working
            .get(kind, &next.id)
            .map(|row| row.version_id.clone())
            .ok_or_else(|| StorageError::not_found(kind, &next.id))?;

        let stored = self.working.replace(next, Some(&expected_version))?;
        self.log.push(StagedOp::Update {
            entity: stored.clone(),
            expected_version,
        });
        Ok(stored)
    }

    async fn delete(
        &mut self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Vec<EntityRef>, StorageError> {
        let removed = self.working.remove_cascade(kind, id)?;
        self.log.push(StagedOp::Delete {
            kind,
            id: id.to_string(),
            removed: removed.clone(),
        });
        Ok(removed)
    }

    async fn read(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<StoredEntity>, StorageError> {
        Ok(self.working.get(kind, id).cloned())
    }

    async fn search(
        &self,
        kind: EntityKind,
        criteria: &Criteria,
    ) -> Result<SearchResult, StorageError> {
        Ok(self.working.search(kind, criteria))
    }
}

impl std::fmt::Debug for MemoryTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransaction")
            .field("operations", &self.log.len())
            .finish()
    }
}
