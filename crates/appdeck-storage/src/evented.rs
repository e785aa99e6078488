//! EventedStorage - A storage wrapper that publishes write notifications.
//!
//! This wrapper delegates all operations to an inner storage implementation
//! and publishes an [`EntityWrittenEvent`] per touched kind through the
//! [`HookRegistry`] after every successful write. Transactions queue their
//! writes and publish only after a successful commit.
//!
//! # Example
//!
//! ```ignore
//! use appdeck_storage::EventedStorage;
//! use appdeck_core::events::HookRegistry;
//!
//! let hooks = HookRegistry::new_shared();
//! let storage = EventedStorage::new(InMemoryStorage::new(), hooks);
//!
//! // Every matching hook has run once this returns
//! storage.create(EntityKind::Webhook, &webhook_json).await?;
//! ```

use std::sync::Arc;

use appdeck_core::EntityKind;
use appdeck_core::events::{EntityWrite, HookRegistry, WriteOperation, group_writes};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::StorageError;
use crate::traits::{EntityStorage, Transaction};
use crate::types::{Criteria, EntityRef, SearchResult, StoredEntity};

/// A storage wrapper that publishes write notifications after successful writes.
pub struct EventedStorage<S: EntityStorage> {
    inner: S,
    hooks: Arc<HookRegistry>,
}

impl<S: EntityStorage> EventedStorage<S> {
    /// Create a new evented storage wrapper.
    pub fn new(inner: S, hooks: Arc<HookRegistry>) -> Self {
        Self { inner, hooks }
    }

    /// Get a reference to the inner storage.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get a reference to the hook registry.
    pub fn hooks(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    async fn publish(&self, writes: Vec<(EntityKind, EntityWrite)>) {
        publish_writes(&self.hooks, writes).await;
    }
}

async fn publish_writes(hooks: &HookRegistry, writes: Vec<(EntityKind, EntityWrite)>) {
    if writes.is_empty() {
        return;
    }
    let events = group_writes(writes);
    let report = hooks.publish_all(&events).await;
    debug!(
        events = events.len(),
        hooks = report.matched,
        failed = report.failed,
        "Published write notifications"
    );
}

fn deleted_writes(refs: &[EntityRef]) -> Vec<(EntityKind, EntityWrite)> {
    refs.iter()
        .map(|r| (r.kind, EntityWrite::new(r.id.clone(), WriteOperation::Deleted)))
        .collect()
}

#[async_trait]
impl<S: EntityStorage> EntityStorage for EventedStorage<S> {
    async fn create(&self, kind: EntityKind, data: &Value) -> Result<StoredEntity, StorageError> {
        let result = self.inner.create(kind, data).await?;
        self.publish(vec![(
            kind,
            EntityWrite::new(result.id.clone(), WriteOperation::Created),
        )])
        .await;
        Ok(result)
    }

    async fn read(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<StoredEntity>, StorageError> {
        self.inner.read(kind, id).await
    }

    async fn update(
        &self,
        kind: EntityKind,
        data: &Value,
        if_match: Option<&str>,
    ) -> Result<StoredEntity, StorageError> {
        let result = self.inner.update(kind, data, if_match).await?;
        self.publish(vec![(
            kind,
            EntityWrite::new(result.id.clone(), WriteOperation::Updated),
        )])
        .await;
        Ok(result)
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<Vec<EntityRef>, StorageError> {
        let deleted = self.inner.delete(kind, id).await?;
        self.publish(deleted_writes(&deleted)).await;
        Ok(deleted)
    }

    async fn search(
        &self,
        kind: EntityKind,
        criteria: &Criteria,
    ) -> Result<SearchResult, StorageError> {
        self.inner.search(kind, criteria).await
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>, StorageError> {
        let inner_tx = self.inner.begin_transaction().await?;
        Ok(Box::new(EventedTransaction::new(
            inner_tx,
            self.hooks.clone(),
        )))
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

impl<S: EntityStorage> std::fmt::Debug for EventedStorage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventedStorage")
            .field("backend", &self.inner.backend_name())
            .finish()
    }
}

// ============================================================================
// EventedTransaction
// ============================================================================

/// A transaction wrapper that collects writes and publishes them on commit.
pub struct EventedTransaction {
    inner: Box<dyn Transaction>,
    hooks: Arc<HookRegistry>,
    /// Writes to publish on commit.
    pending: Vec<(EntityKind, EntityWrite)>,
}

impl EventedTransaction {
    /// Create a new evented transaction.
    pub fn new(inner: Box<dyn Transaction>, hooks: Arc<HookRegistry>) -> Self {
        Self {
            inner,
            hooks,
            pending: Vec::new(),
        }
    }

    /// Number of writes queued so far.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl Transaction for EventedTransaction {
    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let EventedTransaction {
            inner,
            hooks,
            pending,
        } = *self;

        inner.commit().await?;

        publish_writes(&hooks, pending).await;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.inner.rollback().await
    }

    async fn create(
        &mut self,
        kind: EntityKind,
        data: &Value,
    ) -> Result<StoredEntity, StorageError> {
        let result = self.inner.create(kind, data).await?;
        self.pending.push((
            kind,
            EntityWrite::new(result.id.clone(), WriteOperation::Created),
        ));
        Ok(result)
    }

    async fn update(
        &mut self,
        kind: EntityKind,
        data: &Value,
    ) -> Result<StoredEntity, StorageError> {
        let result = self.inner.update(kind, data).await?;
        self.pending.push((
            kind,
            EntityWrite::new(result.id.clone(), WriteOperation::Updated),
        ));
        Ok(result)
    }

    async fn delete(
        &mut self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Vec<EntityRef>, StorageError> {
        let deleted = self.inner.delete(kind, id).await?;
        self.pending.extend(deleted_writes(&deleted));
        Ok(deleted)
    }

    async fn read(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<StoredEntity>, StorageError> {
        self.inner.read(kind, id).await
    }

    async fn search(
        &self,
        kind: EntityKind,
        criteria: &Criteria,
    ) -> Result<SearchResult, StorageError> {
        self.inner.search(kind, criteria).await
    }
}

impl std::fmt::Debug for EventedTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventedTransaction")
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appdeck_core::events::{EntityHook, EntityWrittenEvent, HookError};
    use std::sync::Mutex;

    /// Transaction that echoes writes back without storing anything.
    struct EchoTransaction {
        fail_commit: bool,
    }

    #[async_trait]
    impl Transaction for EchoTransaction {
        async fn commit(self: Box<Self>) -> Result<(), StorageError> {
            if self.fail_commit {
                return Err(StorageError::transaction_error("commit refused"));
            }
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
            Ok(())
        }

        async fn create(
            &mut self,
            kind: EntityKind,
            data: &Value,
        ) -> Result<StoredEntity, StorageError> {
            let id = data["id"].as_str().unwrap_or("generated").to_string();
            Ok(StoredEntity::new(kind, id, "1", data.clone()))
        }

        async fn update(
            &mut self,
            kind: EntityKind,
            data: &Value,
        ) -> Result<StoredEntity, StorageError> {
            self.create(kind, data).await
        }

        async fn delete(
            &mut self,
            kind: EntityKind,
            id: &str,
        ) -> Result<Vec<EntityRef>, StorageError> {
            Ok(vec![
                EntityRef::new(kind, id),
                EntityRef::new(EntityKind::Webhook, "cascaded"),
            ])
        }

        async fn read(
            &self,
            _kind: EntityKind,
            _id: &str,
        ) -> Result<Option<StoredEntity>, StorageError> {
            Ok(None)
        }

        async fn search(
            &self,
            _kind: EntityKind,
            _criteria: &Criteria,
        ) -> Result<SearchResult, StorageError> {
            Ok(SearchResult::empty())
        }
    }

    #[derive(Default)]
    struct RecordingHook {
        seen: Mutex<Vec<(EntityKind, usize)>>,
    }

    #[async_trait]
    impl EntityHook for RecordingHook {
        fn name(&self) -> &str {
            "recording"
        }

        fn kinds(&self) -> &[EntityKind] {
            &[]
        }

        async fn handle(&self, event: &EntityWrittenEvent) -> Result<(), HookError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((event.kind, event.writes.len()));
            }
            Ok(())
        }
    }

    async fn setup(fail_commit: bool) -> (EventedTransaction, Arc<RecordingHook>) {
        let hooks = HookRegistry::new_shared();
        let hook = Arc::new(RecordingHook::default());
        hooks.register(hook.clone()).await;
        let tx = EventedTransaction::new(Box::new(EchoTransaction { fail_commit }), hooks);
        (tx, hook)
    }

    #[tokio::test]
    async fn test_commit_publishes_one_event_per_kind() {
        let (mut tx, hook) = setup(false).await;

        tx.create(EntityKind::App, &serde_json::json!({"id": "a"}))
            .await
            .unwrap();
        tx.create(EntityKind::Webhook, &serde_json::json!({"id": "w1"}))
            .await
            .unwrap();
        tx.delete(EntityKind::CustomFieldSet, "s1").await.unwrap();
        assert_eq!(tx.pending_count(), 4);
        assert!(hook.seen.lock().unwrap().is_empty());

        Box::new(tx).commit().await.unwrap();

        let seen = hook.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                (EntityKind::App, 1),
                (EntityKind::Webhook, 2),
                (EntityKind::CustomFieldSet, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_rollback_publishes_nothing() {
        let (mut tx, hook) = setup(false).await;

        tx.create(EntityKind::Webhook, &serde_json::json!({"id": "w1"}))
            .await
            .unwrap();
        Box::new(tx).rollback().await.unwrap();

        assert!(hook.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_publishes_nothing() {
        let (mut tx, hook) = setup(true).await;

        tx.create(EntityKind::Webhook, &serde_json::json!({"id": "w1"}))
            .await
            .unwrap();
        let result = Box::new(tx).commit().await;

        assert!(result.is_err());
        assert!(hook.seen.lock().unwrap().is_empty());
    }
}
