//! Storage traits for the entity storage abstraction layer.
//!
//! This module defines the core traits that all storage backends must implement.

use appdeck_core::EntityKind;
use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::types::{Criteria, EntityRef, SearchResult, StoredEntity};

/// The main storage trait that all entity storage backends must implement.
///
/// Implementations must be thread-safe (`Send + Sync`) and must enforce the
/// schema declared by [`EntityKind`]: unique fields and cascading deletes.
///
/// # Example
///
/// ```ignore
/// use appdeck_storage::{EntityStorage, StorageError, StoredEntity};
///
/// async fn get_app(storage: &dyn EntityStorage, id: &str) -> Result<StoredEntity, StorageError> {
///     storage
///         .read(EntityKind::App, id)
///         .await?
///         .ok_or_else(|| StorageError::not_found(EntityKind::App, id))
/// }
/// ```
#[async_trait]
pub trait EntityStorage: Send + Sync {
    /// Creates a new entity.
    ///
    /// If `data` carries no `id`, the backend generates one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the id is taken.
    /// Returns `StorageError::UniqueViolation` if a unique field collides.
    /// Returns `StorageError::InvalidEntity` if `data` is not a JSON object.
    async fn create(&self, kind: EntityKind, data: &Value) -> Result<StoredEntity, StorageError>;

    /// Reads an entity by kind and ID. Returns `None` if it does not exist.
    async fn read(&self, kind: EntityKind, id: &str)
    -> Result<Option<StoredEntity>, StorageError>;

    /// Replaces an existing entity. `data` must carry the `id`.
    ///
    /// If `if_match` is provided, the update only succeeds if the current
    /// version matches.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the entity does not exist.
    /// Returns `StorageError::VersionConflict` if `if_match` doesn't match.
    async fn update(
        &self,
        kind: EntityKind,
        data: &Value,
        if_match: Option<&str>,
    ) -> Result<StoredEntity, StorageError>;

    /// Deletes an entity and, recursively, every entity that references it.
    ///
    /// Returns every deleted row, the requested one first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the entity does not exist.
    async fn delete(&self, kind: EntityKind, id: &str) -> Result<Vec<EntityRef>, StorageError>;

    /// Searches entities of a kind.
    async fn search(
        &self,
        kind: EntityKind,
        criteria: &Criteria,
    ) -> Result<SearchResult, StorageError>;

    /// Begins a new transaction.
    ///
    /// Writes made through the transaction are invisible to other readers
    /// until it is committed, and are discarded on rollback.
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>, StorageError>;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// A transaction for performing atomic operations.
///
/// Reads and searches inside the transaction see its own uncommitted writes.
/// The transaction must be either committed or rolled back.
///
/// # Example
///
/// ```ignore
/// let mut tx = storage.begin_transaction().await?;
///
/// let app = tx.create(EntityKind::App, &app_json).await?;
/// tx.create(EntityKind::Webhook, &webhook_json).await?;
///
/// tx.commit().await?;
/// ```
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Commits all operations in this transaction.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UniqueViolation` or `StorageError::VersionConflict`
    /// if a concurrent commit made the staged writes invalid. Nothing is
    /// applied in that case.
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Discards all operations in this transaction.
    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;

    /// Creates a new entity within this transaction.
    ///
    /// See `EntityStorage::create` for details.
    async fn create(&mut self, kind: EntityKind, data: &Value)
    -> Result<StoredEntity, StorageError>;

    /// Replaces an existing entity within this transaction.
    async fn update(&mut self, kind: EntityKind, data: &Value)
    -> Result<StoredEntity, StorageError>;

    /// Deletes an entity and its dependents within this transaction.
    async fn delete(&mut self, kind: EntityKind, id: &str)
    -> Result<Vec<EntityRef>, StorageError>;

    /// Reads an entity, seeing uncommitted changes made within this transaction.
    async fn read(&self, kind: EntityKind, id: &str)
    -> Result<Option<StoredEntity>, StorageError>;

    /// Searches entities, seeing uncommitted changes made within this transaction.
    async fn search(
        &self,
        kind: EntityKind,
        criteria: &Criteria,
    ) -> Result<SearchResult, StorageError>;
}
