//! In-memory entity storage backend for Appdeck.
//!
//! This crate provides a transactional in-memory implementation of the
//! `EntityStorage` trait from `appdeck-storage`.
//!
//! # Example
//!
//! ```ignore
//! use appdeck_db_memory::InMemoryStorage;
//! use appdeck_storage::EntityStorage;
//!
//! let storage = InMemoryStorage::new();
//!
//! let mut tx = storage.begin_transaction().await?;
//! tx.create(EntityKind::App, &json!({"name": "SwagApp"})).await?;
//! tx.commit().await?;
//! ```

pub mod snapshot;
pub mod storage;
mod tables;
mod transaction;

pub use appdeck_storage::{EntityStorage, StorageError, StoredEntity};
pub use snapshot::Snapshot;
pub use storage::InMemoryStorage;

/// Creates a new shared in-memory storage instance.
pub fn create_storage() -> appdeck_storage::DynStorage {
    std::sync::Arc::new(InMemoryStorage::new())
}
