//! # appdeck-storage
//!
//! Storage abstraction layer for Appdeck.
//!
//! This crate defines the traits and types that all storage backends must
//! implement. It does not contain any backend; see `appdeck-db-memory`.
//!
//! ## Overview
//!
//! The main trait is [`EntityStorage`], which defines the contract for:
//! - CRUD operations on typed entity kinds (create, read, update, delete)
//! - Search by [`Criteria`]
//! - Transactions with read-your-writes and atomic commit
//!
//! Backends enforce the schema declared by `appdeck_core::EntityKind`:
//! unique fields and mandatory cascading deletes.
//!
//! [`EventedStorage`] wraps any backend and publishes "entity written"
//! notifications through the hook registry.
//!
//! ## Example
//!
//! ```ignore
//! use appdeck_storage::{Criteria, EntityStorage, StorageError};
//!
//! async fn webhooks_of(
//!     storage: &dyn EntityStorage,
//!     app_id: &str,
//! ) -> Result<Vec<StoredEntity>, StorageError> {
//!     let criteria = Criteria::new().with_equals("appId", app_id);
//!     let result = storage.search(EntityKind::Webhook, &criteria).await?;
//!     Ok(result.entries)
//! }
//! ```

mod error;
pub mod evented;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use evented::{EventedStorage, EventedTransaction};
pub use traits::{EntityStorage, Transaction};
pub use types::{Criteria, EntityRef, Filter, SearchResult, StoredEntity};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared storage trait object.
pub type DynStorage = std::sync::Arc<dyn EntityStorage>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use appdeck_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::evented::{EventedStorage, EventedTransaction};
    pub use crate::traits::{EntityStorage, Transaction};
    pub use crate::types::{Criteria, EntityRef, Filter, SearchResult, StoredEntity};
    pub use crate::{DynStorage, StorageResult};
}
