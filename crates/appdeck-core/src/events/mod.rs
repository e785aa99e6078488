//! Write-notification system for inter-module communication.
//!
//! The storage layer publishes an [`EntityWrittenEvent`] per entity kind
//! after every successful write. Components that keep derived in-memory
//! state (such as the webhook route cache) subscribe with an
//! [`EntityHook`] registered in the process-wide [`HookRegistry`].
//!
//! ```text
//!   EventedStorage / EventedTransaction
//!                 │  commit
//!                 ▼
//!          HookRegistry::publish
//!          │           │          │
//!          ▼           ▼          ▼
//!       Hook 1      Hook 2     Hook 3
//! ```
//!
//! Delivery is in-process and awaited: when a commit returns, every
//! matching hook has been run. Hook errors are logged, never propagated.
//!
//! - [`types`]: `EntityWrittenEvent`, `EntityWrite`, `WriteOperation`
//! - [`hooks`]: `EntityHook` trait and `HookError`
//! - [`registry`]: `HookRegistry` and its builder

pub mod hooks;
pub mod registry;
pub mod types;

pub use hooks::{EntityHook, HookError};
pub use registry::{DeliveryReport, HookRegistry, HookRegistryBuilder, DEFAULT_HOOK_TIMEOUT};
pub use types::{group_writes, EntityWrite, EntityWrittenEvent, WriteOperation};
