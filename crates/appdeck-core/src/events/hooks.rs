//! Hook traits for the write-notification system.
//!
//! Hooks are asynchronous handlers that react to "entity written" events.
//! A failing hook never fails the write that triggered it.

use async_trait::async_trait;

use super::types::{EntityWrittenEvent, WriteOperation};
use crate::kind::EntityKind;

/// Error type for hook operations.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Hook execution failed with a message.
    #[error("Hook execution failed: {0}")]
    Execution(String),

    /// Hook failed to reach a downstream component.
    #[error("Channel send failed: {0}")]
    Channel(String),

    /// Generic error with source.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HookError {
    /// Create an execution error from a string.
    pub fn execution(msg: impl Into<String>) -> Self {
        HookError::Execution(msg.into())
    }

    /// Create a channel error from a string.
    pub fn channel(msg: impl Into<String>) -> Self {
        HookError::Channel(msg.into())
    }
}

/// Subscriber for "entity written" notifications.
///
/// # Example
///
/// ```ignore
/// struct RouteCacheHook {
///     cache: Arc<WebhookRouteCache>,
/// }
///
/// #[async_trait]
/// impl EntityHook for RouteCacheHook {
///     fn name(&self) -> &str { "webhook_route_cache" }
///     fn kinds(&self) -> &[EntityKind] { &[EntityKind::Webhook] }
///
///     async fn handle(&self, _event: &EntityWrittenEvent) -> Result<(), HookError> {
///         self.cache.invalidate();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait EntityHook: Send + Sync {
    /// Unique name for this hook (for logging).
    fn name(&self) -> &str;

    /// Entity kinds this hook is interested in.
    ///
    /// Return an empty slice to match all kinds.
    fn kinds(&self) -> &[EntityKind];

    /// Operations this hook handles.
    ///
    /// Return an empty slice to match all operations.
    fn operations(&self) -> &[WriteOperation] {
        &[]
    }

    /// Handle a written event.
    async fn handle(&self, event: &EntityWrittenEvent) -> Result<(), HookError>;

    /// Check if this hook should handle the given event.
    fn matches(&self, event: &EntityWrittenEvent) -> bool {
        if !event.matches_kind(self.kinds()) {
            return false;
        }

        let operations = self.operations();
        operations.is_empty()
            || event
                .writes
                .iter()
                .any(|w| operations.contains(&w.operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestHook {
        kinds: Vec<EntityKind>,
        operations: Vec<WriteOperation>,
    }

    #[async_trait]
    impl EntityHook for TestHook {
        fn name(&self) -> &str {
            "test"
        }

        fn kinds(&self) -> &[EntityKind] {
            &self.kinds
        }

        fn operations(&self) -> &[WriteOperation] {
            &self.operations
        }

        async fn handle(&self, _event: &EntityWrittenEvent) -> Result<(), HookError> {
            Ok(())
        }
    }

    #[test]
    fn test_hook_matches_kind() {
        let hook = TestHook {
            kinds: vec![EntityKind::Webhook],
            operations: vec![],
        };

        let webhook = EntityWrittenEvent::single(EntityKind::Webhook, "1", WriteOperation::Created);
        let app = EntityWrittenEvent::single(EntityKind::App, "2", WriteOperation::Created);

        assert!(hook.matches(&webhook));
        assert!(!hook.matches(&app));
    }

    #[test]
    fn test_hook_matches_operation() {
        let hook = TestHook {
            kinds: vec![],
            operations: vec![WriteOperation::Deleted],
        };

        let created = EntityWrittenEvent::single(EntityKind::App, "1", WriteOperation::Created);
        let deleted = EntityWrittenEvent::single(EntityKind::App, "1", WriteOperation::Deleted);

        assert!(!hook.matches(&created));
        assert!(hook.matches(&deleted));
    }

    #[test]
    fn test_hook_error_display() {
        let err = HookError::execution("something went wrong");
        assert_eq!(err.to_string(), "Hook execution failed: something went wrong");
    }
}
