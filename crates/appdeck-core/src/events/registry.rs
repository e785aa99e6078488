//! Hook registry for the write-notification system.
//!
//! The registry is the process-wide observer list. Hooks are registered at
//! startup; every published event is delivered to each matching hook before
//! `publish` returns. Each delivery runs with timeout and panic protection so
//! a misbehaving hook cannot fail or stall the writer indefinitely.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::hooks::EntityHook;
use super::types::EntityWrittenEvent;

/// Default timeout for hook execution.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of delivering one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Hooks that matched the event.
    pub matched: usize,
    /// Hooks that returned an error, panicked or timed out.
    pub failed: usize,
}

impl DeliveryReport {
    pub fn succeeded(&self) -> usize {
        self.matched - self.failed
    }
}

/// Registry for entity hooks.
pub struct HookRegistry {
    hooks: RwLock<Vec<Arc<dyn EntityHook>>>,
    timeout: Duration,
}

impl HookRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_HOOK_TIMEOUT)
    }

    /// Create a new registry with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
            timeout,
        }
    }

    /// Create a new registry wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a hook.
    pub async fn register(&self, hook: Arc<dyn EntityHook>) {
        let name = hook.name().to_string();
        self.hooks.write().await.push(hook);
        debug!(hook = %name, "Registered entity hook");
    }

    /// Get the number of registered hooks.
    pub async fn hook_count(&self) -> usize {
        self.hooks.read().await.len()
    }

    /// Get hooks that match an event.
    pub async fn get_matching_hooks(&self, event: &EntityWrittenEvent) -> Vec<Arc<dyn EntityHook>> {
        let hooks = self.hooks.read().await;
        hooks.iter().filter(|h| h.matches(event)).cloned().collect()
    }

    /// Deliver an event to all matching hooks, in registration order.
    pub async fn publish(&self, event: &EntityWrittenEvent) -> DeliveryReport {
        let hooks = self.get_matching_hooks(event).await;
        let mut report = DeliveryReport {
            matched: hooks.len(),
            failed: 0,
        };

        if hooks.is_empty() {
            debug!(event = %event.name(), "No hooks matched event");
            return report;
        }

        for hook in hooks {
            if !self.deliver(hook.as_ref(), event).await {
                report.failed += 1;
            }
        }

        report
    }

    /// Deliver several events, one after another.
    pub async fn publish_all(&self, events: &[EntityWrittenEvent]) -> DeliveryReport {
        let mut total = DeliveryReport::default();
        for event in events {
            let report = self.publish(event).await;
            total.matched += report.matched;
            total.failed += report.failed;
        }
        total
    }

    async fn deliver(&self, hook: &dyn EntityHook, event: &EntityWrittenEvent) -> bool {
        let hook_name = hook.name();
        let result = tokio::time::timeout(
            self.timeout,
            AssertUnwindSafe(hook.handle(event)).catch_unwind(),
        )
        .await;

        match result {
            Ok(Ok(Ok(()))) => {
                debug!(hook = %hook_name, event = %event.name(), "Hook executed successfully");
                true
            }
            Ok(Ok(Err(e))) => {
                warn!(
                    hook = %hook_name,
                    event = %event.name(),
                    error = %e,
                    "Hook execution failed"
                );
                false
            }
            Ok(Err(panic)) => {
                let panic_msg = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!(
                    hook = %hook_name,
                    event = %event.name(),
                    panic = %panic_msg,
                    "Hook panicked"
                );
                false
            }
            Err(_) => {
                error!(
                    hook = %hook_name,
                    event = %event.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Hook timed out"
                );
                false
            }
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for creating the hook registry at startup.
pub struct HookRegistryBuilder {
    registry: HookRegistry,
}

impl HookRegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            registry: HookRegistry::new(),
        }
    }

    /// Create a new builder with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            registry: HookRegistry::with_timeout(timeout),
        }
    }

    /// Register a hook.
    pub async fn register(self, hook: Arc<dyn EntityHook>) -> Self {
        self.registry.register(hook).await;
        self
    }

    /// Build the registry.
    pub fn build(self) -> Arc<HookRegistry> {
        Arc::new(self.registry)
    }
}

impl Default for HookRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::hooks::HookError;
    use crate::events::types::WriteOperation;
    use crate::kind::EntityKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingHook {
        name: &'static str,
        kinds: Vec<EntityKind>,
        count: AtomicU32,
    }

    impl CountingHook {
        fn new(name: &'static str, kinds: Vec<EntityKind>) -> Self {
            Self {
                name,
                kinds,
                count: AtomicU32::new(0),
            }
        }

        fn count(&self) -> u32 {
            self.count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EntityHook for CountingHook {
        fn name(&self) -> &str {
            self.name
        }

        fn kinds(&self) -> &[EntityKind] {
            &self.kinds
        }

        async fn handle(&self, _event: &EntityWrittenEvent) -> Result<(), HookError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct PanicHook;

    #[async_trait]
    impl EntityHook for PanicHook {
        fn name(&self) -> &str {
            "panic_hook"
        }

        fn kinds(&self) -> &[EntityKind] {
            &[]
        }

        async fn handle(&self, _event: &EntityWrittenEvent) -> Result<(), HookError> {
            panic!("This hook panics!");
        }
    }

    struct SlowHook;

    #[async_trait]
    impl EntityHook for SlowHook {
        fn name(&self) -> &str {
            "slow_hook"
        }

        fn kinds(&self) -> &[EntityKind] {
            &[]
        }

        async fn handle(&self, _event: &EntityWrittenEvent) -> Result<(), HookError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    fn webhook_event() -> EntityWrittenEvent {
        EntityWrittenEvent::single(EntityKind::Webhook, "w1", WriteOperation::Created)
    }

    #[test]
    fn test_registry_register() {
        tokio_test::block_on(async {
            let registry = HookRegistry::new();
            assert_eq!(registry.hook_count().await, 0);

            registry
                .register(Arc::new(CountingHook::new("test", vec![])))
                .await;
            assert_eq!(registry.hook_count().await, 1);
        });
    }

    #[tokio::test]
    async fn test_publish_is_delivered_before_return() {
        let registry = HookRegistry::new();
        let hook = Arc::new(CountingHook::new("test", vec![EntityKind::Webhook]));
        registry.register(hook.clone()).await;

        let report = registry.publish(&webhook_event()).await;

        assert_eq!(report.matched, 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(hook.count(), 1);
    }

    #[tokio::test]
    async fn test_publish_skips_non_matching_hooks() {
        let registry = HookRegistry::new();
        let hook = Arc::new(CountingHook::new("apps", vec![EntityKind::App]));
        registry.register(hook.clone()).await;

        let report = registry.publish(&webhook_event()).await;

        assert_eq!(report.matched, 0);
        assert_eq!(hook.count(), 0);
    }

    #[tokio::test]
    async fn test_panic_isolation() {
        let registry = HookRegistry::new();
        let counting_hook = Arc::new(CountingHook::new("counter", vec![]));

        registry.register(Arc::new(PanicHook)).await;
        registry.register(counting_hook.clone()).await;

        let report = registry.publish(&webhook_event()).await;

        assert_eq!(report.matched, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(counting_hook.count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_isolation() {
        let registry = HookRegistry::with_timeout(Duration::from_millis(20));
        let counting_hook = Arc::new(CountingHook::new("counter", vec![]));

        registry.register(Arc::new(SlowHook)).await;
        registry.register(counting_hook.clone()).await;

        let report = registry.publish(&webhook_event()).await;

        assert_eq!(report.failed, 1);
        assert_eq!(counting_hook.count(), 1);
    }

    #[tokio::test]
    async fn test_builder_and_publish_all() {
        let hook = Arc::new(CountingHook::new("counter", vec![EntityKind::Webhook]));
        let registry = HookRegistryBuilder::new()
            .register(hook.clone())
            .await
            .build();

        let events = vec![
            webhook_event(),
            EntityWrittenEvent::single(EntityKind::App, "a", WriteOperation::Deleted),
            webhook_event(),
        ];
        let report = registry.publish_all(&events).await;

        assert_eq!(report.matched, 2);
        assert_eq!(hook.count(), 2);
    }
}
