//! Hook that clears the webhook route cache on webhook writes.

use std::sync::Arc;

use appdeck_core::EntityKind;
use appdeck_core::events::{EntityHook, EntityWrittenEvent, HookError};
use async_trait::async_trait;
use tracing::debug;

use super::route_cache::WebhookRouteCache;

/// Routes embed the owning app's name and version, so app writes
/// invalidate too.
const WATCHED_KINDS: &[EntityKind] = &[EntityKind::Webhook, EntityKind::App];

/// Invalidates the [`WebhookRouteCache`] whenever a webhook or app is written.
///
/// # Example
///
/// ```ignore
/// let cache = WebhookRouteCache::new_shared(storage.clone());
/// hooks.register(Arc::new(WebhookCacheInvalidator::new(cache.clone()))).await;
/// ```
pub struct WebhookCacheInvalidator {
    cache: Arc<WebhookRouteCache>,
}

impl WebhookCacheInvalidator {
    pub fn new(cache: Arc<WebhookRouteCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl EntityHook for WebhookCacheInvalidator {
    fn name(&self) -> &str {
        "webhook_route_cache"
    }

    fn kinds(&self) -> &[EntityKind] {
        WATCHED_KINDS
    }

    async fn handle(&self, event: &EntityWrittenEvent) -> Result<(), HookError> {
        debug!(
            kind = %event.kind,
            writes = event.writes.len(),
            "Clearing webhook route cache"
        );
        self.cache.invalidate();
        Ok(())
    }
}

impl std::fmt::Debug for WebhookCacheInvalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookCacheInvalidator").finish()
    }
}
