//! Wiring of storage, hooks and services for one CLI invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use appdeck_core::events::HookRegistry;
use appdeck_db_memory::{InMemoryStorage, Snapshot};
use appdeck_lifecycle::{
    ActionButtonLoader, AppLifecycle, Context as LifecycleContext, WebhookCacheInvalidator,
    WebhookRouteCache,
};
use appdeck_storage::{DynStorage, EventedStorage};
use tracing::debug;

use crate::config::AppdeckConfig;

pub struct Runtime {
    memory: InMemoryStorage,
    snapshot_path: PathBuf,
    actor: Option<String>,
    pub storage: DynStorage,
    pub cache: Arc<WebhookRouteCache>,
    pub lifecycle: AppLifecycle,
}

impl Runtime {
    /// Loads the snapshot at `snapshot_path` (empty state if missing).
    pub async fn open(config: &AppdeckConfig, snapshot_path: &Path) -> Result<Self> {
        let snapshot = Snapshot::load(snapshot_path)
            .with_context(|| format!("Failed to load state from {}", snapshot_path.display()))?;
        let memory = InMemoryStorage::from_snapshot(snapshot)
            .with_context(|| format!("Corrupt state file {}", snapshot_path.display()))?;

        let hooks = Arc::new(HookRegistry::with_timeout(config.reconcile.hook_timeout()));
        let storage: DynStorage = Arc::new(EventedStorage::new(memory.clone(), hooks.clone()));

        let cache = WebhookRouteCache::new_shared(storage.clone());
        hooks
            .register(Arc::new(WebhookCacheInvalidator::new(cache.clone())))
            .await;

        debug!(path = %snapshot_path.display(), "State loaded");
        Ok(Self {
            lifecycle: AppLifecycle::with_options(storage.clone(), config.lifecycle_options()),
            memory,
            snapshot_path: snapshot_path.to_path_buf(),
            actor: None,
            storage,
            cache,
        })
    }

    #[must_use]
    pub fn with_actor(mut self, actor: Option<String>) -> Self {
        self.actor = actor;
        self
    }

    /// Lifecycle context for commands of this invocation.
    pub fn context(&self) -> LifecycleContext {
        match &self.actor {
            Some(actor) => LifecycleContext::cli().with_actor(actor.clone()),
            None => LifecycleContext::cli(),
        }
    }

    pub fn buttons(&self) -> ActionButtonLoader {
        ActionButtonLoader::new(self.storage.clone())
    }

    /// Writes the current state back to the snapshot file.
    pub async fn persist(&self) -> Result<()> {
        self.memory
            .snapshot()
            .await
            .save(&self.snapshot_path)
            .with_context(|| format!("Failed to save state to {}", self.snapshot_path.display()))?;
        debug!(path = %self.snapshot_path.display(), "State saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appdeck_lifecycle::{ContextSource, Manifest, WebhookDecl};

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let config = AppdeckConfig::default();

        let runtime = Runtime::open(&config, &path).await.unwrap();
        let mut manifest = Manifest::new("SwagApp", "1.0.0");
        manifest.webhooks = vec![WebhookDecl {
            name: "hook".into(),
            url: "https://test.com/hook".into(),
            event_name: "checkout.order.placed".into(),
        }];
        runtime
            .lifecycle
            .install(&manifest, &runtime.context())
            .await
            .unwrap();
        runtime.persist().await.unwrap();

        let reopened = Runtime::open(&config, &path).await.unwrap();
        let apps = reopened.lifecycle.list().await.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "SwagApp");

        let routes = reopened.cache.lookup("checkout.order.placed").await.unwrap();
        assert_eq!(routes.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_state_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Runtime::open(&AppdeckConfig::default(), &dir.path().join("none.json"))
            .await
            .unwrap();
        assert!(runtime.lifecycle.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_context_carries_actor() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Runtime::open(&AppdeckConfig::default(), &dir.path().join("none.json"))
            .await
            .unwrap();
        assert_eq!(runtime.context().actor, None);

        let runtime = runtime.with_actor(Some("ops".to_string()));
        let ctx = runtime.context();
        assert_eq!(ctx.source, ContextSource::Cli);
        assert_eq!(ctx.actor.as_deref(), Some("ops"));
    }
}
