//! Event name to subscriber lookup, built lazily from persisted webhooks.
//!
//! Readers load the current table with a single atomic pointer load. After
//! an invalidation the first lookup rebuilds the table under a mutex while
//! later lookups wait for that one rebuild instead of scanning storage
//! themselves. A table is only published when no invalidation happened
//! while it was being built, and every table carries the generation it was
//! built for, so a late publish can never resurrect stale routes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use appdeck_storage::{Criteria, DynStorage};
use arc_swap::ArcSwapOption;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::entities::{AppEntity, WebhookEntity};
use crate::error::LifecycleResult;
use crate::repository;

/// One subscriber endpoint for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRoute {
    pub webhook_id: String,
    pub app_id: String,
    pub app_name: String,
    pub app_version: String,
    pub url: String,
    pub event_name: String,
}

#[derive(Debug)]
struct RouteTable {
    generation: u64,
    routes: HashMap<String, Vec<WebhookRoute>>,
}

impl RouteTable {
    fn lookup(&self, event_name: &str) -> Vec<WebhookRoute> {
        self.routes.get(event_name).cloned().unwrap_or_default()
    }
}

/// Process-wide webhook route cache.
pub struct WebhookRouteCache {
    storage: DynStorage,
    table: ArcSwapOption<RouteTable>,
    generation: AtomicU64,
    rebuild: Mutex<()>,
}

impl WebhookRouteCache {
    pub fn new(storage: DynStorage) -> Self {
        Self {
            storage,
            table: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
            rebuild: Mutex::new(()),
        }
    }

    pub fn new_shared(storage: DynStorage) -> Arc<Self> {
        Arc::new(Self::new(storage))
    }

    /// Subscribers of `event_name` in webhook creation order.
    ///
    /// Returns an empty list when nobody subscribes. Only fails when the
    /// table has to be rebuilt and storage fails.
    pub async fn lookup(&self, event_name: &str) -> LifecycleResult<Vec<WebhookRoute>> {
        if let Some(table) = self.current() {
            return Ok(table.lookup(event_name));
        }

        let _guard = self.rebuild.lock().await;
        // Another caller may have rebuilt while we waited
        if let Some(table) = self.current() {
            return Ok(table.lookup(event_name));
        }

        let generation = self.generation.load(Ordering::Acquire);
        let table = Arc::new(self.build(generation).await?);
        if self.generation.load(Ordering::Acquire) == generation {
            self.table.store(Some(Arc::clone(&table)));
        } else {
            debug!(generation, "Route table invalidated during rebuild, not publishing");
        }
        Ok(table.lookup(event_name))
    }

    /// Drops the built table; the next lookup rebuilds it.
    pub fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.table.store(None);
        debug!(generation, "Webhook route cache invalidated");
    }

    /// Whether a table for the current generation is published.
    pub fn is_built(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<Arc<RouteTable>> {
        let table = self.table.load_full()?;
        (table.generation == self.generation.load(Ordering::Acquire)).then_some(table)
    }

    async fn build(&self, generation: u64) -> LifecycleResult<RouteTable> {
        let storage = self.storage.as_ref();
        let apps: HashMap<String, AppEntity> =
            repository::search_committed::<AppEntity>(storage, &Criteria::new())
                .await?
                .into_iter()
                .filter_map(|app| app.id.clone().map(|id| (id, app)))
                .collect();
        let webhooks: Vec<WebhookEntity> =
            repository::search_committed(storage, &Criteria::new()).await?;

        let mut routes: HashMap<String, Vec<WebhookRoute>> = HashMap::new();
        let mut count = 0usize;
        for webhook in webhooks {
            let (Some(webhook_id), Some(app)) = (webhook.id, apps.get(&webhook.app_id)) else {
                continue;
            };
            count += 1;
            routes
                .entry(webhook.event_name.clone())
                .or_default()
                .push(WebhookRoute {
                    webhook_id,
                    app_id: webhook.app_id,
                    app_name: app.name.clone(),
                    app_version: app.version.clone(),
                    url: webhook.url,
                    event_name: webhook.event_name,
                });
        }

        info!(
            generation,
            routes = count,
            events = routes.len(),
            "Webhook route table rebuilt"
        );
        Ok(RouteTable { generation, routes })
    }
}

impl std::fmt::Debug for WebhookRouteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookRouteCache")
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("built", &self.is_built())
            .finish()
    }
}
