//! Webhook routing: the route cache, the hook that invalidates it and the
//! dispatch front-end that reads from it.
//!
//! Wiring, with writes going through an [`EventedStorage`]:
//!
//! ```ignore
//! let hooks = HookRegistry::new_shared();
//! let storage: DynStorage = Arc::new(EventedStorage::new(InMemoryStorage::new(), hooks.clone()));
//!
//! let cache = WebhookRouteCache::new_shared(storage.clone());
//! hooks.register(Arc::new(WebhookCacheInvalidator::new(cache.clone()))).await;
//!
//! let dispatcher = WebhookDispatcher::new(cache, transport, "https://shop.example");
//! ```
//!
//! [`EventedStorage`]: appdeck_storage::EventedStorage

mod dispatcher;
mod invalidator;
mod route_cache;

pub use dispatcher::{
    DeliveryError, DeliveryTransport, DispatchReport, WebhookDelivery, WebhookDispatcher,
};
pub use invalidator::WebhookCacheInvalidator;
pub use route_cache::{WebhookRoute, WebhookRouteCache};
