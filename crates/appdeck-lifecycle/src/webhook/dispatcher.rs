//! Webhook dispatch front-end.
//!
//! Resolves subscribers through the route cache and builds one delivery per
//! subscriber. Putting bytes on the wire is the job of a
//! [`DeliveryTransport`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::route_cache::{WebhookRoute, WebhookRouteCache};
use crate::error::LifecycleResult;

/// A single outgoing webhook call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDelivery {
    pub webhook_id: String,
    pub app_id: String,
    pub url: String,
    pub body: Value,
}

/// Error raised by a transport for one delivery.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Delivery to {url} failed: {message}")]
    Failed { url: String, message: String },

    #[error("Delivery to {url} timed out")]
    Timeout { url: String },
}

impl DeliveryError {
    pub fn failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Sends a webhook delivery to its endpoint.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, delivery: &WebhookDelivery) -> Result<(), DeliveryError>;
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub matched: usize,
    pub delivered: usize,
    /// Webhook ids whose delivery failed.
    pub failed: Vec<String>,
}

pub struct WebhookDispatcher {
    cache: Arc<WebhookRouteCache>,
    transport: Arc<dyn DeliveryTransport>,
    shop_url: String,
}

impl WebhookDispatcher {
    pub fn new(
        cache: Arc<WebhookRouteCache>,
        transport: Arc<dyn DeliveryTransport>,
        shop_url: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            transport,
            shop_url: shop_url.into(),
        }
    }

    /// Delivers `payload` to every subscriber of `event_name`.
    ///
    /// A failed delivery is logged and counted; the remaining deliveries
    /// still run. Only a failing route lookup is returned as an error.
    pub async fn dispatch(&self, event_name: &str, payload: &Value) -> LifecycleResult<DispatchReport> {
        let routes = self.cache.lookup(event_name).await?;
        let mut report = DispatchReport {
            matched: routes.len(),
            ..Default::default()
        };
        if routes.is_empty() {
            debug!(event = %event_name, "No webhook subscribers");
            return Ok(report);
        }

        for route in &routes {
            let delivery = self.delivery_for(route, event_name, payload);
            match self.transport.deliver(&delivery).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!(
                        event = %event_name,
                        webhook_id = %route.webhook_id,
                        app = %route.app_name,
                        transport = %self.transport.name(),
                        error = %err,
                        "Webhook delivery failed"
                    );
                    report.failed.push(route.webhook_id.clone());
                }
            }
        }

        info!(
            event = %event_name,
            matched = report.matched,
            delivered = report.delivered,
            failed = report.failed.len(),
            "Webhooks dispatched"
        );
        Ok(report)
    }

    pub fn clear_internal_cache(&self) {
        self.cache.invalidate();
    }

    fn delivery_for(&self, route: &WebhookRoute, event_name: &str, payload: &Value) -> WebhookDelivery {
        WebhookDelivery {
            webhook_id: route.webhook_id.clone(),
            app_id: route.app_id.clone(),
            url: route.url.clone(),
            body: json!({
                "data": {
                    "event": event_name,
                    "payload": payload,
                },
                "source": {
                    "url": self.shop_url,
                    "appVersion": route.app_version,
                },
            }),
        }
    }
}

impl std::fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("transport", &self.transport.name())
            .field("shop_url", &self.shop_url)
            .finish()
    }
}
