use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use appdeck_lifecycle::{DeliveryError, DeliveryTransport, WebhookDelivery, WebhookDispatcher};
use async_trait::async_trait;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::output::{print_deliveries, print_routes, print_success};
use crate::runtime::Runtime;

/// Collects deliveries instead of sending them.
#[derive(Default)]
struct DryRunTransport {
    deliveries: Mutex<Vec<WebhookDelivery>>,
}

impl DryRunTransport {
    fn take(&self) -> Vec<WebhookDelivery> {
        match self.deliveries.lock() {
            Ok(mut deliveries) => std::mem::take(&mut *deliveries),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl DeliveryTransport for DryRunTransport {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn deliver(&self, delivery: &WebhookDelivery) -> Result<(), DeliveryError> {
        self.deliveries
            .lock()
            .map_err(|_| DeliveryError::failed(&delivery.url, "dry-run buffer poisoned"))?
            .push(delivery.clone());
        Ok(())
    }
}

pub async fn routes(runtime: &Runtime, event: &str, format: OutputFormat) -> Result<()> {
    let routes = runtime.cache.lookup(event).await?;
    print_routes(event, &routes, format)
}

pub async fn dispatch(
    runtime: &Runtime,
    event: &str,
    payload: &str,
    shop_url: &str,
    format: OutputFormat,
) -> Result<()> {
    let payload: serde_json::Value = serde_json::from_str(payload).context("Invalid payload JSON")?;

    let transport = Arc::new(DryRunTransport::default());
    let dispatcher = WebhookDispatcher::new(runtime.cache.clone(), transport.clone(), shop_url);
    let report = dispatcher.dispatch(event, &payload).await?;

    print_deliveries(&transport.take(), format)?;
    print_success(&format!(
        "{} subscriber(s) of {}",
        report.matched,
        event.cyan()
    ));
    Ok(())
}
