//! # appdeck-lifecycle
//!
//! App lifecycle management for Appdeck.
//!
//! Takes a parsed [`Manifest`] and makes persisted state match it:
//!
//! - [`AppLifecycle`] installs, updates and deletes apps as single units of
//!   work, reconciling action buttons, webhooks, custom field sets,
//!   privileges and the integration.
//! - [`WebhookRouteCache`] maps event names to subscribers and is cleared by
//!   [`WebhookCacheInvalidator`] whenever webhooks are written.
//! - [`WebhookDispatcher`] and [`ActionButtonLoader`] are the read side used
//!   when events fire and when the admin renders an entity view.
//!
//! ## Example
//!
//! ```ignore
//! use appdeck_lifecycle::{AppLifecycle, Context, Manifest};
//!
//! let lifecycle = AppLifecycle::new(storage.clone());
//! let manifest = Manifest::from_json(&raw)?;
//!
//! let report = lifecycle.install(&manifest, &Context::cli()).await?;
//! println!("installed {}", report.app.app_id());
//! ```

pub mod acl;
pub mod action_button;
pub mod credentials;
pub mod diff;
pub mod entities;
pub mod error;
pub mod lifecycle;
pub mod manifest;
pub mod repository;
pub mod webhook;

pub use acl::PrivilegePolicy;
pub use action_button::{ActionButtonLoader, ActionButtonView};
pub use diff::{SetDiff, diff_by_key};
pub use error::{LifecycleError, LifecycleResult};
pub use lifecycle::{
    AppLifecycle, Context, ContextSource, LifecycleOptions, ReconcileReport, ReconcileResult,
};
pub use manifest::{
    ActionButtonDecl, CustomFieldSetDecl, IntegrationDecl, LocalizedString, Manifest, Module,
    Permission, WebhookDecl,
};
pub use webhook::{
    DeliveryError, DeliveryTransport, DispatchReport, WebhookCacheInvalidator, WebhookDelivery,
    WebhookDispatcher, WebhookRoute, WebhookRouteCache,
};
