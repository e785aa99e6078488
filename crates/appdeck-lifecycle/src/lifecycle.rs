//! App lifecycle: install, update and delete as single units of work.
//!
//! Each call validates the manifest, takes the per-app lock, opens one
//! storage transaction and reconciles every owned collection against the
//! manifest. The transaction commits only when every step succeeded;
//! otherwise it is rolled back and the caller sees the first error.
//!
//! Install and update share the same per-collection sync: install simply
//! starts from an app that owns nothing yet.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use appdeck_core::{EntityKind, generate_id};
use appdeck_storage::{Criteria, DynStorage, EntityRef, StorageError, Transaction};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::acl::{PrivilegePolicy, derive_privileges, retain_deletable};
use crate::credentials::{generate_access_key, generate_access_token, generate_secret};
use crate::diff::{SetDiff, diff_by_key};
use crate::entities::{
    AclResourceEntity, AclRoleEntity, ActionButtonEntity, AppEntity, CustomFieldSetEntity,
    CustomFieldSetRelationEntity, Entity, IntegrationEntity, WebhookEntity,
};
use crate::error::{LifecycleError, LifecycleResult};
use crate::manifest::{CustomFieldSetDecl, Manifest};
use crate::repository::{self, ids_of, owned_by_app};

/// Library-side reconciliation settings.
///
/// The default privilege policy is [`PrivilegePolicy::Exact`]: the app's role
/// ends up with exactly the derived privileges, so rows granted on that role
/// outside the manifest are removed on update. Use
/// [`PrivilegePolicy::PreserveUnrelated`] to keep rows whose resource the
/// manifest does not mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleOptions {
    pub privilege_policy: PrivilegePolicy,
    /// Privileges every action button grants on its entity.
    pub implied_button_privileges: Vec<String>,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            privilege_policy: PrivilegePolicy::Exact,
            implied_button_privileges: vec!["list".to_string(), "detail".to_string()],
        }
    }
}

/// Where a lifecycle call originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    System,
    Cli,
}

impl fmt::Display for ContextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::System => "system",
            Self::Cli => "cli",
        })
    }
}

/// Caller context, carried into logs.
#[derive(Debug, Clone)]
pub struct Context {
    pub source: ContextSource,
    pub actor: Option<String>,
}

impl Context {
    pub fn system() -> Self {
        Self {
            source: ContextSource::System,
            actor: None,
        }
    }

    pub fn cli() -> Self {
        Self {
            source: ContextSource::Cli,
            actor: None,
        }
    }

    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    fn actor(&self) -> &str {
        self.actor.as_deref().unwrap_or("-")
    }
}

/// Ids touched in one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileResult {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

impl ReconcileResult {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    fn merge(&mut self, other: ReconcileResult) {
        self.created.extend(other.created);
        self.updated.extend(other.updated);
        self.deleted.extend(other.deleted);
    }
}

/// Outcome of install or update.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub app: AppEntity,
    /// Per-kind changes, in the order they were applied.
    pub changes: IndexMap<EntityKind, ReconcileResult>,
}

impl ReconcileReport {
    fn new(app: AppEntity) -> Self {
        Self {
            app,
            changes: IndexMap::new(),
        }
    }

    fn record(&mut self, kind: EntityKind, result: ReconcileResult) {
        info!(
            app_id = %self.app.app_id(),
            kind = %kind,
            created = result.created.len(),
            updated = result.updated.len(),
            deleted = result.deleted.len(),
            "Entities reconciled"
        );
        self.changes.entry(kind).or_default().merge(result);
    }

    pub fn changes_for(&self, kind: EntityKind) -> Option<&ReconcileResult> {
        self.changes.get(&kind)
    }
}

/// Held for the duration of one lifecycle call.
///
/// Dropping it releases the mutex and removes the map entry once no other
/// caller holds or awaits it.
struct AppLock<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
}

impl Drop for AppLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold a clone, so a count of one means only the map is left
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Installs, updates and deletes apps against an entity storage.
///
/// Calls on the same app are serialized by a per-app lock; calls on
/// different apps run in parallel. Concurrent installs of one name in
/// separate processes are still caught by the storage's unique constraint
/// on `app.name` at commit.
pub struct AppLifecycle {
    storage: DynStorage,
    options: LifecycleOptions,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AppLifecycle {
    pub fn new(storage: DynStorage) -> Self {
        Self::with_options(storage, LifecycleOptions::default())
    }

    pub fn with_options(storage: DynStorage, options: LifecycleOptions) -> Self {
        Self {
            storage,
            options,
            locks: DashMap::new(),
        }
    }

    pub fn options(&self) -> &LifecycleOptions {
        &self.options
    }

    /// Installs a new app from its manifest.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed manifest; nothing is written.
    /// - `Conflict` if an app with the same name exists.
    /// - `Storage` if any write fails; every write of this call is discarded.
    pub async fn install(&self, manifest: &Manifest, ctx: &Context) -> LifecycleResult<ReconcileReport> {
        manifest.validate()?;
        let _lock = self.lock(format!("name:{}", manifest.name)).await;

        info!(
            app = %manifest.name,
            version = %manifest.version,
            source = %ctx.source,
            actor = %ctx.actor(),
            "Installing app"
        );

        let mut tx = self.storage.begin_transaction().await?;
        let result = self.apply_install(tx.as_mut(), manifest).await;
        let report = self.finish(tx, result, &manifest.name).await?;

        info!(app = %manifest.name, app_id = %report.app.app_id(), "App installed");
        Ok(report)
    }

    /// Reconciles an installed app with a new manifest.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed manifest or a name change.
    /// - `NotFound` if no app has this id.
    /// - `Storage` if any write fails; the app is left untouched.
    pub async fn update(
        &self,
        app_id: &str,
        manifest: &Manifest,
        ctx: &Context,
    ) -> LifecycleResult<ReconcileReport> {
        manifest.validate()?;
        let _lock = self.lock(format!("id:{app_id}")).await;

        info!(
            app = %manifest.name,
            app_id = %app_id,
            version = %manifest.version,
            source = %ctx.source,
            actor = %ctx.actor(),
            "Updating app"
        );

        let mut tx = self.storage.begin_transaction().await?;
        let result = self.apply_update(tx.as_mut(), app_id, manifest).await;
        let report = self.finish(tx, result, &manifest.name).await?;

        info!(app = %manifest.name, app_id = %app_id, "App updated");
        Ok(report)
    }

    /// Deletes an app and every row it owns.
    ///
    /// Returns the removed rows. Deleting an unknown app is a no-op that
    /// returns an empty list.
    pub async fn delete(&self, app_id: &str, ctx: &Context) -> LifecycleResult<Vec<EntityRef>> {
        let _lock = self.lock(format!("id:{app_id}")).await;

        let mut tx = self.storage.begin_transaction().await?;
        let existing = match repository::read::<AppEntity>(tx.as_ref(), app_id).await {
            Ok(existing) => existing,
            Err(err) => return self.finish(tx, Err(err), app_id).await,
        };

        let Some(app) = existing else {
            self.finish(tx, Ok(()), app_id).await?;
            debug!(app_id = %app_id, "App already absent, nothing to delete");
            return Ok(Vec::new());
        };

        info!(
            app = %app.name,
            app_id = %app_id,
            source = %ctx.source,
            actor = %ctx.actor(),
            "Deleting app"
        );

        let result = tx
            .delete(EntityKind::App, app_id)
            .await
            .map_err(LifecycleError::from);
        let removed = self.finish(tx, result, &app.name).await?;

        let mut per_kind: IndexMap<EntityKind, usize> = IndexMap::new();
        for row in &removed {
            *per_kind.entry(row.kind).or_default() += 1;
        }
        for (kind, deleted) in per_kind {
            info!(app_id = %app_id, kind = %kind, deleted, "Entities removed");
        }
        Ok(removed)
    }

    /// Looks up an installed app by name.
    pub async fn find_by_name(&self, name: &str) -> LifecycleResult<Option<AppEntity>> {
        let criteria = Criteria::new().with_equals("name", name).with_limit(1);
        let mut apps = repository::search_committed::<AppEntity>(self.storage.as_ref(), &criteria).await?;
        Ok(apps.pop())
    }

    /// Lists installed apps in installation order.
    pub async fn list(&self) -> LifecycleResult<Vec<AppEntity>> {
        repository::search_committed(self.storage.as_ref(), &Criteria::new()).await
    }

    async fn lock(&self, key: String) -> AppLock<'_> {
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        AppLock {
            guard: Some(mutex.lock_owned().await),
            key,
            locks: &self.locks,
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Commits on success, rolls back on failure.
    async fn finish<T>(
        &self,
        tx: Box<dyn Transaction>,
        result: LifecycleResult<T>,
        app_name: &str,
    ) -> LifecycleResult<T> {
        match result {
            Ok(value) => {
                tx.commit().await.map_err(|err| commit_error(err, app_name))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(app = %app_name, error = %rollback_err, "Rollback failed");
                }
                warn!(app = %app_name, error = %err, category = %err.category(), "Lifecycle operation aborted");
                Err(err)
            }
        }
    }

    async fn apply_install(
        &self,
        tx: &mut dyn Transaction,
        manifest: &Manifest,
    ) -> LifecycleResult<ReconcileReport> {
        let taken = repository::search::<AppEntity>(
            tx,
            &Criteria::new().with_equals("name", manifest.name.as_str()),
        )
        .await?;
        if !taken.is_empty() {
            return Err(LifecycleError::conflict(&manifest.name));
        }

        let app = repository::create(
            tx,
            &AppEntity {
                id: Some(generate_id()),
                name: manifest.name.clone(),
                version: manifest.version.clone(),
                label: manifest.label.clone(),
                icon: encode_icon(manifest),
                path: manifest.path.clone(),
                access_token: generate_access_token(),
                acl_role_id: generate_id(),
                modules: manifest.modules.clone(),
            },
        )
        .await?;

        let mut report = ReconcileReport::new(app.clone());
        report.record(
            EntityKind::App,
            ReconcileResult {
                created: vec![app.app_id().to_string()],
                ..Default::default()
            },
        );

        self.sync_owned(tx, &mut report, manifest).await?;
        Ok(report)
    }

    async fn apply_update(
        &self,
        tx: &mut dyn Transaction,
        app_id: &str,
        manifest: &Manifest,
    ) -> LifecycleResult<ReconcileReport> {
        let existing = repository::read::<AppEntity>(tx, app_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(app_id))?;

        if existing.name != manifest.name {
            return Err(LifecycleError::validation(format!(
                "manifest name '{}' does not match installed app '{}'",
                manifest.name, existing.name
            )));
        }

        let next = AppEntity {
            version: manifest.version.clone(),
            label: manifest.label.clone(),
            icon: encode_icon(manifest),
            path: manifest.path.clone(),
            modules: manifest.modules.clone(),
            ..existing.clone()
        };

        let mut result = ReconcileResult::default();
        let app = if next == existing {
            existing
        } else {
            result.updated.push(app_id.to_string());
            repository::update(tx, &next).await?
        };

        let mut report = ReconcileReport::new(app);
        report.record(EntityKind::App, result);

        self.sync_owned(tx, &mut report, manifest).await?;
        Ok(report)
    }

    /// Reconciles every collection owned by `report.app`.
    async fn sync_owned(
        &self,
        tx: &mut dyn Transaction,
        report: &mut ReconcileReport,
        manifest: &Manifest,
    ) -> LifecycleResult<()> {
        let app = report.app.clone();
        let app_id = app.app_id();

        let (role, result) = self.ensure_role(tx, &app).await?;
        report.record(EntityKind::AclRole, result);
        report.record(
            EntityKind::AclResource,
            self.sync_privileges(tx, &role, manifest).await?,
        );

        report.record(
            EntityKind::ActionButton,
            sync_action_buttons(tx, app_id, manifest).await?,
        );

        let (sets, relations) = sync_custom_field_sets(tx, app_id, manifest).await?;
        report.record(EntityKind::CustomFieldSet, sets);
        report.record(EntityKind::CustomFieldSetRelation, relations);

        report.record(EntityKind::Webhook, sync_webhooks(tx, app_id, manifest).await?);
        report.record(
            EntityKind::Integration,
            sync_integration(tx, app_id, manifest).await?,
        );
        Ok(())
    }

    /// Returns the app's role, creating it under the app's `aclRoleId` if missing.
    async fn ensure_role(
        &self,
        tx: &mut dyn Transaction,
        app: &AppEntity,
    ) -> LifecycleResult<(String, ReconcileResult)> {
        let mut result = ReconcileResult::default();
        if repository::read::<AclRoleEntity>(tx, &app.acl_role_id)
            .await?
            .is_none()
        {
            repository::create(
                tx,
                &AclRoleEntity {
                    id: Some(app.acl_role_id.clone()),
                    app_id: app.app_id().to_string(),
                    name: app.name.clone(),
                },
            )
            .await?;
            result.created.push(app.acl_role_id.clone());
        }
        Ok((app.acl_role_id.clone(), result))
    }

    /// Mirrors the derived privilege set on the role.
    ///
    /// Rows present in both sets are left untouched.
    async fn sync_privileges(
        &self,
        tx: &mut dyn Transaction,
        role_id: &str,
        manifest: &Manifest,
    ) -> LifecycleResult<ReconcileResult> {
        let derived = derive_privileges(manifest, &self.options.implied_button_privileges);
        let current: Vec<AclResourceEntity> =
            repository::search(tx, &Criteria::new().with_equals("aclRoleId", role_id)).await?;

        let desired: Vec<AclResourceEntity> = derived
            .iter()
            .map(|p| AclResourceEntity {
                id: None,
                acl_role_id: role_id.to_string(),
                resource: p.resource.clone(),
                privilege: p.privilege.clone(),
            })
            .collect();

        let diff = diff_by_key(current, desired, privilege_key, privilege_key);
        let stale = retain_deletable(diff.to_delete, &derived, self.options.privilege_policy);

        let mut result = ReconcileResult {
            deleted: ids_of(&stale),
            ..Default::default()
        };
        repository::delete_ids(tx, EntityKind::AclResource, &result.deleted).await?;
        let created = repository::create_all(tx, diff.to_create).await?;
        result.created = ids_of(&created);
        Ok(result)
    }
}

impl fmt::Debug for AppLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppLifecycle")
            .field("backend", &self.storage.backend_name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn commit_error(err: StorageError, app_name: &str) -> LifecycleError {
    match err {
        StorageError::UniqueViolation {
            kind: EntityKind::App,
            ..
        } => LifecycleError::conflict(app_name),
        other => other.into(),
    }
}

fn encode_icon(manifest: &Manifest) -> Option<String> {
    manifest.icon.as_ref().map(|bytes| STANDARD.encode(bytes))
}

fn privilege_key(row: &AclResourceEntity) -> (String, String) {
    (row.resource.clone(), row.privilege.clone())
}

/// Applies a diff whose rows are already in their final shape.
///
/// Updated rows inherit the persisted id; rows equal to their persisted
/// counterpart are not rewritten. Returns the final rows, updates first,
/// along with the touched ids.
async fn apply_diff<T>(
    tx: &mut dyn Transaction,
    diff: SetDiff<T, T>,
) -> LifecycleResult<(ReconcileResult, Vec<T>)>
where
    T: Entity + Clone + PartialEq,
{
    let mut result = ReconcileResult {
        deleted: ids_of(&diff.to_delete),
        ..Default::default()
    };
    repository::delete_ids(tx, T::KIND, &result.deleted).await?;

    let mut rows = Vec::with_capacity(diff.to_update.len() + diff.to_create.len());
    for (existing, mut desired) in diff.to_update {
        desired.set_id(existing.id().map(String::from));
        if desired == existing {
            rows.push(existing);
            continue;
        }
        let updated = repository::update(tx, &desired).await?;
        result.updated.extend(updated.id().map(String::from));
        rows.push(updated);
    }

    let created = repository::create_all(tx, diff.to_create).await?;
    result.created = ids_of(&created);
    rows.extend(created);

    Ok((result, rows))
}

async fn sync_action_buttons(
    tx: &mut dyn Transaction,
    app_id: &str,
    manifest: &Manifest,
) -> LifecycleResult<ReconcileResult> {
    let current: Vec<ActionButtonEntity> = repository::search(tx, &owned_by_app(app_id)).await?;
    let desired = manifest
        .action_buttons
        .iter()
        .map(|b| ActionButtonEntity {
            id: None,
            app_id: app_id.to_string(),
            entity: b.entity.clone(),
            view: b.view.clone(),
            action: b.action.clone(),
            label: b.label.clone(),
            url: b.url.clone(),
            open_new_tab: b.open_new_tab,
        })
        .collect();

    let key = |b: &ActionButtonEntity| (b.entity.clone(), b.view.clone(), b.action.clone());
    let (result, _) = apply_diff(tx, diff_by_key(current, desired, key, key)).await?;
    Ok(result)
}

async fn sync_webhooks(
    tx: &mut dyn Transaction,
    app_id: &str,
    manifest: &Manifest,
) -> LifecycleResult<ReconcileResult> {
    let current: Vec<WebhookEntity> = repository::search(tx, &owned_by_app(app_id)).await?;
    let desired = manifest
        .webhooks
        .iter()
        .map(|w| WebhookEntity {
            id: None,
            app_id: app_id.to_string(),
            name: w.name.clone(),
            event_name: w.event_name.clone(),
            url: w.url.clone(),
        })
        .collect();

    let key = |w: &WebhookEntity| w.name.clone();
    let (result, _) = apply_diff(tx, diff_by_key(current, desired, key, key)).await?;
    Ok(result)
}

/// Syncs the sets, then the relation rows of every declared set.
async fn sync_custom_field_sets(
    tx: &mut dyn Transaction,
    app_id: &str,
    manifest: &Manifest,
) -> LifecycleResult<(ReconcileResult, ReconcileResult)> {
    let current: Vec<CustomFieldSetEntity> = repository::search(tx, &owned_by_app(app_id)).await?;
    let desired = manifest
        .custom_field_sets
        .iter()
        .map(|s| CustomFieldSetEntity {
            id: None,
            app_id: app_id.to_string(),
            name: s.name.clone(),
            config: s.config.clone(),
        })
        .collect();

    let key = |s: &CustomFieldSetEntity| s.name.clone();
    let (sets, rows) = apply_diff(tx, diff_by_key(current, desired, key, key)).await?;

    let set_ids: HashMap<String, String> = rows
        .into_iter()
        .filter_map(|row| row.id.map(|id| (row.name, id)))
        .collect();

    let mut relations = ReconcileResult::default();
    for decl in &manifest.custom_field_sets {
        if let Some(set_id) = set_ids.get(&decl.name) {
            relations.merge(sync_relations(tx, set_id, decl).await?);
        }
    }
    Ok((sets, relations))
}

async fn sync_relations(
    tx: &mut dyn Transaction,
    set_id: &str,
    decl: &CustomFieldSetDecl,
) -> LifecycleResult<ReconcileResult> {
    let current: Vec<CustomFieldSetRelationEntity> = repository::search(
        tx,
        &Criteria::new().with_equals("customFieldSetId", set_id),
    )
    .await?;
    let desired = decl
        .relations
        .iter()
        .map(|entity_name| CustomFieldSetRelationEntity {
            id: None,
            custom_field_set_id: set_id.to_string(),
            entity_name: entity_name.clone(),
        })
        .collect();

    let key = |r: &CustomFieldSetRelationEntity| r.entity_name.clone();
    let (result, _) = apply_diff(tx, diff_by_key(current, desired, key, key)).await?;
    Ok(result)
}

/// At most one integration per app. Keys are generated on creation unless
/// supplied, and change afterwards only when the manifest supplies them.
async fn sync_integration(
    tx: &mut dyn Transaction,
    app_id: &str,
    manifest: &Manifest,
) -> LifecycleResult<ReconcileResult> {
    let current: Vec<IntegrationEntity> = repository::search(tx, &owned_by_app(app_id)).await?;
    let declared: Vec<_> = manifest.integration.iter().collect();

    // Unit key: the first persisted row is the app's integration
    let diff = diff_by_key(current, declared, |_| (), |_| ());

    let desired = SetDiff {
        to_create: diff
            .to_create
            .into_iter()
            .map(|d| IntegrationEntity {
                id: None,
                app_id: app_id.to_string(),
                label: d.label.clone(),
                access_key: d.access_key.clone().unwrap_or_else(generate_access_key),
                secret_access_key: d.secret_access_key.clone().unwrap_or_else(generate_secret),
                write_access: d.write_access,
            })
            .collect(),
        to_update: diff
            .to_update
            .into_iter()
            .map(|(existing, d)| {
                let next = IntegrationEntity {
                    label: d.label.clone(),
                    write_access: d.write_access,
                    access_key: d
                        .access_key
                        .clone()
                        .unwrap_or_else(|| existing.access_key.clone()),
                    secret_access_key: d
                        .secret_access_key
                        .clone()
                        .unwrap_or_else(|| existing.secret_access_key.clone()),
                    ..existing.clone()
                };
                (existing, next)
            })
            .collect(),
        to_delete: diff.to_delete,
    };

    let (result, _) = apply_diff(tx, desired).await?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_entries_released_after_use() {
        let lifecycle = AppLifecycle::new(Arc::new(appdeck_db_memory::InMemoryStorage::new()));

        let first = lifecycle.lock("id:a".to_string()).await;
        assert_eq!(lifecycle.lock_count(), 1);
        drop(first);
        assert_eq!(lifecycle.lock_count(), 0);

        // An entry survives while another caller is queued on it
        let held = lifecycle.lock("id:a".to_string()).await;
        let (waiting, _) = tokio::join!(lifecycle.lock("id:a".to_string()), async {
            tokio::task::yield_now().await;
            assert_eq!(lifecycle.lock_count(), 1);
            drop(held);
        });
        assert_eq!(lifecycle.lock_count(), 1);
        drop(waiting);
        assert_eq!(lifecycle.lock_count(), 0);
    }

    #[test]
    fn test_cli_context_carries_actor() {
        let ctx = Context::cli().with_actor("ops");
        assert_eq!(ctx.source, ContextSource::Cli);
        assert_eq!(ctx.actor(), "ops");
        assert_eq!(Context::system().actor(), "-");
    }

    #[test]
    fn test_default_options() {
        let options = LifecycleOptions::default();
        assert_eq!(options.privilege_policy, PrivilegePolicy::Exact);
        assert_eq!(options.implied_button_privileges, vec!["list", "detail"]);
    }

    #[test]
    fn test_commit_unique_violation_maps_to_conflict() {
        let err = commit_error(
            StorageError::unique_violation(EntityKind::App, "name", "SwagApp"),
            "SwagApp",
        );
        assert!(matches!(err, LifecycleError::Conflict { ref name } if name == "SwagApp"));

        let err = commit_error(StorageError::version_conflict("1", "2"), "SwagApp");
        assert!(matches!(err, LifecycleError::Storage(_)));
    }

    #[test]
    fn test_report_merges_per_kind() {
        let app = AppEntity {
            id: Some("a".into()),
            name: "SwagApp".into(),
            version: "1.0.0".into(),
            label: Default::default(),
            icon: None,
            path: String::new(),
            access_token: "t".into(),
            acl_role_id: "r".into(),
            modules: Vec::new(),
        };
        let mut report = ReconcileReport::new(app);
        report.record(
            EntityKind::CustomFieldSetRelation,
            ReconcileResult {
                created: vec!["r1".into()],
                ..Default::default()
            },
        );
        report.record(
            EntityKind::CustomFieldSetRelation,
            ReconcileResult {
                deleted: vec!["r2".into()],
                ..Default::default()
            },
        );

        let relations = report
            .changes_for(EntityKind::CustomFieldSetRelation)
            .unwrap();
        assert_eq!(relations.created, vec!["r1"]);
        assert_eq!(relations.deleted, vec!["r2"]);
    }
}
