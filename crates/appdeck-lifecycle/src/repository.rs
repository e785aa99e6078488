//! Typed repository helpers over the storage traits.
//!
//! Writes go through the caller's [`Transaction`] so they join its unit of
//! work. Reads come in two flavours: inside a transaction (seeing its own
//! writes) and against committed storage.

use appdeck_core::EntityKind;
use appdeck_storage::{Criteria, EntityRef, EntityStorage, StoredEntity, Transaction};
use serde_json::Value;

use crate::entities::Entity;
use crate::error::{LifecycleError, LifecycleResult};

pub fn decode<T: Entity>(stored: StoredEntity) -> LifecycleResult<T> {
    Ok(serde_json::from_value(stored.data)?)
}

fn encode<T: Entity>(row: &T) -> LifecycleResult<Value> {
    Ok(serde_json::to_value(row)?)
}

pub async fn create<T: Entity>(tx: &mut dyn Transaction, row: &T) -> LifecycleResult<T> {
    let stored = tx.create(T::KIND, &encode(row)?).await?;
    decode(stored)
}

pub async fn create_all<T: Entity>(tx: &mut dyn Transaction, rows: Vec<T>) -> LifecycleResult<Vec<T>> {
    let mut created = Vec::with_capacity(rows.len());
    for row in &rows {
        created.push(create(tx, row).await?);
    }
    Ok(created)
}

pub async fn update<T: Entity>(tx: &mut dyn Transaction, row: &T) -> LifecycleResult<T> {
    if row.id().is_none() {
        return Err(LifecycleError::validation(format!(
            "cannot update {} without id",
            T::KIND
        )));
    }
    let stored = tx.update(T::KIND, &encode(row)?).await?;
    decode(stored)
}

/// Deletes rows by id, returning every removed row including cascades.
pub async fn delete_ids(
    tx: &mut dyn Transaction,
    kind: EntityKind,
    ids: &[String],
) -> LifecycleResult<Vec<EntityRef>> {
    let mut removed = Vec::new();
    for id in ids {
        // An earlier cascade in this batch may already have removed the row
        if tx.read(kind, id).await?.is_none() {
            continue;
        }
        removed.extend(tx.delete(kind, id).await?);
    }
    Ok(removed)
}

pub async fn read<T: Entity>(tx: &dyn Transaction, id: &str) -> LifecycleResult<Option<T>> {
    tx.read(T::KIND, id).await?.map(decode).transpose()
}

pub async fn search<T: Entity>(tx: &dyn Transaction, criteria: &Criteria) -> LifecycleResult<Vec<T>> {
    let result = tx.search(T::KIND, criteria).await?;
    result.entries.into_iter().map(decode).collect()
}

/// Searches committed rows outside any transaction.
pub async fn search_committed<T: Entity>(
    storage: &dyn EntityStorage,
    criteria: &Criteria,
) -> LifecycleResult<Vec<T>> {
    let result = storage.search(T::KIND, criteria).await?;
    result.entries.into_iter().map(decode).collect()
}

/// Criteria selecting the rows owned by one app.
pub fn owned_by_app(app_id: &str) -> Criteria {
    Criteria::new().with_equals("appId", app_id)
}

/// Ids of persisted rows.
pub fn ids_of<T: Entity>(rows: &[T]) -> Vec<String> {
    rows.iter().filter_map(|r| r.id().map(String::from)).collect()
}
