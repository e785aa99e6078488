//! Table set with schema enforcement.
//!
//! `Tables` is the plain data structure behind both the live store and each
//! transaction's working copy. Every mutation validates before it changes
//! anything, so a failed call leaves the tables untouched.

use std::collections::{BTreeMap, VecDeque};

use appdeck_core::EntityKind;
use appdeck_storage::{Criteria, EntityRef, SearchResult, StorageError, StoredEntity};
use indexmap::IndexMap;
use serde_json::Value;

/// One table per kind, rows kept in insertion order.
pub(crate) type Table = IndexMap<String, StoredEntity>;

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    tables: BTreeMap<EntityKind, Table>,
}

impl Tables {
    pub(crate) fn get(&self, kind: EntityKind, id: &str) -> Option<&StoredEntity> {
        self.tables.get(&kind).and_then(|t| t.get(id))
    }

    pub(crate) fn len(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map_or(0, IndexMap::len)
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &StoredEntity> {
        self.tables.values().flat_map(IndexMap::values)
    }

    pub(crate) fn search(&self, kind: EntityKind, criteria: &Criteria) -> SearchResult {
        let matches = self
            .tables
            .get(&kind)
            .map(|table| {
                table
                    .values()
                    .filter(|row| criteria.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        SearchResult::from_matches(matches, criteria.limit)
    }

    /// Inserts a new row.
    pub(crate) fn insert(&mut self, entity: StoredEntity) -> Result<(), StorageError> {
        if self.get(entity.kind, &entity.id).is_some() {
            return Err(StorageError::already_exists(entity.kind, &entity.id));
        }
        self.check_unique(&entity)?;
        self.tables
            .entry(entity.kind)
            .or_default()
            .insert(entity.id.clone(), entity);
        Ok(())
    }

    /// Replaces an existing row, keeping its position and creation time.
    ///
    /// `expected_version` enables the optimistic concurrency check.
    pub(crate) fn replace(
        &mut self,
        entity: StoredEntity,
        expected_version: Option<&str>,
    ) -> Result<StoredEntity, StorageError> {
        let existing = self
            .get(entity.kind, &entity.id)
            .ok_or_else(|| StorageError::not_found(entity.kind, &entity.id))?;

        if let Some(expected) = expected_version
            && existing.version_id != expected
        {
            return Err(StorageError::version_conflict(
                expected,
                existing.version_id.clone(),
            ));
        }

        let stored = StoredEntity {
            created_at: existing.created_at,
            ..entity
        };
        self.check_unique(&stored)?;

        if let Some(slot) = self
            .tables
            .get_mut(&stored.kind)
            .and_then(|t| t.get_mut(&stored.id))
        {
            *slot = stored.clone();
        }
        Ok(stored)
    }

    /// Removes a row and, recursively, every row referencing it.
    ///
    /// Returns the removed rows, the requested one first.
    pub(crate) fn remove_cascade(
        &mut self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Vec<EntityRef>, StorageError> {
        if self.get(kind, id).is_none() {
            return Err(StorageError::not_found(kind, id));
        }

        let mut removed = Vec::new();
        let mut queue = VecDeque::from([EntityRef::new(kind, id)]);

        while let Some(target) = queue.pop_front() {
            let Some(table) = self.tables.get_mut(&target.kind) else {
                continue;
            };
            if table.shift_remove(&target.id).is_none() {
                continue;
            }

            let owner_id = Value::String(target.id.clone());
            for (dependent, field) in target.kind.dependents() {
                if let Some(rows) = self.tables.get(&dependent) {
                    queue.extend(
                        rows.values()
                            .filter(|row| row.field(field) == Some(&owner_id))
                            .map(StoredEntity::entity_ref),
                    );
                }
            }
            removed.push(target);
        }

        Ok(removed)
    }

    fn check_unique(&self, entity: &StoredEntity) -> Result<(), StorageError> {
        let Some(table) = self.tables.get(&entity.kind) else {
            return Ok(());
        };
        for field in entity.kind.unique_fields() {
            let Some(value) = entity.field(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = table
                .values()
                .any(|row| row.id != entity.id && row.field(field) == Some(value));
            if taken {
                let shown = value
                    .as_str()
                    .map_or_else(|| value.to_string(), str::to_string);
                return Err(StorageError::unique_violation(entity.kind, *field, shown));
            }
        }
        Ok(())
    }
}

/// Ensures `data` is an object and carries `id`.
pub(crate) fn with_id(data: &Value, id: &str) -> Result<Value, StorageError> {
    let mut data = data.clone();
    let obj = data
        .as_object_mut()
        .ok_or_else(|| StorageError::invalid_entity("entity data must be a JSON object"))?;
    obj.insert("id".to_string(), Value::String(id.to_string()));
    Ok(data)
}

/// Extracts the `id` field required for updates.
pub(crate) fn require_id(data: &Value) -> Result<String, StorageError> {
    data.get("id")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| StorageError::invalid_entity("missing id field for update"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(kind: EntityKind, id: &str, data: Value) -> StoredEntity {
        StoredEntity::new(kind, id, "1", with_id(&data, id).unwrap())
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut tables = Tables::default();
        tables
            .insert(row(EntityKind::Webhook, "w1", json!({})))
            .unwrap();

        let err = tables
            .insert(row(EntityKind::Webhook, "w1", json!({})))
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
    }

    #[test]
    fn test_unique_app_name() {
        let mut tables = Tables::default();
        tables
            .insert(row(EntityKind::App, "a1", json!({"name": "SwagApp"})))
            .unwrap();

        let err = tables
            .insert(row(EntityKind::App, "a2", json!({"name": "SwagApp"})))
            .unwrap_err();
        assert!(err.is_unique_violation());

        // Replacing the same row with the same name is fine
        tables
            .replace(
                row(EntityKind::App, "a1", json!({"name": "SwagApp"})),
                None,
            )
            .unwrap();
    }

    #[test]
    fn test_replace_version_check() {
        let mut tables = Tables::default();
        tables
            .insert(row(EntityKind::Webhook, "w1", json!({})))
            .unwrap();

        let next = StoredEntity::new(EntityKind::Webhook, "w1", "2", json!({"id": "w1"}));
        let err = tables.replace(next.clone(), Some("7")).unwrap_err();
        assert!(err.is_version_conflict());

        let stored = tables.replace(next, Some("1")).unwrap();
        assert_eq!(stored.version_id, "2");
    }

    #[test]
    fn test_remove_cascades_through_owned_rows() {
        let mut tables = Tables::default();
        tables
            .insert(row(EntityKind::App, "a1", json!({"name": "A"})))
            .unwrap();
        tables
            .insert(row(EntityKind::Webhook, "w1", json!({"appId": "a1"})))
            .unwrap();
        tables
            .insert(row(EntityKind::CustomFieldSet, "s1", json!({"appId": "a1"})))
            .unwrap();
        tables
            .insert(row(
                EntityKind::CustomFieldSetRelation,
                "r1",
                json!({"customFieldSetId": "s1"}),
            ))
            .unwrap();
        tables
            .insert(row(EntityKind::Webhook, "w2", json!({"appId": "other"})))
            .unwrap();

        let removed = tables.remove_cascade(EntityKind::App, "a1").unwrap();

        assert_eq!(removed[0], EntityRef::new(EntityKind::App, "a1"));
        assert_eq!(removed.len(), 4);
        assert!(removed.contains(&EntityRef::new(
            EntityKind::CustomFieldSetRelation,
            "r1"
        )));
        assert_eq!(tables.len(EntityKind::Webhook), 1);
        assert_eq!(tables.len(EntityKind::CustomFieldSetRelation), 0);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut tables = Tables::default();
        let err = tables.remove_cascade(EntityKind::App, "nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_with_id_requires_object() {
        assert!(with_id(&json!([1, 2]), "x").is_err());
        assert_eq!(with_id(&json!({}), "x").unwrap()["id"], "x");
    }
}
