//! Storage types for the entity storage abstraction layer.

use appdeck_core::EntityKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// An entity row as stored in the storage backend.
///
/// `data` always carries the row's `id` as a top-level field so that typed
/// views can be deserialized straight from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntity {
    /// The entity ID.
    pub id: String,
    /// The entity kind.
    pub kind: EntityKind,
    /// The version ID, bumped on every write.
    pub version_id: String,
    /// The full entity content as JSON (camelCase fields).
    pub data: Value,
    /// When the entity was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the entity was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl StoredEntity {
    /// Creates a new `StoredEntity`.
    #[must_use]
    pub fn new(
        kind: EntityKind,
        id: impl Into<String>,
        version_id: impl Into<String>,
        data: Value,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: id.into(),
            kind,
            version_id: version_id.into(),
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a new version of this entity with updated content.
    #[must_use]
    pub fn new_version(&self, version_id: impl Into<String>, data: Value) -> Self {
        Self {
            id: self.id.clone(),
            kind: self.kind,
            version_id: version_id.into(),
            data,
            created_at: self.created_at,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    /// Returns a top-level field of the entity data.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Returns the reference to this entity.
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind, self.id.clone())
    }
}

/// Reference to a single stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// A single search filter on a top-level field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Filter {
    /// Field equals the given JSON value.
    Equals { field: String, value: Value },
    /// Field equals any of the given JSON values.
    EqualsAny { field: String, values: Vec<Value> },
}

impl Filter {
    /// Returns `true` if the entity data satisfies this filter.
    #[must_use]
    pub fn matches(&self, data: &Value) -> bool {
        match self {
            Filter::Equals { field, value } => data.get(field) == Some(value),
            Filter::EqualsAny { field, values } => data
                .get(field)
                .is_some_and(|actual| values.iter().any(|v| v == actual)),
        }
    }
}

/// Search criteria: optional id restriction, field filters and a limit.
///
/// All filters must match. Results come back in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    /// Restrict results to these ids.
    pub ids: Option<Vec<String>>,
    /// Field filters (AND-combined).
    pub filters: Vec<Filter>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl Criteria {
    /// Creates criteria matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to the given ids.
    #[must_use]
    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn with_equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Equals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a set-membership filter.
    #[must_use]
    pub fn with_equals_any<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(Filter::EqualsAny {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Sets the maximum number of results.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if the entity satisfies the id restriction and all filters.
    #[must_use]
    pub fn matches(&self, entity: &StoredEntity) -> bool {
        if let Some(ids) = &self.ids
            && !ids.iter().any(|id| id == &entity.id)
        {
            return false;
        }
        self.filters.iter().all(|f| f.matches(&entity.data))
    }
}

/// Result of a search operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching entities.
    pub entries: Vec<StoredEntity>,
    /// Total count of matching entities before the limit was applied.
    pub total: usize,
}

impl SearchResult {
    /// Creates a new empty `SearchResult`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a result from all matches, applying an optional limit.
    #[must_use]
    pub fn from_matches(mut entries: Vec<StoredEntity>, limit: Option<usize>) -> Self {
        let total = entries.len();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Self { entries, total }
    }

    /// Returns the number of entries in this result.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the ids of all entries.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webhook(id: &str, app_id: &str, event: &str) -> StoredEntity {
        StoredEntity::new(
            EntityKind::Webhook,
            id,
            "1",
            json!({"id": id, "appId": app_id, "eventName": event}),
        )
    }

    #[test]
    fn test_criteria_matches_filters() {
        let row = webhook("w1", "a1", "order.placed");

        assert!(Criteria::new().matches(&row));
        assert!(Criteria::new().with_equals("appId", "a1").matches(&row));
        assert!(!Criteria::new().with_equals("appId", "a2").matches(&row));
        assert!(
            !Criteria::new()
                .with_equals("appId", "a1")
                .with_equals("eventName", "other")
                .matches(&row)
        );
        assert!(!Criteria::new().with_equals("missing", "x").matches(&row));
    }

    #[test]
    fn test_criteria_matches_ids() {
        let row = webhook("w1", "a1", "order.placed");

        assert!(Criteria::new().with_ids(["w1", "w2"]).matches(&row));
        assert!(!Criteria::new().with_ids(["w2"]).matches(&row));
        assert!(!Criteria::new().with_ids(Vec::<String>::new()).matches(&row));
    }

    #[test]
    fn test_criteria_equals_any() {
        let row = webhook("w1", "a1", "order.placed");

        assert!(
            Criteria::new()
                .with_equals_any("appId", ["a0", "a1"])
                .matches(&row)
        );
        assert!(!Criteria::new().with_equals_any("appId", ["a0"]).matches(&row));
    }

    #[test]
    fn test_search_result_limit() {
        let rows = vec![
            webhook("w1", "a", "e"),
            webhook("w2", "a", "e"),
            webhook("w3", "a", "e"),
        ];
        let result = SearchResult::from_matches(rows, Some(2));

        assert_eq!(result.len(), 2);
        assert_eq!(result.total, 3);
        assert_eq!(result.ids(), vec!["w1", "w2"]);
    }

    #[test]
    fn test_new_version_keeps_created_at() {
        let row = webhook("w1", "a", "e");
        let next = row.new_version("2", json!({"id": "w1"}));

        assert_eq!(next.created_at, row.created_at);
        assert_eq!(next.version_id, "2");
        assert_eq!(next.entity_ref(), EntityRef::new(EntityKind::Webhook, "w1"));
    }
}
