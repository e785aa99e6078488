//! Event types for the write-notification system.
//!
//! The storage layer publishes one [`EntityWrittenEvent`] per entity kind
//! after a successful write (or commit), listing every row that was
//! created, updated or deleted.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::kind::EntityKind;

/// Type of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOperation {
    /// Row was created
    Created,
    /// Row was updated
    Updated,
    /// Row was deleted
    Deleted,
}

impl WriteOperation {
    /// Returns the string representation of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOperation::Created => "created",
            WriteOperation::Updated => "updated",
            WriteOperation::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single row touched by a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityWrite {
    pub id: String,
    pub operation: WriteOperation,
}

impl EntityWrite {
    pub fn new(id: impl Into<String>, operation: WriteOperation) -> Self {
        Self {
            id: id.into(),
            operation,
        }
    }
}

/// "Entity written" notification for one kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityWrittenEvent {
    /// Kind of the rows that were written
    pub kind: EntityKind,
    /// Rows touched, in write order
    pub writes: Vec<EntityWrite>,
    /// Timestamp of the event
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl EntityWrittenEvent {
    /// Create a new written event.
    pub fn new(kind: EntityKind, writes: Vec<EntityWrite>) -> Self {
        Self {
            kind,
            writes,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Create an event for a single row.
    pub fn single(kind: EntityKind, id: impl Into<String>, operation: WriteOperation) -> Self {
        Self::new(kind, vec![EntityWrite::new(id, operation)])
    }

    /// Name of the event as seen by subscribers, e.g. `webhook.written`.
    pub fn name(&self) -> String {
        format!("{}.written", self.kind)
    }

    /// Ids of all rows touched by this event.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.writes.iter().map(|w| w.id.as_str())
    }

    /// Ids of rows touched with the given operation.
    pub fn ids_with(&self, operation: WriteOperation) -> Vec<&str> {
        self.writes
            .iter()
            .filter(|w| w.operation == operation)
            .map(|w| w.id.as_str())
            .collect()
    }

    /// Check if this event matches a kind filter.
    pub fn matches_kind(&self, kinds: &[EntityKind]) -> bool {
        kinds.is_empty() || kinds.contains(&self.kind)
    }
}

/// Group writes by kind, preserving first-seen kind order.
pub fn group_writes(writes: Vec<(EntityKind, EntityWrite)>) -> Vec<EntityWrittenEvent> {
    let mut events: Vec<EntityWrittenEvent> = Vec::new();
    for (kind, write) in writes {
        match events.iter_mut().find(|e| e.kind == kind) {
            Some(event) => event.writes.push(write),
            None => events.push(EntityWrittenEvent::new(kind, vec![write])),
        }
    }
    events
}
