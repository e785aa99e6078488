//! Storage error types for the entity storage abstraction layer.

use std::fmt;

use appdeck_core::EntityKind;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested entity was not found.
    #[error("Entity not found: {kind}/{id}")]
    NotFound {
        /// The kind of entity that was not found.
        kind: EntityKind,
        /// The ID of the entity that was not found.
        id: String,
    },

    /// A version conflict occurred during an update operation.
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict {
        /// The expected version ID.
        expected: String,
        /// The actual version ID found.
        actual: String,
    },

    /// Attempted to create an entity whose id already exists.
    #[error("Entity already exists: {kind}/{id}")]
    AlreadyExists {
        /// The kind of entity that already exists.
        kind: EntityKind,
        /// The ID of the entity that already exists.
        id: String,
    },

    /// A unique field constraint was violated.
    #[error("Unique constraint violated: {kind}.{field} = {value}")]
    UniqueViolation {
        /// The kind carrying the constraint.
        kind: EntityKind,
        /// The constrained field.
        field: String,
        /// The duplicated value.
        value: String,
    },

    /// The entity data is invalid.
    #[error("Invalid entity: {message}")]
    InvalidEntity {
        /// Description of why the entity is invalid.
        message: String,
    },

    /// An error occurred during a transaction.
    #[error("Transaction error: {message}")]
    TransactionError {
        /// Description of the transaction error.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a new `VersionConflict` error.
    #[must_use]
    pub fn version_conflict(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::VersionConflict {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    /// Creates a new `UniqueViolation` error.
    #[must_use]
    pub fn unique_violation(
        kind: EntityKind,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::UniqueViolation {
            kind,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a new `InvalidEntity` error.
    #[must_use]
    pub fn invalid_entity(message: impl Into<String>) -> Self {
        Self::InvalidEntity {
            message: message.into(),
        }
    }

    /// Creates a new `TransactionError` error.
    #[must_use]
    pub fn transaction_error(message: impl Into<String>) -> Self {
        Self::TransactionError {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Returns `true` if this is a unique constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::VersionConflict { .. }
            | Self::AlreadyExists { .. }
            | Self::UniqueViolation { .. } => ErrorCategory::Conflict,
            Self::InvalidEntity { .. } => ErrorCategory::Validation,
            Self::TransactionError { .. } => ErrorCategory::Transaction,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_entity(err.to_string())
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Entity not found.
    NotFound,
    /// Conflict (version, existence or uniqueness).
    Conflict,
    /// Validation error.
    Validation,
    /// Transaction-related error.
    Transaction,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Transaction => write!(f, "transaction"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found(EntityKind::App, "123");
        assert_eq!(err.to_string(), "Entity not found: app/123");

        let err = StorageError::version_conflict("1", "2");
        assert_eq!(err.to_string(), "Version conflict: expected 1, found 2");

        let err = StorageError::unique_violation(EntityKind::App, "name", "SwagApp");
        assert_eq!(
            err.to_string(),
            "Unique constraint violated: app.name = SwagApp"
        );
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::not_found(EntityKind::Webhook, "123");
        assert!(err.is_not_found());
        assert!(!err.is_version_conflict());
        assert!(!err.is_unique_violation());

        let err = StorageError::unique_violation(EntityKind::App, "name", "x");
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found(EntityKind::App, "1").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::already_exists(EntityKind::App, "1").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::unique_violation(EntityKind::App, "name", "x").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::invalid_entity("bad data").category(),
            ErrorCategory::Validation
        );
        assert_eq!(ErrorCategory::Transaction.to_string(), "transaction");
    }
}
