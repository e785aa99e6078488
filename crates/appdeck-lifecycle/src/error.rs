//! Errors raised by app lifecycle operations.

use appdeck_core::ErrorCategory;
use appdeck_storage::StorageError;

/// Errors returned by install, update and delete.
///
/// Any error means nothing was persisted by the failing call.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The manifest is structurally invalid.
    #[error("Invalid manifest: {message}")]
    Validation { message: String },

    /// An app with the same name is already installed.
    #[error("App already installed: {name}")]
    Conflict { name: String },

    /// The referenced app does not exist.
    #[error("App not found: {id}")]
    NotFound { id: String },

    /// The underlying storage failed; the unit of work was rolled back.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A stored row could not be converted to or from its typed form.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LifecycleError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(name: impl Into<String>) -> Self {
        Self::Conflict { name: name.into() }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Get error category for metrics and logging.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Storage(err) => match err.category() {
                appdeck_storage::ErrorCategory::NotFound => ErrorCategory::NotFound,
                appdeck_storage::ErrorCategory::Conflict => ErrorCategory::Conflict,
                appdeck_storage::ErrorCategory::Validation => ErrorCategory::Validation,
                appdeck_storage::ErrorCategory::Transaction
                | appdeck_storage::ErrorCategory::Internal => ErrorCategory::System,
            },
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
