use thiserror::Error;

/// Core error types for Appdeck operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid entity kind: {0}")]
    InvalidEntityKind(String),
}

impl CoreError {
    /// Create a new InvalidEntityKind error
    pub fn invalid_entity_kind(kind: impl Into<String>) -> Self {
        Self::InvalidEntityKind(kind.into())
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidEntityKind(_) => ErrorCategory::Validation,
        }
    }
}

/// Error categories shared by the library crates' error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Serialization,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Serialization => write!(f, "serialization"),
            Self::System => write!(f, "system"),
        }
    }
}
