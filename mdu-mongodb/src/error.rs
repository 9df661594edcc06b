//! Error types for model persistence.
//!
//! Callers inspect [`MduError::kind`] to tell "nothing happened"
//! (validation, before-hook, not found, cancelled) from "the mutation
//! committed but an after-hook failed" (a [`MduError::Hook`] whose point is an
//! after-hook).

use std::fmt;

use thiserror::Error;

use crate::hooks::HookPoint;

/// Result type for persistence operations.
pub type MduResult<T> = Result<T, MduError>;

/// Error returned by a lifecycle hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during persistence operations.
#[derive(Error, Debug)]
pub enum MduError {
    /// Identifier preparation rejected the input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A lifecycle hook failed.
    #[error("{point} hook failed: {source}")]
    Hook {
        /// Lifecycle point that failed.
        point: HookPoint,
        /// The hook's own error.
        #[source]
        source: HookError,
    },

    /// No document matched a single-result read.
    #[error("document not found: {0}")]
    NotFound(String),

    /// MongoDB driver error.
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// BSON serialization error.
    #[error("bson error: {0}")]
    Bson(#[from] bson::ser::Error),

    /// BSON deserialization error.
    #[error("bson deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),

    /// Failure reported by a non-MongoDB driver.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The operation context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The operation context deadline passed.
    #[error("operation timed out after {0}ms")]
    Timeout(u64),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of [`MduError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Identifier preparation failed; nothing was written.
    Validation,
    /// A lifecycle hook failed.
    Hook,
    /// A single-result read matched nothing.
    NotFound,
    /// The driver call itself failed.
    Persistence,
    /// Cancelled or past its deadline.
    Cancelled,
    /// Bad configuration.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Hook => "hook",
            ErrorKind::NotFound => "not found",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}

impl MduError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a hook failure with the lifecycle point it came from.
    pub fn hook(point: HookPoint, source: HookError) -> Self {
        Self::Hook { point, source }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Hook { .. } => ErrorKind::Hook,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Driver(_) | Self::Bson(_) | Self::BsonDe(_) | Self::Persistence(_) => {
                ErrorKind::Persistence
            }
            Self::Cancelled | Self::Timeout(_) => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// The lifecycle point of a hook error.
    pub fn hook_point(&self) -> Option<HookPoint> {
        match self {
            Self::Hook { point, .. } => Some(*point),
            _ => None,
        }
    }

    /// Whether the driver call completed before an after-hook failed.
    ///
    /// The write may still have matched nothing; the `updated` and `deleted`
    /// hooks see the counts.
    pub fn is_after_commit(&self) -> bool {
        self.hook_point().is_some_and(|point| !point.is_before())
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if the underlying driver call failed.
    pub fn is_persistence(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if the context was cancelled or expired.
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}
