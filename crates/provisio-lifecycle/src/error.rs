//! Error taxonomy of the lifecycle engine.

use provisio_authorization::{AuthorizationError, OracleError};
use provisio_core::MissingValueError;
use thiserror::Error;

use crate::patch::Operation;

/// Errors reported by a [`ResourceStore`](crate::storage::ResourceStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// An entity with the same identifier already exists.
    #[error("Duplicate identifier: {0}")]
    Duplicate(String),

    /// The backing store failed.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors that can occur while running a resource operation.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Authorization input (tenant, subject) was present but empty.
    #[error("{message}")]
    AuthorizationInput { code: &'static str, message: String },

    #[error("No authorization to access this resource")]
    AccessDenied,

    #[error("{resource} with id '{id}' not found")]
    EntityNotFound { resource: &'static str, id: String },

    /// Schema validation produced one or more messages.
    #[error("Invalid entity: {}", .0.join("; "))]
    EntityInvalid(Vec<String>),

    #[error("List of operations can't be empty.")]
    EmptyPatch,

    #[error("Cannot update {field}")]
    ReadOnlyField { field: String },

    /// A patch operation's value could not be applied to its field.
    #[error("Cannot apply operation '{operation}': {source}")]
    OperationApply {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    #[error("Operation {operation} is not implemented")]
    NotImplemented { operation: &'static str },

    #[error(transparent)]
    MissingValue(#[from] MissingValueError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The patch document is malformed or names an unknown field.
    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthorizationError> for LifecycleError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::MissingValue(e) => Self::MissingValue(e),
            AuthorizationError::InvalidInput { code, message } => {
                Self::AuthorizationInput { code, message }
            }
            AuthorizationError::AccessDenied => Self::AccessDenied,
            AuthorizationError::Cancelled => Self::Cancelled,
            AuthorizationError::Oracle(e) => Self::Oracle(e),
        }
    }
}

impl LifecycleError {
    /// HTTP-style status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AuthorizationInput { .. }
            | Self::EntityInvalid(_)
            | Self::EmptyPatch
            | Self::ReadOnlyField { .. }
            | Self::OperationApply { .. }
            | Self::MissingValue(_)
            | Self::InvalidInput(_)
            | Self::InvalidPatch(_) => 400,
            Self::AccessDenied => 403,
            Self::EntityNotFound { .. } => 404,
            Self::Storage(StorageError::Duplicate(_)) => 409,
            Self::Cancelled => 499,
            Self::NotImplemented { .. } => 501,
            Self::Oracle(_) => 503,
            Self::Storage(StorageError::Backend(_))
            | Self::Serialization(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthorizationInput { code, .. } => code,
            Self::AccessDenied => "UNAUTHORIZED_ACCESS",
            Self::EntityNotFound { .. } => "ENTITY_NOT_FOUND",
            Self::EntityInvalid(_) => "ENTITY_INVALID",
            Self::EmptyPatch => "EMPTY_PATCH",
            Self::ReadOnlyField { .. } => "READ_ONLY_FIELD",
            Self::OperationApply { .. } => "OPERATION_APPLY_FAILED",
            Self::NotImplemented { .. } => "NOT_IMPLEMENTED",
            Self::MissingValue(_) => "MISSING_VALUE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidPatch(_) => "INVALID_PATCH",
            Self::Cancelled => "CANCELLED",
            Self::Oracle(_) => "PERMISSION_ORACLE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convenience Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;
