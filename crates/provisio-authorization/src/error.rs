//! Error types for the authorization gate.

use provisio_core::MissingValueError;
use thiserror::Error;

pub const TENANT_REQUIRED_FOR_AUTHORIZATION: &str = "TENANT_REQUIRED_FOR_AUTHORIZATION";
pub const USER_EMAIL_REQUIRED_FOR_AUTHORIZATION: &str = "USER_EMAIL_REQUIRED_FOR_AUTHORIZATION";
pub const RESOURCE_REQUIRED_FOR_AUTHORIZATION: &str = "RESOURCE_REQUIRED_FOR_AUTHORIZATION";
pub const ACTION_REQUIRED_FOR_AUTHORIZATION: &str = "ACTION_REQUIRED_FOR_AUTHORIZATION";
pub const UNAUTHORIZED_ACCESS: &str = "UNAUTHORIZED_ACCESS";

/// Errors raised by a permission oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The oracle could not be reached or failed internally.
    #[error("Permission oracle unavailable: {0}")]
    Unavailable(String),

    /// The oracle rejected the request as malformed.
    #[error("Invalid authorization request: {0}")]
    InvalidRequest(String),
}

/// A policy document could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid policy at line {line}: {message}")]
pub struct PolicyParseError {
    pub line: usize,
    pub message: String,
}

/// Errors that can occur while authorizing an operation.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// A required context value (subject or tenant) was absent.
    #[error(transparent)]
    MissingValue(#[from] MissingValueError),

    /// A required authorization input was present but empty.
    #[error("{message}")]
    InvalidInput { code: &'static str, message: String },

    /// The oracle denied the request.
    #[error("No authorization to access this resource")]
    AccessDenied,

    /// The operation was cancelled before the decision.
    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl AuthorizationError {
    pub(crate) fn tenant_required() -> Self {
        Self::InvalidInput {
            code: TENANT_REQUIRED_FOR_AUTHORIZATION,
            message: "Tenant is required for authorization".to_string(),
        }
    }

    pub(crate) fn user_email_required() -> Self {
        Self::InvalidInput {
            code: USER_EMAIL_REQUIRED_FOR_AUTHORIZATION,
            message: "User email is required for authorization".to_string(),
        }
    }

    pub(crate) fn resource_required() -> Self {
        Self::InvalidInput {
            code: RESOURCE_REQUIRED_FOR_AUTHORIZATION,
            message: "Resource is required for authorization".to_string(),
        }
    }

    pub(crate) fn action_required() -> Self {
        Self::InvalidInput {
            code: ACTION_REQUIRED_FOR_AUTHORIZATION,
            message: "Action is required for authorization".to_string(),
        }
    }

    /// Machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingValue(_) => "MISSING_VALUE",
            Self::InvalidInput { code, .. } => code,
            Self::AccessDenied => UNAUTHORIZED_ACCESS,
            Self::Cancelled => "CANCELLED",
            Self::Oracle(_) => "PERMISSION_ORACLE_ERROR",
        }
    }
}

/// Convenience Result type for the authorization gate.
pub type Result<T> = std::result::Result<T, AuthorizationError>;
