//! Error handling for the review authority
//!
//! Every failure of an impersonation or mentor decision is terminal for the
//! triggering request. The variants below carry enough context to build the
//! message shown to the user.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Characters rejected in any name field.
pub const SPECIAL_CHARS: &str = "/\\?<>|&$#";

/// Main error type for impersonation and mentor decisions
#[derive(Error, Debug)]
pub enum AuthorityError {
    #[error("{field} must not contain special characters '{chars}'.")]
    InvalidInput { field: String, chars: String },

    #[error("No user exists with the name '{name}'.")]
    UserNotFound { name: String },

    #[error("You cannot impersonate {name}.")]
    ImpersonationNotPermitted { name: String },

    #[error("{name} is not allowed to impersonate other users.")]
    ImpersonationNotAllowed { name: String },

    #[error("No original account was found. Please close your browser and start a new session.")]
    NoOriginalAccount,

    #[error("No mentor is available for assignment {assignment_id}.")]
    NoMentorAvailable { assignment_id: u64 },

    #[error("{message}")]
    OperationFailed { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for Result with AuthorityError
pub type AuthorityResult<T> = Result<T, AuthorityError>;

/// Failure reported by an external store (identity directory, session store,
/// mentor/team persistence).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct StoreError {
    pub operation: String,
    pub message: String,
}

impl StoreError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

impl AuthorityError {
    /// Create an invalid input error for a field containing special characters
    pub fn invalid_input(field: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            chars: SPECIAL_CHARS.to_string(),
        }
    }

    pub fn user_not_found(name: impl Into<String>) -> Self {
        Self::UserNotFound { name: name.into() }
    }

    pub fn not_permitted(name: impl Into<String>) -> Self {
        Self::ImpersonationNotPermitted { name: name.into() }
    }

    /// Create an error for a caller that fails the impersonation gate
    pub fn not_allowed(name: impl Into<String>) -> Self {
        Self::ImpersonationNotAllowed { name: name.into() }
    }

    pub fn no_mentor(assignment_id: u64) -> Self {
        Self::NoMentorAvailable { assignment_id }
    }

    /// Create a catch-all error carrying the underlying message
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Message suitable for a flash notice on the caller's previous page.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthorityError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AuthorityError::UserNotFound { .. } => StatusCode::NOT_FOUND,
            AuthorityError::ImpersonationNotPermitted { .. }
            | AuthorityError::ImpersonationNotAllowed { .. } => StatusCode::FORBIDDEN,
            AuthorityError::NoOriginalAccount | AuthorityError::NoMentorAvailable { .. } => {
                StatusCode::CONFLICT
            }
            AuthorityError::OperationFailed { .. }
            | AuthorityError::Config { .. }
            | AuthorityError::Io { .. }
            | AuthorityError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthorityError {
    fn into_response(self) -> Response {
        (self.status_code(), self.user_message()).into_response()
    }
}

impl From<StoreError> for AuthorityError {
    fn from(err: StoreError) -> Self {
        AuthorityError::operation_failed(err.to_string())
    }
}

impl From<serde_json::Error> for AuthorityError {
    fn from(err: serde_json::Error) -> Self {
        AuthorityError::serialization("json_operation", err)
    }
}

impl From<std::io::Error> for AuthorityError {
    fn from(err: std::io::Error) -> Self {
        AuthorityError::io("io_operation", err)
    }
}

impl From<figment::Error> for AuthorityError {
    fn from(err: figment::Error) -> Self {
        AuthorityError::config(err.to_string())
    }
}

/// Helper trait for safe RwLock read operations
pub trait SafeReadLock<T: ?Sized> {
    fn safe_read(&self) -> AuthorityResult<std::sync::RwLockReadGuard<'_, T>>;
}

impl<T: ?Sized> SafeReadLock<T> for std::sync::RwLock<T> {
    fn safe_read(&self) -> AuthorityResult<std::sync::RwLockReadGuard<'_, T>> {
        self.read()
            .map_err(|_| AuthorityError::operation_failed("rwlock_read poisoned"))
    }
}

/// Helper trait for safe RwLock write operations
pub trait SafeWriteLock<T: ?Sized> {
    fn safe_write(&self) -> AuthorityResult<std::sync::RwLockWriteGuard<'_, T>>;
}

impl<T: ?Sized> SafeWriteLock<T> for std::sync::RwLock<T> {
    fn safe_write(&self) -> AuthorityResult<std::sync::RwLockWriteGuard<'_, T>> {
        self.write()
            .map_err(|_| AuthorityError::operation_failed("rwlock_write poisoned"))
    }
}
