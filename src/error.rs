//! Error taxonomy for one authentication attempt.
//!
//! Exactly one human-readable message surfaces per attempt. Remote
//! unavailability never appears here: the resolver converts it into the
//! offline fallback before an error can escape. The transport detail is
//! logged, not shown.

use thiserror::Error;

use crate::accounts::AccountError;
use crate::storage::StorageError;
use crate::validate::ValidationError;

/// A failed authentication attempt.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Client-side validation failed; attributable to a single form field.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server handled the request and refused it. The message is the
    /// server's own, shown verbatim.
    #[error("{0}")]
    Remote(String),

    /// The server was unreachable and the offline fallback found no
    /// matching account.
    #[error("Invalid username or password. While the server is unreachable you can use the demo account (demo / demo123)")]
    LocalAuth,

    /// Offline signup collided with an existing fallback account.
    #[error("{0}")]
    Duplicate(AccountError),

    /// A storage backend failed underneath the flow.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// The form field to attribute this error to, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation(err) => Some(err.field()),
            _ => None,
        }
    }
}

impl From<AccountError> for AuthError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Storage(inner) => Self::Storage(inner),
            other => Self::Duplicate(other),
        }
    }
}
