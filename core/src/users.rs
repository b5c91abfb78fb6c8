//! External identity check consulted during admission.

use crate::types::UserId;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the identity check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserDirectoryError {
    /// The identity service has no such user.
    #[error("user {0} not found")]
    NotFound(UserId),

    /// The identity service timed out or failed in transport.
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

/// Existence check against the external identity service.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Confirm that the user exists.
    ///
    /// # Errors
    ///
    /// - [`UserDirectoryError::NotFound`] if the user does not exist.
    /// - [`UserDirectoryError::Unavailable`] on timeout or transport
    ///   failure.
    async fn verify(&self, user_id: UserId) -> Result<(), UserDirectoryError>;
}
