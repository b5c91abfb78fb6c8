//! Read-only gateway to the authoritative course store.

use crate::types::{CourseId, CourseSnapshot};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the course store gateway.
///
/// `NotFound` and `Unavailable` are never conflated: a 404 from the
/// upstream means the course does not exist, while a timeout or transport
/// failure means nothing can be said about it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CourseStoreError {
    /// The course store has no record with this id.
    #[error("course {0} not found")]
    NotFound(CourseId),

    /// The upstream call timed out or failed in transport.
    #[error("course store unavailable: {0}")]
    Unavailable(String),
}

/// Pure read access to the authoritative course record.
///
/// Implementations must not cache: every `fetch` reflects the upstream
/// state at call time, and every call has a bounded timeout.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Fetch the current snapshot for a course.
    ///
    /// # Errors
    ///
    /// - [`CourseStoreError::NotFound`] if the course does not exist.
    /// - [`CourseStoreError::Unavailable`] on timeout or transport failure.
    async fn fetch(&self, course_id: CourseId) -> Result<CourseSnapshot, CourseStoreError>;
}
