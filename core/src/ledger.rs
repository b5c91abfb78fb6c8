//! Persistence port for the enrollment ledger.

use crate::types::{CourseId, Enrollment, UserId};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The (user, course) pair already has a live enrollment.
    #[error("user {user_id} is already enrolled in course {course_id}")]
    Duplicate {
        /// The already-enrolled user.
        user_id: UserId,
        /// The course in question.
        course_id: CourseId,
    },

    /// The conditional insert found the course at or above capacity.
    #[error("course {0} has no seats below its capacity")]
    CapacityExceeded(CourseId),

    /// The storage backend failed or timed out.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Persisted set of (user, course) enrollment pairs.
///
/// Two invariants are enforced at this seam, not above it:
///
/// - the pair `(user_id, course_id)` is unique across live enrollments,
///   backed by a storage-level unique constraint rather than a
///   read-then-write check;
/// - [`insert_within_capacity`](EnrollmentLedger::insert_within_capacity)
///   re-validates the capacity bound inside the same atomic storage
///   operation as the insert, so two admissions racing for the last seat
///   cannot both commit.
#[async_trait]
pub trait EnrollmentLedger: Send + Sync {
    /// Insert the pair only while the course's committed enrollment count
    /// is still below `capacity`, as one atomic storage operation.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Duplicate`] if the pair already exists.
    /// - [`LedgerError::CapacityExceeded`] if the guard failed.
    /// - [`LedgerError::Unavailable`] on storage failure or timeout.
    async fn insert_within_capacity(
        &self,
        user_id: UserId,
        course_id: CourseId,
        capacity: u32,
    ) -> Result<Enrollment, LedgerError>;

    /// Number of committed enrollments for the course.
    ///
    /// Reflects every insert committed before the call began; never served
    /// from a cache.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] on storage failure.
    async fn count_by_course(&self, course_id: CourseId) -> Result<u64, LedgerError>;

    /// All live enrollments.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] on storage failure.
    async fn list(&self) -> Result<Vec<Enrollment>, LedgerError>;

    /// Live enrollments for one user.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] on storage failure.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Enrollment>, LedgerError>;

    /// Live enrollments for one course.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] on storage failure.
    async fn list_by_course(&self, course_id: CourseId) -> Result<Vec<Enrollment>, LedgerError>;

    /// Remove every enrollment for the course. Cascade entry point used
    /// when the owning course is deleted. Returns the number of rows
    /// removed; removing from a course with no enrollments is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] on storage failure.
    async fn delete_by_course(&self, course_id: CourseId) -> Result<u64, LedgerError>;
}
