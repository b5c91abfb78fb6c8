//! Error taxonomy for the admission path.
//!
//! Four kinds cover every failure surfaced to callers:
//!
//! - `NotFound`: the user or course does not exist.
//! - `Conflict`: the request is valid but collides with current state
//!   (course full, duplicate enrollment).
//! - `Unavailable`: a dependency timed out or failed in transport. The
//!   caller may retry; the controller never retries internally, since
//!   capacity and existence are attempt-time facts.
//! - `Invalid`: malformed input, rejected before reaching the controller.
//!
//! No error on this path is ever downgraded to a silent success.

use crate::types::{CourseId, UserId};
use thiserror::Error;

/// Terminal outcome of a failed enrollment attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// The identity service has no such user.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// The course store has no such course.
    #[error("course {0} not found")]
    CourseNotFound(CourseId),

    /// The course has no seats left.
    #[error("course {0} is at full capacity")]
    CourseFull(CourseId),

    /// The (user, course) pair is already enrolled.
    #[error("user {user_id} is already enrolled in course {course_id}")]
    DuplicateEnrollment {
        /// The already-enrolled user.
        user_id: UserId,
        /// The course in question.
        course_id: CourseId,
    },

    /// A dependency timed out or failed in transport. Retryable by the
    /// caller, never conflated with `NotFound`.
    #[error("dependency unavailable: {0}")]
    Unavailable(String),

    /// Malformed input rejected before the decision steps ran.
    #[error("invalid request: {0}")]
    Invalid(String),
}

/// Coarse classification used for logging and HTTP mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// User or course absent.
    NotFound,
    /// Valid request colliding with current state.
    Conflict,
    /// Transport or storage failure.
    Unavailable,
    /// Malformed input.
    Invalid,
}

impl AdmissionError {
    /// The taxonomy bucket this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) | Self::CourseNotFound(_) => ErrorKind::NotFound,
            Self::CourseFull(_) | Self::DuplicateEnrollment { .. } => ErrorKind::Conflict,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Invalid(_) => ErrorKind::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(
            AdmissionError::UserNotFound(UserId(1)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AdmissionError::CourseFull(CourseId(2)).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AdmissionError::DuplicateEnrollment {
                user_id: UserId(7),
                course_id: CourseId(3),
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AdmissionError::Unavailable("timeout".to_string()).kind(),
            ErrorKind::Unavailable
        );
    }
}
