//! Identifiers and records shared across services.
//!
//! Identifiers are `i64` newtypes matching the sequence-assigned ids used
//! by the storage layer. They serialize transparently, so `UserId(7)` is
//! the JSON number `7` on every wire that carries it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a user account, owned by the external identity service.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Identifier of a course, owned by the external course store.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CourseId(pub i64);

/// Identifier of an enrollment row, assigned by the ledger on insert.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EnrollmentId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of the authoritative course record as served by the course API.
///
/// `capacity` is the admission bound. The enrolled count is never part of
/// the snapshot; it is derived from the ledger at decision time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CourseSnapshot {
    /// Course identifier.
    pub id: CourseId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Category label (e.g. "backend").
    pub category: String,
    /// Human-readable duration (e.g. "8 weeks").
    pub duration: String,
    /// Identifier of the instructor account.
    pub instructor_id: i64,
    /// Maximum number of live enrollments. Positive.
    pub capacity: u32,
    /// Aggregate rating derived from enrollments.
    #[serde(default)]
    pub rating: f64,
}

/// A committed (user, course) pair in the enrollment ledger.
///
/// Created only through the admission controller, never updated, and
/// deleted individually or in bulk when the owning course is deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Ledger-assigned identifier.
    pub id: EnrollmentId,
    /// Enrolled user.
    pub user_id: UserId,
    /// Course enrolled into.
    pub course_id: CourseId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&Enrollment {
            id: EnrollmentId(1),
            user_id: UserId(7),
            course_id: CourseId(3),
        })
        .unwrap();
        assert_eq!(json, r#"{"id":1,"user_id":7,"course_id":3}"#);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn snapshot_tolerates_missing_rating() {
        let snapshot: CourseSnapshot = serde_json::from_str(
            r#"{"id":5,"name":"Rust","description":"systems","category":"backend",
                "duration":"8 weeks","instructor_id":12,"capacity":30}"#,
        )
        .unwrap();
        assert_eq!(snapshot.capacity, 30);
        assert!((snapshot.rating - 0.0).abs() < f64::EPSILON);
    }
}
