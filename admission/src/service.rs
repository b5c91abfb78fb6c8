//! The admission decision pipeline.

use classhub_core::course_store::{CourseStore, CourseStoreError};
use classhub_core::error::AdmissionError;
use classhub_core::ledger::{EnrollmentLedger, LedgerError};
use classhub_core::types::{CourseId, Enrollment, UserId};
use classhub_core::users::{UserDirectory, UserDirectoryError};
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates a single enrollment attempt.
///
/// An attempt advances through fixed stages (identity verified, course
/// fetched, capacity checked, committed) or stops at the first terminal
/// failure. Steps 3–5 are not one transaction against the course store,
/// so the capacity pre-check alone cannot close the last-seat race; the
/// ledger's conditional insert re-validates the bound atomically with the
/// insert, and that is what enforces the invariant.
pub struct AdmissionService {
    users: Arc<dyn UserDirectory>,
    courses: Arc<dyn CourseStore>,
    ledger: Arc<dyn EnrollmentLedger>,
}

impl AdmissionService {
    /// Wire the controller to its collaborators.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserDirectory>,
        courses: Arc<dyn CourseStore>,
        ledger: Arc<dyn EnrollmentLedger>,
    ) -> Self {
        Self {
            users,
            courses,
            ledger,
        }
    }

    /// Decide one enrollment attempt.
    ///
    /// If the caller cancels before the conditional insert commits, the
    /// attempt simply stops with no partial state; once storage accepts
    /// the insert, the enrollment stands.
    ///
    /// # Errors
    ///
    /// Every failure is terminal for this attempt:
    /// [`AdmissionError::UserNotFound`], [`AdmissionError::CourseNotFound`],
    /// [`AdmissionError::CourseFull`],
    /// [`AdmissionError::DuplicateEnrollment`], or
    /// [`AdmissionError::Unavailable`]. Nothing is retried internally.
    pub async fn enroll(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Enrollment, AdmissionError> {
        self.users.verify(user_id).await.map_err(map_user_error)?;

        let course = self
            .courses
            .fetch(course_id)
            .await
            .map_err(map_course_error)?;

        let count = self
            .ledger
            .count_by_course(course_id)
            .await
            .map_err(map_ledger_error)?;

        // Cheap pre-check: a visibly full course fails without touching
        // the write path. Not load-bearing for correctness.
        if count >= u64::from(course.capacity) {
            warn!(
                user_id = %user_id,
                course_id = %course_id,
                capacity = course.capacity,
                "course already full"
            );
            return Err(AdmissionError::CourseFull(course_id));
        }

        let enrollment = self
            .ledger
            .insert_within_capacity(user_id, course_id, course.capacity)
            .await
            .map_err(map_ledger_error)?;

        info!(
            enrollment_id = %enrollment.id,
            user_id = %user_id,
            course_id = %course_id,
            "enrollment admitted"
        );
        Ok(enrollment)
    }

    /// All live enrollments.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Unavailable`] on storage failure.
    pub async fn enrollments(&self) -> Result<Vec<Enrollment>, AdmissionError> {
        self.ledger.list().await.map_err(map_ledger_error)
    }

    /// Live enrollments for one user.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Unavailable`] on storage failure.
    pub async fn enrollments_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Enrollment>, AdmissionError> {
        self.ledger
            .list_by_user(user_id)
            .await
            .map_err(map_ledger_error)
    }

    /// Live enrollments for one course, verifying the course exists first.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::CourseNotFound`] for an unknown course or
    /// [`AdmissionError::Unavailable`] on dependency failure.
    pub async fn enrollments_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Enrollment>, AdmissionError> {
        self.courses
            .fetch(course_id)
            .await
            .map_err(map_course_error)?;
        self.ledger
            .list_by_course(course_id)
            .await
            .map_err(map_ledger_error)
    }

    /// Cascade removal of every enrollment of a deleted course. Returns
    /// the number of enrollments removed.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Unavailable`] on storage failure.
    pub async fn remove_course_enrollments(
        &self,
        course_id: CourseId,
    ) -> Result<u64, AdmissionError> {
        let removed = self
            .ledger
            .delete_by_course(course_id)
            .await
            .map_err(map_ledger_error)?;
        if removed > 0 {
            info!(course_id = %course_id, removed, "cascaded enrollment removal");
        }
        Ok(removed)
    }
}

fn map_user_error(e: UserDirectoryError) -> AdmissionError {
    match e {
        UserDirectoryError::NotFound(id) => AdmissionError::UserNotFound(id),
        UserDirectoryError::Unavailable(reason) => AdmissionError::Unavailable(reason),
    }
}

fn map_course_error(e: CourseStoreError) -> AdmissionError {
    match e {
        CourseStoreError::NotFound(id) => AdmissionError::CourseNotFound(id),
        CourseStoreError::Unavailable(reason) => AdmissionError::Unavailable(reason),
    }
}

fn map_ledger_error(e: LedgerError) -> AdmissionError {
    match e {
        LedgerError::Duplicate { user_id, course_id } => {
            AdmissionError::DuplicateEnrollment { user_id, course_id }
        }
        LedgerError::CapacityExceeded(course_id) => AdmissionError::CourseFull(course_id),
        LedgerError::Unavailable(reason) => AdmissionError::Unavailable(reason),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use classhub_core::types::CourseSnapshot;
    use classhub_testing::mocks::{InMemoryCourseStore, InMemoryLedger, StaticUserDirectory};

    struct Fixture {
        users: Arc<StaticUserDirectory>,
        courses: Arc<InMemoryCourseStore>,
        ledger: Arc<InMemoryLedger>,
        service: AdmissionService,
    }

    fn snapshot(id: i64, capacity: u32) -> CourseSnapshot {
        CourseSnapshot {
            id: CourseId(id),
            name: "Rust".to_string(),
            description: "systems programming".to_string(),
            category: "backend".to_string(),
            duration: "8 weeks".to_string(),
            instructor_id: 1,
            capacity,
            rating: 4.5,
        }
    }

    fn fixture(known_users: &[i64]) -> Fixture {
        let users = Arc::new(StaticUserDirectory::with_users(
            &known_users.iter().map(|&u| UserId(u)).collect::<Vec<_>>(),
        ));
        let courses = Arc::new(InMemoryCourseStore::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let service = AdmissionService::new(
            Arc::clone(&users) as Arc<dyn UserDirectory>,
            Arc::clone(&courses) as Arc<dyn CourseStore>,
            Arc::clone(&ledger) as Arc<dyn EnrollmentLedger>,
        );
        Fixture {
            users,
            courses,
            ledger,
            service,
        }
    }

    #[tokio::test]
    async fn admits_when_every_check_passes() {
        let f = fixture(&[7]);
        f.courses.put(snapshot(3, 30));

        let enrollment = f.service.enroll(UserId(7), CourseId(3)).await.unwrap();
        assert_eq!(enrollment.user_id, UserId(7));
        assert_eq!(enrollment.course_id, CourseId(3));
        assert_eq!(f.ledger.count_by_course(CourseId(3)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_user_fails_before_anything_else() {
        let f = fixture(&[]);
        f.courses.put(snapshot(3, 30));

        let err = f.service.enroll(UserId(9), CourseId(3)).await.unwrap_err();
        assert_eq!(err, AdmissionError::UserNotFound(UserId(9)));
        assert!(f.ledger.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let f = fixture(&[7]);

        let err = f.service.enroll(UserId(7), CourseId(42)).await.unwrap_err();
        assert_eq!(err, AdmissionError::CourseNotFound(CourseId(42)));
    }

    #[tokio::test]
    async fn full_course_rejects_without_touching_the_write_path() {
        let f = fixture(&[1, 2]);
        f.courses.put(snapshot(3, 1));
        f.service.enroll(UserId(1), CourseId(3)).await.unwrap();

        let err = f.service.enroll(UserId(2), CourseId(3)).await.unwrap_err();
        assert_eq!(err, AdmissionError::CourseFull(CourseId(3)));
        assert_eq!(f.ledger.count_by_course(CourseId(3)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn second_enrollment_of_the_same_pair_is_a_duplicate() {
        let f = fixture(&[7]);
        f.courses.put(snapshot(3, 30));
        f.service.enroll(UserId(7), CourseId(3)).await.unwrap();

        let err = f.service.enroll(UserId(7), CourseId(3)).await.unwrap_err();
        assert_eq!(
            err,
            AdmissionError::DuplicateEnrollment {
                user_id: UserId(7),
                course_id: CourseId(3),
            }
        );
        assert_eq!(f.ledger.count_by_course(CourseId(3)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn course_store_outage_is_unavailable_not_missing() {
        let f = fixture(&[7]);
        f.courses.put(snapshot(3, 30));
        f.courses.set_unavailable(true);

        let err = f.service.enroll(UserId(7), CourseId(3)).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Unavailable(_)));
    }

    #[tokio::test]
    async fn identity_outage_is_unavailable() {
        let f = fixture(&[7]);
        f.courses.put(snapshot(3, 30));
        f.users.set_unavailable(true);

        let err = f.service.enroll(UserId(7), CourseId(3)).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Unavailable(_)));
    }

    #[tokio::test]
    async fn listings_filter_by_user() {
        let f = fixture(&[1, 2]);
        f.courses.put(snapshot(3, 30));
        f.courses.put(snapshot(4, 30));
        f.service.enroll(UserId(1), CourseId(3)).await.unwrap();
        f.service.enroll(UserId(1), CourseId(4)).await.unwrap();
        f.service.enroll(UserId(2), CourseId(3)).await.unwrap();

        assert_eq!(f.service.enrollments().await.unwrap().len(), 3);
        assert_eq!(
            f.service.enrollments_for_user(UserId(1)).await.unwrap().len(),
            2
        );
        assert_eq!(
            f.service
                .enrollments_for_course(CourseId(3))
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn cascade_removal_clears_a_course() {
        let f = fixture(&[1, 2]);
        f.courses.put(snapshot(3, 30));
        f.service.enroll(UserId(1), CourseId(3)).await.unwrap();
        f.service.enroll(UserId(2), CourseId(3)).await.unwrap();

        let removed = f
            .service
            .remove_course_enrollments(CourseId(3))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(f.ledger.count_by_course(CourseId(3)).await.unwrap(), 0);

        // Removing again is a no-op, not an error.
        assert_eq!(
            f.service
                .remove_course_enrollments(CourseId(3))
                .await
                .unwrap(),
            0
        );
    }
}
