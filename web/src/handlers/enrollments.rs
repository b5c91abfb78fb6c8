//! Enrollment endpoints.

use crate::error::AppError;
use crate::state::EnrollmentState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use classhub_core::types::{CourseId, Enrollment, UserId};
use serde::Deserialize;

/// Body of `POST /enrollments`.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    /// User requesting the seat.
    pub user_id: i64,
    /// Course to enroll into.
    pub course_id: i64,
}

/// Query parameters of `GET /enrollments`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Restrict the listing to one user.
    pub user_id: Option<i64>,
}

/// `POST /enrollments`: run one admission attempt.
///
/// # Errors
///
/// Maps the admission taxonomy onto HTTP: 404 for a missing user or
/// course, 409 for a full course or duplicate pair, 503 when a dependency
/// is unavailable, 422 for malformed input.
pub async fn create_enrollment(
    State(state): State<EnrollmentState>,
    Json(request): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    // Invalid input never reaches the controller.
    if request.user_id <= 0 || request.course_id <= 0 {
        return Err(AppError::validation("user_id and course_id must be positive"));
    }

    let enrollment = state
        .admission
        .enroll(UserId(request.user_id), CourseId(request.course_id))
        .await?;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// `GET /enrollments` and `GET /enrollments?user_id=N`.
///
/// # Errors
///
/// Returns 503 when the ledger is unavailable, 422 for a non-positive
/// `user_id` filter.
pub async fn list_enrollments(
    State(state): State<EnrollmentState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Enrollment>>, AppError> {
    let enrollments = match params.user_id {
        Some(user_id) if user_id <= 0 => {
            return Err(AppError::validation("user_id must be positive"));
        }
        Some(user_id) => state.admission.enrollments_for_user(UserId(user_id)).await?,
        None => state.admission.enrollments().await?,
    };
    Ok(Json(enrollments))
}
