//! Router construction for the two services.

use crate::handlers::{enrollments, health, search};
use crate::state::{EnrollmentState, SearchState};
use axum::Router;
use axum::routing::{get, post};

/// Routes served by the enrollments service.
pub fn enrollment_router(state: EnrollmentState) -> Router {
    Router::new()
        .route(
            "/enrollments",
            post(enrollments::create_enrollment).get(enrollments::list_enrollments),
        )
        .route("/healthz", get(health::healthz))
        .with_state(state)
}

/// Routes served by the search service.
pub fn search_router(state: SearchState) -> Router {
    Router::new()
        .route("/search", get(search::search_courses))
        .route("/healthz", get(health::healthz))
        .with_state(state)
}
