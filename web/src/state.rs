//! Shared state for the two routers.

use classhub_admission::AdmissionService;
use classhub_core::index::SearchIndex;
use std::sync::Arc;

/// State behind the enrollment routes.
#[derive(Clone)]
pub struct EnrollmentState {
    /// The admission controller.
    pub admission: Arc<AdmissionService>,
}

impl EnrollmentState {
    /// Wrap an admission service.
    #[must_use]
    pub fn new(admission: Arc<AdmissionService>) -> Self {
        Self { admission }
    }
}

/// State behind the search routes.
#[derive(Clone)]
pub struct SearchState {
    /// The derived index to query.
    pub index: Arc<dyn SearchIndex>,
}

impl SearchState {
    /// Wrap a search index handle.
    #[must_use]
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }
}
