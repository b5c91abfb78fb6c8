//! Search index port, owned entirely by the index synchronizer.
//!
//! Documents are keyed by course id. Upserts and deletes are idempotent
//! per key: applying the same operation twice changes nothing after the
//! first application, and the last write wins when events arrive out of
//! order. After the channel quiesces, the document set is in bijection
//! with live courses.

use crate::types::CourseId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A document in the derived search index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Course id, the document key.
    pub id: CourseId,
    /// Indexed display name.
    pub name: String,
    /// Indexed category label.
    pub category: String,
    /// Indexed description text.
    pub description: String,
}

/// Errors surfaced by index operations.
#[derive(Error, Debug, Clone)]
pub enum IndexError {
    /// Backend failure worth redelivering the triggering event for
    /// (timeout, connection loss, 5xx).
    #[error("index backend unavailable: {0}")]
    Transient(String),

    /// Request the backend permanently rejected; redelivery cannot help.
    #[error("index rejected operation: {0}")]
    Rejected(String),
}

impl IndexError {
    /// Whether redelivering the triggering event could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Idempotent document store with free-text search.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Insert or fully replace the document with `doc.id` as its key.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Transient`] or [`IndexError::Rejected`] on
    /// backend failure.
    async fn upsert(&self, doc: IndexDocument) -> Result<(), IndexError>;

    /// Remove the document for `course_id`. Removing a document that does
    /// not exist is a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Transient`] or [`IndexError::Rejected`] on
    /// backend failure.
    async fn delete(&self, course_id: CourseId) -> Result<(), IndexError>;

    /// Free-text match over name, category, and description.
    ///
    /// Ranking is a backend detail; only the paging contract (`limit`,
    /// `offset`) is fixed here.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Transient`] or [`IndexError::Rejected`] on
    /// backend failure.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<IndexDocument>, IndexError>;
}

#[async_trait]
impl<T: SearchIndex + ?Sized> SearchIndex for std::sync::Arc<T> {
    async fn upsert(&self, doc: IndexDocument) -> Result<(), IndexError> {
        (**self).upsert(doc).await
    }

    async fn delete(&self, course_id: CourseId) -> Result<(), IndexError> {
        (**self).delete(course_id).await
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<IndexDocument>, IndexError> {
        (**self).search(query, limit, offset).await
    }
}
