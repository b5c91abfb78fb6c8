//! Applies course change events to the search index.

use async_trait::async_trait;
use classhub_core::event::{ChangeOperation, CourseChangeEvent};
use classhub_core::index::{IndexDocument, IndexError, SearchIndex};
use classhub_runtime::consumer::{EventHandler, HandlerError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Consumer-side state machine of the indexing flow.
///
/// One event in, one idempotent index operation out:
///
/// - `CREATE` and `UPDATE` both become the same whole-document upsert, so
///   a duplicated `CREATE` or a replayed stale `UPDATE` can never crash
///   the loop or half-merge fields: the last delivered snapshot wins.
/// - `DELETE` removes the document; deleting a missing document is a
///   no-op.
/// - Unknown operations and snapshot-less upserts are discarded after
///   logging, isolating poison messages at single-event granularity.
///
/// Transient backend errors are reported as
/// [`HandlerError::Transient`] so the consumer returns the event to the
/// channel instead of blocking unrelated courses behind it.
pub struct IndexSynchronizer {
    index: Arc<dyn SearchIndex>,
}

impl IndexSynchronizer {
    /// Create a synchronizer writing to `index`.
    #[must_use]
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    fn document_from(event: &CourseChangeEvent) -> Option<IndexDocument> {
        // A snapshot without a name is no snapshot; category/description
        // may legitimately be empty.
        let name = event.name.clone()?;
        Some(IndexDocument {
            id: event.course_id,
            name,
            category: event.category.clone().unwrap_or_default(),
            description: event.description.clone().unwrap_or_default(),
        })
    }
}

fn map_index_error(e: &IndexError) -> HandlerError {
    if e.is_transient() {
        HandlerError::Transient(e.to_string())
    } else {
        HandlerError::Discard(e.to_string())
    }
}

#[async_trait]
impl EventHandler for IndexSynchronizer {
    async fn handle(&self, event: &CourseChangeEvent) -> Result<(), HandlerError> {
        match event.operation {
            ChangeOperation::Create | ChangeOperation::Update => {
                let Some(doc) = Self::document_from(event) else {
                    return Err(HandlerError::Discard(
                        "create/update event carries no snapshot".to_string(),
                    ));
                };
                self.index
                    .upsert(doc)
                    .await
                    .map_err(|e| map_index_error(&e))?;
                debug!(course_id = %event.course_id, "index document upserted");
                Ok(())
            }
            ChangeOperation::Delete => {
                self.index
                    .delete(event.course_id)
                    .await
                    .map_err(|e| map_index_error(&e))?;
                debug!(course_id = %event.course_id, "index document removed");
                Ok(())
            }
            ChangeOperation::Unknown => {
                warn!(course_id = %event.course_id, "unknown change operation");
                Err(HandlerError::Discard("unknown operation".to_string()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::memory::InMemoryIndex;
    use classhub_core::types::CourseId;
    use classhub_testing::mocks::FlakyIndex;

    fn upsert_event(op: ChangeOperation, id: i64, name: &str) -> CourseChangeEvent {
        CourseChangeEvent {
            operation: op,
            course_id: CourseId(id),
            name: Some(name.to_string()),
            category: Some("backend".to_string()),
            description: Some("desc".to_string()),
        }
    }

    #[tokio::test]
    async fn duplicate_update_leaves_one_document() {
        let index = Arc::new(InMemoryIndex::new());
        let sync = IndexSynchronizer::new(Arc::clone(&index) as Arc<dyn SearchIndex>);

        let event = upsert_event(ChangeOperation::Update, 5, "X");
        sync.handle(&event).await.unwrap();
        sync.handle(&event).await.unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(CourseId(5)).unwrap().name, "X");
    }

    #[tokio::test]
    async fn create_then_stale_update_replay_converges() {
        let index = Arc::new(InMemoryIndex::new());
        let sync = IndexSynchronizer::new(Arc::clone(&index) as Arc<dyn SearchIndex>);

        // Delivered in reverse order: the UPDATE first, then the CREATE.
        sync.handle(&upsert_event(ChangeOperation::Update, 2, "B"))
            .await
            .unwrap();
        sync.handle(&upsert_event(ChangeOperation::Create, 2, "A"))
            .await
            .unwrap();

        // Last-delivered wins: a whole document with name "A", never a
        // half-merged or empty one.
        let doc = index.get(CourseId(2)).unwrap();
        assert_eq!(doc.name, "A");
        assert_eq!(doc.category, "backend");
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_missing_document_is_a_no_op() {
        let index = Arc::new(InMemoryIndex::new());
        let sync = IndexSynchronizer::new(Arc::clone(&index) as Arc<dyn SearchIndex>);

        sync.handle(&CourseChangeEvent::deleted(CourseId(9)))
            .await
            .unwrap();
        assert_eq!(index.len(), 0);
    }

    #[tokio::test]
    async fn unknown_operation_is_discarded() {
        let index = Arc::new(InMemoryIndex::new());
        let sync = IndexSynchronizer::new(Arc::clone(&index) as Arc<dyn SearchIndex>);

        let event = CourseChangeEvent::from_json(
            br#"{"operation":"REINDEX","course_id":1,"name":"X"}"#,
        )
        .unwrap();
        let err = sync.handle(&event).await.unwrap_err();
        assert!(matches!(err, HandlerError::Discard(_)));
        assert_eq!(index.len(), 0);
    }

    #[tokio::test]
    async fn snapshotless_upsert_is_discarded() {
        let index = Arc::new(InMemoryIndex::new());
        let sync = IndexSynchronizer::new(Arc::clone(&index) as Arc<dyn SearchIndex>);

        let event = CourseChangeEvent {
            operation: ChangeOperation::Create,
            course_id: CourseId(3),
            name: None,
            category: None,
            description: None,
        };
        let err = sync.handle(&event).await.unwrap_err();
        assert!(matches!(err, HandlerError::Discard(_)));
        assert_eq!(index.len(), 0);
    }

    #[tokio::test]
    async fn transient_backend_error_requests_redelivery() {
        let index = Arc::new(InMemoryIndex::new());
        let flaky = Arc::new(FlakyIndex::new(Arc::clone(&index), 1));
        let sync = IndexSynchronizer::new(flaky as Arc<dyn SearchIndex>);

        let event = upsert_event(ChangeOperation::Update, 7, "Y");
        let err = sync.handle(&event).await.unwrap_err();
        assert!(matches!(err, HandlerError::Transient(_)));

        // The redelivered copy succeeds.
        sync.handle(&event).await.unwrap();
        assert_eq!(index.get(CourseId(7)).unwrap().name, "Y");
    }
}
