//! Fire-and-forget publishing of course change events.
//!
//! The course mutation is complete once the course store has persisted it;
//! publishing the change event must never block or fail that mutation.
//! [`ChangePublisher::publish`] therefore hands the event to a background
//! task which retries transient failures with backoff and, if the channel
//! stays down, logs the loss and gives up. The index is allowed to drift
//! rather than block writes.

use crate::retry::{RetryPolicy, retry_with_backoff};
use classhub_core::event::CourseChangeEvent;
use classhub_core::event_bus::{EventBus, EventBusError};
use std::sync::Arc;

/// Publisher side of the course change channel.
#[derive(Clone)]
pub struct ChangePublisher {
    bus: Arc<dyn EventBus>,
    topic: String,
    retry: RetryPolicy,
}

impl ChangePublisher {
    /// Create a publisher for `topic` with the default retry policy.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy used for transient publish failures.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The topic this publisher emits onto.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish an event without waiting for the outcome.
    ///
    /// Returns immediately. The handed-off task retries transient failures
    /// with backoff; a terminal failure is logged and swallowed, never
    /// propagated to the caller of the course mutation.
    pub fn publish(&self, event: CourseChangeEvent) {
        let bus = Arc::clone(&self.bus);
        let topic = self.topic.clone();
        let retry = self.retry.clone();

        tokio::spawn(async move {
            let result = retry_with_backoff(retry, || bus.publish(&topic, &event)).await;
            match result {
                Ok(()) => {
                    tracing::debug!(
                        topic = %topic,
                        course_id = %event.course_id,
                        operation = ?event.operation,
                        "change event published"
                    );
                }
                Err(e) => {
                    // The index drifts until the course mutates again or an
                    // operator replays the change. Accepted trade-off.
                    tracing::error!(
                        topic = %topic,
                        course_id = %event.course_id,
                        operation = ?event.operation,
                        error = %e,
                        "dropping change event after exhausting retries"
                    );
                }
            }
        });
    }

    /// Publish an event and wait for the outcome, retrying transient
    /// failures with backoff.
    ///
    /// Used by the consumer's redelivery path and by tests; the course
    /// mutation path uses [`publish`](Self::publish).
    ///
    /// # Errors
    ///
    /// Returns the final [`EventBusError`] once retries are exhausted.
    pub async fn publish_now(&self, event: &CourseChangeEvent) -> Result<(), EventBusError> {
        retry_with_backoff(self.retry.clone(), || self.bus.publish(&self.topic, event)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use classhub_core::types::CourseId;
    use classhub_testing::mocks::InMemoryEventBus;
    use futures::StreamExt;
    use std::time::Duration;

    fn event() -> CourseChangeEvent {
        CourseChangeEvent::created(
            CourseId(1),
            "Rust".to_string(),
            "backend".to_string(),
            "systems".to_string(),
        )
    }

    #[tokio::test]
    async fn detached_publish_reaches_subscribers() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut stream = bus.subscribe("course-events").await.unwrap();

        let publisher = ChangePublisher::new(bus, "course-events");
        publisher.publish(event());

        let received = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("event should arrive")
            .expect("stream should stay open")
            .expect("event should decode");
        assert_eq!(received.course_id, CourseId(1));
    }

    #[tokio::test]
    async fn detached_publish_failure_does_not_propagate() {
        let bus = Arc::new(InMemoryEventBus::new());
        bus.fail_publishes(usize::MAX);

        let publisher = ChangePublisher::new(bus, "course-events").with_retry(
            RetryPolicy::builder()
                .max_retries(1)
                .initial_delay(Duration::from_millis(5))
                .build(),
        );

        // Nothing to assert beyond "this returns and nothing panics":
        // failures are logged, not surfaced.
        publisher.publish(event());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn publish_now_retries_transient_failures() {
        let bus = Arc::new(InMemoryEventBus::new());
        bus.fail_publishes(2);
        let mut stream = bus.subscribe("course-events").await.unwrap();

        let publisher = ChangePublisher::new(bus, "course-events").with_retry(
            RetryPolicy::builder()
                .max_retries(3)
                .initial_delay(Duration::from_millis(5))
                .build(),
        );

        publisher
            .publish_now(&event())
            .await
            .expect("publish should succeed after retries");

        let received = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("event should arrive");
        assert!(matches!(received, Some(Ok(_))));
    }
}
