//! Subscribe-process-reconnect loop for channel consumers.
//!
//! The consumer implements a resilient pattern for pulling change events:
//!
//! ```text
//! loop {
//!     subscribe
//!     loop {
//!         next event (bounded wait)
//!         handle event
//!         on transient handler failure: republish for redelivery
//!         on malformed event: log and discard
//!         on shutdown signal: exit
//!     }
//!     stream ended or subscribe failed: wait and reconnect
//! }
//! ```
//!
//! Failure handling follows the channel contract: a poison message (bad
//! body, unknown operation) is isolated at single-event granularity and
//! never terminates the loop; a transient downstream failure sends the
//! event back to the channel so unrelated courses keep flowing; there is
//! no head-of-line blocking and no indefinitely blocked consume call.

use async_trait::async_trait;
use classhub_core::event::CourseChangeEvent;
use classhub_core::event_bus::EventBus;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// How a handler failed for one event.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Transient downstream failure; the event should be redelivered.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The event can never be applied; log it and drop it.
    #[error("discarding event: {0}")]
    Discard(String),
}

/// Processes one decoded change event at a time.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Apply a single event.
    ///
    /// Must be idempotent: the channel is at-least-once and the consumer
    /// redelivers on transient failure, so the same event may arrive any
    /// number of times.
    ///
    /// # Errors
    ///
    /// - [`HandlerError::Transient`] to request redelivery.
    /// - [`HandlerError::Discard`] to drop the event after logging.
    async fn handle(&self, event: &CourseChangeEvent) -> Result<(), HandlerError>;
}

/// Generic channel consumer.
///
/// Owns the subscribe-process-reconnect loop so handlers stay pure. Runs
/// until a shutdown signal arrives on the broadcast channel.
pub struct EventConsumer {
    /// Consumer name, for logging.
    name: String,
    /// Topic to consume from.
    topic: String,
    /// Channel to consume from (and redeliver to).
    bus: Arc<dyn EventBus>,
    /// Handler applied to each event.
    handler: Arc<dyn EventHandler>,
    /// Shutdown signal receiver.
    shutdown: broadcast::Receiver<()>,
    /// Delay before reconnecting after a subscribe failure or stream end.
    retry_delay: Duration,
    /// Bound on a single consume wait; an idle tick re-checks shutdown so
    /// a dead channel can never hang the consumer silently.
    poll_timeout: Duration,
}

impl EventConsumer {
    /// Create a consumer with default delays (5s reconnect, 30s poll bound).
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        topic: impl Into<String>,
        bus: Arc<dyn EventBus>,
        handler: Arc<dyn EventHandler>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            name: name.into(),
            topic: topic.into(),
            bus,
            handler,
            shutdown,
            retry_delay: Duration::from_secs(5),
            poll_timeout: Duration::from_secs(30),
        }
    }

    /// Override the reconnect delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Override the single-consume wait bound.
    #[must_use]
    pub const fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Spawn the consumer as a background task.
    #[must_use]
    pub fn spawn(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the subscribe-process-reconnect loop until shutdown.
    pub async fn run(&mut self) {
        info!(consumer = %self.name, topic = %self.topic, "event consumer started");

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(consumer = %self.name, "event consumer received shutdown signal");
                    break;
                }
                subscribed = self.bus.subscribe(&self.topic) => {
                    match subscribed {
                        Ok(stream) => {
                            info!(consumer = %self.name, topic = %self.topic, "subscribed to channel");
                            if self.process_stream(stream).await {
                                break; // shutdown during processing
                            }
                            warn!(
                                consumer = %self.name,
                                "event stream ended, reconnecting in {:?}",
                                self.retry_delay
                            );
                            tokio::time::sleep(self.retry_delay).await;
                        }
                        Err(e) => {
                            error!(
                                consumer = %self.name,
                                error = %e,
                                "failed to subscribe, retrying in {:?}",
                                self.retry_delay
                            );
                            tokio::time::sleep(self.retry_delay).await;
                        }
                    }
                }
            }
        }

        info!(consumer = %self.name, "event consumer stopped");
    }

    /// Process events until the stream ends or shutdown arrives.
    ///
    /// Returns `true` if a shutdown signal was received.
    async fn process_stream(&mut self, mut stream: classhub_core::event_bus::EventStream) -> bool {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(consumer = %self.name, "shutdown during processing");
                    return true;
                }
                next = tokio::time::timeout(self.poll_timeout, stream.next()) => {
                    match next {
                        Ok(Some(Ok(event))) => self.dispatch(event).await,
                        Ok(Some(Err(e))) => {
                            // Malformed body or transport hiccup: isolate the
                            // single message, keep the loop alive.
                            warn!(consumer = %self.name, error = %e, "dropping undecodable message");
                        }
                        Ok(None) => return false,
                        Err(_) => {
                            debug!(consumer = %self.name, "no event within poll bound");
                        }
                    }
                }
            }
        }
    }

    /// Apply one event, redelivering it on transient handler failure.
    async fn dispatch(&self, event: CourseChangeEvent) {
        match self.handler.handle(&event).await {
            Ok(()) => {}
            Err(HandlerError::Discard(reason)) => {
                warn!(
                    consumer = %self.name,
                    course_id = %event.course_id,
                    reason = %reason,
                    "discarded event"
                );
            }
            Err(HandlerError::Transient(reason)) => {
                warn!(
                    consumer = %self.name,
                    course_id = %event.course_id,
                    reason = %reason,
                    "transient failure, returning event to channel"
                );
                if let Err(e) = self.bus.publish(&self.topic, &event).await {
                    // Redelivery publish failed too; the event is lost until
                    // the course mutates again. Same drift trade-off as the
                    // publisher side.
                    error!(
                        consumer = %self.name,
                        course_id = %event.course_id,
                        error = %e,
                        "failed to return event to channel"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use classhub_core::event::ChangeOperation;
    use classhub_core::types::CourseId;
    use classhub_testing::mocks::InMemoryEventBus;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recording {
        seen: Mutex<Vec<CourseId>>,
        fail_first: AtomicUsize,
    }

    impl Recording {
        fn new(fail_first: usize) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail_first: AtomicUsize::new(fail_first),
            }
        }
    }

    #[async_trait]
    impl EventHandler for Recording {
        async fn handle(&self, event: &CourseChangeEvent) -> Result<(), HandlerError> {
            if self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(HandlerError::Transient("index down".to_string()));
            }
            self.seen.lock().unwrap().push(event.course_id);
            Ok(())
        }
    }

    fn update(id: i64) -> CourseChangeEvent {
        CourseChangeEvent {
            operation: ChangeOperation::Update,
            course_id: CourseId(id),
            name: Some("X".to_string()),
            category: None,
            description: None,
        }
    }

    async fn wait_until(check: impl Fn() -> bool) {
        for _ in 0..100 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn consumes_published_events() {
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = Arc::new(Recording::new(0));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let consumer = EventConsumer::new(
            "test",
            "course-events",
            Arc::clone(&bus) as Arc<dyn EventBus>,
            Arc::clone(&handler) as Arc<dyn EventHandler>,
            shutdown_rx,
        )
        .with_retry_delay(Duration::from_millis(10));
        let handle = consumer.spawn();

        bus.wait_for_subscriber("course-events").await;
        bus.publish("course-events", &update(1)).await.unwrap();
        bus.publish("course-events", &update(2)).await.unwrap();

        wait_until(|| handler.seen.lock().unwrap().len() == 2).await;
        assert_eq!(
            *handler.seen.lock().unwrap(),
            vec![CourseId(1), CourseId(2)]
        );

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn transient_failure_redelivers_the_event() {
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = Arc::new(Recording::new(1));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let consumer = EventConsumer::new(
            "test",
            "course-events",
            Arc::clone(&bus) as Arc<dyn EventBus>,
            Arc::clone(&handler) as Arc<dyn EventHandler>,
            shutdown_rx,
        );
        let handle = consumer.spawn();

        bus.wait_for_subscriber("course-events").await;
        bus.publish("course-events", &update(5)).await.unwrap();

        // First delivery fails transiently, the redelivered copy lands.
        wait_until(|| !handler.seen.lock().unwrap().is_empty()).await;
        assert_eq!(*handler.seen.lock().unwrap(), vec![CourseId(5)]);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn undecodable_message_does_not_stop_the_loop() {
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = Arc::new(Recording::new(0));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let consumer = EventConsumer::new(
            "test",
            "course-events",
            Arc::clone(&bus) as Arc<dyn EventBus>,
            Arc::clone(&handler) as Arc<dyn EventHandler>,
            shutdown_rx,
        );
        let handle = consumer.spawn();

        bus.wait_for_subscriber("course-events").await;
        bus.inject_error(
            "course-events",
            classhub_core::event_bus::EventBusError::DeserializationFailed(
                "not json".to_string(),
            ),
        );
        bus.publish("course-events", &update(3)).await.unwrap();

        // The poison item is logged and dropped; the valid event behind
        // it still lands.
        wait_until(|| !handler.seen.lock().unwrap().is_empty()).await;
        assert_eq!(*handler.seen.lock().unwrap(), vec![CourseId(3)]);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_stops_an_idle_consumer() {
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = Arc::new(Recording::new(0));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let consumer = EventConsumer::new(
            "test",
            "course-events",
            Arc::clone(&bus) as Arc<dyn EventBus>,
            handler as Arc<dyn EventHandler>,
            shutdown_rx,
        )
        .with_poll_timeout(Duration::from_millis(20));
        let handle = consumer.spawn();

        bus.wait_for_subscriber("course-events").await;
        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("consumer should stop promptly")
            .unwrap();
    }
}
