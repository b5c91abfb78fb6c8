//! Channel port connecting the change publisher and the index synchronizer.
//!
//! Events flow from the course-owning service through the channel to the
//! search index:
//!
//! ```text
//! ┌────────────────┐
//! │ course service │
//! └───────┬────────┘
//!         │ publish (fire-and-forget)
//!         ▼
//! ┌────────────────┐
//! │    channel     │◄── at-least-once, unordered
//! └───────┬────────┘
//!         │ subscribe
//!         ▼
//! ┌────────────────┐
//! │  synchronizer  │──► search index (idempotent upserts/deletes)
//! └────────────────┘
//! ```
//!
//! # Delivery contract
//!
//! - **At-least-once**: a consumer may see the same event twice.
//! - **Unordered**: no ordering guarantee across or within courses; the
//!   publisher attaches no sequence number or key.
//! - **JSON bodies**: the wire form is the flat JSON of
//!   [`CourseChangeEvent`].
//!
//! Implementations: `classhub_redpanda::RedpandaEventBus` for production,
//! `classhub_testing::InMemoryEventBus` for tests.
//!
//! The trait uses explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` so it stays dyn-compatible (`Arc<dyn EventBus>` is how the
//! publisher and consumer hold it).

use crate::event::CourseChangeEvent;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during channel operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to connect to the channel broker.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish an event to a topic.
    #[error("publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// Failed to subscribe to a topic.
    #[error("subscription failed for topic '{topic}': {reason}")]
    SubscriptionFailed {
        /// The topic that failed to subscribe.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// A delivered message body was not a valid event.
    #[error("deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Network or transport error while consuming.
    #[error("transport error: {0}")]
    TransportError(String),
}

/// Stream of decoded events from a subscription.
///
/// Malformed bodies surface as `Err` items so the consumer can log and
/// discard them without losing its position in the stream.
pub type EventStream =
    Pin<Box<dyn Stream<Item = Result<CourseChangeEvent, EventBusError>> + Send>>;

/// Publish/subscribe access to the course change channel.
pub trait EventBus: Send + Sync {
    /// Publish one event to a topic with at-least-once semantics.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the publish fails; the
    /// event may still have been delivered (duplicates are the consumer's
    /// problem by contract).
    fn publish(
        &self,
        topic: &str,
        event: &CourseChangeEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to a topic and receive a stream of decoded events.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the subscription
    /// cannot be established.
    fn subscribe(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;
}
