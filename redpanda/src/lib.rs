//! Kafka-compatible event bus for the course change channel.
//!
//! Implements the [`EventBus`] trait from `classhub-core` over rdkafka,
//! against Redpanda or any Kafka-protocol broker.
//!
//! # Delivery semantics
//!
//! **At-least-once, unordered**, which is exactly what the synchronizer is built
//! for:
//!
//! - offsets are committed only after an event has been handed to the
//!   subscriber's channel; a crash before commit redelivers;
//! - the publisher attaches **no message key**, so records round-robin
//!   across partitions and no cross-record ordering survives the trip.
//!   Consumers must not assume any;
//! - message bodies are the flat JSON of
//!   [`CourseChangeEvent`](classhub_core::event::CourseChangeEvent)
//!   (`content-type: application/json`); bodies that fail to decode are
//!   surfaced as `Err` stream items and committed, so one poison message
//!   cannot wedge the partition.
//!
//! # Example
//!
//! ```no_run
//! use classhub_redpanda::RedpandaEventBus;
//! use classhub_core::event::CourseChangeEvent;
//! use classhub_core::event_bus::EventBus;
//! use classhub_core::types::CourseId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = RedpandaEventBus::new("localhost:9092")?;
//! bus.publish("course-events", &CourseChangeEvent::deleted(CourseId(9))).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use classhub_core::event::CourseChangeEvent;
use classhub_core::event_bus::{EventBus, EventBusError, EventStream};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Event bus over a Kafka-compatible broker.
///
/// Create one per process and share it: the producer is internally pooled,
/// and each [`subscribe`](EventBus::subscribe) call creates its own
/// consumer.
pub struct RedpandaEventBus {
    /// Producer for publishing events.
    producer: FutureProducer,
    /// Broker addresses, kept for creating consumers.
    brokers: String,
    /// Producer send timeout.
    timeout: Duration,
    /// Consumer group id, if explicitly set.
    consumer_group: Option<String>,
    /// Event buffer size between the broker and the subscriber.
    buffer_size: usize,
    /// Where new consumer groups start reading.
    auto_offset_reset: String,
}

impl RedpandaEventBus {
    /// Create a bus with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if the producer cannot
    /// be created.
    pub fn new(brokers: &str) -> Result<Self, EventBusError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a builder for custom configuration.
    #[must_use]
    pub fn builder() -> RedpandaEventBusBuilder {
        RedpandaEventBusBuilder::default()
    }

    /// The configured broker addresses.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }
}

/// Builder for [`RedpandaEventBus`].
#[derive(Default)]
pub struct RedpandaEventBusBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
    consumer_group: Option<String>,
    buffer_size: Option<usize>,
    auto_offset_reset: Option<String>,
}

impl RedpandaEventBusBuilder {
    /// Set the broker addresses (comma-separated).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the producer acknowledgment mode ("0", "1", "all").
    /// Default: "1".
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the compression codec ("none", "gzip", "snappy", "lz4",
    /// "zstd"). Default: "none".
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the producer send timeout. Default: 5 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the consumer group id for subscriptions.
    ///
    /// Multiple synchronizer instances sharing a group split the
    /// partitions between them; this is safe because every index write is
    /// idempotent per course id.
    #[must_use]
    pub fn consumer_group(mut self, consumer_group: impl Into<String>) -> Self {
        self.consumer_group = Some(consumer_group.into());
        self
    }

    /// Set the event buffer size between broker and subscriber.
    /// Default: 1000.
    ///
    /// # Panics
    ///
    /// Panics if `buffer_size` is 0.
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        assert!(buffer_size > 0, "buffer_size must be greater than 0");
        self.buffer_size = Some(buffer_size);
        self
    }

    /// Set where new consumer groups start reading ("earliest", "latest").
    /// Default: "latest".
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Build the [`RedpandaEventBus`].
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if brokers are not set
    /// or the producer cannot be created.
    pub fn build(self) -> Result<RedpandaEventBus, EventBusError> {
        let brokers = self.brokers.ok_or_else(|| {
            EventBusError::ConnectionFailed("brokers not configured".to_string())
        })?;

        let mut producer_config = ClientConfig::new();
        producer_config
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", self.producer_acks.as_deref().unwrap_or("1"))
            .set(
                "compression.type",
                self.compression.as_deref().unwrap_or("none"),
            );

        let producer: FutureProducer = producer_config.create().map_err(|e| {
            EventBusError::ConnectionFailed(format!("failed to create producer: {e}"))
        })?;

        tracing::info!(
            brokers = %brokers,
            acks = self.producer_acks.as_deref().unwrap_or("1"),
            buffer_size = self.buffer_size.unwrap_or(1000),
            auto_offset_reset = self.auto_offset_reset.as_deref().unwrap_or("latest"),
            "redpanda event bus created"
        );

        Ok(RedpandaEventBus {
            producer,
            brokers,
            timeout: self.timeout.unwrap_or(Duration::from_secs(5)),
            consumer_group: self.consumer_group,
            buffer_size: self.buffer_size.unwrap_or(1000),
            auto_offset_reset: self
                .auto_offset_reset
                .unwrap_or_else(|| "latest".to_string()),
        })
    }
}

impl EventBus for RedpandaEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &CourseChangeEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let payload = event.to_json().map_err(|e| EventBusError::PublishFailed {
                topic: topic.clone(),
                reason: format!("failed to serialize event: {e}"),
            })?;

            // No key: records round-robin across partitions, and no
            // ordering or dedup hint is attached. The synchronizer's
            // idempotent writes are the only ordering story.
            let record: FutureRecord<'_, (), [u8]> =
                FutureRecord::to(&topic).payload(payload.as_slice());

            match self.producer.send(record, Timeout::After(timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %topic,
                        partition,
                        offset,
                        course_id = %event.course_id,
                        operation = ?event.operation,
                        "change event published"
                    );
                    Ok(())
                }
                Err((kafka_error, _)) => {
                    tracing::error!(
                        topic = %topic,
                        error = %kafka_error,
                        "failed to publish change event"
                    );
                    Err(EventBusError::PublishFailed {
                        topic,
                        reason: kafka_error.to_string(),
                    })
                }
            }
        })
    }

    fn subscribe(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let brokers = self.brokers.clone();
        let consumer_group = self.consumer_group.clone();
        let buffer_size = self.buffer_size;
        let auto_offset_reset = self.auto_offset_reset.clone();

        Box::pin(async move {
            let consumer_group_id =
                consumer_group.unwrap_or_else(|| format!("classhub-{topic}"));

            // Manual commits: an offset is committed only after the event
            // has been handed over, which is what makes delivery
            // at-least-once instead of at-most-once.
            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &brokers)
                .set("group.id", &consumer_group_id)
                .set("enable.auto.commit", "false")
                .set("auto.offset.reset", &auto_offset_reset)
                .set("session.timeout.ms", "6000")
                .set("enable.partition.eof", "false")
                .create()
                .map_err(|e| EventBusError::SubscriptionFailed {
                    topic: topic.clone(),
                    reason: format!("failed to create consumer: {e}"),
                })?;

            consumer
                .subscribe(&[topic.as_str()])
                .map_err(|e| EventBusError::SubscriptionFailed {
                    topic: topic.clone(),
                    reason: format!("failed to subscribe: {e}"),
                })?;

            tracing::info!(
                topic = %topic,
                consumer_group = %consumer_group_id,
                auto_offset_reset = %auto_offset_reset,
                "subscribed to change channel"
            );

            let (tx, rx) = tokio::sync::mpsc::channel(buffer_size);

            // The spawned task owns the consumer and forwards decoded
            // events; the subscriber only ever sees the channel.
            tokio::spawn(async move {
                use futures::StreamExt;
                use rdkafka::consumer::CommitMode;

                let mut stream = consumer.stream();

                while let Some(msg_result) = stream.next().await {
                    match msg_result {
                        Ok(message) => {
                            let item = match message.payload() {
                                Some(payload) => CourseChangeEvent::from_json(payload)
                                    .map_err(|e| {
                                        EventBusError::DeserializationFailed(e.to_string())
                                    }),
                                None => Err(EventBusError::DeserializationFailed(
                                    "message has no payload".to_string(),
                                )),
                            };

                            // Hand over first, commit second: crashing in
                            // between redelivers rather than drops.
                            if tx.send(item).await.is_err() {
                                tracing::debug!("subscriber dropped, exiting consumer task");
                                break;
                            }

                            if let Err(e) =
                                consumer.commit_message(&message, CommitMode::Async)
                            {
                                tracing::warn!(
                                    topic = message.topic(),
                                    partition = message.partition(),
                                    offset = message.offset(),
                                    error = %e,
                                    "offset commit failed, message may be redelivered"
                                );
                            }
                        }
                        Err(e) => {
                            let err = EventBusError::TransportError(format!(
                                "failed to receive message: {e}"
                            ));
                            if tx.send(Err(err)).await.is_err() {
                                break;
                            }
                        }
                    }
                }

                tracing::debug!("consumer task exiting");
            });

            let stream = async_stream::stream! {
                let mut rx = rx;
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };

            Ok(Box::pin(stream) as EventStream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bus_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedpandaEventBus>();
        assert_sync::<RedpandaEventBus>();
    }

    #[test]
    fn builder_requires_brokers() {
        let err = RedpandaEventBus::builder().build().err();
        assert!(matches!(err, Some(EventBusError::ConnectionFailed(_))));
    }
}
