//! # Classhub Runtime
//!
//! Asynchronous plumbing shared by the publisher and consumer sides of the
//! course change channel:
//!
//! - [`retry`]: exponential backoff for transient failures;
//! - [`publisher`]: fire-and-forget change publishing with internal
//!   retry, so course mutations never block on the channel;
//! - [`consumer`]: the subscribe-process-reconnect loop feeding the index
//!   synchronizer, with poison isolation and redelivery of events that hit
//!   transient backend errors.
//!
//! The admission path deliberately uses none of this: admission failures
//! are attempt-time facts and are surfaced to the caller without retry.

pub mod consumer;
pub mod publisher;
pub mod retry;

pub use consumer::{EventConsumer, EventHandler, HandlerError};
pub use publisher::ChangePublisher;
pub use retry::{RetryPolicy, retry_with_backoff, retry_with_predicate};
