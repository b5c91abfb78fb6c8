//! # Classhub Core
//!
//! Domain types and ports for the enrollment-and-search core of the course
//! platform.
//!
//! Two independent flows meet here:
//!
//! 1. **Admission**: a synchronous decision to accept or reject an
//!    enrollment, composed from an identity check, a course snapshot fetch,
//!    and an atomic conditional insert into the enrollment ledger.
//! 2. **Index synchronization**: asynchronous propagation of course
//!    mutations to a derived search index over an at-least-once, unordered
//!    channel.
//!
//! The flows share no state. The search index is always a stale-tolerant
//! derivative of the course store and is never consulted for admission
//! decisions.
//!
//! This crate holds only the seams: records, events, the error taxonomy,
//! and the traits implemented by the storage, messaging, and HTTP crates.

pub mod course_store;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod index;
pub mod ledger;
pub mod types;
pub mod users;

pub use course_store::{CourseStore, CourseStoreError};
pub use error::{AdmissionError, ErrorKind};
pub use event::{ChangeOperation, CourseChangeEvent, EventError};
pub use event_bus::{EventBus, EventBusError, EventStream};
pub use index::{IndexDocument, IndexError, SearchIndex};
pub use ledger::{EnrollmentLedger, LedgerError};
pub use types::{CourseId, CourseSnapshot, Enrollment, EnrollmentId, UserId};
pub use users::{UserDirectory, UserDirectoryError};
