//! # Classhub Testing
//!
//! In-memory fakes for every port in `classhub-core`, used by unit and
//! integration tests across the workspace.
//!
//! The fakes honor the same contracts as the production implementations:
//! the ledger's capacity guard and insert run atomically (one mutex), the
//! event bus is at-least-once with per-subscriber ordering only, and the
//! flaky index wrapper reproduces transient backend failures.
//!
//! ## Example
//!
//! ```
//! use classhub_core::ledger::EnrollmentLedger;
//! use classhub_core::types::{CourseId, UserId};
//! use classhub_testing::mocks::InMemoryLedger;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ledger = InMemoryLedger::new();
//! let enrollment = ledger
//!     .insert_within_capacity(UserId(7), CourseId(3), 30)
//!     .await
//!     .unwrap();
//! assert_eq!(enrollment.user_id, UserId(7));
//! # }
//! ```

pub mod mocks;

pub use mocks::{
    FlakyIndex, InMemoryCourseStore, InMemoryEventBus, InMemoryLedger, StaticUserDirectory,
};
