//! # Classhub Admission
//!
//! The admission controller: the single decision point for accepting or
//! rejecting an enrollment under a capacity invariant, plus the HTTP
//! gateways it consults (the course store and the identity service).
//!
//! An admission attempt walks an ordered, short-circuiting pipeline of
//! identity check, course snapshot fetch, enrollment count, capacity
//! pre-check, and conditional insert; every failure is terminal for that
//! attempt. Capacity and existence are attempt-time facts, so nothing
//! here retries; `Unavailable` is surfaced to the caller to retry if it
//! wants to.
//!
//! The one synchronization primitive in the whole flow is the ledger's
//! atomic conditional insert: admissions for different courses proceed
//! fully in parallel, and admissions for the same course are serialized
//! only at that final storage operation.

pub mod clients;
pub mod service;

pub use clients::{CoursesApiClient, UsersApiClient};
pub use service::AdmissionService;
