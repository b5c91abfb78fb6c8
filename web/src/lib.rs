//! # Classhub Web
//!
//! HTTP surface for the two Classhub services:
//!
//! - the **enrollments** service exposes the admission controller
//!   (`POST /enrollments`, `GET /enrollments[?user_id=]`);
//! - the **search** service exposes the derived index
//!   (`GET /search?q=&limit=&offset=`) and hosts the channel consumer.
//!
//! Handlers translate the domain error taxonomy onto HTTP statuses
//! (`NotFound` → 404, `Conflict` → 409, `Unavailable` → 503, `Invalid` →
//! 422) and never invent outcomes of their own: request parsing and DTO
//! mapping happen here, decisions happen in the domain crates.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::{enrollment_router, search_router};
pub use state::{EnrollmentState, SearchState};
