//! Request handlers.

pub mod enrollments;
pub mod health;
pub mod search;
