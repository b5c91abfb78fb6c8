//! # Classhub Postgres
//!
//! `PostgreSQL`-backed enrollment ledger.
//!
//! Both ledger invariants live at the storage layer, where concurrent
//! writers cannot slip between a check and an act:
//!
//! - duplicate pairs are stopped by the `UNIQUE (user_id, course_id)`
//!   constraint, not an application-level read-then-write;
//! - the capacity bound is re-validated inside the same transaction as
//!   the insert, with same-course admissions serialized by a
//!   transaction-scoped advisory lock so the last seat can only be won
//!   once. Admissions for different courses take different locks and
//!   proceed fully in parallel.

pub mod ledger;

pub use ledger::PostgresLedger;

use classhub_core::ledger::LedgerError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Connect a pool with bounded acquire and connect timeouts.
///
/// A saturated or unreachable database surfaces as
/// [`LedgerError::Unavailable`] within `acquire_timeout`, never as a
/// silent hang.
///
/// # Errors
///
/// Returns [`LedgerError::Unavailable`] if the pool cannot be established.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, LedgerError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
        .map_err(|e| LedgerError::Unavailable(format!("failed to connect: {e}")))
}
