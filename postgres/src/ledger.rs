//! The enrollment ledger over `PostgreSQL`.

use async_trait::async_trait;
use classhub_core::ledger::{EnrollmentLedger, LedgerError};
use classhub_core::types::{CourseId, Enrollment, EnrollmentId, UserId};
use sqlx::postgres::PgPool;
use tracing::debug;

/// Unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// `PostgreSQL` implementation of [`EnrollmentLedger`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE enrollments (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL,
///     course_id BIGINT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
///     UNIQUE (user_id, course_id)
/// );
/// ```
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Create a ledger over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the ledger migrations.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), LedgerError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::Unavailable(format!("migration failed: {e}")))
    }

    /// The underlying pool, for health checks.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn unavailable(e: sqlx::Error) -> LedgerError {
    LedgerError::Unavailable(format!("ledger query failed: {e}"))
}

fn map_insert_error(e: sqlx::Error, user_id: UserId, course_id: CourseId) -> LedgerError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return LedgerError::Duplicate { user_id, course_id };
        }
    }
    unavailable(e)
}

fn rows_to_enrollments(rows: Vec<(i64, i64, i64)>) -> Vec<Enrollment> {
    rows.into_iter()
        .map(|(id, user_id, course_id)| Enrollment {
            id: EnrollmentId(id),
            user_id: UserId(user_id),
            course_id: CourseId(course_id),
        })
        .collect()
}

#[async_trait]
impl EnrollmentLedger for PostgresLedger {
    async fn insert_within_capacity(
        &self,
        user_id: UserId,
        course_id: CourseId,
        capacity: u32,
    ) -> Result<Enrollment, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        // Serialize same-course admissions for the duration of this
        // transaction. Without it, two READ COMMITTED inserts could both
        // observe count < capacity for the last seat; with it, the guard
        // below and the insert form one atomic unit. Released on commit
        // or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(course_id.0)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        let inserted: Option<(i64,)> = sqlx::query_as(
            "INSERT INTO enrollments (user_id, course_id)
             SELECT $1, $2
             WHERE (SELECT count(*) FROM enrollments WHERE course_id = $2) < $3
             RETURNING id",
        )
        .bind(user_id.0)
        .bind(course_id.0)
        .bind(i64::from(capacity))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, user_id, course_id))?;

        let Some((id,)) = inserted else {
            // Guard failed: the course filled up between the controller's
            // pre-check and here. The losing racer lands in this branch.
            return Err(LedgerError::CapacityExceeded(course_id));
        };

        tx.commit().await.map_err(unavailable)?;

        debug!(enrollment_id = id, user_id = %user_id, course_id = %course_id, "enrollment committed");
        Ok(Enrollment {
            id: EnrollmentId(id),
            user_id,
            course_id,
        })
    }

    async fn count_by_course(&self, course_id: CourseId) -> Result<u64, LedgerError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT count(*) FROM enrollments WHERE course_id = $1")
                .bind(course_id.0)
                .fetch_one(&self.pool)
                .await
                .map_err(unavailable)?;

        #[allow(clippy::cast_sign_loss)] // count(*) is never negative
        let count = count as u64;
        Ok(count)
    }

    async fn list(&self) -> Result<Vec<Enrollment>, LedgerError> {
        let rows: Vec<(i64, i64, i64)> =
            sqlx::query_as("SELECT id, user_id, course_id FROM enrollments ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(unavailable)?;
        Ok(rows_to_enrollments(rows))
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Enrollment>, LedgerError> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            "SELECT id, user_id, course_id FROM enrollments WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(rows_to_enrollments(rows))
    }

    async fn list_by_course(&self, course_id: CourseId) -> Result<Vec<Enrollment>, LedgerError> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            "SELECT id, user_id, course_id FROM enrollments WHERE course_id = $1 ORDER BY id",
        )
        .bind(course_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(rows_to_enrollments(rows))
    }

    async fn delete_by_course(&self, course_id: CourseId) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM enrollments WHERE course_id = $1")
            .bind(course_id.0)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(result.rows_affected())
    }
}
