//! Enrollments service: the admission controller behind HTTP.

use classhub_admission::{AdmissionService, CoursesApiClient, UsersApiClient};
use classhub_core::course_store::CourseStore;
use classhub_core::ledger::EnrollmentLedger;
use classhub_core::users::UserDirectory;
use classhub_postgres::PostgresLedger;
use classhub_web::{Config, EnrollmentState, enrollment_router};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let pool = classhub_postgres::connect(
        &config.database.url,
        config.database.max_connections,
        config.database.acquire_timeout(),
    )
    .await?;
    let ledger = PostgresLedger::new(pool);
    ledger.migrate().await?;

    let courses = CoursesApiClient::new(config.upstream.courses_api.clone())?;
    let users = UsersApiClient::new(config.upstream.users_api.clone())?;

    let admission = Arc::new(AdmissionService::new(
        Arc::new(users) as Arc<dyn UserDirectory>,
        Arc::new(courses) as Arc<dyn CourseStore>,
        Arc::new(ledger) as Arc<dyn EnrollmentLedger>,
    ));

    let app = enrollment_router(EnrollmentState::new(admission));
    let addr = config.enrollments_server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "enrollments service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("enrollments service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
