//! HTTP gateways to the course store and the identity service.
//!
//! Both clients share the same error discipline: an upstream 404 means the
//! record does not exist (`NotFound`); a timeout, transport failure,
//! undecodable body, or any other status means nothing can be said about
//! it (`Unavailable`). The two are never conflated, and every request has
//! a bounded timeout so no admission step can hang.

use async_trait::async_trait;
use classhub_core::course_store::{CourseStore, CourseStoreError};
use classhub_core::types::{CourseId, CourseSnapshot, UserId};
use classhub_core::users::{UserDirectory, UserDirectoryError};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

fn build_client(timeout: Duration) -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))
}

/// Read-only gateway to the course-owning service.
///
/// `GET {base_url}/courses/{id}`, no caching.
pub struct CoursesApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoursesApiClient {
    /// Create a gateway against `base_url` (e.g. `http://courses-api:8081`)
    /// with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CourseStoreError::Unavailable`] if the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, CourseStoreError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a gateway with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CourseStoreError::Unavailable`] if the HTTP client cannot
    /// be constructed.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CourseStoreError> {
        Ok(Self {
            http: build_client(timeout).map_err(CourseStoreError::Unavailable)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl CourseStore for CoursesApiClient {
    async fn fetch(&self, course_id: CourseId) -> Result<CourseSnapshot, CourseStoreError> {
        let url = format!("{}/courses/{}", self.base_url, course_id);
        debug!(%url, "fetching course snapshot");

        let response = self.http.get(&url).send().await.map_err(|e| {
            CourseStoreError::Unavailable(format!("course fetch failed: {e}"))
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CourseStoreError::NotFound(course_id));
        }
        if !response.status().is_success() {
            return Err(CourseStoreError::Unavailable(format!(
                "course store returned {}",
                response.status()
            )));
        }

        response.json::<CourseSnapshot>().await.map_err(|e| {
            CourseStoreError::Unavailable(format!("undecodable course body: {e}"))
        })
    }
}

/// Existence check against the identity service.
///
/// `GET {base_url}/users/{id}`; only the status matters.
pub struct UsersApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl UsersApiClient {
    /// Create a gateway against `base_url` (e.g. `http://users-api:8080`)
    /// with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::Unavailable`] if the HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, UserDirectoryError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a gateway with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::Unavailable`] if the HTTP client
    /// cannot be constructed.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UserDirectoryError> {
        Ok(Self {
            http: build_client(timeout).map_err(UserDirectoryError::Unavailable)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl UserDirectory for UsersApiClient {
    async fn verify(&self, user_id: UserId) -> Result<(), UserDirectoryError> {
        let url = format!("{}/users/{}", self.base_url, user_id);
        debug!(%url, "verifying user exists");

        let response = self.http.get(&url).send().await.map_err(|e| {
            UserDirectoryError::Unavailable(format!("user check failed: {e}"))
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(UserDirectoryError::NotFound(user_id));
        }
        if !response.status().is_success() {
            return Err(UserDirectoryError::Unavailable(format!(
                "identity service returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_course_store_is_unavailable_not_missing() {
        // Nothing listens on this port; the connection is refused
        // immediately rather than timing out.
        let Ok(client) = CoursesApiClient::with_timeout(
            "http://127.0.0.1:1",
            Duration::from_millis(200),
        ) else {
            return;
        };

        let err = client.fetch(CourseId(5)).await.err();
        assert!(matches!(err, Some(CourseStoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn unreachable_identity_service_is_unavailable() {
        let Ok(client) =
            UsersApiClient::with_timeout("http://127.0.0.1:1", Duration::from_millis(200))
        else {
            return;
        };

        let err = client.verify(UserId(7)).await.err();
        assert!(matches!(err, Some(UserDirectoryError::Unavailable(_))));
    }
}
