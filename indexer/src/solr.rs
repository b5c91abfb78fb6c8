//! Solr-style HTTP backend for the search index.
//!
//! Speaks the JSON update/select API: upserts become `add` commands,
//! deletes become `delete` commands (both committed immediately), and
//! searches go through `/select` with `start`/`rows` paging. Error
//! classification drives the redelivery policy: timeouts, transport
//! failures, and 5xx responses are transient; 4xx responses are permanent
//! rejections.

use async_trait::async_trait;
use classhub_core::index::{IndexDocument, IndexError, SearchIndex};
use classhub_core::types::CourseId;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for a Solr-style index server.
pub struct SolrIndex {
    http: reqwest::Client,
    base_url: String,
    collection: String,
}

impl SolrIndex {
    /// Create a client for `collection` at `base_url`
    /// (e.g. `http://solr:8983`), with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Rejected`] if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Result<Self, IndexError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| IndexError::Rejected(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            collection: collection.into(),
        })
    }

    fn update_url(&self) -> String {
        format!(
            "{}/solr/{}/update?commit=true",
            self.base_url, self.collection
        )
    }

    fn select_url(&self) -> String {
        format!("{}/solr/{}/select", self.base_url, self.collection)
    }

    async fn post_update(&self, body: serde_json::Value) -> Result<(), IndexError> {
        let response = self
            .http
            .post(self.update_url())
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        classify_status(response.status())
    }
}

fn classify_transport_error(e: reqwest::Error) -> IndexError {
    IndexError::Transient(format!("index request failed: {e}"))
}

fn classify_status(status: reqwest::StatusCode) -> Result<(), IndexError> {
    if status.is_success() {
        Ok(())
    } else if status.is_server_error() {
        Err(IndexError::Transient(format!("index returned {status}")))
    } else {
        Err(IndexError::Rejected(format!("index returned {status}")))
    }
}

#[derive(Deserialize)]
struct SelectResponse {
    response: SelectBody,
}

#[derive(Deserialize)]
struct SelectBody {
    #[serde(default)]
    docs: Vec<SolrDoc>,
}

#[derive(Deserialize)]
struct SolrDoc {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
}

impl From<SolrDoc> for IndexDocument {
    fn from(doc: SolrDoc) -> Self {
        Self {
            id: CourseId(doc.id),
            name: doc.name,
            category: doc.category,
            description: doc.description,
        }
    }
}

#[async_trait]
impl SearchIndex for SolrIndex {
    async fn upsert(&self, doc: IndexDocument) -> Result<(), IndexError> {
        self.post_update(serde_json::json!({
            "add": {
                "doc": {
                    "id": doc.id,
                    "name": doc.name,
                    "category": doc.category,
                    "description": doc.description,
                }
            }
        }))
        .await
    }

    async fn delete(&self, course_id: CourseId) -> Result<(), IndexError> {
        // Solr treats deleting an unknown id as a successful no-op, which
        // is exactly the idempotence the synchronizer relies on.
        self.post_update(serde_json::json!({
            "delete": { "id": course_id.to_string() }
        }))
        .await
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<IndexDocument>, IndexError> {
        let q = if query.trim().is_empty() {
            "*:*".to_string()
        } else {
            let escaped = query.replace('"', "\\\"");
            format!("name:\"{escaped}\" OR category:\"{escaped}\" OR description:\"{escaped}\"")
        };

        let response = self
            .http
            .get(self.select_url())
            .query(&[
                ("q", q.as_str()),
                ("start", &offset.to_string()),
                ("rows", &limit.to_string()),
                ("wt", "json"),
            ])
            .send()
            .await
            .map_err(classify_transport_error)?;

        classify_status(response.status())?;

        let body: SelectResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Transient(format!("bad select response: {e}")))?;

        Ok(body.response.docs.into_iter().map(Into::into).collect())
    }
}
