//! Course change events and their JSON wire form.
//!
//! Whenever a course record is created, updated, or deleted, the owning
//! service emits a [`CourseChangeEvent`] onto the channel. CREATE and
//! UPDATE carry a snapshot of the indexable fields so the consumer never
//! needs a follow-up read; DELETE carries only the id.
//!
//! The body is flat JSON (`content-type: application/json`):
//!
//! ```json
//! {"operation":"UPDATE","course_id":5,"name":"Rust","category":"backend","description":"..."}
//! ```
//!
//! The transport attaches no sequence number, timestamp, or dedup key.
//! Consumers must tolerate duplicates and reordering.

use crate::types::CourseId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while encoding or decoding an event body.
#[derive(Error, Debug)]
pub enum EventError {
    /// The event could not be serialized to JSON.
    #[error("failed to serialize event: {0}")]
    Serialization(String),

    /// The bytes were not a valid event body.
    #[error("failed to deserialize event: {0}")]
    Deserialization(String),
}

/// Mutation kind carried by a change event.
///
/// `Unknown` absorbs operation strings this consumer does not understand,
/// so a single unrecognized message can be logged and discarded instead of
/// poisoning the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOperation {
    /// A course record was created.
    Create,
    /// A course record was updated.
    Update,
    /// A course record was deleted.
    Delete,
    /// Any operation string not listed above.
    #[serde(other)]
    Unknown,
}

/// Change notification emitted by the course-owning service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CourseChangeEvent {
    /// What happened to the course record.
    pub operation: ChangeOperation,
    /// The course the event is about.
    pub course_id: CourseId,
    /// Display name snapshot (CREATE/UPDATE only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Category snapshot (CREATE/UPDATE only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Description snapshot (CREATE/UPDATE only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CourseChangeEvent {
    /// MIME type of the serialized body.
    pub const CONTENT_TYPE: &'static str = "application/json";

    /// Event for a newly created course.
    #[must_use]
    pub const fn created(
        course_id: CourseId,
        name: String,
        category: String,
        description: String,
    ) -> Self {
        Self {
            operation: ChangeOperation::Create,
            course_id,
            name: Some(name),
            category: Some(category),
            description: Some(description),
        }
    }

    /// Event for an updated course.
    #[must_use]
    pub const fn updated(
        course_id: CourseId,
        name: String,
        category: String,
        description: String,
    ) -> Self {
        Self {
            operation: ChangeOperation::Update,
            course_id,
            name: Some(name),
            category: Some(category),
            description: Some(description),
        }
    }

    /// Event for a deleted course.
    #[must_use]
    pub const fn deleted(course_id: CourseId) -> Self {
        Self {
            operation: ChangeOperation::Delete,
            course_id,
            name: None,
            category: None,
            description: None,
        }
    }

    /// Serialize the event to its JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| EventError::Serialization(e.to_string()))
    }

    /// Deserialize an event from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Deserialization`] if the bytes are not a valid
    /// event body. An unrecognized `operation` string is not an error; it
    /// decodes to [`ChangeOperation::Unknown`].
    pub fn from_json(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|e| EventError::Deserialization(e.to_string()))
    }
}
