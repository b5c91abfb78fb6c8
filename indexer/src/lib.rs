//! # Classhub Indexer
//!
//! Keeps the derived search index eventually consistent with the course
//! store despite at-least-once, possibly reordered delivery.
//!
//! [`IndexSynchronizer`] consumes course change events and applies them as
//! idempotent upserts and deletes keyed by course id (last write wins,
//! never an incremental delta). Once delivery stops, the document set
//! converges to the live courses; while events are in flight any
//! intermediate state may be observed.
//!
//! Two [`SearchIndex`](classhub_core::index::SearchIndex) backends:
//!
//! - [`InMemoryIndex`]: deterministic, used in tests and local runs;
//! - [`SolrIndex`]: HTTP JSON client for a Solr-style index server.

pub mod memory;
pub mod solr;
pub mod synchronizer;

pub use memory::InMemoryIndex;
pub use solr::SolrIndex;
pub use synchronizer::IndexSynchronizer;
