//! In-memory search index.

use async_trait::async_trait;
use classhub_core::index::{IndexDocument, IndexError, SearchIndex};
use classhub_core::types::CourseId;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Search index backed by an in-process map.
///
/// Documents are keyed by course id; matching is case-insensitive
/// substring search over name, category, and description. Results come
/// back in ascending id order, so paging is deterministic.
#[derive(Default)]
pub struct InMemoryIndex {
    docs: RwLock<BTreeMap<CourseId, IndexDocument>>,
}

impl InMemoryIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently indexed.
    #[must_use]
    #[allow(clippy::unwrap_used)] // lock poisoning implies an earlier panic
    pub fn len(&self) -> usize {
        self.docs.read().unwrap().len()
    }

    /// Whether the index holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch one document by id.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn get(&self, course_id: CourseId) -> Option<IndexDocument> {
        self.docs.read().unwrap().get(&course_id).cloned()
    }

    fn matches(doc: &IndexDocument, needle: &str) -> bool {
        needle.is_empty()
            || doc.name.to_lowercase().contains(needle)
            || doc.category.to_lowercase().contains(needle)
            || doc.description.to_lowercase().contains(needle)
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    #[allow(clippy::unwrap_used)]
    async fn upsert(&self, doc: IndexDocument) -> Result<(), IndexError> {
        self.docs.write().unwrap().insert(doc.id, doc);
        Ok(())
    }

    #[allow(clippy::unwrap_used)]
    async fn delete(&self, course_id: CourseId) -> Result<(), IndexError> {
        self.docs.write().unwrap().remove(&course_id);
        Ok(())
    }

    #[allow(clippy::unwrap_used)]
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<IndexDocument>, IndexError> {
        let needle = query.trim().to_lowercase();
        let docs = self.docs.read().unwrap();
        Ok(docs
            .values()
            .filter(|doc| Self::matches(doc, &needle))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn doc(id: i64, name: &str, category: &str) -> IndexDocument {
        IndexDocument {
            id: CourseId(id),
            name: name.to_string(),
            category: category.to_string(),
            description: format!("all about {name}"),
        }
    }

    #[tokio::test]
    async fn search_matches_any_text_field() {
        let index = InMemoryIndex::new();
        index.upsert(doc(1, "Rust Basics", "backend")).await.unwrap();
        index.upsert(doc(2, "Watercolors", "art")).await.unwrap();

        let by_name = index.search("rust", 10, 0).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, CourseId(1));

        let by_category = index.search("art", 10, 0).await.unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].id, CourseId(2));
    }

    #[tokio::test]
    async fn paging_is_deterministic_by_id() {
        let index = InMemoryIndex::new();
        for id in 1..=5 {
            index.upsert(doc(id, "Course", "general")).await.unwrap();
        }

        let page = index.search("course", 2, 2).await.unwrap();
        assert_eq!(
            page.iter().map(|d| d.id).collect::<Vec<_>>(),
            vec![CourseId(3), CourseId(4)]
        );
    }

    #[tokio::test]
    async fn empty_query_matches_everything() {
        let index = InMemoryIndex::new();
        index.upsert(doc(1, "A", "x")).await.unwrap();
        index.upsert(doc(2, "B", "y")).await.unwrap();

        assert_eq!(index.search("", 10, 0).await.unwrap().len(), 2);
    }
}
