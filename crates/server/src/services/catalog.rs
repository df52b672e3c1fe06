//! Lesson listing, lookup and search.

use tracing::instrument;

use afterschool_core::{Lesson, LessonId, SortDirection, SortKey, matches_query, sort_lessons};

use super::ShopError;
use crate::db::Store;

/// Read-only access to the lesson catalog.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// All lessons, by subject unless another sort key is given.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Store` if the lessons cannot be read.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        sort: Option<SortKey>,
        direction: SortDirection,
    ) -> Result<Vec<Lesson>, ShopError> {
        let mut lessons = self.store.list_lessons().await?;
        if sort.is_some() || direction == SortDirection::Desc {
            sort_lessons(&mut lessons, sort.unwrap_or_default(), direction);
        }
        Ok(lessons)
    }

    /// One lesson, or `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Store` if the lesson cannot be read.
    #[instrument(skip(self))]
    pub async fn get(&self, id: LessonId) -> Result<Option<Lesson>, ShopError> {
        Ok(self.store.get_lesson(id).await?)
    }

    /// Lessons matching a free-text query. An empty query matches nothing.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Store` if the lessons cannot be read.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Lesson>, ShopError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let lessons = self.store.list_lessons().await?;
        Ok(lessons
            .into_iter()
            .filter(|lesson| matches_query(lesson, query))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, seed};

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        seed::seed_if_empty(&store).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_list_defaults_to_subject_order() {
        let store = seeded().await;
        let lessons = CatalogService::new(&store)
            .list(None, SortDirection::Asc)
            .await
            .unwrap();
        assert_eq!(lessons.first().unwrap().subject, "art");
        assert_eq!(lessons.last().unwrap().subject, "sports");
    }

    #[tokio::test]
    async fn test_list_by_price_descending() {
        let store = seeded().await;
        let lessons = CatalogService::new(&store)
            .list(Some(SortKey::Price), SortDirection::Desc)
            .await
            .unwrap();
        let prices: Vec<String> = lessons.iter().map(|l| l.price.to_string()).collect();
        assert_eq!(prices[0], "25");
        assert_eq!(prices[9], "5");
        // Stable: english precedes sports in the incoming subject order.
        assert_eq!(lessons[0].subject, "english");
        assert_eq!(lessons[1].subject, "sports");
    }

    #[tokio::test]
    async fn test_search() {
        let store = seeded().await;
        let catalog = CatalogService::new(&store);

        assert!(catalog.search("").await.unwrap().is_empty());

        let found = catalog.search("MUS").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].subject, "music");

        // "25" matches the two 25-priced lessons only.
        let found = catalog.search("25").await.unwrap();
        let subjects: Vec<&str> = found.iter().map(|l| l.subject.as_str()).collect();
        assert_eq!(subjects, ["english", "sports"]);
    }

    #[tokio::test]
    async fn test_get_unknown_lesson() {
        let store = seeded().await;
        assert!(
            CatalogService::new(&store)
                .get(LessonId::new(404))
                .await
                .unwrap()
                .is_none()
        );
    }
}
