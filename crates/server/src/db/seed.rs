//! Startup maintenance: the sample lesson catalog and the space/cart reset.

use tracing::{info, instrument};

use afterschool_core::{NewLesson, Price};

use super::{Store, StoreError};

/// Spaces every lesson starts with, and is reset to.
pub const DEFAULT_SPACES: u32 = 10;

/// `(subject, location, price, image)` for the sample catalog.
const SAMPLE_LESSONS: [(&str, &str, u32, &str); 10] = [
    ("art", "A 12", 5, "Art.jpg"),
    ("coding", "B 07", 10, "Coding.jpg"),
    ("dance", "C 15", 15, "Dance.jpg"),
    ("drama", "D 22", 20, "Drama.jpg"),
    ("english", "E 03", 25, "English.jpg"),
    ("history", "F 18", 5, "History.jpg"),
    ("math", "G 09", 10, "Math.jpg"),
    ("music", "H 14", 15, "Music.jpg"),
    ("science", "I 21", 20, "Science.jpg"),
    ("sports", "J 06", 25, "Sports.jpg"),
];

/// The ten sample lessons, each with [`DEFAULT_SPACES`] spaces.
#[must_use]
pub fn sample_lessons() -> Vec<NewLesson> {
    SAMPLE_LESSONS
        .iter()
        .map(|&(subject, location, price, image)| NewLesson {
            subject: subject.to_owned(),
            location: location.to_owned(),
            price: Price::from_units(price),
            spaces: DEFAULT_SPACES,
            image: Some(image.to_owned()),
        })
        .collect()
}

/// Insert the sample lessons if the store has none.
///
/// Returns the number of lessons inserted (zero when lessons already exist).
///
/// # Errors
///
/// Returns `StoreError` if the store cannot be read or written.
#[instrument(skip(store), fields(backend = store.backend()))]
pub async fn seed_if_empty(store: &dyn Store) -> Result<usize, StoreError> {
    let existing = store.count_lessons().await?;
    if existing > 0 {
        info!(existing, "Lessons already present, skipping seed");
        return Ok(0);
    }

    let lessons = sample_lessons();
    let count = lessons.len();
    for lesson in lessons {
        store.insert_lesson(lesson).await?;
    }

    info!(count, "Seeded sample lessons");
    Ok(count)
}

/// Outcome of [`reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSummary {
    pub lessons_reset: u64,
    pub carts_cleared: u64,
}

/// Put every lesson back to [`DEFAULT_SPACES`] and delete all carts.
///
/// # Errors
///
/// Returns `StoreError` if the store cannot be written.
#[instrument(skip(store), fields(backend = store.backend()))]
pub async fn reset(store: &dyn Store) -> Result<ResetSummary, StoreError> {
    let lessons_reset = store.reset_spaces(DEFAULT_SPACES).await?;
    let carts_cleared = store.clear_carts().await?;

    info!(
        lessons_reset,
        carts_cleared,
        spaces = DEFAULT_SPACES,
        "Reset lesson spaces and carts"
    );
    Ok(ResetSummary {
        lessons_reset,
        carts_cleared,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use afterschool_core::{Cart, UserId};

    use super::*;
    use crate::db::{CartStore, LessonStore, MemoryStore};

    #[test]
    fn test_sample_lessons() {
        let lessons = sample_lessons();
        assert_eq!(lessons.len(), 10);
        assert!(lessons.iter().all(|l| l.spaces == DEFAULT_SPACES));
        assert_eq!(lessons[0].subject, "art");
        assert_eq!(lessons[0].image.as_deref(), Some("Art.jpg"));
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let store = MemoryStore::new();
        assert_eq!(seed_if_empty(&store).await.unwrap(), 10);
        assert_eq!(seed_if_empty(&store).await.unwrap(), 0);
        assert_eq!(store.count_lessons().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_reset_restores_spaces_and_empties_carts() {
        let store = MemoryStore::new();
        seed_if_empty(&store).await.unwrap();
        let art = store.list_lessons().await.unwrap().remove(0);
        store.take_spaces(art.id, 7).await.unwrap();

        let mut cart = Cart::new(UserId::new(1));
        cart.add(&art, 1);
        store.put_cart(&cart).await.unwrap();

        let summary = reset(&store).await.unwrap();
        assert_eq!(summary.lessons_reset, 10);
        assert_eq!(summary.carts_cleared, 1);
        assert_eq!(
            store.get_lesson(art.id).await.unwrap().unwrap().spaces,
            DEFAULT_SPACES
        );
        assert!(store.get_cart(UserId::new(1)).await.unwrap().is_none());
    }
}
