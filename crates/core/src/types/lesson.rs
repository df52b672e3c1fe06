//! Lessons and the pure listing transforms over them.

use core::cmp::Ordering;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::LessonId;
use super::price::Price;

/// A bookable after-school lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub subject: String,
    pub location: String,
    pub price: Price,
    /// Remaining places. Unsigned, so it can never go below zero.
    pub spaces: u32,
    /// Image file name served by the client, e.g. `Art.jpg`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Lesson {
    /// Whether `qty` places can still be booked.
    #[must_use]
    pub const fn has_spaces(&self, qty: u32) -> bool {
        self.spaces >= qty
    }
}

/// A lesson that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLesson {
    pub subject: String,
    pub location: String,
    pub price: Price,
    pub spaces: u32,
    pub image: Option<String>,
}

/// Field a lesson list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Subject,
    Location,
    Price,
    Spaces,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subject" => Ok(Self::Subject),
            "location" => Ok(Self::Location),
            "price" => Ok(Self::Price),
            "spaces" => Ok(Self::Spaces),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

fn compare(a: &Lesson, b: &Lesson, key: SortKey) -> Ordering {
    match key {
        SortKey::Subject => a.subject.to_lowercase().cmp(&b.subject.to_lowercase()),
        SortKey::Location => a.location.to_lowercase().cmp(&b.location.to_lowercase()),
        SortKey::Price => a.price.cmp(&b.price),
        SortKey::Spaces => a.spaces.cmp(&b.spaces),
    }
}

/// Sort lessons in place.
///
/// Text keys compare case-folded, numeric keys compare by value. The sort is
/// stable, so equal keys keep their incoming order in both directions.
pub fn sort_lessons(lessons: &mut [Lesson], key: SortKey, direction: SortDirection) {
    lessons.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Whether a lesson matches a free-text search query.
///
/// Subject and location match case-insensitively; price and spaces match on
/// their decimal text (so `"1"` finds a price of 10 and 15 spaces alike).
#[must_use]
pub fn matches_query(lesson: &Lesson, query: &str) -> bool {
    let needle = query.to_lowercase();
    lesson.subject.to_lowercase().contains(&needle)
        || lesson.location.to_lowercase().contains(&needle)
        || lesson.price.to_string().contains(query)
        || lesson.spaces.to_string().contains(query)
}
