// Domain models for chapter read progress, independent of storage and transport

use std::{collections::HashMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a progress record.
///
/// Locally created records get a UUID v7 rendered as text; ids arriving from a
/// remote replica are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressId(String);

impl ProgressId {
    pub fn generate() -> Self {
        ProgressId(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProgressId {
    fn from(value: String) -> Self {
        ProgressId(value)
    }
}

impl fmt::Display for ProgressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The (user, comic, chapter) triple a record is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgressKey {
    pub user_id: String,
    pub comic_id: String,
    pub chapter_id: String,
}

impl ProgressKey {
    pub fn new(
        user_id: impl Into<String>,
        comic_id: impl Into<String>,
        chapter_id: impl Into<String>,
    ) -> Self {
        ProgressKey {
            user_id: user_id.into(),
            comic_id: comic_id.into(),
            chapter_id: chapter_id.into(),
        }
    }
}

/// Canonical progress record as held by the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadProgress {
    pub id: ProgressId,
    pub user_id: String,
    pub comic_id: String,
    pub chapter_id: String,
    pub total_pages: u32,
    /// 0 = not started, `total_pages` = fully read
    pub page: u32,
    pub updated_at: DateTime<Utc>,
}

impl ReadProgress {
    pub fn key(&self) -> ProgressKey {
        ProgressKey::new(&self.user_id, &self.comic_id, &self.chapter_id)
    }

    pub fn to_record(&self) -> ReadProgressRecord {
        ReadProgressRecord {
            id: Some(self.id.clone()),
            chapter_id: self.chapter_id.clone(),
            comic_id: self.comic_id.clone(),
            user_id: self.user_id.clone(),
            total_pages: i64::from(self.total_pages),
            page: i64::from(self.page),
            updated_at: Some(self.updated_at),
        }
    }
}

/// Wire / replica shape of a progress record.
///
/// `id` and `updated_at` are absent until a record has been assigned by a
/// tracker. Integers are signed so out-of-range values reach validation
/// instead of failing at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadProgressRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProgressId>,
    pub chapter_id: String,
    pub comic_id: String,
    pub user_id: String,
    #[serde(deserialize_with = "super::de::i64_from_str_or_num")]
    pub total_pages: i64,
    #[serde(deserialize_with = "super::de::i64_from_str_or_num")]
    pub page: i64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::de::opt_datetime_from_str_or_millis"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Chapter ordering metadata supplied by the catalog.
///
/// Maps chapter id to chapter number; numbers may be fractional (e.g. 10.5).
#[derive(Debug, Clone, Default)]
pub struct ChapterOrder {
    numbers: HashMap<String, f64>,
}

impl ChapterOrder {
    pub fn from_numbers<I, S>(numbers: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        ChapterOrder {
            numbers: numbers.into_iter().map(|(id, n)| (id.into(), n)).collect(),
        }
    }

    /// Chapters listed in reading order; the position becomes the number.
    /// A repeated id keeps its first position.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut numbers = HashMap::new();
        for (idx, id) in ids.into_iter().enumerate() {
            numbers.entry(id.into()).or_insert(idx as f64);
        }
        ChapterOrder { numbers }
    }

    pub fn number(&self, chapter_id: &str) -> Option<f64> {
        self.numbers.get(chapter_id).copied()
    }
}
