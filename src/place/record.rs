use crate::place::element::Coordinates;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Canonical place categories the pipeline indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cafe,
    Restaurant,
    Convenience,
    Salon,
}

impl Category {
    /// Maps a raw `amenity`/`shop` tag value to a canonical category.
    ///
    /// The table is fixed; anything outside it (including tag values the
    /// crawl query matches for other element kinds) maps to `None`.
    pub fn from_tag(value: &str) -> Option<Self> {
        match value {
            "cafe" => Some(Self::Cafe),
            "restaurant" | "fast_food" => Some(Self::Restaurant),
            "convenience" | "supermarket" | "department_store" => Some(Self::Convenience),
            // bakeries behave like cafes for search purposes
            "bakery" => Some(Self::Cafe),
            "hairdresser" | "beauty" => Some(Self::Salon),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cafe => "cafe",
            Self::Restaurant => "restaurant",
            Self::Convenience => "convenience",
            Self::Salon => "salon",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized place, ready for indexing.
///
/// Never mutated after construction; the whole collection is dropped once
/// the bulk load finishes.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceRecord {
    pub source_id: String,
    pub name: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub location: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl PlaceRecord {
    /// Content-derived identity used to collapse duplicates across
    /// overlapping grid cells.
    ///
    /// Rounding to 4 decimals (~11m) treats nearby same-named places of the
    /// same category as one physical place. A heuristic, not a guaranteed
    /// identity.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{:.4}|{:.4}",
            self.category,
            self.name.to_lowercase(),
            self.location.lat,
            self.location.lon
        )
    }
}

/// ISO-8601 serialization with millisecond precision, the format the search
/// index's `date` fields expect.
mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
    }
}
