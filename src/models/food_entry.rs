//! Food entry model
//!
//! One catalog or logged food item with per-serving nutrients.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::Nutrients;
use crate::nutrition::units::DEFAULT_SERVING_WEIGHT_G;

/// A food item, either from a catalog or logged into a meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    /// Catalog id, barcode, or a generated UUID for manual entries
    pub id: String,
    pub name: String,
    /// Nutrients for one base serving
    pub nutrients: Nutrients,
    /// Free-form serving label, e.g. "1 slice"
    pub serving_size: String,
    /// Weight of one base serving in grams (<= 0 means unknown)
    pub serving_weight: f64,
    /// When the entry was added to a log; None for catalog results
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl FoodEntry {
    /// Build an entry, clamping nutrients to non-negative values
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        nutrients: Nutrients,
        serving_size: impl Into<String>,
        serving_weight: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nutrients: nutrients.sanitized(),
            serving_size: serving_size.into(),
            serving_weight,
            timestamp: None,
        }
    }

    /// Build a manual entry with a freshly generated id
    pub fn manual(
        name: impl Into<String>,
        nutrients: Nutrients,
        serving_size: impl Into<String>,
        serving_weight: f64,
    ) -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            name,
            nutrients,
            serving_size,
            serving_weight,
        )
    }

    /// Serving weight in grams, falling back to 100g when unknown or non-positive
    pub fn base_serving_weight(&self) -> f64 {
        if self.serving_weight.is_finite() && self.serving_weight > 0.0 {
            self.serving_weight
        } else {
            DEFAULT_SERVING_WEIGHT_G
        }
    }

    /// Copy of this entry stamped with the time it was logged
    pub fn stamped(&self, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(at),
            ..self.clone()
        }
    }

    /// Create from a `food_entries` row
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let timestamp: Option<String> = row.get("timestamp")?;
        Ok(Self {
            id: row.get("entry_id")?,
            name: row.get("name")?,
            nutrients: Nutrients {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
            }
            .sanitized(),
            serving_size: row.get("serving_size")?,
            serving_weight: row.get("serving_weight")?,
            timestamp: timestamp.as_deref().and_then(parse_timestamp),
        })
    }
}

/// Parse an RFC 3339 timestamp; malformed values are treated as absent
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_negative_nutrients() {
        let entry = FoodEntry::new("1", "Odd", Nutrients::new(-10.0, 2.0, -1.0, 3.0), "1 cup", 240.0);
        assert_eq!(entry.nutrients, Nutrients::new(0.0, 2.0, 0.0, 3.0));
        assert!(entry.timestamp.is_none());
    }

    #[test]
    fn test_base_serving_weight_defaults() {
        let mut entry = FoodEntry::new("1", "Toast", Nutrients::zero(), "1 slice", 0.0);
        assert_eq!(entry.base_serving_weight(), 100.0);
        entry.serving_weight = -3.0;
        assert_eq!(entry.base_serving_weight(), 100.0);
        entry.serving_weight = 28.0;
        assert_eq!(entry.base_serving_weight(), 28.0);
    }

    #[test]
    fn test_manual_entries_get_distinct_ids() {
        let a = FoodEntry::manual("A", Nutrients::zero(), "1 serving", 100.0);
        let b = FoodEntry::manual("A", Nutrients::zero(), "1 serving", 100.0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2026-01-13T08:30:00Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
